//! Reddit API read adapter for listing top posts

use async_trait::async_trait;
use img_harvest_domain::{Candidate, Community, PostSource, PostSourceError};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;

/// Script-app credentials for the password grant
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub username: String,
    pub password: SecretString,
    pub user_agent: String,
}

/// Reddit post source reading `top` listings of all time
pub struct RedditPostSource {
    client: Client,
    credentials: RedditCredentials,
    auth_base_url: String,
    api_base_url: String,
    token: Mutex<Option<SecretString>>,
}

impl RedditPostSource {
    pub fn new(credentials: RedditCredentials) -> Result<Self, PostSourceError> {
        Self::with_base_urls(
            credentials,
            "https://www.reddit.com".to_string(),
            "https://oauth.reddit.com".to_string(),
        )
    }

    pub fn with_base_urls(
        credentials: RedditCredentials,
        auth_base_url: String,
        api_base_url: String,
    ) -> Result<Self, PostSourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(credentials.user_agent.clone())
            .build()
            .map_err(|e| PostSourceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            credentials,
            auth_base_url,
            api_base_url,
            token: Mutex::new(None),
        })
    }

    /// Fetch a bearer token up front so bad credentials fail fast
    pub async fn authenticate(&self) -> Result<(), PostSourceError> {
        self.bearer().await.map(|_| ())
    }

    /// `Authorization` header value, fetching a token when none is cached
    async fn bearer(&self) -> Result<String, PostSourceError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(format!("Bearer {}", token.expose_secret()));
        }

        let url = format!("{}/api/v1/access_token", self.auth_base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(
                &self.credentials.client_id,
                Some(self.credentials.client_secret.expose_secret()),
            )
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| PostSourceError::Network(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(PostSourceError::Auth(
                "Invalid client id or secret".to_string(),
            ));
        }

        let response = check_status(response, "Failed to get access token").await?;

        // Bad user credentials come back as 200 with an `error` field
        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| PostSourceError::Api(e.to_string()))?;

        let token = match (token_response.access_token, token_response.error) {
            (Some(token), _) => SecretString::new(token.into()),
            (None, Some(error)) => return Err(PostSourceError::Auth(error)),
            (None, None) => {
                return Err(PostSourceError::Auth(
                    "Token response without access_token".to_string(),
                ));
            }
        };

        tracing::debug!("Obtained Reddit access token");
        let bearer = format!("Bearer {}", token.expose_secret());
        *cached = Some(token);
        Ok(bearer)
    }

    async fn fetch_listing(
        &self,
        community: &Community,
        limit: usize,
    ) -> Result<Vec<Candidate>, PostSourceError> {
        let bearer = self.bearer().await?;
        let url = format!("{}/r/{}/top", self.api_base_url, community.as_str());
        let limit = limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit.as_str()), ("t", "all"), ("raw_json", "1")])
            .header("Authorization", bearer)
            .send()
            .await
            .map_err(|e| PostSourceError::Network(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // Token expired or revoked; the next call fetches a new one
            *self.token.lock().await = None;
            return Err(PostSourceError::Auth("Access token rejected".to_string()));
        }

        let response = check_status(response, "Failed to list posts").await?;

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| PostSourceError::Api(e.to_string()))?;

        Ok(listing
            .data
            .children
            .into_iter()
            .filter_map(|child| {
                let post = child.data;
                post.url.map(|url| Candidate::new(url, post.domain.unwrap_or_default()))
            })
            .collect())
    }
}

async fn check_status(response: Response, context: &str) -> Result<Response, PostSourceError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<f64>().ok())
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
        return Err(PostSourceError::RateLimited(retry_after));
    }

    if status.is_server_error() {
        return Err(PostSourceError::Network(format!("{}: HTTP {}", context, status)));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PostSourceError::Api(format!(
            "{}: HTTP {}: {}",
            context, status, body
        )));
    }

    Ok(response)
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct Child {
    data: PostData,
}

#[derive(Deserialize)]
struct PostData {
    url: Option<String>,
    domain: Option<String>,
}

#[async_trait]
impl PostSource for RedditPostSource {
    async fn list_top_posts(
        &self,
        community: &Community,
        limit: usize,
    ) -> Result<Vec<Candidate>, PostSourceError> {
        tracing::info!(community = %community, limit = limit, "Fetching top posts from Reddit");

        let posts = self.fetch_listing(community, limit).await?;

        tracing::debug!(community = %community, count = posts.len(), "Fetched top posts");

        Ok(posts)
    }
}
