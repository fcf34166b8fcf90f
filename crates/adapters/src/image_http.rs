//! HTTP image fetcher with in-process decoding

use async_trait::async_trait;
use img_harvest_domain::{DecodedImage, FetchError, ImageFetcher};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Fetches image bytes over HTTP and decodes them to RGB8
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_and_decode(&self, url: &str) -> Result<DecodedImage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(FetchError::Transient(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(FetchError::Permanent(format!("HTTP {}", status)));
        }

        let bytes = response.bytes().await.map_err(request_error)?;

        tokio::task::spawn_blocking(move || decode(&bytes))
            .await
            .map_err(|e| FetchError::Permanent(format!("decode task failed: {}", e)))?
    }
}

fn decode(bytes: &[u8]) -> Result<DecodedImage, FetchError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| FetchError::Permanent(format!("decode failed: {}", e)))?
        .to_rgb8();
    let (width, height) = image.dimensions();
    Ok(DecodedImage::new(width, height, image.into_raw()))
}

fn request_error(error: reqwest::Error) -> FetchError {
    if error.is_builder() {
        FetchError::Permanent(error.to_string())
    } else if error.is_timeout() || error.is_connect() || error.is_request() || error.is_body() {
        FetchError::Transient(error.to_string())
    } else {
        FetchError::Permanent(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        RgbImage::from_pixel(width, height, Rgb([12, 34, 56]))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn fetcher() -> HttpImageFetcher {
        HttpImageFetcher::new(Duration::from_secs(5), "img-harvest-test/0.1").unwrap()
    }

    async fn serve(status: u16, body: Vec<u8>) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.png"))
            .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_decodes_dimensions_and_pixels() {
        let server = serve(200, png(130, 60)).await;

        let image = fetcher()
            .fetch_and_decode(&format!("{}/a.png", server.uri()))
            .await
            .unwrap();

        assert_eq!(image.dimensions(), (130, 60));
        assert_eq!(image.pixels.len(), 130 * 60 * 3);
        assert_eq!(&image.pixels[..3], &[12, 34, 56]);
    }

    #[tokio::test]
    async fn test_server_errors_are_transient() {
        for status in [500, 503, 429] {
            let server = serve(status, vec![]).await;
            let result = fetcher()
                .fetch_and_decode(&format!("{}/a.png", server.uri()))
                .await;
            assert!(
                matches!(result, Err(FetchError::Transient(_))),
                "status {}",
                status
            );
        }
    }

    #[tokio::test]
    async fn test_client_errors_are_permanent() {
        let server = serve(404, vec![]).await;
        let result = fetcher()
            .fetch_and_decode(&format!("{}/a.png", server.uri()))
            .await;
        assert!(matches!(result, Err(FetchError::Permanent(_))));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_permanent() {
        let server = serve(200, b"<html>removed</html>".to_vec()).await;
        let result = fetcher()
            .fetch_and_decode(&format!("{}/a.png", server.uri()))
            .await;
        assert!(matches!(result, Err(FetchError::Permanent(_))));
    }

    #[tokio::test]
    async fn test_malformed_url_is_permanent() {
        let result = fetcher().fetch_and_decode("not a url").await;
        assert!(matches!(result, Err(FetchError::Permanent(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let result = fetcher().fetch_and_decode(&format!("{}/a.png", uri)).await;
        assert!(matches!(result, Err(FetchError::Transient(_))));
    }
}
