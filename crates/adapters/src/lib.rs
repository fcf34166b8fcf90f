//! img-harvest adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `ledger`: Filesystem ledger store and run summary writer
//! - `communities`: Community list file loader
//! - `images`: HTTP image fetcher with decoding
//! - `reddit`: Reddit API post source

mod communities_fs;
mod image_http;
mod ledger_fs;

pub mod reddit;

/// Re-exports for ledger adapters
pub mod ledger {
    pub use crate::ledger_fs::FsLedgerStore;
}

/// Re-exports for community list adapters
pub mod communities {
    pub use crate::communities_fs::{CommunityListError, load_community_list};
}

/// Re-exports for image adapters
pub mod images {
    pub use crate::image_http::HttpImageFetcher;
}
