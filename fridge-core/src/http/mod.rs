//! HTTP plumbing shared by the recipe database and gateway clients.
//!
//! Everything that leaves the process goes through [`HttpClient`], so tests
//! can substitute [`MockClient`] at one seam.

mod client;
mod mock;

pub use client::{HttpClient, ReqwestClient, ReqwestClientBuilder};
pub use mock::{MockClient, MockResponse, RecordedRequest};

/// Join a base URL and a path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
