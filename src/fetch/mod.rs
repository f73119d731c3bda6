mod basic;
mod client;
mod source;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use source::{HttpPartitionSource, PartitionSource};

use crate::error::FetchError;

/// Fetches a URL and returns its body, or `None` on 404.
///
/// Absence of a yearly partition file is a normal state (new stations,
/// future years), so not-found is not an error here.
pub async fn fetch_bytes<C: HttpClient>(
    client: &C,
    url: &str,
) -> Result<Option<Vec<u8>>, FetchError> {
    let parsed = url
        .parse()
        .map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?;
    let status = resp.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    Ok(Some(resp.bytes().await?.to_vec()))
}
