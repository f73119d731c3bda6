//! Remote source of yearly partition files.

use async_trait::async_trait;
use tracing::debug;

use crate::error::FetchError;
use crate::fetch::{fetch_bytes, HttpClient};
use crate::model::{Record, StationId};
use crate::parser::parse_partition;

/// Abstraction over wherever yearly partition files live.
///
/// `Ok(None)` means the partition does not exist — a normal state for
/// new stations and future years, not an error.
#[async_trait]
pub trait PartitionSource: Send + Sync {
    async fn fetch(&self, station: StationId, year: i32)
        -> Result<Option<Vec<Record>>, FetchError>;
}

/// Fetches partitions from an HTTP file host, one JSON file per
/// station+year named `<lowercased-station-id><year>.json`.
pub struct HttpPartitionSource<C> {
    client: C,
    base_url: String,
}

impl<C> HttpPartitionSource<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url_for(&self, station: StationId, year: i32) -> String {
        format!(
            "{}/{}{}.json",
            self.base_url.trim_end_matches('/'),
            station.file_prefix(),
            year
        )
    }
}

#[async_trait]
impl<C: HttpClient> PartitionSource for HttpPartitionSource<C> {
    async fn fetch(
        &self,
        station: StationId,
        year: i32,
    ) -> Result<Option<Vec<Record>>, FetchError> {
        let url = self.url_for(station, year);

        let Some(bytes) = fetch_bytes(&self.client, &url).await? else {
            debug!(%station, year, "partition file not found");
            return Ok(None);
        };

        let records = parse_partition(station, &bytes)?;
        debug!(%station, year, count = records.len(), "partition fetched");
        Ok(Some(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;

    #[test]
    fn test_url_template() {
        let source = HttpPartitionSource::new(BasicClient::new(), "https://data.example.hk/rts/");
        assert_eq!(
            source.url_for(StationId::Wkts, 2025),
            "https://data.example.hk/rts/wkts2025.json"
        );
        assert_eq!(
            source.url_for(StationId::Nwntts, 2024),
            "https://data.example.hk/rts/nwntts2024.json"
        );
    }
}
