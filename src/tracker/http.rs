use super::error::TrackerError;
use super::response::{AnnounceResponse, TrackerEvent};
use crate::constants::{TRACKER_TIMEOUT, USER_AGENT};
use reqwest::Client;
use tracing::debug;

pub struct HttpTracker {
    client: Client,
    url: String,
}

impl HttpTracker {
    pub fn new(url: &str) -> Result<Self, TrackerError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(TrackerError::InvalidUrl(url.to_string()));
        }

        let client = Client::builder()
            .timeout(TRACKER_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Announces ourselves and returns the tracker's peer list.
    ///
    /// Nothing is ever uploaded, so `uploaded` is always reported as zero.
    pub async fn announce(
        &self,
        info_hash: &[u8; 20],
        peer_id: &[u8; 20],
        port: u16,
        downloaded: u64,
        left: u64,
        event: TrackerEvent,
    ) -> Result<AnnounceResponse, TrackerError> {
        let url = self.announce_url(info_hash, peer_id, port, downloaded, left, event);
        debug!("announcing to {}", self.url);

        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let response = AnnounceResponse::from_bencode(&body)?;
        debug!(
            "tracker returned {} peers, interval {}s",
            response.peers.len(),
            response.interval
        );
        Ok(response)
    }

    pub(super) fn announce_url(
        &self,
        info_hash: &[u8; 20],
        peer_id: &[u8; 20],
        port: u16,
        downloaded: u64,
        left: u64,
        event: TrackerEvent,
    ) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        let mut url = format!(
            "{}{}info_hash={}&peer_id={}&port={}&uploaded=0&downloaded={}&left={}&compact=1",
            self.url,
            separator,
            url_encode(info_hash),
            url_encode(peer_id),
            port,
            downloaded,
            left
        );

        let event_str = event.as_str();
        if !event_str.is_empty() {
            url.push_str("&event=");
            url.push_str(event_str);
        }
        url
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn url_encode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.' || b == b'~' {
                (b as char).to_string()
            } else {
                format!("%{:02X}", b)
            }
        })
        .collect()
}
