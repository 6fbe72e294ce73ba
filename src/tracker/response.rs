use super::error::TrackerError;
use crate::bencode::{decode, Value};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerEvent {
    None,
    Started,
    Stopped,
    Completed,
}

impl TrackerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerEvent::None => "",
            TrackerEvent::Started => "started",
            TrackerEvent::Stopped => "stopped",
            TrackerEvent::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnnounceResponse {
    pub interval: u32,
    pub min_interval: Option<u32>,
    pub complete: Option<u32>,
    pub incomplete: Option<u32>,
    pub peers: Vec<SocketAddr>,
    pub warning_message: Option<String>,
    pub tracker_id: Option<String>,
}

impl AnnounceResponse {
    pub fn new(interval: u32) -> Self {
        Self {
            interval,
            min_interval: None,
            complete: None,
            incomplete: None,
            peers: Vec::new(),
            warning_message: None,
            tracker_id: None,
        }
    }

    /// Parses a bencoded announce reply.
    ///
    /// A `failure reason` becomes [`TrackerError::Failure`]. Dictionary-form
    /// peers with an unparsable address or port are skipped.
    pub fn from_bencode(body: &[u8]) -> Result<Self, TrackerError> {
        let value = decode(body)?;
        if value.as_dict().is_none() {
            return Err(TrackerError::InvalidResponse("expected dict".into()));
        }

        if let Some(failure) = value.get_str(b"failure reason") {
            return Err(TrackerError::Failure(failure.to_string()));
        }

        let interval = value
            .get_int(b"interval")
            .ok_or_else(|| TrackerError::InvalidResponse("missing interval".into()))?;

        let as_u32 = |key: &[u8]| value.get_int(key).map(|v| v.clamp(0, u32::MAX as i64) as u32);

        let mut response = AnnounceResponse::new(interval.clamp(0, u32::MAX as i64) as u32);
        response.min_interval = as_u32(b"min interval");
        response.complete = as_u32(b"complete");
        response.incomplete = as_u32(b"incomplete");
        response.warning_message = value.get_str(b"warning message").map(String::from);
        response.tracker_id = value.get_str(b"tracker id").map(String::from);

        match value.get(b"peers") {
            Some(Value::Bytes(compact)) => response.peers = parse_compact_peers(compact),
            Some(Value::List(list)) => {
                response.peers = list.iter().filter_map(parse_peer_dict).collect();
            }
            Some(_) => return Err(TrackerError::InvalidResponse("peers".into())),
            None => {}
        }

        Ok(response)
    }
}

fn parse_peer_dict(peer: &Value) -> Option<SocketAddr> {
    let ip: IpAddr = peer.get_str(b"ip")?.parse().ok()?;
    let port = u16::try_from(peer.get_int(b"port")?).ok()?;
    Some(SocketAddr::new(ip, port))
}

/// Parses the compact peer list: 4 bytes IPv4 + 2 bytes big-endian port each.
///
/// A trailing partial entry is ignored.
pub fn parse_compact_peers(data: &[u8]) -> Vec<SocketAddr> {
    data.chunks_exact(6)
        .map(|c| {
            let ip = Ipv4Addr::new(c[0], c[1], c[2], c[3]);
            let port = u16::from_be_bytes([c[4], c[5]]);
            SocketAddr::new(IpAddr::V4(ip), port)
        })
        .collect()
}
