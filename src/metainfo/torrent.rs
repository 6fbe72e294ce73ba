use super::error::MetainfoError;
use super::info_hash::InfoHash;
use crate::bencode::{decode, encode, Value};
use bytes::Bytes;

/// A parsed torrent file.
#[derive(Debug, Clone)]
pub struct Metainfo {
    /// The info dictionary's piece geometry.
    pub info: Info,
    /// SHA-1 of the canonical encoding of the info dictionary.
    pub info_hash: InfoHash,
    /// Primary tracker URL.
    pub announce: Option<String>,
    /// Multi-tier tracker list.
    pub announce_list: Vec<Vec<String>>,
    raw_info: Bytes,
}

/// The parts of the info dictionary the client uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Info {
    /// Suggested name for the downloaded file.
    pub name: String,
    /// Number of bytes per piece (the last piece may be shorter).
    pub piece_length: u64,
    /// Total size of the content; the sum of all files for multi-file torrents.
    pub total_length: u64,
}

impl Info {
    /// `ceil(total_length / piece_length)`.
    pub fn piece_count(&self) -> usize {
        self.total_length.div_ceil(self.piece_length) as usize
    }

    /// Length of piece `index`, or `None` past the end.
    pub fn piece_len(&self, index: usize) -> Option<u64> {
        let start = (index as u64).checked_mul(self.piece_length)?;
        if start >= self.total_length {
            return None;
        }
        Some((self.total_length - start).min(self.piece_length))
    }
}

impl Metainfo {
    /// Parses a torrent file from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid bencode, the info dictionary
    /// lacks `name`, `piece length`, `pieces` or a length, or the number of
    /// piece hashes does not match the content length.
    pub fn from_bytes(data: &[u8]) -> Result<Self, MetainfoError> {
        let root = decode(data)?;
        if root.as_dict().is_none() {
            return Err(MetainfoError::InvalidField("root"));
        }

        let info_value = root.get(b"info").ok_or(MetainfoError::MissingField("info"))?;
        let raw_info = Bytes::from(encode(info_value)?);
        let info_hash = InfoHash::of_info(&raw_info);
        let info = parse_info(info_value)?;

        let announce = root.get_str(b"announce").map(String::from);

        let announce_list = root
            .get(b"announce-list")
            .and_then(Value::as_list)
            .map(|tiers| {
                tiers
                    .iter()
                    .filter_map(Value::as_list)
                    .map(|urls| {
                        urls.iter()
                            .filter_map(Value::as_str)
                            .map(String::from)
                            .collect()
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            info,
            info_hash,
            announce,
            announce_list,
            raw_info,
        })
    }

    /// Reads and parses a torrent file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, MetainfoError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Returns the canonical bencoded info dictionary the info hash covers.
    pub fn raw_info(&self) -> &Bytes {
        &self.raw_info
    }

    /// Returns every tracker URL, `announce` first, without duplicates.
    pub fn trackers(&self) -> Vec<String> {
        let mut trackers: Vec<String> = self.announce.iter().cloned().collect();

        for url in self.announce_list.iter().flatten() {
            if !trackers.contains(url) {
                trackers.push(url.clone());
            }
        }

        trackers
    }
}

fn parse_info(value: &Value) -> Result<Info, MetainfoError> {
    if value.as_dict().is_none() {
        return Err(MetainfoError::InvalidField("info"));
    }

    let name = value
        .get_str(b"name")
        .ok_or(MetainfoError::MissingField("name"))?
        .to_string();

    let piece_length = value
        .get_int(b"piece length")
        .ok_or(MetainfoError::MissingField("piece length"))?;
    if piece_length <= 0 || piece_length > u32::MAX as i64 {
        return Err(MetainfoError::InvalidField("piece length"));
    }
    let piece_length = piece_length as u64;

    let pieces = value
        .get_bytes(b"pieces")
        .ok_or(MetainfoError::MissingField("pieces"))?;
    if pieces.len() % 20 != 0 {
        return Err(MetainfoError::InvalidField("pieces"));
    }

    let total_length = if let Some(length) = value.get_int(b"length") {
        u64::try_from(length).map_err(|_| MetainfoError::InvalidField("length"))?
    } else if let Some(files) = value.get(b"files").and_then(Value::as_list) {
        files.iter().try_fold(0u64, |acc, file| {
            let length = file
                .get_int(b"length")
                .ok_or(MetainfoError::MissingField("file length"))?;
            let length =
                u64::try_from(length).map_err(|_| MetainfoError::InvalidField("file length"))?;
            Ok::<_, MetainfoError>(acc + length)
        })?
    } else {
        return Err(MetainfoError::MissingField("length or files"));
    };

    if total_length == 0 {
        return Err(MetainfoError::InvalidField("length"));
    }

    let info = Info {
        name,
        piece_length,
        total_length,
    };

    if pieces.len() / 20 != info.piece_count() {
        return Err(MetainfoError::InvalidField("pieces"));
    }

    Ok(info)
}
