use super::error::PeerError;
use super::peer_id::PeerId;
use crate::constants::DEFAULT_MAX_FRAME_LEN;
use crate::metainfo::InfoHash;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

pub const PROTOCOL: &[u8] = b"BitTorrent protocol";
pub const HANDSHAKE_LEN: usize = 68;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageId {
    Choke = 0,
    Unchoke = 1,
    Interested = 2,
    NotInterested = 3,
    Have = 4,
    Bitfield = 5,
    Request = 6,
    Piece = 7,
    Cancel = 8,
}

impl TryFrom<u8> for MessageId {
    type Error = PeerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageId::Choke),
            1 => Ok(MessageId::Unchoke),
            2 => Ok(MessageId::Interested),
            3 => Ok(MessageId::NotInterested),
            4 => Ok(MessageId::Have),
            5 => Ok(MessageId::Bitfield),
            6 => Ok(MessageId::Request),
            7 => Ok(MessageId::Piece),
            8 => Ok(MessageId::Cancel),
            _ => Err(PeerError::InvalidMessageId(value)),
        }
    }
}

/// The 68-byte opening exchange of every connection.
///
/// No protocol extensions are advertised, so `reserved` is all zero on
/// handshakes we build; a peer's reserved bits are kept but ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub info_hash: InfoHash,
    pub peer_id: PeerId,
    pub reserved: [u8; 8],
}

impl Handshake {
    pub fn new(info_hash: InfoHash, peer_id: PeerId) -> Self {
        Self {
            info_hash,
            peer_id,
            reserved: [0u8; 8],
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HANDSHAKE_LEN);
        buf.put_u8(PROTOCOL.len() as u8);
        buf.put_slice(PROTOCOL);
        buf.put_slice(&self.reserved);
        buf.put_slice(self.info_hash.as_bytes());
        buf.put_slice(self.peer_id.as_bytes());
        buf.freeze()
    }

    pub fn decode(data: &[u8]) -> Result<Self, PeerError> {
        if data.len() < HANDSHAKE_LEN {
            return Err(PeerError::ShortRead);
        }

        if data[0] as usize != PROTOCOL.len() || &data[1..20] != PROTOCOL {
            return Err(PeerError::InvalidHandshake);
        }

        let mut reserved = [0u8; 8];
        reserved.copy_from_slice(&data[20..28]);

        let mut info_hash = [0u8; 20];
        info_hash.copy_from_slice(&data[28..48]);

        let mut peer_id = [0u8; 20];
        peer_id.copy_from_slice(&data[48..68]);

        Ok(Self {
            info_hash: InfoHash(info_hash),
            peer_id: PeerId(peer_id),
            reserved,
        })
    }
}

/// Reads exactly one handshake from `reader`.
pub async fn read_handshake<R>(reader: &mut R) -> Result<Handshake, PeerError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; HANDSHAKE_LEN];
    if fill(reader, &mut buf).await? < HANDSHAKE_LEN {
        return Err(PeerError::ShortRead);
    }
    Handshake::decode(&buf)
}

/// A single peer wire message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    KeepAlive,
    Choke,
    Unchoke,
    Interested,
    NotInterested,
    Have { piece: u32 },
    Bitfield(Bytes),
    Request { index: u32, begin: u32, length: u32 },
    Piece { index: u32, begin: u32, data: Bytes },
    Cancel { index: u32, begin: u32, length: u32 },
}

impl Message {
    pub fn request(index: u32, begin: u32, length: u32) -> Self {
        Message::Request {
            index,
            begin,
            length,
        }
    }

    /// The kind byte, or `None` for a keep-alive.
    pub fn id(&self) -> Option<MessageId> {
        match self {
            Message::KeepAlive => None,
            Message::Choke => Some(MessageId::Choke),
            Message::Unchoke => Some(MessageId::Unchoke),
            Message::Interested => Some(MessageId::Interested),
            Message::NotInterested => Some(MessageId::NotInterested),
            Message::Have { .. } => Some(MessageId::Have),
            Message::Bitfield(_) => Some(MessageId::Bitfield),
            Message::Request { .. } => Some(MessageId::Request),
            Message::Piece { .. } => Some(MessageId::Piece),
            Message::Cancel { .. } => Some(MessageId::Cancel),
        }
    }

    fn payload_len(&self) -> usize {
        match self {
            Message::Have { .. } => 4,
            Message::Bitfield(bits) => bits.len(),
            Message::Request { .. } | Message::Cancel { .. } => 12,
            Message::Piece { data, .. } => 8 + data.len(),
            _ => 0,
        }
    }

    /// Encodes the message as a length-prefixed frame.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(5 + self.payload_len());
        self.encode_into(&mut buf);
        buf.freeze()
    }

    pub fn encode_into(&self, buf: &mut BytesMut) {
        let Some(id) = self.id() else {
            buf.put_u32(0);
            return;
        };

        buf.put_u32(1 + self.payload_len() as u32);
        buf.put_u8(id as u8);

        match self {
            Message::Have { piece } => buf.put_u32(*piece),
            Message::Bitfield(bits) => buf.put_slice(bits),
            Message::Request {
                index,
                begin,
                length,
            }
            | Message::Cancel {
                index,
                begin,
                length,
            } => {
                buf.put_u32(*index);
                buf.put_u32(*begin);
                buf.put_u32(*length);
            }
            Message::Piece { index, begin, data } => {
                buf.put_u32(*index);
                buf.put_u32(*begin);
                buf.put_slice(data);
            }
            _ => {}
        }
    }

    /// Builds a message from a frame's kind byte and payload.
    ///
    /// Fixed-size kinds must carry exactly their payload size.
    pub fn decode(id: u8, mut payload: Bytes) -> Result<Self, PeerError> {
        let id = MessageId::try_from(id)?;
        let expected = match id {
            MessageId::Choke
            | MessageId::Unchoke
            | MessageId::Interested
            | MessageId::NotInterested => Some(0),
            MessageId::Have => Some(4),
            MessageId::Request | MessageId::Cancel => Some(12),
            MessageId::Bitfield => None,
            MessageId::Piece => {
                if payload.len() < 8 {
                    return Err(PeerError::MalformedFrame(format!(
                        "piece payload of {} bytes",
                        payload.len()
                    )));
                }
                None
            }
        };

        if let Some(expected) = expected {
            if payload.len() != expected {
                return Err(PeerError::MalformedFrame(format!(
                    "{:?} payload of {} bytes, expected {}",
                    id,
                    payload.len(),
                    expected
                )));
            }
        }

        let message = match id {
            MessageId::Choke => Message::Choke,
            MessageId::Unchoke => Message::Unchoke,
            MessageId::Interested => Message::Interested,
            MessageId::NotInterested => Message::NotInterested,
            MessageId::Have => Message::Have {
                piece: payload.get_u32(),
            },
            MessageId::Bitfield => Message::Bitfield(payload),
            MessageId::Request => Message::Request {
                index: payload.get_u32(),
                begin: payload.get_u32(),
                length: payload.get_u32(),
            },
            MessageId::Piece => Message::Piece {
                index: payload.get_u32(),
                begin: payload.get_u32(),
                data: payload,
            },
            MessageId::Cancel => Message::Cancel {
                index: payload.get_u32(),
                begin: payload.get_u32(),
                length: payload.get_u32(),
            },
        };
        Ok(message)
    }
}

/// Reads length-prefixed frames off a byte stream.
#[derive(Debug, Clone, Copy)]
pub struct FrameReader {
    max_frame_len: usize,
}

impl FrameReader {
    pub fn new(max_frame_len: usize) -> Self {
        Self { max_frame_len }
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    /// Reads exactly one frame.
    ///
    /// A zero length prefix is a keep-alive and consumes nothing further.
    /// End of stream before any byte of the prefix is `ConnectionClosed`;
    /// end of stream anywhere inside a frame is `ShortRead`.
    pub async fn read_message<R>(&self, reader: &mut R) -> Result<Message, PeerError>
    where
        R: AsyncRead + Unpin,
    {
        let mut prefix = [0u8; 4];
        match fill(reader, &mut prefix).await? {
            0 => return Err(PeerError::ConnectionClosed),
            4 => {}
            _ => return Err(PeerError::ShortRead),
        }

        let length = u32::from_be_bytes(prefix) as usize;
        if length == 0 {
            return Ok(Message::KeepAlive);
        }
        if length > self.max_frame_len {
            return Err(PeerError::MalformedFrame(format!(
                "frame length {} exceeds limit {}",
                length, self.max_frame_len
            )));
        }

        let mut body = vec![0u8; length];
        if fill(reader, &mut body).await? < length {
            return Err(PeerError::ShortRead);
        }

        let mut body = Bytes::from(body);
        let id = body.get_u8();
        Message::decode(id, body)
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

/// Reads until `buf` is full or the stream ends, returning the bytes read.
async fn fill<R>(reader: &mut R, buf: &mut [u8]) -> Result<usize, PeerError>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
