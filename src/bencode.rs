//! Bencode encoding and decoding.
//!
//! Bencode is the serialization format of `.torrent` files and tracker
//! responses. Only what the client consumes is provided: a strict decoder
//! producing a [`Value`] tree and a canonical encoder, which the metainfo
//! parser uses to hash the `info` dictionary.
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` → 42 |
//! | Byte String | `<length>:<data>` | `4:spam` → "spam" |
//! | List | `l<items>e` | `l4:spami42ee` → ["spam", 42] |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` → {"foo": "bar"} |
//!
//! ```
//! use peerwire::bencode::{decode, encode};
//!
//! let value = decode(b"d8:intervali1800e5:peers0:e").unwrap();
//! assert_eq!(value.get_int(b"interval"), Some(1800));
//! assert_eq!(encode(&value).unwrap(), b"d8:intervali1800e5:peers0:e");
//! ```

mod decode;
mod encode;
mod error;
mod value;

pub use decode::{decode, Decoder};
pub use encode::encode;
pub use error::BencodeError;
pub use value::Value;

#[cfg(test)]
mod tests;
