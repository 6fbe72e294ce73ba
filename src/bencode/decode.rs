use super::error::BencodeError;
use super::value::Value;
use bytes::Bytes;
use std::collections::BTreeMap;

const MAX_DEPTH: usize = 64;

/// Decodes a complete bencoded document.
///
/// Fails with [`BencodeError::TrailingData`] if anything follows the first
/// value.
pub fn decode(data: &[u8]) -> Result<Value, BencodeError> {
    let mut decoder = Decoder::new(data);
    let value = decoder.next_value()?;

    if !decoder.is_empty() {
        return Err(BencodeError::TrailingData(decoder.position()));
    }

    Ok(value)
}

/// A cursor over bencoded input.
///
/// Unlike [`decode`], a `Decoder` can pull several consecutive values out of
/// one buffer.
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn next_value(&mut self) -> Result<Value, BencodeError> {
        self.value(0)
    }

    fn peek(&self) -> Result<u8, BencodeError> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(BencodeError::UnexpectedEof(self.pos))
    }

    /// Returns the bytes up to (not including) `delim` and steps past it.
    fn take_until(&mut self, delim: u8) -> Result<&'a [u8], BencodeError> {
        let data = self.data;
        let rest = &data[self.pos..];
        let len = rest
            .iter()
            .position(|&b| b == delim)
            .ok_or(BencodeError::UnexpectedEof(self.data.len()))?;
        self.pos += len + 1;
        Ok(&rest[..len])
    }

    fn value(&mut self, depth: usize) -> Result<Value, BencodeError> {
        if depth > MAX_DEPTH {
            return Err(BencodeError::NestingTooDeep);
        }

        match self.peek()? {
            b'i' => self.integer(),
            b'l' => self.list(depth),
            b'd' => self.dict(depth),
            b'0'..=b'9' => self.byte_string().map(Value::Bytes),
            c => Err(BencodeError::UnexpectedChar {
                offset: self.pos,
                found: c as char,
            }),
        }
    }

    fn integer(&mut self) -> Result<Value, BencodeError> {
        let offset = self.pos;
        self.pos += 1;
        let digits = self.take_until(b'e')?;

        let invalid = |reason: &str| BencodeError::InvalidInteger {
            offset,
            reason: reason.to_string(),
        };

        let text = std::str::from_utf8(digits).map_err(|_| invalid("not ascii"))?;
        if text.is_empty() {
            return Err(invalid("empty"));
        }
        if text.starts_with("-0") || (text.starts_with('0') && text.len() > 1) {
            return Err(invalid("leading zeros"));
        }

        text.parse().map(Value::Integer).map_err(|_| invalid(text))
    }

    fn byte_string(&mut self) -> Result<Bytes, BencodeError> {
        let offset = self.pos;
        let len_digits = self.take_until(b':')?;
        let len: usize = std::str::from_utf8(len_digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(BencodeError::InvalidStringLength(offset))?;

        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(BencodeError::UnexpectedEof(self.data.len()))?;

        let bytes = Bytes::copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(bytes)
    }

    fn list(&mut self, depth: usize) -> Result<Value, BencodeError> {
        self.pos += 1;
        let mut items = Vec::new();

        while self.peek()? != b'e' {
            items.push(self.value(depth + 1)?);
        }

        self.pos += 1;
        Ok(Value::List(items))
    }

    fn dict(&mut self, depth: usize) -> Result<Value, BencodeError> {
        self.pos += 1;
        let mut entries = BTreeMap::new();

        while self.peek()? != b'e' {
            if !self.peek()?.is_ascii_digit() {
                return Err(BencodeError::NonStringKey(self.pos));
            }
            let key = self.byte_string()?;
            let value = self.value(depth + 1)?;
            entries.insert(key, value);
        }

        self.pos += 1;
        Ok(Value::Dict(entries))
    }
}
