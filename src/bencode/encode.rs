use super::error::BencodeError;
use super::value::Value;
use std::io::Write;

/// Encodes a value in canonical form.
///
/// Dictionary keys come out sorted because [`Value::Dict`] is a `BTreeMap`,
/// so re-encoding a decoded `info` dictionary reproduces the bytes its info
/// hash was computed over.
pub fn encode(value: &Value) -> Result<Vec<u8>, BencodeError> {
    let mut buf = Vec::new();
    encode_into(value, &mut buf)?;
    Ok(buf)
}

fn encode_into<W: Write>(value: &Value, out: &mut W) -> Result<(), BencodeError> {
    match value {
        Value::Integer(i) => write!(out, "i{}e", i)?,
        Value::Bytes(b) => write_byte_string(b, out)?,
        Value::List(items) => {
            out.write_all(b"l")?;
            for item in items {
                encode_into(item, out)?;
            }
            out.write_all(b"e")?;
        }
        Value::Dict(entries) => {
            out.write_all(b"d")?;
            for (key, val) in entries {
                write_byte_string(key, out)?;
                encode_into(val, out)?;
            }
            out.write_all(b"e")?;
        }
    }
    Ok(())
}

fn write_byte_string<W: Write>(bytes: &[u8], out: &mut W) -> std::io::Result<()> {
    write!(out, "{}:", bytes.len())?;
    out.write_all(bytes)
}
