use std::collections::BTreeMap;

use bytes::Bytes;

use super::*;

#[test]
fn test_decode_integer() {
    assert_eq!(decode(b"i42e").unwrap(), Value::Integer(42));
    assert_eq!(decode(b"i-42e").unwrap(), Value::Integer(-42));
    assert_eq!(decode(b"i0e").unwrap(), Value::Integer(0));
}

#[test]
fn test_decode_integer_invalid() {
    assert!(matches!(
        decode(b"i-0e"),
        Err(BencodeError::InvalidInteger { offset: 0, .. })
    ));
    assert!(decode(b"i03e").is_err());
    assert!(decode(b"ie").is_err());
    assert!(decode(b"i12").is_err());
}

#[test]
fn test_decode_bytes() {
    assert_eq!(
        decode(b"4:spam").unwrap(),
        Value::Bytes(Bytes::from_static(b"spam"))
    );
    assert_eq!(decode(b"0:").unwrap(), Value::Bytes(Bytes::new()));
}

#[test]
fn test_decode_bytes_truncated() {
    assert!(matches!(decode(b"10:short"), Err(BencodeError::UnexpectedEof(_))));
    assert!(matches!(
        decode(b"x:abc"),
        Err(BencodeError::UnexpectedChar { offset: 0, found: 'x' })
    ));
}

#[test]
fn test_decode_list() {
    let result = decode(b"l4:spami42ee").unwrap();
    let list = result.as_list().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0], Value::string("spam"));
    assert_eq!(list[1], Value::Integer(42));
}

#[test]
fn test_decode_dict() {
    let result = decode(b"d3:cow3:moo4:spam4:eggse").unwrap();
    assert_eq!(result.as_dict().unwrap().len(), 2);
    assert_eq!(result.get_str(b"cow"), Some("moo"));
    assert_eq!(result.get_str(b"spam"), Some("eggs"));
    assert_eq!(result.get(b"missing"), None);
}

#[test]
fn test_decode_dict_non_string_key() {
    assert!(matches!(
        decode(b"di1e3:fooe"),
        Err(BencodeError::NonStringKey(1))
    ));
}

#[test]
fn test_decoder_reads_consecutive_values() {
    let mut decoder = Decoder::new(b"i1ei2e");
    assert_eq!(decoder.next_value().unwrap(), Value::Integer(1));
    assert_eq!(decoder.position(), 3);
    assert_eq!(decoder.next_value().unwrap(), Value::Integer(2));
    assert!(decoder.is_empty());
}

#[test]
fn test_encode_dict_sorts_keys() {
    let mut dict = BTreeMap::new();
    dict.insert(Bytes::from_static(b"zeta"), Value::Integer(1));
    dict.insert(Bytes::from_static(b"alpha"), Value::string("x"));
    assert_eq!(
        encode(&Value::Dict(dict)).unwrap(),
        b"d5:alpha1:x4:zetai1ee"
    );
}

#[test]
fn test_encode_nested() {
    let value: Value = [
        (b"list".as_slice(), Value::List(vec![Value::string("spam"), Value::Integer(42)])),
        (b"n".as_slice(), Value::Integer(-3)),
    ]
    .into_iter()
    .collect();
    assert_eq!(encode(&value).unwrap(), b"d4:listl4:spami42ee1:ni-3ee");
}

#[test]
fn test_torrent_shaped_document_reencodes_identically() {
    let original = b"d8:announce15:http://test.com4:infod4:name4:test12:piece lengthi16384eee";
    let decoded = decode(original).unwrap();
    assert_eq!(encode(&decoded).unwrap(), original);
}

#[test]
fn test_trailing_data_error() {
    assert!(matches!(
        decode(b"i42eextra"),
        Err(BencodeError::TrailingData(4))
    ));
}

#[test]
fn test_nesting_limit() {
    let mut deep = vec![b'l'; 100];
    deep.extend(vec![b'e'; 100]);
    assert!(matches!(decode(&deep), Err(BencodeError::NestingTooDeep)));
}
