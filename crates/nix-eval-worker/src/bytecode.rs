//! The compact byte-code format `spec.md` §6 and `SPEC_FULL.md` §4.7 describe
//! for handing evaluated-value shape metadata back across the worker process
//! boundary: a 2-byte magic (`b"NB"`), a version byte, then a sequence of
//! length-prefixed records.
//!
//! `examples/original_source/libnixbc/src/Serialize.cpp`'s origin serialiser
//! has a `switch` over the origin kind that falls through, after the
//! `OK_Path` case body, into an unconditional
//! `assert(false && "Unhandled origin kind")` — which fires even though
//! `OK_Path` was just handled. `encode_origin` below can't reproduce that: a
//! Rust `match` over `Origin` is exhaustive, so there is no path from
//! "handled a known variant" to "fall through to the unknown-tag arm". The
//! unknown-tag error in `decode_origin` only exists on the read side, where a
//! corrupt or mismatched-version buffer is real user-reachable input, not an
//! encoder invariant violation.

use thiserror::Error;

const MAGIC: [u8; 2] = *b"NB";
const VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    None,
    /// Standard input.
    Stdin,
    /// `EvalState::parseExprFromString()`.
    String,
    /// `EvalState::parseExprFromFile()`.
    Path(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub kind: u8,
    pub origin: Origin,
    pub payload: Vec<u8>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BcError {
    #[error("unexpected end of byte-code buffer")]
    UnexpectedEof,
    #[error("bad byte-code magic")]
    BadMagic,
    #[error("unsupported byte-code version {0}")]
    UnsupportedVersion(u8),
    #[error("unknown origin kind tag {0}")]
    UnknownOriginKind(u8),
}

fn encode_origin(origin: &Origin, out: &mut Vec<u8>) {
    match origin {
        Origin::None => out.push(0),
        Origin::Stdin => out.push(1),
        Origin::String => out.push(2),
        Origin::Path(path) => {
            out.push(3);
            let bytes = path.as_bytes();
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            out.extend_from_slice(bytes);
        }
    }
}

fn decode_origin(buf: &[u8], pos: &mut usize) -> Result<Origin, BcError> {
    let tag = take_u8(buf, pos)?;
    match tag {
        0 => Ok(Origin::None),
        1 => Ok(Origin::Stdin),
        2 => Ok(Origin::String),
        3 => {
            let len = take_u32(buf, pos)? as usize;
            let bytes = take_bytes(buf, pos, len)?;
            let path = String::from_utf8_lossy(bytes).into_owned();
            Ok(Origin::Path(path))
        }
        other => Err(BcError::UnknownOriginKind(other)),
    }
}

pub fn encode_module(records: &[Record]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.push(VERSION);
    out.extend_from_slice(&(records.len() as u32).to_le_bytes());
    for record in records {
        out.push(record.kind);
        encode_origin(&record.origin, &mut out);
        out.extend_from_slice(&(record.payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&record.payload);
    }
    out
}

pub fn decode_module(buf: &[u8]) -> Result<Vec<Record>, BcError> {
    let mut pos = 0usize;
    let magic = take_bytes(buf, &mut pos, 2)?;
    if magic != MAGIC {
        return Err(BcError::BadMagic);
    }
    let version = take_u8(buf, &mut pos)?;
    if version != VERSION {
        return Err(BcError::UnsupportedVersion(version));
    }
    let count = take_u32(buf, &mut pos)? as usize;
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let kind = take_u8(buf, &mut pos)?;
        let origin = decode_origin(buf, &mut pos)?;
        let len = take_u32(buf, &mut pos)? as usize;
        let payload = take_bytes(buf, &mut pos, len)?.to_vec();
        records.push(Record { kind, origin, payload });
    }
    Ok(records)
}

fn take_u8(buf: &[u8], pos: &mut usize) -> Result<u8, BcError> {
    let byte = *buf.get(*pos).ok_or(BcError::UnexpectedEof)?;
    *pos += 1;
    Ok(byte)
}

fn take_u32(buf: &[u8], pos: &mut usize) -> Result<u32, BcError> {
    let bytes = take_bytes(buf, pos, 4)?;
    Ok(u32::from_le_bytes(bytes.try_into().expect("take_bytes(4) yields a 4-byte slice")))
}

fn take_bytes<'a>(buf: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8], BcError> {
    let end = pos.checked_add(len).ok_or(BcError::UnexpectedEof)?;
    let slice = buf.get(*pos..end).ok_or(BcError::UnexpectedEof)?;
    *pos = end;
    Ok(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_none_origin_record() {
        let records = vec![Record { kind: 3, origin: Origin::None, payload: vec![1, 2, 3] }];
        let bytes = encode_module(&records);
        assert_eq!(decode_module(&bytes).expect("decodes"), records);
    }

    #[test]
    fn round_trips_a_path_origin_record() {
        let records = vec![Record { kind: 7, origin: Origin::Path("/nix/store/x.nix".to_string()), payload: vec![] }];
        let bytes = encode_module(&records);
        assert_eq!(decode_module(&bytes).expect("decodes"), records);
    }

    #[test]
    fn round_trips_stdin_and_string_origin_records() {
        let records = vec![
            Record { kind: 4, origin: Origin::Stdin, payload: vec![] },
            Record { kind: 5, origin: Origin::String, payload: vec![9] },
        ];
        let bytes = encode_module(&records);
        assert_eq!(decode_module(&bytes).expect("decodes"), records);
    }

    #[test]
    fn every_origin_variant_encodes_without_reaching_an_error_path() {
        for origin in [Origin::None, Origin::Stdin, Origin::String, Origin::Path("x".to_string())] {
            let mut out = Vec::new();
            encode_origin(&origin, &mut out);
            assert!(!out.is_empty());
        }
    }

    #[test]
    fn bad_magic_is_rejected() {
        assert_eq!(decode_module(b"XX\x01\x00\x00\x00\x00"), Err(BcError::BadMagic));
    }

    #[test]
    fn unknown_origin_tag_is_a_decode_error_not_a_panic() {
        let mut bytes = encode_module(&[Record { kind: 1, origin: Origin::None, payload: vec![] }]);
        let tag_pos = MAGIC.len() + 1 + 4 + 1;
        bytes[tag_pos] = 9;
        assert_eq!(decode_module(&bytes), Err(BcError::UnknownOriginKind(9)));
    }

    #[test]
    fn truncated_buffer_is_an_eof_error() {
        assert_eq!(decode_module(b"NB"), Err(BcError::UnexpectedEof));
    }
}
