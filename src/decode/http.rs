//! HTTP `Host:` header extraction (spec.md §4.B), a byte-oriented scan
//! rather than a full header parse — mirrors
//! `original_source/BG-Realtime-Parsing.cpp`'s `parse_http_host`.

use crate::byte_reader::DecodeError;

const NEEDLE: &[u8] = b"Host: ";

/// Scans raw HTTP request bytes for a `Host:` header and returns its value.
pub fn parse_http_host(payload: &[u8]) -> Result<String, DecodeError> {
    if payload.len() < 16 {
        return Err(DecodeError::short("http payload too short for a host header"));
    }
    let start = find_subslice(payload, NEEDLE)
        .ok_or(DecodeError::short("no Host header found"))?
        + NEEDLE.len();
    let end = find_subslice(&payload[start..], b"\r\n")
        .map(|rel| start + rel)
        .unwrap_or(payload.len());
    let host = std::str::from_utf8(&payload[start..end])
        .map_err(|_| DecodeError::short("host header is not valid utf-8"))?;
    Ok(host.to_string())
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
