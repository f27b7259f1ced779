//! DNS and mDNS name extraction, including pointer-compression (spec.md §4.B).
//!
//! Name parsing follows a single compression jump: the first pointer
//! encountered redirects the read cursor, but the *return* offset (right
//! after that first pointer) is what the caller resumes from. A name is
//! rejected rather than looped if it revisits the jump target.

use crate::byte_reader::DecodeError;

const DNS_HEADER_LEN: usize = 12;
const MAX_LABEL_JUMPS: usize = 1;

/// Reads one (possibly compressed) domain name starting at `start`.
/// Returns the name and the offset immediately following it in the
/// *original* (un-jumped) stream.
fn read_name(buf: &[u8], start: usize) -> Result<(String, usize), DecodeError> {
    let mut offset = start;
    let mut jumps = 0usize;
    let mut resume_at: Option<usize> = None;
    let mut labels = Vec::new();

    loop {
        if offset >= buf.len() {
            return Err(DecodeError::short("dns name ran past buffer"));
        }
        let len = buf[offset];
        if len == 0 {
            offset += 1;
            break;
        }
        if len & 0xC0 == 0xC0 {
            if jumps >= MAX_LABEL_JUMPS {
                return Err(DecodeError::short("dns name compression loop"));
            }
            let lo = *buf.get(offset + 1).ok_or(DecodeError::short("truncated dns pointer"))?;
            let pointer = (((len & 0x3F) as usize) << 8) | lo as usize;
            if pointer >= buf.len() {
                return Err(DecodeError::short("dns pointer out of bounds"));
            }
            if resume_at.is_none() {
                resume_at = Some(offset + 2);
            }
            jumps += 1;
            offset = pointer;
            continue;
        }
        let label_len = len as usize;
        let label_start = offset + 1;
        let label_end = label_start
            .checked_add(label_len)
            .ok_or(DecodeError::short("dns label length overflow"))?;
        if label_end > buf.len() {
            return Err(DecodeError::short("dns label runs past buffer"));
        }
        let label = std::str::from_utf8(&buf[label_start..label_end])
            .map_err(|_| DecodeError::short("dns label is not valid utf-8"))?;
        labels.push(label.to_string());
        offset = label_end;
    }

    Ok((labels.join("."), resume_at.unwrap_or(offset)))
}

/// DNS query name: the first question in the message (spec.md §4.B).
pub fn parse_dns_query(payload: &[u8]) -> Result<String, DecodeError> {
    if payload.len() < DNS_HEADER_LEN {
        return Err(DecodeError::short("dns payload shorter than header"));
    }
    let (name, _) = read_name(payload, DNS_HEADER_LEN)?;
    Ok(name)
}

/// mDNS name: first question if any, else the first answer's name
/// (spec.md §4.B mDNS rule).
pub fn extract_mdns_name(payload: &[u8]) -> Result<String, DecodeError> {
    if payload.len() < DNS_HEADER_LEN {
        return Err(DecodeError::short("mdns payload shorter than header"));
    }
    let qdcount = u16::from_be_bytes([payload[4], payload[5]]) as usize;
    let ancount = u16::from_be_bytes([payload[6], payload[7]]) as usize;
    let offset = DNS_HEADER_LEN;

    if qdcount > 0 {
        let (name, _) = read_name(payload, offset)?;
        return Ok(name);
    }

    if ancount > 0 {
        let (name, _) = read_name(payload, offset)?;
        return Ok(name);
    }

    Err(DecodeError::short("mdns message has no question or answer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dns_query_packet(name: &str) -> Vec<u8> {
        let mut buf = vec![0u8; 12];
        for label in name.split('.') {
            buf.push(label.len() as u8);
            buf.extend_from_slice(label.as_bytes());
        }
        buf.push(0);
        buf
    }

    #[test]
    fn parses_plain_query_name() {
        let buf = dns_query_packet("example.com");
        assert_eq!(parse_dns_query(&buf).unwrap(), "example.com");
    }

    #[test]
    fn resolves_one_pointer_jump() {
        // The query name at offset 12 is a bare pointer to offset 32, where
        // the actual labels live.
        const TARGET: usize = 32;
        let mut buf = vec![0u8; 12];
        buf.push(0xC0 | ((TARGET >> 8) as u8));
        buf.push((TARGET & 0xFF) as u8);
        buf.resize(TARGET, 0);
        for label in ["example", "com"] {
            buf.push(label.len() as u8);
            buf.extend_from_slice(label.as_bytes());
        }
        buf.push(0);
        assert_eq!(parse_dns_query(&buf).unwrap(), "example.com");
    }

    #[test]
    fn rejects_self_referential_pointer_loop() {
        let mut buf = vec![0u8; 12];
        buf.push(0xC0);
        buf.push(0x0C); // points straight back at offset 12 (itself)
        assert!(parse_dns_query(&buf).is_err());
    }

    #[test]
    fn mdns_prefers_question_over_answer() {
        let buf = dns_query_packet("service.local");
        let mut header = buf.clone();
        header[4] = 0;
        header[5] = 1; // qdcount = 1
        assert_eq!(extract_mdns_name(&header).unwrap(), "service.local");
    }

    #[test]
    fn truncated_header_is_rejected() {
        let buf = [0u8; 5];
        assert!(parse_dns_query(&buf).is_err());
        assert!(extract_mdns_name(&buf).is_err());
    }
}
