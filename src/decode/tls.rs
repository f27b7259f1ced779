//! TLS ClientHello SNI extraction (spec.md §4.B), ported field-for-field
//! from the handshake walk in `original_source/BG-Realtime-Parsing.cpp`.

use crate::byte_reader::DecodeError;

const RECORD_HANDSHAKE: u8 = 0x16;
const HANDSHAKE_CLIENT_HELLO: u8 = 0x01;
const EXT_SERVER_NAME: u16 = 0x0000;
const SNI_HOST_NAME: u8 = 0;

/// Walks a single TLS record containing a ClientHello and returns the SNI
/// host name extension's value, if present.
pub fn parse_client_hello_sni(payload: &[u8]) -> Result<String, DecodeError> {
    let short = || DecodeError::short("truncated tls clienthello");

    if payload.len() < 5 {
        return Err(short());
    }
    if payload[0] != RECORD_HANDSHAKE {
        return Err(DecodeError::short("not a tls handshake record"));
    }
    let record_len = u16::from_be_bytes([payload[3], payload[4]]) as usize;
    if record_len + 5 > payload.len() {
        return Err(short());
    }
    if payload.len() < 9 || payload[5] != HANDSHAKE_CLIENT_HELLO {
        return Err(DecodeError::short("not a clienthello"));
    }
    let handshake_len =
        ((payload[6] as usize) << 16) | ((payload[7] as usize) << 8) | payload[8] as usize;
    if handshake_len + 9 > payload.len() {
        return Err(short());
    }

    let mut pos = 9usize;
    if pos + 2 + 32 + 1 > payload.len() {
        return Err(short());
    }
    pos += 2 + 32; // client_version + random

    let session_id_len = payload[pos] as usize;
    pos += 1 + session_id_len;
    if pos + 2 > payload.len() {
        return Err(short());
    }

    let cipher_suites_len = u16::from_be_bytes([payload[pos], payload[pos + 1]]) as usize;
    pos += 2 + cipher_suites_len;
    if pos + 1 > payload.len() {
        return Err(short());
    }

    let comp_methods_len = payload[pos] as usize;
    pos += 1 + comp_methods_len;
    if pos + 2 > payload.len() {
        return Err(short());
    }

    let extensions_len = u16::from_be_bytes([payload[pos], payload[pos + 1]]) as usize;
    pos += 2;
    let extensions_end = pos
        .checked_add(extensions_len)
        .ok_or_else(short)?;
    if extensions_end > payload.len() {
        return Err(short());
    }

    while pos + 4 <= extensions_end {
        let ext_type = u16::from_be_bytes([payload[pos], payload[pos + 1]]);
        let ext_len = u16::from_be_bytes([payload[pos + 2], payload[pos + 3]]) as usize;
        pos += 4;
        if pos + ext_len > extensions_end {
            return Err(short());
        }

        if ext_type == EXT_SERVER_NAME {
            if let Some(name) = read_server_name_list(payload, pos, extensions_end)? {
                return Ok(name);
            }
        }
        pos += ext_len;
    }

    Err(DecodeError::short("no server_name extension present"))
}

fn read_server_name_list(
    payload: &[u8],
    start: usize,
    bound: usize,
) -> Result<Option<String>, DecodeError> {
    let short = || DecodeError::short("truncated server_name extension");
    let mut pos = start;
    if pos + 2 > bound {
        return Err(short());
    }
    let list_len = u16::from_be_bytes([payload[pos], payload[pos + 1]]) as usize;
    pos += 2;
    if pos + list_len > bound {
        return Err(short());
    }

    while pos + 3 <= bound {
        let name_type = payload[pos];
        let name_len = u16::from_be_bytes([payload[pos + 1], payload[pos + 2]]) as usize;
        pos += 3;
        if pos + name_len > bound {
            return Err(short());
        }
        if name_type == SNI_HOST_NAME {
            let host = std::str::from_utf8(&payload[pos..pos + name_len])?;
            return Ok(Some(host.to_string()));
        }
        pos += name_len;
    }
    Ok(None)
}

impl From<std::str::Utf8Error> for DecodeError {
    fn from(_: std::str::Utf8Error) -> Self {
        DecodeError::short("sni host name is not valid utf-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_hello_with_sni(host: &str) -> Vec<u8> {
        let mut ext_body = Vec::new();
        ext_body.push(SNI_HOST_NAME);
        ext_body.extend_from_slice(&(host.len() as u16).to_be_bytes());
        ext_body.extend_from_slice(host.as_bytes());
        let mut server_name_ext = Vec::new();
        server_name_ext.extend_from_slice(&((ext_body.len()) as u16).to_be_bytes());
        server_name_ext.extend_from_slice(&ext_body);

        let mut extensions = Vec::new();
        extensions.extend_from_slice(&EXT_SERVER_NAME.to_be_bytes());
        extensions.extend_from_slice(&(server_name_ext.len() as u16).to_be_bytes());
        extensions.extend_from_slice(&server_name_ext);

        let mut body = Vec::new();
        body.extend_from_slice(&[0x03, 0x03]); // client_version
        body.extend_from_slice(&[0u8; 32]); // random
        body.push(0); // session_id_len
        body.extend_from_slice(&[0x00, 0x02, 0x00, 0x2f]); // cipher suites
        body.extend_from_slice(&[0x01, 0x00]); // compression methods
        body.extend_from_slice(&(extensions.len() as u16).to_be_bytes());
        body.extend_from_slice(&extensions);

        let mut handshake = Vec::new();
        handshake.push(HANDSHAKE_CLIENT_HELLO);
        let body_len = body.len() as u32;
        handshake.push((body_len >> 16) as u8);
        handshake.push((body_len >> 8) as u8);
        handshake.push(body_len as u8);
        handshake.extend_from_slice(&body);

        let mut record = Vec::new();
        record.push(RECORD_HANDSHAKE);
        record.extend_from_slice(&[0x03, 0x03]); // record version
        record.extend_from_slice(&(handshake.len() as u16).to_be_bytes());
        record.extend_from_slice(&handshake);
        record
    }

    #[test]
    fn extracts_sni_host_name() {
        let record = client_hello_with_sni("example.com");
        assert_eq!(parse_client_hello_sni(&record).unwrap(), "example.com");
    }

    #[test]
    fn non_handshake_record_is_rejected() {
        let mut record = client_hello_with_sni("example.com");
        record[0] = 0x17; // application data
        assert!(parse_client_hello_sni(&record).is_err());
    }

    #[test]
    fn truncated_record_is_rejected() {
        let record = client_hello_with_sni("example.com");
        assert!(parse_client_hello_sni(&record[..record.len() - 20]).is_err());
    }
}
