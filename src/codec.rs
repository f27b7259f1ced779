//! Authenticated-encrypted snapshot framing (spec.md §4.I, §6).
//!
//! Each record on disk is a little-endian `u32` length followed by that
//! many bytes of `nonce (24 B) || ciphertext`. `ciphertext` is the ordinary
//! secretbox output (`plaintext_len + 16` MAC bytes appended).

use std::io::{Read, Write};

use aead::{Aead, AeadCore, KeyInit, OsRng};
use crypto_secretbox::{Key, XSalsa20Poly1305};

use crate::error::CodecError;

const NONCE_LEN: usize = 24;
const MAC_LEN: usize = 16;
/// Guards against a corrupt length prefix forcing an enormous allocation.
const MAX_RECORD_LEN: usize = 16 * 1024 * 1024;

/// Encrypts one plaintext record (spec.md §4.I) for the encrypted snapshot file.
pub fn encrypt_record(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
    let cipher = XSalsa20Poly1305::new(Key::from_slice(key));
    let nonce = XSalsa20Poly1305::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CodecError::EncryptionFailed)?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Reverses [`encrypt_record`]: splits the nonce prefix, authenticates and
/// decrypts the remainder.
pub fn decrypt_record(key: &[u8; 32], framed: &[u8]) -> Result<Vec<u8>, CodecError> {
    if framed.len() < NONCE_LEN + MAC_LEN {
        return Err(CodecError::ShortCiphertext);
    }
    let (nonce_bytes, ciphertext) = framed.split_at(NONCE_LEN);
    let cipher = XSalsa20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(nonce_bytes.into(), ciphertext)
        .map_err(|_| CodecError::DecryptionFailed)
}

/// Writes one length-prefixed, encrypted record to `out` (spec.md §6).
pub fn write_record<W: Write>(out: &mut W, key: &[u8; 32], plaintext: &[u8]) -> Result<(), CodecError> {
    let framed = encrypt_record(key, plaintext)?;
    if framed.len() > MAX_RECORD_LEN {
        return Err(CodecError::RecordTooLarge(framed.len()));
    }
    out.write_all(&(framed.len() as u32).to_le_bytes())?;
    out.write_all(&framed)?;
    Ok(())
}

/// Reads one length-prefixed, encrypted record from `input`. Returns `Ok(None)`
/// at a clean EOF on a record boundary.
pub fn read_record<R: Read>(input: &mut R, key: &[u8; 32]) -> Result<Option<Vec<u8>>, CodecError> {
    let mut len_buf = [0u8; 4];
    match read_exact_or_eof(input, &mut len_buf)? {
        false => return Ok(None),
        true => {}
    }
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_RECORD_LEN {
        return Err(CodecError::RecordTooLarge(len));
    }
    let mut framed = vec![0u8; len];
    input.read_exact(&mut framed).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            CodecError::TruncatedFrame {
                expected: len,
                got: 0,
            }
        } else {
            CodecError::Io(e)
        }
    })?;
    let plaintext = decrypt_record(key, &framed)?;
    Ok(Some(plaintext))
}

/// Like `Read::read_exact`, but returns `Ok(false)` instead of erroring when
/// zero bytes are available at the very start of the read (clean EOF).
fn read_exact_or_eof<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<bool, CodecError> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => {
                if filled == 0 {
                    return Ok(false);
                }
                return Err(CodecError::TruncatedFrame {
                    expected: buf.len(),
                    got: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CodecError::Io(e)),
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_record_through_the_stream_framing() {
        let key = [9u8; 32];
        let mut buf = Vec::new();
        write_record(&mut buf, &key, b"timestamp,Device,IP").unwrap();
        write_record(&mut buf, &key, b"second,row,here").unwrap();

        let mut cursor = Cursor::new(buf);
        let first = read_record(&mut cursor, &key).unwrap().unwrap();
        let second = read_record(&mut cursor, &key).unwrap().unwrap();
        let eof = read_record(&mut cursor, &key).unwrap();

        assert_eq!(first, b"timestamp,Device,IP");
        assert_eq!(second, b"second,row,here");
        assert!(eof.is_none());
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let key = [1u8; 32];
        let other_key = [2u8; 32];
        let mut buf = Vec::new();
        write_record(&mut buf, &key, b"secret row").unwrap();
        let mut cursor = Cursor::new(buf);
        let err = read_record(&mut cursor, &other_key).unwrap_err();
        assert!(matches!(err, CodecError::DecryptionFailed));
    }

    #[test]
    fn nonces_differ_across_records_of_identical_plaintext() {
        let key = [3u8; 32];
        let a = encrypt_record(&key, b"same plaintext").unwrap();
        let b = encrypt_record(&key, b"same plaintext").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn short_ciphertext_is_rejected() {
        let key = [4u8; 32];
        let err = decrypt_record(&key, &[0u8; 10]).unwrap_err();
        assert!(matches!(err, CodecError::ShortCiphertext));
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(24))]

        #[test]
        fn round_trips_arbitrary_plaintext_up_to_64kib(plaintext in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..=65536)) {
            let key = [5u8; 32];
            let mut buf = Vec::new();
            write_record(&mut buf, &key, &plaintext).unwrap();
            let mut cursor = Cursor::new(buf);
            let decoded = read_record(&mut cursor, &key).unwrap().unwrap();
            proptest::prop_assert_eq!(decoded, plaintext);
        }
    }
}
