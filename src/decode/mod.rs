//! Response body decoding.
//!
//! The engine captures the raw upstream body and hands the handler a decoded
//! view. Decoding is lazy: constructing a reader performs no decompression;
//! bytes are pulled on demand, so memory stays bounded by the captured copy
//! plus streaming decompressor state. The captured buffer itself is never
//! mutated.

use std::io::Read;

use thiserror::Error;

/// Internal buffer handed to the streaming brotli decompressor.
const BROTLI_BUFFER_SIZE: usize = 4096;

/// Failed to set up decoding for a captured body.
///
/// The engine logs it and falls back to the raw bytes; the client response
/// is unaffected either way.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body does not start with a valid gzip member header.
    #[error("malformed gzip stream: {0}")]
    Gzip(String),
}

/// Content-encoding of an upstream response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Identity,
    Gzip,
    Brotli,
}

impl Encoding {
    /// Map a `content-encoding` header token to an encoding.
    ///
    /// Unrecognized tokens (and the absent header) decode as identity: the
    /// captured bytes pass through unchanged.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("gzip") => Encoding::Gzip,
            Some("br") => Encoding::Brotli,
            _ => Encoding::Identity,
        }
    }
}

/// Build a lazy reader yielding the decoded view of `body`.
///
/// Gzip streams with a malformed member header fail here, matching an
/// eager header parse; payload corruption in either codec surfaces on read.
/// Brotli framing is not validated up front at all; its errors are lazy.
pub fn reader(encoding: Encoding, body: &[u8]) -> Result<Box<dyn Read + '_>, DecodeError> {
    match encoding {
        Encoding::Identity => Ok(Box::new(body)),
        Encoding::Gzip => {
            check_gzip_header(body)?;
            Ok(Box::new(flate2::read::GzDecoder::new(body)))
        }
        Encoding::Brotli => Ok(Box::new(brotli::Decompressor::new(body, BROTLI_BUFFER_SIZE))),
    }
}

/// RFC 1952 member header: magic bytes, then the deflate method byte.
fn check_gzip_header(body: &[u8]) -> Result<(), DecodeError> {
    if body.len() < 3 {
        return Err(DecodeError::Gzip("truncated header".into()));
    }
    if body[0] != 0x1f || body[1] != 0x8b {
        return Err(DecodeError::Gzip("bad magic".into()));
    }
    if body[2] != 8 {
        return Err(DecodeError::Gzip(format!(
            "unsupported compression method {}",
            body[2]
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn read_all(encoding: Encoding, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        reader(encoding, body)
            .expect("reader construction")
            .read_to_end(&mut out)
            .expect("read");
        out
    }

    #[test]
    fn identity_passes_bytes_through_unchanged() {
        let body = b"plain response body";
        assert_eq!(read_all(Encoding::Identity, body), body);
    }

    #[test]
    fn unknown_token_maps_to_identity() {
        assert_eq!(Encoding::from_token(Some("zstd")), Encoding::Identity);
        assert_eq!(Encoding::from_token(Some("identity")), Encoding::Identity);
        assert_eq!(Encoding::from_token(None), Encoding::Identity);
        assert_eq!(Encoding::from_token(Some("gzip")), Encoding::Gzip);
        assert_eq!(Encoding::from_token(Some("br")), Encoding::Brotli);
    }

    #[test]
    fn gzip_round_trip_restores_payload() {
        let payload = b"a payload worth compressing, repeated enough to shrink \
                        a payload worth compressing, repeated enough to shrink";
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(payload).unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(read_all(Encoding::Gzip, &compressed), payload);
    }

    #[test]
    fn brotli_round_trip_restores_payload() {
        let payload = b"brotli framed payload, long enough to exercise the stream";
        let mut compressed = Vec::new();
        {
            let mut encoder = brotli::CompressorWriter::new(&mut compressed, 4096, 5, 22);
            encoder.write_all(payload).unwrap();
        }

        assert_eq!(read_all(Encoding::Brotli, &compressed), payload);
    }

    #[test]
    fn malformed_gzip_fails_at_construction() {
        let Err(err) = reader(Encoding::Gzip, b"definitely not gzip") else {
            panic!("expected error");
        };
        assert!(matches!(err, DecodeError::Gzip(_)));

        let Err(err) = reader(Encoding::Gzip, &[0x1f]) else {
            panic!("expected error");
        };
        assert!(matches!(err, DecodeError::Gzip(_)));
    }
}
