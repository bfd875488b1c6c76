//! Surface codings for message bodies.
//!
//! Request bodies are decoded and response bodies encoded according to
//! `Content-Encoding`: gzip (and its `x-` alias) through DEFLATE, and
//! compress through LZW with MSB bit order and an 8 bit initial code
//! width, matching `compress(1)`. Unknown encodings pass through.

use std::fmt;
use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use weezl::BitOrder;

use crate::error::Error;
use crate::headers::ContentEncoding;

const LZW_CODE_WIDTH: u8 = 8;

pub(crate) fn decode(body: &[u8], encoding: Option<&ContentEncoding>) -> Result<Vec<u8>, Error> {
    match encoding {
        Some(ContentEncoding::Gzip | ContentEncoding::XGzip) => {
            gzip_decode(body).map_err(decode_error)
        }
        Some(ContentEncoding::Compress | ContentEncoding::XCompress) => {
            let mut decoder = weezl::decode::Decoder::new(BitOrder::Msb, LZW_CODE_WIDTH);
            decoder.decode(body).map_err(decode_error)
        }
        _ => Ok(body.to_vec()),
    }
}

pub(crate) fn encode(body: &[u8], encoding: Option<&ContentEncoding>) -> Result<Vec<u8>, Error> {
    match encoding {
        Some(ContentEncoding::Gzip | ContentEncoding::XGzip) => {
            gzip_encode(body).map_err(decode_error)
        }
        Some(ContentEncoding::Compress | ContentEncoding::XCompress) => {
            let mut encoder = weezl::encode::Encoder::new(BitOrder::Msb, LZW_CODE_WIDTH);
            encoder.encode(body).map_err(decode_error)
        }
        _ => Ok(body.to_vec()),
    }
}

fn decode_error(err: impl fmt::Display) -> Error {
    Error::server(format!("unexpected issue decoding body: {err}"))
}

fn gzip_decode(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoded = Vec::new();
    GzDecoder::new(body).read_to_end(&mut decoded)?;
    Ok(decoded)
}

fn gzip_encode(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body)?;
    encoder.finish()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gzip() {
        let encoded = encode(b"hello world", Some(&ContentEncoding::Gzip)).unwrap();
        assert_ne!(encoded, b"hello world");
        assert_eq!(
            decode(&encoded, Some(&ContentEncoding::XGzip)).unwrap(),
            b"hello world"
        );

        // not a gzip stream
        assert!(decode(b"hello world", Some(&ContentEncoding::Gzip)).is_err());
    }

    #[test]
    fn test_compress() {
        let encoded = encode(b"abababababab", Some(&ContentEncoding::Compress)).unwrap();
        assert_eq!(
            decode(&encoded, Some(&ContentEncoding::XCompress)).unwrap(),
            b"abababababab"
        );
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(decode(b"as-is", None).unwrap(), b"as-is");
        let ext = ContentEncoding::Extension("br".into());
        assert_eq!(decode(b"as-is", Some(&ext)).unwrap(), b"as-is");
        assert_eq!(encode(b"as-is", Some(&ext)).unwrap(), b"as-is");
    }
}
