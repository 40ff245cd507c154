//! Decompression of uploaded file parts.
//!
//! Clients pick the codec through the name of the multipart field they upload
//! the log under. Anything that is not explicitly uncompressed or gzipped goes
//! through the legacy adaptive codec.

use std::io::Read;

use bytes::Bytes;
use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use tracing::debug;

use crate::api::DecompressionError;

pub const UNCOMPRESSED_FIELD_NAME: &str = "uncompressedfile";
pub const GZIP_FIELD_NAME: &str = "gzippedfile";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum UploadCompressionType {
    None,
    Gzip,
    #[default]
    Default,
}

impl UploadCompressionType {
    pub fn from_field_name(name: &str) -> Self {
        match name {
            UNCOMPRESSED_FIELD_NAME => UploadCompressionType::None,
            GZIP_FIELD_NAME => UploadCompressionType::Gzip,
            _ => UploadCompressionType::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadCompressionType::None => "none",
            UploadCompressionType::Gzip => "gzip",
            UploadCompressionType::Default => "default",
        }
    }
}

impl std::fmt::Display for UploadCompressionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decompress a whole file part under the given codec.
pub fn decompress(
    codec: UploadCompressionType,
    input: Bytes,
) -> Result<Bytes, DecompressionError> {
    let output = match codec {
        UploadCompressionType::None => input,
        UploadCompressionType::Gzip => decompress_gzip(&input)?,
        UploadCompressionType::Default => decompress_default(&input)?,
    };
    debug!(codec = %codec, len = output.len(), "decompressed file part");
    Ok(output)
}

fn decompress_gzip(input: &[u8]) -> Result<Bytes, DecompressionError> {
    let mut decoder = MultiGzDecoder::new(input);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(DecompressionError::Gzip)?;
    Ok(Bytes::from(decompressed))
}

/// The legacy codec: old clients sent gzip, zlib or raw deflate streams without
/// saying which, so sniff the header and fall back to raw deflate.
fn decompress_default(input: &[u8]) -> Result<Bytes, DecompressionError> {
    if input.is_empty() {
        return Err(DecompressionError::Default(String::from("empty input")));
    }

    let decompressed = if input.starts_with(&GZIP_MAGIC) {
        read_all(MultiGzDecoder::new(input))
            .map_err(|e| DecompressionError::Default(format!("gzip stream: {e}")))?
    } else if looks_like_zlib(input) {
        match read_all(ZlibDecoder::new(input)) {
            Ok(decompressed) => decompressed,
            Err(zlib_err) => {
                debug!("zlib decoding failed, trying raw deflate: {}", zlib_err);
                read_all(DeflateDecoder::new(input)).map_err(|e| {
                    DecompressionError::Default(format!("zlib: {zlib_err}, deflate: {e}"))
                })?
            }
        }
    } else {
        read_all(DeflateDecoder::new(input))
            .map_err(|e| DecompressionError::Default(format!("deflate stream: {e}")))?
    };

    if decompressed.is_empty() {
        return Err(DecompressionError::Default(String::from(
            "stream produced no output",
        )));
    }
    Ok(Bytes::from(decompressed))
}

fn read_all<R: Read>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

// RFC 1950: CM must be 8 (deflate), CINFO at most 7, and CMF*256 + FLG a multiple of 31.
fn looks_like_zlib(input: &[u8]) -> bool {
    match input {
        [cmf, flg, ..] => {
            cmf & 0x0f == 8 && cmf >> 4 <= 7 && (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
    use flate2::Compression;

    use super::*;

    const LOG: &[u8] = b"{\"timestamp\":1,\"identifier\":\"Wifi\",\"dataBlob\":\"[]\"}\n";

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn codec_is_selected_by_field_name() {
        assert_eq!(
            UploadCompressionType::from_field_name("uncompressedfile"),
            UploadCompressionType::None
        );
        assert_eq!(
            UploadCompressionType::from_field_name("gzippedfile"),
            UploadCompressionType::Gzip
        );
        assert_eq!(
            UploadCompressionType::from_field_name("file"),
            UploadCompressionType::Default
        );
        assert_eq!(
            UploadCompressionType::from_field_name(""),
            UploadCompressionType::Default
        );
        // exact match only
        assert_eq!(
            UploadCompressionType::from_field_name("GzippedFile"),
            UploadCompressionType::Default
        );
    }

    #[test]
    fn none_is_identity() {
        for input in [&b""[..], &b"\x00\xff\x1f\x8b"[..], LOG] {
            let output = decompress(UploadCompressionType::None, Bytes::copy_from_slice(input));
            assert_eq!(output.unwrap().as_ref(), input);
        }
    }

    #[test]
    fn gzip_round_trips() {
        let output = decompress(UploadCompressionType::Gzip, gzip(LOG).into()).unwrap();
        assert_eq!(output.as_ref(), LOG);
    }

    #[test]
    fn gzip_reads_concatenated_members() {
        let mut input = gzip(b"first\n");
        input.extend(gzip(b"second\n"));
        let output = decompress(UploadCompressionType::Gzip, input.into()).unwrap();
        assert_eq!(output.as_ref(), b"first\nsecond\n");
    }

    #[test]
    fn corrupted_gzip_fails() {
        let err = decompress(
            UploadCompressionType::Gzip,
            Bytes::from_static(b"this is not gzip at all"),
        )
        .unwrap_err();
        assert!(matches!(err, DecompressionError::Gzip(_)));
        assert_eq!(err.cause(), "gzip");

        let truncated = gzip(LOG)[..5].to_vec();
        assert!(decompress(UploadCompressionType::Gzip, truncated.into()).is_err());
    }

    #[test]
    fn default_detects_gzip() {
        let output = decompress(UploadCompressionType::Default, gzip(LOG).into()).unwrap();
        assert_eq!(output.as_ref(), LOG);
    }

    #[test]
    fn default_detects_zlib() {
        let input = zlib(LOG);
        assert!(looks_like_zlib(&input));
        let output = decompress(UploadCompressionType::Default, input.into()).unwrap();
        assert_eq!(output.as_ref(), LOG);
    }

    #[test]
    fn default_falls_back_to_raw_deflate() {
        let output = decompress(UploadCompressionType::Default, deflate(LOG).into()).unwrap();
        assert_eq!(output.as_ref(), LOG);
    }

    #[test]
    fn default_fails_on_garbage() {
        // block type 3 is reserved in deflate
        let err = decompress(
            UploadCompressionType::Default,
            Bytes::from_static(&[0x07, 0xff, 0xff, 0xff]),
        )
        .unwrap_err();
        assert!(matches!(err, DecompressionError::Default(_)));
    }

    #[test]
    fn default_fails_without_output() {
        let err = decompress(UploadCompressionType::Default, Bytes::new()).unwrap_err();
        assert_eq!(err.cause(), "default");

        let err = decompress(UploadCompressionType::Default, deflate(b"").into()).unwrap_err();
        assert_eq!(err.cause(), "default");
    }
}
