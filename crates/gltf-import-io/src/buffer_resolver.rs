//! Turning buffer declarations into immutable byte blobs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use gltf_import_core::entities::{Buffer, BufferSource, Document};
use gltf_import_core::geometry_indices::{BufferIndex, IndexVec};
use gltf_import_core::status::{EntityRef, ImportError, ImportResult};

/// Marker separating the media type of a data URI from a base64 payload.
pub const BASE64_MARKER: &str = ";base64,";

/// Standard alphabet; accepts payloads with or without `=` padding.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Resolves every buffer of `document`.
///
/// Buffers without a `uri` claim `binary_chunks` in order. Relative file
/// references are looked up in `base_dir` (the working directory when
/// `None`).
pub fn resolve_buffers(
    document: &Document,
    binary_chunks: &[&[u8]],
    base_dir: Option<&Path>,
) -> ImportResult<IndexVec<BufferIndex, Arc<[u8]>>> {
    let mut chunks = binary_chunks.iter();
    let mut resolved = IndexVec::with_capacity(document.buffers.len());

    for (index, buffer) in document.buffers.iter_enumerated() {
        let entity = EntityRef::buffer(index.0 as usize);
        let bytes: Arc<[u8]> = match &buffer.source {
            BufferSource::BinaryChunk => {
                let chunk = chunks.next().ok_or_else(|| {
                    ImportError::format(entity, "buffer has no uri and no binary chunk is left")
                })?;
                Arc::from(*chunk)
            }
            BufferSource::Base64(payload) => decode_base64(entity, payload)?.into(),
            BufferSource::DataUri(uri) => decode_data_uri(entity, uri)?.into(),
            BufferSource::File(uri) => read_external(entity, uri, base_dir)?.into(),
        };
        check_length(entity, buffer, &bytes)?;

        tracing::debug!(
            buffer = index.0,
            declared = buffer.byte_length,
            resolved = bytes.len(),
            "resolved buffer"
        );
        resolved.push(bytes);
    }

    Ok(resolved)
}

fn check_length(entity: EntityRef, buffer: &Buffer, bytes: &[u8]) -> ImportResult<()> {
    if bytes.len() < buffer.byte_length {
        return Err(ImportError::format(
            entity,
            format!(
                "resolved {} bytes but byteLength is {}",
                bytes.len(),
                buffer.byte_length
            ),
        ));
    }
    Ok(())
}

/// Decodes the payload of a `data:` URI.
///
/// Base64 payloads follow the `;base64,` marker; anything else is
/// percent-decoded after the first comma.
pub fn decode_data_uri(entity: EntityRef, uri: &str) -> ImportResult<Vec<u8>> {
    if let Some(pos) = uri.find(BASE64_MARKER) {
        return decode_base64(entity, &uri[pos + BASE64_MARKER.len()..]);
    }
    let comma = uri
        .find(',')
        .ok_or_else(|| ImportError::format(entity, "data URI has no comma"))?;
    Ok(percent_decode(&uri[comma + 1..]))
}

/// Decodes standard base64, ignoring CR/LF and missing padding.
pub fn decode_base64(entity: EntityRef, payload: &str) -> ImportResult<Vec<u8>> {
    let cleaned: Vec<u8> = payload
        .bytes()
        .filter(|&b| b != b'\n' && b != b'\r')
        .collect();
    BASE64
        .decode(cleaned)
        .map_err(|e| ImportError::format(entity, format!("invalid base64 payload: {}", e)))
}

/// Resolves a percent-encoded file reference against `base_dir`.
pub fn external_path(
    entity: EntityRef,
    uri: &str,
    base_dir: Option<&Path>,
) -> ImportResult<PathBuf> {
    let decoded = String::from_utf8(percent_decode(uri))
        .map_err(|_| ImportError::format(entity, "uri is not valid UTF-8 once decoded"))?;
    let path = PathBuf::from(decoded);
    Ok(match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path,
    })
}

fn read_external(entity: EntityRef, uri: &str, base_dir: Option<&Path>) -> ImportResult<Vec<u8>> {
    let path = external_path(entity, uri, base_dir)?;
    fs::read(&path).map_err(|e| ImportError::io(entity, path, e))
}

/// Decodes `%XX` escapes; malformed escapes are kept literally.
pub fn percent_decode(input: &str) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                output.push((h << 4) | l);
                i += 3;
                continue;
            }
        }
        output.push(bytes[i]);
        i += 1;
    }

    output
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gltf_import_core::status::ErrorKind;

    const ENTITY: EntityRef = EntityRef::buffer(0);

    fn document(buffers: Vec<Buffer>) -> Document {
        Document {
            buffers: IndexVec::from_vec(buffers),
            ..Document::default()
        }
    }

    fn buffer(byte_length: usize, source: BufferSource) -> Buffer {
        Buffer {
            name: None,
            byte_length,
            source,
        }
    }

    #[test]
    fn test_base64_decode() {
        assert_eq!(decode_base64(ENTITY, "SGVsbG8=").unwrap(), b"Hello");
        assert_eq!(decode_base64(ENTITY, "SGVsbG8").unwrap(), b"Hello");
        assert_eq!(decode_base64(ENTITY, "SGVs\r\nbG8=").unwrap(), b"Hello");
        assert_eq!(decode_base64(ENTITY, "YWJj").unwrap(), b"abc");

        let err = decode_base64(ENTITY, "SGV$bG8=").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("Hello%20World"), b"Hello World");
        assert_eq!(percent_decode("%2F"), b"/");
        assert_eq!(percent_decode("test"), b"test");
        assert_eq!(percent_decode("100%"), b"100%");
        assert_eq!(percent_decode("%zz"), b"%zz");
    }

    #[test]
    fn test_data_uri_forms() {
        let base64 = "data:application/octet-stream;base64,AQIDBA==";
        assert_eq!(decode_data_uri(ENTITY, base64).unwrap(), vec![1, 2, 3, 4]);

        let plain = "data:text/plain,a%20b";
        assert_eq!(decode_data_uri(ENTITY, plain).unwrap(), b"a b");

        assert!(decode_data_uri(ENTITY, "data:nothing").is_err());
    }

    #[test]
    fn test_binary_chunks_are_claimed_in_order() {
        let doc = document(vec![
            buffer(2, BufferSource::BinaryChunk),
            buffer(1, BufferSource::Base64("/w==".into())),
            buffer(3, BufferSource::BinaryChunk),
        ]);
        let first = [1u8, 2, 0, 0];
        let second = [7u8, 8, 9, 0];
        let resolved = resolve_buffers(&doc, &[&first[..], &second[..]], None).unwrap();

        assert_eq!(&*resolved.as_slice()[0], &first[..]);
        assert_eq!(&*resolved.as_slice()[1], &[0xFF][..]);
        assert_eq!(&*resolved.as_slice()[2], &second[..]);
    }

    #[test]
    fn test_missing_binary_chunk() {
        let doc = document(vec![buffer(4, BufferSource::BinaryChunk)]);
        let err = resolve_buffers(&doc, &[], None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(err.entity(), ENTITY);
    }

    #[test]
    fn test_short_content_is_rejected() {
        let doc = document(vec![buffer(8, BufferSource::Base64("AQID".into()))]);
        let err = resolve_buffers(&doc, &[], None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_external_path() {
        let base = Path::new("assets");
        assert_eq!(
            external_path(ENTITY, "mesh%20data.bin", Some(base)).unwrap(),
            Path::new("assets").join("mesh data.bin")
        );
        assert_eq!(
            external_path(ENTITY, "mesh.bin", None).unwrap(),
            PathBuf::from("mesh.bin")
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let doc = document(vec![buffer(4, BufferSource::File("does-not-exist.bin".into()))]);
        let dir = Path::new("/nonexistent-gltf-import-dir");
        let err = resolve_buffers(&doc, &[], Some(dir)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("does-not-exist.bin"));
    }
}
