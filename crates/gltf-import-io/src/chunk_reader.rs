//! Splitting glTF sources into their JSON and binary parts.
//!
//! A `.glb` container is a 12-byte header followed by length-prefixed,
//! type-tagged chunks. A `.gltf` file is plain JSON; its whole content is
//! the JSON chunk and it has no binary chunks. Chunks are returned as
//! sub-slices of the input.

use byteorder::{ByteOrder, LittleEndian};
use gltf_import_core::status::{EntityRef, ImportError, ImportResult};

pub const GLB_MAGIC: u32 = 0x46546C67; // "glTF" in little-endian
pub const GLB_VERSION: u32 = 2;
pub const GLB_CHUNK_JSON: u32 = 0x4E4F534A; // "JSON"
pub const GLB_CHUNK_BIN: u32 = 0x004E4942; // "BIN\0"

pub const GLB_HEADER_LEN: usize = 12;
pub const GLB_CHUNK_HEADER_LEN: usize = 8;

/// How a source was packaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceForm {
    /// `.gltf`: JSON text with external or embedded buffers.
    Text,
    /// `.glb`: binary container.
    Binary,
}

/// The parts of a glTF source.
#[derive(Debug, Clone)]
pub struct Container<'a> {
    pub form: SourceForm,
    pub json: &'a [u8],
    /// Binary chunks in file order; empty for text sources.
    pub binary_chunks: Vec<&'a [u8]>,
}

/// Returns true if `data` starts with the GLB magic.
pub fn is_binary_container(data: &[u8]) -> bool {
    data.len() >= 4 && LittleEndian::read_u32(&data[0..4]) == GLB_MAGIC
}

/// Splits a source of either form.
pub fn split_source(data: &[u8]) -> ImportResult<Container<'_>> {
    if is_binary_container(data) {
        read_container(data)
    } else {
        Ok(Container {
            form: SourceForm::Text,
            json: data,
            binary_chunks: Vec::new(),
        })
    }
}

/// Rounds a chunk length up to the 4-byte chunk alignment.
pub fn align4(len: usize) -> usize {
    (len + 3) & !3
}

/// Parses a GLB container.
///
/// # Errors
///
/// `Format` for a bad magic or version, a truncated header or chunk, a first
/// chunk that is not JSON, or an unknown chunk type ahead of the first
/// binary chunk.
pub fn read_container(data: &[u8]) -> ImportResult<Container<'_>> {
    let doc = EntityRef::document();
    if data.len() < GLB_HEADER_LEN {
        return Err(ImportError::format(doc, "file too small for GLB header"));
    }

    let magic = LittleEndian::read_u32(&data[0..4]);
    let version = LittleEndian::read_u32(&data[4..8]);
    let length = LittleEndian::read_u32(&data[8..12]) as usize;

    if magic != GLB_MAGIC {
        return Err(ImportError::format(doc, "invalid GLB magic"));
    }
    if version != GLB_VERSION {
        return Err(ImportError::format(
            doc,
            format!("unsupported GLB version: {}", version),
        ));
    }
    if length > data.len() {
        return Err(ImportError::format(
            doc,
            format!(
                "container truncated: header declares {} bytes, file has {}",
                length,
                data.len()
            ),
        ));
    }
    if length < GLB_HEADER_LEN {
        return Err(ImportError::format(
            doc,
            format!("declared length {} is smaller than the header", length),
        ));
    }

    let mut offset = GLB_HEADER_LEN;
    let mut chunk_index = 0;
    let mut json: Option<&[u8]> = None;
    let mut binary_chunks = Vec::new();

    while offset < length {
        let entity = EntityRef::chunk(chunk_index);
        if length - offset < GLB_CHUNK_HEADER_LEN {
            return Err(ImportError::format(entity, "truncated chunk header"));
        }
        let chunk_length = LittleEndian::read_u32(&data[offset..offset + 4]) as usize;
        let chunk_type = LittleEndian::read_u32(&data[offset + 4..offset + 8]);
        let body_start = offset + GLB_CHUNK_HEADER_LEN;

        if chunk_length > length - body_start {
            return Err(ImportError::format(
                entity,
                format!(
                    "chunk of {} bytes at byte {} extends past the container end at byte {}",
                    chunk_length, body_start, length
                ),
            ));
        }
        let body = &data[body_start..body_start + chunk_length];

        match chunk_type {
            GLB_CHUNK_JSON if chunk_index == 0 => json = Some(body),
            _ if chunk_index == 0 => {
                return Err(ImportError::format(
                    entity,
                    format!("first chunk must be JSON, found type 0x{:08X}", chunk_type),
                ));
            }
            GLB_CHUNK_JSON => {
                return Err(ImportError::format(entity, "duplicate JSON chunk"));
            }
            GLB_CHUNK_BIN => binary_chunks.push(body),
            unknown if binary_chunks.is_empty() => {
                return Err(ImportError::format(
                    entity,
                    format!("unrecognized chunk type 0x{:08X} before the binary chunk", unknown),
                ));
            }
            unknown => {
                tracing::debug!(chunk = chunk_index, chunk_type = unknown, "skipping unknown chunk");
            }
        }

        tracing::debug!(
            chunk = chunk_index,
            offset,
            length = chunk_length,
            "read GLB chunk"
        );

        offset = body_start + align4(chunk_length);
        chunk_index += 1;
    }

    let json = json.ok_or_else(|| ImportError::format(doc, "container has no JSON chunk"))?;
    Ok(Container {
        form: SourceForm::Binary,
        json,
        binary_chunks,
    })
}
