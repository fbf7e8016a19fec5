//! Builders for small glTF/GLB test assets.

#![allow(dead_code)]

use base64::Engine as _;
use gltf_import_io::chunk_reader::{GLB_CHUNK_BIN, GLB_CHUNK_JSON, GLB_MAGIC, GLB_VERSION};
use serde_json::{json, Value};

pub const BYTE: u32 = 5120;
pub const UNSIGNED_BYTE: u32 = 5121;
pub const UNSIGNED_SHORT: u32 = 5123;
pub const UNSIGNED_INT: u32 = 5125;
pub const FLOAT: u32 = 5126;

/// Collects one binary buffer plus the JSON entities pointing into it.
#[derive(Default)]
pub struct GltfBuilder {
    bin: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
    meshes: Vec<Value>,
    materials: Vec<Value>,
}

impl GltfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bin(&self) -> &[u8] {
        &self.bin
    }

    /// Appends `bytes` as a new buffer view, 4-byte aligned.
    pub fn push_view(&mut self, bytes: &[u8], stride: Option<usize>) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let mut view = json!({
            "buffer": 0,
            "byteOffset": self.bin.len(),
            "byteLength": bytes.len(),
        });
        if let Some(stride) = stride {
            view["byteStride"] = json!(stride);
        }
        self.bin.extend_from_slice(bytes);
        self.views.push(view);
        self.views.len() - 1
    }

    /// Adds an accessor; `extra` is merged into its JSON object.
    pub fn push_accessor(
        &mut self,
        view: Option<usize>,
        component_type: u32,
        element_type: &str,
        count: usize,
        extra: Value,
    ) -> usize {
        let mut accessor = json!({
            "componentType": component_type,
            "type": element_type,
            "count": count,
        });
        if let Some(view) = view {
            accessor["bufferView"] = json!(view);
        }
        if let (Some(target), Some(extra)) = (accessor.as_object_mut(), extra.as_object()) {
            for (key, value) in extra {
                target.insert(key.clone(), value.clone());
            }
        }
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    pub fn vec3_f32(&mut self, values: &[[f32; 3]]) -> usize {
        let bytes: Vec<u8> = values
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let view = self.push_view(&bytes, None);
        self.push_accessor(Some(view), FLOAT, "VEC3", values.len(), json!({}))
    }

    pub fn indices_u16(&mut self, values: &[u16]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = self.push_view(&bytes, None);
        self.push_accessor(Some(view), UNSIGNED_SHORT, "SCALAR", values.len(), json!({}))
    }

    pub fn push_material(&mut self, name: &str) -> usize {
        self.materials.push(json!({ "name": name }));
        self.materials.len() - 1
    }

    pub fn push_mesh(&mut self, name: Option<&str>, primitives: Vec<Value>) -> usize {
        let mut mesh = json!({ "primitives": primitives });
        if let Some(name) = name {
            mesh["name"] = json!(name);
        }
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    /// The glTF JSON, with buffer 0 pointing at `uri` (or a binary chunk).
    pub fn json(&self, uri: Option<String>) -> Value {
        let mut buffer = json!({ "byteLength": self.bin.len() });
        if let Some(uri) = uri {
            buffer["uri"] = json!(uri);
        }
        json!({
            "asset": { "version": "2.0" },
            "buffers": [buffer],
            "bufferViews": self.views,
            "accessors": self.accessors,
            "meshes": self.meshes,
            "materials": self.materials,
        })
    }

    pub fn to_glb(&self) -> Vec<u8> {
        let json = serde_json::to_vec(&self.json(None)).unwrap();
        glb(&json, &[&self.bin])
    }

    /// `.gltf` text with the buffer embedded as a base64 data URI.
    pub fn to_embedded_gltf(&self) -> Vec<u8> {
        let uri = format!(
            "data:application/octet-stream;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.bin)
        );
        serde_json::to_vec(&self.json(Some(uri))).unwrap()
    }
}

/// Packs a JSON chunk and binary chunks into a GLB container.
///
/// JSON is padded with spaces and binary chunks with zeros.
pub fn glb(json: &[u8], bin_chunks: &[&[u8]]) -> Vec<u8> {
    let mut chunks = Vec::new();
    chunks.extend(chunk(GLB_CHUNK_JSON, json, b' '));
    for bin in bin_chunks {
        chunks.extend(chunk(GLB_CHUNK_BIN, bin, 0));
    }

    let total_len = 12 + chunks.len();
    let mut output = Vec::with_capacity(total_len);
    output.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    output.extend_from_slice(&GLB_VERSION.to_le_bytes());
    output.extend_from_slice(&(total_len as u32).to_le_bytes());
    output.extend_from_slice(&chunks);
    output
}

fn chunk(chunk_type: u32, body: &[u8], pad: u8) -> Vec<u8> {
    let padding = (4 - (body.len() % 4)) % 4;
    let padded_len = body.len() + padding;

    let mut output = Vec::with_capacity(8 + padded_len);
    output.extend_from_slice(&(padded_len as u32).to_le_bytes());
    output.extend_from_slice(&chunk_type.to_le_bytes());
    output.extend_from_slice(body);
    output.extend(std::iter::repeat(pad).take(padding));
    output
}

/// A primitive JSON object.
pub fn primitive(attributes: Value, indices: Option<usize>) -> Value {
    let mut primitive = json!({ "attributes": attributes });
    if let Some(indices) = indices {
        primitive["indices"] = json!(indices);
    }
    primitive
}
