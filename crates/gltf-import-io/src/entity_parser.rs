//! JSON entity parsing.
//!
//! The glTF JSON is deserialized into private serde structs mirroring the
//! schema, then converted into the index-keyed [`Document`] of
//! `gltf-import-core`. Every cross-reference is checked here so later stages
//! can index arenas without further validation.

use std::collections::BTreeMap;

use gltf_import_core::component_types::{ComponentType, ElementType};
use gltf_import_core::entities::{
    Accessor, Buffer, BufferSource, BufferView, Document, Image, Material, Mesh, Primitive,
    Sampler, Semantic, Texture, Topology,
};
use gltf_import_core::geometry_indices::{
    AccessorIndex, BufferIndex, BufferViewIndex, Idx, ImageIndex, IndexVec, MaterialIndex,
    SamplerIndex,
};
use gltf_import_core::status::{EntityKind, EntityRef, ImportError, ImportResult};
use serde::Deserialize;

use crate::buffer_resolver::BASE64_MARKER;

/// Required extensions this importer can honor.
pub const SUPPORTED_REQUIRED_EXTENSIONS: &[&str] = &["KHR_mesh_quantization"];

// ============================================================================
// glTF JSON Schema
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfRoot {
    asset: Option<GltfAsset>,
    #[serde(default)]
    accessors: Vec<GltfAccessor>,
    #[serde(default)]
    buffer_views: Vec<GltfBufferView>,
    #[serde(default)]
    buffers: Vec<GltfBuffer>,
    #[serde(default)]
    meshes: Vec<GltfMesh>,
    #[serde(default)]
    materials: Vec<GltfMaterial>,
    #[serde(default)]
    textures: Vec<GltfTexture>,
    #[serde(default)]
    images: Vec<GltfImage>,
    #[serde(default)]
    samplers: Vec<GltfSampler>,
    #[serde(default)]
    extensions_used: Vec<String>,
    #[serde(default)]
    extensions_required: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfAsset {
    version: String,
    min_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfAccessor {
    name: Option<String>,
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    #[serde(default)]
    normalized: bool,
    count: usize,
    #[serde(rename = "type")]
    accessor_type: String,
    min: Option<Vec<f64>>,
    max: Option<Vec<f64>>,
    sparse: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfBufferView {
    name: Option<String>,
    buffer: usize,
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfBuffer {
    name: Option<String>,
    byte_length: usize,
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfMesh {
    name: Option<String>,
    #[serde(default)]
    primitives: Vec<GltfPrimitive>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfPrimitive {
    #[serde(default)]
    attributes: BTreeMap<String, usize>,
    indices: Option<usize>,
    mode: Option<u32>,
    material: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfMaterial {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfTexture {
    name: Option<String>,
    sampler: Option<usize>,
    source: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfImage {
    name: Option<String>,
    uri: Option<String>,
    mime_type: Option<String>,
    buffer_view: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfSampler {
    name: Option<String>,
    mag_filter: Option<u32>,
    min_filter: Option<u32>,
    wrap_s: Option<u32>,
    wrap_t: Option<u32>,
}

// ============================================================================
// Conversion
// ============================================================================

/// Parses glTF JSON text into a validated [`Document`].
///
/// # Errors
///
/// - `Format` for malformed JSON, a missing asset header, dangling
///   references, or `min`/`max` arrays of the wrong length.
/// - `Unsupported` for a non-2.x asset version, unknown required extensions,
///   unknown component or element types, and sparse accessors.
pub fn parse_entities(json: &[u8]) -> ImportResult<Document> {
    let root: GltfRoot = serde_json::from_slice(json)
        .map_err(|e| ImportError::format(EntityRef::document(), e.to_string()))?;

    check_asset(root.asset.as_ref())?;
    check_required_extensions(&root.extensions_required)?;

    let buffers: IndexVec<BufferIndex, Buffer> =
        root.buffers.into_iter().map(convert_buffer).collect();

    let mut buffer_views = IndexVec::with_capacity(root.buffer_views.len());
    for (i, view) in root.buffer_views.into_iter().enumerate() {
        let entity = EntityRef::buffer_view(i);
        let buffer = reference::<BufferIndex, _>(entity, "buffer", view.buffer, &buffers)?;
        buffer_views.push(BufferView {
            name: view.name,
            buffer,
            byte_offset: view.byte_offset,
            byte_length: view.byte_length,
            byte_stride: view.byte_stride,
        });
    }

    let mut accessors = IndexVec::with_capacity(root.accessors.len());
    for (i, accessor) in root.accessors.into_iter().enumerate() {
        accessors.push(convert_accessor(i, accessor, &buffer_views)?);
    }

    let samplers: IndexVec<SamplerIndex, Sampler> = root
        .samplers
        .into_iter()
        .map(|s| Sampler {
            name: s.name,
            mag_filter: s.mag_filter,
            min_filter: s.min_filter,
            wrap_s: s.wrap_s,
            wrap_t: s.wrap_t,
        })
        .collect();

    let mut images = IndexVec::with_capacity(root.images.len());
    for (i, image) in root.images.into_iter().enumerate() {
        let entity = EntityRef::new(EntityKind::Image, i);
        let buffer_view = image
            .buffer_view
            .map(|v| reference::<BufferViewIndex, _>(entity, "bufferView", v, &buffer_views))
            .transpose()?;
        images.push(Image {
            name: image.name,
            uri: image.uri,
            mime_type: image.mime_type,
            buffer_view,
        });
    }

    let mut textures = IndexVec::with_capacity(root.textures.len());
    for (i, texture) in root.textures.into_iter().enumerate() {
        let entity = EntityRef::new(EntityKind::Texture, i);
        let sampler = texture
            .sampler
            .map(|s| reference::<SamplerIndex, _>(entity, "sampler", s, &samplers))
            .transpose()?;
        let source = texture
            .source
            .map(|s| reference::<ImageIndex, _>(entity, "source", s, &images))
            .transpose()?;
        textures.push(Texture {
            name: texture.name,
            sampler,
            source,
        });
    }

    let materials: IndexVec<MaterialIndex, Material> = root
        .materials
        .into_iter()
        .map(|m| Material { name: m.name })
        .collect();

    let mut meshes = IndexVec::with_capacity(root.meshes.len());
    for (i, mesh) in root.meshes.into_iter().enumerate() {
        let mut primitives = Vec::with_capacity(mesh.primitives.len());
        for (p, primitive) in mesh.primitives.into_iter().enumerate() {
            primitives.push(convert_primitive(i, p, primitive, &accessors, &materials)?);
        }
        meshes.push(Mesh {
            name: mesh.name,
            primitives,
        });
    }

    let document = Document {
        buffers,
        buffer_views,
        accessors,
        meshes,
        materials,
        textures,
        images,
        samplers,
        extensions_used: root.extensions_used,
    };

    tracing::debug!(
        buffers = document.buffers.len(),
        buffer_views = document.buffer_views.len(),
        accessors = document.accessors.len(),
        meshes = document.meshes.len(),
        primitives = document.num_primitives(),
        "parsed glTF entities"
    );

    Ok(document)
}

fn check_asset(asset: Option<&GltfAsset>) -> ImportResult<()> {
    let doc = EntityRef::document();
    let asset = asset.ok_or_else(|| ImportError::format(doc, "missing asset"))?;
    let version = asset.min_version.as_deref().unwrap_or(&asset.version);
    if version.split('.').next() != Some("2") {
        return Err(ImportError::unsupported(
            doc,
            format!("asset version {} is not glTF 2.x", version),
        ));
    }
    Ok(())
}

fn check_required_extensions(required: &[String]) -> ImportResult<()> {
    match required
        .iter()
        .find(|ext| !SUPPORTED_REQUIRED_EXTENSIONS.contains(&ext.as_str()))
    {
        Some(ext) => Err(ImportError::unsupported(
            EntityRef::document(),
            format!("required extension {} is not supported", ext),
        )),
        None => Ok(()),
    }
}

fn convert_buffer(buffer: GltfBuffer) -> Buffer {
    let source = match buffer.uri {
        None => BufferSource::BinaryChunk,
        Some(uri) => match uri.find(BASE64_MARKER) {
            Some(pos) => BufferSource::Base64(uri[pos + BASE64_MARKER.len()..].to_owned()),
            None if uri.starts_with("data:") => BufferSource::DataUri(uri),
            None => BufferSource::File(uri),
        },
    };
    Buffer {
        name: buffer.name,
        byte_length: buffer.byte_length,
        source,
    }
}

fn convert_accessor(
    index: usize,
    accessor: GltfAccessor,
    buffer_views: &IndexVec<BufferViewIndex, BufferView>,
) -> ImportResult<Accessor> {
    let entity = EntityRef::accessor(index);

    if accessor.sparse.is_some() {
        return Err(ImportError::unsupported(entity, "sparse accessors"));
    }
    let component_type = ComponentType::from_gl(accessor.component_type).ok_or_else(|| {
        ImportError::unsupported(
            entity,
            format!("component type {}", accessor.component_type),
        )
    })?;
    let element_type = ElementType::parse(&accessor.accessor_type).ok_or_else(|| {
        ImportError::unsupported(entity, format!("element type {}", accessor.accessor_type))
    })?;

    let num_components = element_type.num_components();
    for (label, bounds) in [("min", &accessor.min), ("max", &accessor.max)] {
        if let Some(bounds) = bounds {
            if bounds.len() != num_components {
                return Err(ImportError::format(
                    entity,
                    format!(
                        "{} has {} entries, {} needs {}",
                        label,
                        bounds.len(),
                        element_type.name(),
                        num_components
                    ),
                ));
            }
        }
    }

    let buffer_view = accessor
        .buffer_view
        .map(|v| reference::<BufferViewIndex, _>(entity, "bufferView", v, buffer_views))
        .transpose()?;

    Ok(Accessor {
        name: accessor.name,
        buffer_view,
        byte_offset: accessor.byte_offset,
        component_type,
        element_type,
        count: accessor.count,
        normalized: accessor.normalized,
        min: accessor.min,
        max: accessor.max,
    })
}

fn convert_primitive(
    mesh: usize,
    index: usize,
    primitive: GltfPrimitive,
    accessors: &IndexVec<AccessorIndex, Accessor>,
    materials: &IndexVec<MaterialIndex, Material>,
) -> ImportResult<Primitive> {
    let entity = EntityRef::primitive(mesh, index);

    let mut attributes = BTreeMap::new();
    let mut ignored_attributes = Vec::new();
    for (name, accessor) in primitive.attributes {
        let accessor = reference::<AccessorIndex, _>(entity, &name, accessor, accessors)?;
        match Semantic::parse(&name) {
            Some(semantic) => {
                attributes.insert(semantic, accessor);
            }
            None => {
                tracing::debug!(mesh, primitive = index, attribute = %name, "ignoring attribute");
                ignored_attributes.push(name);
            }
        }
    }

    let indices = primitive
        .indices
        .map(|i| reference::<AccessorIndex, _>(entity, "indices", i, accessors))
        .transpose()?;
    let material = primitive
        .material
        .map(|m| reference::<MaterialIndex, _>(entity, "material", m, materials))
        .transpose()?;
    let topology = match primitive.mode {
        None => Topology::default(),
        Some(mode) => Topology::from_gl(mode)
            .ok_or_else(|| ImportError::format(entity, format!("invalid mode {}", mode)))?,
    };

    Ok(Primitive {
        attributes,
        ignored_attributes,
        indices,
        material,
        topology,
    })
}

/// Checks that `index` names an existing entry of `arena`.
fn reference<I, T>(
    entity: EntityRef,
    field: &str,
    index: usize,
    arena: &IndexVec<I, T>,
) -> ImportResult<I>
where
    I: Idx,
{
    if index < arena.len() {
        Ok(I::new(index))
    } else {
        Err(ImportError::format(
            entity,
            format!(
                "{} references index {} but only {} exist",
                field,
                index,
                arena.len()
            ),
        ))
    }
}
