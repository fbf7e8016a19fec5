//! Parsed document entities.
//!
//! These are the validated, index-keyed records produced by the entity
//! parsers. Cross-references are typed handles that are known to resolve
//! inside the owning [`Document`]. Nothing here holds bytes; binary content
//! is attached later by the propagation pipeline.

use std::collections::BTreeMap;
use std::fmt;

use crate::component_types::{element_size, ComponentType, ElementType};
use crate::geometry_indices::{
    AccessorIndex, BufferIndex, BufferViewIndex, ImageIndex, IndexVec, MaterialIndex, MeshIndex,
    SamplerIndex, TextureIndex,
};

/// Where the bytes of a buffer come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferSource {
    /// No `uri`: the bytes live in a binary chunk of the container.
    BinaryChunk,
    /// The base64 payload following a `;base64,` marker in the URI.
    Base64(String),
    /// A `data:` URI with a percent-encoded payload.
    DataUri(String),
    /// A relative or absolute file reference, still percent-encoded.
    File(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    pub name: Option<String>,
    pub byte_length: usize,
    pub source: BufferSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BufferView {
    pub name: Option<String>,
    pub buffer: BufferIndex,
    pub byte_offset: usize,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
}

impl BufferView {
    /// Exclusive end of the view inside its buffer, if it does not overflow.
    pub fn byte_end(&self) -> Option<usize> {
        self.byte_offset.checked_add(self.byte_length)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    pub name: Option<String>,
    /// Absent for zero-filled data.
    pub buffer_view: Option<BufferViewIndex>,
    pub byte_offset: usize,
    pub component_type: ComponentType,
    pub element_type: ElementType,
    pub count: usize,
    pub normalized: bool,
    /// Per-component lower bounds; length equals the component count.
    pub min: Option<Vec<f64>>,
    /// Per-component upper bounds; length equals the component count.
    pub max: Option<Vec<f64>>,
}

impl Accessor {
    pub fn element_size(&self) -> usize {
        element_size(self.component_type, self.element_type)
    }

    pub fn num_components(&self) -> usize {
        self.element_type.num_components()
    }
}

/// Vertex attribute semantics assembled into mesh records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Semantic {
    Position,
    Normal,
    Tangent,
    TexCoord0,
    TexCoord1,
    Color0,
}

impl Semantic {
    pub const ALL: [Semantic; 6] = [
        Semantic::Position,
        Semantic::Normal,
        Semantic::Tangent,
        Semantic::TexCoord0,
        Semantic::TexCoord1,
        Semantic::Color0,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "POSITION" => Some(Semantic::Position),
            "NORMAL" => Some(Semantic::Normal),
            "TANGENT" => Some(Semantic::Tangent),
            "TEXCOORD_0" => Some(Semantic::TexCoord0),
            "TEXCOORD_1" => Some(Semantic::TexCoord1),
            "COLOR_0" => Some(Semantic::Color0),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Semantic::Position => "POSITION",
            Semantic::Normal => "NORMAL",
            Semantic::Tangent => "TANGENT",
            Semantic::TexCoord0 => "TEXCOORD_0",
            Semantic::TexCoord1 => "TEXCOORD_1",
            Semantic::Color0 => "COLOR_0",
        }
    }

    /// Element shapes accepted for this semantic.
    pub fn accepted_element_types(&self) -> &'static [ElementType] {
        match self {
            Semantic::Position | Semantic::Normal => &[ElementType::Vec3],
            Semantic::Tangent => &[ElementType::Vec4],
            Semantic::TexCoord0 | Semantic::TexCoord1 => &[ElementType::Vec2],
            Semantic::Color0 => &[ElementType::Vec3, ElementType::Vec4],
        }
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Primitive topology (`mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    Points = 0,
    Lines = 1,
    LineLoop = 2,
    LineStrip = 3,
    #[default]
    Triangles = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
}

impl Topology {
    pub fn from_gl(mode: u32) -> Option<Self> {
        match mode {
            0 => Some(Topology::Points),
            1 => Some(Topology::Lines),
            2 => Some(Topology::LineLoop),
            3 => Some(Topology::LineStrip),
            4 => Some(Topology::Triangles),
            5 => Some(Topology::TriangleStrip),
            6 => Some(Topology::TriangleFan),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub attributes: BTreeMap<Semantic, AccessorIndex>,
    /// Attribute names present in the document but not assembled.
    pub ignored_attributes: Vec<String>,
    pub indices: Option<AccessorIndex>,
    pub material: Option<MaterialIndex>,
    pub topology: Topology,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Material {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Texture {
    pub name: Option<String>,
    pub sampler: Option<SamplerIndex>,
    pub source: Option<ImageIndex>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Image {
    pub name: Option<String>,
    pub uri: Option<String>,
    pub mime_type: Option<String>,
    pub buffer_view: Option<BufferViewIndex>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sampler {
    pub name: Option<String>,
    pub mag_filter: Option<u32>,
    pub min_filter: Option<u32>,
    pub wrap_s: Option<u32>,
    pub wrap_t: Option<u32>,
}

/// All entities of one glTF document, keyed by their document index.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub buffers: IndexVec<BufferIndex, Buffer>,
    pub buffer_views: IndexVec<BufferViewIndex, BufferView>,
    pub accessors: IndexVec<AccessorIndex, Accessor>,
    pub meshes: IndexVec<MeshIndex, Mesh>,
    pub materials: IndexVec<MaterialIndex, Material>,
    pub textures: IndexVec<TextureIndex, Texture>,
    pub images: IndexVec<ImageIndex, Image>,
    pub samplers: IndexVec<SamplerIndex, Sampler>,
    pub extensions_used: Vec<String>,
}

impl Document {
    pub fn num_primitives(&self) -> usize {
        self.meshes.iter().map(|m| m.primitives.len()).sum()
    }

    /// Name of a material, if the document gives it one.
    pub fn material_name(&self, index: MaterialIndex) -> Option<&str> {
        self.materials.get(index).and_then(|m| m.name.as_deref())
    }
}
