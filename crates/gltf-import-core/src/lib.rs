//! glTF Import Core Library
//!
//! Data model and numeric core for importing glTF 2.0 geometry: typed entity
//! handles, accessor decoding (stride, component reinterpretation,
//! normalization, bounds correction) and the mesh records produced by
//! assembly. File and container handling lives in `gltf-import-io`.

pub mod accessor_decoder;
pub mod component_types;
pub mod entities;
pub mod geometry_indices;
pub mod mesh_record;
pub mod normalization;
pub mod status;
pub mod typed_array;

pub use accessor_decoder::{decode_accessor, DecodeOptions, ViewSource};
pub use component_types::{ComponentType, ElementType};
pub use entities::{Document, Semantic, Topology};
pub use geometry_indices::{AccessorIndex, BufferIndex, BufferViewIndex, IndexVec, MeshIndex};
pub use mesh_record::{MaterialRef, MeshRecord, Submesh, Vertex};
pub use status::{EntityKind, EntityRef, ErrorKind, ImportError, ImportResult};
pub use typed_array::{Components, TypedArray};
