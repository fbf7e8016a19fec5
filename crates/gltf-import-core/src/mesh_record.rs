//! Assembled geometry handed to the target engine.

use std::ops::Range;

use crate::entities::{Semantic, Topology};
use crate::geometry_indices::{MaterialIndex, MeshIndex};

/// One vertex, zipped from the attribute arrays of its primitive.
///
/// Attributes the primitive does not provide stay `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: Option<[f32; 3]>,
    pub normal: Option<[f32; 3]>,
    pub tangent: Option<[f32; 4]>,
    pub tex_coord_0: Option<[f32; 2]>,
    pub tex_coord_1: Option<[f32; 2]>,
    /// RGBA; RGB sources get alpha 1.0.
    pub color_0: Option<[f32; 4]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialRef {
    pub index: MaterialIndex,
    pub name: Option<String>,
}

/// The part of a [`MeshRecord`] that came from one primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Submesh {
    pub name: String,
    pub mesh: MeshIndex,
    pub primitive: usize,
    pub material: Option<MaterialRef>,
    pub topology: Topology,
    pub attributes: Vec<Semantic>,
    /// Range of this primitive's vertices in [`MeshRecord::vertices`].
    pub vertex_range: Range<usize>,
    /// Range of this primitive's indices in [`MeshRecord::indices`].
    pub index_range: Range<usize>,
}

/// A self-contained vertex and index stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshRecord {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<Submesh>,
}

impl MeshRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_indices(&self) -> usize {
        self.indices.len()
    }

    /// Indices of one submesh.
    pub fn submesh_indices(&self, submesh: usize) -> Option<&[u32]> {
        let range = self.submeshes.get(submesh)?.index_range.clone();
        self.indices.get(range)
    }

    /// Positions of every vertex that has one.
    pub fn positions(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().filter_map(|v| v.position).collect()
    }
}
