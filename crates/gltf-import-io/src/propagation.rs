//! The propagation pipeline between parsed entities and mesh assembly.
//!
//! Each pass consumes the previous stage and returns the next one, so the
//! passes can only run in order:
//!
//! ```ignore
//! let validated = bind_views(&document, &buffers)?
//!     .decode_accessors(&DecodeOptions::default())?
//!     .resolve_primitives()?
//!     .validate();
//! ```
//!
//! Stages borrow the [`Document`] and share buffer bytes and decoded arrays
//! through `Arc`, so they are `Send + Sync`.

use std::collections::BTreeMap;
use std::sync::Arc;

use gltf_import_core::accessor_decoder::{self, DecodeOptions, ViewSource};
use gltf_import_core::component_types::ElementType;
use gltf_import_core::entities::{Document, Semantic, Topology};
use gltf_import_core::geometry_indices::{
    AccessorIndex, BufferIndex, BufferViewIndex, IndexVec, MaterialIndex, MeshIndex,
};
use gltf_import_core::status::{EntityRef, ImportError, ImportResult};
use gltf_import_core::typed_array::TypedArray;

// ============================================================================
// Pass 1: bind buffer views
// ============================================================================

/// Buffer views bound to the bytes of their buffers.
#[derive(Debug, Clone)]
pub struct BoundViews<'d> {
    document: &'d Document,
    views: IndexVec<BufferViewIndex, Arc<[u8]>>,
}

/// Attaches buffer bytes to every buffer view.
///
/// # Errors
///
/// `Range` if a view does not fit inside its buffer's declared length.
pub fn bind_views<'d>(
    document: &'d Document,
    buffers: &IndexVec<BufferIndex, Arc<[u8]>>,
) -> ImportResult<BoundViews<'d>> {
    tracing::trace!(views = document.buffer_views.len(), "binding buffer views");

    let mut views = IndexVec::with_capacity(document.buffer_views.len());
    for index in document.buffer_views.indices() {
        views.push(Arc::clone(view_buffer(document, buffers, index)?));
    }

    Ok(BoundViews { document, views })
}

/// Binds a single buffer view, leaving every other view unchecked.
///
/// # Errors
///
/// `Range` if the view does not fit inside its buffer's declared length.
pub fn bind_view<'a>(
    document: &'a Document,
    buffers: &'a IndexVec<BufferIndex, Arc<[u8]>>,
    index: BufferViewIndex,
) -> ImportResult<ViewSource<'a>> {
    let buffer: &[u8] = view_buffer(document, buffers, index)?;
    let view = document.buffer_views.get(index).ok_or_else(|| {
        ImportError::format(EntityRef::buffer_view(index.0 as usize), "bufferView does not exist")
    })?;
    Ok(ViewSource { view, buffer })
}

fn view_buffer<'a>(
    document: &Document,
    buffers: &'a IndexVec<BufferIndex, Arc<[u8]>>,
    index: BufferViewIndex,
) -> ImportResult<&'a Arc<[u8]>> {
    let entity = EntityRef::buffer_view(index.0 as usize);
    let view = document
        .buffer_views
        .get(index)
        .ok_or_else(|| ImportError::format(entity, "bufferView does not exist"))?;
    let declared = document
        .buffers
        .get(view.buffer)
        .map(|b| b.byte_length)
        .ok_or_else(|| ImportError::format(entity, "buffer does not exist"))?;
    let bytes = buffers
        .get(view.buffer)
        .ok_or_else(|| ImportError::format(entity, "buffer was not resolved"))?;

    match view.byte_end() {
        Some(end) if end <= declared => Ok(bytes),
        _ => Err(ImportError::range(
            entity,
            format!(
                "byteOffset {} + byteLength {} exceeds buffer {} byteLength {}",
                view.byte_offset, view.byte_length, view.buffer, declared
            ),
        )),
    }
}

impl<'d> BoundViews<'d> {
    pub fn document(&self) -> &'d Document {
        self.document
    }

    /// The view together with its buffer bytes.
    pub fn source(&self, view: BufferViewIndex) -> Option<ViewSource<'_>> {
        Some(ViewSource {
            view: self.document.buffer_views.get(view)?,
            buffer: self.views.get(view)?,
        })
    }

    /// Decodes a single accessor.
    pub fn decode_accessor(
        &self,
        index: AccessorIndex,
        options: &DecodeOptions,
    ) -> ImportResult<TypedArray> {
        let entity = EntityRef::accessor(index.0 as usize);
        let accessor = self
            .document
            .accessors
            .get(index)
            .ok_or_else(|| ImportError::format(entity, "accessor does not exist"))?;
        let source = match accessor.buffer_view {
            Some(view) => Some(
                self.source(view)
                    .ok_or_else(|| ImportError::format(entity, "bufferView does not exist"))?,
            ),
            None => None,
        };
        accessor_decoder::decode_accessor(index, accessor, source, options)
    }

    /// Pass 2: decodes every accessor of the document.
    pub fn decode_accessors(self, options: &DecodeOptions) -> ImportResult<DecodedAccessors<'d>> {
        tracing::trace!(
            accessors = self.document.accessors.len(),
            "decoding accessors"
        );

        let mut arrays = IndexVec::with_capacity(self.document.accessors.len());
        for index in self.document.accessors.indices() {
            let array = self.decode_accessor(index, options)?;
            tracing::debug!(accessor = index.0, count = array.len(), "decoded accessor");
            arrays.push(Arc::new(array));
        }

        Ok(DecodedAccessors {
            document: self.document,
            arrays,
        })
    }
}

// ============================================================================
// Pass 2 output: decoded accessors
// ============================================================================

/// Every accessor of the document, decoded.
#[derive(Debug, Clone)]
pub struct DecodedAccessors<'d> {
    document: &'d Document,
    arrays: IndexVec<AccessorIndex, Arc<TypedArray>>,
}

impl<'d> DecodedAccessors<'d> {
    pub fn document(&self) -> &'d Document {
        self.document
    }

    pub fn get(&self, index: AccessorIndex) -> Option<&Arc<TypedArray>> {
        self.arrays.get(index)
    }

    /// Pass 3: maps each primitive's attributes and indices to decoded arrays.
    ///
    /// # Errors
    ///
    /// `Unsupported` for an attribute whose element shape does not fit its
    /// semantic, or an index accessor that is not an unsigned, non-normalized
    /// SCALAR.
    pub fn resolve_primitives(self) -> ImportResult<ResolvedMeshes<'d>> {
        tracing::trace!(
            primitives = self.document.num_primitives(),
            "resolving primitives"
        );

        let mut primitives = Vec::with_capacity(self.document.num_primitives());
        for (mesh_index, mesh) in self.document.meshes.iter_enumerated() {
            for (p, primitive) in mesh.primitives.iter().enumerate() {
                let entity = EntityRef::primitive(mesh_index.0 as usize, p);

                let mut attributes = BTreeMap::new();
                for (&semantic, &accessor) in &primitive.attributes {
                    let array = self.array(entity, accessor)?;
                    if !semantic
                        .accepted_element_types()
                        .contains(&array.element_type())
                    {
                        return Err(ImportError::unsupported(
                            entity,
                            format!(
                                "{} as {} (accessor {})",
                                semantic,
                                array.element_type().name(),
                                accessor
                            ),
                        ));
                    }
                    attributes.insert(semantic, array);
                }

                let indices = match primitive.indices {
                    Some(accessor) => {
                        let array = self.array(entity, accessor)?;
                        check_index_array(entity, accessor, &array)?;
                        Some(array)
                    }
                    None => None,
                };

                primitives.push(ResolvedPrimitive {
                    mesh: mesh_index,
                    primitive: p,
                    attributes,
                    indices,
                    material: primitive.material,
                    topology: primitive.topology,
                });
            }
        }

        Ok(ResolvedMeshes {
            document: self.document,
            primitives,
        })
    }

    fn array(&self, entity: EntityRef, accessor: AccessorIndex) -> ImportResult<Arc<TypedArray>> {
        self.arrays.get(accessor).cloned().ok_or_else(|| {
            ImportError::format(entity, format!("accessor {} does not exist", accessor))
        })
    }
}

fn check_index_array(
    entity: EntityRef,
    accessor: AccessorIndex,
    array: &TypedArray,
) -> ImportResult<()> {
    if array.element_type() != ElementType::Scalar
        || !array.component_type().is_index_type()
        || array.normalized()
    {
        return Err(ImportError::unsupported(
            entity,
            format!(
                "indices accessor {} is {} of component type {}{}",
                accessor,
                array.element_type().name(),
                array.component_type().gl_code(),
                if array.normalized() { ", normalized" } else { "" }
            ),
        ));
    }
    Ok(())
}

// ============================================================================
// Pass 3 output: resolved primitives
// ============================================================================

/// A primitive with its attribute and index arrays attached.
#[derive(Debug, Clone)]
pub struct ResolvedPrimitive {
    pub mesh: MeshIndex,
    /// Position inside the mesh's primitive list.
    pub primitive: usize,
    pub attributes: BTreeMap<Semantic, Arc<TypedArray>>,
    pub indices: Option<Arc<TypedArray>>,
    pub material: Option<MaterialIndex>,
    pub topology: Topology,
}

impl ResolvedPrimitive {
    pub fn entity(&self) -> EntityRef {
        EntityRef::primitive(self.mesh.0 as usize, self.primitive)
    }
}

/// All primitives of the document, in mesh order.
#[derive(Debug, Clone)]
pub struct ResolvedMeshes<'d> {
    document: &'d Document,
    primitives: Vec<ResolvedPrimitive>,
}

impl<'d> ResolvedMeshes<'d> {
    pub fn document(&self) -> &'d Document {
        self.document
    }

    pub fn primitives(&self) -> &[ResolvedPrimitive] {
        &self.primitives
    }

    /// Pass 4: checks per-primitive vertex count consistency.
    ///
    /// Failures are recorded per primitive and never abort the pass.
    pub fn validate(self) -> ValidatedMeshes<'d> {
        tracing::trace!(primitives = self.primitives.len(), "validating primitives");

        let primitives = self.primitives.into_iter().map(validate_primitive).collect();
        ValidatedMeshes {
            document: self.document,
            primitives,
        }
    }
}

fn validate_primitive(primitive: ResolvedPrimitive) -> ImportResult<ValidPrimitive> {
    let entity = primitive.entity();
    let mut counts = primitive.attributes.iter().map(|(s, a)| (*s, a.len()));

    let (first_semantic, vertex_count) = counts
        .next()
        .ok_or_else(|| ImportError::consistency(entity, "primitive has no attributes"))?;
    if let Some((semantic, count)) = counts.find(|(_, count)| *count != vertex_count) {
        return Err(ImportError::consistency(
            entity,
            format!(
                "{} has {} elements but {} has {}",
                semantic, count, first_semantic, vertex_count
            ),
        ));
    }

    let index_stream = match &primitive.indices {
        Some(indices) => IndexStream::Explicit(Arc::clone(indices)),
        None => IndexStream::Implicit(vertex_count),
    };
    Ok(ValidPrimitive {
        source: primitive,
        vertex_count,
        index_stream,
    })
}

// ============================================================================
// Pass 4 output: validated primitives
// ============================================================================

/// The index stream of a valid primitive.
#[derive(Debug, Clone)]
pub enum IndexStream {
    /// Decoded indices of an unsigned SCALAR accessor.
    Explicit(Arc<TypedArray>),
    /// `0..n` for non-indexed primitives.
    Implicit(usize),
}

impl IndexStream {
    pub fn len(&self) -> usize {
        match self {
            IndexStream::Explicit(array) => array.len(),
            IndexStream::Implicit(n) => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            IndexStream::Explicit(array) => array.components().get_u32(i),
            IndexStream::Implicit(n) if i < *n => u32::try_from(i).ok(),
            IndexStream::Implicit(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<u32>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}

/// A primitive that passed validation.
#[derive(Debug, Clone)]
pub struct ValidPrimitive {
    pub source: ResolvedPrimitive,
    /// Element count shared by all attributes.
    pub vertex_count: usize,
    pub index_stream: IndexStream,
}

/// The final stage: every primitive with its validation outcome.
#[derive(Debug)]
pub struct ValidatedMeshes<'d> {
    document: &'d Document,
    primitives: Vec<ImportResult<ValidPrimitive>>,
}

impl<'d> ValidatedMeshes<'d> {
    pub fn document(&self) -> &'d Document {
        self.document
    }

    /// Outcomes in mesh order; failures are primitive-scoped errors.
    pub fn primitives(&self) -> &[ImportResult<ValidPrimitive>] {
        &self.primitives
    }

    pub fn valid(&self) -> impl Iterator<Item = &ValidPrimitive> + '_ {
        self.primitives.iter().filter_map(|p| p.as_ref().ok())
    }

    pub fn errors(&self) -> impl Iterator<Item = &ImportError> + '_ {
        self.primitives.iter().filter_map(|p| p.as_ref().err())
    }

    pub fn into_primitives(self) -> Vec<ImportResult<ValidPrimitive>> {
        self.primitives
    }
}
