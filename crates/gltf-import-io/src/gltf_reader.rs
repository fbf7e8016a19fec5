//! glTF/GLB import entry points.
//!
//! Both `.gltf` (JSON with external or embedded buffers) and `.glb` (binary
//! container) sources are accepted; the form is detected from the magic
//! bytes.
//!
//! # Example
//!
//! ```ignore
//! use gltf_import_io::{assemble_meshes, parse_document, AssemblyMode};
//!
//! let entities = parse_document("model.glb")?;
//! for mesh in assemble_meshes(&entities, AssemblyMode::PerPrimitive)? {
//!     println!("{}: {} vertices", mesh.name, mesh.num_vertices());
//! }
//!
//! // Or through the reader facade
//! let reader = GltfReader::open("model.gltf")?;
//! let positions = reader.decode_accessor(AccessorIndex(0))?;
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use gltf_import_core::accessor_decoder;
use gltf_import_core::entities::Document;
use gltf_import_core::geometry_indices::{AccessorIndex, BufferIndex, IndexVec};
use gltf_import_core::mesh_record::MeshRecord;
use gltf_import_core::status::{EntityRef, ImportError, ImportResult};
use gltf_import_core::typed_array::TypedArray;

use crate::buffer_resolver::resolve_buffers;
use crate::chunk_reader::{is_binary_container, split_source, Container, SourceForm};
use crate::entity_parser::parse_entities;
use crate::mesh_assembler::{self, AssemblyMode, AssemblyReport, DEFAULT_COMBINED_NAME};
use crate::options::ImportOptions;
use crate::propagation::{bind_view, bind_views, BoundViews, ValidatedMeshes};

// ============================================================================
// ParsedEntities
// ============================================================================

/// A parsed document with every buffer resolved.
///
/// This is the input of accessor decoding and mesh assembly. It owns all
/// bytes; nothing refers back to the source file.
#[derive(Debug, Clone)]
pub struct ParsedEntities {
    document: Document,
    buffers: IndexVec<BufferIndex, Arc<[u8]>>,
    options: ImportOptions,
    form: SourceForm,
    source_stem: Option<String>,
}

impl ParsedEntities {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn buffers(&self) -> &IndexVec<BufferIndex, Arc<[u8]>> {
        &self.buffers
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn form(&self) -> SourceForm {
        self.form
    }

    /// File stem of the source, when it was read from a path.
    pub fn source_stem(&self) -> Option<&str> {
        self.source_stem.as_deref()
    }

    /// Name used for the record in combined mode.
    pub fn combined_name(&self) -> &str {
        self.options
            .combined_name
            .as_deref()
            .or(self.source_stem.as_deref())
            .unwrap_or(DEFAULT_COMBINED_NAME)
    }

    /// Runs the first propagation pass.
    pub fn bind_views(&self) -> ImportResult<BoundViews<'_>> {
        bind_views(&self.document, &self.buffers)
    }

    /// Runs every propagation pass.
    pub fn validate(&self) -> ImportResult<ValidatedMeshes<'_>> {
        Ok(self
            .bind_views()?
            .decode_accessors(&self.options.decode_options())?
            .resolve_primitives()?
            .validate())
    }
}

// ============================================================================
// Free functions
// ============================================================================

/// Reads and parses a `.gltf` or `.glb` file with default options.
pub fn parse_document<P: AsRef<Path>>(path: P) -> ImportResult<ParsedEntities> {
    parse_document_with_options(path, ImportOptions::default())
}

/// Reads and parses a `.gltf` or `.glb` file.
///
/// Relative buffer files are resolved against `options.base_dir`, else the
/// directory of `path`.
pub fn parse_document_with_options<P: AsRef<Path>>(
    path: P,
    options: ImportOptions,
) -> ImportResult<ParsedEntities> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| ImportError::io(EntityRef::document(), path, e))?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "read glTF source");

    let mut entities = parse_slice(&data, path.parent(), options)?;
    entities.source_stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned());
    Ok(entities)
}

/// Parses an in-memory `.gltf` or `.glb` source.
///
/// `base_dir` is used for relative buffer files unless `options.base_dir` is
/// set.
pub fn parse_slice(
    data: &[u8],
    base_dir: Option<&Path>,
    options: ImportOptions,
) -> ImportResult<ParsedEntities> {
    let container = split_source(data)?;
    from_container(container, base_dir, options)
}

fn from_container(
    container: Container<'_>,
    base_dir: Option<&Path>,
    options: ImportOptions,
) -> ImportResult<ParsedEntities> {
    let document = parse_entities(container.json)?;
    let buffers = resolve_buffers(
        &document,
        &container.binary_chunks,
        options.resolve_base_dir(base_dir),
    )?;
    Ok(ParsedEntities {
        document,
        buffers,
        options,
        form: container.form,
        source_stem: None,
    })
}

/// Decodes one accessor of a parsed document.
///
/// Only the accessor's own buffer view is bound.
pub fn decode_accessor(
    index: AccessorIndex,
    entities: &ParsedEntities,
) -> ImportResult<TypedArray> {
    let accessor = entities.document.accessors.get(index).ok_or_else(|| {
        ImportError::format(EntityRef::accessor(index.0 as usize), "accessor does not exist")
    })?;
    let source = match accessor.buffer_view {
        Some(view) => Some(bind_view(&entities.document, &entities.buffers, view)?),
        None => None,
    };
    accessor_decoder::decode_accessor(
        index,
        accessor,
        source,
        &entities.options.decode_options(),
    )
}

/// Assembles mesh records, dropping the skip report.
pub fn assemble_meshes(
    entities: &ParsedEntities,
    mode: AssemblyMode,
) -> ImportResult<Vec<MeshRecord>> {
    Ok(assemble_meshes_with_report(entities, mode)?.meshes)
}

/// Assembles mesh records and reports skipped primitives.
pub fn assemble_meshes_with_report(
    entities: &ParsedEntities,
    mode: AssemblyMode,
) -> ImportResult<AssemblyReport> {
    let validated = entities.validate()?;
    mesh_assembler::assemble(validated, mode, entities.combined_name())
}

// ============================================================================
// GltfReader
// ============================================================================

/// A reader for glTF/GLB files.
#[derive(Debug, Clone)]
pub struct GltfReader {
    entities: ParsedEntities,
}

impl GltfReader {
    /// Open a glTF or GLB file.
    ///
    /// The file type is detected automatically based on the magic bytes.
    pub fn open<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        Self::open_with_options(path, ImportOptions::default())
    }

    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        options: ImportOptions,
    ) -> ImportResult<Self> {
        Ok(Self {
            entities: parse_document_with_options(path, options)?,
        })
    }

    /// Parse from GLB binary data.
    pub fn from_glb(data: &[u8]) -> ImportResult<Self> {
        if !is_binary_container(data) {
            return Err(ImportError::format(EntityRef::document(), "invalid GLB magic"));
        }
        Ok(Self {
            entities: parse_slice(data, None, ImportOptions::default())?,
        })
    }

    /// Parse from glTF JSON data with optional base path for external buffers.
    pub fn from_gltf(json_data: &[u8], base_path: Option<&Path>) -> ImportResult<Self> {
        let container = Container {
            form: SourceForm::Text,
            json: json_data,
            binary_chunks: Vec::new(),
        };
        Ok(Self {
            entities: from_container(container, base_path, ImportOptions::default())?,
        })
    }

    /// Wrap an already parsed document.
    pub fn from_entities(entities: ParsedEntities) -> Self {
        Self { entities }
    }

    pub fn entities(&self) -> &ParsedEntities {
        &self.entities
    }

    pub fn num_meshes(&self) -> usize {
        self.entities.document.meshes.len()
    }

    pub fn num_buffers(&self) -> usize {
        self.entities.document.buffers.len()
    }

    pub fn extensions_used(&self) -> &[String] {
        &self.entities.document.extensions_used
    }

    pub fn decode_accessor(&self, index: AccessorIndex) -> ImportResult<TypedArray> {
        decode_accessor(index, &self.entities)
    }

    pub fn assemble(&self, mode: AssemblyMode) -> ImportResult<AssemblyReport> {
        assemble_meshes_with_report(&self.entities, mode)
    }

    /// Assemble all primitives in the configured mode.
    pub fn decode_all_meshes(&self) -> ImportResult<Vec<MeshRecord>> {
        assemble_meshes(&self.entities, self.entities.options.mode)
    }
}

impl crate::traits::Reader for GltfReader {
    fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        Ok(GltfReader::open(path)?)
    }

    fn read_meshes(&mut self) -> std::io::Result<Vec<MeshRecord>> {
        Ok(self.decode_all_meshes()?)
    }
}
