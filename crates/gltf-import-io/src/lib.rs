//! glTF I/O library: reading glTF 2.0 sources into mesh records.
//!
//! The import runs in fixed stages:
//!
//! 1. [`chunk_reader`] splits a `.glb` container (or takes `.gltf` JSON as is).
//! 2. [`entity_parser`] turns the JSON into a validated, index-keyed
//!    [`Document`](gltf_import_core::entities::Document).
//! 3. [`buffer_resolver`] loads every buffer from binary chunks, data URIs or
//!    external files.
//! 4. [`propagation`] binds views, decodes accessors and validates primitives.
//! 5. [`mesh_assembler`] builds per-primitive or combined mesh records.
//!
//! # Usage
//!
//! ```ignore
//! use gltf_import_io::{GltfReader, ImportOptions, AssemblyMode};
//!
//! let options = ImportOptions::new().with_mode(AssemblyMode::Combined);
//! let reader = GltfReader::open_with_options("level.glb", options)?;
//! let report = reader.assemble(AssemblyMode::PerPrimitive)?;
//! for skipped in &report.skipped {
//!     eprintln!("skipped {}", skipped);
//! }
//! ```

pub mod buffer_resolver;
pub mod chunk_reader;
pub mod entity_parser;
pub mod gltf_reader;
pub mod mesh_assembler;
pub mod options;
pub mod propagation;
pub mod traits;

pub use chunk_reader::SourceForm;
pub use gltf_reader::{
    assemble_meshes, assemble_meshes_with_report, decode_accessor, parse_document,
    parse_document_with_options, parse_slice, GltfReader, ParsedEntities,
};
pub use mesh_assembler::{AssemblyMode, AssemblyReport};
pub use options::ImportOptions;
pub use traits::Reader;
