//! Import configuration.

use std::path::{Path, PathBuf};

use gltf_import_core::accessor_decoder::DecodeOptions;
use gltf_import_core::status::{EntityRef, ImportError, ImportResult};
use serde::Deserialize;

use crate::mesh_assembler::AssemblyMode;

/// Options for one import call.
///
/// Every field has a default, so hosts can load partial settings:
///
/// ```ignore
/// let options = ImportOptions::from_json_str(r#"{"mode": "combined"}"#)?;
/// assert!(options.clamp_to_bounds);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportOptions {
    pub mode: AssemblyMode,
    /// Clamp decoded components into declared accessor bounds.
    pub clamp_to_bounds: bool,
    /// Directory for relative buffer files; defaults to the document's
    /// directory.
    pub base_dir: Option<PathBuf>,
    /// Name of the combined mesh record.
    pub combined_name: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            mode: AssemblyMode::default(),
            clamp_to_bounds: true,
            base_dir: None,
            combined_name: None,
        }
    }
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from JSON; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> ImportResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            ImportError::format(EntityRef::document(), format!("invalid import options: {}", e))
        })
    }

    pub fn with_mode(mut self, mode: AssemblyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_clamp_to_bounds(mut self, clamp: bool) -> Self {
        self.clamp_to_bounds = clamp;
        self
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn with_combined_name(mut self, name: impl Into<String>) -> Self {
        self.combined_name = Some(name.into());
        self
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            clamp_to_bounds: self.clamp_to_bounds,
        }
    }

    /// The configured base directory, else `fallback`.
    pub(crate) fn resolve_base_dir<'a>(
        &'a self,
        fallback: Option<&'a Path>,
    ) -> Option<&'a Path> {
        self.base_dir.as_deref().or(fallback)
    }
}
