//! Common reader interface.
//!
//! Format readers implement [`Reader`] so hosts can load geometry without
//! naming the concrete reader:
//!
//! ```ignore
//! use gltf_import_io::{GltfReader, Reader};
//!
//! fn load<R: Reader>(path: &str) -> std::io::Result<MeshRecord> {
//!     let mut reader = R::open(path)?;
//!     reader.read_mesh()
//! }
//!
//! let mesh = load::<GltfReader>("model.glb")?;
//! ```
//!
//! Import errors convert into `std::io::Error`; the original [`ImportError`]
//! stays reachable through `io::Error::get_ref`.
//!
//! [`ImportError`]: gltf_import_core::status::ImportError

use std::io;
use std::path::Path;

use gltf_import_core::mesh_record::MeshRecord;

/// Common interface for mesh readers.
pub trait Reader: Sized {
    /// Open a file for reading.
    ///
    /// # Arguments
    /// * `path` - Input file path
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self>;

    /// Read every mesh record the file yields.
    fn read_meshes(&mut self) -> io::Result<Vec<MeshRecord>>;

    /// Read a single mesh record.
    ///
    /// Default implementation returns the first record from `read_meshes()`.
    fn read_mesh(&mut self) -> io::Result<MeshRecord> {
        let meshes = self.read_meshes()?;
        if let Some(m) = meshes.into_iter().next() {
            Ok(m)
        } else {
            Err(io::Error::new(io::ErrorKind::InvalidData, "No mesh found"))
        }
    }
}
