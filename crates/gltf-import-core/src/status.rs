//! Error handling for glTF import operations.
//!
//! Every error names the entity that triggered it (kind plus document index)
//! so a host can point the user at the offending part of the asset.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The kind of document entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// The document as a whole (JSON text, asset header).
    Document,
    /// A chunk of a binary container.
    Chunk,
    Buffer,
    BufferView,
    Accessor,
    Mesh,
    /// A primitive inside the mesh with the given index.
    Primitive { mesh: usize },
    Material,
    Texture,
    Image,
    Sampler,
}

impl EntityKind {
    pub const fn name(self) -> &'static str {
        match self {
            EntityKind::Document => "document",
            EntityKind::Chunk => "chunk",
            EntityKind::Buffer => "buffer",
            EntityKind::BufferView => "bufferView",
            EntityKind::Accessor => "accessor",
            EntityKind::Mesh => "mesh",
            EntityKind::Primitive { .. } => "primitive",
            EntityKind::Material => "material",
            EntityKind::Texture => "texture",
            EntityKind::Image => "image",
            EntityKind::Sampler => "sampler",
        }
    }
}

/// An entity kind together with its integer index in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub index: usize,
}

impl EntityRef {
    pub const fn new(kind: EntityKind, index: usize) -> Self {
        Self { kind, index }
    }

    pub const fn document() -> Self {
        Self::new(EntityKind::Document, 0)
    }

    pub const fn chunk(index: usize) -> Self {
        Self::new(EntityKind::Chunk, index)
    }

    pub const fn buffer(index: usize) -> Self {
        Self::new(EntityKind::Buffer, index)
    }

    pub const fn buffer_view(index: usize) -> Self {
        Self::new(EntityKind::BufferView, index)
    }

    pub const fn accessor(index: usize) -> Self {
        Self::new(EntityKind::Accessor, index)
    }

    pub const fn mesh(index: usize) -> Self {
        Self::new(EntityKind::Mesh, index)
    }

    pub const fn primitive(mesh: usize, index: usize) -> Self {
        Self::new(EntityKind::Primitive { mesh }, index)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EntityKind::Primitive { mesh } => write!(f, "mesh {} primitive {}", mesh, self.index),
            kind => write!(f, "{} {}", kind.name(), self.index),
        }
    }
}

/// Coarse error categories, one per [`ImportError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    Format,
    Range,
    Unsupported,
    Consistency,
}

impl ErrorKind {
    pub const fn name(self) -> &'static str {
        match self {
            ErrorKind::Io => "IO_ERROR",
            ErrorKind::Format => "FORMAT_ERROR",
            ErrorKind::Range => "RANGE_ERROR",
            ErrorKind::Unsupported => "UNSUPPORTED",
            ErrorKind::Consistency => "CONSISTENCY_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors that can occur while importing a glTF asset.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error on {entity} ({}): {source}", .path.display())]
    Io {
        entity: EntityRef,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid {entity}: {message}")]
    Format { entity: EntityRef, message: String },

    #[error("Out of range on {entity}: {message}")]
    Range { entity: EntityRef, message: String },

    #[error("Unsupported feature on {entity}: {message}")]
    Unsupported { entity: EntityRef, message: String },

    #[error("Inconsistent {entity}: {message}")]
    Consistency { entity: EntityRef, message: String },
}

impl ImportError {
    pub fn io(entity: EntityRef, path: impl Into<PathBuf>, source: io::Error) -> Self {
        ImportError::Io {
            entity,
            path: path.into(),
            source,
        }
    }

    pub fn format(entity: EntityRef, message: impl Into<String>) -> Self {
        ImportError::Format {
            entity,
            message: message.into(),
        }
    }

    pub fn range(entity: EntityRef, message: impl Into<String>) -> Self {
        ImportError::Range {
            entity,
            message: message.into(),
        }
    }

    pub fn unsupported(entity: EntityRef, message: impl Into<String>) -> Self {
        ImportError::Unsupported {
            entity,
            message: message.into(),
        }
    }

    pub fn consistency(entity: EntityRef, message: impl Into<String>) -> Self {
        ImportError::Consistency {
            entity,
            message: message.into(),
        }
    }

    /// Returns the error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImportError::Io { .. } => ErrorKind::Io,
            ImportError::Format { .. } => ErrorKind::Format,
            ImportError::Range { .. } => ErrorKind::Range,
            ImportError::Unsupported { .. } => ErrorKind::Unsupported,
            ImportError::Consistency { .. } => ErrorKind::Consistency,
        }
    }

    /// Returns the entity that triggered the error.
    pub fn entity(&self) -> EntityRef {
        match self {
            ImportError::Io { entity, .. }
            | ImportError::Format { entity, .. }
            | ImportError::Range { entity, .. }
            | ImportError::Unsupported { entity, .. }
            | ImportError::Consistency { entity, .. } => *entity,
        }
    }

    /// Returns true if the error only invalidates one primitive.
    ///
    /// Only meaningful during per-primitive assembly; every other stage
    /// treats all errors as fatal.
    pub fn is_primitive_scoped(&self) -> bool {
        matches!(
            (self.kind(), self.entity().kind),
            (ErrorKind::Consistency, EntityKind::Primitive { .. })
                | (ErrorKind::Range, EntityKind::Primitive { .. })
        )
    }
}

pub type ImportResult<T> = Result<T, ImportError>;

impl From<ImportError> for io::Error {
    fn from(err: ImportError) -> Self {
        let kind = match &err {
            ImportError::Io { source, .. } => source.kind(),
            ImportError::Unsupported { .. } => io::ErrorKind::Unsupported,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}
