//! Mesh assembly from validated primitives.
//!
//! Vertices are zipped from the attribute arrays of a primitive and paired
//! with its index stream. In [`AssemblyMode::PerPrimitive`] each valid
//! primitive becomes its own [`MeshRecord`] and broken primitives are skipped;
//! in [`AssemblyMode::Combined`] everything is concatenated into one record and
//! the first broken primitive aborts the assembly.

use gltf_import_core::entities::{Document, Semantic};
use gltf_import_core::mesh_record::{MaterialRef, MeshRecord, Submesh, Vertex};
use gltf_import_core::status::{EntityRef, ImportError, ImportResult};
use gltf_import_core::typed_array::TypedArray;
use serde::Deserialize;

use crate::propagation::{ValidPrimitive, ValidatedMeshes};

/// Name of the combined record when neither options nor the source provide
/// one.
pub const DEFAULT_COMBINED_NAME: &str = "combined";

/// How primitives are grouped into mesh records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyMode {
    /// One record per primitive.
    #[default]
    PerPrimitive,
    /// A single record holding every primitive as a submesh.
    Combined,
}

/// Assembled records plus the primitives that were left out.
#[derive(Debug, Default)]
pub struct AssemblyReport {
    pub meshes: Vec<MeshRecord>,
    /// Primitive-scoped errors of skipped primitives (per-primitive mode).
    pub skipped: Vec<ImportError>,
}

/// Assembles mesh records from the last propagation stage.
///
/// `combined_name` names the record in combined mode.
pub fn assemble(
    validated: ValidatedMeshes<'_>,
    mode: AssemblyMode,
    combined_name: &str,
) -> ImportResult<AssemblyReport> {
    let document = validated.document();
    let primitives = validated.into_primitives();
    match mode {
        AssemblyMode::PerPrimitive => assemble_per_primitive(document, primitives),
        AssemblyMode::Combined => assemble_combined(document, primitives, combined_name),
    }
}

fn assemble_per_primitive(
    document: &Document,
    primitives: Vec<ImportResult<ValidPrimitive>>,
) -> ImportResult<AssemblyReport> {
    let mut report = AssemblyReport::default();

    for outcome in primitives {
        let built = outcome.and_then(|primitive| {
            let name = primitive_name(document, &primitive);
            let mut record = MeshRecord::new(name.clone());
            append_primitive(document, &mut record, &primitive, name)?;
            Ok(record)
        });
        match built {
            Ok(record) => {
                tracing::debug!(
                    mesh = %record.name,
                    vertices = record.num_vertices(),
                    indices = record.num_indices(),
                    "assembled mesh"
                );
                report.meshes.push(record);
            }
            Err(err) if !err.is_primitive_scoped() => return Err(err),
            Err(err) => {
                tracing::warn!(entity = %err.entity(), error = %err, "skipping primitive");
                report.skipped.push(err);
            }
        }
    }

    Ok(report)
}

fn assemble_combined(
    document: &Document,
    primitives: Vec<ImportResult<ValidPrimitive>>,
    name: &str,
) -> ImportResult<AssemblyReport> {
    if primitives.is_empty() {
        return Ok(AssemblyReport::default());
    }

    let mut record = MeshRecord::new(name);
    for outcome in primitives {
        let primitive = outcome?;
        let submesh_name = primitive_name(document, &primitive);
        append_primitive(document, &mut record, &primitive, submesh_name)?;
    }

    tracing::debug!(
        mesh = %record.name,
        submeshes = record.submeshes.len(),
        vertices = record.num_vertices(),
        indices = record.num_indices(),
        "assembled combined mesh"
    );
    Ok(AssemblyReport {
        meshes: vec![record],
        skipped: Vec::new(),
    })
}

/// `<mesh name or mesh_i>`, with `_<p>` appended when the mesh has several
/// primitives.
pub fn primitive_name(document: &Document, primitive: &ValidPrimitive) -> String {
    let source = &primitive.source;
    let mesh = document.meshes.get(source.mesh);
    let base = mesh
        .and_then(|m| m.name.clone())
        .unwrap_or_else(|| format!("mesh_{}", source.mesh));
    if mesh.map_or(0, |m| m.primitives.len()) > 1 {
        format!("{}_{}", base, source.primitive)
    } else {
        base
    }
}

/// Appends one primitive to `record` as a new submesh.
///
/// Indices are offset by the vertices already in the record. Nothing is
/// appended on error.
fn append_primitive(
    document: &Document,
    record: &mut MeshRecord,
    primitive: &ValidPrimitive,
    name: String,
) -> ImportResult<()> {
    let entity = primitive.source.entity();
    let vertices = build_vertices(entity, primitive)?;
    let local = build_indices(entity, primitive)?;

    let base = record.vertices.len();
    let offset = u32::try_from(base)
        .map_err(|_| ImportError::range(entity, "combined vertex count exceeds u32"))?;
    let mut indices = Vec::with_capacity(local.len());
    for index in local {
        indices.push(index.checked_add(offset).ok_or_else(|| {
            ImportError::range(entity, "offset index exceeds u32")
        })?);
    }

    let index_start = record.indices.len();
    record.vertices.extend(vertices);
    record.indices.extend(indices);

    let source = &primitive.source;
    record.submeshes.push(Submesh {
        name,
        mesh: source.mesh,
        primitive: source.primitive,
        material: source.material.map(|index| MaterialRef {
            index,
            name: document.material_name(index).map(str::to_owned),
        }),
        topology: source.topology,
        attributes: source.attributes.keys().copied().collect(),
        vertex_range: base..record.vertices.len(),
        index_range: index_start..record.indices.len(),
    });
    Ok(())
}

/// Zips the attribute arrays of a primitive into vertex records.
pub fn build_vertices(
    entity: EntityRef,
    primitive: &ValidPrimitive,
) -> ImportResult<Vec<Vertex>> {
    let mut vertices = vec![Vertex::default(); primitive.vertex_count];

    for (&semantic, array) in &primitive.source.attributes {
        match semantic {
            Semantic::Position => {
                let values = fixed::<3>(entity, semantic, array)?;
                zip_into(&mut vertices, values, |v, x| v.position = Some(x));
            }
            Semantic::Normal => {
                let values = fixed::<3>(entity, semantic, array)?;
                zip_into(&mut vertices, values, |v, x| v.normal = Some(x));
            }
            Semantic::Tangent => {
                let values = fixed::<4>(entity, semantic, array)?;
                zip_into(&mut vertices, values, |v, x| v.tangent = Some(x));
            }
            Semantic::TexCoord0 => {
                let values = fixed::<2>(entity, semantic, array)?;
                zip_into(&mut vertices, values, |v, x| v.tex_coord_0 = Some(x));
            }
            Semantic::TexCoord1 => {
                let values = fixed::<2>(entity, semantic, array)?;
                zip_into(&mut vertices, values, |v, x| v.tex_coord_1 = Some(x));
            }
            Semantic::Color0 if array.num_components() == 3 => {
                let values = fixed::<3>(entity, semantic, array)?;
                zip_into(&mut vertices, values, |v, [r, g, b]| {
                    v.color_0 = Some([r, g, b, 1.0])
                });
            }
            Semantic::Color0 => {
                let values = fixed::<4>(entity, semantic, array)?;
                zip_into(&mut vertices, values, |v, x| v.color_0 = Some(x));
            }
        }
    }

    Ok(vertices)
}

fn fixed<const N: usize>(
    entity: EntityRef,
    semantic: Semantic,
    array: &TypedArray,
) -> ImportResult<Vec<[f32; N]>> {
    array.to_f32_array::<N>().ok_or_else(|| {
        ImportError::unsupported(
            entity,
            format!("{} as {}", semantic, array.element_type().name()),
        )
    })
}

fn zip_into<T>(vertices: &mut [Vertex], values: Vec<T>, mut set: impl FnMut(&mut Vertex, T)) {
    for (vertex, value) in vertices.iter_mut().zip(values) {
        set(vertex, value);
    }
}

/// The primitive's index stream, checked against its vertex count.
///
/// # Errors
///
/// `Range` (primitive-scoped) for an index `>= vertex_count`.
pub fn build_indices(entity: EntityRef, primitive: &ValidPrimitive) -> ImportResult<Vec<u32>> {
    let stream = &primitive.index_stream;
    let mut indices = Vec::with_capacity(stream.len());
    for (position, index) in stream.iter().enumerate() {
        let index = index.ok_or_else(|| {
            ImportError::unsupported(entity, "index stream is not unsigned integer data")
        })?;
        if index as usize >= primitive.vertex_count {
            return Err(ImportError::range(
                entity,
                format!(
                    "index {} at position {} is not below vertex count {}",
                    index, position, primitive.vertex_count
                ),
            ));
        }
        indices.push(index);
    }
    Ok(indices)
}
