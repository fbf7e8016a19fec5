use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gltf_import_core::accessor_decoder::{decode_accessor, DecodeOptions, ViewSource};
use gltf_import_core::component_types::{ComponentType, ElementType};
use gltf_import_core::entities::{Accessor, BufferView};
use gltf_import_core::geometry_indices::{AccessorIndex, BufferIndex};

const VERTICES: usize = 65_536;

/// Bounds are stored values, so integer accessors get their raw range.
fn accessor(
    component_type: ComponentType,
    element_type: ElementType,
    normalized: bool,
    bounds: (f64, f64),
) -> Accessor {
    Accessor {
        name: None,
        buffer_view: None,
        byte_offset: 0,
        component_type,
        element_type,
        count: VERTICES,
        normalized,
        min: Some(vec![bounds.0; element_type.num_components()]),
        max: Some(vec![bounds.1; element_type.num_components()]),
    }
}

fn bench_decode(c: &mut Criterion) {
    let bytes: Vec<u8> = (0..VERTICES * 16).map(|i| (i % 251) as u8).collect();
    let view = BufferView {
        name: None,
        buffer: BufferIndex(0),
        byte_offset: 0,
        byte_length: bytes.len(),
        byte_stride: None,
    };
    let source = ViewSource {
        view: &view,
        buffer: &bytes,
    };
    let options = DecodeOptions::default();

    let positions = accessor(ComponentType::Float32, ElementType::Vec3, false, (-1.0, 1.0));
    c.bench_function("decode_vec3_f32", |b| {
        b.iter(|| decode_accessor(AccessorIndex(0), black_box(&positions), Some(source), &options))
    });

    let colors = accessor(ComponentType::Uint8, ElementType::Vec4, true, (16.0, 240.0));
    c.bench_function("decode_vec4_u8_normalized", |b| {
        b.iter(|| decode_accessor(AccessorIndex(1), black_box(&colors), Some(source), &options))
    });

    let normals = accessor(ComponentType::Int16, ElementType::Vec3, true, (-16_384.0, 16_384.0));
    c.bench_function("decode_vec3_i16_normalized", |b| {
        b.iter(|| decode_accessor(AccessorIndex(2), black_box(&normals), Some(source), &options))
    });
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
