//! Property tests for the accessor decoder.

use gltf_import_core::accessor_decoder::{decode_accessor, DecodeOptions, ViewSource};
use gltf_import_core::component_types::{ComponentType, ElementType};
use gltf_import_core::entities::{Accessor, BufferView};
use gltf_import_core::geometry_indices::{AccessorIndex, BufferIndex};
use gltf_import_core::status::ErrorKind;
use proptest::prelude::*;

fn accessor(
    component_type: ComponentType,
    element_type: ElementType,
    count: usize,
    byte_offset: usize,
    normalized: bool,
) -> Accessor {
    Accessor {
        name: None,
        buffer_view: None,
        byte_offset,
        component_type,
        element_type,
        count,
        normalized,
        min: None,
        max: None,
    }
}

fn view(byte_offset: usize, byte_length: usize, byte_stride: Option<usize>) -> BufferView {
    BufferView {
        name: None,
        buffer: BufferIndex(0),
        byte_offset,
        byte_length,
        byte_stride,
    }
}

fn component_type() -> impl Strategy<Value = ComponentType> {
    prop_oneof![
        Just(ComponentType::Int8),
        Just(ComponentType::Uint8),
        Just(ComponentType::Int16),
        Just(ComponentType::Uint16),
        Just(ComponentType::Uint32),
        Just(ComponentType::Float32),
    ]
}

fn vector_type() -> impl Strategy<Value = ElementType> {
    prop_oneof![
        Just(ElementType::Scalar),
        Just(ElementType::Vec2),
        Just(ElementType::Vec3),
        Just(ElementType::Vec4),
    ]
}

proptest! {
    #[test]
    fn normalized_unsigned_bytes_stay_in_unit_range(raw in proptest::collection::vec(any::<u8>(), 1..64)) {
        let view = view(0, raw.len(), None);
        let acc = accessor(ComponentType::Uint8, ElementType::Scalar, raw.len(), 0, true);
        let source = ViewSource { view: &view, buffer: &raw };
        let array = decode_accessor(AccessorIndex(0), &acc, Some(source), &DecodeOptions::default()).unwrap();

        for (i, &byte) in raw.iter().enumerate() {
            let value = array.component_f32(i).unwrap();
            prop_assert!((0.0..=1.0).contains(&value));
            prop_assert_eq!(value, byte as f32 / 255.0);
        }
    }

    #[test]
    fn normalized_signed_shorts_stay_in_signed_unit_range(raw in proptest::collection::vec(any::<i16>(), 1..64)) {
        let bytes: Vec<u8> = raw.iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = view(0, bytes.len(), None);
        let acc = accessor(ComponentType::Int16, ElementType::Scalar, raw.len(), 0, true);
        let source = ViewSource { view: &view, buffer: &bytes };
        let array = decode_accessor(AccessorIndex(0), &acc, Some(source), &DecodeOptions::default()).unwrap();

        for (i, &short) in raw.iter().enumerate() {
            let value = array.component_f32(i).unwrap();
            prop_assert!((-1.0..=1.0).contains(&value));
            if short == i16::MIN {
                prop_assert_eq!(value, -1.0);
            }
        }
    }

    #[test]
    fn tightly_packed_floats_decode_exactly(values in proptest::collection::vec(-1.0e6f32..1.0e6, 3..48)) {
        let count = values.len() / 3;
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = view(0, bytes.len(), None);
        let acc = accessor(ComponentType::Float32, ElementType::Vec3, count, 0, false);
        let source = ViewSource { view: &view, buffer: &bytes };
        let array = decode_accessor(AccessorIndex(0), &acc, Some(source), &DecodeOptions::default()).unwrap();

        let decoded = array.to_f32_array::<3>().unwrap();
        prop_assert_eq!(decoded.len(), count);
        for (i, element) in decoded.iter().enumerate() {
            prop_assert_eq!(&element[..], &values[i * 3..i * 3 + 3]);
        }
    }

    #[test]
    fn arbitrary_layouts_never_read_outside_the_view(
        component_type in component_type(),
        element_type in vector_type(),
        count in 0usize..64,
        accessor_offset in 0usize..32,
        view_offset in 0usize..32,
        view_length in 0usize..256,
        stride in prop_oneof![Just(None), (1usize..64).prop_map(Some)],
        buffer_length in 0usize..320,
    ) {
        let buffer = vec![0x5Au8; buffer_length];
        let view = view(view_offset, view_length, stride);
        let acc = accessor(component_type, element_type, count, accessor_offset, false);
        let source = ViewSource { view: &view, buffer: &buffer };

        match decode_accessor(AccessorIndex(0), &acc, Some(source), &DecodeOptions::default()) {
            Ok(array) => {
                prop_assert_eq!(array.len(), count);
                let element_size = acc.element_size();
                let effective_stride = stride.filter(|s| *s != 0).unwrap_or(element_size);
                if count > 0 {
                    let last_end = view_offset + accessor_offset + (count - 1) * effective_stride + element_size;
                    prop_assert!(last_end <= view_offset + view_length);
                    prop_assert!(view_offset + view_length <= buffer_length);
                }
            }
            Err(err) => {
                prop_assert!(matches!(err.kind(), ErrorKind::Range | ErrorKind::Format));
            }
        }
    }
}

#[test]
fn vec3_float_without_stride_uses_twelve_bytes() {
    // Three vertices; a wrong stride would pick up the wrong floats.
    let floats = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
    let bytes: Vec<u8> = floats.iter().flat_map(|v| v.to_le_bytes()).collect();
    let view = view(0, bytes.len(), None);
    let acc = accessor(ComponentType::Float32, ElementType::Vec3, 3, 0, false);
    let source = ViewSource {
        view: &view,
        buffer: &bytes,
    };

    let array = decode_accessor(AccessorIndex(0), &acc, Some(source), &DecodeOptions::default())
        .expect("decode vec3");
    assert_eq!(
        array.to_f32_array::<3>().unwrap(),
        vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]
    );

    // One more element than the view holds: 4 * 12 > 36.
    let too_many = accessor(ComponentType::Float32, ElementType::Vec3, 4, 0, false);
    let err = decode_accessor(AccessorIndex(2), &too_many, Some(source), &DecodeOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
}
