//! Accessor decoding: typed arrays out of raw buffer-view bytes.
//!
//! A single entry point, [`decode_accessor`], handles every
//! `(componentType, elementType)` combination. The component type selects
//! one instantiation of a generic reader; the element shape only changes how
//! many components are read per element. Bounds checks, normalization and
//! min/max correction all live here.
//!
//! Declared `min`/`max` hold stored values, so clamping runs on the raw
//! components and normalization comes last.

use byteorder::{ByteOrder, LittleEndian};
use num_traits::NumCast;

use crate::component_types::ComponentType;
use crate::entities::{Accessor, BufferView};
use crate::geometry_indices::AccessorIndex;
use crate::normalization::NormalizedInt;
use crate::status::{EntityRef, ImportError, ImportResult};
use crate::typed_array::{Components, TypedArray};

/// Most components an accessor without a buffer view may zero-fill.
pub const MAX_ZERO_FILLED_COMPONENTS: usize = 1 << 26;

/// Options for [`decode_accessor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Clamp decoded components into the accessor's declared `min`/`max`.
    pub clamp_to_bounds: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            clamp_to_bounds: true,
        }
    }
}

/// A buffer view together with the bytes of the buffer it points into.
#[derive(Debug, Clone, Copy)]
pub struct ViewSource<'a> {
    pub view: &'a BufferView,
    /// Complete content of the view's buffer.
    pub buffer: &'a [u8],
}

/// A little-endian component that can be read from a byte slice.
trait LeComponent: Copy {
    const SIZE: usize;
    fn read_le(bytes: &[u8]) -> Self;
}

impl LeComponent for i8 {
    const SIZE: usize = 1;
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }
}

impl LeComponent for u8 {
    const SIZE: usize = 1;
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl LeComponent for i16 {
    const SIZE: usize = 2;
    fn read_le(bytes: &[u8]) -> Self {
        LittleEndian::read_i16(bytes)
    }
}

impl LeComponent for u16 {
    const SIZE: usize = 2;
    fn read_le(bytes: &[u8]) -> Self {
        LittleEndian::read_u16(bytes)
    }
}

impl LeComponent for u32 {
    const SIZE: usize = 4;
    fn read_le(bytes: &[u8]) -> Self {
        LittleEndian::read_u32(bytes)
    }
}

impl LeComponent for f32 {
    const SIZE: usize = 4;
    fn read_le(bytes: &[u8]) -> Self {
        LittleEndian::read_f32(bytes)
    }
}

/// Resolved element layout inside one buffer.
#[derive(Debug, Clone, Copy)]
struct Layout {
    /// Absolute byte position of element 0 inside the buffer.
    start: usize,
    /// Absolute end of the view inside the buffer (exclusive).
    view_end: usize,
    stride: usize,
    element_size: usize,
    count: usize,
    num_components: usize,
}

/// Rejects component/element combinations this decoder does not handle.
pub fn check_supported(index: AccessorIndex, accessor: &Accessor) -> ImportResult<()> {
    let entity = EntityRef::accessor(index.0 as usize);
    if accessor.normalized && !accessor.component_type.is_integral() {
        return Err(ImportError::unsupported(
            entity,
            "normalized is only valid for integer component types",
        ));
    }
    if accessor.element_type.is_matrix() && accessor.component_type != ComponentType::Float32 {
        return Err(ImportError::unsupported(
            entity,
            format!(
                "{} with component type {} requires column padding",
                accessor.element_type.name(),
                accessor.component_type.gl_code()
            ),
        ));
    }
    Ok(())
}

/// Decodes an accessor into an owned typed array.
///
/// `source` is `None` for accessors without a buffer view, which decode to
/// `count` zero elements.
///
/// # Errors
///
/// - `Unsupported` for combinations rejected by [`check_supported`].
/// - `Format` if the view stride is smaller than one element.
/// - `Range` if any element window leaves the buffer view, the view leaves
///   its buffer, or a view-less accessor exceeds
///   [`MAX_ZERO_FILLED_COMPONENTS`].
pub fn decode_accessor(
    index: AccessorIndex,
    accessor: &Accessor,
    source: Option<ViewSource<'_>>,
    options: &DecodeOptions,
) -> ImportResult<TypedArray> {
    check_supported(index, accessor)?;
    let entity = EntityRef::accessor(index.0 as usize);

    let num_components = accessor.num_components();
    let total = accessor
        .count
        .checked_mul(num_components)
        .ok_or_else(|| ImportError::range(entity, "component count overflows"))?;

    let components = match source {
        None => zero_filled(entity, accessor.component_type, total)?,
        Some(source) => {
            let layout = resolve_layout(entity, accessor, source)?;
            let mut components = read_all(entity, accessor, source.buffer, &layout)?;
            if options.clamp_to_bounds {
                let corrected = clamp_to_bounds(
                    &mut components,
                    num_components,
                    accessor.min.as_deref(),
                    accessor.max.as_deref(),
                );
                if corrected > 0 {
                    tracing::debug!(
                        accessor = index.0,
                        corrected,
                        "clamped components into declared min/max"
                    );
                }
            }
            components
        }
    };
    let components = if accessor.normalized {
        normalize(components)
    } else {
        components
    };

    tracing::trace!(
        accessor = index.0,
        count = accessor.count,
        element = accessor.element_type.name(),
        component = accessor.component_type.gl_code(),
        "decoded accessor"
    );

    TypedArray::new(
        accessor.element_type,
        accessor.component_type,
        accessor.normalized,
        accessor.count,
        components,
    )
    .ok_or_else(|| ImportError::range(entity, "decoded length does not match count"))
}

fn zero_filled(
    entity: EntityRef,
    component_type: ComponentType,
    len: usize,
) -> ImportResult<Components> {
    if len > MAX_ZERO_FILLED_COMPONENTS {
        return Err(ImportError::range(
            entity,
            format!(
                "{} components without a buffer view exceed the limit of {}",
                len, MAX_ZERO_FILLED_COMPONENTS
            ),
        ));
    }
    Components::try_zeroed(component_type, len)
        .ok_or_else(|| ImportError::range(entity, "cannot allocate zero-filled components"))
}

fn resolve_layout(
    entity: EntityRef,
    accessor: &Accessor,
    source: ViewSource<'_>,
) -> ImportResult<Layout> {
    let view = source.view;
    let element_size = accessor.element_size();

    let stride = match view.byte_stride {
        Some(stride) if stride != 0 => stride,
        _ => element_size,
    };
    if stride < element_size {
        return Err(ImportError::format(
            entity,
            format!(
                "byteStride {} is smaller than the element size {}",
                stride, element_size
            ),
        ));
    }

    let view_end = view.byte_end().ok_or_else(|| {
        ImportError::range(entity, "buffer view offset + length overflows")
    })?;
    if view_end > source.buffer.len() {
        return Err(ImportError::range(
            entity,
            format!(
                "buffer view ends at byte {} but its buffer holds {} bytes",
                view_end,
                source.buffer.len()
            ),
        ));
    }

    let start = view
        .byte_offset
        .checked_add(accessor.byte_offset)
        .ok_or_else(|| ImportError::range(entity, "byte offset overflows"))?;

    // Positions grow with the element index, so the last window bounds them all.
    if accessor.count > 0 {
        let last_end = (accessor.count - 1)
            .checked_mul(stride)
            .and_then(|span| span.checked_add(start))
            .and_then(|last| last.checked_add(element_size))
            .ok_or_else(|| ImportError::range(entity, "element positions overflow"))?;
        if last_end > view_end {
            return Err(ImportError::range(
                entity,
                format!(
                    "{} elements of {} bytes with stride {} end at byte {}, past the buffer view end at byte {}",
                    accessor.count, element_size, stride, last_end, view_end
                ),
            ));
        }
    }

    Ok(Layout {
        start,
        view_end,
        stride,
        element_size,
        count: accessor.count,
        num_components: accessor.num_components(),
    })
}

/// Single dispatch on the component type. Integers stay raw.
fn read_all(
    entity: EntityRef,
    accessor: &Accessor,
    buffer: &[u8],
    layout: &Layout,
) -> ImportResult<Components> {
    Ok(match accessor.component_type {
        ComponentType::Int8 => Components::I8(read_components(entity, buffer, layout)?),
        ComponentType::Uint8 => Components::U8(read_components(entity, buffer, layout)?),
        ComponentType::Int16 => Components::I16(read_components(entity, buffer, layout)?),
        ComponentType::Uint16 => Components::U16(read_components(entity, buffer, layout)?),
        ComponentType::Uint32 => Components::U32(read_components(entity, buffer, layout)?),
        ComponentType::Float32 => Components::F32(read_components(entity, buffer, layout)?),
    })
}

fn read_components<T: LeComponent>(
    entity: EntityRef,
    buffer: &[u8],
    layout: &Layout,
) -> ImportResult<Vec<T>> {
    let mut out = Vec::with_capacity(layout.count * layout.num_components);
    for i in 0..layout.count {
        let position = layout.start + i * layout.stride;
        if position + layout.element_size > layout.view_end {
            return Err(ImportError::range(
                entity,
                format!(
                    "element {} at byte {} (+{}) exceeds the buffer view end at byte {}",
                    i, position, layout.element_size, layout.view_end
                ),
            ));
        }
        let element = &buffer[position..position + layout.element_size];
        out.extend(element.chunks_exact(T::SIZE).map(T::read_le));
    }
    Ok(out)
}

/// Converts raw integer storage to normalized `F32`.
fn normalize(components: Components) -> Components {
    match components {
        Components::I8(v) => normalized_f32(v),
        Components::U8(v) => normalized_f32(v),
        Components::I16(v) => normalized_f32(v),
        Components::U16(v) => normalized_f32(v),
        Components::U32(v) => normalized_f32(v),
        Components::F32(v) => Components::F32(v),
    }
}

fn normalized_f32<T: NormalizedInt>(values: Vec<T>) -> Components {
    Components::F32(values.into_iter().map(NormalizedInt::to_normalized).collect())
}

/// Clamps each component into its declared bounds.
///
/// `components` must be the stored (not yet normalized) values. Returns the
/// number of components that were changed. Bounds are rounded inward for
/// integer storage; a pair with `min > max` is ignored.
pub fn clamp_to_bounds(
    components: &mut Components,
    num_components: usize,
    min: Option<&[f64]>,
    max: Option<&[f64]>,
) -> usize {
    if min.is_none() && max.is_none() {
        return 0;
    }
    match components {
        Components::I8(v) => clamp_slice(v, num_components, min, max, true),
        Components::U8(v) => clamp_slice(v, num_components, min, max, true),
        Components::I16(v) => clamp_slice(v, num_components, min, max, true),
        Components::U16(v) => clamp_slice(v, num_components, min, max, true),
        Components::U32(v) => clamp_slice(v, num_components, min, max, true),
        Components::F32(v) => clamp_slice(v, num_components, min, max, false),
    }
}

fn clamp_slice<T>(
    values: &mut [T],
    num_components: usize,
    min: Option<&[f64]>,
    max: Option<&[f64]>,
    integral: bool,
) -> usize
where
    T: Copy + PartialOrd + NumCast,
{
    if num_components == 0 {
        return 0;
    }

    let bounds: Vec<(Option<T>, Option<T>)> = (0..num_components)
        .map(|c| {
            let lo = min.and_then(|m| m.get(c).copied());
            let hi = max.and_then(|m| m.get(c).copied());
            if let (Some(lo), Some(hi)) = (lo, hi) {
                if lo > hi {
                    return (None, None);
                }
            }
            let lo = lo.and_then(|v| <T as NumCast>::from(if integral { v.ceil() } else { v }));
            let hi = hi.and_then(|v| <T as NumCast>::from(if integral { v.floor() } else { v }));
            (lo, hi)
        })
        .collect();

    let mut corrected = 0;
    for element in values.chunks_mut(num_components) {
        for (value, (lo, hi)) in element.iter_mut().zip(&bounds) {
            if let Some(lo) = lo {
                if *value < *lo {
                    *value = *lo;
                    corrected += 1;
                    continue;
                }
            }
            if let Some(hi) = hi {
                if *value > *hi {
                    *value = *hi;
                    corrected += 1;
                }
            }
        }
    }
    corrected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component_types::ElementType;
    use crate::geometry_indices::BufferIndex;

    fn view(byte_offset: usize, byte_length: usize, byte_stride: Option<usize>) -> BufferView {
        BufferView {
            name: None,
            buffer: BufferIndex(0),
            byte_offset,
            byte_length,
            byte_stride,
        }
    }

    fn accessor(
        component_type: ComponentType,
        element_type: ElementType,
        count: usize,
    ) -> Accessor {
        Accessor {
            name: None,
            buffer_view: None,
            byte_offset: 0,
            component_type,
            element_type,
            count,
            normalized: false,
            min: None,
            max: None,
        }
    }

    fn f32_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_decode_vec3_float() {
        let bytes = f32_bytes(&[1.5, -2.25, 0.0]);
        let view = view(0, bytes.len(), None);
        let acc = accessor(ComponentType::Float32, ElementType::Vec3, 1);
        let source = ViewSource { view: &view, buffer: &bytes };

        let array = decode_accessor(AccessorIndex(0), &acc, Some(source), &DecodeOptions::default())
            .unwrap();
        assert_eq!(array.to_f32_array::<3>().unwrap(), vec![[1.5, -2.25, 0.0]]);
    }

    #[test]
    fn test_interleaved_stride() {
        // Two vertices of [position(3f), uv(2f)] -> stride 20.
        let bytes = f32_bytes(&[
            1.0, 2.0, 3.0, 0.25, 0.5, //
            4.0, 5.0, 6.0, 0.75, 1.0,
        ]);
        let view = view(0, bytes.len(), Some(20));
        let source = ViewSource { view: &view, buffer: &bytes };

        let positions = accessor(ComponentType::Float32, ElementType::Vec3, 2);
        let array =
            decode_accessor(AccessorIndex(0), &positions, Some(source), &DecodeOptions::default())
                .unwrap();
        assert_eq!(
            array.to_f32_array::<3>().unwrap(),
            vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]
        );

        let mut uvs = accessor(ComponentType::Float32, ElementType::Vec2, 2);
        uvs.byte_offset = 12;
        let array =
            decode_accessor(AccessorIndex(1), &uvs, Some(source), &DecodeOptions::default())
                .unwrap();
        assert_eq!(array.to_f32_array::<2>().unwrap(), vec![[0.25, 0.5], [0.75, 1.0]]);
    }

    #[test]
    fn test_view_offset_applied() {
        let mut bytes = vec![0xAA; 4];
        bytes.extend_from_slice(&7u16.to_le_bytes());
        bytes.extend_from_slice(&9u16.to_le_bytes());
        let view = view(4, 4, None);
        let source = ViewSource { view: &view, buffer: &bytes };
        let acc = accessor(ComponentType::Uint16, ElementType::Scalar, 2);

        let array = decode_accessor(AccessorIndex(0), &acc, Some(source), &DecodeOptions::default())
            .unwrap();
        assert_eq!(array.to_u32_scalars(), Some(vec![7, 9]));
    }

    #[test]
    fn test_window_past_view_is_range_error() {
        let bytes = f32_bytes(&[0.0; 6]);
        // The view only covers the first vertex.
        let view = view(0, 12, None);
        let source = ViewSource { view: &view, buffer: &bytes };
        let acc = accessor(ComponentType::Float32, ElementType::Vec3, 2);

        let err = decode_accessor(AccessorIndex(4), &acc, Some(source), &DecodeOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), crate::status::ErrorKind::Range);
        assert_eq!(err.entity(), EntityRef::accessor(4));
    }

    #[test]
    fn test_view_past_buffer_is_range_error() {
        let bytes = vec![0u8; 8];
        let view = view(4, 8, None);
        let source = ViewSource { view: &view, buffer: &bytes };
        let acc = accessor(ComponentType::Uint8, ElementType::Scalar, 1);

        let err = decode_accessor(AccessorIndex(0), &acc, Some(source), &DecodeOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), crate::status::ErrorKind::Range);
    }

    #[test]
    fn test_stride_smaller_than_element() {
        let bytes = vec![0u8; 64];
        let view = view(0, 64, Some(4));
        let source = ViewSource { view: &view, buffer: &bytes };
        let acc = accessor(ComponentType::Float32, ElementType::Vec3, 2);

        let err = decode_accessor(AccessorIndex(0), &acc, Some(source), &DecodeOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), crate::status::ErrorKind::Format);
    }

    #[test]
    fn test_normalized_bytes() {
        let bytes = vec![255u8, 0, 128, 127];
        let view = view(0, 4, None);
        let source = ViewSource { view: &view, buffer: &bytes };

        let mut unsigned = accessor(ComponentType::Uint8, ElementType::Vec2, 2);
        unsigned.normalized = true;
        let array =
            decode_accessor(AccessorIndex(0), &unsigned, Some(source), &DecodeOptions::default())
                .unwrap();
        let values = array.to_f32_array::<2>().unwrap();
        assert_eq!(values[0], [1.0, 0.0]);

        let mut signed = accessor(ComponentType::Int8, ElementType::Vec2, 2);
        signed.normalized = true;
        let array =
            decode_accessor(AccessorIndex(1), &signed, Some(source), &DecodeOptions::default())
                .unwrap();
        let values = array.to_f32_array::<2>().unwrap();
        // 0xFF = -1, 0x80 = -128, 0x7F = 127
        assert_eq!(values[1], [-1.0, 1.0]);
        assert!((values[0][0] - (-1.0 / 127.0)).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_to_declared_bounds() {
        let bytes = f32_bytes(&[-0.5, 0.5, 1.25, 0.75]);
        let view = view(0, bytes.len(), None);
        let source = ViewSource { view: &view, buffer: &bytes };
        let mut acc = accessor(ComponentType::Float32, ElementType::Vec2, 2);
        acc.min = Some(vec![0.0, 0.0]);
        acc.max = Some(vec![1.0, 1.0]);

        let array = decode_accessor(AccessorIndex(0), &acc, Some(source), &DecodeOptions::default())
            .unwrap();
        assert_eq!(array.to_f32_array::<2>().unwrap(), vec![[0.0, 0.5], [1.0, 0.75]]);

        let unclamped = decode_accessor(
            AccessorIndex(0),
            &acc,
            Some(source),
            &DecodeOptions { clamp_to_bounds: false },
        )
        .unwrap();
        assert_eq!(
            unclamped.to_f32_array::<2>().unwrap(),
            vec![[-0.5, 0.5], [1.25, 0.75]]
        );
    }

    #[test]
    fn test_clamp_ignores_inverted_bounds() {
        let mut components = Components::U8(vec![5, 50]);
        let corrected =
            clamp_to_bounds(&mut components, 2, Some(&[10.0, 0.0]), Some(&[1.0, 20.0]));
        assert_eq!(corrected, 1);
        assert_eq!(components, Components::U8(vec![5, 20]));
    }

    #[test]
    fn test_normalized_bounds_use_stored_values() {
        let bytes = vec![128u8, 255, 5, 0];
        let view = view(0, 4, None);
        let source = ViewSource { view: &view, buffer: &bytes };
        let mut acc = accessor(ComponentType::Uint8, ElementType::Vec2, 2);
        acc.normalized = true;
        acc.min = Some(vec![10.0, 10.0]);
        acc.max = Some(vec![250.0, 250.0]);

        let array = decode_accessor(AccessorIndex(0), &acc, Some(source), &DecodeOptions::default())
            .unwrap();
        let values = array.to_f32_array::<2>().unwrap();
        assert_eq!(values[0], [128.0 / 255.0, 250.0 / 255.0]);
        assert_eq!(values[1], [10.0 / 255.0, 10.0 / 255.0]);
        assert!(values.iter().flatten().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_missing_view_is_zero_filled() {
        let acc = accessor(ComponentType::Float32, ElementType::Vec3, 2);
        let array = decode_accessor(AccessorIndex(0), &acc, None, &DecodeOptions::default()).unwrap();
        assert_eq!(array.to_f32_array::<3>().unwrap(), vec![[0.0; 3]; 2]);

        let mut colors = accessor(ComponentType::Uint8, ElementType::Vec4, 1);
        colors.normalized = true;
        let array =
            decode_accessor(AccessorIndex(1), &colors, None, &DecodeOptions::default()).unwrap();
        assert_eq!(array.components(), &Components::F32(vec![0.0; 4]));
    }

    #[test]
    fn test_oversized_missing_view_is_range_error() {
        let acc = accessor(ComponentType::Float32, ElementType::Scalar, 1 << 62);
        let err = decode_accessor(AccessorIndex(3), &acc, None, &DecodeOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), crate::status::ErrorKind::Range);
        assert_eq!(err.entity(), EntityRef::accessor(3));

        let acc = accessor(ComponentType::Uint8, ElementType::Vec4, MAX_ZERO_FILLED_COMPONENTS);
        let err = decode_accessor(AccessorIndex(3), &acc, None, &DecodeOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), crate::status::ErrorKind::Range);
    }

    #[test]
    fn test_unsupported_combinations() {
        let mut acc = accessor(ComponentType::Float32, ElementType::Vec3, 1);
        acc.normalized = true;
        let err = decode_accessor(AccessorIndex(0), &acc, None, &DecodeOptions::default()).unwrap_err();
        assert_eq!(err.kind(), crate::status::ErrorKind::Unsupported);

        let acc = accessor(ComponentType::Int16, ElementType::Mat2, 1);
        let err = decode_accessor(AccessorIndex(0), &acc, None, &DecodeOptions::default()).unwrap_err();
        assert_eq!(err.kind(), crate::status::ErrorKind::Unsupported);
    }
}
