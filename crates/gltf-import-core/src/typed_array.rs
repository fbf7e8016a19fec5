//! Decoded accessor data.

use crate::component_types::{ComponentType, ElementType};

/// Flat component storage in the decoded representation.
///
/// Normalized integer accessors are stored as `F32`; everything else keeps
/// its native component type.
#[derive(Debug, Clone, PartialEq)]
pub enum Components {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

impl Components {
    /// Zero-filled storage of `len` components of the given type.
    ///
    /// Returns `None` if the allocation fails.
    pub fn try_zeroed(component_type: ComponentType, len: usize) -> Option<Self> {
        Some(match component_type {
            ComponentType::Int8 => Components::I8(zeroed_vec(len)?),
            ComponentType::Uint8 => Components::U8(zeroed_vec(len)?),
            ComponentType::Int16 => Components::I16(zeroed_vec(len)?),
            ComponentType::Uint16 => Components::U16(zeroed_vec(len)?),
            ComponentType::Uint32 => Components::U32(zeroed_vec(len)?),
            ComponentType::Float32 => Components::F32(zeroed_vec(len)?),
        })
    }

    pub fn len(&self) -> usize {
        match self {
            Components::I8(v) => v.len(),
            Components::U8(v) => v.len(),
            Components::I16(v) => v.len(),
            Components::U16(v) => v.len(),
            Components::U32(v) => v.len(),
            Components::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Component at flat position `i`, widened to `f32`.
    pub fn get_f32(&self, i: usize) -> Option<f32> {
        match self {
            Components::I8(v) => v.get(i).map(|&x| x as f32),
            Components::U8(v) => v.get(i).map(|&x| x as f32),
            Components::I16(v) => v.get(i).map(|&x| x as f32),
            Components::U16(v) => v.get(i).map(|&x| x as f32),
            Components::U32(v) => v.get(i).map(|&x| x as f32),
            Components::F32(v) => v.get(i).copied(),
        }
    }

    /// Component at flat position `i` as `u32`, for unsigned storage only.
    pub fn get_u32(&self, i: usize) -> Option<u32> {
        match self {
            Components::U8(v) => v.get(i).map(|&x| x as u32),
            Components::U16(v) => v.get(i).map(|&x| x as u32),
            Components::U32(v) => v.get(i).copied(),
            _ => None,
        }
    }
}

fn zeroed_vec<T: Clone + Default>(len: usize) -> Option<Vec<T>> {
    let mut values = Vec::new();
    values.try_reserve_exact(len).ok()?;
    values.resize(len, T::default());
    Some(values)
}

/// A dense, owned array of `count` accessor elements.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedArray {
    element_type: ElementType,
    component_type: ComponentType,
    normalized: bool,
    count: usize,
    components: Components,
}

impl TypedArray {
    /// Wraps flat component storage.
    ///
    /// Returns `None` if the storage length is not `count` times the element
    /// width.
    pub fn new(
        element_type: ElementType,
        component_type: ComponentType,
        normalized: bool,
        count: usize,
        components: Components,
    ) -> Option<Self> {
        if components.len() != count.checked_mul(element_type.num_components())? {
            return None;
        }
        Some(Self {
            element_type,
            component_type,
            normalized,
            count,
            components,
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Component type of the source accessor.
    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn normalized(&self) -> bool {
        self.normalized
    }

    pub fn num_components(&self) -> usize {
        self.element_type.num_components()
    }

    pub fn components(&self) -> &Components {
        &self.components
    }

    pub fn into_components(self) -> Components {
        self.components
    }

    pub fn component_f32(&self, flat: usize) -> Option<f32> {
        self.components.get_f32(flat)
    }

    /// Element `i` with every component widened to `f32`.
    pub fn element_f32(&self, i: usize) -> Option<Vec<f32>> {
        if i >= self.count {
            return None;
        }
        let n = self.num_components();
        (i * n..(i + 1) * n)
            .map(|flat| self.components.get_f32(flat))
            .collect()
    }

    /// All elements as fixed-width `f32` arrays.
    ///
    /// Returns `None` when the element width is not `N`.
    pub fn to_f32_array<const N: usize>(&self) -> Option<Vec<[f32; N]>> {
        if self.num_components() != N {
            return None;
        }
        let mut out = Vec::with_capacity(self.count);
        for i in 0..self.count {
            let base = i * N;
            let mut element = [0.0f32; N];
            for (c, slot) in element.iter_mut().enumerate() {
                *slot = self.components.get_f32(base + c)?;
            }
            out.push(element);
        }
        Some(out)
    }

    /// Scalars as `u32`, for non-normalized unsigned SCALAR arrays.
    pub fn to_u32_scalars(&self) -> Option<Vec<u32>> {
        if self.element_type != ElementType::Scalar || self.normalized {
            return None;
        }
        (0..self.count).map(|i| self.components.get_u32(i)).collect()
    }
}
