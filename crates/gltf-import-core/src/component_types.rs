/// Scalar encoding of one component inside an accessor element.
///
/// Discriminants are the GL enum values glTF stores in `componentType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Int8 = 5120,
    Uint8 = 5121,
    Int16 = 5122,
    Uint16 = 5123,
    Uint32 = 5125,
    Float32 = 5126,
}

impl ComponentType {
    pub fn from_gl(code: u32) -> Option<Self> {
        match code {
            5120 => Some(ComponentType::Int8),
            5121 => Some(ComponentType::Uint8),
            5122 => Some(ComponentType::Int16),
            5123 => Some(ComponentType::Uint16),
            5125 => Some(ComponentType::Uint32),
            5126 => Some(ComponentType::Float32),
            _ => None,
        }
    }

    pub fn gl_code(&self) -> u32 {
        *self as u32
    }

    pub fn byte_length(&self) -> usize {
        match self {
            ComponentType::Int8 | ComponentType::Uint8 => 1,
            ComponentType::Int16 | ComponentType::Uint16 => 2,
            ComponentType::Uint32 | ComponentType::Float32 => 4,
        }
    }

    pub fn is_integral(&self) -> bool {
        !matches!(self, ComponentType::Float32)
    }

    /// Component types allowed for an index accessor.
    pub fn is_index_type(&self) -> bool {
        matches!(
            self,
            ComponentType::Uint8 | ComponentType::Uint16 | ComponentType::Uint32
        )
    }
}

/// Shape of one accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    /// Parses the accessor `type` string.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "SCALAR" => Some(ElementType::Scalar),
            "VEC2" => Some(ElementType::Vec2),
            "VEC3" => Some(ElementType::Vec3),
            "VEC4" => Some(ElementType::Vec4),
            "MAT2" => Some(ElementType::Mat2),
            "MAT3" => Some(ElementType::Mat3),
            "MAT4" => Some(ElementType::Mat4),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementType::Scalar => "SCALAR",
            ElementType::Vec2 => "VEC2",
            ElementType::Vec3 => "VEC3",
            ElementType::Vec4 => "VEC4",
            ElementType::Mat2 => "MAT2",
            ElementType::Mat3 => "MAT3",
            ElementType::Mat4 => "MAT4",
        }
    }

    pub fn num_components(&self) -> usize {
        match self {
            ElementType::Scalar => 1,
            ElementType::Vec2 => 2,
            ElementType::Vec3 => 3,
            ElementType::Vec4 | ElementType::Mat2 => 4,
            ElementType::Mat3 => 9,
            ElementType::Mat4 => 16,
        }
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, ElementType::Mat2 | ElementType::Mat3 | ElementType::Mat4)
    }
}

/// Byte size of one tightly packed element.
pub fn element_size(component_type: ComponentType, element_type: ElementType) -> usize {
    component_type.byte_length() * element_type.num_components()
}
