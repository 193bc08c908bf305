//! Native code-generator primitive types (§3.1, §4.1 "canonical
//! primitive/composite types").

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    /// A 2×64 integer vector, the lowering of Wasm's `v128` (§3.1).
    I8X16,
    /// The native pointer width; equal to `I64` on every target this
    /// compiler currently supports (§4.1 `pointer_type`).
    Pointer,
}

impl Type {
    pub fn bytes(self) -> u32 {
        match self {
            Type::I8 => 1,
            Type::I16 => 2,
            Type::I32 | Type::F32 => 4,
            Type::I64 | Type::F64 | Type::Pointer => 8,
            Type::I8X16 => 16,
        }
    }

    pub fn bits(self) -> u32 {
        self.bytes() * 8
    }

    pub fn is_int(self) -> bool {
        matches!(self, Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::Pointer)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Type::F32 | Type::F64)
    }

    pub fn is_vector(self) -> bool {
        matches!(self, Type::I8X16)
    }

    pub fn lower_valtype(vt: aotc_types::ValType) -> Type {
        use aotc_types::ValType;
        match vt {
            ValType::I32 => Type::I32,
            ValType::I64 => Type::I64,
            ValType::F32 => Type::F32,
            ValType::F64 => Type::F64,
            ValType::V128 => Type::I8X16,
            ValType::FuncRef | ValType::ExternRef => Type::I64,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Type::I8 => "i8",
            Type::I16 => "i16",
            Type::I32 => "i32",
            Type::I64 => "i64",
            Type::F32 => "f32",
            Type::F64 => "f64",
            Type::I8X16 => "i8x16",
            Type::Pointer => "ptr",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aotc_types::ValType;

    #[test]
    fn v128_lowers_to_a_16_byte_vector() {
        assert_eq!(Type::lower_valtype(ValType::V128), Type::I8X16);
        assert_eq!(Type::I8X16.bytes(), 16);
    }

    #[test]
    fn references_lower_to_opaque_64_bit_handles() {
        assert_eq!(Type::lower_valtype(ValType::FuncRef), Type::I64);
        assert_eq!(Type::lower_valtype(ValType::ExternRef), Type::I64);
    }
}
