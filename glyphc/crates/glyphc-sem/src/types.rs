//! Interned type signatures (SPEC §3).
//!
//! A [`TypeSignature`] is a tagged variant over `{Primitive, Pointer,
//! Array_Sized, Array_Unsized, Struct, Function, Void, Error}`. Two
//! structurally equal signatures are always the same [`TypeId`] — child
//! types are referenced by their already-interned id rather than boxed
//! inline, so structural equality is a flat comparison with no recursion,
//! and the interning table is a straightforward `HashMap` keyed on the
//! signature itself.

use std::collections::HashMap;

use glyphc_util::Symbol;

/// Handle into [`TypeInterner`]. Shared with `glyphc-par`'s AST node
/// `type_id` field so the analyzer can annotate nodes directly.
pub type TypeId = glyphc_par::ast::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
}

impl PrimitiveType {
    pub fn size_in_bytes(self) -> u32 {
        match self {
            PrimitiveType::I8 | PrimitiveType::U8 | PrimitiveType::Bool => 1,
            PrimitiveType::I16 | PrimitiveType::U16 => 2,
            PrimitiveType::I32 | PrimitiveType::U32 | PrimitiveType::F32 => 4,
            PrimitiveType::I64 | PrimitiveType::U64 | PrimitiveType::F64 => 8,
        }
    }

    pub fn alignment_in_bytes(self) -> u32 {
        self.size_in_bytes()
    }

    pub fn is_signed_integer(self) -> bool {
        matches!(self, PrimitiveType::I8 | PrimitiveType::I16 | PrimitiveType::I32 | PrimitiveType::I64)
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(self, PrimitiveType::U8 | PrimitiveType::U16 | PrimitiveType::U32 | PrimitiveType::U64)
    }

    pub fn is_integer(self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    pub fn is_float(self) -> bool {
        matches!(self, PrimitiveType::F32 | PrimitiveType::F64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Resolve a surface type name (`i32`, `bool`, ...) to its primitive,
    /// using the reserved symbol constants so this is integer comparison
    /// rather than string matching.
    pub fn from_symbol(sym: Symbol) -> Option<PrimitiveType> {
        Some(match sym {
            s if s == Symbol::TY_I8 => PrimitiveType::I8,
            s if s == Symbol::TY_I16 => PrimitiveType::I16,
            s if s == Symbol::TY_I32 => PrimitiveType::I32,
            s if s == Symbol::TY_I64 => PrimitiveType::I64,
            s if s == Symbol::TY_U8 => PrimitiveType::U8,
            s if s == Symbol::TY_U16 => PrimitiveType::U16,
            s if s == Symbol::TY_U32 => PrimitiveType::U32,
            s if s == Symbol::TY_U64 => PrimitiveType::U64,
            s if s == Symbol::TY_F32 => PrimitiveType::F32,
            s if s == Symbol::TY_F64 => PrimitiveType::F64,
            s if s == Symbol::TY_BOOL => PrimitiveType::Bool,
            _ => return None,
        })
    }
}

/// One field of a `Struct` type signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name_id: Symbol,
    pub type_id: TypeId,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSignature {
    Primitive(PrimitiveType),
    Pointer { child: TypeId },
    ArraySized { child: TypeId, len: u32 },
    /// Runtime layout `{ data_pointer: 8 bytes, length: 4 bytes, padding:
    /// 4 bytes }`, 16 bytes total, 8-byte aligned — fixed regardless of
    /// `child`.
    ArrayUnsized { child: TypeId },
    Struct { fields: Vec<StructField> },
    Function { params: Vec<TypeId>, ret: TypeId },
    Void,
    /// Sentinel assigned to expressions that failed to type-check, so one
    /// failure doesn't cascade into a chain of further errors.
    Error,
}

/// Interning table for [`TypeSignature`]s, with memoized size/alignment.
///
/// Owned exclusively by the semantic analyzer; every later phase only
/// holds [`TypeId`]s and looks layout up through a shared reference to
/// this table.
pub struct TypeInterner {
    signatures: Vec<TypeSignature>,
    layouts: Vec<(u32, u32)>, // (size_in_bytes, alignment_in_bytes), parallel to `signatures`
    lookup: HashMap<TypeSignature, TypeId>,

    pub void: TypeId,
    pub error: TypeId,
    pub i8: TypeId,
    pub i16: TypeId,
    pub i32: TypeId,
    pub i64: TypeId,
    pub u8: TypeId,
    pub u16: TypeId,
    pub u32: TypeId,
    pub u64: TypeId,
    pub f32: TypeId,
    pub f64: TypeId,
    pub bool_: TypeId,
}

impl TypeInterner {
    pub fn new() -> Self {
        let mut this = Self {
            signatures: Vec::new(),
            layouts: Vec::new(),
            lookup: HashMap::new(),
            void: TypeId(0),
            error: TypeId(0),
            i8: TypeId(0),
            i16: TypeId(0),
            i32: TypeId(0),
            i64: TypeId(0),
            u8: TypeId(0),
            u16: TypeId(0),
            u32: TypeId(0),
            u64: TypeId(0),
            f32: TypeId(0),
            f64: TypeId(0),
            bool_: TypeId(0),
        };
        this.void = this.intern(TypeSignature::Void);
        this.error = this.intern(TypeSignature::Error);
        this.i8 = this.intern(TypeSignature::Primitive(PrimitiveType::I8));
        this.i16 = this.intern(TypeSignature::Primitive(PrimitiveType::I16));
        this.i32 = this.intern(TypeSignature::Primitive(PrimitiveType::I32));
        this.i64 = this.intern(TypeSignature::Primitive(PrimitiveType::I64));
        this.u8 = this.intern(TypeSignature::Primitive(PrimitiveType::U8));
        this.u16 = this.intern(TypeSignature::Primitive(PrimitiveType::U16));
        this.u32 = this.intern(TypeSignature::Primitive(PrimitiveType::U32));
        this.u64 = this.intern(TypeSignature::Primitive(PrimitiveType::U64));
        this.f32 = this.intern(TypeSignature::Primitive(PrimitiveType::F32));
        this.f64 = this.intern(TypeSignature::Primitive(PrimitiveType::F64));
        this.bool_ = this.intern(TypeSignature::Primitive(PrimitiveType::Bool));
        this
    }

    pub fn primitive(&mut self, prim: PrimitiveType) -> TypeId {
        match prim {
            PrimitiveType::I8 => self.i8,
            PrimitiveType::I16 => self.i16,
            PrimitiveType::I32 => self.i32,
            PrimitiveType::I64 => self.i64,
            PrimitiveType::U8 => self.u8,
            PrimitiveType::U16 => self.u16,
            PrimitiveType::U32 => self.u32,
            PrimitiveType::U64 => self.u64,
            PrimitiveType::F32 => self.f32,
            PrimitiveType::F64 => self.f64,
            PrimitiveType::Bool => self.bool_,
        }
    }

    /// Intern `signature`, computing and memoizing its layout on first
    /// insertion. Two structurally equal signatures always return the
    /// same id (SPEC §8's "Type interning" property test).
    pub fn intern(&mut self, signature: TypeSignature) -> TypeId {
        if let Some(&id) = self.lookup.get(&signature) {
            return id;
        }
        let layout = self.compute_layout(&signature);
        let id = TypeId(self.signatures.len() as u32);
        self.signatures.push(signature.clone());
        self.layouts.push(layout);
        self.lookup.insert(signature, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeSignature {
        &self.signatures[id.0 as usize]
    }

    pub fn size_in_bytes(&self, id: TypeId) -> u32 {
        self.layouts[id.0 as usize].0
    }

    pub fn alignment_in_bytes(&self, id: TypeId) -> u32 {
        self.layouts[id.0 as usize].1
    }

    pub fn intern_pointer(&mut self, child: TypeId) -> TypeId {
        self.intern(TypeSignature::Pointer { child })
    }

    pub fn intern_array_sized(&mut self, child: TypeId, len: u32) -> TypeId {
        self.intern(TypeSignature::ArraySized { child, len })
    }

    pub fn intern_array_unsized(&mut self, child: TypeId) -> TypeId {
        self.intern(TypeSignature::ArrayUnsized { child })
    }

    pub fn intern_function(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.intern(TypeSignature::Function { params, ret })
    }

    /// Build a `Struct` signature's field offsets per the standard rule:
    /// align the running offset up to each member's alignment, place the
    /// member, advance by its size. Struct alignment is the max member
    /// alignment (1 for an empty struct).
    pub fn intern_struct(&mut self, name_and_types: Vec<(Symbol, TypeId)>) -> TypeId {
        let mut offset: u32 = 0;
        let mut struct_align: u32 = 1;
        let mut fields = Vec::with_capacity(name_and_types.len());
        for (name_id, type_id) in name_and_types {
            let align = self.alignment_in_bytes(type_id).max(1);
            let size = self.size_in_bytes(type_id);
            offset = align_up(offset, align);
            fields.push(StructField { name_id, type_id, offset });
            offset += size;
            struct_align = struct_align.max(align);
        }
        self.intern(TypeSignature::Struct { fields })
    }

    fn compute_layout(&self, signature: &TypeSignature) -> (u32, u32) {
        match signature {
            TypeSignature::Primitive(p) => (p.size_in_bytes(), p.alignment_in_bytes()),
            TypeSignature::Pointer { .. } => (8, 8),
            TypeSignature::ArraySized { child, len } => {
                let (child_size, child_align) = self.layouts[child.0 as usize];
                (child_size * len, child_align.max(1))
            }
            TypeSignature::ArrayUnsized { .. } => (16, 8),
            TypeSignature::Struct { fields } => {
                let mut offset = 0u32;
                let mut align = 1u32;
                for field in fields {
                    let (_, field_align) = self.layouts[field.type_id.0 as usize];
                    align = align.max(field_align.max(1));
                }
                if let Some(last) = fields.last() {
                    let (last_size, _) = self.layouts[last.type_id.0 as usize];
                    offset = last.offset + last_size;
                }
                (align_up(offset, align), align)
            }
            TypeSignature::Function { .. } => (8, 8), // a function value is its code address
            TypeSignature::Void | TypeSignature::Error => (0, 1),
        }
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
pub fn align_up(offset: u32, align: u32) -> u32 {
    if align == 0 {
        return offset;
    }
    (offset + align - 1) / align * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structurally_equal_signatures_intern_to_the_same_id() {
        let mut types = TypeInterner::new();
        let a = types.intern_pointer(types.i32);
        let b = types.intern_pointer(types.i32);
        assert_eq!(a, b);
        let c = types.intern_pointer(types.f32);
        assert_ne!(a, c);
    }

    #[test]
    fn struct_offsets_respect_alignment_and_ordering() {
        let mut types = TypeInterner::new();
        let i8_ty = types.i8;
        let i32_ty = types.i32;
        let i64_ty = types.i64;
        let s = types.intern_struct(vec![(Symbol::intern("a"), i8_ty), (Symbol::intern("b"), i32_ty), (Symbol::intern("c"), i64_ty)]);
        let TypeSignature::Struct { fields } = types.get(s).clone() else { panic!("expected struct") };
        assert_eq!(fields[0].offset, 0);
        assert_eq!(fields[1].offset, 4); // aligned up from 1 to 4
        assert_eq!(fields[2].offset, 8); // aligned up from 8 to 8
        assert_eq!(types.size_in_bytes(s), 16); // align_up(16, 8)
        assert_eq!(types.alignment_in_bytes(s), 8);
    }

    #[test]
    fn array_unsized_layout_is_fixed() {
        let mut types = TypeInterner::new();
        let a = types.intern_array_unsized(types.u8);
        assert_eq!(types.size_in_bytes(a), 16);
        assert_eq!(types.alignment_in_bytes(a), 8);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn primitive_strategy() -> impl Strategy<Value = PrimitiveType> {
        prop_oneof![
            Just(PrimitiveType::I8),
            Just(PrimitiveType::I16),
            Just(PrimitiveType::I32),
            Just(PrimitiveType::I64),
            Just(PrimitiveType::U8),
            Just(PrimitiveType::U16),
            Just(PrimitiveType::U32),
            Just(PrimitiveType::U64),
            Just(PrimitiveType::F32),
            Just(PrimitiveType::F64),
            Just(PrimitiveType::Bool),
        ]
    }

    proptest! {
        /// Two pointers to the same primitive child always intern to the
        /// same `TypeId`, regardless of how many other types were interned
        /// first — structural equality, not insertion order, drives it.
        #[test]
        fn pointer_interning_is_structural(
            decoys in prop::collection::vec(primitive_strategy(), 0..8),
            child in primitive_strategy(),
        ) {
            let mut types = TypeInterner::new();
            for decoy in &decoys {
                let decoy_id = types.primitive(*decoy);
                let _ = types.intern_pointer(decoy_id);
            }
            let child_id = types.primitive(child);
            let a = types.intern_pointer(child_id);
            let b = types.intern_pointer(child_id);
            prop_assert_eq!(a, b);
        }

        /// For any list of primitive-typed struct fields, the interned
        /// offsets are monotonically non-decreasing, every offset is a
        /// multiple of its own field's alignment, and the struct's total
        /// size is a multiple of its alignment.
        #[test]
        fn struct_offsets_are_always_aligned_and_ordered(prims in prop::collection::vec(primitive_strategy(), 0..10)) {
            let mut types = TypeInterner::new();
            let fields: Vec<(Symbol, TypeId)> = prims
                .iter()
                .enumerate()
                .map(|(i, p)| (Symbol::intern(&format!("f{i}")), types.primitive(*p)))
                .collect();
            let expected_sizes: Vec<u32> = prims.iter().map(|p| p.size_in_bytes()).collect();
            let expected_aligns: Vec<u32> = prims.iter().map(|p| p.alignment_in_bytes()).collect();

            let s = types.intern_struct(fields);
            let TypeSignature::Struct { fields } = types.get(s).clone() else { panic!("expected struct") };

            let mut prev_end = 0u32;
            for (i, field) in fields.iter().enumerate() {
                prop_assert!(field.offset % expected_aligns[i] == 0 || expected_aligns[i] == 0);
                prop_assert!(field.offset >= prev_end);
                prev_end = field.offset + expected_sizes[i];
            }
            let total_align = expected_aligns.iter().copied().max().unwrap_or(1);
            prop_assert_eq!(types.size_in_bytes(s) % total_align, 0);
            prop_assert!(types.size_in_bytes(s) >= prev_end);
        }
    }
}
