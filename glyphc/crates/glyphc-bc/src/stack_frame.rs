//! Stack-offset assignment (§4.4 "Stack-offset assignment" / §4.5
//! "Hardcoded-function ABI"): per function, a running cursor bumped to the
//! next multiple of each slot's alignment, the slot placed, the cursor
//! advanced by the slot's size. The high-water mark becomes
//! `max_stack_size`.

use glyphc_ir::{IrFunction, RegisterId};
use glyphc_sem::types::TypeInterner;
use glyphc_util::IndexVec;

pub fn align_up(offset: u32, align: u32) -> u32 {
    if align <= 1 {
        return offset;
    }
    (offset + align - 1) / align * align
}

/// Where one function's registers live relative to its frame's base
/// (offset 0 = the first argument byte). `frame_header_offset` is where
/// the 16-byte return-address-plus-saved-base-pointer header begins,
/// consulted by `RETURN` to find it again. A *caller*'s `CALL_FUNCTION`
/// `frame_offset` operand is a different quantity — see
/// `generator::emit_call` — but the two are both 8-aligned byte offsets
/// computed the same way, so they compose without a conversion step.
pub struct FrameLayout {
    pub register_offsets: IndexVec<RegisterId, u32>,
    pub frame_header_offset: u32,
    pub max_stack_size: u32,
}

impl FrameLayout {
    pub fn offset_of(&self, reg: RegisterId) -> u32 {
        self.register_offsets[reg]
    }

    /// First byte past the frame header, where locals/temporaries begin.
    pub fn locals_start(&self) -> u32 {
        self.frame_header_offset + FRAME_HEADER_SIZE
    }
}

/// Return address (8 bytes) + saved base pointer (8 bytes).
pub const FRAME_HEADER_SIZE: u32 = 16;

/// Lays out one function's parameters, then the frame header, then its
/// locals/temporaries, in register-id order (parameters are always
/// registers `0..params.len()` by construction in `glyphc-ir`'s builder).
pub fn assign_offsets(func: &IrFunction, types: &TypeInterner) -> FrameLayout {
    let mut register_offsets: IndexVec<RegisterId, u32> = IndexVec::with_capacity(func.registers.len());
    let mut cursor = 0u32;

    for info in func.registers.as_slice().iter().take(func.params.len()) {
        let align = types.alignment_in_bytes(info.type_id);
        let size = types.size_in_bytes(info.type_id);
        cursor = align_up(cursor, align);
        register_offsets.push(cursor);
        cursor += size;
    }

    // Matches the hardcoded-function ABI fold exactly: align the running
    // argument-area cursor to 8 once all arguments are placed.
    cursor = align_up(cursor, 8);
    let frame_header_offset = cursor;
    cursor += FRAME_HEADER_SIZE;

    let mut max_stack_size = cursor;
    for info in func.registers.as_slice().iter().skip(func.params.len()) {
        let align = types.alignment_in_bytes(info.type_id);
        let size = types.size_in_bytes(info.type_id);
        cursor = align_up(cursor, align);
        register_offsets.push(cursor);
        cursor += size;
        max_stack_size = max_stack_size.max(cursor);
    }

    FrameLayout { register_offsets, frame_header_offset, max_stack_size }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_next_multiple() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(9, 8), 16);
        assert_eq!(align_up(4, 1), 4);
    }
}
