//! Raw memory: the pre-allocated runtime stack, the lazily-sized globals
//! segment, and host-heap bookkeeping for the `malloc`/`free` hardcoded
//! functions (§4.5 "Shared resources": "`malloc`/`free`... use the host
//! heap and are the program's responsibility").

use std::alloc::{alloc, dealloc, Layout};

use glyphc_util::FxHashMap;

/// Default stack size. The original fixes this at a spartan 8KiB for its
/// own test harness; real programs here can recurse and hold locals more
/// freely, so this picks a size generous enough that `STACK_OVERFLOW`
/// triggers only on genuine runaway recursion, not on ordinary nesting.
pub const DEFAULT_STACK_SIZE: usize = 1 << 20;

/// How much headroom a `CALL_FUNCTION`/`CALL_HARDCODED_FUNCTION` must see
/// left above the current stack pointer before it's allowed to proceed
/// (§4.4 "Stack-offset assignment": "the interpreter pre-checks that
/// `max_function_stack_depth` fits in the remaining stack before every
/// call"). One function's worth of headroom at a generous size, since the
/// actual frame size varies per call and isn't known until after the
/// call-overflow check the original performs unconditionally.
pub const MAX_FUNCTION_STACK_DEPTH: usize = 1 << 16;

/// Byte width of the dedicated return-value buffer every `RETURN`/`EXIT`
/// writes into and every `LOAD_RETURN_VALUE`/hardcoded-call return reads
/// from (§4.5 "State").
pub const RETURN_REGISTER_SIZE: usize = 256;

/// Alignment `malloc` hands out, matching a general-purpose host allocator
/// (enough for any primitive this language's type system can produce).
const MALLOC_ALIGN: usize = 8;

/// Host-heap allocations made by the compiled program's own `malloc`
/// calls, keyed by address so `free` can reconstruct the `Layout`
/// `dealloc` requires.
#[derive(Default)]
pub struct Heap {
    allocations: FxHashMap<usize, Layout>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates `size` bytes and returns the address as a raw `u64`
    /// (this language's `*u8`). A non-positive size yields a null pointer,
    /// matching `malloc(0)`'s implementation-defined-but-commonly-null
    /// behavior without depending on it.
    pub fn alloc(&mut self, size: i32) -> u64 {
        if size <= 0 {
            return 0;
        }
        let Ok(layout) = Layout::from_size_align(size as usize, MALLOC_ALIGN) else {
            return 0;
        };
        // SAFETY: `layout` has a non-zero size, checked above.
        let ptr = unsafe { alloc(layout) };
        if ptr.is_null() {
            return 0;
        }
        let address = ptr as usize;
        self.allocations.insert(address, layout);
        address as u64
    }

    /// Frees a pointer previously returned by `alloc`. A null pointer or
    /// an address this heap never allocated (already freed, or a stack
    /// address passed in error by a buggy compiled program) is silently
    /// ignored — matching `free(nullptr)` and avoiding a crash on
    /// double-free in what is, after all, an interpreter for
    /// user-supplied bytecode.
    pub fn free(&mut self, address: u64) {
        if address == 0 {
            return;
        }
        if let Some(layout) = self.allocations.remove(&(address as usize)) {
            // SAFETY: `layout` is exactly what `alloc` returned this address for.
            unsafe { dealloc(address as *mut u8, layout) };
        }
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        for (&address, &layout) in self.allocations.iter() {
            // SAFETY: every entry here is a still-live `alloc` allocation;
            // a compiled program that never calls `free` leaks at the host
            // level exactly as it would under a real `malloc`/`free` pair,
            // but this process is about to exit regardless.
            unsafe { dealloc(address as *mut u8, layout) };
        }
    }
}

/// Reads `len` bytes starting at raw address `address` (a stack address,
/// a global address, or a `Heap::alloc`-returned address — the interpreter
/// doesn't distinguish, matching the original's untyped `void*`).
///
/// # Safety
/// `address` must point at a live allocation of at least `len` readable
/// bytes. Bytecode from `glyphc-bc` only ever produces addresses taken
/// from `LOAD_REGISTER_ADDRESS`/`LOAD_GLOBAL_ADDRESS` or a prior
/// `malloc`, so this holds for any program this interpreter actually
/// generated; it does not hold for adversarially hand-assembled bytecode.
pub unsafe fn read_raw(address: u64, dst: &mut [u8]) {
    std::ptr::copy_nonoverlapping(address as *const u8, dst.as_mut_ptr(), dst.len());
}

/// Writes `src` to raw address `address`. Same safety contract as
/// [`read_raw`].
pub unsafe fn write_raw(address: u64, src: &[u8]) {
    std::ptr::copy_nonoverlapping(src.as_ptr(), address as *mut u8, src.len());
}

/// Copies `len` bytes from `src` to `dst`, both raw addresses. Same safety
/// contract as [`read_raw`]; additionally the original assumes
/// non-overlap, which every `MEMORY_COPY` this interpreter's own generator
/// emits satisfies (source and destination are always distinct
/// allocations).
pub unsafe fn copy_raw(dst: u64, src: u64, len: usize) {
    std::ptr::copy_nonoverlapping(src as *const u8, dst as *mut u8, len);
}
