//! The interpreter's halt taxonomy (§4.5 "Exit codes"): `SUCCESS` plus the
//! three conditions the interpreter itself can detect mid-execution.

/// Why execution stopped. `Exited` carries the compiled program's own exit
/// value (decoded from the 256-byte return register); the other three are
/// interpreter-detected faults with no meaningful program-supplied value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    Exited,
    OutOfBounds,
    StackOverflow,
    ReturnValueOverflow,
}

/// Fixed process exit codes for the three fault conditions. `Exited`
/// doesn't use one of these — its process exit code is the decoded return
/// value itself. Not part of the stable opcode/instruction ABI, just this
/// crate's own process-exit convention, so picking distinct unreserved
/// values (anything above the POSIX-conventional 0-2 and 126-165 ranges)
/// is enough.
pub const EXIT_CODE_OUT_OF_BOUNDS: i32 = 101;
pub const EXIT_CODE_STACK_OVERFLOW: i32 = 102;
pub const EXIT_CODE_RETURN_VALUE_OVERFLOW: i32 = 103;

impl HaltReason {
    /// A short, stable name usable in diagnostics; mirrors the original's
    /// `Exit_Code` enumerator spelling.
    pub fn name(self) -> &'static str {
        match self {
            HaltReason::Exited => "SUCCESS",
            HaltReason::OutOfBounds => "OUT_OF_BOUNDS",
            HaltReason::StackOverflow => "STACK_OVERFLOW",
            HaltReason::ReturnValueOverflow => "RETURN_VALUE_OVERFLOW",
        }
    }
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What one interpreter run produced: a process exit code and the reason
/// execution stopped, so a caller can tell a clean `exit(2)` apart from a
/// VM-detected fault that happened to also decode to `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub halt_reason: HaltReason,
}
