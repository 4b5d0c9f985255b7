//! Dispatch for the eleven hardcoded functions (SPEC §4.3). Each one reads
//! its single argument, if it has one, from `argument_start` and writes any
//! result into the interpreter's return register, mirroring
//! `CALL_HARDCODED_FUNCTION` rather than going through a real
//! `CALL`/`RETURN` pair.

use std::io::Write;

use glyphc_sem::hardcoded::HardcodedFunction;

use crate::interpreter::Interpreter;

impl Interpreter<'_> {
    /// `argument_start` is the offset (relative to the current stack
    /// pointer) of the call's single argument, or unused if the function
    /// takes none. Every hardcoded function here takes at most one
    /// parameter, so unlike a real `CALL_FUNCTION` there's no per-argument
    /// layout to fold over — it always sits at `argument_start + 0`.
    pub(crate) fn call_hardcoded(&mut self, function: HardcodedFunction, argument_start: i32) {
        self.return_register = [0u8; crate::memory::RETURN_REGISTER_SIZE];
        match function {
            HardcodedFunction::Malloc => {
                let size = self.read_i32(argument_start);
                let address = self.heap.alloc(size);
                self.return_register[..8].copy_from_slice(&address.to_le_bytes());
            }
            HardcodedFunction::Free => {
                let address = self.read_u64(argument_start);
                self.heap.free(address);
            }
            HardcodedFunction::PrintI32 => {
                print!("{}", self.read_i32(argument_start));
                let _ = std::io::stdout().flush();
            }
            HardcodedFunction::PrintF32 => {
                print!("{:.2}", self.read_f32(argument_start));
                let _ = std::io::stdout().flush();
            }
            HardcodedFunction::PrintBool => {
                print!("{}", if self.read_bool(argument_start) { "TRUE" } else { "FALSE" });
                let _ = std::io::stdout().flush();
            }
            HardcodedFunction::PrintString => {
                let address = self.read_u64(argument_start);
                let length = self.read_u32(argument_start + 8) as usize;
                let mut bytes = vec![0u8; length];
                // SAFETY: `address`/`length` describe a `[]u8` slice this
                // program built from `LOAD_REGISTER_ADDRESS`/
                // `LOAD_GLOBAL_ADDRESS`/`malloc`, per this crate's raw
                // memory contract.
                unsafe { crate::memory::read_raw(address, &mut bytes) };
                print!("{}", String::from_utf8_lossy(&bytes));
                let _ = std::io::stdout().flush();
            }
            HardcodedFunction::PrintLine => {
                println!();
            }
            HardcodedFunction::ReadI32 => {
                print!("Please input an i32: ");
                let _ = std::io::stdout().flush();
                let value: i32 = read_line_and_parse().unwrap_or(0);
                self.return_register[..4].copy_from_slice(&value.to_le_bytes());
            }
            HardcodedFunction::ReadF32 => {
                print!("Please input an f32: ");
                let _ = std::io::stdout().flush();
                let value: f32 = read_line_and_parse().unwrap_or(0.0);
                self.return_register[..4].copy_from_slice(&value.to_le_bytes());
            }
            HardcodedFunction::ReadBool => {
                print!("Please input an bool (As int): ");
                let _ = std::io::stdout().flush();
                let value: i32 = read_line_and_parse().unwrap_or(0);
                self.return_register[0] = if value == 0 { 0 } else { 1 };
            }
            HardcodedFunction::RandomI32 => {
                let value: i32 = rand::random();
                self.return_register[..4].copy_from_slice(&value.to_le_bytes());
            }
        }
    }
}

/// Reads one line from stdin and parses it as `T`, returning `None` on any
/// I/O or parse failure so the caller can fall back to a zero value —
/// matching the original's `cin >> num; if (cin.fail()) num = 0;` behavior
/// without needing iostream's sticky failure-state handling.
fn read_line_and_parse<T: std::str::FromStr>() -> Option<T> {
    let mut line = String::new();
    std::io::stdin().read_line(&mut line).ok()?;
    line.trim().parse().ok()
}
