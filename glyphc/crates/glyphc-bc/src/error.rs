//! `GeneratorError` covers the one user-facing failure the bytecode
//! generator can hit — everything else is an internal-invariant violation
//! and asserted unreachable (§7 "GeneratorError — missing `main`,
//! unsupported construct").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("no `main` function defined")]
    MissingMain,
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
