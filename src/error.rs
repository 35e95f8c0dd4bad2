use thiserror::Error;

use crate::bytecode::image::ImageError;
use crate::frontend::diagnostic::Diagnostic;
use crate::runtime::runtime_error::RuntimeError;

/// Any failure of a compile-and-run chain.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Compile(#[from] Diagnostic),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
