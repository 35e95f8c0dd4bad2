use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bytecode::op::Instruction;
use crate::lang::symbols::SymbolTable;

/// Bumped whenever `Image` or anything it contains changes shape.
pub const IMAGE_VERSION: u32 = 1;

/// A compiled program: everything the VM needs to run it without the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub version: u32,
    pub symbols: SymbolTable,
    pub code: Vec<Instruction>,
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("malformed image: {0}")]
    Encoding(#[from] postcard::Error),

    #[error("unsupported image version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

impl Image {
    pub fn new(symbols: SymbolTable, code: Vec<Instruction>) -> Self {
        Image {
            version: IMAGE_VERSION,
            symbols,
            code,
        }
    }
}

pub fn encode(image: &Image) -> Result<Vec<u8>, ImageError> {
    Ok(postcard::to_allocvec(image)?)
}

pub fn decode(bytes: &[u8]) -> Result<Image, ImageError> {
    let image: Image = postcard::from_bytes(bytes)?;
    if image.version != IMAGE_VERSION {
        return Err(ImageError::UnsupportedVersion {
            found: image.version,
            expected: IMAGE_VERSION,
        });
    }
    Ok(image)
}
