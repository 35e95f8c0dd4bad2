pub mod compile;
pub mod disasm;
pub mod image;
pub mod op;

pub use op::{Instruction, Opcode};
