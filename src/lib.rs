//! Compiler and virtual machine for smol, a small imperative language with
//! integer variables, labels, `goto`, `if`/`else` and `print`.
//!
//! Source text flows through [`frontend::lexer`], [`frontend::parser`],
//! [`lang::analyzer`] and [`bytecode::compile`] into a flat three-address
//! IR that [`runtime::vm`] executes. [`driver`] chains the stages.

pub mod bytecode;
pub mod driver;
pub mod error;
pub mod frontend;
pub mod lang;
pub mod runtime;

pub use error::Error;
