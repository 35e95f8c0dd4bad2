//! # smol language model
//!
//! The AST produced by the parser, the symbol table shared by the later
//! stages, and the semantic analyzer that connects the two.
//!
//! Variables and labels live in one flat program-wide namespace each; a
//! `var` inside an `if` block is as global as one at the top level.

pub mod analyzer;
pub mod node;
pub mod symbols;
