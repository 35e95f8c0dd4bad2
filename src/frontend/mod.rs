pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod token;
pub mod token_dumper;
