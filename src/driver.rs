use std::io::Write;

use tracing::{debug, instrument};

use crate::bytecode::compile::generate_ir;
use crate::bytecode::image::Image;
use crate::bytecode::op::Instruction;
use crate::error::Error;
use crate::frontend::diagnostic::{Diagnostic, Reporter};
use crate::frontend::lexer::tokenize;
use crate::frontend::parser::parse;
use crate::frontend::token::Token;
use crate::lang::analyzer::analyze;
use crate::lang::node::Node;
use crate::lang::symbols::SymbolTable;
use crate::runtime::vm::{Vm, VmConfig};

/// Every artifact of a successful compilation.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub tokens: Vec<Token>,
    /// The analyzed AST, expressions annotated with type ids.
    pub program: Node,
    pub symbols: SymbolTable,
    pub code: Vec<Instruction>,
}

impl Compilation {
    pub fn image(&self) -> Image {
        Image::new(self.symbols.clone(), self.code.clone())
    }
}

/// A finished run together with what was run.
pub struct Execution<W: Write> {
    pub compilation: Compilation,
    pub vm: Vm<W>,
}

impl<W: Write> Execution<W> {
    /// Final value of the variable called `name`.
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.vm.value_of(&self.compilation.symbols, name)
    }
}

/// Lexes, parses, analyzes and lowers `source`.
///
/// The first failing stage reports its diagnostic to `reporter` and
/// nothing after it runs.
#[instrument(level = "trace", skip_all, fields(path = path))]
pub fn compile(
    path: &str,
    source: &str,
    reporter: &mut dyn Reporter,
) -> Result<Compilation, Diagnostic> {
    compile_quiet(path, source).inspect_err(|diagnostic| reporter.report(diagnostic))
}

fn compile_quiet(path: &str, source: &str) -> Result<Compilation, Diagnostic> {
    let tokens = tokenize(path, source)?;
    let mut program = parse(tokens.clone())?;
    let mut symbols = analyze(&mut program)?;
    let code = generate_ir(&program, &mut symbols);

    debug!(
        tokens = tokens.len(),
        statements = program.statements().len(),
        variables = symbols.vars.len(),
        instructions = code.len(),
        "compiled"
    );

    Ok(Compilation {
        tokens,
        program,
        symbols,
        code,
    })
}

/// Compiles `source` and runs it, writing `print` output to `out`.
pub fn run_source<W: Write>(
    path: &str,
    source: &str,
    reporter: &mut dyn Reporter,
    config: VmConfig,
    out: W,
) -> Result<Execution<W>, Error> {
    let compilation = compile(path, source, reporter)?;
    let mut vm = Vm::with_output(config, out);
    vm.run(&compilation.code, &compilation.symbols)?;
    Ok(Execution { compilation, vm })
}

/// Runs a previously compiled image.
pub fn run_image<W: Write>(image: &Image, config: VmConfig, out: W) -> Result<Vm<W>, Error> {
    let mut vm = Vm::with_output(config, out);
    vm.run(&image.code, &image.symbols)?;
    Ok(vm)
}
