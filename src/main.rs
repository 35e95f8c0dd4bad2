use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use smol::bytecode::disasm::print_ir;
use smol::bytecode::image;
use smol::driver::{self, Compilation};
use smol::error::Error;
use smol::frontend::diagnostic::{Diagnostic, Reporter};
use smol::frontend::lexer::tokenize;
use smol::frontend::parser::parse;
use smol::frontend::token_dumper::TokenDumper;
use smol::lang::node::{Block, Node, NodeKind};
use smol::runtime::vm::{Vm, VmConfig};

const TAB_WIDTH: usize = 8;

#[derive(Parser)]
#[command(name = "smol", version, about = "Compile and run smol programs")]
struct Cli {
    /// Source file to run, or `-` to read stdin
    file: String,

    /// Print the tokens and stop
    #[arg(long)]
    tokens: bool,

    /// Disable colors in the token dump
    #[arg(long)]
    no_color: bool,

    /// Show end positions and byte ranges in the token dump
    #[arg(long)]
    spans: bool,

    /// Print the syntax tree and stop
    #[arg(long)]
    ast: bool,

    /// Print the IR and stop
    #[arg(long)]
    ir: bool,

    /// Write the compiled image to this path instead of running
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Treat FILE as a compiled image and run it
    #[arg(long)]
    image: bool,

    /// Abort after executing this many instructions
    #[arg(long)]
    max_steps: Option<u64>,

    /// Log compiler stages to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        // already rendered by the reporter
        Err(Error::Compile(_)) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SMOL_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> Result<(), Error> {
    let config = VmConfig {
        max_steps: cli.max_steps,
    };

    if cli.image {
        let bytes = fs::read(&cli.file)?;
        let image = image::decode(&bytes)?;
        debug!(instructions = image.code.len(), "loaded image");
        driver::run_image(&image, config, io::stdout())?;
        return Ok(());
    }

    let (path, source) = read_source(&cli.file)?;
    let mut reporter = StderrReporter;

    if cli.tokens {
        let tokens = tokenize(&path, &source).inspect_err(|d| reporter.report(d))?;
        let mut dumper = TokenDumper::new();
        if cli.no_color {
            dumper = dumper.no_color();
        }
        if cli.spans {
            dumper = dumper.spans();
        }
        dumper.dump(&tokens);
        return Ok(());
    }

    if cli.ast {
        let tokens = tokenize(&path, &source).inspect_err(|d| reporter.report(d))?;
        let program = parse(tokens).inspect_err(|d| reporter.report(d))?;
        print_node(&program, 0);
        return Ok(());
    }

    let Compilation { symbols, code, .. } = driver::compile(&path, &source, &mut reporter)?;

    if cli.ir {
        print_ir(&code, &symbols);
        return Ok(());
    }

    if let Some(output) = &cli.output {
        let bytes = image::encode(&image::Image::new(symbols, code))?;
        fs::write(output, &bytes)?;
        debug!(path = %output.display(), bytes = bytes.len(), "wrote image");
        return Ok(());
    }

    let mut vm = Vm::with_config(config);
    vm.run(&code, &symbols)?;
    Ok(())
}

fn read_source(file: &str) -> Result<(String, String), Error> {
    if file == "-" {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        Ok(("<stdin>".to_string(), source))
    } else {
        Ok((file.to_string(), fs::read_to_string(file)?))
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Prints the diagnostic header and the first line of its span with a caret
/// underline.
struct StderrReporter;

impl Reporter for StderrReporter {
    fn report(&mut self, d: &Diagnostic) {
        eprintln!(
            "{}:{}:{}: {}: {}",
            d.file.path(),
            d.start.line,
            d.start.column,
            d.kind,
            d.message
        );

        let Some(line) = d.file.text().lines().nth(d.start.line.saturating_sub(1)) else {
            return;
        };

        let last_column = if d.end.line == d.start.line {
            d.end.column.max(d.start.column + 1)
        } else {
            line.chars().count() + 1
        };

        let mut text = String::new();
        let mut underline = String::new();
        for (i, ch) in line.chars().enumerate() {
            let column = i + 1;
            let width = if ch == '\t' {
                TAB_WIDTH - text.chars().count() % TAB_WIDTH
            } else {
                1
            };
            let mark = if column >= d.start.column && column < last_column {
                '^'
            } else {
                ' '
            };
            for _ in 0..width {
                text.push(if ch == '\t' { ' ' } else { ch });
                underline.push(mark);
            }
        }
        // spans that start at end of line, like a missing ';'
        if d.start.column > line.chars().count() {
            underline.push('^');
        }

        eprintln!("  {}", text);
        eprintln!("  {}", underline.trim_end());
    }
}

// =============================================================================
// AST dump
// =============================================================================

fn print_node(node: &Node, depth: usize) {
    let pad = "  ".repeat(depth);

    match &node.kind {
        NodeKind::Literal(t) => println!("{}Literal {}", pad, t.lexeme()),
        NodeKind::Identifier(t) => println!("{}Identifier {}", pad, t.lexeme()),
        NodeKind::Unary { op, operand } => {
            println!("{}Unary {}", pad, op.kind);
            print_node(operand, depth + 1);
        }
        NodeKind::Binary { left, op, right } => {
            println!("{}Binary {}", pad, op.kind);
            print_node(left, depth + 1);
            print_node(right, depth + 1);
        }
        NodeKind::Ternary {
            cond,
            then,
            otherwise,
        } => {
            println!("{}Ternary", pad);
            print_node(cond, depth + 1);
            print_node(then, depth + 1);
            print_node(otherwise, depth + 1);
        }
        NodeKind::ExprStmt(expr) => {
            println!("{}ExprStmt", pad);
            print_node(expr, depth + 1);
        }
        NodeKind::LabelStmt(name) => println!("{}LabelStmt {}", pad, name.lexeme()),
        NodeKind::VarStmt { name, init } => {
            println!("{}VarStmt {}", pad, name.lexeme());
            if let Some(init) = init {
                print_node(init, depth + 1);
            }
        }
        NodeKind::PrintStmt(expr) => {
            println!("{}PrintStmt", pad);
            print_node(expr, depth + 1);
        }
        NodeKind::GotoStmt(label) => println!("{}GotoStmt {}", pad, label.lexeme()),
        NodeKind::IfStmt {
            cond,
            then,
            otherwise,
        } => {
            println!("{}IfStmt", pad);
            print_node(cond, depth + 1);
            print_block("then", then, depth + 1);
            if let Some(block) = otherwise {
                print_block("else", block, depth + 1);
            }
        }
        NodeKind::Program(stmts) => {
            println!("{}Program", pad);
            for stmt in stmts {
                print_node(stmt, depth + 1);
            }
        }
    }
}

fn print_block(name: &str, block: &Block, depth: usize) {
    println!("{}{}", "  ".repeat(depth), name);
    for stmt in &block.stmts {
        print_node(stmt, depth + 1);
    }
}
