use std::collections::HashSet;
use std::fmt::Write;

use crate::bytecode::op::{Instruction, Opcode};
use crate::lang::symbols::{Id, SymbolTable};

/// Print the IR listing of a compiled program to stdout.
pub fn print_ir(code: &[Instruction], symbols: &SymbolTable) {
    print!("{}", disassemble(code, symbols));
}

/// Render `code` one instruction per line, resolving ids to names.
///
/// Labels that some jump targets are marked with `►`.
pub fn disassemble(code: &[Instruction], symbols: &SymbolTable) -> String {
    let targets = collect_jump_targets(code);
    let mut out = String::new();

    let _ = writeln!(out, "=== IR ({} instructions) ===", code.len());

    for (ip, ins) in code.iter().enumerate() {
        let marker = if ins.opcode == Opcode::Label && targets.contains(&ins.result) {
            "► "
        } else {
            "  "
        };
        let _ = writeln!(out, "{:04} {}{}", ip, marker, format_instruction(ins, symbols));
    }

    out
}

fn collect_jump_targets(code: &[Instruction]) -> HashSet<Id> {
    code.iter()
        .filter(|ins| ins.opcode.is_jump())
        .map(|ins| ins.result)
        .collect()
}

fn var(symbols: &SymbolTable, id: Id) -> String {
    match symbols.variable_name(id) {
        Some(name) => format!("{}[{}]", name, id),
        None => format!("?[{}]", id),
    }
}

fn label(symbols: &SymbolTable, id: Id) -> String {
    match symbols.label_name(id) {
        Some(name) => format!("{}[{}]", name, id),
        None => format!("?[{}]", id),
    }
}

pub fn format_instruction(ins: &Instruction, symbols: &SymbolTable) -> String {
    let op = ins.opcode.mnemonic();

    match ins.opcode {
        Opcode::End => op.to_string(),

        Opcode::Label | Opcode::Jmp => format!("{:<12} {}", op, label(symbols, ins.result)),

        Opcode::JmpTrue | Opcode::JmpFalse => format!(
            "{:<12} {}, {}",
            op,
            label(symbols, ins.result),
            var(symbols, ins.arg1)
        ),

        Opcode::Print => format!("{:<12} {}", op, var(symbols, ins.arg1)),

        Opcode::Copy | Opcode::LogicalNot | Opcode::BitNot => format!(
            "{:<12} {}, {}",
            op,
            var(symbols, ins.result),
            var(symbols, ins.arg1)
        ),

        _ => format!(
            "{:<12} {}, {}, {}",
            op,
            var(symbols, ins.result),
            var(symbols, ins.arg1),
            var(symbols, ins.arg2)
        ),
    }
}
