use serde::{Deserialize, Serialize};

use crate::frontend::token::TokenKind;
use crate::lang::symbols::Id;

// =============================================================================
// OPCODE - three-address IR operations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    // arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,

    // comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // bitwise
    BitAnd,
    BitOr,
    BitXor,
    BitNot,

    // logic, always 0 or 1
    LogicalAnd,
    LogicalOr,
    LogicalNot,

    // ==========================================================================
    // Control flow. `result` holds a label id, never a variable id.
    // ==========================================================================
    /// Marks a jump target. Resolved to an offset before execution.
    Label,
    Jmp,
    /// Jump when `arg1` is nonzero.
    JmpTrue,
    /// Jump when `arg1` is zero.
    JmpFalse,

    /// `result = arg1`
    Copy,
    /// Writes `arg1` to the VM's output.
    Print,
    /// Stops the program.
    End,
}

impl Opcode {
    /// Opcode for a binary operator token. `=` is lowered to `Copy` and
    /// has no entry here.
    pub fn for_binary(kind: TokenKind) -> Option<Opcode> {
        let opcode = match kind {
            TokenKind::Plus => Opcode::Add,
            TokenKind::Minus => Opcode::Sub,
            TokenKind::Star => Opcode::Mul,
            TokenKind::Slash => Opcode::Div,
            TokenKind::Percent => Opcode::Mod,
            TokenKind::LShift => Opcode::Shl,
            TokenKind::RShift => Opcode::Shr,
            TokenKind::EqualEqual => Opcode::Eq,
            TokenKind::BangEqual => Opcode::Ne,
            TokenKind::Less => Opcode::Lt,
            TokenKind::LessEqual => Opcode::Le,
            TokenKind::Greater => Opcode::Gt,
            TokenKind::GreaterEqual => Opcode::Ge,
            TokenKind::Ampersand => Opcode::BitAnd,
            TokenKind::Pipe => Opcode::BitOr,
            TokenKind::Caret => Opcode::BitXor,
            TokenKind::AmpersandAmpersand => Opcode::LogicalAnd,
            TokenKind::PipePipe => Opcode::LogicalOr,
            _ => return None,
        };
        Some(opcode)
    }

    pub fn is_jump(self) -> bool {
        matches!(self, Opcode::Jmp | Opcode::JmpTrue | Opcode::JmpFalse)
    }

    /// Upper-case mnemonic used by the IR listing.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Shl => "LSHIFT",
            Opcode::Shr => "RSHIFT",
            Opcode::Eq => "EQ",
            Opcode::Ne => "NE",
            Opcode::Lt => "LT",
            Opcode::Le => "LE",
            Opcode::Gt => "GT",
            Opcode::Ge => "GE",
            Opcode::BitAnd => "BITWISE_AND",
            Opcode::BitOr => "BITWISE_OR",
            Opcode::BitXor => "BITWISE_XOR",
            Opcode::BitNot => "BITWISE_NOT",
            Opcode::LogicalAnd => "LOGICAL_AND",
            Opcode::LogicalOr => "LOGICAL_OR",
            Opcode::LogicalNot => "LOGICAL_NOT",
            Opcode::Label => "LABEL",
            Opcode::Jmp => "JMP",
            Opcode::JmpTrue => "JMP_TRUE",
            Opcode::JmpFalse => "JMP_FALSE",
            Opcode::Copy => "COPY",
            Opcode::Print => "PRINT",
            Opcode::End => "END",
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One fixed-width IR instruction. Unused operand slots hold 0, which is
/// never a valid id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub result: Id,
    pub arg1: Id,
    pub arg2: Id,
}

impl Instruction {
    pub fn new(opcode: Opcode, result: Id, arg1: Id, arg2: Id) -> Self {
        Instruction {
            opcode,
            result,
            arg1,
            arg2,
        }
    }

    pub fn binary(opcode: Opcode, result: Id, arg1: Id, arg2: Id) -> Self {
        Self::new(opcode, result, arg1, arg2)
    }

    pub fn unary(opcode: Opcode, result: Id, arg: Id) -> Self {
        Self::new(opcode, result, arg, 0)
    }

    pub fn label(label: Id) -> Self {
        Self::new(Opcode::Label, label, 0, 0)
    }

    pub fn jump(label: Id) -> Self {
        Self::new(Opcode::Jmp, label, 0, 0)
    }

    /// `JMP_TRUE` or `JMP_FALSE` on `cond`.
    pub fn branch(when: bool, label: Id, cond: Id) -> Self {
        let opcode = if when { Opcode::JmpTrue } else { Opcode::JmpFalse };
        Self::new(opcode, label, cond, 0)
    }

    pub fn copy(dst: Id, src: Id) -> Self {
        Self::new(Opcode::Copy, dst, src, 0)
    }

    pub fn print(var: Id) -> Self {
        Self::new(Opcode::Print, 0, var, 0)
    }

    pub fn end() -> Self {
        Self::new(Opcode::End, 0, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_operator_mapping() {
        assert_eq!(Opcode::for_binary(TokenKind::Plus), Some(Opcode::Add));
        assert_eq!(Opcode::for_binary(TokenKind::LShift), Some(Opcode::Shl));
        assert_eq!(
            Opcode::for_binary(TokenKind::AmpersandAmpersand),
            Some(Opcode::LogicalAnd)
        );
        assert_eq!(Opcode::for_binary(TokenKind::Equal), None);
        assert_eq!(Opcode::for_binary(TokenKind::Bang), None);
    }

    #[test]
    fn test_constructors_zero_unused_slots() {
        assert_eq!(Instruction::label(3), Instruction::new(Opcode::Label, 3, 0, 0));
        assert_eq!(Instruction::copy(1, 2), Instruction::new(Opcode::Copy, 1, 2, 0));
        assert_eq!(Instruction::print(4), Instruction::new(Opcode::Print, 0, 4, 0));
        assert_eq!(
            Instruction::branch(false, 2, 5),
            Instruction::new(Opcode::JmpFalse, 2, 5, 0)
        );
    }

    #[test]
    fn test_jump_classification() {
        assert!(Opcode::Jmp.is_jump());
        assert!(Opcode::JmpTrue.is_jump());
        assert!(!Opcode::Label.is_jump());
        assert!(!Opcode::End.is_jump());
    }
}
