use tracing::{debug, instrument, warn};

use crate::bytecode::op::{Instruction, Opcode};
use crate::frontend::token::{Token, TokenKind};
use crate::lang::node::{Block, Node, NodeKind};
use crate::lang::symbols::{Id, LABEL_PREFIX, LITERAL_PREFIX, NOT_FOUND, SymbolTable, TEMP_PREFIX};

/// Lowers an analyzed program to IR, registering temporaries, synthesized
/// labels and pooled literals in `symbols`.
pub fn generate_ir(program: &Node, symbols: &mut SymbolTable) -> Vec<Instruction> {
    IrGenerator::new(symbols).generate(program)
}

/// Three-address code generator.
///
/// Lowering cannot fail on analyzed input. A name that is not in the
/// symbol table lowers to [`NOT_FOUND`], which the VM rejects.
pub struct IrGenerator<'a> {
    symbols: &'a mut SymbolTable,
    /// Last `.TEMP_n` suffix handed out.
    temps: u32,
    /// Last `.LABEL_n` suffix handed out.
    labels: u32,
}

impl<'a> IrGenerator<'a> {
    pub fn new(symbols: &'a mut SymbolTable) -> Self {
        Self {
            symbols,
            temps: 0,
            labels: 0,
        }
    }

    #[instrument(level = "trace", skip_all)]
    pub fn generate(mut self, program: &Node) -> Vec<Instruction> {
        let mut code = Vec::new();
        for stmt in program.statements() {
            self.compile_statement(stmt, &mut code);
        }
        code.push(Instruction::end());

        debug!(
            instructions = code.len(),
            temps = self.temps,
            labels = self.labels,
            "generated ir"
        );
        code
    }

    // =========================================================================
    // Name allocation
    // =========================================================================

    fn new_temp(&mut self) -> Id {
        self.temps += 1;
        let name = format!("{}{}", TEMP_PREFIX, self.temps);
        let int = self.symbols.int_type();
        self.symbols.vars.create(&name, int).id
    }

    fn new_label(&mut self) -> Id {
        self.labels += 1;
        let name = format!("{}{}", LABEL_PREFIX, self.labels);
        self.symbols.labels.create(&name, NOT_FOUND).id
    }

    /// Pooled variable holding the literal `lexeme`. Registered on first use.
    fn literal(&mut self, lexeme: &str) -> Id {
        let name = format!("{}{}", LITERAL_PREFIX, lexeme);
        match self.symbols.vars.check(&name) {
            NOT_FOUND => {
                let int = self.symbols.int_type();
                self.symbols.vars.create(&name, int).id
            }
            id => id,
        }
    }

    fn variable(&self, name: &Token) -> Id {
        let id = self.symbols.vars.check(name.lexeme());
        if id == NOT_FOUND {
            warn!(name = name.lexeme(), "lowering unresolved variable");
        }
        id
    }

    fn label(&self, name: &Token) -> Id {
        let id = self.symbols.labels.check(name.lexeme());
        if id == NOT_FOUND {
            warn!(name = name.lexeme(), "lowering unresolved label");
        }
        id
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn compile_statement(&mut self, stmt: &Node, code: &mut Vec<Instruction>) {
        match &stmt.kind {
            NodeKind::LabelStmt(name) => code.push(Instruction::label(self.label(name))),

            // Without an initializer the VM's zero default applies.
            NodeKind::VarStmt { name, init } => {
                if let Some(init) = init {
                    let value = self.compile_expr(init, code);
                    code.push(Instruction::copy(self.variable(name), value));
                }
            }

            NodeKind::ExprStmt(expr) => {
                self.compile_expr(expr, code);
            }

            NodeKind::PrintStmt(expr) => {
                let value = self.compile_expr(expr, code);
                code.push(Instruction::print(value));
            }

            NodeKind::GotoStmt(name) => code.push(Instruction::jump(self.label(name))),

            NodeKind::IfStmt {
                cond,
                then,
                otherwise,
            } => self.compile_if(cond, then, otherwise.as_ref(), code),

            _ => warn!(node = ?stmt.kind, "skipping non-statement node"),
        }
    }

    fn compile_block(&mut self, block: &Block, code: &mut Vec<Instruction>) {
        for stmt in &block.stmts {
            self.compile_statement(stmt, code);
        }
    }

    fn compile_if(
        &mut self,
        cond: &Node,
        then: &Block,
        otherwise: Option<&Block>,
        code: &mut Vec<Instruction>,
    ) {
        let cond_id = self.compile_expr(cond, code);

        match otherwise {
            None => {
                let end_label = self.new_label();
                code.push(Instruction::branch(false, end_label, cond_id));
                self.compile_block(then, code);
                code.push(Instruction::label(end_label));
            }
            Some(otherwise) => {
                let else_label = self.new_label();
                let end_label = self.new_label();
                code.push(Instruction::branch(false, else_label, cond_id));
                self.compile_block(then, code);
                code.push(Instruction::jump(end_label));
                code.push(Instruction::label(else_label));
                self.compile_block(otherwise, code);
                code.push(Instruction::label(end_label));
            }
        }
    }

    // =========================================================================
    // Expressions: each returns the id of the variable holding its value
    // =========================================================================

    pub fn compile_expr(&mut self, expr: &Node, code: &mut Vec<Instruction>) -> Id {
        match &expr.kind {
            NodeKind::Literal(token) => self.literal(token.lexeme()),
            NodeKind::Identifier(token) => self.variable(token),
            NodeKind::Unary { op, operand } => self.compile_unary(op.kind, operand, code),
            NodeKind::Binary { left, op, right } => self.compile_binary(left, op.kind, right, code),
            NodeKind::Ternary {
                cond,
                then,
                otherwise,
            } => self.compile_ternary(cond, then, otherwise, code),
            _ => {
                warn!(node = ?expr.kind, "lowering non-expression node");
                NOT_FOUND
            }
        }
    }

    fn compile_unary(&mut self, op: TokenKind, operand: &Node, code: &mut Vec<Instruction>) -> Id {
        let value = self.compile_expr(operand, code);

        match op {
            TokenKind::Plus => value,
            TokenKind::Minus => {
                let result = self.new_temp();
                let zero = self.literal("0");
                code.push(Instruction::binary(Opcode::Sub, result, zero, value));
                result
            }
            // Prefix forms: the operand is updated through a temp, and the
            // temp is the expression's value.
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let opcode = if op == TokenKind::PlusPlus {
                    Opcode::Add
                } else {
                    Opcode::Sub
                };
                let result = self.new_temp();
                let one = self.literal("1");
                code.push(Instruction::binary(opcode, result, value, one));
                code.push(Instruction::copy(value, result));
                result
            }
            TokenKind::Bang | TokenKind::Tilde => {
                let opcode = if op == TokenKind::Bang {
                    Opcode::LogicalNot
                } else {
                    Opcode::BitNot
                };
                let result = self.new_temp();
                code.push(Instruction::unary(opcode, result, value));
                result
            }
            _ => {
                warn!(op = %op, "lowering unsupported unary operator");
                NOT_FOUND
            }
        }
    }

    fn compile_binary(
        &mut self,
        left: &Node,
        op: TokenKind,
        right: &Node,
        code: &mut Vec<Instruction>,
    ) -> Id {
        let left_id = self.compile_expr(left, code);
        let right_id = self.compile_expr(right, code);

        if op == TokenKind::Equal {
            code.push(Instruction::copy(left_id, right_id));
            return left_id;
        }

        match Opcode::for_binary(op) {
            Some(opcode) => {
                let result = self.new_temp();
                code.push(Instruction::binary(opcode, result, left_id, right_id));
                result
            }
            None => {
                warn!(op = %op, "lowering unsupported binary operator");
                NOT_FOUND
            }
        }
    }

    /// The false branch is laid out first; only one branch runs.
    fn compile_ternary(
        &mut self,
        cond: &Node,
        then: &Node,
        otherwise: &Node,
        code: &mut Vec<Instruction>,
    ) -> Id {
        let cond_id = self.compile_expr(cond, code);

        let result = self.new_temp();
        let true_label = self.new_label();
        let end_label = self.new_label();

        code.push(Instruction::branch(true, true_label, cond_id));

        let value = self.compile_expr(otherwise, code);
        code.push(Instruction::copy(result, value));
        code.push(Instruction::jump(end_label));

        code.push(Instruction::label(true_label));
        let value = self.compile_expr(then, code);
        code.push(Instruction::copy(result, value));

        code.push(Instruction::label(end_label));
        result
    }
}
