use std::io::{self, Write};

use tracing::{debug, instrument, trace};

use crate::bytecode::op::{Instruction, Opcode};
use crate::lang::symbols::{Id, LITERAL_PREFIX, SymbolTable};
use crate::runtime::runtime_error::RuntimeError;

#[derive(Debug, Clone, Default)]
pub struct VmConfig {
    /// Instructions to execute before giving up. `None` runs forever.
    pub max_steps: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Init,
    Running,
    Halted,
}

/// Register-style interpreter for the three-address IR.
///
/// Variables live in a store indexed by variable id; slot 0 is unused.
/// `print` output goes to `W`.
#[derive(Debug)]
pub struct Vm<W: Write = io::Stdout> {
    config: VmConfig,
    state: VmState,
    vars: Vec<i64>,
    /// Instruction offset of each label id, filled before execution.
    labels: Vec<Option<usize>>,
    steps: u64,
    out: W,
}

impl Vm<io::Stdout> {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self::with_output(config, io::stdout())
    }
}

impl Default for Vm<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Vm<W> {
    pub fn with_output(config: VmConfig, out: W) -> Self {
        Self {
            config,
            state: VmState::Init,
            vars: Vec::new(),
            labels: Vec::new(),
            steps: 0,
            out,
        }
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Current value of variable `id`.
    pub fn value(&self, id: Id) -> Option<i64> {
        let slot = usize::try_from(id).ok().filter(|&i| i > 0)?;
        self.vars.get(slot).copied()
    }

    /// Current value of the variable called `name`.
    pub fn value_of(&self, symbols: &SymbolTable, name: &str) -> Option<i64> {
        self.value(symbols.vars.get(name)?.id)
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs `code` until `END`.
    ///
    /// State from an earlier run is discarded first.
    #[instrument(level = "trace", skip_all, fields(instructions = code.len()))]
    pub fn run(&mut self, code: &[Instruction], symbols: &SymbolTable) -> Result<(), RuntimeError> {
        self.state = VmState::Init;
        self.steps = 0;
        self.init_vars(symbols)?;
        self.init_labels(code, symbols)?;

        self.state = VmState::Running;
        self.exec(code)?;
        self.state = VmState::Halted;

        debug!(steps = self.steps, "vm halted");
        Ok(())
    }

    // =========================================================================
    // Init
    // =========================================================================

    /// Pooled literals start out holding their value, everything else 0.
    fn init_vars(&mut self, symbols: &SymbolTable) -> Result<(), RuntimeError> {
        self.vars = vec![0; symbols.vars.len() + 1];

        for name in symbols.vars.iter() {
            let Some(lexeme) = name.name.strip_prefix(LITERAL_PREFIX) else {
                continue;
            };
            let value = lexeme
                .parse::<i64>()
                .map_err(|_| RuntimeError::MalformedLiteral(name.name.clone()))?;
            self.store(name.id, value)?;
        }
        Ok(())
    }

    /// Records the offset of every `LABEL` before the first `END`.
    fn init_labels(&mut self, code: &[Instruction], symbols: &SymbolTable) -> Result<(), RuntimeError> {
        self.labels = vec![None; symbols.labels.len() + 1];

        for (ip, ins) in code.iter().enumerate() {
            match ins.opcode {
                Opcode::End => break,
                Opcode::Label => {
                    let slot = usize::try_from(ins.result)
                        .ok()
                        .filter(|&i| i > 0)
                        .and_then(|i| self.labels.get_mut(i))
                        .ok_or(RuntimeError::UnknownLabel(ins.result))?;
                    slot.get_or_insert(ip);
                }
                _ => {}
            }
        }
        Ok(())
    }

    // =========================================================================
    // Execution
    // =========================================================================

    fn check_limits(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;

        if let Some(max) = self.config.max_steps {
            if self.steps > max {
                return Err(RuntimeError::StepLimitExceeded(max));
            }
        }
        Ok(())
    }

    fn slot(&self, id: Id) -> Result<usize, RuntimeError> {
        usize::try_from(id)
            .ok()
            .filter(|&i| i > 0 && i < self.vars.len())
            .ok_or(RuntimeError::UnknownVariable(id))
    }

    fn load(&self, id: Id) -> Result<i64, RuntimeError> {
        Ok(self.vars[self.slot(id)?])
    }

    fn store(&mut self, id: Id, value: i64) -> Result<(), RuntimeError> {
        let slot = self.slot(id)?;
        self.vars[slot] = value;
        Ok(())
    }

    /// `result = op(arg1, arg2)`
    fn binary(
        &mut self,
        ins: &Instruction,
        op: impl FnOnce(i64, i64) -> Result<i64, RuntimeError>,
    ) -> Result<(), RuntimeError> {
        let a = self.load(ins.arg1)?;
        let b = self.load(ins.arg2)?;
        self.store(ins.result, op(a, b)?)
    }

    fn target(&self, label: Id) -> Result<usize, RuntimeError> {
        usize::try_from(label)
            .ok()
            .and_then(|i| self.labels.get(i).copied().flatten())
            .ok_or(RuntimeError::UnknownLabel(label))
    }

    fn exec(&mut self, code: &[Instruction]) -> Result<(), RuntimeError> {
        let mut ip: usize = 0;

        while let Some(ins) = code.get(ip) {
            self.check_limits()?;
            trace!(ip, opcode = %ins.opcode, "dispatch");

            match ins.opcode {
                Opcode::End => return Ok(()),

                Opcode::Label => {}

                Opcode::Jmp => {
                    ip = self.target(ins.result)?;
                    continue;
                }
                Opcode::JmpTrue | Opcode::JmpFalse => {
                    let truthy = self.load(ins.arg1)? != 0;
                    if truthy == (ins.opcode == Opcode::JmpTrue) {
                        ip = self.target(ins.result)?;
                        continue;
                    }
                }

                Opcode::Copy => {
                    let value = self.load(ins.arg1)?;
                    self.store(ins.result, value)?;
                }

                Opcode::Print => {
                    let value = self.load(ins.arg1)?;
                    writeln!(self.out, "{}", value)?;
                }

                Opcode::LogicalNot => {
                    let a = self.load(ins.arg1)?;
                    self.store(ins.result, i64::from(a == 0))?;
                }
                Opcode::BitNot => {
                    let a = self.load(ins.arg1)?;
                    self.store(ins.result, !a)?;
                }

                // Arithmetic
                Opcode::Add => self.binary(ins, |a, b| Ok(a.wrapping_add(b)))?,
                Opcode::Sub => self.binary(ins, |a, b| Ok(a.wrapping_sub(b)))?,
                Opcode::Mul => self.binary(ins, |a, b| Ok(a.wrapping_mul(b)))?,
                Opcode::Div => self.binary(ins, |a, b| divide(a, b, i64::wrapping_div))?,
                Opcode::Mod => self.binary(ins, |a, b| divide(a, b, i64::wrapping_rem))?,
                // shift amounts are masked to the bit width
                Opcode::Shl => self.binary(ins, |a, b| Ok(a.wrapping_shl(b as u32)))?,
                Opcode::Shr => self.binary(ins, |a, b| Ok(a.wrapping_shr(b as u32)))?,

                // Comparison
                Opcode::Eq => self.binary(ins, |a, b| Ok(i64::from(a == b)))?,
                Opcode::Ne => self.binary(ins, |a, b| Ok(i64::from(a != b)))?,
                Opcode::Lt => self.binary(ins, |a, b| Ok(i64::from(a < b)))?,
                Opcode::Le => self.binary(ins, |a, b| Ok(i64::from(a <= b)))?,
                Opcode::Gt => self.binary(ins, |a, b| Ok(i64::from(a > b)))?,
                Opcode::Ge => self.binary(ins, |a, b| Ok(i64::from(a >= b)))?,

                // Bitwise
                Opcode::BitAnd => self.binary(ins, |a, b| Ok(a & b))?,
                Opcode::BitOr => self.binary(ins, |a, b| Ok(a | b))?,
                Opcode::BitXor => self.binary(ins, |a, b| Ok(a ^ b))?,

                // Logical
                Opcode::LogicalAnd => self.binary(ins, |a, b| Ok(i64::from(a != 0 && b != 0)))?,
                Opcode::LogicalOr => self.binary(ins, |a, b| Ok(i64::from(a != 0 || b != 0)))?,
            }

            ip += 1;
        }

        Err(RuntimeError::MissingEnd)
    }
}

/// Truncating division or remainder. A zero divisor is an error.
fn divide(a: i64, b: i64, op: fn(i64, i64) -> i64) -> Result<i64, RuntimeError> {
    if b == 0 {
        return Err(RuntimeError::DivisionByZero);
    }
    Ok(op(a, b))
}
