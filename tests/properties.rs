use proptest::prelude::*;

use smol::bytecode::op::Opcode;
use smol::driver;
use smol::error::Error;
use smol::frontend::diagnostic::CollectingReporter;
use smol::frontend::lexer::tokenize;
use smol::lang::symbols::LITERAL_PREFIX;
use smol::runtime::runtime_error::RuntimeError;
use smol::runtime::vm::VmConfig;

const BINARY_OPS: &[&str] = &[
    "*", "/", "%", "+", "-", "<<", ">>", "<", "<=", ">", ">=", "==", "!=", "&", "^", "|", "&&",
    "||",
];

#[derive(Debug, Clone)]
enum Expr {
    Lit(i64),
    Unary(char, Box<Expr>),
    Binary(Box<Expr>, &'static str, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Fully parenthesized source text.
    fn render(&self) -> String {
        match self {
            Expr::Lit(v) => v.to_string(),
            Expr::Unary(op, e) => format!("({}{})", op, e.render()),
            Expr::Binary(l, op, r) => format!("({} {} {})", l.render(), op, r.render()),
            Expr::Ternary(c, t, e) => format!("({} ? {} : {})", c.render(), t.render(), e.render()),
        }
    }

    /// Reference semantics: 64-bit wrapping arithmetic, truncating division,
    /// 0/1 booleans. `None` on division by zero.
    fn eval(&self) -> Option<i64> {
        match self {
            Expr::Lit(v) => Some(*v),
            Expr::Unary(op, e) => {
                let v = e.eval()?;
                Some(match op {
                    '-' => 0i64.wrapping_sub(v),
                    '!' => i64::from(v == 0),
                    _ => !v,
                })
            }
            Expr::Binary(l, op, r) => {
                let a = l.eval()?;
                let b = r.eval()?;
                Some(match *op {
                    "*" => a.wrapping_mul(b),
                    "/" | "%" if b == 0 => return None,
                    "/" => a.wrapping_div(b),
                    "%" => a.wrapping_rem(b),
                    "+" => a.wrapping_add(b),
                    "-" => a.wrapping_sub(b),
                    "<<" => a.wrapping_shl(b as u32),
                    ">>" => a.wrapping_shr(b as u32),
                    "<" => i64::from(a < b),
                    "<=" => i64::from(a <= b),
                    ">" => i64::from(a > b),
                    ">=" => i64::from(a >= b),
                    "==" => i64::from(a == b),
                    "!=" => i64::from(a != b),
                    "&" => a & b,
                    "^" => a ^ b,
                    "|" => a | b,
                    "&&" => i64::from(a != 0 && b != 0),
                    _ => i64::from(a != 0 || b != 0),
                })
            }
            Expr::Ternary(c, t, e) => {
                if c.eval()? != 0 {
                    t.eval()
                } else {
                    e.eval()
                }
            }
        }
    }
}

fn expr() -> impl Strategy<Value = Expr> {
    let leaf = (0i64..100).prop_map(Expr::Lit);
    leaf.prop_recursive(5, 48, 3, |inner| {
        prop_oneof![
            (prop::sample::select(vec!['-', '!', '~']), inner.clone())
                .prop_map(|(op, e)| Expr::Unary(op, Box::new(e))),
            (inner.clone(), prop::sample::select(BINARY_OPS), inner.clone())
                .prop_map(|(l, op, r)| Expr::Binary(Box::new(l), op, Box::new(r))),
            (inner.clone(), inner.clone(), inner)
                .prop_map(|(c, t, e)| Expr::Ternary(Box::new(c), Box::new(t), Box::new(e))),
        ]
    })
}

proptest! {
    #[test]
    fn lexing_is_deterministic(source in "[a-z0-9_ \t\n+*/%<>=!&|^~?:;(){}#-]{0,80}") {
        let first = tokenize("p.smol", &source);
        let second = tokenize("p.smol", &source);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => {
                prop_assert_eq!(a.start, b.start);
                prop_assert_eq!(a.message, b.message);
            }
            _ => prop_assert!(false, "runs disagree on {:?}", source),
        }
    }

    #[test]
    fn compile_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..=128)) {
        let source = String::from_utf8_lossy(&bytes).into_owned();
        let mut reporter = CollectingReporter::new();
        let result = driver::compile("p.smol", &source, &mut reporter);
        prop_assert_eq!(reporter.diagnostics.len(), usize::from(result.is_err()));
    }

    #[test]
    fn expressions_match_reference(e in expr()) {
        let source = format!("var x = {};", e.render());
        let mut reporter = CollectingReporter::new();
        let result = driver::run_source(
            "p.smol",
            &source,
            &mut reporter,
            VmConfig::default(),
            Vec::<u8>::new(),
        );

        match (e.eval(), result) {
            (Some(expected), Ok(execution)) => {
                prop_assert_eq!(execution.value_of("x"), Some(expected), "{}", source);
            }
            (None, Err(Error::Runtime(RuntimeError::DivisionByZero))) => {}
            (expected, Err(err)) => {
                prop_assert!(false, "{}: expected {:?}, got error {}", source, expected, err);
            }
            (None, Ok(execution)) => {
                prop_assert!(false, "{}: expected division by zero, got {:?}", source, execution.value_of("x"));
            }
        }
    }

    #[test]
    fn literal_pool_is_idempotent(n in 0u32..1_000_000, copies in 1usize..6) {
        let mut source = String::new();
        for i in 0..copies {
            source.push_str(&format!("var v{} = {};\n", i, n));
        }
        source.push_str(&format!("var w = {} * {};", n, n));

        let mut reporter = CollectingReporter::new();
        let compilation = driver::compile("p.smol", &source, &mut reporter).unwrap();

        let literal = format!("{}{}", LITERAL_PREFIX, n);
        let pooled: Vec<_> = compilation
            .symbols
            .vars
            .iter()
            .filter(|name| name.name.starts_with(LITERAL_PREFIX))
            .collect();
        prop_assert_eq!(pooled.len(), 1);
        prop_assert_eq!(&pooled[0].name, &literal);

        let id = pooled[0].id;
        for ins in &compilation.code {
            match ins.opcode {
                Opcode::Copy if ins.arg1 != id => {
                    // only the final copy from the product temp
                    prop_assert_eq!(ins.result, compilation.symbols.vars.check("w"));
                }
                Opcode::Mul => {
                    prop_assert_eq!(ins.arg1, id);
                    prop_assert_eq!(ins.arg2, id);
                }
                _ => {}
            }
        }
    }
}
