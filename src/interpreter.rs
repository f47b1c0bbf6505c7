pub mod environment;
pub mod value;

use std::io::{self, Stdout, Write};
use std::rc::Rc;

use thiserror::Error;

use crate::interpreter::environment::Environment;
use crate::interpreter::value::Value;
use crate::parser::ast::{Expr, Program, Stmt};
use crate::scanner::token::{Token, TokenType};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} [{}]", .token.line)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    fn new(token: &Token, message: impl Into<String>) -> Self {
        Self {
            token: token.clone(),
            message: message.into(),
        }
    }
}

type EvalResult<T = Value> = Result<T, RuntimeError>;

/// Executes programs against a global scope that outlives each `interpret`
/// call, so consecutive programs (e.g. REPL lines) see each other's variables.
/// Print output goes to `W`.
pub struct Interpreter<W: Write = Stdout> {
    globals: Rc<Environment>,
    out: W,
}

impl Interpreter<Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(out: W) -> Self {
        Self {
            globals: Rc::new(Environment::new()),
            out,
        }
    }

    pub fn globals(&self) -> &Rc<Environment> {
        &self.globals
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs every statement in order. The first runtime error stops the whole
    /// program; output already written is kept.
    #[tracing::instrument(level = "debug", skip_all, fields(statements = program.statements.len()))]
    pub fn interpret(&mut self, program: &Program) -> EvalResult<()> {
        let globals = Rc::clone(&self.globals);
        for statement in &program.statements {
            self.execute(statement, &globals)?;
        }
        self.out.flush().map_err(|e| {
            // nothing to anchor a flush failure to but the end of input
            RuntimeError::new(&Token::new(TokenType::Eof, "", 0), e.to_string())
        })?;
        Ok(())
    }

    fn execute(&mut self, statement: &Stmt, env: &Rc<Environment>) -> EvalResult<()> {
        match statement {
            Stmt::Expression(expr) => {
                self.evaluate(expr, env)?;
            }
            Stmt::Print { keyword, value } => {
                let value = self.evaluate(value, env)?;
                writeln!(self.out, "{}", value)
                    .map_err(|e| RuntimeError::new(keyword, e.to_string()))?;
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(initializer) => self.evaluate(initializer, env)?,
                    None => Value::Null,
                };
                env.define(name.lexeme.clone(), value);
            }
            Stmt::Block(statements) => {
                self.execute_block(statements, env)?;
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    self.execute(then_branch, env)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch, env)?;
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition, env)?.is_truthy() {
                    self.execute(body, env)?;
                }
            }
            // Never produced by a parse that reported no errors
            Stmt::Error => {}
        }
        Ok(())
    }

    // The child scope only lives for this call, so the caller's scope is the
    // active one again however the block is left.
    fn execute_block(&mut self, statements: &[Stmt], env: &Rc<Environment>) -> EvalResult<()> {
        let scope = Rc::new(Environment::new_with_enclosing(Rc::clone(env)));
        tracing::trace!(statements = statements.len(), "entering block scope");
        for statement in statements {
            self.execute(statement, &scope)?;
        }
        Ok(())
    }

    fn evaluate(&self, expression: &Expr, env: &Rc<Environment>) -> EvalResult {
        match expression {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Grouping(inner) => self.evaluate(inner, env),
            Expr::Variable { name } => env.get(name),
            Expr::Assign { name, value } => {
                let value = self.evaluate(value, env)?;
                env.assign(name, value.clone())?;
                Ok(value)
            }
            Expr::Unary { operator, operand } => {
                let operand = self.evaluate(operand, env)?;
                match (&operator.token_type, operand) {
                    (TokenType::Bang, v) => Ok(Value::Bool(!v.is_truthy())),
                    (TokenType::Minus, Value::Num(n)) => Ok(Value::Num(-n)),
                    (TokenType::Minus, _) => {
                        Err(RuntimeError::new(operator, "Operand must be a number"))
                    }
                    (_, _) => Err(unsupported_operator(operator)),
                }
            }
            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left, env)?;
                // handle the short-circuit
                let decided = match operator.token_type {
                    TokenType::Or => left.is_truthy(),
                    TokenType::And => !left.is_truthy(),
                    _ => return Err(unsupported_operator(operator)),
                };
                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right, env)
                }
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;
                binary(operator, left, right)
            }
        }
    }
}

fn binary(operator: &Token, left: Value, right: Value) -> EvalResult {
    match (&operator.token_type, left, right) {
        // arithmetic
        (TokenType::Plus, Value::Num(n1), Value::Num(n2)) => Ok(Value::Num(n1 + n2)),
        (TokenType::Plus, Value::Str(s1), Value::Str(s2)) => {
            let mut s = String::with_capacity(s1.len() + s2.len());
            s.push_str(&s1);
            s.push_str(&s2);
            Ok(Value::from(s))
        }
        (TokenType::Plus, _, _) => Err(RuntimeError::new(
            operator,
            "Operands must be two numbers or two strings.",
        )),
        (TokenType::Minus, Value::Num(n1), Value::Num(n2)) => Ok(Value::Num(n1 - n2)),
        (TokenType::Star, Value::Num(n1), Value::Num(n2)) => Ok(Value::Num(n1 * n2)),
        // IEEE semantics: dividing by zero gives an infinity or NaN
        (TokenType::Slash, Value::Num(n1), Value::Num(n2)) => Ok(Value::Num(n1 / n2)),

        // comparison
        (TokenType::Greater, Value::Num(n1), Value::Num(n2)) => Ok(Value::Bool(n1 > n2)),
        (TokenType::GreaterEqual, Value::Num(n1), Value::Num(n2)) => Ok(Value::Bool(n1 >= n2)),
        (TokenType::Less, Value::Num(n1), Value::Num(n2)) => Ok(Value::Bool(n1 < n2)),
        (TokenType::LessEqual, Value::Num(n1), Value::Num(n2)) => Ok(Value::Bool(n1 <= n2)),
        (
            TokenType::Minus
            | TokenType::Star
            | TokenType::Slash
            | TokenType::Greater
            | TokenType::GreaterEqual
            | TokenType::Less
            | TokenType::LessEqual,
            _,
            _,
        ) => Err(RuntimeError::new(operator, "Operands must be number")),

        // equality
        (TokenType::EqualEqual, v1, v2) => Ok(Value::Bool(v1 == v2)),
        (TokenType::BangEqual, v1, v2) => Ok(Value::Bool(v1 != v2)),

        (_, _, _) => Err(unsupported_operator(operator)),
    }
}

fn unsupported_operator(operator: &Token) -> RuntimeError {
    RuntimeError::new(
        operator,
        format!("Unsupported operator '{}'.", operator.lexeme),
    )
}
