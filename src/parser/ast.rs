use std::fmt;

use crate::interpreter::value::Value;
use crate::scanner::token::Token;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(Expr),
    Print {
        keyword: Token,
        value: Expr,
    },
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    Block(Vec<Stmt>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    /// Stands in for a declaration that was skipped while recovering from a parse error.
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Grouping(Box<Expr>),
    Unary {
        operator: Token,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    // Same shape as Binary, but the right operand is only evaluated on demand
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Variable {
        name: Token,
    },
    Assign {
        name: Token,
        value: Box<Expr>,
    },
}

// Parenthesized prefix form, e.g. `(* (- 1) (group (+ 2 3)))`. Debugging aid only.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Literal(Value::Null) => write!(f, "nil"),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Grouping(inner) => write!(f, "(group {})", inner),
            Expr::Unary { operator, operand } => write!(f, "({} {})", operator.lexeme, operand),
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", operator.lexeme, left, right),
            Expr::Variable { name } => write!(f, "{}", name.lexeme),
            Expr::Assign { name, value } => write!(f, "(= {} {})", name.lexeme, value),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stmt::Expression(expr) => write!(f, "(expr {})", expr),
            Stmt::Print { value, .. } => write!(f, "(print {})", value),
            Stmt::Var {
                name,
                initializer: Some(initializer),
            } => write!(f, "(var {} {})", name.lexeme, initializer),
            Stmt::Var {
                name,
                initializer: None,
            } => write!(f, "(var {})", name.lexeme),
            Stmt::Block(statements) => {
                write!(f, "(block")?;
                for statement in statements {
                    write!(f, " {}", statement)?;
                }
                write!(f, ")")
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => {
                    write!(f, "(if {} {} {})", condition, then_branch, else_branch)
                }
                None => write!(f, "(if {} {})", condition, then_branch),
            },
            Stmt::While { condition, body } => write!(f, "(while {} {})", condition, body),
            Stmt::Error => write!(f, "(error)"),
        }
    }
}
