pub mod ast;

use thiserror::Error;

use crate::diagnostics::Diagnostics;
use crate::interpreter::value::Value;
use crate::parser::ast::{Expr, Program, Stmt};
use crate::scanner::token::{Token, TokenType};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Error {}: {message} [{}]", location(.token), .token.line)]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

fn location(token: &Token) -> String {
    if token.token_type == TokenType::Eof {
        "at end".to_string()
    } else {
        format!("at '{}'", token.lexeme)
    }
}

type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    /// `tokens` must end with an `Eof` token, as produced by the scanner.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    // utility methods
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, token_type: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.peek().token_type == token_type
    }

    fn match_any(&mut self, types: &[TokenType]) -> bool {
        for t in types {
            if self.check(t.clone()) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn error_at(token: &Token, message: impl Into<String>) -> ParseError {
        ParseError {
            token: token.clone(),
            message: message.into(),
        }
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> ParseResult<&Token> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(Self::error_at(self.peek(), message))
        }
    }

    /// Parses the whole token sequence. Every error, recovered or not, is
    /// reported to `diagnostics`; the program is only meaningful to run if none were.
    pub fn parse(mut self, diagnostics: &mut Diagnostics) -> Program {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.declaration());
        }

        for error in self.errors {
            diagnostics.report(error);
        }

        Program { statements }
    }

    // The only place a ParseError is caught: record it, skip to a statement
    // boundary, and leave a placeholder so the surrounding list stays intact.
    fn declaration(&mut self) -> Stmt {
        let result = if self.match_any(&[TokenType::Var]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => stmt,
            Err(error) => {
                tracing::trace!(line = error.token.line, "recovering from parse error");
                self.errors.push(error);
                self.synchronize();
                Stmt::Error
            }
        }
    }

    fn synchronize(&mut self) {
        self.advance(); // Skip the token that caused the error

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::Semicolon {
                return;
            }

            match self.peek().token_type {
                TokenType::Class
                | TokenType::Function
                | TokenType::Var
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Return => return,
                _ => {}
            }

            self.advance(); // Keep skipping
        }
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self
            .consume(TokenType::Identifier, "Expect variable name.")?
            .clone();

        let initializer = if self.match_any(&[TokenType::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::Semicolon,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.match_any(&[TokenType::If]) {
            self.if_statement()
        } else if self.match_any(&[TokenType::Print]) {
            self.print_statement()
        } else if self.match_any(&[TokenType::While]) {
            self.while_statement()
        } else if self.match_any(&[TokenType::LeftBrace]) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().lexeme.clone();
        self.consume(
            TokenType::LeftParen,
            &format!("Expect '(' after '{}'.", keyword),
        )?;
        let condition = self.expression()?;
        self.consume(
            TokenType::RightParen,
            &format!("Expect ')' after '{}' condition.", keyword),
        )?;

        let then_branch = Box::new(self.statement()?);
        // a dangling else binds to the nearest if
        let else_branch = if self.match_any(&[TokenType::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        let value = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print { keyword, value })
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().lexeme.clone();
        self.consume(
            TokenType::LeftParen,
            &format!("Expect '(' after '{}'.", keyword),
        )?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expect ')' after 'condition'.")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration());
        }

        self.consume(TokenType::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.logic_or()?;

        if self.match_any(&[TokenType::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment()?; // right-associative

            return match expr {
                Expr::Variable { name } => Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                }),
                // Reported, but the parser is not confused, so no recovery
                other => {
                    self.errors
                        .push(Self::error_at(&equals, "Invalid assignment target."));
                    Ok(other)
                }
            };
        }

        Ok(expr)
    }

    fn logic_or(&mut self) -> ParseResult<Expr> {
        self.logical_expression(TokenType::Or, |p| p.logic_and())
    }

    fn logic_and(&mut self) -> ParseResult<Expr> {
        self.logical_expression(TokenType::And, |p| p.equality())
    }

    fn logical_expression<F>(&mut self, kind: TokenType, mut operand: F) -> ParseResult<Expr>
    where
        F: FnMut(&mut Self) -> ParseResult<Expr>,
    {
        let mut left = operand(self)?;

        while self.match_any(std::slice::from_ref(&kind)) {
            let operator = self.previous().clone();
            let right = operand(self)?;
            left = Expr::Logical {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    // Left-associative loop shared by every binary level. The left operand comes
    // from `left_operand`; each right operand from `right_operand`, which for all
    // levels below equality is `comparison` rather than the next tighter rule.
    fn binary_expression<F, G>(
        &mut self,
        operators: &[TokenType],
        mut left_operand: F,
        mut right_operand: G,
    ) -> ParseResult<Expr>
    where
        F: FnMut(&mut Self) -> ParseResult<Expr>,
        G: FnMut(&mut Self) -> ParseResult<Expr>,
    {
        let mut left = left_operand(self)?;

        while self.match_any(operators) {
            let operator = self.previous().clone();
            let right = right_operand(self)?;
            left = Expr::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.binary_expression(
            &[TokenType::BangEqual, TokenType::EqualEqual],
            |p| p.comparison(),
            |p| p.comparison(),
        )
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.binary_expression(
            &[
                TokenType::Greater,
                TokenType::GreaterEqual,
                TokenType::Less,
                TokenType::LessEqual,
            ],
            |p| p.term(),
            |p| p.comparison(),
        )
    }

    fn term(&mut self) -> ParseResult<Expr> {
        self.binary_expression(
            &[TokenType::Minus, TokenType::Plus],
            |p| p.factor(),
            |p| p.comparison(),
        )
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        self.binary_expression(
            &[TokenType::Slash, TokenType::Star],
            |p| p.unary(),
            |p| p.comparison(),
        )
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.match_any(&[TokenType::Bang, TokenType::Minus]) {
            let operator = self.previous().clone();
            let operand = self.comparison()?;
            return Ok(Expr::Unary {
                operator,
                operand: Box::new(operand),
            });
        }

        self.primary()
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();

        let expr = match &token.token_type {
            TokenType::False => Expr::Literal(false.into()),
            TokenType::True => Expr::Literal(true.into()),
            TokenType::Nil => Expr::Literal(Value::Null),
            TokenType::Number(_) | TokenType::String(_) => {
                Expr::Literal(token.literal().unwrap_or(Value::Null))
            }
            TokenType::Identifier => Expr::Variable {
                name: token.clone(),
            },
            TokenType::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenType::RightParen, "Expect \")\" after expression.")?;
                return Ok(Expr::Grouping(Box::new(expr)));
            }
            _ => return Err(Self::error_at(&token, "Expect expression")),
        };

        self.advance();
        Ok(expr)
    }
}
