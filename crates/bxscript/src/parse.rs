//! Recursive-descent parser.
//!
//! Statements dispatch on their first token; expressions use a layered
//! precedence climb from sequence down to primary. The parser keeps a stack
//! of context frames recording whether it is inside a function body or a
//! loop, which is what makes `return` outside a function and
//! `break`/`continue` outside a loop syntax errors rather than runtime ones.
//!
//! All errors are fatal for the compilation unit and carry line, column and
//! the offending lexeme.

use std::rc::Rc;

use crate::{
    ast::{AssignOp, BinaryOp, Expr, FunctionDef, Import, Program, Stmt, UnaryOp},
    exception::CompileError,
    lexer::{Lexer, Token, TokenKind},
};

/// Maximum expression nesting before the parser gives up. Prevents deeply
/// nested inputs like `((((...))))` from overflowing the host stack.
const MAX_NESTING_DEPTH: u32 = 200;

/// One entry of the parse-context stack.
///
/// A loop frame inherits `in_function` from its parent so `return` stays
/// legal inside a loop inside a function; a function frame resets `in_loop`
/// so `break` cannot cross a function boundary.
#[derive(Debug, Clone, Copy, Default)]
struct Frame {
    in_function: bool,
    in_loop: bool,
}

pub(crate) struct Parser {
    lexer: Lexer,
    pushback: Vec<Token>,
    frames: Vec<Frame>,
    imports: Vec<Import>,
    depth: u32,
}

/// Parses a complete compilation unit.
pub(crate) fn parse(source: &str) -> Result<Program, CompileError> {
    Parser::new(source).parse_program()
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            lexer: Lexer::new(source),
            pushback: Vec::new(),
            frames: vec![Frame::default()],
            imports: Vec::new(),
            depth: 0,
        }
    }

    fn next_token(&mut self) -> Result<Token, CompileError> {
        if let Some(token) = self.pushback.pop() {
            return Ok(token);
        }
        self.lexer.next_token()
    }

    fn back_token(&mut self, token: Token) {
        self.pushback.push(token);
    }

    fn peek(&mut self) -> Result<Token, CompileError> {
        let token = self.next_token()?;
        self.back_token(token.clone());
        Ok(token)
    }

    fn frame(&self) -> Frame {
        *self.frames.last().expect("parser frame stack is never empty")
    }

    fn error<T>(&self, token: &Token, message: impl Into<String>) -> Result<T, CompileError> {
        Err(CompileError::parse(
            message,
            token.line,
            token.column,
            Some(token.lexeme.clone()),
        ))
    }

    /// Consumes the next token and checks it is the expected symbol.
    fn expect_symbol(&mut self, sym: &str) -> Result<(), CompileError> {
        let token = self.next_token()?;
        if token.is_symbol(sym) {
            Ok(())
        } else {
            self.error(&token, format!("expected '{sym}'"))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, CompileError> {
        let token = self.next_token()?;
        if token.kind == TokenKind::Identifier {
            Ok(token.lexeme)
        } else {
            self.error(&token, "expected an identifier")
        }
    }

    /// Consumes an optional statement terminator.
    fn semicolon(&mut self) -> Result<(), CompileError> {
        let token = self.next_token()?;
        if !token.is_symbol(";") && !token.is_eof() {
            self.back_token(token);
        }
        Ok(())
    }

    // ----- statements -----

    fn parse_program(mut self) -> Result<Program, CompileError> {
        let mut body = Vec::new();
        loop {
            let token = self.next_token()?;
            if token.is_eof() {
                break;
            }
            self.back_token(token);
            if let Some(stmt) = self.parse_statement()? {
                body.push(stmt);
            }
        }
        Ok(Program {
            imports: self.imports,
            body,
        })
    }

    /// Parses one statement. Imports return `None`: they are collected on the
    /// program, not interleaved with the body.
    fn parse_statement(&mut self) -> Result<Option<Stmt>, CompileError> {
        let token = self.peek()?;
        if token.is_symbol("{") {
            return self.parse_block().map(Some);
        }
        if token.kind == TokenKind::Keyword {
            match token.lexeme.as_str() {
                "if" => return self.parse_if().map(Some),
                "for" => return self.parse_for_or_for_in().map(Some),
                "while" => return self.parse_while().map(Some),
                "let" => return self.parse_variable_statement().map(Some),
                "function" => return self.parse_function_statement().map(Some),
                "throw" => return self.parse_throw().map(Some),
                "try" => return self.parse_try().map(Some),
                "return" => return self.parse_return().map(Some),
                "break" => return self.parse_break().map(Some),
                "continue" => return self.parse_continue().map(Some),
                "import" => {
                    self.parse_import()?;
                    return Ok(None);
                }
                _ => {}
            }
        }
        let expr = self.parse_expression()?;
        self.semicolon()?;
        Ok(Some(Stmt::Expr(expr)))
    }

    fn parse_block(&mut self) -> Result<Stmt, CompileError> {
        self.expect_symbol("{")?;
        let mut statements = Vec::new();
        loop {
            let token = self.next_token()?;
            if token.is_symbol("}") {
                break;
            }
            if token.is_eof() {
                return self.error(&token, "unterminated block, expected '}'");
            }
            self.back_token(token);
            if let Some(stmt) = self.parse_statement()? {
                statements.push(stmt);
            }
        }
        Ok(Stmt::Block(statements))
    }

    fn parse_if(&mut self) -> Result<Stmt, CompileError> {
        self.next_token()?; // if
        self.expect_symbol("(")?;
        let test = self.parse_expression()?;
        self.expect_symbol(")")?;
        let token = self.peek()?;
        if !token.is_symbol("{") {
            return self.error(&token, "if branch must be a block");
        }
        let then = Box::new(self.parse_block()?);
        let token = self.next_token()?;
        let otherwise = if token.is_keyword("else") {
            let next = self.peek()?;
            if next.is_keyword("if") {
                Some(Box::new(self.parse_if()?))
            } else if next.is_symbol("{") {
                Some(Box::new(self.parse_block()?))
            } else {
                return self.error(&next, "else must be followed by a block or 'if'");
            }
        } else {
            self.back_token(token);
            None
        };
        Ok(Stmt::If { test, then, otherwise })
    }

    fn push_loop_frame(&mut self) {
        let current = self.frame();
        self.frames.push(Frame {
            in_function: current.in_function,
            in_loop: true,
        });
    }

    fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// `for (init; test; update) body` or `for (let v in source) body`. The
    /// two share a head, so disambiguation happens after the first clause.
    fn parse_for_or_for_in(&mut self) -> Result<Stmt, CompileError> {
        self.push_loop_frame();
        let result = self.parse_for_inner();
        self.pop_frame();
        result
    }

    fn parse_for_inner(&mut self) -> Result<Stmt, CompileError> {
        self.next_token()?; // for
        self.expect_symbol("(")?;

        let mut init_exprs: Vec<Expr> = Vec::new();
        let mut for_in_target: Option<Expr> = None;

        let token = self.next_token()?;
        if !token.is_symbol(";") {
            if token.is_keyword("let") {
                let decls = self.parse_variable_declaration_list()?;
                let token = self.next_token()?;
                if decls.len() == 1 && token.is_keyword("in") {
                    for_in_target = decls.into_iter().next();
                } else {
                    self.back_token(token);
                    init_exprs = decls;
                }
            } else {
                self.back_token(token);
                let expr = self.parse_expression()?;
                let token = self.next_token()?;
                if token.is_keyword("in") {
                    for_in_target = Some(expr);
                } else {
                    self.back_token(token);
                    init_exprs.push(expr);
                }
            }
        } else {
            self.back_token(token);
        }

        if let Some(target) = for_in_target {
            if !matches!(
                target,
                Expr::Ident(_) | Expr::Dot { .. } | Expr::Bracket { .. } | Expr::Variable { .. }
            ) {
                let token = self.peek()?;
                return self.error(&token, "for-in target must be a name, member access or declaration");
            }
            let source = self.parse_expression()?;
            self.expect_symbol(")")?;
            let body = self.parse_statement_required()?;
            return Ok(Stmt::ForIn {
                target,
                source,
                body: Box::new(body),
            });
        }

        self.expect_symbol(";")?;
        let init = if init_exprs.is_empty() {
            None
        } else {
            Some(Expr::Sequence(init_exprs))
        };

        let token = self.next_token()?;
        let test = if token.is_symbol(";") {
            None
        } else {
            self.back_token(token);
            let test = self.parse_expression()?;
            self.expect_symbol(";")?;
            Some(test)
        };

        let token = self.next_token()?;
        let update = if token.is_symbol(")") {
            self.back_token(token);
            None
        } else {
            self.back_token(token);
            Some(self.parse_expression()?)
        };
        self.expect_symbol(")")?;

        let body = self.parse_statement_required()?;
        Ok(Stmt::For {
            init,
            test,
            update,
            body: Box::new(body),
        })
    }

    /// `while (test) body` is a `for` with only a test clause.
    fn parse_while(&mut self) -> Result<Stmt, CompileError> {
        self.push_loop_frame();
        let result = (|| {
            self.next_token()?; // while
            self.expect_symbol("(")?;
            let test = self.parse_expression()?;
            self.expect_symbol(")")?;
            let body = self.parse_statement_required()?;
            Ok(Stmt::For {
                init: None,
                test: Some(test),
                update: None,
                body: Box::new(body),
            })
        })();
        self.pop_frame();
        result
    }

    fn parse_statement_required(&mut self) -> Result<Stmt, CompileError> {
        match self.parse_statement()? {
            Some(stmt) => Ok(stmt),
            None => {
                let token = self.peek()?;
                self.error(&token, "expected a statement")
            }
        }
    }

    fn parse_variable_statement(&mut self) -> Result<Stmt, CompileError> {
        self.next_token()?; // let
        let declarations = self.parse_variable_declaration_list()?;
        self.semicolon()?;
        Ok(Stmt::Variable(declarations))
    }

    fn parse_variable_declaration_list(&mut self) -> Result<Vec<Expr>, CompileError> {
        let mut declarations = Vec::new();
        loop {
            declarations.push(self.parse_variable_declaration()?);
            let token = self.next_token()?;
            if !token.is_symbol(",") {
                self.back_token(token);
                break;
            }
        }
        Ok(declarations)
    }

    fn parse_variable_declaration(&mut self) -> Result<Expr, CompileError> {
        let name = self.expect_identifier()?;
        let token = self.next_token()?;
        let init = if token.is_symbol("=") {
            Some(Box::new(self.parse_assignment()?))
        } else {
            self.back_token(token);
            None
        };
        Ok(Expr::Variable { name, init })
    }

    fn parse_function_statement(&mut self) -> Result<Stmt, CompileError> {
        let token = self.peek()?;
        let def = self.parse_function_literal()?;
        if def.name.is_none() {
            return self.error(&token, "function statement requires a name");
        }
        Ok(Stmt::Function(Rc::new(def)))
    }

    /// `function [name](params) { body }`.
    fn parse_function_literal(&mut self) -> Result<FunctionDef, CompileError> {
        self.next_token()?; // function
        let token = self.next_token()?;
        let name = if token.kind == TokenKind::Identifier {
            Some(token.lexeme)
        } else {
            self.back_token(token);
            None
        };
        let params = self.parse_parameter_list()?;

        self.frames.push(Frame {
            in_function: true,
            in_loop: false,
        });
        let body = self.parse_block();
        self.pop_frame();
        let Stmt::Block(body) = body? else {
            unreachable!("parse_block returns a block")
        };
        Ok(FunctionDef { name, params, body })
    }

    fn parse_parameter_list(&mut self) -> Result<Vec<String>, CompileError> {
        self.expect_symbol("(")?;
        let mut params = Vec::new();
        let token = self.next_token()?;
        if token.is_symbol(")") {
            return Ok(params);
        }
        self.back_token(token);
        loop {
            params.push(self.expect_identifier()?);
            let token = self.next_token()?;
            if token.is_symbol(")") {
                break;
            }
            if !token.is_symbol(",") {
                return self.error(&token, "parameters must be separated by ','");
            }
        }
        Ok(params)
    }

    fn parse_throw(&mut self) -> Result<Stmt, CompileError> {
        self.next_token()?; // throw
        let value = self.parse_expression()?;
        self.semicolon()?;
        Ok(Stmt::Throw(value))
    }

    fn parse_try(&mut self) -> Result<Stmt, CompileError> {
        self.next_token()?; // try
        let body = Box::new(self.parse_block()?);

        let token = self.next_token()?;
        if !token.is_keyword("catch") {
            return self.error(&token, "try requires a catch clause");
        }
        self.expect_symbol("(")?;
        let catch_name = self.expect_identifier()?;
        self.expect_symbol(")")?;
        let catch_body = Box::new(self.parse_block()?);

        let token = self.next_token()?;
        let finally = if token.is_keyword("finally") {
            Some(Box::new(self.parse_block()?))
        } else {
            self.back_token(token);
            None
        };
        Ok(Stmt::Try {
            body,
            catch_name,
            catch_body,
            finally,
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, CompileError> {
        let token = self.next_token()?; // return
        if !self.frame().in_function {
            return self.error(&token, "return is only allowed inside a function");
        }
        let token = self.next_token()?;
        if token.is_symbol(";") {
            return Ok(Stmt::Return(None));
        }
        if token.is_symbol("}") || token.is_eof() {
            self.back_token(token);
            return Ok(Stmt::Return(None));
        }
        self.back_token(token);
        let value = self.parse_expression()?;
        self.semicolon()?;
        Ok(Stmt::Return(Some(value)))
    }

    fn parse_break(&mut self) -> Result<Stmt, CompileError> {
        let token = self.next_token()?; // break
        if !self.frame().in_loop {
            return self.error(&token, "break is only allowed inside a loop");
        }
        self.semicolon()?;
        Ok(Stmt::Break)
    }

    fn parse_continue(&mut self) -> Result<Stmt, CompileError> {
        let token = self.next_token()?; // continue
        if !self.frame().in_loop {
            return self.error(&token, "continue is only allowed inside a loop");
        }
        self.semicolon()?;
        Ok(Stmt::Continue)
    }

    /// `import a.b.c as alias;` with a mandatory alias and terminator.
    fn parse_import(&mut self) -> Result<(), CompileError> {
        self.next_token()?; // import
        let mut path = vec![self.expect_identifier()?];
        loop {
            let token = self.next_token()?;
            if token.is_symbol(".") {
                path.push(self.expect_identifier()?);
            } else {
                self.back_token(token);
                break;
            }
        }
        let token = self.next_token()?;
        if !token.is_keyword("as") {
            return self.error(&token, "import requires an alias: import a.b as name;");
        }
        let alias = self.expect_identifier()?;
        let token = self.next_token()?;
        if !token.is_symbol(";") {
            return self.error(&token, "import must end with ';'");
        }
        self.imports.push(Import { path, alias });
        Ok(())
    }

    // ----- expressions -----

    /// Top of the expression grammar: a `,`-separated sequence.
    fn parse_expression(&mut self) -> Result<Expr, CompileError> {
        let first = self.parse_assignment()?;
        let token = self.next_token()?;
        if !token.is_symbol(",") {
            self.back_token(token);
            return Ok(first);
        }
        let mut sequence = vec![first];
        loop {
            sequence.push(self.parse_assignment()?);
            let token = self.next_token()?;
            if !token.is_symbol(",") {
                self.back_token(token);
                break;
            }
        }
        Ok(Expr::Sequence(sequence))
    }

    fn enter_nesting(&mut self, token: &Token) -> Result<(), CompileError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return self.error(token, "expression nesting too deep");
        }
        Ok(())
    }

    fn parse_assignment(&mut self) -> Result<Expr, CompileError> {
        let guard_token = self.peek()?;
        self.enter_nesting(&guard_token)?;
        let result = self.parse_assignment_inner();
        self.depth -= 1;
        result
    }

    fn parse_assignment_inner(&mut self) -> Result<Expr, CompileError> {
        let left = self.parse_conditional()?;
        let token = self.next_token()?;
        let op = if token.kind == TokenKind::Symbol {
            match token.lexeme.as_str() {
                "=" => Some(AssignOp::Assign),
                "+=" => Some(AssignOp::Compound(BinaryOp::Add)),
                "-=" => Some(AssignOp::Compound(BinaryOp::Sub)),
                "*=" => Some(AssignOp::Compound(BinaryOp::Mul)),
                "/=" => Some(AssignOp::Compound(BinaryOp::Div)),
                "%=" => Some(AssignOp::Compound(BinaryOp::Rem)),
                _ => None,
            }
        } else {
            None
        };
        let Some(op) = op else {
            self.back_token(token);
            return Ok(left);
        };
        if !matches!(left, Expr::Ident(_) | Expr::Dot { .. } | Expr::Bracket { .. }) {
            return self.error(&token, "invalid assignment target");
        }
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(left),
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> Result<Expr, CompileError> {
        let test = self.parse_logical_or()?;
        let token = self.next_token()?;
        if !token.is_symbol("?") {
            self.back_token(token);
            return Ok(test);
        }
        let then = self.parse_assignment()?;
        self.expect_symbol(":")?;
        let otherwise = self.parse_assignment()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_logical_or(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_logical_and()?;
        loop {
            let token = self.next_token()?;
            if !token.is_symbol("||") {
                self.back_token(token);
                return Ok(left);
            }
            let right = self.parse_logical_and()?;
            left = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_logical_and(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_equality()?;
        loop {
            let token = self.next_token()?;
            if !token.is_symbol("&&") {
                self.back_token(token);
                return Ok(left);
            }
            let right = self.parse_equality()?;
            left = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_equality(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_relational()?;
        loop {
            let token = self.next_token()?;
            if token.kind != TokenKind::Symbol {
                self.back_token(token);
                return Ok(left);
            }
            let op = match token.lexeme.as_str() {
                "==" => BinaryOp::Eq,
                "!=" => BinaryOp::NotEq,
                _ => {
                    self.back_token(token);
                    return Ok(left);
                }
            };
            let right = self.parse_relational()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_shift()?;
        loop {
            let token = self.next_token()?;
            if token.kind != TokenKind::Symbol {
                self.back_token(token);
                return Ok(left);
            }
            let op = match token.lexeme.as_str() {
                "<" => BinaryOp::Lt,
                "<=" => BinaryOp::LtEq,
                ">" => BinaryOp::Gt,
                ">=" => BinaryOp::GtEq,
                _ => {
                    self.back_token(token);
                    return Ok(left);
                }
            };
            let right = self.parse_shift()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    /// Shift level. The lexer never produces `<<` or `>>` tokens, so this
    /// level is pass-through today; the operators stay reserved.
    fn parse_shift(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_additive()?;
        loop {
            let token = self.next_token()?;
            if token.kind != TokenKind::Symbol {
                self.back_token(token);
                return Ok(left);
            }
            let op = match token.lexeme.as_str() {
                "<<" => BinaryOp::Shl,
                ">>" => BinaryOp::Shr,
                _ => {
                    self.back_token(token);
                    return Ok(left);
                }
            };
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let token = self.next_token()?;
            if token.kind != TokenKind::Symbol {
                self.back_token(token);
                return Ok(left);
            }
            let op = match token.lexeme.as_str() {
                "+" => BinaryOp::Add,
                "-" => BinaryOp::Sub,
                _ => {
                    self.back_token(token);
                    return Ok(left);
                }
            };
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_unary()?;
        loop {
            let token = self.next_token()?;
            if token.kind != TokenKind::Symbol {
                self.back_token(token);
                return Ok(left);
            }
            let op = match token.lexeme.as_str() {
                "*" => BinaryOp::Mul,
                "/" => BinaryOp::Div,
                "%" => BinaryOp::Rem,
                _ => {
                    self.back_token(token);
                    return Ok(left);
                }
            };
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        let token = self.next_token()?;
        self.enter_nesting(&token)?;
        let result = self.parse_unary_inner(token);
        self.depth -= 1;
        result
    }

    fn parse_unary_inner(&mut self, token: Token) -> Result<Expr, CompileError> {
        let prefix_op = match token.lexeme.as_str() {
            "!" if token.kind == TokenKind::Symbol => Some(UnaryOp::Not),
            "+" if token.kind == TokenKind::Symbol => Some(UnaryOp::Plus),
            "-" if token.kind == TokenKind::Symbol => Some(UnaryOp::Minus),
            "delete" if token.kind == TokenKind::Keyword => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = prefix_op {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                postfix: false,
            });
        }
        if token.is_symbol("++") || token.is_symbol("--") {
            let op = if token.is_symbol("++") {
                UnaryOp::Increment
            } else {
                UnaryOp::Decrement
            };
            let operand = self.parse_unary()?;
            if !matches!(operand, Expr::Ident(_) | Expr::Dot { .. } | Expr::Bracket { .. }) {
                return self.error(&token, "invalid operand for prefix increment/decrement");
            }
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                postfix: false,
            });
        }
        self.back_token(token);
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, CompileError> {
        let operand = self.parse_left_hand_side()?;
        let token = self.next_token()?;
        if token.is_symbol("++") || token.is_symbol("--") {
            if !matches!(operand, Expr::Ident(_) | Expr::Dot { .. } | Expr::Bracket { .. }) {
                return self.error(&token, "invalid operand for postfix increment/decrement");
            }
            let op = if token.is_symbol("++") {
                UnaryOp::Increment
            } else {
                UnaryOp::Decrement
            };
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                postfix: true,
            });
        }
        self.back_token(token);
        Ok(operand)
    }

    /// Primary followed by any run of `.name`, `[index]` and `(args)`.
    fn parse_left_hand_side(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_primary()?;
        loop {
            let token = self.next_token()?;
            if token.is_symbol(".") {
                let name = self.expect_identifier()?;
                left = Expr::Dot {
                    object: Box::new(left),
                    name,
                };
            } else if token.is_symbol("[") {
                let index = self.parse_expression()?;
                self.expect_symbol("]")?;
                left = Expr::Bracket {
                    object: Box::new(left),
                    index: Box::new(index),
                };
            } else if token.is_symbol("(") {
                self.back_token(token);
                let args = self.parse_argument_list()?;
                left = Expr::Call {
                    callee: Box::new(left),
                    args,
                };
            } else {
                self.back_token(token);
                return Ok(left);
            }
        }
    }

    fn parse_argument_list(&mut self) -> Result<Vec<Expr>, CompileError> {
        self.expect_symbol("(")?;
        let mut args = Vec::new();
        let token = self.next_token()?;
        if token.is_symbol(")") {
            return Ok(args);
        }
        self.back_token(token);
        loop {
            args.push(self.parse_assignment()?);
            let token = self.next_token()?;
            if token.is_symbol(")") {
                break;
            }
            if !token.is_symbol(",") {
                return self.error(&token, "arguments must be separated by ','");
            }
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Identifier => Ok(Expr::Ident(token.lexeme)),
            TokenKind::Str => Ok(Expr::Str(token.lexeme)),
            TokenKind::Integer | TokenKind::Float => Ok(Expr::Number(token.lexeme)),
            TokenKind::Keyword => match token.lexeme.as_str() {
                "null" => Ok(Expr::Null),
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "this" => Ok(Expr::This),
                "function" => {
                    self.back_token(token);
                    let def = self.parse_function_literal()?;
                    Ok(Expr::Function(Rc::new(def)))
                }
                _ => self.error(&token, "unexpected keyword in expression"),
            },
            TokenKind::Symbol => match token.lexeme.as_str() {
                "(" => {
                    let expr = self.parse_expression()?;
                    self.expect_symbol(")")?;
                    Ok(expr)
                }
                "{" => {
                    self.back_token(token);
                    self.parse_object_literal()
                }
                "[" => {
                    self.back_token(token);
                    self.parse_array_literal()
                }
                _ => self.error(&token, "unexpected token"),
            },
            _ => self.error(&token, "unexpected token"),
        }
    }

    fn parse_object_literal(&mut self) -> Result<Expr, CompileError> {
        self.expect_symbol("{")?;
        let mut properties = Vec::new();
        let token = self.next_token()?;
        if token.is_symbol("}") {
            return Ok(Expr::Object(properties));
        }
        self.back_token(token);
        loop {
            let key = self.parse_property_key()?;
            self.expect_symbol(":")?;
            let value = self.parse_assignment()?;
            properties.push((key, value));
            let token = self.next_token()?;
            if token.is_symbol("}") {
                break;
            }
            if !token.is_symbol(",") {
                return self.error(&token, "expected ',' or '}' in object literal");
            }
            // tolerate a trailing comma
            let token = self.next_token()?;
            if token.is_symbol("}") {
                break;
            }
            self.back_token(token);
        }
        Ok(Expr::Object(properties))
    }

    /// Property keys may be identifiers, keywords, strings or numerals; the
    /// lexeme is used verbatim.
    fn parse_property_key(&mut self) -> Result<String, CompileError> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Identifier | TokenKind::Keyword | TokenKind::Str | TokenKind::Integer | TokenKind::Float => {
                Ok(token.lexeme)
            }
            _ => self.error(&token, "expected a property name"),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expr, CompileError> {
        self.expect_symbol("[")?;
        let mut elements = Vec::new();
        loop {
            let token = self.next_token()?;
            if token.is_symbol("]") {
                break;
            }
            self.back_token(token);
            elements.push(self.parse_assignment()?);
            let token = self.next_token()?;
            if token.is_symbol("]") {
                break;
            }
            if !token.is_symbol(",") {
                return self.error(&token, "expected ',' or ']' in array literal");
            }
        }
        Ok(Expr::Array(elements))
    }
}
