/*!
Recursive‑descent parser for Mython
===================================

Consumes the [`Lexer`] cursor and builds the [`Statement`] tree executed by
the interpreter.  Token shape is validated through the cursor's typed
assertions (`expect`, `expect_next`, `expect_value`, …), so a malformed
stream surfaces as a [`LexError`](crate::error::LexError); grammar violations
the assertions cannot express become [`MythonError::Parse`].

Grammar (EBNF, condensed)
--------------------------

```text
program     → statement* EOF ;
statement   → classDef | ifElse | simple NEWLINE ;
classDef    → "class" ID ( "(" ID ")" )? ":" NEWLINE INDENT methodDef+ DEDENT ;
methodDef   → "def" ID "(" ( ID ( "," ID )* )? ")" ":" suite ;
suite       → NEWLINE INDENT statement+ DEDENT ;
ifElse      → "if" test ":" suite ( "else" ":" suite )? ;
simple      → "return" test? | "print" ( test ( "," test )* )?
            | dotted "=" test | test ;
test        → andTest ( "or" andTest )* ;
andTest     → notTest ( "and" notTest )* ;
notTest     → "not" notTest | comparison ;
comparison  → expr ( ( "==" | "!=" | "<" | ">" | "<=" | ">=" ) expr )? ;
expr        → term ( ( "+" | "-" ) term )* ;
term        → unary ( ( "*" | "/" ) unary )* ;
unary       → "-" unary | primary ;
primary     → NUMBER | STRING | "True" | "False" | "None" | "(" test ")"
            | "str" "(" test ")" | CLASS_NAME "(" args? ")"
            | dotted ( "(" args? ")" ( "." ID "(" args? ")" )* )? ;
```

Classes are bound at parse time: `NewInstance` nodes and parent references
hold the class descriptor itself, so a class must be defined before it is
instantiated or inherited from.

### Logging Policy

| Location                    | Level   | Purpose                                   |
|-----------------------------|---------|-------------------------------------------|
| `Parser::new`, `parse`      | `info`  | Lifecycle milestones.                     |
| `statement`, class / method | `debug` | High‑level descent into grammar branches. |
*/

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{BinaryOp, Comparator, Statement, VariableValue};
use crate::error::{MythonError, Result};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use crate::value::{Class, Method, SELF_NAME};

/// Name of the built‑in conversion `str(x)`.
const STRINGIFY: &str = "str";

/// Top‑level parser over a tokenized source.
pub struct Parser {
    lexer: Lexer,
    classes: HashMap<String, Rc<Class>>,
}

impl Parser {
    /// Tokenize `source` and construct a parser over it.
    pub fn new(source: &str) -> Result<Self> {
        Ok(Self::from_lexer(Lexer::new(source)?))
    }

    pub fn from_lexer(lexer: Lexer) -> Self {
        info!("Parser created with {} tokens", lexer.tokens().len());

        Self {
            lexer,
            classes: HashMap::new(),
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program into a single `Compound` node.
    pub fn parse(mut self) -> Result<Statement> {
        info!("Beginning parse phase");

        let mut statements: Vec<Statement> = Vec::new();

        self.skip_empty_lines();

        while !self.check(TokenKind::Eof) {
            statements.push(self.statement()?);
            self.skip_empty_lines();
        }

        info!("Parsed {} top-level statements", statements.len());

        Ok(Statement::Compound(statements))
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Statement> {
        debug!("Entering statement at {}", self.lexer.current_token());

        match self.lexer.current_token().kind() {
            TokenKind::Class => self.class_definition(),
            TokenKind::If => self.if_else(),
            _ => {
                let stmt: Statement = self.simple_statement()?;
                self.lexer.expect(TokenKind::Newline)?;
                self.lexer.next_token();

                Ok(stmt)
            }
        }
    }

    fn class_definition(&mut self) -> Result<Statement> {
        let name: String = self.lexer.expect_next_id()?.to_owned();
        debug!("Parsing class {}", name);

        self.lexer.next_token();

        let parent: Option<Rc<Class>> = if self.matches_char('(') {
            let parent_name: String = self.lexer.expect_id()?.to_owned();
            let parent: Rc<Class> = self.known_class(&parent_name)?;

            self.lexer.expect_next_value(&Token::Char(')'))?;
            self.lexer.next_token();

            Some(parent)
        } else {
            None
        };

        self.lexer.expect_value(&Token::Char(':'))?;
        self.lexer.expect_next(TokenKind::Newline)?;
        self.lexer.expect_next(TokenKind::Indent)?;
        self.lexer.next_token();

        let mut methods: Vec<Method> = Vec::new();
        self.skip_empty_lines();

        while !self.check(TokenKind::Dedent) {
            methods.push(self.method_definition()?);
            self.skip_empty_lines();
        }
        self.lexer.next_token();

        let class: Rc<Class> = Rc::new(Class::new(name.clone(), methods, parent));
        self.classes.insert(name, Rc::clone(&class));

        Ok(Statement::ClassDefinition(class))
    }

    fn method_definition(&mut self) -> Result<Method> {
        self.lexer.expect(TokenKind::Def)?;

        let name: String = self.lexer.expect_next_id()?.to_owned();
        debug!("Parsing method {}", name);

        self.lexer.expect_next_value(&Token::Char('('))?;
        self.lexer.next_token();

        let mut params: Vec<String> = Vec::new();

        if !self.lexer.current_token().is_char(')') {
            loop {
                params.push(self.lexer.expect_id()?.to_owned());
                self.lexer.next_token();

                if !self.matches_char(',') {
                    break;
                }
            }
        }

        self.lexer.expect_value(&Token::Char(')'))?;
        self.lexer.expect_next_value(&Token::Char(':'))?;
        self.lexer.next_token();

        // `self` is bound implicitly; an explicit leading one is accepted.
        if params.first().map(String::as_str) == Some(SELF_NAME) {
            params.remove(0);
        }

        let body: Statement = self.suite()?;

        Ok(Method::new(name, params, Statement::method_body(body)))
    }

    /// An indented block introduced by the preceding `:`.
    fn suite(&mut self) -> Result<Statement> {
        self.lexer.expect(TokenKind::Newline)?;
        self.lexer.expect_next(TokenKind::Indent)?;
        self.lexer.next_token();

        let mut statements: Vec<Statement> = Vec::new();
        self.skip_empty_lines();

        while !self.check(TokenKind::Dedent) {
            if self.check(TokenKind::Eof) {
                return Err(self.error("Unexpected end of input inside a block"));
            }

            statements.push(self.statement()?);
            self.skip_empty_lines();
        }
        self.lexer.next_token();

        Ok(Statement::Compound(statements))
    }

    fn if_else(&mut self) -> Result<Statement> {
        self.lexer.next_token();

        let condition: Statement = self.test()?;

        self.lexer.expect_value(&Token::Char(':'))?;
        self.lexer.next_token();

        let if_body: Statement = self.suite()?;

        let else_body: Option<Statement> = if self.matches(TokenKind::Else) {
            self.lexer.expect_value(&Token::Char(':'))?;
            self.lexer.next_token();

            Some(self.suite()?)
        } else {
            None
        };

        Ok(Statement::if_else(condition, if_body, else_body))
    }

    fn simple_statement(&mut self) -> Result<Statement> {
        if self.matches(TokenKind::Return) {
            let value: Statement = if self.check(TokenKind::Newline) {
                Statement::none()
            } else {
                self.test()?
            };

            return Ok(Statement::ret(value));
        }

        if self.matches(TokenKind::Print) {
            let mut args: Vec<Statement> = Vec::new();

            if !self.check(TokenKind::Newline) {
                loop {
                    args.push(self.test()?);

                    if !self.matches_char(',') {
                        break;
                    }
                }
            }

            return Ok(Statement::Print(args));
        }

        let line: usize = self.lexer.current_line();
        let expr: Statement = self.test()?;

        if !self.matches_char('=') {
            return Ok(expr);
        }

        let Statement::VariableValue(target) = expr else {
            return Err(MythonError::parse(line, "Invalid assignment target"));
        };

        let value: Statement = self.test()?;
        let mut ids: Vec<String> = target.dotted_ids;

        match ids.pop() {
            Some(name) if ids.is_empty() => Ok(Statement::assign(name, value)),
            Some(field) => Ok(Statement::field_assign(
                VariableValue { dotted_ids: ids },
                field,
                value,
            )),
            None => Err(MythonError::parse(line, "Invalid assignment target")),
        }
    }

    // ───────────────────────── expression rules ───────────────────

    fn test(&mut self) -> Result<Statement> {
        let mut expr: Statement = self.and_test()?;

        while self.matches(TokenKind::Or) {
            let rhs: Statement = self.and_test()?;
            expr = Statement::Or(Box::new(expr), Box::new(rhs));
        }

        Ok(expr)
    }

    fn and_test(&mut self) -> Result<Statement> {
        let mut expr: Statement = self.not_test()?;

        while self.matches(TokenKind::And) {
            let rhs: Statement = self.not_test()?;
            expr = Statement::And(Box::new(expr), Box::new(rhs));
        }

        Ok(expr)
    }

    fn not_test(&mut self) -> Result<Statement> {
        if self.matches(TokenKind::Not) {
            let arg: Statement = self.not_test()?;

            return Ok(Statement::Not(Box::new(arg)));
        }

        self.comparison()
    }

    fn comparison(&mut self) -> Result<Statement> {
        let lhs: Statement = self.expr()?;

        let cmp: Comparator = match self.lexer.current_token() {
            Token::Eq => Comparator::Equal,
            Token::NotEq => Comparator::NotEqual,
            Token::LessOrEq => Comparator::LessOrEqual,
            Token::GreaterOrEq => Comparator::GreaterOrEqual,
            Token::Char('<') => Comparator::Less,
            Token::Char('>') => Comparator::Greater,
            _ => return Ok(lhs),
        };
        self.lexer.next_token();

        let rhs: Statement = self.expr()?;

        Ok(Statement::compare(cmp, lhs, rhs))
    }

    fn expr(&mut self) -> Result<Statement> {
        let mut expr: Statement = self.term()?;

        loop {
            let op: BinaryOp = if self.matches_char('+') {
                BinaryOp::Add
            } else if self.matches_char('-') {
                BinaryOp::Sub
            } else {
                break;
            };

            let rhs: Statement = self.term()?;
            expr = Statement::binary(op, expr, rhs);
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Statement> {
        let mut expr: Statement = self.unary()?;

        loop {
            let op: BinaryOp = if self.matches_char('*') {
                BinaryOp::Mult
            } else if self.matches_char('/') {
                BinaryOp::Div
            } else {
                break;
            };

            let rhs: Statement = self.unary()?;
            expr = Statement::binary(op, expr, rhs);
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Statement> {
        if self.matches_char('-') {
            let arg: Statement = self.unary()?;

            return Ok(Statement::binary(BinaryOp::Mult, Statement::number(-1), arg));
        }

        self.primary()
    }

    fn primary(&mut self) -> Result<Statement> {
        let expr: Statement = match self.lexer.current_token().clone() {
            Token::Number(n) => Statement::number(n),
            Token::String(s) => Statement::string(s),
            Token::True => Statement::boolean(true),
            Token::False => Statement::boolean(false),
            Token::None => Statement::none(),
            Token::Char('(') => {
                self.lexer.next_token();
                let inner: Statement = self.test()?;
                self.lexer.expect_value(&Token::Char(')'))?;
                inner
            }
            Token::Id(_) => return self.dotted_expression(),
            other => {
                return Err(self.error(format!("Expected expression, found {}", other)));
            }
        };
        self.lexer.next_token();

        Ok(expr)
    }

    /// A name path, optionally followed by a call, with chained method calls.
    fn dotted_expression(&mut self) -> Result<Statement> {
        let line: usize = self.lexer.current_line();
        let mut ids: Vec<String> = vec![self.lexer.expect_id()?.to_owned()];
        self.lexer.next_token();

        while self.matches_char('.') {
            ids.push(self.lexer.expect_id()?.to_owned());
            self.lexer.next_token();
        }

        if !self.lexer.current_token().is_char('(') {
            return Ok(Statement::VariableValue(VariableValue { dotted_ids: ids }));
        }

        let args: Vec<Statement> = self.arguments()?;

        let mut expr: Statement = match ids.pop() {
            Some(name) if ids.is_empty() => self.call_by_name(&name, args, line)?,
            Some(method) => Statement::method_call(
                Statement::VariableValue(VariableValue { dotted_ids: ids }),
                method,
                args,
            ),
            None => unreachable!("dotted path always has a head"),
        };

        while self.matches_char('.') {
            let method: String = self.lexer.expect_id()?.to_owned();
            self.lexer.expect_next_value(&Token::Char('('))?;

            let args: Vec<Statement> = self.arguments()?;
            expr = Statement::method_call(expr, method, args);
        }

        Ok(expr)
    }

    /// `str(x)` or `ClassName(args)`; Mython has no free functions.
    fn call_by_name(&self, name: &str, mut args: Vec<Statement>, line: usize) -> Result<Statement> {
        if name == STRINGIFY {
            return match (args.pop(), args.is_empty()) {
                (Some(arg), true) => Ok(Statement::Stringify(Box::new(arg))),
                _ => Err(MythonError::parse(line, "str() takes exactly one argument")),
            };
        }

        let class: Rc<Class> = self.known_class(name)?;

        Ok(Statement::NewInstance { class, args })
    }

    /// `"(" ( test ( "," test )* )? ")"`, starting on the opening paren and
    /// finishing past the closing one.
    fn arguments(&mut self) -> Result<Vec<Statement>> {
        self.lexer.expect_value(&Token::Char('('))?;
        self.lexer.next_token();

        let mut args: Vec<Statement> = Vec::new();

        if !self.lexer.current_token().is_char(')') {
            loop {
                args.push(self.test()?);

                if !self.matches_char(',') {
                    break;
                }
            }
        }

        self.lexer.expect_value(&Token::Char(')'))?;
        self.lexer.next_token();

        Ok(args)
    }

    // ────────────────────── utility helpers ───────────────────────

    fn known_class(&self, name: &str) -> Result<Rc<Class>> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| self.error(format!("Unknown class '{}'", name)))
    }

    /// Comment lines that only moved the indentation leave bare `Newline`s.
    fn skip_empty_lines(&mut self) {
        while self.matches(TokenKind::Newline) {}
    }

    #[inline(always)]
    fn check(&self, kind: TokenKind) -> bool {
        self.lexer.current_token().is(kind)
    }

    #[inline(always)]
    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.lexer.next_token();

            return true;
        }

        false
    }

    #[inline(always)]
    fn matches_char(&mut self, c: char) -> bool {
        if self.lexer.current_token().is_char(c) {
            self.lexer.next_token();

            return true;
        }

        false
    }

    fn error<S: Into<String>>(&self, message: S) -> MythonError {
        MythonError::parse(self.lexer.current_line(), message)
    }
}
