use std::rc::Rc;

use crate::value::{Class, Value};

/// Arithmetic operators handled by [`Statement::Binary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mult,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mult => '*',
            BinaryOp::Div => '/',
        }
    }
}

/// The six relational predicates.  Only `Equal` and `Less` consult user code;
/// the others are derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
}

/// Dotted name path such as `self.position.x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableValue {
    pub dotted_ids: Vec<String>,
}

impl VariableValue {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            dotted_ids: vec![name.into()],
        }
    }

    pub fn dotted<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dotted_ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// **Abstract‑Syntax‑Tree node**.  Mython does not separate statements from
/// expressions: every node executes against an environment and yields a
/// value.
#[derive(Debug)]
pub enum Statement {
    /// A literal number, string, boolean or `None`.
    Constant(Value),

    /// `name = value`
    Assignment {
        name: String,
        value: Box<Statement>,
    },

    /// Read of a plain or dotted name.
    VariableValue(VariableValue),

    /// `print a, b, ...`
    Print(Vec<Statement>),

    /// `object.method(args)`
    MethodCall {
        object: Box<Statement>,
        method: String,
        args: Vec<Statement>,
    },

    /// `ClassName(args)`
    NewInstance {
        class: Rc<Class>,
        args: Vec<Statement>,
    },

    /// `str(value)`
    Stringify(Box<Statement>),

    /// `lhs + rhs`, `lhs - rhs`, `lhs * rhs`, `lhs / rhs`
    Binary {
        op: BinaryOp,
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },

    /// Logical `or`; both sides are always evaluated.
    Or(Box<Statement>, Box<Statement>),

    /// Logical `and`; both sides are always evaluated.
    And(Box<Statement>, Box<Statement>),

    Not(Box<Statement>),

    Comparison {
        cmp: Comparator,
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },

    /// Statement sequence.
    Compound(Vec<Statement>),

    Return(Box<Statement>),

    ClassDefinition(Rc<Class>),

    /// `object.field = value`
    FieldAssignment {
        object: VariableValue,
        field: String,
        value: Box<Statement>,
    },

    IfElse {
        condition: Box<Statement>,
        if_body: Box<Statement>,
        else_body: Option<Box<Statement>>,
    },

    /// Boundary that turns a `return` into the method's result.
    MethodBody(Box<Statement>),
}

// Shorthand constructors, mostly for building trees by hand.
impl Statement {
    pub fn none() -> Self {
        Statement::Constant(Value::None)
    }

    pub fn number(n: i64) -> Self {
        Statement::Constant(Value::Number(n))
    }

    pub fn string<S: Into<String>>(s: S) -> Self {
        Statement::Constant(Value::string(s))
    }

    pub fn boolean(b: bool) -> Self {
        Statement::Constant(Value::Bool(b))
    }

    pub fn variable<S: Into<String>>(name: S) -> Self {
        Statement::VariableValue(VariableValue::new(name))
    }

    pub fn dotted<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Statement::VariableValue(VariableValue::dotted(ids))
    }

    pub fn assign<S: Into<String>>(name: S, value: Statement) -> Self {
        Statement::Assignment {
            name: name.into(),
            value: Box::new(value),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Statement, rhs: Statement) -> Self {
        Statement::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn compare(cmp: Comparator, lhs: Statement, rhs: Statement) -> Self {
        Statement::Comparison {
            cmp,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn ret(value: Statement) -> Self {
        Statement::Return(Box::new(value))
    }

    pub fn method_call<S: Into<String>>(object: Statement, method: S, args: Vec<Statement>) -> Self {
        Statement::MethodCall {
            object: Box::new(object),
            method: method.into(),
            args,
        }
    }

    pub fn field_assign<S: Into<String>>(object: VariableValue, field: S, value: Statement) -> Self {
        Statement::FieldAssignment {
            object,
            field: field.into(),
            value: Box::new(value),
        }
    }

    pub fn if_else(condition: Statement, if_body: Statement, else_body: Option<Statement>) -> Self {
        Statement::IfElse {
            condition: Box::new(condition),
            if_body: Box::new(if_body),
            else_body: else_body.map(Box::new),
        }
    }

    pub fn method_body(body: Statement) -> Self {
        Statement::MethodBody(Box::new(body))
    }
}
