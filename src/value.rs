//! Runtime values of the Mython object model.
//!
//! A [`Value`] is a small, cheaply cloned handle.  Scalars are stored inline,
//! strings behind an `Rc<str>`, classes and instances behind `Rc`.  An
//! instance refers to itself (`self`) through a *borrowed share*, a `Weak`
//! handle that never keeps the instance alive.  Reading a variable promotes
//! such a share back to an owning handle, see [`Value::promote`].

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::io::Write;
use std::rc::{Rc, Weak};

use log::debug;

use crate::ast::Statement;
use crate::environment::Environment;
use crate::error::{ExecResult, RuntimeError};
use crate::interpreter::Flow;

pub const INIT_METHOD: &str = "__init__";
pub const STR_METHOD: &str = "__str__";
pub const EQ_METHOD: &str = "__eq__";
pub const LT_METHOD: &str = "__lt__";
pub const ADD_METHOD: &str = "__add__";

/// Reserved name binding the receiver inside a method and in every
/// instance's own field table.
pub const SELF_NAME: &str = "self";

/// Execution context handed to every node.  The only observable effect of a
/// program besides its result goes through [`Context::output`].
pub trait Context {
    fn output(&mut self) -> &mut dyn Write;
}

/// A [`Context`] writing to any `Write` sink.
#[derive(Debug, Default)]
pub struct SimpleContext<W: Write> {
    output: W,
}

impl<W: Write> SimpleContext<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}

impl<W: Write> Context for SimpleContext<W> {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.output
    }
}

/// Handle to a runtime value.  `Value::None` is the empty handle.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Number(i64),
    Bool(bool),
    String(Rc<str>),
    Class(Rc<Class>),
    Instance(InstanceRef),
}

/// Owning or borrowed reference to an [`Instance`].
#[derive(Debug, Clone)]
pub enum InstanceRef {
    Owned(Rc<Instance>),
    /// Alias that must never extend the instance's lifetime.
    Borrowed(Weak<Instance>),
}

impl InstanceRef {
    /// Dereference the handle.  A borrowed share whose owner is gone yields
    /// [`RuntimeError::DanglingInstance`].
    pub fn get(&self) -> ExecResult<Rc<Instance>> {
        match self {
            InstanceRef::Owned(rc) => Ok(Rc::clone(rc)),
            InstanceRef::Borrowed(weak) => weak.upgrade().ok_or(RuntimeError::DanglingInstance),
        }
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self, InstanceRef::Borrowed(_))
    }
}

impl Value {
    pub fn number(n: i64) -> Self {
        Value::Number(n)
    }

    pub fn boolean(b: bool) -> Self {
        Value::Bool(b)
    }

    pub fn string<S: Into<String>>(s: S) -> Self {
        Value::String(Rc::from(s.into()))
    }

    /// Wrap a freshly created instance in an owning handle.
    pub fn own(instance: Instance) -> Self {
        Value::Instance(InstanceRef::Owned(Rc::new(instance)))
    }

    /// Borrowed share of an existing instance.
    pub fn share(instance: &Rc<Instance>) -> Self {
        Value::Instance(InstanceRef::Borrowed(Rc::downgrade(instance)))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Kind name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Number(_) => "Number",
            Value::Bool(_) => "Bool",
            Value::String(_) => "String",
            Value::Class(_) => "Class",
            Value::Instance(_) => "Instance",
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The instance behind this handle, if it is one.
    pub fn as_instance(&self) -> ExecResult<Option<Rc<Instance>>> {
        match self {
            Value::Instance(handle) => handle.get().map(Some),
            _ => Ok(None),
        }
    }

    /// Turn a borrowed share into an owning handle; other values pass through.
    pub fn promote(self) -> ExecResult<Value> {
        match self {
            Value::Instance(handle @ InstanceRef::Borrowed(_)) => {
                Ok(Value::Instance(InstanceRef::Owned(handle.get()?)))
            }
            other => Ok(other),
        }
    }

    /// Mython truthiness: non-empty strings, non-zero numbers and `True`.
    pub fn is_true(&self) -> bool {
        match self {
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0,
            Value::Bool(b) => *b,
            Value::None | Value::Class(_) | Value::Instance(_) => false,
        }
    }

    /// Text produced when the value is printed.  Instances defer to a
    /// zero-argument `__str__` when their class has one.
    pub fn render(&self, ctx: &mut dyn Context) -> ExecResult<String> {
        match self {
            Value::None => Ok("None".to_string()),
            Value::Number(n) => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                Ok(buf.format(*n).to_string())
            }
            Value::Bool(true) => Ok("True".to_string()),
            Value::Bool(false) => Ok("False".to_string()),
            Value::String(s) => Ok(s.to_string()),
            Value::Class(class) => Ok(format!("Class {}", class.name())),
            Value::Instance(handle) => {
                let instance: Rc<Instance> = handle.get()?;

                if instance.has_method(STR_METHOD, 0) {
                    instance.call(STR_METHOD, Vec::new(), ctx)?.render(ctx)
                } else {
                    Ok(format!(
                        "<{} object at {:p}>",
                        instance.class().name(),
                        Rc::as_ptr(&instance)
                    ))
                }
            }
        }
    }
}

// ─────────────────────────────── classes ───────────────────────────────────

/// A method: name, formal parameters (excluding `self`) and body.
#[derive(Debug)]
pub struct Method {
    pub name: String,
    pub formal_params: Vec<String>,
    pub body: Statement,
}

impl Method {
    pub fn new<S: Into<String>>(name: S, formal_params: Vec<String>, body: Statement) -> Self {
        Self {
            name: name.into(),
            formal_params,
            body,
        }
    }
}

/// Class descriptor.  The method table is sorted by name on construction and
/// never changes afterwards.
#[derive(Debug)]
pub struct Class {
    name: String,
    methods: Vec<Method>,
    parent: Option<Rc<Class>>,
}

impl Class {
    pub fn new<S: Into<String>>(name: S, mut methods: Vec<Method>, parent: Option<Rc<Class>>) -> Self {
        methods.sort_by(|lhs, rhs| lhs.name.cmp(&rhs.name));

        Self {
            name: name.into(),
            methods,
            parent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Rc<Class>> {
        self.parent.as_ref()
    }

    /// Methods declared directly on this class, sorted by name.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Find `name` here or in the nearest ancestor that declares it.
    pub fn method(&self, name: &str) -> Option<&Method> {
        let mut class: Option<&Class> = Some(self);

        while let Some(cls) = class {
            if let Ok(idx) = cls
                .methods
                .binary_search_by(|mth| mth.name.as_str().cmp(name))
            {
                return Some(&cls.methods[idx]);
            }

            class = cls.parent.as_deref();
        }

        None
    }
}

// ────────────────────────────── instances ──────────────────────────────────

pub struct Instance {
    class: Rc<Class>,
    fields: RefCell<Environment>,
}

impl fmt::Debug for Instance {
    // Fields may hold the instance itself, so only their names are shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Instance");
        out.field("class", &self.class.name());

        match self.fields.try_borrow() {
            Ok(fields) => {
                let mut names: Vec<&str> = fields.names().collect();
                names.sort_unstable();
                out.field("fields", &names);
            }
            Err(_) => {
                out.field("fields", &"<in use>");
            }
        }

        out.finish()
    }
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: RefCell::new(Environment::new()),
        }
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    pub fn fields(&self) -> Ref<'_, Environment> {
        self.fields.borrow()
    }

    pub fn fields_mut(&self) -> RefMut<'_, Environment> {
        self.fields.borrow_mut()
    }

    /// True iff the class chain resolves `method` to one taking exactly
    /// `argument_count` parameters.
    pub fn has_method(&self, method: &str, argument_count: usize) -> bool {
        self.class
            .method(method)
            .is_some_and(|mth| mth.formal_params.len() == argument_count)
    }

    /// Invoke `method` with `self` bound to this instance.
    pub fn call(
        self: &Rc<Self>,
        method: &str,
        args: Vec<Value>,
        ctx: &mut dyn Context,
    ) -> ExecResult<Value> {
        let mth: &Method = match self.class.method(method) {
            Some(mth) if mth.formal_params.len() == args.len() => mth,
            _ => {
                debug!(
                    "No method {}/{} on class {}",
                    method,
                    args.len(),
                    self.class.name()
                );

                return Err(RuntimeError::NoSuchMethod {
                    class: self.class.name().to_string(),
                    method: method.to_string(),
                    arity: args.len(),
                });
            }
        };

        debug!("Calling {}.{} with {} argument(s)", self.class.name(), method, args.len());

        let mut closure: Environment = Environment::new();
        for (param, arg) in mth.formal_params.iter().zip(args) {
            closure.define(param, arg);
        }
        closure.define(SELF_NAME, Value::share(self));

        match mth.body.execute(&mut closure, ctx)? {
            Flow::Normal(value) => Ok(value),
            Flow::Return(_) => Err(RuntimeError::ReturnOutsideMethod),
        }
    }
}

// ───────────────────────── comparison semantics ────────────────────────────

/// Delegate a binary dunder to the left operand when it is an instance that
/// defines the one-argument method.
pub(crate) fn dispatch_binary(
    lhs: &Value,
    rhs: &Value,
    method: &str,
    ctx: &mut dyn Context,
) -> ExecResult<Option<Value>> {
    match lhs.as_instance()? {
        Some(instance) if instance.has_method(method, 1) => {
            instance.call(method, vec![rhs.clone()], ctx).map(Some)
        }
        _ => Ok(None),
    }
}

pub fn equal(lhs: &Value, rhs: &Value, ctx: &mut dyn Context) -> ExecResult<bool> {
    match (lhs, rhs) {
        (Value::None, Value::None) => return Ok(true),
        (Value::String(a), Value::String(b)) => return Ok(a == b),
        (Value::Number(a), Value::Number(b)) => return Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => return Ok(a == b),
        _ => {}
    }

    match dispatch_binary(lhs, rhs, EQ_METHOD, ctx)? {
        Some(result) => Ok(result.is_true()),
        None => Err(RuntimeError::NoComparison {
            lhs: lhs.type_name(),
            rhs: rhs.type_name(),
        }),
    }
}

pub fn less(lhs: &Value, rhs: &Value, ctx: &mut dyn Context) -> ExecResult<bool> {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => return Ok(a < b),
        (Value::Number(a), Value::Number(b)) => return Ok(a < b),
        (Value::Bool(a), Value::Bool(b)) => return Ok(a < b),
        _ => {}
    }

    let delegated: Option<Value> = if rhs.is_none() {
        None
    } else {
        dispatch_binary(lhs, rhs, LT_METHOD, ctx)?
    };

    match delegated {
        Some(result) => Ok(result.is_true()),
        None => Err(RuntimeError::NoComparison {
            lhs: lhs.type_name(),
            rhs: rhs.type_name(),
        }),
    }
}

pub fn not_equal(lhs: &Value, rhs: &Value, ctx: &mut dyn Context) -> ExecResult<bool> {
    Ok(!equal(lhs, rhs, ctx)?)
}

pub fn greater(lhs: &Value, rhs: &Value, ctx: &mut dyn Context) -> ExecResult<bool> {
    Ok(!less(lhs, rhs, ctx)? && !equal(lhs, rhs, ctx)?)
}

pub fn less_or_equal(lhs: &Value, rhs: &Value, ctx: &mut dyn Context) -> ExecResult<bool> {
    Ok(less(lhs, rhs, ctx)? || equal(lhs, rhs, ctx)?)
}

pub fn greater_or_equal(lhs: &Value, rhs: &Value, ctx: &mut dyn Context) -> ExecResult<bool> {
    Ok(!less(lhs, rhs, ctx)?)
}
