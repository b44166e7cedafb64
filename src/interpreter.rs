use std::io::Write;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{BinaryOp, Comparator, Statement, VariableValue};
use crate::environment::Environment;
use crate::error::{ExecResult, Result, RuntimeError};
use crate::parser::Parser;
use crate::value::{self, Context, Instance, InstanceRef, Value, ADD_METHOD, INIT_METHOD, SELF_NAME};

/// Outcome of executing one node.  `Return` unwinds enclosing statements
/// until the nearest [`Statement::MethodBody`] turns it back into a value.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal(Value),
    Return(Value),
}

impl Statement {
    /// Execute this node in `env`.
    pub fn execute(&self, env: &mut Environment, ctx: &mut dyn Context) -> ExecResult<Flow> {
        match self {
            Statement::Compound(statements) => {
                for stmt in statements {
                    if let flow @ Flow::Return(_) = stmt.execute(env, ctx)? {
                        return Ok(flow);
                    }
                }

                Ok(Flow::Normal(Value::None))
            }

            Statement::Return(value) => {
                let value: Value = value.evaluate(env, ctx)?;
                debug!("Returning {}", value.type_name());

                Ok(Flow::Return(value))
            }

            Statement::IfElse {
                condition,
                if_body,
                else_body,
            } => {
                if condition.evaluate(env, ctx)?.is_true() {
                    debug!("Condition is truthy; executing if branch");
                    if_body.execute(env, ctx)
                } else if let Some(else_body) = else_body {
                    debug!("Condition is falsy; executing else branch");
                    else_body.execute(env, ctx)
                } else {
                    Ok(Flow::Normal(Value::None))
                }
            }

            Statement::MethodBody(body) => match body.execute(env, ctx)? {
                Flow::Return(value) => Ok(Flow::Normal(value)),
                Flow::Normal(_) => Ok(Flow::Normal(Value::None)),
            },

            expr => expr.evaluate_expression(env, ctx).map(Flow::Normal),
        }
    }

    /// Execute a node in expression position.  A `return` can never surface
    /// here in a well-formed tree.
    pub fn evaluate(&self, env: &mut Environment, ctx: &mut dyn Context) -> ExecResult<Value> {
        match self.execute(env, ctx)? {
            Flow::Normal(value) => Ok(value),
            Flow::Return(_) => Err(RuntimeError::ReturnOutsideMethod),
        }
    }

    fn evaluate_expression(&self, env: &mut Environment, ctx: &mut dyn Context) -> ExecResult<Value> {
        match self {
            Statement::Constant(value) => Ok(value.clone()),

            Statement::Assignment { name, value } => {
                let value: Value = value.evaluate(env, ctx)?;
                debug!("Assigning {} to '{}'", value.type_name(), name);
                env.define(name, value.clone());

                Ok(value)
            }

            Statement::VariableValue(var) => resolve(var, env),

            Statement::Print(args) => {
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        ctx.output().write_all(b" ")?;
                    }

                    let text: String = arg.evaluate(env, ctx)?.render(ctx)?;
                    ctx.output().write_all(text.as_bytes())?;
                }

                ctx.output().write_all(b"\n")?;

                Ok(Value::None)
            }

            Statement::MethodCall {
                object,
                method,
                args,
            } => {
                // Receiver, then every argument, and only then the type check.
                let receiver: Value = object.evaluate(env, ctx)?;
                let args: Vec<Value> = evaluate_all(args, env, ctx)?;

                let instance: Rc<Instance> = receiver.as_instance()?.ok_or_else(|| {
                    RuntimeError::NotAnInstance {
                        context: format!("call of method '{}'", method),
                        kind: receiver.type_name(),
                    }
                })?;

                instance.call(method, args, ctx)
            }

            Statement::NewInstance { class, args } => {
                debug!("Creating instance of {}", class.name());

                let instance: Rc<Instance> = Rc::new(Instance::new(Rc::clone(class)));
                instance
                    .fields_mut()
                    .define(SELF_NAME, Value::share(&instance));

                if instance.has_method(INIT_METHOD, args.len()) {
                    let args: Vec<Value> = evaluate_all(args, env, ctx)?;
                    instance.call(INIT_METHOD, args, ctx)?;
                }

                Ok(Value::Instance(InstanceRef::Owned(instance)))
            }

            Statement::Stringify(arg) => {
                let text: String = arg.evaluate(env, ctx)?.render(ctx)?;

                Ok(Value::string(text))
            }

            Statement::Binary { op, lhs, rhs } => {
                let lhs: Value = lhs.evaluate(env, ctx)?;
                let rhs: Value = rhs.evaluate(env, ctx)?;

                arithmetic(*op, &lhs, &rhs, ctx)
            }

            // No short-circuit: both operands always run.
            Statement::Or(lhs, rhs) => {
                let lhs: bool = lhs.evaluate(env, ctx)?.is_true();
                let rhs: bool = rhs.evaluate(env, ctx)?.is_true();

                Ok(Value::Bool(lhs || rhs))
            }

            Statement::And(lhs, rhs) => {
                let lhs: bool = lhs.evaluate(env, ctx)?.is_true();
                let rhs: bool = rhs.evaluate(env, ctx)?.is_true();

                Ok(Value::Bool(lhs && rhs))
            }

            Statement::Not(arg) => Ok(Value::Bool(!arg.evaluate(env, ctx)?.is_true())),

            Statement::Comparison { cmp, lhs, rhs } => {
                let lhs: Value = lhs.evaluate(env, ctx)?;
                let rhs: Value = rhs.evaluate(env, ctx)?;

                cmp.apply(&lhs, &rhs, ctx).map(Value::Bool)
            }

            Statement::ClassDefinition(class) => {
                debug!("Defining class {}", class.name());

                let value: Value = Value::Class(Rc::clone(class));
                env.define(class.name(), value.clone());

                Ok(value)
            }

            Statement::FieldAssignment {
                object,
                field,
                value,
            } => {
                let target: Value = resolve(object, env)?;
                let instance: Rc<Instance> = target.as_instance()?.ok_or_else(|| {
                    RuntimeError::NotAnInstance {
                        context: format!("assignment to field '{}'", field),
                        kind: target.type_name(),
                    }
                })?;

                let value: Value = value.evaluate(env, ctx)?;
                debug!("Setting field '{}' to {}", field, value.type_name());
                instance.fields_mut().define(field, value.clone());

                Ok(value)
            }

            Statement::Compound(_)
            | Statement::Return(_)
            | Statement::IfElse { .. }
            | Statement::MethodBody(_) => self.evaluate(env, ctx),
        }
    }
}

fn evaluate_all(
    args: &[Statement],
    env: &mut Environment,
    ctx: &mut dyn Context,
) -> ExecResult<Vec<Value>> {
    args.iter().map(|arg| arg.evaluate(env, ctx)).collect()
}

/// Walk a dotted path: the head comes from `env`, every further segment from
/// the field table of the instance reached so far.
fn resolve(var: &VariableValue, env: &Environment) -> ExecResult<Value> {
    let mut ids = var.dotted_ids.iter();

    let Some(head) = ids.next() else {
        return Err(RuntimeError::NameNotFound(String::new()));
    };

    let mut value: Value = env.get(head)?;

    for id in ids {
        let instance: Rc<Instance> = value.as_instance()?.ok_or_else(|| {
            RuntimeError::NotAnInstance {
                context: format!("access to field '{}'", id),
                kind: value.type_name(),
            }
        })?;

        let next: Value = instance.fields().get(id)?;
        value = next;
    }

    value.promote()
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value, ctx: &mut dyn Context) -> ExecResult<Value> {
    if let (Value::Number(a), Value::Number(b)) = (lhs, rhs) {
        let result: Option<i64> = match op {
            BinaryOp::Add => a.checked_add(*b),
            BinaryOp::Sub => a.checked_sub(*b),
            BinaryOp::Mult => a.checked_mul(*b),
            BinaryOp::Div => {
                if *b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }

                a.checked_div(*b)
            }
        };

        return result
            .map(Value::Number)
            .ok_or(RuntimeError::IntegerOverflow { op: op.symbol() });
    }

    if op != BinaryOp::Add {
        return Err(RuntimeError::NoSuchOperation {
            op: op.symbol(),
            lhs: lhs.type_name(),
            rhs: rhs.type_name(),
        });
    }

    if let (Value::String(a), Value::String(b)) = (lhs, rhs) {
        return Ok(Value::string(format!("{}{}", a, b)));
    }

    value::dispatch_binary(lhs, rhs, ADD_METHOD, ctx)?.ok_or(RuntimeError::NoAddOperation {
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    })
}

impl Comparator {
    /// Apply the predicate to two evaluated operands.
    pub fn apply(self, lhs: &Value, rhs: &Value, ctx: &mut dyn Context) -> ExecResult<bool> {
        match self {
            Comparator::Equal => value::equal(lhs, rhs, ctx),
            Comparator::NotEqual => value::not_equal(lhs, rhs, ctx),
            Comparator::Less => value::less(lhs, rhs, ctx),
            Comparator::Greater => value::greater(lhs, rhs, ctx),
            Comparator::LessOrEqual => value::less_or_equal(lhs, rhs, ctx),
            Comparator::GreaterOrEqual => value::greater_or_equal(lhs, rhs, ctx),
        }
    }
}

/// Top-level runner owning the global scope.
#[derive(Debug, Default)]
pub struct Interpreter {
    globals: Environment,
}

impl Interpreter {
    pub fn new() -> Self {
        info!("Initializing Interpreter");

        Self {
            globals: Environment::new(),
        }
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Execute a program tree against the global scope.
    pub fn run(&mut self, program: &Statement, ctx: &mut dyn Context) -> ExecResult<Value> {
        info!("Running program");

        match program.execute(&mut self.globals, ctx)? {
            Flow::Normal(value) => {
                info!("Program executed successfully");
                Ok(value)
            }
            Flow::Return(_) => Err(RuntimeError::ReturnOutsideMethod),
        }
    }

    /// Tokenize, parse and run `source`.
    pub fn run_source(&mut self, source: &str, ctx: &mut dyn Context) -> Result<Value> {
        let program: Statement = Parser::new(source)?.parse()?;
        let value: Value = self.run(&program, ctx)?;
        ctx.output().flush()?;

        Ok(value)
    }
}
