//! Runtime values and the object model behind them: user functions, native
//! functions, classes and instances.
//!
//! Two capabilities cut across the variants:
//! - [`Callable`]: anything that can appear as a callee (`fun`, native, class).
//! - [`PropertyHolder`]: anything with `.name` access (instances, and classes
//!   through their static members).

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;

pub const INITIALIZER: &str = "init";

#[derive(Debug, Clone)]
pub enum Value<'a> {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Function(Rc<Function<'a>>),
    Native(Rc<NativeFunction<'a>>),
    Class(Rc<Class<'a>>),
    Instance(Rc<Instance<'a>>),
}

impl<'a> Value<'a> {
    /// `nil` and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_callable(&self) -> Option<&dyn Callable<'a>> {
        match self {
            Value::Function(function) => Some(function.as_ref()),
            Value::Native(native) => Some(native.as_ref()),
            Value::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_property_holder(&self) -> Option<&dyn PropertyHolder<'a>> {
        match self {
            Value::Instance(instance) => Some(instance),
            Value::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) | Value::Native(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }
}

/// Structural equality for plain data, identity for heap objects.
impl<'a> PartialEq for Value<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<'a> fmt::Display for Value<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    write!(f, "{}", buf.format(*n as i64))
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Function(function) => write!(f, "<fn {}>", function.declaration.display_name()),

            Value::Native(_) => write!(f, "<native fn>"),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.class.name),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Capabilities
// ─────────────────────────────────────────────────────────────────────────────

pub trait Callable<'a> {
    fn arity(&self) -> usize;

    /// Invoke with arguments already checked against [`Callable::arity`].
    fn call(&self, interpreter: &mut Interpreter<'a>, arguments: Vec<Value<'a>>) -> Result<Value<'a>>;
}

pub trait PropertyHolder<'a> {
    fn get(&self, name: &Token<'a>) -> Result<Value<'a>>;

    fn set(&self, name: &Token<'a>, value: Value<'a>);
}

fn undefined_property(name: &Token<'_>) -> LoxError {
    LoxError::runtime(name, format!("Undefined property '{}'.", name.lexeme))
}

// ─────────────────────────────────────────────────────────────────────────────
// User functions
// ─────────────────────────────────────────────────────────────────────────────

/// A function value: its declaration plus the environment it closes over.
pub struct Function<'a> {
    declaration: &'a FunctionDecl<'a>,
    closure: Rc<RefCell<Environment<'a>>>,
    is_initializer: bool,
}

impl<'a> Function<'a> {
    pub fn new(
        declaration: &'a FunctionDecl<'a>,
        closure: Rc<RefCell<Environment<'a>>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &'a str {
        self.declaration.display_name()
    }

    /// A copy of this function whose closure binds `this` to `receiver`.
    pub fn bind(&self, receiver: Value<'a>) -> Function<'a> {
        let environment = Environment::child_of(&self.closure);
        environment.borrow_mut().define("this", receiver);

        Function::new(self.declaration, environment, self.is_initializer)
    }
}

impl<'a> Callable<'a> for Function<'a> {
    fn arity(&self) -> usize {
        self.declaration.arity()
    }

    fn call(&self, interpreter: &mut Interpreter<'a>, arguments: Vec<Value<'a>>) -> Result<Value<'a>> {
        debug!("Calling user-defined function '{}'", self.name());

        let declaration: &'a FunctionDecl<'a> = self.declaration;
        let environment = Environment::child_of(&self.closure);

        for (param, argument) in declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(param.lexeme, argument);
        }

        let flow: Flow<'a> = interpreter.execute_block(&declaration.body, environment)?;

        if self.is_initializer {
            return Ok(Environment::get_at(&self.closure, 0, "this").unwrap_or(Value::Nil));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Nil),
        }
    }
}

impl<'a> fmt::Debug for Function<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.declaration.arity())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Native functions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct NativeFunction<'a> {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value<'a>]) -> Value<'a>,
}

impl<'a> Callable<'a> for NativeFunction<'a> {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter<'a>, arguments: Vec<Value<'a>>) -> Result<Value<'a>> {
        debug!("Calling native function '{}'", self.name);

        Ok((self.func)(&arguments))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classes
// ─────────────────────────────────────────────────────────────────────────────

pub struct Class<'a> {
    pub name: String,
    pub superclass: Option<Rc<Class<'a>>>,
    methods: HashMap<String, Rc<Function<'a>>>,
    static_methods: HashMap<String, Rc<Function<'a>>>,
    /// Fields set on the class object itself (`Class.x = …`).
    statics: RefCell<HashMap<String, Value<'a>>>,
}

impl<'a> Class<'a> {
    pub fn new(
        name: &str,
        superclass: Option<Rc<Class<'a>>>,
        methods: HashMap<String, Rc<Function<'a>>>,
        static_methods: HashMap<String, Rc<Function<'a>>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            superclass,
            methods,
            static_methods,
            statics: RefCell::new(HashMap::new()),
        }
    }

    /// Own methods first, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function<'a>>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }
}

impl<'a> Callable<'a> for Rc<Class<'a>> {
    fn arity(&self) -> usize {
        self.find_method(INITIALIZER).map_or(0, |init| init.arity())
    }

    fn call(&self, interpreter: &mut Interpreter<'a>, arguments: Vec<Value<'a>>) -> Result<Value<'a>> {
        debug!("Instantiating class '{}'", self.name);

        let instance = Value::Instance(Rc::new(Instance::new(Rc::clone(self))));

        if let Some(initializer) = self.find_method(INITIALIZER) {
            initializer
                .bind(instance.clone())
                .call(interpreter, arguments)?;
        }

        Ok(instance)
    }
}

/// Static members: flat lookup on the class itself, never inherited.
impl<'a> PropertyHolder<'a> for Rc<Class<'a>> {
    fn get(&self, name: &Token<'a>) -> Result<Value<'a>> {
        if let Some(value) = self.statics.borrow().get(name.lexeme) {
            return Ok(value.clone());
        }

        match self.static_methods.get(name.lexeme) {
            Some(method) => Ok(Value::Function(Rc::new(
                method.bind(Value::Class(Rc::clone(self))),
            ))),
            None => Err(undefined_property(name)),
        }
    }

    fn set(&self, name: &Token<'a>, value: Value<'a>) {
        self.statics
            .borrow_mut()
            .insert(name.lexeme.to_string(), value);
    }
}

impl<'a> fmt::Debug for Class<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field(
                "superclass",
                &self.superclass.as_ref().map(|superclass| &superclass.name),
            )
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("static_methods", &self.static_methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Instances
// ─────────────────────────────────────────────────────────────────────────────

pub struct Instance<'a> {
    pub class: Rc<Class<'a>>,
    fields: RefCell<HashMap<String, Value<'a>>>,
}

impl<'a> Instance<'a> {
    pub fn new(class: Rc<Class<'a>>) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }
}

/// Fields shadow methods; methods are bound afresh on every access.
impl<'a> PropertyHolder<'a> for Rc<Instance<'a>> {
    fn get(&self, name: &Token<'a>) -> Result<Value<'a>> {
        if let Some(value) = self.fields.borrow().get(name.lexeme) {
            return Ok(value.clone());
        }

        match self.class.find_method(name.lexeme) {
            Some(method) => Ok(Value::Function(Rc::new(
                method.bind(Value::Instance(Rc::clone(self))),
            ))),
            None => Err(undefined_property(name)),
        }
    }

    fn set(&self, name: &Token<'a>, value: Value<'a>) {
        self.fields
            .borrow_mut()
            .insert(name.lexeme.to_string(), value);
    }
}

impl<'a> fmt::Debug for Instance<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &self.fields.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}
