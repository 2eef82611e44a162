use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{ClassDecl, Expr, ExprId, LiteralValue, Stmt};
use crate::environment::{self, Environment};
use crate::error::{Diagnostics, LoxError, Result};
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use crate::value::{Class, Function, NativeFunction, Value, INITIALIZER};

/// How a statement finished. `Return`, `Break` and `Continue` unwind to the
/// nearest function call or loop, passing through every block on the way.
#[derive(Debug, Clone)]
pub enum Flow<'a> {
    Normal,
    Return(Value<'a>),
    Break,
    Continue,
}

/// Nested calls allowed before a call fails with "Stack overflow.".
pub const MAX_CALL_DEPTH: usize = 4096;

pub struct Interpreter<'a> {
    globals: Rc<RefCell<Environment<'a>>>,
    environment: Rc<RefCell<Environment<'a>>>,
    /// Resolver output: hops from the use site to the declaring scope.
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
    call_depth: usize,
}

impl<'a> Default for Interpreter<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Interpreter<'a> {
    /// Creates an interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an interpreter whose `print` output goes to `out`, with native
    /// functions such as `clock` defined in the globals.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::Native(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: clock,
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
            call_depth: 0,
        }
    }

    /// Binding sink for the resolver.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        debug!("Noting {:?} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    pub fn resolved_depth(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Interprets a list of statements (a "program"). A runtime error aborts
    /// the top‑level statement it occurred in; it is reported and execution
    /// moves on to the next one.
    pub fn interpret(&mut self, statements: &'a [Stmt<'a>], diagnostics: &mut Diagnostics) {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Err(e) = self.execute(stmt) {
                debug!("Runtime debug: {}", e);
                diagnostics.report(e);
            }
        }

        if let Err(e) = self.out.flush() {
            diagnostics.report(LoxError::from(e));
        }

        info!("Interpretation completed");
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &'a Stmt<'a>) -> Result<Flow<'a>> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &'a Stmt<'a>) -> Result<Flow<'a>> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Variable '{}' defined with value: {}", name.lexeme, value);
                self.environment.borrow_mut().define(name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment = Environment::child_of(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While {
                condition,
                body,
                increment,
            } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }

                    if let Some(increment) = increment {
                        self.evaluate(increment)?;
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Break(_) => Ok(Flow::Break),

            Stmt::Continue(_) => Ok(Flow::Continue),

            Stmt::Function(declaration) => {
                let name: &str = declaration.display_name();
                debug!("Defining function '{}'", name);
                let function = Function::new(declaration, Rc::clone(&self.environment), false);
                self.environment
                    .borrow_mut()
                    .define(name, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(e) => self.evaluate(e)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class(declaration) => {
                self.execute_class(declaration)?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Runs `statements` inside `environment`, restoring the previous
    /// environment however the block exits.
    pub fn execute_block(
        &mut self,
        statements: &'a [Stmt<'a>],
        environment: Rc<RefCell<Environment<'a>>>,
    ) -> Result<Flow<'a>> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = self.execute_all(statements);
        self.environment = previous;

        result
    }

    fn execute_all(&mut self, statements: &'a [Stmt<'a>]) -> Result<Flow<'a>> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                signal => return Ok(signal),
            }
        }

        Ok(Flow::Normal)
    }

    fn execute_class(&mut self, declaration: &'a ClassDecl<'a>) -> Result<()> {
        debug!("Defining class '{}'", declaration.name.lexeme);

        let superclass: Option<Rc<Class<'a>>> = match &declaration.superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let at: &Token<'a> = match expr {
                        Expr::Variable { name, .. } => *name,
                        _ => declaration.name,
                    };
                    return Err(LoxError::runtime(at, "Superclass must be a class."));
                }
            },
            None => None,
        };

        // Two‑phase: the name exists (as nil) while methods capture scope.
        self.environment
            .borrow_mut()
            .define(declaration.name.lexeme, Value::Nil);

        let enclosing = superclass.as_ref().map(|superclass| {
            let environment = Environment::child_of(&self.environment);
            environment
                .borrow_mut()
                .define("super", Value::Class(Rc::clone(superclass)));
            std::mem::replace(&mut self.environment, environment)
        });

        let methods: HashMap<String, Rc<Function<'a>>> = declaration
            .methods
            .iter()
            .map(|method| {
                let name: &str = method.display_name();
                let function = Function::new(
                    method,
                    Rc::clone(&self.environment),
                    name == INITIALIZER,
                );
                (name.to_string(), Rc::new(function))
            })
            .collect();

        let static_methods: HashMap<String, Rc<Function<'a>>> = declaration
            .static_methods
            .iter()
            .map(|method| {
                let function = Function::new(method, Rc::clone(&self.environment), false);
                (method.display_name().to_string(), Rc::new(function))
            })
            .collect();

        if let Some(previous) = enclosing {
            self.environment = previous;
        }

        let class = Class::new(declaration.name.lexeme, superclass, methods, static_methods);

        self.environment
            .borrow_mut()
            .assign(declaration.name, Value::Class(Rc::new(class)))?;

        info!("Class '{}' defined", declaration.name.lexeme);

        Ok(())
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.resolved_depth(*id) {
                    Some(depth) => {
                        if !Environment::assign_at(&self.environment, depth, name.lexeme, value.clone())
                        {
                            return Err(environment::undefined(name));
                        }
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;

                let decided: bool = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if decided {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;

                let mut arg_values: Vec<Value<'a>> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.invoke_callable(&callee_val, paren, arg_values)
            }

            Expr::Function(declaration) => Ok(Value::Function(Rc::new(Function::new(
                declaration,
                Rc::clone(&self.environment),
                false,
            )))),

            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;

                match object.as_property_holder() {
                    Some(holder) => holder.get(name),
                    None => Err(LoxError::runtime(name, "Only instances have properties.")),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(object)?;

                if object.as_property_holder().is_none() {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                }

                let value = self.evaluate(value)?;

                if let Some(holder) = object.as_property_holder() {
                    holder.set(name, value.clone());
                }

                Ok(value)
            }

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    /// Resolved references read exactly `depth` scopes out; unresolved ones
    /// go straight to the globals.
    fn look_up_variable(&self, id: ExprId, name: &Token<'a>) -> Result<Value<'a>> {
        match self.resolved_depth(id) {
            Some(depth) => Environment::get_at(&self.environment, depth, name.lexeme)
                .ok_or_else(|| environment::undefined(name)),
            None => self.globals.borrow().get(name),
        }
    }

    fn evaluate_super(
        &mut self,
        id: ExprId,
        keyword: &Token<'a>,
        method: &Token<'a>,
    ) -> Result<Value<'a>> {
        let depth: usize = self
            .resolved_depth(id)
            .ok_or_else(|| LoxError::runtime(keyword, "Can't use 'super' outside of a class."))?;

        let superclass = match Environment::get_at(&self.environment, depth, "super") {
            Some(Value::Class(class)) => class,
            _ => return Err(LoxError::runtime(keyword, "Superclass must be a class.")),
        };

        // `this` lives in the scope just inside the one binding `super`.
        let receiver: Value<'a> = depth
            .checked_sub(1)
            .and_then(|d| Environment::get_at(&self.environment, d, "this"))
            .ok_or_else(|| LoxError::runtime(keyword, "Can't use 'super' outside of a method."))?;

        match superclass.find_method(method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(receiver)))),
            None => Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(&mut self, op: &Token<'a>, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        let right_val = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(op, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(LoxError::runtime(op, "Invalid unary operator.")),
        }
    }

    /// Evaluates a binary expression.
    fn evaluate_binary(
        &mut self,
        left: &'a Expr<'a>,
        op: &Token<'a>,
        right: &'a Expr<'a>,
    ) -> Result<Value<'a>> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        debug!(
            "Binary '{}': {} ({}), {} ({})",
            op.lexeme,
            left_val,
            left_val.type_name(),
            right_val,
            right_val.type_name()
        );

        match op.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    op,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                if b == 0.0 {
                    return Err(LoxError::runtime(op, "Division by zero."));
                }
                Ok(Value::Number(a / b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            TokenType::LESS => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a >= b))
            }

            _ => Err(LoxError::runtime(op, "Invalid binary operator.")),
        }
    }

    /// Invokes a callable (function, native or class).
    fn invoke_callable(
        &mut self,
        callee_val: &Value<'a>,
        paren_token: &Token<'a>,
        arg_values: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        let Some(callable) = callee_val.as_callable() else {
            return Err(LoxError::runtime(
                paren_token,
                "Can only call functions and classes.",
            ));
        };

        if arg_values.len() != callable.arity() {
            return Err(LoxError::runtime(
                paren_token,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arg_values.len()
                ),
            ));
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(LoxError::runtime(paren_token, "Stack overflow."));
        }

        self.call_depth += 1;
        let result = callable.call(self, arg_values);
        self.call_depth -= 1;

        let result = result?;
        debug!("Call returned: {}", result);

        Ok(result)
    }
}

/// Milliseconds since the Unix epoch.
fn clock<'a>(_args: &[Value<'a>]) -> Value<'a> {
    Value::Number(chrono::Utc::now().timestamp_millis() as f64)
}

fn number_operands(op: &Token<'_>, left: &Value<'_>, right: &Value<'_>) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(op, "Operands must be numbers.")),
    }
}
