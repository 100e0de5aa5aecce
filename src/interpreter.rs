use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::callable::{Class, Function, Instance};
use crate::environment::{Env, Environment};
use crate::error::{LoxError, Result};
use crate::host::Host;
use crate::token::{Token, TokenType};
use crate::value::{self, Value};

/// How a statement finished.  `return` unwinds to the nearest call through
/// this signal rather than through the error channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Tree‑walking evaluator.  One instance lives for a whole session: its
/// global frame and resolved distances persist across units.
pub struct Interpreter<H: Host> {
    host: H,
    globals: Env,
    environment: Env,
    locals: HashMap<ExprId, usize>,
}

impl<H: Host> Interpreter<H> {
    /// Creates a new Interpreter and defines native functions such as `clock`.
    pub fn new(host: H) -> Self {
        info!("Initializing Interpreter");

        let globals: Env = Environment::new().into_env();

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock",
                arity: 0,
                func: value::clock,
            },
        );

        Self {
            host,
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Records that the expression `id` refers to a binding `depth` frames out.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Executes the statements of one unit in order, stopping at the first
    /// runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.execute(stmt)?;
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                let text: String = value.to_string();
                debug!("Printing value: {}", text);

                self.host.print(&text);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let frame = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, frame.into_env())
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function = Function::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Function(Rc::new(function)),
                );
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                debug!("Defining class '{}'", name.lexeme);

                let superclass: Option<Rc<Class>> = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Class(class) => Some(class),
                        _ => {
                            let at: &Token = match expr {
                                Expr::Variable { name, .. } => name,
                                _ => name,
                            };
                            return Err(LoxError::runtime(at, "Superclass must be a class."));
                        }
                    },
                    None => None,
                };

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Nil);

                let enclosing: Env = Rc::clone(&self.environment);

                if let Some(superclass) = &superclass {
                    let mut frame = Environment::with_enclosing(Rc::clone(&enclosing));
                    frame.define("super", Value::Class(Rc::clone(superclass)));
                    self.environment = frame.into_env();
                }

                let table: HashMap<String, Rc<Function>> = methods
                    .iter()
                    .map(|method| {
                        let function = Function::new(
                            Rc::clone(method),
                            Rc::clone(&self.environment),
                            method.name.lexeme == "init",
                        );
                        (method.name.lexeme.clone(), Rc::new(function))
                    })
                    .collect();

                let class = Class::new(name.lexeme.clone(), superclass, table);

                self.environment = enclosing;
                self.environment
                    .borrow_mut()
                    .assign(name, Value::Class(Rc::new(class)))?;

                Ok(Flow::Normal)
            }
        }
    }

    /// Runs `statements` inside `env`, restoring the current frame on every
    /// exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], env: Env) -> Result<Flow> {
        let previous: Env = std::mem::replace(&mut self.environment, env);

        let result = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        name,
                        value.clone(),
                    )?,
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                debug!("Assigned {} to '{}'", value, name.lexeme);
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                self.call(callee, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(
                    operator,
                    "Operand of '-' must be a number.",
                )),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(LoxError::runtime(
                operator,
                format!("Invalid unary operator '{}'.", operator.lexeme),
            )),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    operator,
                    "Operands of '+' must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Number(a * b))
            }

            // IEEE‑754: x / 0 is ±inf (or NaN), not an error.
            TokenType::SLASH => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => Err(LoxError::runtime(
                operator,
                format!("Invalid binary operator '{}'.", operator.lexeme),
            )),
        }
    }

    /// `super.method`: the superclass lives in the frame the resolver found
    /// `super` in, and `this` in the frame just inside it.
    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let distance: usize = *self.locals.get(&id).ok_or_else(|| {
            LoxError::runtime(keyword, "Can't use 'super' outside of a class.")
        })?;

        let superclass: Rc<Class> = match Environment::get_at(&self.environment, distance, keyword)? {
            Value::Class(class) => class,
            _ => return Err(LoxError::runtime(keyword, "Superclass must be a class.")),
        };

        let this_token = Token::synthetic("this", keyword.line);
        let instance = match Environment::get_at(
            &self.environment,
            distance.saturating_sub(1),
            &this_token,
        )? {
            Value::Instance(instance) => instance,
            _ => return Err(LoxError::runtime(keyword, "Can't use 'super' outside of a method.")),
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),
            None => Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    /// Invokes a callable (native, user function, bound method or class).
    fn call(&mut self, callee: Value, paren: &Token, arguments: Vec<Value>) -> Result<Value> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);

                check_arity(paren, arity, arguments.len())?;
                func(&arguments).map_err(|message| LoxError::runtime(paren, message))
            }

            Value::Function(function) => {
                check_arity(paren, function.arity(), arguments.len())?;
                self.call_function(&function, arguments)
            }

            Value::Class(class) => {
                check_arity(paren, class.arity(), arguments.len())?;
                self.instantiate(class, arguments)
            }

            other => Err(LoxError::runtime(
                paren,
                format!(
                    "Can only call functions and classes, not {} '{}'.",
                    other.type_name(),
                    other
                ),
            )),
        }
    }

    /// Runs a user function body in a fresh frame whose parent is the
    /// function's closure, not the caller's frame.
    fn call_function(&mut self, function: &Function, arguments: Vec<Value>) -> Result<Value> {
        let declaration = Rc::clone(function.declaration());
        debug!("Calling user-defined function '{}'", declaration.name.lexeme);

        let mut frame = Environment::with_enclosing(Rc::clone(function.closure()));
        for (param, argument) in declaration.params.iter().zip(arguments) {
            frame.define(&param.lexeme, argument);
        }

        let flow: Flow = self.execute_block(&declaration.body, frame.into_env())?;

        if function.is_initializer() {
            let this_token = Token::synthetic("this", declaration.name.line);
            return Environment::get_at(function.closure(), 0, &this_token);
        }

        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::Nil,
        })
    }

    /// Allocates an instance and runs the `init` found on the class chain,
    /// if any.  The instance is the result whatever `init` returns.
    fn instantiate(&mut self, class: Rc<Class>, arguments: Vec<Value>) -> Result<Value> {
        debug!("Instantiating class '{}'", class.name());

        let instance = Instance::new(Rc::clone(&class));

        if let Some(initializer) = class.find_method("init") {
            let bound: Function = initializer.bind(Rc::clone(&instance));
            self.call_function(&bound, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(
            operator,
            format!("Operands of '{}' must be numbers.", operator.lexeme),
        )),
    }
}

fn check_arity(paren: &Token, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(LoxError::runtime(
            paren,
            format!("Expected {} arguments but got {}.", expected, got),
        ));
    }

    Ok(())
}
