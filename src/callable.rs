//! Runtime object model: user functions (closures and bound methods),
//! classes, and instances.
//!
//! Calling is driven by the [`Interpreter`](crate::interpreter::Interpreter);
//! this module only knows how to build, bind, and look things up.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::environment::{Env, Environment};
use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// A user‑defined function or method paired with the frame it closes over.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: Env,
    is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Env, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    pub fn declaration(&self) -> &Rc<FunctionDecl> {
        &self.declaration
    }

    pub fn closure(&self) -> &Env {
        &self.closure
    }

    /// `true` for a class's `init` method, which always yields `this`.
    pub fn is_initializer(&self) -> bool {
        self.is_initializer
    }

    /// Specializes this method to `instance`: one new frame defining `this`,
    /// layered on the method's own closure.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let mut frame = Environment::with_enclosing(Rc::clone(&self.closure));
        frame.define("this", Value::Instance(instance));

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: frame.into_env(),
            is_initializer: self.is_initializer,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

/// A class: its own method table plus an optional, shared superclass.
pub struct Class {
    name: String,
    superclass: Option<Rc<Class>>,
    methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<Function>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<&Rc<Class>> {
        self.superclass.as_ref()
    }

    /// Searches this class, then each ancestor in turn.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        match self.methods.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self
                .superclass
                .as_ref()
                .and_then(|superclass| superclass.find_method(name)),
        }
    }

    /// Constructor arity: that of `init`, or zero without one.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.superclass() {
            Some(superclass) => write!(f, "<class {} < {}>", self.name, superclass.name),
            None => write!(f, "<class {}>", self.name),
        }
    }
}

pub struct Instance {
    class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Instance {
            class,
            fields: HashMap::new(),
        }))
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    /// Property lookup: fields shadow methods; a method found on the class
    /// chain is bound to `instance` on the way out.
    pub fn get(instance: &Rc<RefCell<Instance>>, name: &Token) -> Result<Value> {
        let (field, class) = {
            let this = instance.borrow();
            (this.fields.get(&name.lexeme).cloned(), Rc::clone(&this.class))
        };

        if let Some(value) = field {
            return Ok(value);
        }

        match class.find_method(&name.lexeme) {
            Some(method) => Ok(Value::Function(Rc::new(
                method.bind(Rc::clone(instance)),
            ))),
            None => Err(LoxError::runtime(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    /// Creates or overwrites a field.
    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} instance>", self.class.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, arity: usize) -> Rc<Function> {
        let params = (0..arity)
            .map(|i| Token::synthetic(&format!("p{}", i), 1))
            .collect();
        let declaration = FunctionDecl {
            name: Token::synthetic(name, 1),
            params,
            body: Vec::new(),
        };

        Rc::new(Function::new(
            Rc::new(declaration),
            Environment::new().into_env(),
            name == "init",
        ))
    }

    fn class(name: &str, superclass: Option<Rc<Class>>, methods: &[(&str, usize)]) -> Rc<Class> {
        let table = methods
            .iter()
            .map(|(m, arity)| (m.to_string(), method(m, *arity)))
            .collect();
        Rc::new(Class::new(name.to_string(), superclass, table))
    }

    #[test]
    fn find_method_walks_the_superclass_chain() {
        let base = class("Base", None, &[("greet", 0), ("init", 2)]);
        let derived = class("Derived", Some(Rc::clone(&base)), &[("greet", 1)]);

        assert_eq!(derived.find_method("greet").map(|m| m.arity()), Some(1));
        assert!(derived.find_method("init").is_some());
        assert!(derived.find_method("missing").is_none());
        assert_eq!(derived.arity(), 2);
        assert_eq!(class("Bare", None, &[]).arity(), 0);
        assert_eq!(format!("{:?}", derived), "<class Derived < Base>");
    }

    #[test]
    fn fields_shadow_methods_and_methods_are_bound() {
        let point = class("Point", None, &[("norm", 0)]);
        let instance = Instance::new(Rc::clone(&point));
        let norm = Token::synthetic("norm", 1);

        match Instance::get(&instance, &norm) {
            Ok(Value::Function(bound)) => {
                let this = Token::synthetic("this", 1);
                let found = Environment::get_at(bound.closure(), 0, &this);
                assert!(matches!(found, Ok(Value::Instance(i)) if Rc::ptr_eq(&i, &instance)));
            }
            other => panic!("expected bound method, got {:?}", other),
        }

        instance.borrow_mut().set(&norm, Value::Number(1.0));
        assert_eq!(Instance::get(&instance, &norm).unwrap(), Value::Number(1.0));

        let missing = Instance::get(&instance, &Token::synthetic("nope", 3)).unwrap_err();
        assert_eq!(missing.to_string(), "Undefined property 'nope'.\n[line 3]");
    }
}
