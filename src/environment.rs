use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope frame.  Frames are shared by every closure
/// created while they were active, so they live as long as the longest holder.
pub type Env = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Env>,
}

impl Environment {
    /// A frame with no parent: the global scope.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Env) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn into_env(self) -> Env {
        Rc::new(RefCell::new(self))
    }

    /// Binds `name` in this frame only, overwriting any previous binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Looks `name` up in this frame, then each enclosing frame in turn.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Assigns to the nearest frame holding `name`; never creates a binding.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Reads `name` from the frame exactly `distance` links out of `env`.
    pub fn get_at(env: &Env, distance: usize, name: &Token) -> Result<Value> {
        let frame: Env = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        let value = frame.borrow().values.get(&name.lexeme).cloned();

        value.ok_or_else(|| undefined(name))
    }

    /// Writes `name` in the frame exactly `distance` links out of `env`.
    pub fn assign_at(env: &Env, distance: usize, name: &Token, value: Value) -> Result<()> {
        let frame: Env = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name)),
        }
    }

    fn ancestor(env: &Env, distance: usize) -> Option<Env> {
        let mut frame: Env = Rc::clone(env);

        for _ in 0..distance {
            let parent: Env = frame.borrow().enclosing.clone()?;
            frame = parent;
        }

        Some(frame)
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::{Env, Environment};
    use crate::token::Token;
    use crate::value::Value;

    fn name(lexeme: &str) -> Token {
        Token::synthetic(lexeme, 1)
    }

    #[test]
    fn test_define_and_get() {
        let mut env = Environment::new();
        env.define("foo", Value::String("bar".into()));
        env.define("baz", Value::Bool(false));

        assert_eq!(env.get(&name("foo")).unwrap(), Value::String("bar".into()));
        assert_eq!(env.get(&name("baz")).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_redefine_overwrites() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));
        env.define("a", Value::Number(2.0));

        assert_eq!(env.get(&name("a")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_assign_never_creates() {
        let mut env = Environment::new();

        let err = env.assign(&name("foo"), Value::Nil).unwrap_err();
        assert!(err.is_runtime());
        assert!(err.to_string().contains("Undefined variable 'foo'."));
        assert!(env.get(&name("foo")).is_err());
    }

    #[test]
    fn test_assign_walks_enclosing() {
        let outer: Env = Environment::new().into_env();
        outer.borrow_mut().define("x", Value::Number(1.0));

        let inner: Env = Environment::with_enclosing(outer.clone()).into_env();
        inner
            .borrow_mut()
            .assign(&name("x"), Value::Number(5.0))
            .unwrap();

        assert_eq!(outer.borrow().get(&name("x")).unwrap(), Value::Number(5.0));
    }

    #[test]
    fn test_multi_level() {
        let env1: Env = Environment::new().into_env();
        env1.borrow_mut().define("foo", Value::String("bar".into()));

        {
            let env2: Env = Environment::with_enclosing(env1.clone()).into_env();
            env2.borrow_mut()
                .define("foo", Value::String("foofoo".into()));

            assert_eq!(
                Environment::get_at(&env2, 0, &name("foo")).unwrap(),
                Value::String("foofoo".into())
            );
            assert_eq!(
                Environment::get_at(&env2, 1, &name("foo")).unwrap(),
                Value::String("bar".into())
            );

            Environment::assign_at(&env2, 1, &name("foo"), Value::Bool(false)).unwrap();
        }

        assert_eq!(env1.borrow().get(&name("foo")).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_get_at_checks_only_one_frame() {
        let env1: Env = Environment::new().into_env();
        env1.borrow_mut().define("only_outer", Value::Nil);
        let env2: Env = Environment::with_enclosing(env1).into_env();

        assert!(Environment::get_at(&env2, 0, &name("only_outer")).is_err());
        assert!(Environment::get_at(&env2, 5, &name("only_outer")).is_err());
    }
}
