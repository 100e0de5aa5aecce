//! Session driver: runs one unit of source through scan → parse → resolve →
//! execute against state that persists between units.
//!
//! ```
//! use rox::host::Capture;
//! use rox::lox::Lox;
//!
//! let mut lox = Lox::new(Capture::default());
//! lox.run("var greeting = \"hello\";");
//! lox.run("print greeting;");
//!
//! assert_eq!(lox.host().output, vec!["hello"]);
//! ```

use log::{debug, info};

use crate::ast::Stmt;
use crate::error::LoxError;
use crate::host::Host;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

pub struct Lox<H: Host> {
    interpreter: Interpreter<H>,
    next_expr_id: usize,
}

impl<H: Host> Lox<H> {
    pub fn new(host: H) -> Self {
        Self {
            interpreter: Interpreter::new(host),
            next_expr_id: 0,
        }
    }

    pub fn host(&self) -> &H {
        self.interpreter.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.interpreter.host_mut()
    }

    /// Runs one complete unit of source.  Every diagnostic is reported to the
    /// host and also returned.  Static errors (lexical, syntax, resolution)
    /// prevent execution of the whole unit; a runtime error stops it where
    /// it occurs.
    pub fn run(&mut self, source: &str) -> Vec<LoxError> {
        let mut diagnostics: Vec<LoxError> = Vec::new();

        let statements: Vec<Stmt> = self.front_end(source, &mut diagnostics);

        if diagnostics.is_empty() {
            if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(&statements) {
                diagnostics.extend(errors);
            }
        }

        if diagnostics.is_empty() {
            info!("Executing {} statement(s)", statements.len());

            if let Err(e) = self.interpreter.interpret(&statements) {
                debug!("Runtime error on line {}", e.line());
                diagnostics.push(e);
            }
        }

        for diagnostic in &diagnostics {
            self.interpreter.host_mut().report(diagnostic);
        }

        diagnostics
    }

    /// Scans and parses, collecting lexical and syntax errors together.
    fn front_end(&mut self, source: &str, diagnostics: &mut Vec<LoxError>) -> Vec<Stmt> {
        let mut tokens: Vec<Token> = Vec::new();

        for item in Scanner::new(source) {
            match item {
                Ok(token) => tokens.push(token),
                Err(e) => diagnostics.push(e),
            }
        }

        let mut parser = Parser::starting_at(&tokens, self.next_expr_id);
        let parsed = parser.parse();
        self.next_expr_id = parser.next_id();

        match parsed {
            Ok(statements) => statements,
            Err(errors) => {
                diagnostics.extend(errors);
                Vec::new()
            }
        }
    }
}
