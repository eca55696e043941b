//! An interpreter for a small Lisp-like language.
//!
//! A [`Program`] holds a source text in memory. Running it parses one
//! top-level form at a time and evaluates it against a chain of
//! [`Environment`]s, stopping at the first error:
//!
//! ```
//! use std::{cell::RefCell, rc::Rc};
//! use wisp::{Program, RunOptions};
//!
//! let output = Rc::new(RefCell::new(Vec::<u8>::new()));
//! let program = Program::new(r#"(define greeting "Hello, world!") (display greeting)"#);
//! program.run(RunOptions::new().with_output(output.clone())).unwrap();
//!
//! assert_eq!(output.borrow().as_slice(), b"Hello, world!\n");
//! ```

mod builtin;
mod environment;
mod error;
mod interpreter;
mod parser;
mod program;
mod stack;
mod value;

#[cfg(test)]
mod test_utils;

pub use environment::Environment;
pub use error::{ErrorKind, Location, SyntaxErrorKind, WispError};
pub use interpreter::{EvaluationResult, Interpreter, SpecialForm};
pub use parser::{parse, Literal, Parser, Sexp};
pub use program::{Program, RunOptions, Sink};
pub use value::{Builtin, BuiltinResult, Repr, Value, ValueKind};
