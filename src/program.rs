use std::{
    cell::RefCell,
    fs,
    io::{self, Read, Write},
    path::Path,
    rc::Rc,
};

use crate::{
    builtin::builtin_environment,
    error::WispError,
    interpreter::{Interpreter, SpecialForm},
    parser::Parser,
    value::{Builtin, BuiltinResult, Value},
};

/// Destination for everything a program writes, shared by `display` and the
/// printing of call results.
pub type Sink = Rc<RefCell<dyn Write>>;

/// Configuration for a single [`Program::run`].
#[derive(Clone, Default)]
pub struct RunOptions {
    output: Option<Sink>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirects program output, which goes to standard output by default.
    pub fn with_output(mut self, output: Sink) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_writer(self, writer: impl Write + 'static) -> Self {
        self.with_output(Rc::new(RefCell::new(writer)))
    }
}

/// A program read into memory, ready to run once.
///
/// Running registers the builtins into a fresh root environment, then parses
/// and evaluates the top-level forms in order. Whenever a call at the top level
/// returns a value, its print form is written to the output. The first error
/// stops the run.
pub struct Program {
    source: String,
    interpreter: Interpreter,
    builtins: Vec<Builtin>,
}

impl Program {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into(), interpreter: Interpreter::new(), builtins: Vec::new() }
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, WispError> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        Ok(Self::new(source))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, WispError> {
        Ok(Self::new(fs::read_to_string(path)?))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Makes a host function available to the program under `name`,
    /// replacing a standard builtin of the same name.
    pub fn register_builtin(&mut self, name: &str, function: impl Fn(Vec<Value>) -> BuiltinResult + 'static) {
        self.builtins.push(Builtin::new(name, function));
    }

    pub fn register_special_form(&mut self, name: &'static str, form: SpecialForm) {
        self.interpreter.register(name, form);
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(self, options: RunOptions) -> Result<(), WispError> {
        let sink: Sink = match options.output {
            Some(output) => output,
            None => Rc::new(RefCell::new(io::stdout())),
        };

        let mut environment = builtin_environment(&sink);
        for builtin in self.builtins {
            let name = builtin.name().to_owned();
            environment.set(name, Value::Function(builtin));
        }
        tracing::debug!(bytes = self.source.len(), "running program");

        let result = Parser::new(&self.source).try_for_each(|form| -> Result<(), WispError> {
            let form = form?;
            tracing::debug!(%form, "evaluating");

            if let Some(value) = self.interpreter.evaluate_form(&form, &mut environment)? {
                writeln!(sink.borrow_mut(), "{}", value)?;
            }
            Ok(())
        });

        match result.and_then(|()| sink.borrow_mut().flush().map_err(WispError::from)) {
            Ok(()) => {
                tracing::debug!("program finished");
                Ok(())
            }
            Err(error) => {
                tracing::debug!(%error, "program failed");
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;
    use pretty_assertions::assert_eq;

    use crate::{
        environment::Environment,
        error::ErrorKind,
        interpreter::EvaluationResult,
        parser::Sexp,
        test_utils::{all_testcases, load_testcase, run_source},
    };

    use super::*;

    #[test]
    fn run_testcases() -> anyhow::Result<()> {
        let testcases = all_testcases()?;
        if testcases.is_empty() {
            bail!("No testcases found");
        }

        for name in testcases {
            println!("Running testcase {}", name);
            let (source, expected) = load_testcase(&name)?;
            let (output, result) = run_source(Program::new(source));

            assert_eq!(output, expected.output, "Testcase {}: output", name);
            assert_eq!(result.err().map(|error| error.kind()), expected.error, "Testcase {}: error", name);
        }

        Ok(())
    }

    #[test]
    fn hello_world() {
        let (output, result) = run_source(Program::new(r#"(display "Hello, world!")"#));
        assert!(result.is_ok());
        assert_eq!(output, "Hello, world!\n");
    }

    #[test]
    fn reads_the_whole_source() -> anyhow::Result<()> {
        let program = Program::from_reader("(define foo \"Hello, world!\")\n(display foo)\n".as_bytes())?;
        assert_eq!(program.source(), "(define foo \"Hello, world!\")\n(display foo)\n");

        let (output, result) = run_source(program);
        assert!(result.is_ok());
        assert_eq!(output, "Hello, world!\n");
        Ok(())
    }

    #[test]
    fn loading_a_missing_file_fails() {
        let error = Program::load("/nonexistent/program.wisp").err().map(|error| error.kind());
        assert_eq!(error, Some(ErrorKind::IoError));
    }

    #[test]
    fn deeply_nested_calls() {
        let depth = 3_000;
        let expected = format!("{}x{}\n", "(".repeat(depth), ")".repeat(depth));

        let (output, result) = run_source(Program::new(format!("{}\"x\"{}", "(list ".repeat(depth), ")".repeat(depth))));
        assert!(result.is_ok());
        assert_eq!(output, expected);

        let source = format!("(define deep {}\"x\"{}) (display deep)", "(list ".repeat(depth), ")".repeat(depth));
        let (output, result) = run_source(Program::new(source));
        assert!(result.is_ok());
        assert_eq!(output, expected);
    }

    #[test]
    fn host_builtins_join_the_root_environment() {
        let mut program = Program::new(r#"(shout "hey") (display (shout "you"))"#);
        program.register_builtin("shout", |values| {
            let text = values.first().map(Value::as_str).transpose()?.unwrap_or_default();
            Ok(Some(Value::from(text.to_uppercase())))
        });

        let (output, result) = run_source(program);
        assert!(result.is_ok());
        assert_eq!(output, "HEY\nYOU\n");
    }

    #[test]
    fn host_builtin_errors_abort_the_run() {
        let mut program = Program::new(r#"(display "before") (fail) (display "after")"#);
        program.register_builtin("fail", |values| Err(WispError::arity("fail", "1", values.len())));

        let (output, result) = run_source(program);
        assert_eq!(output, "before\n");
        assert_eq!(result.err().map(|error| error.to_string()).as_deref(), Some("fail: expected 1 arguments, got 0"));
    }

    #[test]
    fn host_special_forms() {
        fn evaluate_begin(interpreter: &Interpreter, environment: &mut Environment<'_>, list: &[Sexp<'_>]) -> EvaluationResult {
            let mut result = None;
            for sexp in list {
                result = interpreter.evaluate_form(sexp, environment)?;
            }
            Ok(result)
        }

        let mut program = Program::new(r#"(begin (define x "a") (display x) (list x))"#);
        program.register_special_form("begin", evaluate_begin);

        let (output, result) = run_source(program);
        assert!(result.is_ok());
        assert_eq!(output, "a\n(a)\n");
    }

    #[test]
    fn writer_output() {
        struct Shared(Rc<RefCell<String>>);

        impl Write for Shared {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.borrow_mut().push_str(&String::from_utf8_lossy(buf));
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let text = Rc::new(RefCell::new(String::new()));
        let options = RunOptions::new().with_writer(Shared(text.clone()));
        Program::new(r#"(list "x" (list))"#).run(options).unwrap();

        assert_eq!(*text.borrow(), "(x ())\n");
    }
}
