use std::collections::HashMap;

use crate::{
    environment::Environment,
    error::WispError,
    parser::{Literal, Sexp},
    stack::ensure_sufficient_stack,
    value::Value,
};

pub type EvaluationResult = Result<Option<Value>, WispError>;

/// Handler for a special form. It receives the unevaluated arguments of the
/// form and the environment that is active where the form appears.
pub type SpecialForm = fn(&Interpreter, &mut Environment<'_>, &[Sexp<'_>]) -> EvaluationResult;

/// Evaluates sexps against an environment.
///
/// Special forms are looked up in a table owned by each interpreter, so two
/// interpreters can run with different sets of forms.
#[derive(Clone)]
pub struct Interpreter {
    special_forms: HashMap<&'static str, SpecialForm>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter with the standard special forms, `define` and `let`.
    pub fn new() -> Self {
        let mut interpreter = Self::empty();
        interpreter.register("define", evaluate_define);
        interpreter.register("let", evaluate_let);
        interpreter
    }

    pub fn empty() -> Self {
        Self { special_forms: HashMap::new() }
    }

    pub fn register(&mut self, name: &'static str, form: SpecialForm) {
        self.special_forms.insert(name, form);
    }

    pub fn is_special_form(&self, name: &str) -> bool {
        self.special_forms.contains_key(name)
    }

    /// Evaluates a top-level form. Bare atoms are accepted and do nothing.
    pub fn evaluate_form(&self, sexp: &Sexp<'_>, environment: &mut Environment<'_>) -> EvaluationResult {
        match sexp {
            Sexp::Atom(_) => Ok(None),
            Sexp::Expression(expression) => self.evaluate_expression(expression, environment),
        }
    }

    /// Evaluates an expression that must produce a value, such as the
    /// argument of a call.
    pub fn evaluate(&self, sexp: &Sexp<'_>, environment: &mut Environment<'_>) -> Result<Value, WispError> {
        match sexp {
            Sexp::Atom(literal) => evaluate_atom(literal, environment),
            Sexp::Expression(expression) => self
                .evaluate_expression(expression, environment)?
                .ok_or_else(|| WispError::type_mismatch(sexp.to_string(), "a value", "no value")),
        }
    }

    fn evaluate_expression(&self, expression: &[Sexp<'_>], environment: &mut Environment<'_>) -> EvaluationResult {
        ensure_sufficient_stack(|| self.evaluate_call(expression, environment))
    }

    fn evaluate_call(&self, expression: &[Sexp<'_>], environment: &mut Environment<'_>) -> EvaluationResult {
        // The head of an expression names either a special form, which gets the
        // arguments unevaluated, or something evaluating to a function, which is
        // called with the arguments evaluated left to right

        let Some((head, arguments)) = expression.split_first() else {
            return Err(WispError::NotCallable("()".to_owned()));
        };

        if let Sexp::Atom(Literal::Identifier(name)) = head {
            if let Some(form) = self.special_forms.get(*name) {
                tracing::trace!(form = %name, "special form");
                return form(self, environment, arguments);
            }
        }

        let function = match self.evaluate(head, environment)? {
            Value::Function(ref function) => function.clone(),
            _ => return Err(WispError::NotCallable(head.to_string())),
        };

        let arguments = arguments
            .iter()
            .map(|argument| self.evaluate(argument, environment))
            .collect::<Result<Vec<_>, _>>()?;

        function.call(arguments)
    }
}

fn evaluate_atom(literal: &Literal<'_>, environment: &Environment<'_>) -> Result<Value, WispError> {
    match literal {
        Literal::Identifier(identifier) => environment
            .get(identifier)
            .cloned()
            .ok_or_else(|| WispError::UndefinedVariable((*identifier).to_owned())),
        Literal::String(string) => Ok(Value::String(string.to_string())),
        Literal::Number(number) => Ok(Value::Number(*number)),
        Literal::Boolean(boolean) => Ok(Value::Boolean(*boolean)),
    }
}

fn evaluate_define(interpreter: &Interpreter, environment: &mut Environment<'_>, list: &[Sexp<'_>]) -> EvaluationResult {
    // A define has a name, which must be an identifier, and an expression that
    // is evaluated and bound to the name in the active environment

    let [name, expression] = list else {
        return Err(WispError::arity("define", "2", list.len()));
    };

    let Sexp::Atom(Literal::Identifier(name)) = name else {
        return Err(WispError::type_mismatch("define", "an identifier", name.to_string()));
    };

    let value = interpreter.evaluate(expression, environment)?;
    environment.set(*name, value);
    Ok(None)
}

fn evaluate_let_parameter<'a>(
    interpreter: &Interpreter,
    environment: &mut Environment<'_>,
    parameter: &Sexp<'a>,
) -> Result<(&'a str, Value), WispError> {
    // A let parameter is a list of two elements, the name of the parameter and
    // the expression giving its value

    match parameter {
        Sexp::Expression(pair) => match pair.as_slice() {
            [Sexp::Atom(Literal::Identifier(name)), expression] => {
                Ok((*name, interpreter.evaluate(expression, environment)?))
            }
            _ => Err(WispError::type_mismatch("let", "a (name value) binding", parameter.to_string())),
        },
        Sexp::Atom(_) => Err(WispError::type_mismatch("let", "a (name value) binding", parameter.to_string())),
    }
}

fn evaluate_let(interpreter: &Interpreter, environment: &mut Environment<'_>, list: &[Sexp<'_>]) -> EvaluationResult {
    // Let has a list of parameters and a body of one or more forms. The parameter
    // values are evaluated in the enclosing environment, then bound in a new scope
    // where the body is evaluated. The last body form gives the result

    if list.len() < 2 {
        return Err(WispError::arity("let", "at least 2", list.len()));
    }

    let parameters = match &list[0] {
        Sexp::Expression(parameters) => parameters
            .iter()
            .map(|parameter| evaluate_let_parameter(interpreter, environment, parameter))
            .collect::<Result<Vec<_>, _>>()?,
        atom => return Err(WispError::type_mismatch("let", "a list of bindings", atom.to_string())),
    };

    let mut scope = Environment::new(Some(&*environment));
    for (name, value) in parameters {
        scope.set(name, value);
    }

    let mut result = None;
    for form in &list[1..] {
        result = match form {
            Sexp::Atom(literal) => Some(evaluate_atom(literal, &scope)?),
            Sexp::Expression(expression) => interpreter.evaluate_expression(expression, &mut scope)?,
        };
    }

    Ok(result)
}
