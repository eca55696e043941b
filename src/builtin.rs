use std::collections::HashMap;

use itertools::Itertools;

use crate::{
    environment::Environment,
    program::Sink,
    value::{Builtin, BuiltinResult, Value},
};

fn builtin_display(sink: &Sink, values: Vec<Value>) -> BuiltinResult {
    // Writes the print form of every value with no separator, then a newline.
    // Display never produces a value

    let mut sink = sink.borrow_mut();
    writeln!(sink, "{}", values.iter().join(""))?;
    Ok(None)
}

fn builtin_list(values: Vec<Value>) -> BuiltinResult {
    Ok(Some(Value::List(values)))
}

pub(crate) fn builtin_environment(sink: &Sink) -> Environment<'static> {
    let display_sink = sink.clone();

    Environment::from_bindings(HashMap::from([
        (
            "display".to_owned(),
            Value::Function(Builtin::new("display", move |values| builtin_display(&display_sink, values))),
        ),
        ("list".to_owned(), Value::Function(Builtin::new("list", builtin_list))),
    ]))
}
