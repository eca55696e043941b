#![no_main]

use core::fmt;

use itertools::Itertools;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};

// Builtins, literals and loads from variables
#[derive(Arbitrary, Debug)]
enum WispAtom {
    Display, List,
    True, False,

    Identifier(String),
    String(String),
}

impl fmt::Display for WispAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            WispAtom::Display => "display",
            WispAtom::List => "list",
            WispAtom::True => "#t",
            WispAtom::False => "#f",
            WispAtom::Identifier(identifier) => identifier.as_str(),
            WispAtom::String(string) => return write!(f, "{}", wisp::Value::from(string.as_str()).repr()),
        })
    }
}

#[derive(Arbitrary, Debug)]
enum WispCommand {
    Define(Vec<WispCommand>),
    Let(Vec<WispCommand>),
    Call(Vec<WispCommand>),

    Atom(WispAtom),
}

fn stringify_arguments(values: &[WispCommand]) -> String {
    values.iter()
        .map(WispCommand::to_string)
        .join(" ")
}

impl fmt::Display for WispCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WispCommand::Define(args) => write!(f, "(define {})", stringify_arguments(args)),
            WispCommand::Let(args) => write!(f, "(let {})", stringify_arguments(args)),
            WispCommand::Call(args) => write!(f, "({})", stringify_arguments(args)),
            WispCommand::Atom(atom) => atom.fmt(f),
        }
    }
}

fuzz_target!(|commands: Vec<WispCommand>| {
    let source = stringify_arguments(&commands);
    let options = wisp::RunOptions::new().with_writer(std::io::sink());
    let _ = wisp::Program::new(source).run(options);
});
