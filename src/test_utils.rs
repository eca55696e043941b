use std::{cell::RefCell, fmt, path::PathBuf, rc::Rc};

use anyhow::{bail, Context};
use itertools::Itertools;
use serde::{
    de::{Error, MapAccess, Visitor},
    Deserialize, Deserializer,
};

use crate::{
    error::{ErrorKind, WispError},
    program::{Program, RunOptions},
};

/// What running a testcase must produce: the full output, and the kind of
/// error the run stops with, if any.
#[derive(Debug)]
pub struct Expectation {
    pub output: String,
    pub error: Option<ErrorKind>,
}

struct ExpectationVisitor;

impl<'de> Deserialize<'de> for Expectation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(ExpectationVisitor)
    }
}

impl<'de> Visitor<'de> for ExpectationVisitor {
    type Value = Expectation;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "A structure with the boolean key 'ok' and the key 'output'. If it's not okay, also the key 'type'")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut ok: Option<bool> = None;
        let mut output: Option<String> = None;
        let mut error: Option<ErrorKind> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "ok" => ok = Some(map.next_value()?),
                "output" => output = Some(map.next_value()?),
                "type" => error = Some(map.next_value()?),
                other => return Err(A::Error::custom(format!("Unrecognized key: {}", other))),
            }
        }

        let ok = ok.ok_or_else(|| A::Error::missing_field("ok"))?;
        let output = output.ok_or_else(|| A::Error::missing_field("output"))?;
        match (ok, error) {
            (true, None) => Ok(Expectation { output, error: None }),
            (false, Some(kind)) => Ok(Expectation { output, error: Some(kind) }),
            (true, Some(_)) => Err(A::Error::custom("A successful run has no 'type'")),
            (false, None) => Err(A::Error::custom("A failing run needs a 'type'")),
        }
    }
}

fn base_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Loads `test_inputs/NAME.wisp` and its expectation `test_outputs/NAME.json`.
pub fn load_testcase(name: &str) -> anyhow::Result<(String, Expectation)> {
    let input = base_path().join("test_inputs").join(format!("{}.wisp", name));
    let output = base_path().join("test_outputs").join(format!("{}.json", name));

    let source = std::fs::read_to_string(&input).with_context(|| format!("reading {}", input.display()))?;
    let expected = std::fs::read(&output).with_context(|| format!("reading {}", output.display()))?;
    let expected: Expectation =
        serde_json::from_slice(&expected).with_context(|| format!("parsing {}", output.display()))?;

    Ok((source, expected))
}

pub fn all_testcases() -> anyhow::Result<Vec<String>> {
    let mut testcases = vec![];
    for entry in std::fs::read_dir(base_path().join("test_inputs"))? {
        let path = entry?.path();
        if path.extension().and_then(|extension| extension.to_str()) != Some("wisp") {
            continue;
        }
        match path.file_stem().and_then(|stem| stem.to_str()) {
            Some(stem) => testcases.push(stem.to_owned()),
            None => bail!("Testcase with a non UTF-8 name: {}", path.display()),
        }
    }

    Ok(testcases.into_iter().sorted().collect_vec())
}

/// Runs `program` and returns what it wrote along with the outcome.
pub fn run_source(program: Program) -> (String, Result<(), WispError>) {
    let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
    let result = program.run(RunOptions::new().with_output(buffer.clone()));

    let output = String::from_utf8_lossy(&buffer.borrow()).into_owned();
    (output, result)
}
