#![no_main]

use libfuzzer_sys::fuzz_target;

// Whatever the input, the parser ends after finitely many forms and stays
// ended once it has reported an error
fuzz_target!(|source: &str| {
    let mut parser = wisp::Parser::new(source);
    let mut failed = false;

    for form in parser.by_ref() {
        match form {
            Ok(form) => {
                // The read-back form of a parsed sexp parses to the same sexp
                let text = form.to_string();
                let reparsed = wisp::parse(&text).expect("read-back form parses");
                assert_eq!(reparsed, vec![form]);
            }
            Err(_) => {
                failed = true;
                break;
            }
        }
    }

    if failed {
        assert!(parser.next().is_none());
    }
});
