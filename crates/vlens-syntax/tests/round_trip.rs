use pretty_assertions::assert_eq;
use vlens_syntax::{parse_module, print_module, ParseError};

const VERSIONED: &str = r#"from dataclasses import field


@version("1")
@version("2", replaces=["1"])
class Account:
    """Balance in cents at 1, in dollars at 2"""

    @at("1")
    def __init__(self, cents: int = 0):
        self.cents = cents

    @at("1")
    def deposit(self, amount):
        self.cents += amount
        return self.cents

    @get("1", "2", "dollars")
    def dollars_from_cents(self):
        return self.cents / 100

    def describe(self):
        return f"{type(self).__name__}: {self!r}"
"#;

#[test]
fn versioned_source_round_trips() {
    let module = parse_module(VERSIONED).unwrap();
    assert_eq!(print_module(&module), VERSIONED);
}

#[test]
fn printing_is_stable() {
    let once = print_module(&parse_module("x=[ (a,b) for a,b in zip( xs,ys ) if a>b ]\n").unwrap());
    let twice = print_module(&parse_module(&once).unwrap());
    assert_eq!(once, "x = [(a, b) for a, b in zip(xs, ys) if a > b]\n");
    assert_eq!(once, twice);
}

#[test]
fn comments_are_dropped() {
    let module = parse_module("# leading\nx = 1  # trailing\n").unwrap();
    assert_eq!(print_module(&module), "x = 1\n");
}

#[test]
fn incomplete_source_is_a_syntax_error() {
    let err = parse_module("class C:\n    def f(self\n").unwrap_err();
    assert!(matches!(err, ParseError::SyntaxError { .. }), "{err}");
}
