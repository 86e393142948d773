use indoc::indoc;

use crate::{GrammarBuilder, GrammarErrorKind};

#[test]
fn builder_produces_rules_in_definition_order() {
    let mut b = GrammarBuilder::new();

    let digit = b.range(b'0', b'9');
    let digits = b.plus(digit);
    b.rule("Digits", digits);

    let sign = b.one_of("+-");
    let sign = b.opt(sign);
    let number = b.seq(&[sign, digits]);
    b.rule("number", number);

    let g = b.finish().unwrap();
    assert_eq!(g.len(), 2);

    let names: Vec<&str> = g.iter().map(|p| g.name(p.name)).collect();
    assert_eq!(names, ["Digits", "number"]);
}

#[test]
fn seq_and_alt_collapse_trivial_shapes() {
    let mut b = GrammarBuilder::new();

    let a = b.byte(b'a');
    assert_eq!(b.seq(&[a]), a);
    assert_eq!(b.alt(&[a]), a);

    let empty = b.empty();
    assert_eq!(b.seq(&[]), empty);

    let fail = b.fail();
    assert_eq!(b.alt(&[]), fail);
}

#[test]
fn text_builds_byte_sequences() {
    let mut b = GrammarBuilder::new();

    let cat = b.text("cat");
    b.rule("Word", cat);
    let g = b.finish().unwrap();

    assert_eq!(g.render(g.resolve("Word").unwrap().body), "('c' 'a' 't')");
}

#[test]
fn duplicate_rule_is_reported_at_finish() {
    let mut b = GrammarBuilder::new();

    let a = b.byte(b'a');
    let z = b.byte(b'z');
    b.rule("A", a);
    b.rule("A", z);

    let err = b.finish().unwrap_err();
    assert_eq!(err.kind, GrammarErrorKind::DuplicateRule);
    assert_eq!(err.rule, "A");
}

#[test]
fn dangling_reference_is_reported_at_finish() {
    let mut b = GrammarBuilder::new();

    let call = b.call("Missing");
    b.rule("Start", call);

    let err = b.finish().unwrap_err();
    assert_eq!(err.kind, GrammarErrorKind::UndefinedRule);
    assert_eq!(err.rule, "Missing");
}

#[test]
fn forward_references_are_fine() {
    let mut b = GrammarBuilder::new();

    let later = b.call("Later");
    b.rule("Start", later);
    let x = b.byte(b'x');
    b.rule("Later", x);

    assert!(b.finish().is_ok());
}

#[test]
fn dump_renders_grammar_text() {
    let mut b = GrammarBuilder::new();

    let digit = b.range(b'0', b'9');
    let digits = b.plus(digit);
    let tail = b.call("Value");
    let alt = b.alt(&[digits, tail]);
    b.rule("Value", alt);

    let nl = b.byte(b'\n');
    let not_nl = b.not(nl);
    b.rule("NotNewline", not_nl);

    let g = b.finish().unwrap();
    assert_eq!(
        g.dump(),
        indoc! {r"
            Value = ([0-9]+ / Value)
            NotNewline = !'\n'
        "}
    );
}

#[test]
fn context_expressions_render() {
    let mut b = GrammarBuilder::new();

    let word = b.range(b'a', b'z');
    let word = b.plus(word);
    let def = b.sym_def("k", word);
    let is = b.sym_is("k");
    let body = b.seq(&[def, is]);
    b.rule("D", body);

    let g = b.finish().unwrap();
    assert_eq!(
        g.render(g.resolve("D").unwrap().body),
        "(<def k [a-z]+> <is k>)"
    );
}
