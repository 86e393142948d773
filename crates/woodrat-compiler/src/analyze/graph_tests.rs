use woodrat_grammar::{Expr, Grammar, GrammarBuilder, GrammarErrorKind};

use crate::analyze::graph;

#[test]
fn counts_reference_sites() {
    let mut b = GrammarBuilder::new();
    let digit = b.range(b'0', b'9');
    b.rule("DIGIT", digit);
    let call = b.call("DIGIT");
    let pair = b.seq(&[call, call]);
    b.rule("PAIR", pair);
    let again = b.call("DIGIT");
    b.rule("ONE", again);
    let mut g = b.finish().unwrap();

    graph::run(&mut g).unwrap();

    assert_eq!(g.resolve("DIGIT").unwrap().ref_count, 3);
    assert_eq!(g.resolve("PAIR").unwrap().ref_count, 0);
    assert!(!g.resolve("DIGIT").unwrap().recursive);
}

#[test]
fn marks_direct_recursion() {
    let mut b = GrammarBuilder::new();
    let x = b.byte(b'x');
    let rec = b.call("A");
    let first = b.seq(&[x, rec]);
    let y = b.byte(b'y');
    let body = b.alt(&[first, y]);
    b.rule("A", body);
    let z = b.byte(b'z');
    b.rule("Z", z);
    let mut g = b.finish().unwrap();

    graph::run(&mut g).unwrap();

    assert!(g.resolve("A").unwrap().recursive);
    assert!(!g.resolve("Z").unwrap().recursive);
    assert_eq!(g.resolve("A").unwrap().ref_count, 1);
}

#[test]
fn marks_mutual_recursion() {
    let mut b = GrammarBuilder::new();
    let open = b.byte(b'(');
    let inner = b.call("C");
    let close = b.byte(b')');
    let group = b.seq(&[open, inner, close]);
    b.rule("B", group);
    let back = b.call("B");
    let c = b.byte(b'c');
    let body = b.alt(&[back, c]);
    b.rule("C", body);
    let mut g = b.finish().unwrap();

    graph::run(&mut g).unwrap();

    assert!(g.resolve("B").unwrap().recursive);
    assert!(g.resolve("C").unwrap().recursive);
}

#[test]
fn rejects_undefined_reference() {
    // Assembled directly, skipping the builder's own validation.
    let mut g = Grammar::new();
    let missing = g.intern_name("Missing");
    let body = g.intern(Expr::Ref(missing));
    g.define("Top", body).unwrap();

    let err = graph::run(&mut g).unwrap_err();
    assert_eq!(err.kind, GrammarErrorKind::UndefinedRule);
    assert_eq!(err.rule, "Missing");
}
