use woodrat_grammar::{Grammar, GrammarBuilder, GrammarErrorKind, Typestate};

use crate::Report;
use crate::analyze::typestate::{self, convention};

fn analyzed(build: impl FnOnce(&mut GrammarBuilder)) -> (Grammar, Report) {
    let mut b = GrammarBuilder::new();
    build(&mut b);
    let mut g = b.finish().unwrap();
    let mut report = Report::default();
    typestate::run(&mut g, &mut report).unwrap();
    (g, report)
}

#[test]
fn recognition_rules_are_boolean() {
    let (g, report) = analyzed(|b| {
        let digit = b.range(b'0', b'9');
        let digits = b.plus(digit);
        b.rule("DIGITS", digits);
    });
    assert_eq!(g.resolve("DIGITS").unwrap().typestate, Typestate::Boolean);
    assert!(report.is_clean());
}

#[test]
fn tree_rules_are_object() {
    let (g, report) = analyzed(|b| {
        let digit = b.range(b'0', b'9');
        let digits = b.plus(digit);
        let body = b.tree("num", digits);
        b.rule("Number", body);
    });
    assert_eq!(g.resolve("Number").unwrap().typestate, Typestate::Object);
    assert!(report.is_clean());
}

#[test]
fn link_and_tag_rules_are_operation() {
    let (g, report) = analyzed(|b| {
        let digit = b.range(b'0', b'9');
        let number = b.tree("num", digit);
        b.rule("Number", number);
        let call = b.call("Number");
        let child = b.link(0, call);
        let tag = b.tag("add");
        let body = b.seq(&[child, tag]);
        b.rule("addRight", body);
    });
    assert_eq!(
        g.resolve("addRight").unwrap().typestate,
        Typestate::Operation
    );
    assert!(report.is_clean());
}

#[test]
fn lookahead_discards_inner_effects() {
    let (g, report) = analyzed(|b| {
        let digit = b.range(b'0', b'9');
        let number = b.tree("num", digit);
        b.rule("Number", number);
        let call = b.call("Number");
        let body = b.and(call);
        b.rule("PEEK", body);
    });
    assert_eq!(g.resolve("PEEK").unwrap().typestate, Typestate::Boolean);
    assert!(report.is_clean());
}

#[test]
fn convention_reads_name_shape() {
    assert_eq!(convention("Number"), Typestate::Object);
    assert_eq!(convention("addExpr"), Typestate::Operation);
    assert_eq!(convention("EOF"), Typestate::Boolean);
    assert_eq!(convention("~space"), Typestate::Boolean);
    assert_eq!(convention("\"if\""), Typestate::Boolean);
    assert_eq!(convention("__Name"), Typestate::Object);
    assert_eq!(convention("expr"), Typestate::Undefined);
    assert_eq!(convention("A!suffix"), Typestate::Boolean);
}

#[test]
fn naming_mismatch_is_a_notice() {
    let (g, report) = analyzed(|b| {
        let v = b.byte(b'v');
        b.rule("Value", v);
    });
    assert_eq!(g.resolve("Value").unwrap().typestate, Typestate::Boolean);
    assert_eq!(report.notices.len(), 1);
    assert_eq!(report.notices[0].rule, "Value");
    assert_eq!(
        report.notices[0].message,
        "name suggests typestate object, inference found boolean"
    );
}

#[test]
fn recursive_boolean_rule_is_consistent() {
    let (g, report) = analyzed(|b| {
        let x = b.byte(b'x');
        let rec = b.call("A");
        let first = b.seq(&[x, rec]);
        let y = b.byte(b'y');
        let body = b.alt(&[first, y]);
        b.rule("A", body);
    });
    assert_eq!(g.resolve("A").unwrap().typestate, Typestate::Boolean);
    assert!(report.is_clean());
}

#[test]
fn recursive_tree_rule_contradicts_provisional_recognition() {
    let mut b = GrammarBuilder::new();
    let rec = b.call("Pair");
    let tail = b.opt(rec);
    let x = b.byte(b'x');
    let inner = b.seq(&[x, tail]);
    let body = b.tree("pair", inner);
    b.rule("Pair", body);
    let mut g = b.finish().unwrap();

    let mut report = Report::default();
    let err = typestate::run(&mut g, &mut report).unwrap_err();
    assert_eq!(err.kind, GrammarErrorKind::TypestateMismatch);
    assert_eq!(err.rule, "Pair");
}

#[test]
fn node_in_repetition_is_a_notice() {
    let (g, report) = analyzed(|b| {
        let x = b.byte(b'x');
        let item = b.tree("item", x);
        let body = b.star(item);
        b.rule("List", body);
    });
    assert_eq!(g.resolve("List").unwrap().typestate, Typestate::Object);
    assert_eq!(report.notices.len(), 1);
    assert_eq!(report.notices[0].rule, "List");
    assert!(
        report.notices[0]
            .message
            .contains("only the last iteration survives")
    );
}

#[test]
fn link_of_recognition_inner_is_a_notice() {
    let (g, report) = analyzed(|b| {
        let x = b.byte(b'x');
        let body = b.link(-1, x);
        b.rule("wrap", body);
    });
    assert_eq!(g.resolve("wrap").unwrap().typestate, Typestate::Operation);
    assert_eq!(report.notices.len(), 1);
    assert_eq!(
        report.notices[0].message,
        "link inner expression never builds a node"
    );
}

#[test]
fn symbol_binding_of_node_inner_is_a_notice() {
    let (g, report) = analyzed(|b| {
        let digit = b.range(b'0', b'9');
        let number = b.tree("num", digit);
        b.rule("Number", number);
        let call = b.call("Number");
        let body = b.sym_def("k", call);
        b.rule("BIND", body);
    });
    assert_eq!(g.resolve("BIND").unwrap().typestate, Typestate::Boolean);
    assert_eq!(report.notices.len(), 1);
    assert_eq!(report.notices[0].rule, "BIND");
    assert!(report.notices[0].message.contains("boolean expression"));
}
