use woodrat_grammar::{Grammar, GrammarBuilder};

use crate::analyze::consume;

fn analyzed(build: impl FnOnce(&mut GrammarBuilder)) -> Grammar {
    let mut b = GrammarBuilder::new();
    build(&mut b);
    let mut g = b.finish().unwrap();
    consume::run(&mut g);
    g
}

fn consumes(g: &Grammar, name: &str) -> bool {
    g.resolve(name).unwrap().always_consumes.unwrap()
}

#[test]
fn matchers_always_consume() {
    let g = analyzed(|b| {
        let word = b.text("while");
        b.rule("WHILE", word);
        let digit = b.range(b'0', b'9');
        let digits = b.plus(digit);
        b.rule("DIGITS", digits);
        let dot = b.any();
        b.rule("ANY", dot);
    });
    assert!(consumes(&g, "WHILE"));
    assert!(consumes(&g, "DIGITS"));
    assert!(consumes(&g, "ANY"));
}

#[test]
fn zero_width_shapes_may_match_empty() {
    let g = analyzed(|b| {
        let sp = b.byte(b' ');
        let spaces = b.star(sp);
        b.rule("SPACES", spaces);
        let x = b.byte(b'x');
        let peek = b.and(x);
        b.rule("PEEK", peek);
        let maybe = b.opt(x);
        b.rule("OPTX", maybe);
        let end = b.eof();
        b.rule("END", end);
    });
    assert!(!consumes(&g, "SPACES"));
    assert!(!consumes(&g, "PEEK"));
    assert!(!consumes(&g, "OPTX"));
    assert!(!consumes(&g, "END"));
}

#[test]
fn sequence_consumes_when_any_part_does() {
    let g = analyzed(|b| {
        let x = b.byte(b'x');
        let peek = b.and(x);
        let body = b.seq(&[peek, x]);
        b.rule("GUARDED", body);
    });
    assert!(consumes(&g, "GUARDED"));
}

#[test]
fn choice_consumes_when_every_arm_does() {
    let g = analyzed(|b| {
        let a = b.byte(b'a');
        let z = b.byte(b'z');
        let both = b.alt(&[a, z]);
        b.rule("EITHER", both);
        let nothing = b.empty();
        let loose = b.alt(&[a, nothing]);
        b.rule("MAYBE", loose);
    });
    assert!(consumes(&g, "EITHER"));
    assert!(!consumes(&g, "MAYBE"));
}

#[test]
fn consuming_recursion_stays_positive() {
    let g = analyzed(|b| {
        let x = b.byte(b'x');
        let rec = b.call("A");
        let first = b.seq(&[x, rec]);
        let y = b.byte(b'y');
        let body = b.alt(&[first, y]);
        b.rule("A", body);
    });
    assert!(consumes(&g, "A"));
}

#[test]
fn unconsumed_recursion_is_pinned_empty() {
    // Left recursion reaches A again before any byte is consumed.
    let g = analyzed(|b| {
        let rec = b.call("A");
        let x = b.byte(b'x');
        let first = b.seq(&[rec, x]);
        let y = b.byte(b'y');
        let body = b.alt(&[first, y]);
        b.rule("A", body);
    });
    assert!(!consumes(&g, "A"));
}

#[test]
fn indirect_unconsumed_recursion_is_pinned_empty() {
    let g = analyzed(|b| {
        let step = b.call("B");
        b.rule("A", step);
        let back = b.call("A");
        let x = b.byte(b'x');
        let body = b.alt(&[back, x]);
        b.rule("B", body);
    });
    assert!(!consumes(&g, "A"));
    assert!(!consumes(&g, "B"));
}
