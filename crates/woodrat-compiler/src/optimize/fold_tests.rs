use woodrat_grammar::{Grammar, GrammarBuilder};

use crate::optimize;

fn folded(build: impl FnOnce(&mut GrammarBuilder)) -> Grammar {
    let mut b = GrammarBuilder::new();
    build(&mut b);
    let mut g = b.finish().unwrap();
    optimize::fold(&mut g);
    g
}

fn body(g: &Grammar, name: &str) -> String {
    g.render(g.resolve(name).unwrap().body)
}

#[test]
fn byte_choice_folds_to_one_class() {
    let g = folded(|b| {
        let a = b.byte(b'a');
        let z = b.byte(b'b');
        let digit = b.range(b'0', b'9');
        let arms = b.alt(&[a, z, digit]);
        b.rule("X", arms);
    });
    assert_eq!(body(&g, "X"), "[0-9ab]");
}

#[test]
fn byte_sequence_folds_to_a_literal_run() {
    let g = folded(|b| {
        let word = b.text("cat");
        b.rule("CAT", word);
    });
    assert_eq!(body(&g, "CAT"), "'cat'");
}

#[test]
fn adjacent_runs_merge() {
    let g = folded(|b| {
        let first = b.text("ca");
        let last = b.byte(b't');
        let word = b.seq(&[first, last]);
        b.rule("CAT", word);
    });
    assert_eq!(body(&g, "CAT"), "'cat'");
}

#[test]
fn mixed_sequence_keeps_its_shape() {
    let g = folded(|b| {
        let a = b.byte(b'a');
        let digit = b.range(b'0', b'9');
        let pair = b.seq(&[a, digit]);
        b.rule("MIXED", pair);
    });
    assert_eq!(body(&g, "MIXED"), "('a' [0-9])");
}

#[test]
fn nested_sequences_flatten() {
    let g = folded(|b| {
        let ab = b.text("ab");
        let cd = b.text("cd");
        let all = b.seq(&[ab, cd]);
        b.rule("WORD", all);
    });
    assert_eq!(body(&g, "WORD"), "'abcd'");
}

#[test]
fn nested_choices_flatten_and_drop_dead_arms() {
    let g = folded(|b| {
        let a = b.byte(b'a');
        let dead = b.fail();
        let inner = b.alt(&[a, dead]);
        let x = b.byte(b'x');
        let outer = b.alt(&[inner, x]);
        b.rule("PICK", outer);
    });
    assert_eq!(body(&g, "PICK"), "[ax]");
}

#[test]
fn empty_items_vanish_from_sequences() {
    let g = folded(|b| {
        let nothing = b.empty();
        let a = b.byte(b'a');
        let padded = b.seq(&[nothing, a, nothing]);
        b.rule("BARE", padded);
    });
    assert_eq!(body(&g, "BARE"), "'a'");
}

#[test]
fn choice_with_composite_arm_stays_ordered() {
    let g = folded(|b| {
        let digit = b.range(b'0', b'9');
        let digits = b.plus(digit);
        let v = b.byte(b'v');
        let arms = b.alt(&[digits, v]);
        b.rule("VALUE", arms);
    });
    assert_eq!(body(&g, "VALUE"), "([0-9]+ / 'v')");
}

#[test]
fn folding_reaches_under_wrappers() {
    let g = folded(|b| {
        let kw = b.text("if");
        let guard = b.not(kw);
        b.rule("NOKW", guard);
    });
    assert_eq!(body(&g, "NOKW"), "!'if'");
}

#[test]
fn folding_is_idempotent() {
    let mut b = GrammarBuilder::new();
    let a = b.byte(b'a');
    let z = b.byte(b'z');
    let arms = b.alt(&[a, z]);
    let word = b.text("if");
    let all = b.seq(&[arms, word]);
    b.rule("X", all);
    let mut g = b.finish().unwrap();

    optimize::fold(&mut g);
    let once = g.resolve("X").unwrap().body;
    optimize::fold(&mut g);
    assert_eq!(g.resolve("X").unwrap().body, once);
}
