use woodrat_grammar::{AcceptTable, Acceptance, Grammar, GrammarBuilder, MASK_BINARY};

use crate::Options;
use crate::analyze::accept;

fn analyzed(build: impl FnOnce(&mut GrammarBuilder)) -> Grammar {
    let mut b = GrammarBuilder::new();
    build(&mut b);
    let mut g = b.finish().unwrap();
    accept::run(&mut g, &Options::default());
    g
}

fn table<'g>(g: &'g Grammar, name: &str) -> &'g AcceptTable {
    g.resolve(name).unwrap().acceptance.as_ref().unwrap()
}

#[test]
fn byte_rule_accepts_only_its_byte() {
    let g = analyzed(|b| {
        let x = b.byte(b'x');
        b.rule("X", x);
    });
    let t = table(&g, "X");
    assert_eq!(t.get(Some(b'x')), Acceptance::Accept);
    assert_eq!(t.get(Some(b'y')), Acceptance::Reject);
    assert_eq!(t.get(None), Acceptance::Reject);
}

#[test]
fn repetition_never_rejects() {
    let g = analyzed(|b| {
        let digit = b.range(b'0', b'9');
        let digits = b.star(digit);
        b.rule("DIGITS", digits);
    });
    let t = table(&g, "DIGITS");
    assert_eq!(t.get(Some(b'7')), Acceptance::Accept);
    assert_eq!(t.get(Some(b'z')), Acceptance::Unconsumed);
    assert_eq!(t.get(None), Acceptance::Unconsumed);
}

#[test]
fn sequence_short_circuits_past_zero_width_heads() {
    let g = analyzed(|b| {
        let a = b.byte(b'a');
        let peek = b.and(a);
        let body = b.seq(&[peek, a]);
        b.rule("GUARDED", body);
    });
    let t = table(&g, "GUARDED");
    assert_eq!(t.get(Some(b'a')), Acceptance::Accept);
    assert_eq!(t.get(Some(b'b')), Acceptance::Reject);
}

#[test]
fn choice_unions_its_arms() {
    let g = analyzed(|b| {
        let a = b.byte(b'a');
        let digit = b.range(b'0', b'9');
        let both = b.alt(&[a, digit]);
        b.rule("EITHER", both);
        let nothing = b.empty();
        let loose = b.alt(&[a, nothing]);
        b.rule("MAYBE", loose);
    });
    let either = table(&g, "EITHER");
    assert_eq!(either.get(Some(b'a')), Acceptance::Accept);
    assert_eq!(either.get(Some(b'5')), Acceptance::Accept);
    assert_eq!(either.get(Some(b'z')), Acceptance::Reject);

    let maybe = table(&g, "MAYBE");
    assert_eq!(maybe.get(Some(b'z')), Acceptance::Unconsumed);
}

#[test]
fn negative_lookahead_inverts_single_byte_matchers() {
    let g = analyzed(|b| {
        let a = b.byte(b'a');
        let guard = b.not(a);
        let any = b.any();
        let body = b.seq(&[guard, any]);
        b.rule("OTHER", body);
    });
    let t = table(&g, "OTHER");
    assert_eq!(t.get(Some(b'a')), Acceptance::Reject);
    assert_eq!(t.get(Some(b'b')), Acceptance::Accept);
    assert_eq!(t.get(None), Acceptance::Reject);
}

#[test]
fn negative_lookahead_over_longer_shapes_stays_conservative() {
    // !'in' still accepts 'i': the lookahead can fail on the second byte.
    let g = analyzed(|b| {
        let word = b.text("in");
        let guard = b.not(word);
        let letter = b.range(b'a', b'z');
        let letters = b.plus(letter);
        let body = b.seq(&[guard, letters]);
        b.rule("IDENT", body);
    });
    let t = table(&g, "IDENT");
    assert_eq!(t.get(Some(b'i')), Acceptance::Accept);
    assert_eq!(t.get(Some(b'z')), Acceptance::Accept);
    assert_eq!(t.get(Some(b'5')), Acceptance::Reject);
}

#[test]
fn references_classify_through_the_called_rule() {
    let g = analyzed(|b| {
        let digit = b.range(b'0', b'9');
        b.rule("DIGIT", digit);
        let call = b.call("DIGIT");
        b.rule("TOP", call);
    });
    let t = table(&g, "TOP");
    assert_eq!(t.get(Some(b'5')), Acceptance::Accept);
    assert_eq!(t.get(Some(b'a')), Acceptance::Reject);
}

#[test]
fn text_mode_treats_nul_like_end_of_input() {
    let g = analyzed(|b| {
        let end = b.eof();
        b.rule("END", end);
        let zero = b.byte(0);
        b.rule("ZERO", zero);
    });
    let end = table(&g, "END");
    assert_eq!(end.get(Some(0)), Acceptance::Unconsumed);
    assert_eq!(end.get(None), Acceptance::Unconsumed);

    // A grammar matching byte 0 is unreachable in text mode.
    let zero = table(&g, "ZERO");
    assert_eq!(zero.get(Some(0)), Acceptance::Reject);
}

#[test]
fn binary_mode_recomputes_the_stale_table() {
    let mut b = GrammarBuilder::new();
    let zero = b.byte(0);
    b.rule("ZERO", zero);
    let mut g = b.finish().unwrap();

    accept::run(&mut g, &Options::default());
    assert_eq!(table(&g, "ZERO").mask, 0);
    assert_eq!(table(&g, "ZERO").get(Some(0)), Acceptance::Reject);

    let binary = Options::default().with_binary(true);
    accept::run(&mut g, &binary);
    assert_eq!(table(&g, "ZERO").mask, MASK_BINARY);
    assert_eq!(table(&g, "ZERO").get(Some(0)), Acceptance::Accept);
    assert_eq!(table(&g, "ZERO").get(None), Acceptance::Reject);
}

#[test]
fn matching_mask_reuses_the_cached_table() {
    let mut b = GrammarBuilder::new();
    let x = b.byte(b'x');
    b.rule("X", x);
    let mut g = b.finish().unwrap();

    accept::run(&mut g, &Options::default());
    let first = table(&g, "X").clone();
    accept::run(&mut g, &Options::default());
    assert_eq!(*table(&g, "X"), first);
}
