use woodrat_grammar::{Grammar, GrammarBuilder};

use crate::analyze::context;

fn analyzed(build: impl FnOnce(&mut GrammarBuilder)) -> Grammar {
    let mut b = GrammarBuilder::new();
    build(&mut b);
    let mut g = b.finish().unwrap();
    context::run(&mut g);
    g
}

fn sensitive(g: &Grammar, name: &str) -> bool {
    g.resolve(name).unwrap().ctx_sensitive
}

#[test]
fn symbol_reads_and_writes_both_count() {
    let g = analyzed(|b| {
        let word = b.range(b'a', b'z');
        let name = b.plus(word);
        let def = b.sym_def("k", name);
        b.rule("DEF", def);
        let is = b.sym_is("k");
        b.rule("USE", is);
        let exists = b.sym_exists("k");
        b.rule("SEEN", exists);
        let plain = b.byte(b'x');
        b.rule("PLAIN", plain);
    });
    assert!(sensitive(&g, "DEF"));
    assert!(sensitive(&g, "USE"));
    assert!(sensitive(&g, "SEEN"));
    assert!(!sensitive(&g, "PLAIN"));
}

#[test]
fn indentation_and_flags_count() {
    let g = analyzed(|b| {
        let def = b.indent_def();
        b.rule("ANCHOR", def);
        let is = b.indent_is();
        b.rule("ALIGNED", is);
        let iff = b.flag_if("strict", true);
        b.rule("STRICT", iff);
        let x = b.byte(b'x');
        let on = b.flag_set("strict", true, x);
        b.rule("ENTER", on);
    });
    assert!(sensitive(&g, "ANCHOR"));
    assert!(sensitive(&g, "ALIGNED"));
    assert!(sensitive(&g, "STRICT"));
    assert!(sensitive(&g, "ENTER"));
}

#[test]
fn sensitivity_propagates_through_references() {
    let g = analyzed(|b| {
        let inner = b.call("B");
        let x = b.byte(b'x');
        let body = b.seq(&[x, inner]);
        b.rule("A", body);
        let is = b.sym_is("k");
        b.rule("B", is);
    });
    assert!(sensitive(&g, "A"));
    assert!(sensitive(&g, "B"));
}

#[test]
fn context_free_recursion_is_insensitive() {
    let g = analyzed(|b| {
        let open = b.byte(b'(');
        let rec = b.call("A");
        let close = b.byte(b')');
        let group = b.seq(&[open, rec, close]);
        let x = b.byte(b'x');
        let body = b.alt(&[group, x]);
        b.rule("A", body);
    });
    assert!(!sensitive(&g, "A"));
}

#[test]
fn sensitive_cycle_is_detected_from_either_entry() {
    let g = analyzed(|b| {
        let step = b.call("B");
        let x = b.byte(b'x');
        let body = b.alt(&[step, x]);
        b.rule("A", body);
        let back = b.call("A");
        let is = b.sym_is("k");
        let tail = b.seq(&[is, back]);
        b.rule("B", tail);
    });
    assert!(sensitive(&g, "A"));
    assert!(sensitive(&g, "B"));
}
