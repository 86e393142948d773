use indoc::indoc;
use woodrat_grammar::{ByteSet, Typestate};

use crate::{Addr, Inst, ProgramBuilder, RuleMeta};

fn meta(entry: usize, typestate: Typestate) -> RuleMeta {
    RuleMeta {
        entry: Addr::new(entry),
        typestate,
        memo: false,
        ctx_sensitive: false,
        always_consumes: false,
    }
}

#[test]
fn dump_lists_rules_and_code() {
    let mut b = ProgramBuilder::new();
    let rule = b.add_rule("A", meta(0, Typestate::Boolean));

    // A = 'x' A / 'y'
    let choice = b.push(Inst::Choice(Addr::HOLE));
    b.push(Inst::Byte(b'x'));
    b.push(Inst::Call(rule));
    let commit = b.push(Inst::Commit(Addr::HOLE));
    let second = b.push(Inst::Byte(b'y'));
    let exit = b.push(Inst::Return);
    b.patch(choice, Inst::Choice(second));
    b.patch(commit, Inst::Commit(exit));

    let program = b.finish();
    assert_eq!(
        program.dump(),
        indoc! {"
            [rules]
            R0 A entry=0 boolean
            [code]
            0  Choice -> 4
            1  Byte 'x'
            2  Call A
            3  Commit -> 5
            4  Byte 'y'
            5  Return
        "}
    );
}

#[test]
fn dump_shows_pools() {
    let mut b = ProgramBuilder::new();
    let mut rule_meta = meta(0, Typestate::Object);
    rule_meta.memo = true;
    rule_meta.always_consumes = true;
    b.add_rule("Token", rule_meta);

    let digits = b.class_id(ByteSet::range(b'0', b'9'));
    let abc = b.lit_id(b"abc");
    let table = b.name_id("k");
    let strict = b.flag_id("Strict");

    b.push(Inst::Span(digits));
    b.push(Inst::Lit(abc));
    b.push(Inst::MarkPos);
    b.push(Inst::SymDef(table));
    b.push(Inst::TestFlag {
        flag: strict,
        expect: false,
    });
    b.push(Inst::Return);

    insta::assert_snapshot!(b.finish().dump(), @r"
    [rules]
    R0 Token entry=0 object memo consumes
    [classes]
    C0 [0-9]
    [literals]
    L0 'abc'
    [names]
    N0 k
    [flags]
    F0 Strict
    [code]
    0  Span C0 [0-9]
    1  Lit L0 'abc'
    2  MarkPos
    3  SymDef k
    4  TestFlag !Strict
    5  Return
    ");
}

#[test]
fn dump_groups_dispatch_targets() {
    let mut b = ProgramBuilder::new();
    b.add_rule("Start", meta(0, Typestate::Boolean));

    let table = b.new_table();
    let mut entries = Box::new([Addr::new(3); 257]);
    for byte in b'0'..=b'9' {
        entries[byte as usize] = Addr::new(1);
    }
    b.set_table(table, entries);

    b.push(Inst::Dispatch(table));
    b.push(Inst::Any);
    b.push(Inst::Jump(Addr::new(4)));
    b.push(Inst::Fail);
    b.push(Inst::Return);

    let dump = b.finish().dump();
    assert!(dump.contains("T0 [\\x00-/:-\\xff]->3 [0-9]->1 $->3"));
    assert!(dump.contains("0  Dispatch T0"));
}

#[test]
fn pool_entries_are_deduplicated() {
    let mut b = ProgramBuilder::new();

    let a = b.class_id(ByteSet::range(b'a', b'z'));
    let b2 = b.class_id(ByteSet::range(b'a', b'z'));
    assert_eq!(a, b2);

    let l1 = b.lit_id(b"while");
    let l2 = b.lit_id(b"while");
    assert_eq!(l1, l2);

    let n1 = b.name_id("ident");
    let n2 = b.name_id("ident");
    assert_eq!(n1, n2);
}
