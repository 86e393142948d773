//! Textual program dumps.
//!
//! The dump lists rule metadata, the pooled data, and the code with
//! resolved operands, one instruction per line. It is the main debugging
//! surface for the encoder and is covered by snapshot tests.

use std::fmt::Write as _;

use woodrat_grammar::ByteSet;

use crate::inst::Inst;
use crate::program::Program;

impl Program {
    /// Renders the whole program as text.
    pub fn dump(&self) -> String {
        dump(self)
    }
}

/// Renders `program` as text. See [`Program::dump`].
pub fn dump(program: &Program) -> String {
    let mut out = String::new();

    writeln!(out, "[rules]").unwrap();
    let rw = width_for_count(program.rule_count());
    for (index, (name, meta)) in program.rules().enumerate() {
        write!(
            out,
            "R{index:<rw$} {name} entry={} {}",
            meta.entry,
            meta.typestate.as_str()
        )
        .unwrap();
        if meta.memo {
            out.push_str(" memo");
        }
        if meta.ctx_sensitive {
            out.push_str(" ctx");
        }
        if meta.always_consumes {
            out.push_str(" consumes");
        }
        out.push('\n');
    }

    if !program.classes().is_empty() {
        writeln!(out, "[classes]").unwrap();
        for (index, set) in program.classes().iter().enumerate() {
            writeln!(out, "C{index} {set}").unwrap();
        }
    }

    if !program.lits().is_empty() {
        writeln!(out, "[literals]").unwrap();
        for (index, lit) in program.lits().iter().enumerate() {
            writeln!(out, "L{index} {}", quoted(lit)).unwrap();
        }
    }

    if !program.names().is_empty() {
        writeln!(out, "[names]").unwrap();
        for (index, name) in program.names().iter().enumerate() {
            writeln!(out, "N{index} {name}").unwrap();
        }
    }

    if program.flag_count() > 0 {
        writeln!(out, "[flags]").unwrap();
        for index in 0..program.flag_count() {
            writeln!(out, "F{index} {}", program.flag_name(crate::FlagId::new(index))).unwrap();
        }
    }

    if !program.tables().is_empty() {
        writeln!(out, "[tables]").unwrap();
        for (index, table) in program.tables().iter().enumerate() {
            write!(out, "T{index}").unwrap();
            let mut seen = Vec::new();
            for entry in table.iter().take(256) {
                if !seen.contains(entry) {
                    seen.push(*entry);
                }
            }
            for target in seen {
                let set: ByteSet = (0..=255u8)
                    .filter(|&b| table[b as usize] == target)
                    .collect();
                write!(out, " {set}->{target}").unwrap();
            }
            writeln!(out, " $->{}", table[256]).unwrap();
        }
    }

    writeln!(out, "[code]").unwrap();
    let aw = width_for_count(program.code().len());
    for (index, &inst) in program.code().iter().enumerate() {
        writeln!(out, "{index:>aw$}  {}", render(program, inst)).unwrap();
    }
    out
}

fn render(program: &Program, inst: Inst) -> String {
    match inst {
        Inst::Byte(b) => format!("Byte {}", quoted(&[b])),
        Inst::Class(id) => format!("Class C{} {}", id.index(), program.class(id)),
        Inst::Lit(id) => format!("Lit L{} {}", id.index(), quoted(program.lit(id))),
        Inst::Any => "Any".to_owned(),
        Inst::Eof => "Eof".to_owned(),
        Inst::Span(id) => format!("Span C{} {}", id.index(), program.class(id)),
        Inst::OptByte(b) => format!("OptByte {}", quoted(&[b])),
        Inst::OptClass(id) => format!("OptClass C{} {}", id.index(), program.class(id)),
        Inst::OptLit(id) => format!("OptLit L{} {}", id.index(), quoted(program.lit(id))),
        Inst::NotByte(b) => format!("NotByte {}", quoted(&[b])),
        Inst::NotClass(id) => format!("NotClass C{} {}", id.index(), program.class(id)),
        Inst::NotLit(id) => format!("NotLit L{} {}", id.index(), quoted(program.lit(id))),
        Inst::Jump(a) => format!("Jump -> {a}"),
        Inst::Choice(a) => format!("Choice -> {a}"),
        Inst::Commit(a) => format!("Commit -> {a}"),
        Inst::LoopCommit { body, exit } => format!("LoopCommit body={body} exit={exit}"),
        Inst::BackCommit(a) => format!("BackCommit -> {a}"),
        Inst::FailTwice => "FailTwice".to_owned(),
        Inst::Fail => "Fail".to_owned(),
        Inst::Call(id) => format!("Call {}", program.rule_name(id)),
        Inst::Return => "Return".to_owned(),
        Inst::Dispatch(id) => format!("Dispatch T{}", id.index()),
        Inst::Open => "Open".to_owned(),
        Inst::Close => "Close".to_owned(),
        Inst::Tag(id) => format!("Tag #{}", program.name(id)),
        Inst::Replace(id) => format!("Replace L{} {}", id.index(), quoted(program.lit(id))),
        Inst::MarkLog => "MarkLog".to_owned(),
        Inst::Attach { slot } => format!("Attach {slot}"),
        Inst::MarkPos => "MarkPos".to_owned(),
        Inst::SymDef(id) => format!("SymDef {}", program.name(id)),
        Inst::SymIs(id) => format!("SymIs {}", program.name(id)),
        Inst::SymExists(id) => format!("SymExists {}", program.name(id)),
        Inst::MarkSyms => "MarkSyms".to_owned(),
        Inst::CutSyms => "CutSyms".to_owned(),
        Inst::IndentDef(_) => "IndentDef".to_owned(),
        Inst::TestFlag { flag, expect } => {
            let bang = if expect { "" } else { "!" };
            format!("TestFlag {bang}{}", program.flag_name(flag))
        }
        Inst::SetFlag { flag, value } => {
            let bang = if value { "" } else { "!" };
            format!("SetFlag {bang}{}", program.flag_name(flag))
        }
    }
}

fn quoted(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('\'');
    for &b in bytes {
        match b {
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b'\'' | b'\\' => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7e => out.push(b as char),
            _ => {
                write!(out, "\\x{b:02x}").unwrap();
            }
        }
    }
    out.push('\'');
    out
}

fn width_for_count(count: usize) -> usize {
    (count.max(2) - 1).ilog10() as usize + 1
}
