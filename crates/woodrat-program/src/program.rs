//! The program container and its builder.

use indexmap::IndexMap;
use woodrat_grammar::{ByteSet, Typestate};

use crate::inst::{Addr, ClassId, FlagId, Inst, LitId, NameId, RuleId, TableId};

/// Metadata for one lowered rule.
#[derive(Debug, Clone)]
pub struct RuleMeta {
    /// Entry address of the rule body.
    pub entry: Addr,
    /// AST discipline the matcher applies at rule boundaries.
    pub typestate: Typestate,
    /// Whether call results at this rule are memoized.
    pub memo: bool,
    /// Whether the rule touches symbol tables, indentation, or flags.
    pub ctx_sensitive: bool,
    /// Whether every successful match consumes input.
    pub always_consumes: bool,
}

/// An executable program: code plus the pools it indexes into.
///
/// Programs are immutable once built. Rules keep the definition order of
/// the grammar they were lowered from.
#[derive(Debug, Clone)]
pub struct Program {
    code: Vec<Inst>,
    rules: IndexMap<String, RuleMeta>,
    classes: Vec<ByteSet>,
    lits: Vec<Box<[u8]>>,
    names: Vec<String>,
    flags: Vec<String>,
    tables: Vec<Box<[Addr; 257]>>,
    binary: bool,
    ast: bool,
}

impl Program {
    #[inline]
    pub fn code(&self) -> &[Inst] {
        &self.code
    }

    /// Fetches the instruction at `addr`.
    #[inline]
    pub fn inst(&self, addr: Addr) -> Inst {
        self.code[addr.index()]
    }

    pub fn rule(&self, id: RuleId) -> &RuleMeta {
        &self.rules[id.index()]
    }

    pub fn rule_name(&self, id: RuleId) -> &str {
        self.rules.get_index(id.index()).map(|(name, _)| name.as_str()).unwrap_or("?")
    }

    /// Looks up a rule by name.
    pub fn rule_named(&self, name: &str) -> Option<(RuleId, &RuleMeta)> {
        self.rules
            .get_full(name)
            .map(|(index, _, meta)| (RuleId::new(index), meta))
    }

    /// Iterates `(name, meta)` pairs in definition order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &RuleMeta)> {
        self.rules.iter().map(|(name, meta)| (name.as_str(), meta))
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn class(&self, id: ClassId) -> &ByteSet {
        &self.classes[id.index()]
    }

    pub fn classes(&self) -> &[ByteSet] {
        &self.classes
    }

    #[inline]
    pub fn lit(&self, id: LitId) -> &[u8] {
        &self.lits[id.index()]
    }

    pub fn lits(&self) -> &[Box<[u8]>] {
        &self.lits
    }

    #[inline]
    pub fn name(&self, id: NameId) -> &str {
        &self.names[id.index()]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn flag_name(&self, id: FlagId) -> &str {
        &self.flags[id.index()]
    }

    /// Number of distinct flags; the matcher sizes its flag store by it.
    pub fn flag_count(&self) -> usize {
        self.flags.len()
    }

    #[inline]
    pub fn table(&self, id: TableId) -> &[Addr; 257] {
        &self.tables[id.index()]
    }

    pub fn tables(&self) -> &[Box<[Addr; 257]>] {
        &self.tables
    }

    /// Binary-input mode: byte 0 is ordinary input rather than a
    /// terminator.
    pub fn binary(&self) -> bool {
        self.binary
    }

    /// Whether AST instructions were emitted. Recognition-only programs
    /// produce no trees.
    pub fn ast(&self) -> bool {
        self.ast
    }
}

/// Emit-and-patch assembler for [`Program`]s.
///
/// Forward targets are emitted as [`Addr::HOLE`] and patched once the
/// target address is known. Pool entries are deduplicated on insert.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    code: Vec<Inst>,
    rules: IndexMap<String, RuleMeta>,
    classes: Vec<ByteSet>,
    lits: Vec<Box<[u8]>>,
    names: Vec<String>,
    flags: Vec<String>,
    tables: Vec<Box<[Addr; 257]>>,
    binary: bool,
    ast: bool,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            ast: true,
            ..Self::default()
        }
    }

    pub fn set_binary(&mut self, binary: bool) {
        self.binary = binary;
    }

    pub fn set_ast(&mut self, ast: bool) {
        self.ast = ast;
    }

    /// Address the next pushed instruction will get.
    pub fn here(&self) -> Addr {
        Addr::new(self.code.len())
    }

    /// Appends an instruction, returning its address.
    pub fn push(&mut self, inst: Inst) -> Addr {
        let at = self.here();
        self.code.push(inst);
        at
    }

    /// Replaces the instruction at `at`. Used to fill patched targets.
    pub fn patch(&mut self, at: Addr, inst: Inst) {
        self.code[at.index()] = inst;
    }

    /// Interns a byte class.
    pub fn class_id(&mut self, set: ByteSet) -> ClassId {
        if let Some(index) = self.classes.iter().position(|c| *c == set) {
            return ClassId::new(index);
        }
        self.classes.push(set);
        ClassId::new(self.classes.len() - 1)
    }

    /// Interns a byte literal.
    pub fn lit_id(&mut self, bytes: &[u8]) -> LitId {
        if let Some(index) = self.lits.iter().position(|l| **l == *bytes) {
            return LitId::new(index);
        }
        self.lits.push(bytes.to_vec().into_boxed_slice());
        LitId::new(self.lits.len() - 1)
    }

    /// Interns a tag or symbol-table name.
    pub fn name_id(&mut self, name: &str) -> NameId {
        if let Some(index) = self.names.iter().position(|n| n == name) {
            return NameId::new(index);
        }
        self.names.push(name.to_owned());
        NameId::new(self.names.len() - 1)
    }

    /// Interns a flag name.
    pub fn flag_id(&mut self, name: &str) -> FlagId {
        if let Some(index) = self.flags.iter().position(|n| n == name) {
            return FlagId::new(index);
        }
        self.flags.push(name.to_owned());
        FlagId::new(self.flags.len() - 1)
    }

    /// Reserves a dispatch table, to be filled by [`set_table`].
    ///
    /// [`set_table`]: ProgramBuilder::set_table
    pub fn new_table(&mut self) -> TableId {
        self.tables.push(Box::new([Addr::HOLE; 257]));
        TableId::new(self.tables.len() - 1)
    }

    pub fn set_table(&mut self, id: TableId, entries: Box<[Addr; 257]>) {
        self.tables[id.index()] = entries;
    }

    /// Registers a rule. Rules must be added in grammar definition order;
    /// the returned id is the rule's position.
    pub fn add_rule(&mut self, name: &str, meta: RuleMeta) -> RuleId {
        let (index, _) = self.rules.insert_full(name.to_owned(), meta);
        RuleId::new(index)
    }

    /// Re-points a rule's entry once its body has been emitted.
    pub fn set_entry(&mut self, id: RuleId, entry: Addr) {
        self.rules[id.index()].entry = entry;
    }

    pub fn finish(self) -> Program {
        debug_assert!(
            !self.code.contains(&Inst::Jump(Addr::HOLE)),
            "unpatched jump target"
        );
        Program {
            code: self.code,
            rules: self.rules,
            classes: self.classes,
            lits: self.lits,
            names: self.names,
            flags: self.flags,
            tables: self.tables,
            binary: self.binary,
            ast: self.ast,
        }
    }
}
