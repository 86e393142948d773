//! The instruction set.
//!
//! Instructions are fixed-size and refer to pooled data (classes,
//! literals, names, dispatch tables) by index. Control flow follows the
//! failure-continuation model: `Choice` pushes a recovery point, the
//! commit family pops it, and any failed match unwinds to the most
//! recent recovery point in O(1).

use std::fmt;

/// Code address, an index into [`Program::code`](crate::Program::code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Addr(u32);

impl Addr {
    /// Placeholder for a forward target that will be patched.
    pub const HOLE: Addr = Addr(u32::MAX);

    #[inline]
    pub fn new(index: usize) -> Self {
        Addr(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a rule in the program's rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(u16);

impl RuleId {
    #[inline]
    pub fn new(index: usize) -> Self {
        RuleId(index as u16)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a byte class in the class pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(u16);

impl ClassId {
    #[inline]
    pub fn new(index: usize) -> Self {
        ClassId(index as u16)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a byte literal in the literal pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LitId(u16);

impl LitId {
    #[inline]
    pub fn new(index: usize) -> Self {
        LitId(index as u16)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a dispatch table in the table pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(u16);

impl TableId {
    #[inline]
    pub fn new(index: usize) -> Self {
        TableId(index as u16)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a name (tag or symbol-table name) in the name pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameId(u32);

impl NameId {
    #[inline]
    pub fn new(index: usize) -> Self {
        NameId(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a flag in the flag pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlagId(u16);

impl FlagId {
    #[inline]
    pub fn new(index: usize) -> Self {
        FlagId(index as u16)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One executable instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inst {
    // ------------------------------------------------------------------
    // Matchers
    // ------------------------------------------------------------------
    /// Consume one exact byte or fail.
    Byte(u8),
    /// Consume one byte from a class or fail.
    Class(ClassId),
    /// Consume a literal byte run or fail.
    Lit(LitId),
    /// Consume any one byte or fail at end of input.
    Any,
    /// Succeed only at end of input. Consumes nothing.
    Eof,
    /// Consume bytes from a class while they match. Never fails.
    Span(ClassId),
    /// Consume one exact byte if present. Never fails.
    OptByte(u8),
    /// Consume one byte from a class if present. Never fails.
    OptClass(ClassId),
    /// Consume a literal byte run if present. Never fails.
    OptLit(LitId),
    /// Fail when the next byte matches; otherwise succeed in place.
    NotByte(u8),
    /// Fail when the next byte is in the class; otherwise succeed in place.
    NotClass(ClassId),
    /// Fail when the literal run matches here; otherwise succeed in place.
    NotLit(LitId),

    // ------------------------------------------------------------------
    // Control
    // ------------------------------------------------------------------
    /// Unconditional jump.
    Jump(Addr),
    /// Push a failure continuation resuming at the target.
    Choice(Addr),
    /// Pop the current failure continuation and jump to the target.
    Commit(Addr),
    /// Pop the continuation; jump to `body` when the iteration consumed
    /// input, to `exit` when it matched zero bytes.
    LoopCommit { body: Addr, exit: Addr },
    /// Pop the continuation, restore its saved state, and jump. Implements
    /// positive lookahead.
    BackCommit(Addr),
    /// Pop the continuation, then fail to the next one. Implements
    /// negative lookahead.
    FailTwice,
    /// Fail to the current failure continuation.
    Fail,
    /// Call a rule: consult the memo table, then push a call frame.
    Call(RuleId),
    /// Return from a rule call; at the bottom frame, accept the match.
    Return,
    /// Jump through a first-byte dispatch table.
    Dispatch(TableId),

    // ------------------------------------------------------------------
    // AST log
    // ------------------------------------------------------------------
    /// Log: begin a node at the current position.
    Open,
    /// Log: finish the innermost open node at the current position.
    Close,
    /// Log: set the tag of the node under construction.
    Tag(NameId),
    /// Log: override the captured text of the node under construction.
    Replace(LitId),
    /// Save the log length for a following `Attach`.
    MarkLog,
    /// Commit the log segment since the matching `MarkLog` and attach the
    /// resulting node under `slot`. Negative slots attach unlabeled.
    Attach { slot: i16 },

    // ------------------------------------------------------------------
    // Context
    // ------------------------------------------------------------------
    /// Save the cursor for a following `SymDef`.
    MarkPos,
    /// Bind the text consumed since the matching `MarkPos` in a table.
    SymDef(NameId),
    /// Consume the exact text of the latest binding in a table, or fail.
    /// Fails when the table is empty.
    SymIs(NameId),
    /// Succeed when the table holds a binding. Consumes nothing.
    SymExists(NameId),
    /// Save the symbol-stack depth for a following `CutSyms`.
    MarkSyms,
    /// Drop bindings made since the matching `MarkSyms`.
    CutSyms,
    /// Bind the current line indentation in a table. Consumes nothing.
    IndentDef(NameId),
    /// Succeed when the flag equals `expect`. Consumes nothing.
    TestFlag { flag: FlagId, expect: bool },
    /// Set a flag, journaling the old value for rollback.
    SetFlag { flag: FlagId, value: bool },
}
