//! Committed syntax trees.
//!
//! [`commit`] replays a slice of the AST log into arena nodes. Nodes are
//! owned and lifetime-free: each captures its span's text (or the
//! override installed by a replace op) at commit time, so a [`Tree`]
//! outlives both the input and the program that produced it.
//!
//! A memoized rule can commit a node during an attempt that later backs
//! out; the node stays in the arena as an orphan. Orphans are
//! unreachable from the root and only cost their own storage.

use std::fmt::Write as _;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use woodrat_program::{LitId, NameId, Program};

use crate::log::AstOp;

/// Index of a node in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    tag: Option<NameId>,
    start: usize,
    end: usize,
    text: Box<[u8]>,
    children: Vec<(i16, NodeId)>,
}

/// Append-only node storage.
#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    nodes: Vec<NodeData>,
}

impl NodeArena {
    pub(crate) fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(data);
        id
    }

    fn get(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }
}

/// In-flight node state during replay.
struct Pending {
    start: usize,
    tag: Option<NameId>,
    replace: Option<LitId>,
    children: Vec<(i16, NodeId)>,
}

/// Replay a log slice into the arena.
///
/// Returns the node the slice built, or `None` when it holds no
/// structural ops. When several nodes float free at the top of the
/// slice, the last one wins; that matches the one-node-per-rule shape
/// the compiler warns about everywhere else.
pub(crate) fn commit(
    arena: &mut NodeArena,
    ops: &[AstOp],
    input: &[u8],
    program: &Program,
) -> Option<NodeId> {
    let mut open: Vec<Pending> = Vec::new();
    let mut done: Option<NodeId> = None;

    for &op in ops {
        match op {
            AstOp::Open { pos } => open.push(Pending {
                start: pos as usize,
                tag: None,
                replace: None,
                children: Vec::new(),
            }),
            AstOp::Close { pos } => {
                let Some(pending) = open.pop() else { continue };
                let node = seal(arena, pending, pos as usize, input, program);
                place(&mut open, &mut done, -1, node);
            }
            // A tag or replace op outside any open node retargets the
            // node a callee just finished. This is how operation rules
            // relabel their caller's result.
            AstOp::Tag(name) => match open.last_mut() {
                Some(pending) => pending.tag = Some(name),
                None => {
                    if let Some(node) = done {
                        arena.get_mut(node).tag = Some(name);
                    }
                }
            },
            AstOp::Replace(lit) => match open.last_mut() {
                Some(pending) => pending.replace = Some(lit),
                None => {
                    if let Some(node) = done {
                        arena.get_mut(node).text = program.lit(lit).to_vec().into_boxed_slice();
                    }
                }
            },
            AstOp::Attach { slot, node } => place(&mut open, &mut done, slot, node),
        }
    }

    // A truncated slice can leave nodes open. Seal them at their own
    // start so the replay still produces something well formed.
    while let Some(pending) = open.pop() {
        let end = pending.start;
        let node = seal(arena, pending, end, input, program);
        place(&mut open, &mut done, -1, node);
    }

    done
}

fn place(open: &mut [Pending], done: &mut Option<NodeId>, slot: i16, node: NodeId) {
    match open.last_mut() {
        Some(parent) => parent.children.push((slot, node)),
        None => *done = Some(node),
    }
}

fn seal(
    arena: &mut NodeArena,
    pending: Pending,
    end: usize,
    input: &[u8],
    program: &Program,
) -> NodeId {
    let text = match pending.replace {
        Some(lit) => program.lit(lit).to_vec().into_boxed_slice(),
        None => input
            .get(pending.start..end)
            .unwrap_or_default()
            .to_vec()
            .into_boxed_slice(),
    };
    arena.push(NodeData {
        tag: pending.tag,
        start: pending.start,
        end,
        text,
        children: pending.children,
    })
}

/// A finished parse tree.
///
/// Self-contained: node text and tag names are captured at build time,
/// so the tree borrows nothing.
#[derive(Debug)]
pub struct Tree {
    arena: NodeArena,
    root: NodeId,
    names: Vec<String>,
}

impl Tree {
    pub(crate) fn new(arena: NodeArena, root: NodeId, program: &Program) -> Self {
        Self {
            arena,
            root,
            names: program.names().to_vec(),
        }
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: self.root,
        }
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    /// Nodes in the arena, orphans included.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Renders the tree in grammar-flavored form: `(#tag 'text')` for
    /// leaves, labeled children as `$0(..)`.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.root().render(&mut out);
        out.push('\n');
        out
    }
}

/// Borrowed view of one node.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tag(&self) -> Option<&'t str> {
        self.data().tag.map(|name| self.tree.names[name.index()].as_str())
    }

    /// Captured text: the matched span, unless a replace op overrode it.
    pub fn text(&self) -> &'t [u8] {
        &self.data().text
    }

    /// Captured text as UTF-8, when it is.
    pub fn text_str(&self) -> Option<&'t str> {
        std::str::from_utf8(self.text()).ok()
    }

    /// Byte span `[start, end)` in the original input.
    pub fn span(&self) -> (usize, usize) {
        let data = self.data();
        (data.start, data.end)
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    /// Children in attachment order, with their slots. Unlabeled
    /// attachments carry a negative slot.
    pub fn children(&self) -> impl Iterator<Item = (i16, NodeRef<'t>)> + 't {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |&(slot, id)| (slot, NodeRef { tree, id }))
    }

    /// First child attached under `slot`.
    pub fn child(&self, slot: i16) -> Option<NodeRef<'t>> {
        self.children()
            .find(|&(at, _)| at == slot)
            .map(|(_, node)| node)
    }

    fn data(&self) -> &'t NodeData {
        self.tree.arena.get(self.id)
    }

    fn render(&self, out: &mut String) {
        out.push('(');
        match self.tag() {
            Some(tag) => {
                out.push('#');
                out.push_str(tag);
            }
            None => out.push('_'),
        }
        let data = self.data();
        if data.children.is_empty() {
            out.push_str(" '");
            push_text(out, &data.text);
            out.push('\'');
        } else {
            for (slot, child) in self.children() {
                out.push(' ');
                if slot >= 0 {
                    let _ = write!(out, "${slot}");
                }
                child.render(out);
            }
        }
        out.push(')');
    }
}

fn push_text(out: &mut String, bytes: &[u8]) {
    for &byte in bytes {
        match byte {
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b'\'' | b'\\' => {
                out.push('\\');
                out.push(byte as char);
            }
            0x20..=0x7e => out.push(byte as char),
            _ => {
                let _ = write!(out, "\\x{byte:02x}");
            }
        }
    }
}

impl Serialize for Tree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.root().serialize(serializer)
    }
}

impl Serialize for NodeRef<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        node_entries(&mut map, self)?;
        map.end()
    }
}

struct ChildEntry<'t> {
    slot: i16,
    node: NodeRef<'t>,
}

impl Serialize for ChildEntry<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        if self.slot >= 0 {
            map.serialize_entry("slot", &self.slot)?;
        }
        node_entries(&mut map, &self.node)?;
        map.end()
    }
}

fn node_entries<M: SerializeMap>(map: &mut M, node: &NodeRef<'_>) -> Result<(), M::Error> {
    let (start, end) = node.span();
    map.serialize_entry("tag", &node.tag())?;
    map.serialize_entry("text", &String::from_utf8_lossy(node.text()))?;
    map.serialize_entry("span", &[start as u64, end as u64])?;
    if node.child_count() > 0 {
        let children: Vec<ChildEntry<'_>> = node
            .children()
            .map(|(slot, node)| ChildEntry { slot, node })
            .collect();
        map.serialize_entry("children", &children)?;
    }
    Ok(())
}
