//! core-keymap: hierarchical keybinding storage and the dispatch resolver.
//!
//! Bindings live in a per-keymap trie whose edges are labelled with
//! [`Keystroke`]s; the sentinel edges `##` (numeric) and `**` (wildcard) make
//! a node match digit runs and arbitrary keys respectively. Keymaps are owned
//! by a name-keyed registry; each view carries an ordered stack of keymap
//! names consulted tail-first, with optional fallthrough to the map beneath
//! and an optional default command for unmatched top-level input.
//!
//! Resolution is pure and deterministic: it depends only on the registry, the
//! stack, the accumulated [`ResolveState`], and the incoming keystroke.
//! Traversal is logged at TRACE under the `input.map` target.

use std::collections::HashMap;

use core_keys::{KeyParseError, Keystroke, parse_key_pattern};
use smallvec::SmallVec;
use tracing::trace;

mod resolve;

pub use resolve::{
    MAX_NUMERIC_DIGITS, MAX_NUMERIC_PARAMS, MAX_WILDCARD_PARAMS, ResolveState, Resolution,
    ResolvedCommand, resolve,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeymapError {
    #[error(transparent)]
    Key(#[from] KeyParseError),
    #[error("keymap `{0}` is not registered")]
    UnknownKeymap(String),
}

// -------------------------------------------------------------------------------------------------
// Trie
// -------------------------------------------------------------------------------------------------

/// Leaf payload: the late-bound command name plus its static parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub command: String,
    pub param: Option<String>,
}

impl Binding {
    pub fn new(command: impl Into<String>, param: Option<&str>) -> Self {
        Self {
            command: command.into(),
            param: param.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone)]
struct Edge {
    key: Keystroke,
    next: usize,
}

/// Trie node. Invariant: after every mutation, a node has children, a leaf
/// payload, or both; "neither" is unreachable because nodes are only created
/// on the path of an insertion that terminates in a leaf.
#[derive(Debug, Clone, Default)]
struct Node {
    edges: SmallVec<[Edge; 4]>,
    leaf: Option<Binding>,
}

/// Index-based trie; node 0 is the synthetic root whose edges are the
/// first-token bindings. Fan-out is small in practice, so edges are a linear
/// small-vector rather than a hash map.
#[derive(Debug, Clone, Default)]
pub struct KeyTree {
    nodes: Vec<Node>,
}

/// Stable handle to a trie node, used by [`ResolveState`] to park a
/// mid-chord traversal between keystrokes.
pub type NodeId = usize;

pub const ROOT: NodeId = 0;

impl KeyTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    /// Insert a binding for a keystroke sequence, reusing existing prefix
    /// nodes. A later insertion for an identical sequence overrides the
    /// earlier leaf.
    pub fn bind(&mut self, sequence: &[Keystroke], binding: Binding) {
        debug_assert!(!sequence.is_empty(), "binding must consume a keystroke");
        let mut cur = ROOT;
        for key in sequence {
            cur = match self.child(cur, *key) {
                Some(next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[cur].edges.push(Edge { key: *key, next });
                    next
                }
            };
        }
        if self.nodes[cur].leaf.is_some() {
            trace!(target: "input.map", node = cur, command = %binding.command, "leaf_override");
        }
        self.nodes[cur].leaf = Some(binding);
    }

    pub fn child(&self, node: NodeId, key: Keystroke) -> Option<NodeId> {
        self.nodes[node]
            .edges
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.next)
    }

    pub fn leaf(&self, node: NodeId) -> Option<&Binding> {
        self.nodes[node].leaf.as_ref()
    }

    pub fn has_children(&self, node: NodeId) -> bool {
        !self.nodes[node].edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && !self.has_children(ROOT)
    }

    #[cfg(test)]
    fn node_shapes(&self) -> impl Iterator<Item = (bool, bool)> + '_ {
        self.nodes
            .iter()
            .skip(1)
            .map(|n| (!n.edges.is_empty(), n.leaf.is_some()))
    }
}

// -------------------------------------------------------------------------------------------------
// Keymap + registry
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Keymap {
    pub name: String,
    tree: KeyTree,
    /// Command invoked when no prefix of the input matches at the top level.
    pub default_command: Option<String>,
    /// Unmatched top-level lookups delegate to the next keymap on the stack.
    pub allow_fallthru: bool,
}

impl Keymap {
    pub fn new(
        name: impl Into<String>,
        default_command: Option<&str>,
        allow_fallthru: bool,
    ) -> Self {
        Self {
            name: name.into(),
            tree: KeyTree::new(),
            default_command: default_command.map(str::to_string),
            allow_fallthru,
        }
    }

    pub fn tree(&self) -> &KeyTree {
        &self.tree
    }

    /// Bind `command` to a space-separated key pattern (`C-c d`, `M-y ## u`).
    pub fn bind(
        &mut self,
        command: &str,
        pattern: &str,
        param: Option<&str>,
    ) -> Result<(), KeymapError> {
        let sequence = parse_key_pattern(pattern)?;
        trace!(target: "input.map", keymap = %self.name, command, pattern, "bind");
        self.tree.bind(&sequence, Binding::new(command, param));
        Ok(())
    }

    pub fn bind_keys(&mut self, command: &str, sequence: &[Keystroke], param: Option<&str>) {
        self.tree.bind(sequence, Binding::new(command, param));
    }
}

/// Editor-wide keymap ownership, keyed by name. Views reference keymaps by
/// name on their stacks; dangling names are skipped during resolution.
#[derive(Debug, Default)]
pub struct KeymapRegistry {
    maps: HashMap<String, Keymap>,
}

impl KeymapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, keymap: Keymap) {
        self.maps.insert(keymap.name.clone(), keymap);
    }

    pub fn get(&self, name: &str) -> Option<&Keymap> {
        self.maps.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Keymap> {
        self.maps.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.maps.contains_key(name)
    }

    pub fn require_mut(&mut self, name: &str) -> Result<&mut Keymap, KeymapError> {
        self.maps
            .get_mut(name)
            .ok_or_else(|| KeymapError::UnknownKeymap(name.to_string()))
    }
}
