//! The dispatch resolver: one keystroke in, one of three outcomes out.
//!
//! Per-step lookup order at a node:
//! 1. numeric accumulation (digit + `##` child present)
//! 2. numeric finalization (pending digit run, any other key)
//! 3. exact child match
//! 4. wildcard (`**`) fallback with codepoint capture
//!
//! A top-level miss consults the keymap's default command, then the keymap
//! beneath it when `allow_fallthru` is set, then reports unbound. A miss in
//! the middle of a chord is unbound immediately and discards the partial
//! path. Parameter buffers are preserved across need-more returns and
//! survive a resolved command until the caller clears them after execution.

use core_keys::Keystroke;
use tracing::{trace, warn};

use crate::{Keymap, KeymapRegistry, NodeId, ROOT};

/// Longest accepted digit run for one numeric parameter.
pub const MAX_NUMERIC_DIGITS: usize = 8;
/// Most numeric parameters one chord may capture.
pub const MAX_NUMERIC_PARAMS: usize = 8;
/// Most wildcard parameters one chord may capture.
pub const MAX_WILDCARD_PARAMS: usize = 8;

/// Where a partially-consumed chord is parked between keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    stack_pos: usize,
    node: NodeId,
}

/// Mutable resolver state carried by the loop context.
#[derive(Debug, Clone, Default)]
pub struct ResolveState {
    anchor: Option<Anchor>,
    numeric_buf: String,
    pub numeric_params: Vec<u32>,
    pub wildcard_params: Vec<char>,
    pub need_more: bool,
}

impl ResolveState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a chord is pending (binding node set or digits buffered).
    pub fn mid_chord(&self) -> bool {
        self.anchor.is_some() || !self.numeric_buf.is_empty()
    }

    /// Discard the pending chord and everything it captured.
    pub fn abort_chord(&mut self) {
        self.anchor = None;
        self.numeric_buf.clear();
        self.numeric_params.clear();
        self.wildcard_params.clear();
        self.need_more = false;
    }

    /// Clear parameter buffers after a command has executed.
    pub fn clear_after_command(&mut self) {
        self.abort_chord();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub command: String,
    pub param: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Command(ResolvedCommand),
    NeedMore,
    Unbound,
}

enum Step {
    Done(Resolution),
    /// Top-level miss in one keymap; the stack policy decides what is next.
    Miss,
}

/// Resolve one keystroke against the view's keymap stack. The tail of
/// `stack` is the most recently pushed keymap and is consulted first. With
/// `peek` set, `state` is left untouched regardless of outcome.
pub fn resolve(
    registry: &KeymapRegistry,
    stack: &[String],
    state: &mut ResolveState,
    input: Keystroke,
    peek: bool,
) -> Resolution {
    let mut work = state.clone();
    let out = resolve_step(registry, stack, &mut work, input);
    if !peek {
        *state = work;
    }
    out
}

fn resolve_step(
    registry: &KeymapRegistry,
    stack: &[String],
    st: &mut ResolveState,
    input: Keystroke,
) -> Resolution {
    if let Some(anchor) = st.anchor {
        let Some(map) = stack
            .get(anchor.stack_pos)
            .and_then(|name| registry.get(name))
        else {
            // The stack changed under a pending chord; nothing to resume.
            st.abort_chord();
            return Resolution::Unbound;
        };
        return match lookup_at(map, anchor.stack_pos, anchor.node, st, input) {
            Step::Done(res) => res,
            Step::Miss => {
                st.abort_chord();
                Resolution::Unbound
            }
        };
    }

    // Fresh chord: consult the stack tail-first.
    let mut pos = stack.len();
    while pos > 0 {
        pos -= 1;
        let name = &stack[pos];
        let Some(map) = registry.get(name) else {
            warn!(target: "input.map", keymap = %name, "stack names unregistered keymap");
            continue;
        };
        match lookup_at(map, pos, ROOT, st, input) {
            Step::Done(res) => return res,
            Step::Miss => {
                if let Some(cmd) = &map.default_command {
                    trace!(target: "input.map", keymap = %map.name, command = %cmd, "default_command");
                    return Resolution::Command(ResolvedCommand {
                        command: cmd.clone(),
                        param: None,
                    });
                }
                if map.allow_fallthru {
                    continue;
                }
                st.abort_chord();
                return Resolution::Unbound;
            }
        }
    }
    st.abort_chord();
    Resolution::Unbound
}

fn lookup_at(
    map: &Keymap,
    stack_pos: usize,
    start: NodeId,
    st: &mut ResolveState,
    input: Keystroke,
) -> Step {
    let tree = map.tree();
    let mut node = start;
    let anchored = st.anchor.is_some();
    loop {
        // 1. Numeric accumulation.
        if input.is_digit() && tree.child(node, Keystroke::NUMERIC).is_some() {
            if st.numeric_buf.len() >= MAX_NUMERIC_DIGITS {
                warn!(target: "input.map", keymap = %map.name, "numeric buffer overflow, chord aborted");
                st.abort_chord();
                return Step::Done(Resolution::Unbound);
            }
            st.numeric_buf.push(input.codepoint());
            st.anchor = Some(Anchor { stack_pos, node });
            st.need_more = true;
            trace!(target: "input.map", keymap = %map.name, node, buf = %st.numeric_buf, "numeric_accumulate");
            return Step::Done(Resolution::NeedMore);
        }

        // 2. Numeric finalization: the digit run ended, descend the `##` edge
        // and retry this same input from its subtree.
        if !st.numeric_buf.is_empty() {
            let Some(numeric_child) = tree.child(node, Keystroke::NUMERIC) else {
                st.abort_chord();
                return Step::Done(Resolution::Unbound);
            };
            if st.numeric_params.len() >= MAX_NUMERIC_PARAMS {
                warn!(target: "input.map", keymap = %map.name, "numeric parameter overflow, chord aborted");
                st.abort_chord();
                return Step::Done(Resolution::Unbound);
            }
            let Ok(value) = st.numeric_buf.parse::<u32>() else {
                st.abort_chord();
                return Step::Done(Resolution::Unbound);
            };
            trace!(target: "input.map", keymap = %map.name, value, "numeric_finalize");
            st.numeric_params.push(value);
            st.numeric_buf.clear();
            node = numeric_child;
            continue;
        }

        // 3. Exact match, then 4. wildcard fallback.
        let next = if let Some(child) = tree.child(node, input) {
            Some(child)
        } else if let Some(child) = tree.child(node, Keystroke::WILDCARD) {
            if st.wildcard_params.len() >= MAX_WILDCARD_PARAMS {
                warn!(target: "input.map", keymap = %map.name, "wildcard parameter overflow, chord aborted");
                st.abort_chord();
                return Step::Done(Resolution::Unbound);
            }
            st.wildcard_params.push(input.codepoint());
            trace!(target: "input.map", keymap = %map.name, node, "wildcard_capture");
            Some(child)
        } else {
            None
        };

        let Some(child) = next else {
            if anchored {
                st.abort_chord();
                return Step::Done(Resolution::Unbound);
            }
            return Step::Miss;
        };

        if let Some(binding) = tree.leaf(child) {
            trace!(target: "input.map", keymap = %map.name, command = %binding.command, "resolved");
            st.anchor = None;
            st.numeric_buf.clear();
            st.need_more = false;
            return Step::Done(Resolution::Command(ResolvedCommand {
                command: binding.command.clone(),
                param: binding.param.clone(),
            }));
        }

        st.anchor = Some(Anchor {
            stack_pos,
            node: child,
        });
        st.need_more = true;
        trace!(target: "input.map", keymap = %map.name, node = child, "need_more");
        return Step::Done(Resolution::NeedMore);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_keys::SpecialKey;
    use pretty_assertions::assert_eq;

    fn registry_with(maps: Vec<Keymap>) -> KeymapRegistry {
        let mut reg = KeymapRegistry::new();
        for m in maps {
            reg.insert(m);
        }
        reg
    }

    fn cmd(name: &str, param: Option<&str>) -> Resolution {
        Resolution::Command(ResolvedCommand {
            command: name.to_string(),
            param: param.map(str::to_string),
        })
    }

    fn feed(
        reg: &KeymapRegistry,
        stack: &[String],
        st: &mut ResolveState,
        keys: &[Keystroke],
    ) -> Vec<Resolution> {
        keys.iter()
            .map(|k| resolve(reg, stack, st, *k, false))
            .collect()
    }

    fn normal_stack() -> Vec<String> {
        vec!["normal".to_string()]
    }

    #[test]
    fn multi_key_chord_resolves_once() {
        let mut map = Keymap::new("normal", None, false);
        map.bind("copy-by", "C-c d", Some("bracket")).unwrap();
        map.bind("copy-by", "C-c w", Some("word")).unwrap();
        let reg = registry_with(vec![map]);
        let mut st = ResolveState::new();

        let out = feed(
            &reg,
            &normal_stack(),
            &mut st,
            &[Keystroke::ctrl('c'), Keystroke::ch('d')],
        );
        assert_eq!(
            out,
            vec![Resolution::NeedMore, cmd("copy-by", Some("bracket"))]
        );
        assert!(!st.mid_chord());
    }

    #[test]
    fn numeric_prefix_then_terminal_key() {
        let mut map = Keymap::new("normal", None, false);
        map.bind("move-relative", "M-y ## u", Some("up")).unwrap();
        let reg = registry_with(vec![map]);
        let mut st = ResolveState::new();

        let out = feed(
            &reg,
            &normal_stack(),
            &mut st,
            &[
                Keystroke::alt('y'),
                Keystroke::ch('1'),
                Keystroke::ch('2'),
                Keystroke::ch('u'),
            ],
        );
        assert_eq!(
            out,
            vec![
                Resolution::NeedMore,
                Resolution::NeedMore,
                Resolution::NeedMore,
                cmd("move-relative", Some("up")),
            ]
        );
        assert_eq!(st.numeric_params, vec![12]);
        assert!(st.wildcard_params.is_empty());
    }

    #[test]
    fn wildcard_captures_codepoint_in_order() {
        let mut map = Keymap::new("normal", None, false);
        map.bind("mark-set", "M-m **", None).unwrap();
        let reg = registry_with(vec![map]);
        let mut st = ResolveState::new();

        feed(
            &reg,
            &normal_stack(),
            &mut st,
            &[Keystroke::alt('m'), Keystroke::ch('z')],
        );
        assert_eq!(st.wildcard_params, vec!['z']);
    }

    #[test]
    fn wildcard_captures_zero_codepoint_verbatim() {
        let mut map = Keymap::new("normal", None, false);
        map.bind("mark-set", "M-m **", None).unwrap();
        let reg = registry_with(vec![map]);
        let mut st = ResolveState::new();

        let out = feed(
            &reg,
            &normal_stack(),
            &mut st,
            &[Keystroke::alt('m'), Keystroke::special(SpecialKey::Enter)],
        );
        assert_eq!(out[1], cmd("mark-set", None));
        assert_eq!(st.wildcard_params, vec!['\0']);
    }

    #[test]
    fn fallthru_reaches_lower_map_and_its_default() {
        // Stack bottom-to-top: normal (no fallthru, default insert-data),
        // prompt-input (fallthru on). Unbound printable in prompt-input must
        // land on normal's default.
        let mut normal = Keymap::new("normal", Some("insert-data"), false);
        normal.bind("quit", "C-x", None).unwrap();
        let mut prompt = Keymap::new("prompt-input", None, true);
        prompt.bind("prompt-submit", "enter", None).unwrap();
        let reg = registry_with(vec![normal, prompt]);
        let stack = vec!["normal".to_string(), "prompt-input".to_string()];
        let mut st = ResolveState::new();

        assert_eq!(
            resolve(&reg, &stack, &mut st, Keystroke::ch('x'), false),
            cmd("insert-data", None)
        );
        // Bound key in the lower map is reachable through fallthru too.
        assert_eq!(
            resolve(&reg, &stack, &mut st, Keystroke::ctrl('x'), false),
            cmd("quit", None)
        );
    }

    #[test]
    fn fallthru_monotonicity() {
        let mut lower = Keymap::new("lower", None, false);
        lower.bind("c", "x", None).unwrap();
        let upper_fallthru = Keymap::new("upper", None, true);
        let upper_opaque = Keymap::new("upper", None, false);
        let stack = vec!["lower".to_string(), "upper".to_string()];

        let reg = registry_with(vec![lower.clone(), upper_fallthru]);
        let mut st = ResolveState::new();
        assert_eq!(
            resolve(&reg, &stack, &mut st, Keystroke::ch('x'), false),
            cmd("c", None)
        );

        let reg = registry_with(vec![lower, upper_opaque]);
        let mut st = ResolveState::new();
        assert_eq!(
            resolve(&reg, &stack, &mut st, Keystroke::ch('x'), false),
            Resolution::Unbound
        );
    }

    #[test]
    fn default_command_beats_fallthru() {
        let mut lower = Keymap::new("lower", None, false);
        lower.bind("c", "x", None).unwrap();
        let upper = Keymap::new("upper", Some("insert-data"), true);
        let reg = registry_with(vec![lower, upper]);
        let stack = vec!["lower".to_string(), "upper".to_string()];
        let mut st = ResolveState::new();

        assert_eq!(
            resolve(&reg, &stack, &mut st, Keystroke::ch('x'), false),
            cmd("insert-data", None)
        );
    }

    #[test]
    fn mid_chord_miss_is_unbound_and_discards_path() {
        let mut map = Keymap::new("normal", Some("insert-data"), false);
        map.bind("copy-by", "C-c d", None).unwrap();
        let reg = registry_with(vec![map]);
        let mut st = ResolveState::new();

        let out = feed(
            &reg,
            &normal_stack(),
            &mut st,
            &[Keystroke::ctrl('c'), Keystroke::ch('z')],
        );
        // The default command does not apply mid-chord.
        assert_eq!(out, vec![Resolution::NeedMore, Resolution::Unbound]);
        assert!(!st.mid_chord());

        // The aborted chord leaves no residue for the next resolution.
        assert_eq!(
            resolve(&reg, &normal_stack(), &mut st, Keystroke::ch('z'), false),
            cmd("insert-data", None)
        );
    }

    #[test]
    fn numeric_buffer_boundary() {
        let mut map = Keymap::new("normal", None, false);
        map.bind("goto", "## g", None).unwrap();
        let reg = registry_with(vec![map]);
        let mut st = ResolveState::new();
        let stack = normal_stack();

        for _ in 0..MAX_NUMERIC_DIGITS {
            assert_eq!(
                resolve(&reg, &stack, &mut st, Keystroke::ch('9'), false),
                Resolution::NeedMore
            );
        }
        // One digit past the maximum aborts the whole chord.
        assert_eq!(
            resolve(&reg, &stack, &mut st, Keystroke::ch('9'), false),
            Resolution::Unbound
        );
        assert!(!st.mid_chord());
        assert!(st.numeric_params.is_empty());
    }

    #[test]
    fn numeric_params_parse_decimal() {
        let mut map = Keymap::new("normal", None, false);
        map.bind("goto", "## g", None).unwrap();
        let reg = registry_with(vec![map]);
        let mut st = ResolveState::new();
        let keys: Vec<Keystroke> = "00123".chars().map(Keystroke::ch).collect();
        feed(&reg, &normal_stack(), &mut st, &keys);
        assert_eq!(
            resolve(&reg, &normal_stack(), &mut st, Keystroke::ch('g'), false),
            cmd("goto", None)
        );
        assert_eq!(st.numeric_params, vec![123]);
        assert!(st.wildcard_params.is_empty());
    }

    #[test]
    fn digits_prefer_numeric_edge_over_wildcard() {
        let mut map = Keymap::new("normal", None, false);
        map.bind("goto", "## g", None).unwrap();
        map.bind("mark-set", "**", None).unwrap();
        let reg = registry_with(vec![map]);
        let mut st = ResolveState::new();

        assert_eq!(
            resolve(&reg, &normal_stack(), &mut st, Keystroke::ch('5'), false),
            Resolution::NeedMore
        );
        assert!(st.wildcard_params.is_empty());
        // A non-digit key finalizes the count and then resolves.
        assert_eq!(
            resolve(&reg, &normal_stack(), &mut st, Keystroke::ch('g'), false),
            cmd("goto", None)
        );
        assert_eq!(st.numeric_params, vec![5]);
    }

    #[test]
    fn peek_leaves_state_untouched() {
        let mut map = Keymap::new("normal", Some("insert-data"), false);
        map.bind("copy-by", "C-c d", None).unwrap();
        let reg = registry_with(vec![map]);
        let mut st = ResolveState::new();

        let out = resolve(&reg, &normal_stack(), &mut st, Keystroke::ctrl('c'), true);
        assert_eq!(out, Resolution::NeedMore);
        assert!(!st.mid_chord());
        assert!(!st.need_more);
    }

    #[test]
    fn resolution_is_deterministic() {
        let mut map = Keymap::new("normal", Some("insert-data"), false);
        map.bind("move-relative", "M-y ## **", None).unwrap();
        map.bind("copy-by", "C-c d", Some("bracket")).unwrap();
        let reg = registry_with(vec![map]);
        let keys = [
            Keystroke::alt('y'),
            Keystroke::ch('4'),
            Keystroke::ch('2'),
            Keystroke::ch('q'),
            Keystroke::ctrl('c'),
            Keystroke::ch('d'),
            Keystroke::ch('p'),
        ];

        let mut st1 = ResolveState::new();
        let mut st2 = ResolveState::new();
        let out1 = feed(&reg, &normal_stack(), &mut st1, &keys);
        let out2 = feed(&reg, &normal_stack(), &mut st2, &keys);
        assert_eq!(out1, out2);
        assert_eq!(st1.numeric_params, st2.numeric_params);
        assert_eq!(st1.wildcard_params, st2.wildcard_params);
    }

    #[test]
    fn unregistered_stack_entry_is_skipped() {
        let mut lower = Keymap::new("lower", None, false);
        lower.bind("c", "x", None).unwrap();
        let reg = registry_with(vec![lower]);
        let stack = vec!["lower".to_string(), "ghost".to_string()];
        let mut st = ResolveState::new();
        assert_eq!(
            resolve(&reg, &stack, &mut st, Keystroke::ch('x'), false),
            cmd("c", None)
        );
    }
}
