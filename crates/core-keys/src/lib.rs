//! core-keys: the logical keystroke model shared by every input-facing crate.
//!
//! A keystroke is the triple `(modifier bitset, codepoint, special key)`.
//! Equality is bitwise over all three fields, which makes keystrokes usable
//! as trie edge labels and as macro entries without any normalization pass.
//!
//! Two sentinel keystrokes exist for keymap patterns only and are never
//! produced by a terminal: [`Keystroke::NUMERIC`] (written `##`) matches any
//! decimal digit while a count is being accumulated, and
//! [`Keystroke::WILDCARD`] (written `**`) matches any keystroke and captures
//! its codepoint.

use std::fmt;

mod parse;

pub use parse::{KeyParseError, parse_key, parse_key_pattern, parse_macro_line};

bitflags::bitflags! {
    /// Modifier bitset carried by every keystroke.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Mods: u8 {
        const CTRL  = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const SHIFT = 0b0000_0100;
    }
}

/// Named non-printable keys. The token table in [`parse`] maps each variant
/// to its canonical spelling (`enter`, `page-up`, `f5`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    Enter,
    Tab,
    Backspace,
    Esc,
    Space,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    F(u8),
}

/// The codepoint / special-key half of a keystroke.
///
/// `Numeric` and `Wildcard` are the pattern sentinels; they compare equal
/// only to themselves, so a trie edge labelled with one can never be taken
/// by accident through plain equality lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Special(SpecialKey),
    Numeric,
    Wildcard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keystroke {
    pub mods: Mods,
    pub code: KeyCode,
}

impl Keystroke {
    /// The `##` sentinel: matches any decimal digit during count accumulation.
    pub const NUMERIC: Keystroke = Keystroke {
        mods: Mods::empty(),
        code: KeyCode::Numeric,
    };

    /// The `**` sentinel: matches any keystroke, capturing its codepoint.
    pub const WILDCARD: Keystroke = Keystroke {
        mods: Mods::empty(),
        code: KeyCode::Wildcard,
    };

    pub const fn ch(c: char) -> Self {
        Self {
            mods: Mods::empty(),
            code: KeyCode::Char(c),
        }
    }

    pub const fn ctrl(c: char) -> Self {
        Self {
            mods: Mods::CTRL,
            code: KeyCode::Char(c),
        }
    }

    pub const fn alt(c: char) -> Self {
        Self {
            mods: Mods::ALT,
            code: KeyCode::Char(c),
        }
    }

    pub const fn special(key: SpecialKey) -> Self {
        Self {
            mods: Mods::empty(),
            code: KeyCode::Special(key),
        }
    }

    pub const fn with_mods(mut self, mods: Mods) -> Self {
        self.mods = mods;
        self
    }

    /// True for an unmodified ASCII digit; these feed numeric accumulation.
    pub fn is_digit(&self) -> bool {
        self.mods.is_empty() && matches!(self.code, KeyCode::Char(c) if c.is_ascii_digit())
    }

    /// The digit value, when [`is_digit`](Self::is_digit) holds.
    pub fn digit_value(&self) -> Option<u32> {
        if !self.mods.is_empty() {
            return None;
        }
        match self.code {
            KeyCode::Char(c) => c.to_digit(10),
            _ => None,
        }
    }

    /// Codepoint captured by a wildcard edge. Keys without a printable
    /// codepoint capture `'\0'` verbatim.
    pub fn codepoint(&self) -> char {
        match self.code {
            KeyCode::Char(c) => c,
            KeyCode::Special(SpecialKey::Space) => ' ',
            KeyCode::Special(SpecialKey::Tab) => '\t',
            _ => '\0',
        }
    }
}

impl SpecialKey {
    pub fn name(&self) -> String {
        match self {
            SpecialKey::Enter => "enter".into(),
            SpecialKey::Tab => "tab".into(),
            SpecialKey::Backspace => "backspace".into(),
            SpecialKey::Esc => "esc".into(),
            SpecialKey::Space => "space".into(),
            SpecialKey::Insert => "insert".into(),
            SpecialKey::Delete => "delete".into(),
            SpecialKey::Home => "home".into(),
            SpecialKey::End => "end".into(),
            SpecialKey::PageUp => "page-up".into(),
            SpecialKey::PageDown => "page-down".into(),
            SpecialKey::Up => "up".into(),
            SpecialKey::Down => "down".into(),
            SpecialKey::Left => "left".into(),
            SpecialKey::Right => "right".into(),
            SpecialKey::F(n) => format!("f{n}"),
        }
    }
}

impl fmt::Display for Keystroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mods.contains(Mods::CTRL) {
            write!(f, "C-")?;
        }
        if self.mods.contains(Mods::ALT) {
            write!(f, "M-")?;
        }
        if self.mods.contains(Mods::SHIFT) {
            write!(f, "S-")?;
        }
        match self.code {
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Special(key) => write!(f, "{}", key.name()),
            KeyCode::Numeric => write!(f, "##"),
            KeyCode::Wildcard => write!(f, "**"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sentinels_compare_equal_only_to_themselves() {
        assert_eq!(Keystroke::NUMERIC, Keystroke::NUMERIC);
        assert_ne!(Keystroke::NUMERIC, Keystroke::WILDCARD);
        assert_ne!(Keystroke::NUMERIC, Keystroke::ch('#'));
        assert_ne!(Keystroke::WILDCARD, Keystroke::ch('*'));
    }

    #[test]
    fn equality_includes_modifiers() {
        assert_ne!(Keystroke::ch('a'), Keystroke::ctrl('a'));
        assert_ne!(Keystroke::ctrl('a'), Keystroke::alt('a'));
        assert_eq!(Keystroke::ctrl('a'), Keystroke::ctrl('a'));
    }

    #[test]
    fn digit_detection() {
        assert!(Keystroke::ch('0').is_digit());
        assert!(Keystroke::ch('9').is_digit());
        assert!(!Keystroke::ch('a').is_digit());
        assert!(!Keystroke::ctrl('1').is_digit());
        assert_eq!(Keystroke::ch('7').digit_value(), Some(7));
    }

    #[test]
    fn codepoint_capture_is_verbatim() {
        assert_eq!(Keystroke::ch('x').codepoint(), 'x');
        assert_eq!(Keystroke::special(SpecialKey::Enter).codepoint(), '\0');
        assert_eq!(Keystroke::special(SpecialKey::Space).codepoint(), ' ');
    }

    #[test]
    fn display_round_trips_through_parser() {
        for key in [
            Keystroke::ch('a'),
            Keystroke::ctrl('x'),
            Keystroke::alt('λ'),
            Keystroke::special(SpecialKey::PageUp),
            Keystroke::special(SpecialKey::F(5)),
            Keystroke::NUMERIC,
            Keystroke::WILDCARD,
        ] {
            let text = key.to_string();
            assert_eq!(parse_key(&text).unwrap(), key, "token `{text}`");
        }
    }
}
