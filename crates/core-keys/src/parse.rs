//! Key-token and macro-line parsing.
//!
//! Grammar for a single token:
//!
//! ```text
//! token   := "##" | "**" | prefix* base
//! prefix  := "C-" | "M-" | "S-"
//! base    := named key | single UTF-8 character
//! ```
//!
//! Patterns are space-separated token sequences; macro lines are
//! `name,key1,key2,...` where each key uses the same tokenizer.

use crate::{KeyCode, Keystroke, Mods, SpecialKey};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid key token `{token}`: {reason}")]
pub struct KeyParseError {
    pub token: String,
    pub reason: String,
}

impl KeyParseError {
    fn new(token: &str, reason: impl Into<String>) -> Self {
        Self {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

fn named_key(name: &str) -> Option<SpecialKey> {
    let key = match name {
        "enter" => SpecialKey::Enter,
        "tab" => SpecialKey::Tab,
        "backspace" => SpecialKey::Backspace,
        "esc" => SpecialKey::Esc,
        "space" => SpecialKey::Space,
        "insert" => SpecialKey::Insert,
        "delete" => SpecialKey::Delete,
        "home" => SpecialKey::Home,
        "end" => SpecialKey::End,
        "page-up" | "pgup" => SpecialKey::PageUp,
        "page-down" | "pgdn" => SpecialKey::PageDown,
        "up" => SpecialKey::Up,
        "down" => SpecialKey::Down,
        "left" => SpecialKey::Left,
        "right" => SpecialKey::Right,
        _ => {
            let n = name.strip_prefix('f')?.parse::<u8>().ok()?;
            if n == 0 || n > 12 {
                return None;
            }
            SpecialKey::F(n)
        }
    };
    Some(key)
}

/// Parse one key token.
pub fn parse_key(token: &str) -> Result<Keystroke, KeyParseError> {
    if token.is_empty() {
        return Err(KeyParseError::new(token, "empty token"));
    }
    match token {
        "##" => return Ok(Keystroke::NUMERIC),
        "**" => return Ok(Keystroke::WILDCARD),
        _ => {}
    }

    let mut mods = Mods::empty();
    let mut rest = token;
    loop {
        let (flag, tail) = match rest.as_bytes() {
            [b'C', b'-', ..] => (Mods::CTRL, &rest[2..]),
            [b'M', b'-', ..] => (Mods::ALT, &rest[2..]),
            [b'S', b'-', ..] => (Mods::SHIFT, &rest[2..]),
            _ => break,
        };
        if tail.is_empty() {
            return Err(KeyParseError::new(token, "modifier prefix with no key"));
        }
        if mods.contains(flag) {
            return Err(KeyParseError::new(token, "duplicate modifier prefix"));
        }
        mods |= flag;
        rest = tail;
    }

    if let Some(key) = named_key(rest) {
        return Ok(Keystroke {
            mods,
            code: KeyCode::Special(key),
        });
    }

    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Keystroke {
            mods,
            code: KeyCode::Char(c),
        }),
        _ => Err(KeyParseError::new(token, "unknown key name")),
    }
}

/// Parse a space-separated key pattern into the sequence of trie edges it
/// describes. Empty patterns are rejected; a binding must consume at least
/// one keystroke.
pub fn parse_key_pattern(pattern: &str) -> Result<Vec<Keystroke>, KeyParseError> {
    let keys = pattern
        .split_whitespace()
        .map(parse_key)
        .collect::<Result<Vec<_>, _>>()?;
    if keys.is_empty() {
        return Err(KeyParseError::new(pattern, "empty key pattern"));
    }
    Ok(keys)
}

/// Parse a `name,key1,key2,...` macro definition line.
pub fn parse_macro_line(line: &str) -> Result<(String, Vec<Keystroke>), KeyParseError> {
    let mut fields = line.split(',');
    let name = fields.next().unwrap_or("").trim();
    if name.is_empty() {
        return Err(KeyParseError::new(line, "macro definition without a name"));
    }
    let keys = fields
        .map(|tok| parse_key(tok.trim()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((name.to_string(), keys))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_and_modified_characters() {
        assert_eq!(parse_key("a").unwrap(), Keystroke::ch('a'));
        assert_eq!(parse_key("C-a").unwrap(), Keystroke::ctrl('a'));
        assert_eq!(parse_key("M-x").unwrap(), Keystroke::alt('x'));
        assert_eq!(
            parse_key("C-M-d").unwrap(),
            Keystroke::ch('d').with_mods(Mods::CTRL | Mods::ALT)
        );
    }

    #[test]
    fn named_keys_and_function_keys() {
        assert_eq!(
            parse_key("enter").unwrap(),
            Keystroke::special(SpecialKey::Enter)
        );
        assert_eq!(
            parse_key("page-up").unwrap(),
            Keystroke::special(SpecialKey::PageUp)
        );
        assert_eq!(
            parse_key("C-page-down").unwrap(),
            Keystroke::special(SpecialKey::PageDown).with_mods(Mods::CTRL)
        );
        assert_eq!(
            parse_key("f12").unwrap(),
            Keystroke::special(SpecialKey::F(12))
        );
        assert!(parse_key("f13").is_err());
        assert!(parse_key("f0").is_err());
    }

    #[test]
    fn sentinel_tokens() {
        assert_eq!(parse_key("##").unwrap(), Keystroke::NUMERIC);
        assert_eq!(parse_key("**").unwrap(), Keystroke::WILDCARD);
    }

    #[test]
    fn single_char_base_only() {
        assert!(parse_key("ab").is_err());
        assert!(parse_key("").is_err());
        assert!(parse_key("C-").is_err());
        assert!(parse_key("C-C-a").is_err());
    }

    #[test]
    fn multibyte_literal() {
        assert_eq!(parse_key("é").unwrap(), Keystroke::ch('é'));
        assert_eq!(parse_key("M-é").unwrap(), Keystroke::alt('é'));
    }

    #[test]
    fn pattern_splits_on_whitespace() {
        let keys = parse_key_pattern("C-c  d").unwrap();
        assert_eq!(keys, vec![Keystroke::ctrl('c'), Keystroke::ch('d')]);
        assert!(parse_key_pattern("   ").is_err());
    }

    #[test]
    fn macro_lines() {
        let (name, keys) = parse_macro_line("m1,h,i").unwrap();
        assert_eq!(name, "m1");
        assert_eq!(keys, vec![Keystroke::ch('h'), Keystroke::ch('i')]);

        let (name, keys) = parse_macro_line("empty").unwrap();
        assert_eq!(name, "empty");
        assert!(keys.is_empty());

        assert!(parse_macro_line(",h").is_err());
        assert!(parse_macro_line("m1,h,,i").is_err());
    }
}
