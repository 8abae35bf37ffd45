//! Parses the `<...>` tokens the typist embeds in literal strings: named
//! modifier open/close brackets (`<ctrl>`...`</ctrl>`), one-shot chords
//! (`<ctrl-shift-a>`), and bare codepoint escapes (`<U+2603>`).
//!
//! Aliases are looked up through a perfect-hash map the same way evdev
//! key names are — trading the original's runtime hash table for a
//! `phf` map built at compile time.

use crate::keynames;

static MODIFIER_ALIASES: phf::Map<&'static str, u16> = phf::phf_map! {
    "ctrl" => 29,
    "control" => 29,
    "lctrl" => 29,
    "leftctrl" => 29,
    "rctrl" => 97,
    "rightctrl" => 97,
    "^" => 29,
    "⌃" => 29,
    "shift" => 42,
    "lshift" => 42,
    "leftshift" => 42,
    "rshift" => 54,
    "rightshift" => 54,
    "⇧" => 42,
    "+" => 42,
    "alt" => 56,
    "lalt" => 56,
    "leftalt" => 56,
    "ralt" => 100,
    "rightalt" => 100,
    "altgr" => 100,
    "⌥" => 56,
    "meta" => 125,
    "super" => 125,
    "win" => 125,
    "logo" => 125,
    "cmd" => 125,
    "lmeta" => 125,
    "leftmeta" => 125,
    "rmeta" => 126,
    "rightmeta" => 126,
    "⊞" => 125,
    "⌘" => 125,
    "caps" => 58,
    "capslock" => 58,
    "mod1" => 56,
    "mod2" => 56,
    "mod3" => 56,
    "mod4" => 125,
    "mod5" => 56,
};

/// One decoded token from inside a pair of angle brackets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `<mod1-mod2-...-key>`: press every modifier, tap `key`, release
    /// the modifiers in reverse.
    Chord { mods: Vec<u16>, key: u16 },
    /// `<name>`: hold a modifier open across the following literal text.
    ModPress(u16),
    /// `</name>`: release a modifier opened earlier.
    ModRelease(u16),
}

fn resolve_alias(name: &str) -> Option<u16> {
    let lower = name.to_ascii_lowercase();
    MODIFIER_ALIASES.get(lower.as_str()).copied()
}

/// Parses the content between `<` and `>` (exclusive of the brackets).
/// Returns `None` if `raw` isn't a recognized token — callers should
/// then fall back to emitting the bracketed text literally.
pub fn parse_token(raw: &str) -> Option<Token> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(name) = raw.strip_prefix('/') {
        return resolve_alias(name).map(Token::ModRelease);
    }

    if let Some((mods_part, key_part)) = raw.rsplit_once('-') {
        let mut mods = Vec::new();
        for segment in mods_part.split('-') {
            mods.push(resolve_alias(segment)?);
        }
        let key = resolve_alias(key_part).or_else(|| keynames::resolve_key_code(key_part))?;
        return Some(Token::Chord { mods, key });
    }

    resolve_alias(raw).map(Token::ModPress)
}

/// Parses a bare codepoint escape: a single literal character, a `U+`
/// or `0x`-prefixed hex value, or a plain decimal number. Rust's `char`
/// already rejects surrogates and values above `0x10FFFF`, so there is
/// no separate validity pass to write.
pub fn parse_codepoint(raw: &str) -> Option<char> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut chars = raw.chars();
    if let (Some(only), None) = (chars.next(), chars.next()) {
        return Some(only);
    }

    let hex = raw
        .strip_prefix("U+")
        .or_else(|| raw.strip_prefix("u+"))
        .or_else(|| raw.strip_prefix("0x"))
        .or_else(|| raw.strip_prefix("0X"));
    if let Some(digits) = hex {
        return u32::from_str_radix(digits, 16).ok().and_then(char::from_u32);
    }

    raw.parse::<u32>().ok().and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_modifier_alias_case_insensitively() {
        assert_eq!(parse_token("Ctrl"), Some(Token::ModPress(29)));
        assert_eq!(parse_token("/ctrl"), Some(Token::ModRelease(29)));
    }

    #[test]
    fn parses_chord_with_multiple_modifiers() {
        assert_eq!(
            parse_token("ctrl-shift-a"),
            Some(Token::Chord {
                mods: vec![29, 42],
                key: keynames::resolve_key_code("a").unwrap(),
            })
        );
    }

    #[test]
    fn unrecognized_token_returns_none() {
        assert_eq!(parse_token("not-a-real-key"), None);
    }

    #[test]
    fn codepoint_parses_literal_hex_and_decimal_forms() {
        assert_eq!(parse_codepoint("a"), Some('a'));
        assert_eq!(parse_codepoint("U+2603"), Some('\u{2603}'));
        assert_eq!(parse_codepoint("0x41"), Some('A'));
        assert_eq!(parse_codepoint("65"), Some('A'));
    }

    #[test]
    fn codepoint_rejects_out_of_range_values() {
        assert_eq!(parse_codepoint("U+110000"), None);
    }
}
