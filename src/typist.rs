//! Ties the literal-text typer (`How2Type`) and the `<...>` token parser
//! (`modparser`) together: scans a string for bracketed tokens, emits
//! literal spans through `how2type`, and turns recognized tokens into
//! chords or held modifier presses/releases. A token that fails to
//! parse is typed back out literally, brackets and all.

use input_linux_sys::{EV_KEY, EV_SYN, SYN_REPORT};

use crate::event::Event;
use crate::keymap::{ComposeTable, How2Type, Keymap};
use crate::modparser::{self, Token};

pub struct Typist<'a> {
    how2type: How2Type<'a>,
    compose: Option<ComposeTable>,
}

impl<'a> Typist<'a> {
    pub fn new(keymap: &'a Keymap) -> Self {
        let compose = ComposeTable::from_locale(&keymap.context, "").ok();
        Typist {
            how2type: How2Type::new(keymap),
            compose,
        }
    }

    /// Emits one codepoint, falling back to the compose table when the
    /// live layout has no direct key for it.
    fn emit_char(&self, ch: char, mut callback: impl FnMut(Event)) {
        if self.how2type.emit(ch, &mut callback) {
            return;
        }
        if let Some(compose) = &self.compose {
            compose.emit(ch, &self.how2type, &mut callback);
        }
    }

    fn emit_text(&self, text: &str, mut callback: impl FnMut(Event)) {
        for ch in text.chars() {
            self.emit_char(ch, &mut callback);
        }
    }

    pub fn emit(&self, text: &str, mut callback: impl FnMut(Event)) {
        let mut rest = text;
        while !rest.is_empty() {
            let Some(start) = rest.find('<') else {
                self.emit_text(rest, &mut callback);
                return;
            };

            if start > 0 {
                self.emit_text(&rest[..start], &mut callback);
            }
            rest = &rest[start + 1..];

            let Some(end) = rest.find('>') else {
                self.emit_char('<', &mut callback);
                continue;
            };

            let token = &rest[..end];
            rest = &rest[end + 1..];

            match modparser::parse_token(token) {
                Some(Token::Chord { mods, key }) => self.emit_chord(&mods, key, &mut callback),
                Some(Token::ModPress(code)) => press(code, &mut callback),
                Some(Token::ModRelease(code)) => release(code, &mut callback),
                None => {
                    self.emit_char('<', &mut callback);
                    self.emit_text(token, &mut callback);
                    self.emit_char('>', &mut callback);
                }
            }
        }
    }

    fn emit_chord(&self, mods: &[u16], key: u16, mut callback: impl FnMut(Event)) {
        for &m in mods {
            press(m, &mut callback);
        }
        callback(Event::new(EV_KEY as u16, key, 1));
        callback(syn_report());
        callback(Event::new(EV_KEY as u16, key, 0));
        callback(syn_report());
        for &m in mods.iter().rev() {
            release(m, &mut callback);
        }
    }
}

fn syn_report() -> Event {
    Event::new(EV_SYN as u16, SYN_REPORT as u16, 0)
}

fn press(code: u16, mut callback: impl FnMut(Event)) {
    callback(Event::new(EV_KEY as u16, code, 1));
    callback(syn_report());
}

fn release(code: u16, mut callback: impl FnMut(Event)) {
    callback(Event::new(EV_KEY as u16, code, 0));
    callback(syn_report());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_token_is_typed_back_literally() {
        let Ok(keymap) = Keymap::default_keymap() else {
            return; // no keymap available in this test environment
        };
        let typist = Typist::new(&keymap);
        let mut codes = Vec::new();
        typist.emit("<not-a-real-token>", |event| codes.push(event.code()));
        assert!(!codes.is_empty());
    }
}
