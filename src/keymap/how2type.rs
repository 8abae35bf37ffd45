//! Unicode codepoint to key-sequence translation, ported from the
//! original `how2type` engine: find where a keysym lives on the live
//! layout (keycode, layout, level, modifier mask), translate the xkb
//! keycode to an evdev code, and emit modifier-press, key-press,
//! key-release, modifier-release framed by `SYN_REPORT`s.

use input_linux_sys::{EV_KEY, EV_SYN, KEY_CAPSLOCK, KEY_LEFTALT, KEY_LEFTCTRL, KEY_LEFTMETA, KEY_LEFTSHIFT, SYN_REPORT};
use xkbcommon::xkb;

use super::Keymap;
use crate::event::Event;

/// Where on the live layout a single keysym can be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPosition {
    pub keycode: u32,
    pub layout: u32,
    pub level: u32,
    pub mods: u32,
}

struct ModMapEntry {
    keycode: u16,
    mask: u32,
}

fn build_modmap(keymap: &xkb::Keymap) -> [ModMapEntry; 5] {
    let lookup = |name: &str, keycode: u16| -> ModMapEntry {
        let index = keymap.mod_get_index(name);
        let mask = if index != xkb::MOD_INVALID {
            1u32 << index
        } else {
            0
        };
        ModMapEntry { keycode, mask }
    };
    [
        lookup(xkb::MOD_NAME_SHIFT, KEY_LEFTSHIFT as u16),
        lookup(xkb::MOD_NAME_CTRL, KEY_LEFTCTRL as u16),
        lookup(xkb::MOD_NAME_ALT, KEY_LEFTALT as u16),
        lookup(xkb::MOD_NAME_LOGO, KEY_LEFTMETA as u16),
        lookup(xkb::MOD_NAME_CAPS, KEY_CAPSLOCK as u16),
    ]
}

/// Emits key-press/release events for every modifier bit set in `mask`
/// that the modmap recognizes. Returns whether any were emitted, so the
/// caller knows whether a bracketing `SYN_REPORT` is needed.
fn invoke_mod_events(
    modmap: &[ModMapEntry; 5],
    mask: u32,
    pressed: bool,
    mut emit: impl FnMut(Event),
) -> bool {
    let mut any = false;
    for entry in modmap {
        if entry.mask == 0 || mask & entry.mask != entry.mask {
            continue;
        }
        emit(Event::new(EV_KEY as u16, entry.keycode, i32::from(pressed)));
        any = true;
    }
    any
}

const MAX_MASKS: usize = 32;

/// Translates codepoints into evdev event sequences against a live
/// keymap.
pub struct How2Type<'a> {
    keymap: &'a Keymap,
    modmap: [ModMapEntry; 5],
}

impl<'a> How2Type<'a> {
    pub fn new(keymap: &'a Keymap) -> Self {
        let modmap = build_modmap(&keymap.keymap);
        How2Type { keymap, modmap }
    }

    /// Enumerates every `KeyPosition` the live layout offers for
    /// `keysym`, in keycode/layout/level order — callers that want the
    /// lowest-modifier option should take the first one, since level 0
    /// positions are always visited before higher levels for the same
    /// key.
    pub fn positions_for(&self, keysym: xkb::Keysym) -> Vec<KeyPosition> {
        let map = &self.keymap.keymap;
        let min_keycode: u32 = map.min_keycode().into();
        let max_keycode: u32 = map.max_keycode().into();
        let mut out = Vec::new();

        for keycode in min_keycode..=max_keycode {
            let kc = xkb::Keycode::from(keycode);
            if map.key_get_name(kc).is_none() {
                continue;
            }
            let num_layouts = map.num_layouts_for_key(kc);
            for layout in 0..num_layouts {
                let num_levels = map.num_levels_for_key(kc, layout);
                for level in 0..num_levels {
                    let syms = map.key_get_syms_by_level(kc, layout, level);
                    if syms.len() != 1 || syms[0] != keysym {
                        continue;
                    }

                    let mut masks = [0u32; MAX_MASKS];
                    let n = map.key_get_mods_for_level(kc, layout, level, &mut masks);
                    if n == 0 {
                        out.push(KeyPosition {
                            keycode,
                            layout,
                            level,
                            mods: 0,
                        });
                    } else {
                        for &mask in &masks[..n] {
                            out.push(KeyPosition {
                                keycode,
                                layout,
                                level,
                                mods: mask,
                            });
                        }
                    }
                }
            }
        }
        out
    }

    /// First-found position (lowest level wins, by iteration order).
    pub fn position_for(&self, keysym: xkb::Keysym) -> Option<KeyPosition> {
        self.positions_for(keysym).into_iter().next()
    }

    /// First-found position restricted to a specific layout index, for
    /// callers (the compose fallback) that already verified the whole
    /// sequence shares one layout and must stay on it.
    pub fn position_for_layout(&self, keysym: xkb::Keysym, layout: u32) -> Option<KeyPosition> {
        self.positions_for(keysym).into_iter().find(|p| p.layout == layout)
    }

    fn keycode_to_evdev(xkb_keycode: u32) -> Option<u16> {
        // Historical X11-compatible offset: xkb_keycode == evdev + 8.
        if xkb_keycode <= 8 {
            None
        } else {
            Some((xkb_keycode - 8) as u16)
        }
    }

    /// Emits the press/release sequence for a single resolved
    /// `KeyPosition`: any modifiers its level requires, the key itself,
    /// then the modifiers released, each framed by `SYN_REPORT`.
    fn emit_position(&self, pos: KeyPosition, mut callback: impl FnMut(Event)) -> bool {
        let Some(evcode) = Self::keycode_to_evdev(pos.keycode) else {
            tracing::warn!(keycode = pos.keycode, "cannot map xkb keycode to evdev code");
            return false;
        };

        let syn = Event::new(EV_SYN as u16, SYN_REPORT as u16, 0);
        let requires_mods = pos.mods != 0;
        let mut masks = [0u32; MAX_MASKS];
        let num_masks = if requires_mods {
            self.keymap
                .keymap
                .key_get_mods_for_level(xkb::Keycode::from(pos.keycode), pos.layout, pos.level, &mut masks)
        } else {
            0
        };

        if requires_mods && num_masks > 0 {
            if invoke_mod_events(&self.modmap, masks[0], true, &mut callback) {
                callback(syn);
            }
        }

        callback(Event::new(EV_KEY as u16, evcode, 1));
        callback(syn);
        callback(Event::new(EV_KEY as u16, evcode, 0));
        callback(syn);

        if requires_mods && num_masks > 0 && invoke_mod_events(&self.modmap, masks[0], false, &mut callback) {
            callback(syn);
        }
        true
    }

    /// Emits the event sequence that types a single Unicode codepoint.
    /// Returns whether anything was emitted — codepoints with no direct
    /// keysym, or no position on the live layout, are left for the
    /// caller to retry through `ComposeTable` (logged at debug level).
    pub fn emit(&self, codepoint: char, callback: impl FnMut(Event)) -> bool {
        let keysym = xkb::utf32_to_keysym(codepoint as u32);
        if keysym == xkb::KEY_NoSymbol {
            tracing::debug!(?codepoint, "no keysym for codepoint");
            return false;
        }

        let Some(pos) = self.position_for(keysym) else {
            tracing::debug!(?codepoint, "no key position on live layout");
            return false;
        };

        self.emit_position(pos, callback)
    }

    /// Emits `keysym` using whatever position it holds on `layout`
    /// specifically, for the compose fallback once it has settled on a
    /// single shared layout across a whole sequence.
    pub fn emit_keysym_on_layout(&self, keysym: xkb::Keysym, layout: u32, callback: impl FnMut(Event)) -> bool {
        let Some(pos) = self.position_for_layout(keysym, layout) else {
            tracing::debug!(layout, "no key position for keysym on the chosen layout");
            return false;
        };
        self.emit_position(pos, callback)
    }

    pub fn emit_str(&self, s: &str, mut callback: impl FnMut(Event)) {
        for ch in s.chars() {
            self.emit(ch, &mut callback);
        }
    }
}
