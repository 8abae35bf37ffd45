//! Compose-table fallback: for a codepoint the live layout has no direct
//! key for, look up the compose sequence of keysyms that produces it and
//! type each one through `How2Type` in turn.
//!
//! A sequence is only usable if every keysym in it resolves to a
//! position on the *same* layout index — mixing layouts mid-sequence
//! would require a layout switch the user never asked for, so such
//! sequences are skipped in favor of one that stays on a single layout.

use std::collections::{HashMap, HashSet};

use xkbcommon::xkb;

use super::how2type::{How2Type, KeyPosition};
use crate::error::{ForesightError, Result};
use crate::event::Event;

pub struct ComposeTable {
    /// Target keysym -> shortest known compose sequence that produces it.
    by_target: HashMap<xkb::Keysym, Vec<xkb::Keysym>>,
}

impl ComposeTable {
    /// Loads the system compose table for the process locale
    /// (`setlocale(LC_CTYPE, NULL)` equivalent — xkbcommon reads
    /// `$LANG`/`$LC_CTYPE` itself when `locale` is empty).
    pub fn from_locale(context: &xkb::Context, locale: &str) -> Result<Self> {
        let table = xkb::Table::new_from_locale(
            context,
            locale.as_bytes(),
            xkb::COMPILE_NO_FLAGS,
        )
        .ok_or(ForesightError::ComposeUnavailable)?;

        let mut by_target: HashMap<xkb::Keysym, Vec<xkb::Keysym>> = HashMap::new();
        for entry in table.iter() {
            let target = entry.keysym();
            let sequence = entry.sequence().to_vec();
            by_target
                .entry(target)
                .and_modify(|existing| {
                    if sequence.len() < existing.len() {
                        *existing = sequence.clone();
                    }
                })
                .or_insert(sequence);
        }

        Ok(ComposeTable { by_target })
    }

    pub fn sequence_for(&self, codepoint: char) -> Option<&[xkb::Keysym]> {
        let keysym = xkb::utf32_to_keysym(codepoint as u32);
        self.by_target.get(&keysym).map(Vec::as_slice)
    }

    /// Searches the cartesian product of every keysym's candidate
    /// positions for a layout index common to all of them, rather than
    /// greedily committing to whichever layout the first keysym happens
    /// to offer first — a layout an early keysym also supports only
    /// incidentally can dead-end a later keysym even though another
    /// shared layout exists. Returns the lowest common layout index.
    fn sequence_layout(how2type: &How2Type, sequence: &[xkb::Keysym]) -> Option<u32> {
        let mut common: Option<HashSet<u32>> = None;
        for &sym in sequence {
            let layouts: HashSet<u32> = how2type.positions_for(sym).iter().map(|p: &KeyPosition| p.layout).collect();
            common = Some(match common {
                None => layouts,
                Some(prev) => prev.intersection(&layouts).copied().collect(),
            });
            if common.as_ref().is_some_and(HashSet::is_empty) {
                return None;
            }
        }
        common.and_then(|set| set.into_iter().min())
    }

    /// Emits the compose sequence for `codepoint`, if one exists and
    /// every keysym in it is reachable on a single layout. Every keysym
    /// is emitted pinned to that same layout, not re-resolved
    /// independently, so the shared-layout guarantee actually holds for
    /// the emitted events.
    pub fn emit(&self, codepoint: char, how2type: &How2Type, mut callback: impl FnMut(Event)) -> bool {
        let Some(sequence) = self.sequence_for(codepoint) else {
            return false;
        };
        let Some(layout) = Self::sequence_layout(how2type, sequence) else {
            tracing::debug!(?codepoint, "compose sequence mixes layouts, skipping");
            return false;
        };
        for &sym in sequence {
            how2type.emit_keysym_on_layout(sym, layout, &mut callback);
        }
        true
    }
}
