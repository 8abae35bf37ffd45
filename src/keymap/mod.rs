//! The typing engine: maps a Unicode codepoint onto the physical key
//! sequence (plus any modifiers) that a live keyboard layout would need
//! to produce it, with a compose-table fallback for codepoints the
//! layout has no direct key for.

pub mod compose;
pub mod how2type;

pub use compose::ComposeTable;
pub use how2type::{How2Type, KeyPosition};

use xkbcommon::xkb;

/// Thin ownership wrapper around an xkbcommon context + compiled keymap,
/// shared by `How2Type` and `ComposeTable`.
pub struct Keymap {
    pub(crate) context: xkb::Context,
    pub(crate) keymap: xkb::Keymap,
}

impl Keymap {
    /// Loads the keymap for `rules`/`model`/`layout`/`variant`/`options`
    /// the way `setxkbmap` would describe one; pass empty strings to let
    /// xkbcommon apply its usual defaults (typically `us` on a system
    /// with no overrides).
    pub fn from_names(
        rules: &str,
        model: &str,
        layout: &str,
        variant: &str,
        options: &str,
    ) -> crate::error::Result<Self> {
        let context = xkb::Context::new(xkb::CONTEXT_NO_FLAGS);
        let keymap = xkb::Keymap::new_from_names(
            &context,
            rules,
            model,
            layout,
            variant,
            if options.is_empty() {
                None
            } else {
                Some(options.to_string())
            },
            xkb::KEYMAP_COMPILE_NO_FLAGS,
        )
        .ok_or(crate::error::ForesightError::ComposeUnavailable)?;
        Ok(Keymap { context, keymap })
    }

    /// Loads the system's default keymap (empty rules/model/layout ask
    /// xkbcommon to resolve from the environment, matching `setxkbmap`'s
    /// own fallback behavior).
    pub fn default_keymap() -> crate::error::Result<Self> {
        Self::from_names("", "", "", "", "")
    }
}
