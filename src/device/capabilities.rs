//! Capability descriptors: the set of event types/codes a device (real or
//! virtual) claims to support, and the per-axis absolute-axis calibration
//! the kernel reports for `EV_ABS` codes.

/// Mirrors the kernel's `struct input_absinfo` (`linux/input.h`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(C)]
pub struct AbsInfo {
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
    pub fuzz: i32,
    pub flat: i32,
    pub resolution: i32,
}

/// The capability set of a device: which event types it emits, which
/// codes within `EV_KEY`/`EV_REL`/`EV_ABS` it supports, and the abs-axis
/// calibration for any `EV_ABS` codes it claims.
#[derive(Debug, Clone, Default)]
pub struct CapabilityDescriptor {
    pub key_codes: Vec<u16>,
    pub rel_codes: Vec<u16>,
    pub abs_codes: Vec<(u16, AbsInfo)>,
    pub led_codes: Vec<u16>,
}

impl CapabilityDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.key_codes.extend(codes);
        self
    }

    pub fn with_rel_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.rel_codes.extend(codes);
        self
    }

    pub fn with_abs_code(mut self, code: u16, info: AbsInfo) -> Self {
        self.abs_codes.push((code, info));
        self
    }

    pub fn abs_info(&self, code: u16) -> Option<&AbsInfo> {
        self.abs_codes.iter().find(|(c, _)| *c == code).map(|(_, info)| info)
    }

    /// Whether this descriptor declares `code` under the given event type.
    /// `EV_SYN` is always allowed through; it carries no codes of its own.
    pub fn supports(&self, type_: u16, code: u16) -> bool {
        match type_ as i32 {
            input_linux_sys::EV_SYN => true,
            input_linux_sys::EV_KEY => self.key_codes.contains(&code),
            input_linux_sys::EV_REL => self.rel_codes.contains(&code),
            input_linux_sys::EV_ABS => self.abs_codes.iter().any(|(c, _)| *c == code),
            input_linux_sys::EV_LED => self.led_codes.contains(&code),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_info_lookup_finds_registered_code() {
        let desc = CapabilityDescriptor::new().with_abs_code(
            0,
            AbsInfo {
                resolution: 12,
                ..Default::default()
            },
        );
        assert_eq!(desc.abs_info(0).unwrap().resolution, 12);
        assert!(desc.abs_info(1).is_none());
    }

    #[test]
    fn supports_rejects_codes_outside_the_declared_set() {
        let desc = CapabilityDescriptor::new().with_key_codes([input_linux_sys::KEY_A as u16]);
        assert!(desc.supports(input_linux_sys::EV_KEY as u16, input_linux_sys::KEY_A as u16));
        assert!(!desc.supports(input_linux_sys::EV_KEY as u16, input_linux_sys::KEY_B as u16));
        assert!(!desc.supports(input_linux_sys::EV_REL as u16, input_linux_sys::REL_X as u16));
        assert!(desc.supports(input_linux_sys::EV_SYN as u16, 0));
    }
}
