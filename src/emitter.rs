//! Virtual device emitter: the uinput-equivalent terminal stage. Builds a
//! synthetic input device from a capability descriptor (or one mirrored
//! from a real `Device`) and replays events onto it.
//!
//! `input-linux-sys` only binds the raw evdev ioctls the device-reading
//! side uses; it does not cover `/dev/uinput`'s setup ioctls, so those are
//! hand-rolled here the same way `EVIOCGNAME`/`EVIOCGBIT` are derived in
//! the device module: a small `_IOW`/`_IO` const-fn pair plus `#[repr(C)]`
//! structs mirroring the kernel headers.

use std::fs::OpenOptions;
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

use input_linux_sys::{EV_ABS, EV_KEY, EV_REL};
use libc::{c_ulong, ioctl};

use crate::context::{Context, Stage};
use crate::device::{AbsInfo, CapabilityDescriptor};
use crate::error::{ForesightError, Result};
use crate::event::{write_event_raw, StageAction};

const UINPUT_IOCTL_BASE: u8 = b'U';

const fn io_(ty: u8, nr: u8) -> c_ulong {
    ((ty as u64) << 8 | (nr as u64)) as c_ulong
}

const fn iow(ty: u8, nr: u8, size: usize) -> c_ulong {
    ((1u64 << 30) | ((size as u64) << 16) | ((ty as u64) << 8) | (nr as u64)) as c_ulong
}

fn ui_set_evbit() -> c_ulong {
    iow(UINPUT_IOCTL_BASE, 100, std::mem::size_of::<i32>())
}
fn ui_set_keybit() -> c_ulong {
    iow(UINPUT_IOCTL_BASE, 101, std::mem::size_of::<i32>())
}
fn ui_set_relbit() -> c_ulong {
    iow(UINPUT_IOCTL_BASE, 102, std::mem::size_of::<i32>())
}
fn ui_set_absbit() -> c_ulong {
    iow(UINPUT_IOCTL_BASE, 103, std::mem::size_of::<i32>())
}
fn ui_dev_setup() -> c_ulong {
    iow(UINPUT_IOCTL_BASE, 3, std::mem::size_of::<UinputSetup>())
}
fn ui_abs_setup() -> c_ulong {
    iow(UINPUT_IOCTL_BASE, 4, std::mem::size_of::<UinputAbsSetup>())
}
fn ui_dev_create() -> c_ulong {
    io_(UINPUT_IOCTL_BASE, 1)
}
fn ui_dev_destroy() -> c_ulong {
    io_(UINPUT_IOCTL_BASE, 2)
}

/// Mirrors `struct input_id` in `linux/input.h`.
#[repr(C)]
#[derive(Clone, Copy)]
struct InputId {
    bustype: u16,
    vendor: u16,
    product: u16,
    version: u16,
}

/// Mirrors `struct uinput_setup`.
#[repr(C)]
struct UinputSetup {
    id: InputId,
    name: [u8; 80],
    ff_effects_max: u32,
}

/// Mirrors `struct uinput_abs_setup`.
#[repr(C)]
struct UinputAbsSetup {
    code: u16,
    absinfo: AbsInfo,
}

/// A synthetic input device created through `/dev/uinput`.
pub struct VirtualDevice {
    file: std::fs::File,
    created: bool,
    caps: CapabilityDescriptor,
}

impl VirtualDevice {
    /// Builds and registers a virtual device with the kernel from an
    /// explicit capability descriptor.
    pub fn create(name: &str, caps: &CapabilityDescriptor) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/uinput")
            .map_err(|source| ForesightError::DeviceUnavailable {
                path: "/dev/uinput".into(),
                source,
            })?;
        let fd = file.as_raw_fd();

        set_evbit(fd, EV_KEY as i32)?;
        for &code in &caps.key_codes {
            set_bit(fd, ui_set_keybit(), code as i32)?;
        }
        if !caps.rel_codes.is_empty() {
            set_evbit(fd, EV_REL as i32)?;
            for &code in &caps.rel_codes {
                set_bit(fd, ui_set_relbit(), code as i32)?;
            }
        }
        if !caps.abs_codes.is_empty() {
            set_evbit(fd, EV_ABS as i32)?;
            for &(code, info) in &caps.abs_codes {
                set_bit(fd, ui_set_absbit(), code as i32)?;
                let setup = UinputAbsSetup { code, absinfo: info };
                // SAFETY: setup is a valid, fully-initialized, repr(C)
                // struct matching the kernel's uinput_abs_setup layout.
                let res = unsafe { ioctl(fd, ui_abs_setup(), &setup as *const UinputAbsSetup) };
                if res < 0 {
                    return Err(ioctl_err("UI_ABS_SETUP"));
                }
            }
        }

        let mut name_buf = [0u8; 80];
        let bytes = name.as_bytes();
        let len = bytes.len().min(79);
        name_buf[..len].copy_from_slice(&bytes[..len]);
        let setup = UinputSetup {
            id: InputId {
                bustype: 0x06, // BUS_VIRTUAL
                vendor: 0x1234,
                product: 0x5678,
                version: 1,
            },
            name: name_buf,
            ff_effects_max: 0,
        };
        // SAFETY: setup matches the kernel's uinput_setup layout exactly.
        let res = unsafe { ioctl(fd, ui_dev_setup(), &setup as *const UinputSetup) };
        if res < 0 {
            return Err(ioctl_err("UI_DEV_SETUP"));
        }

        // SAFETY: UI_DEV_CREATE takes no argument.
        let res = unsafe { ioctl(fd, ui_dev_create()) };
        if res < 0 {
            return Err(ioctl_err("UI_DEV_CREATE"));
        }

        Ok(VirtualDevice {
            file,
            created: true,
            caps: caps.clone(),
        })
    }

    /// Builds a virtual device whose capabilities mirror a source
    /// `Device`'s verbatim — the `redirect` action's path.
    pub fn mirror(name: &str, source_caps: &CapabilityDescriptor) -> Result<Self> {
        Self::create(name, source_caps)
    }

    /// Whether `type_`/`code` was declared in this device's capability
    /// set at creation time.
    pub fn supports(&self, type_: u16, code: u16) -> bool {
        self.caps.supports(type_, code)
    }

    pub fn write(&mut self, type_: u16, code: u16, value: i32) -> Result<()> {
        if !self.supports(type_, code) {
            return Err(ForesightError::InvalidArgument(format!(
                "event type {type_} code {code} is outside this device's declared capabilities"
            )));
        }
        let raw = crate::event::Event::new(type_, code, value).into_raw();
        write_event_raw(self.file.as_raw_fd(), &raw).map_err(|source| ForesightError::IoFatal {
            path: "/dev/uinput".into(),
            source,
        })
    }

    fn raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        if self.created {
            // SAFETY: fd is open for the device's whole lifetime.
            unsafe {
                ioctl(self.raw_fd(), ui_dev_destroy());
            }
        }
    }
}

fn set_evbit(fd: RawFd, ev_type: i32) -> Result<()> {
    set_bit(fd, ui_set_evbit(), ev_type)
}

fn set_bit(fd: RawFd, request: c_ulong, value: i32) -> Result<()> {
    // SAFETY: `value` is passed by-value the way UI_SET_*BIT expects (an
    // `int` argument, not a pointer to one, per the uinput ABI).
    let res = unsafe { ioctl(fd, request, value as std::os::raw::c_ulong) };
    if res < 0 {
        return Err(ioctl_err("UI_SET_*BIT"));
    }
    Ok(())
}

fn ioctl_err(what: &str) -> ForesightError {
    ForesightError::IoFatal {
        path: "/dev/uinput".into(),
        source: io::Error::new(io::ErrorKind::Other, format!("{what} failed: {}", io::Error::last_os_error())),
    }
}

/// Terminal pipeline stage: writes `ctx.event` to a virtual device and
/// reports `StageAction::Next` so the runner proceeds with the next
/// event. An event outside the device's declared capability set is
/// dropped and reported as `StageAction::IgnoreEvent` — it never reaches
/// the kernel, so it can't fail at the I/O level. Genuine write failures
/// are retried up to `IO_RETRY_BUDGET` times before surfacing as a fatal
/// pipeline error (logged and converted to `Exit`).
pub struct Emitter {
    device: VirtualDevice,
}

impl Emitter {
    pub fn new(device: VirtualDevice) -> Self {
        Emitter { device }
    }
}

impl Stage for Emitter {
    fn process(&mut self, ctx: &mut Context) -> StageAction {
        let Some(event) = ctx.event else {
            return StageAction::Next;
        };
        let mut attempts = 0;
        loop {
            match self.device.write(event.type_(), event.code(), event.value()) {
                Ok(()) => return StageAction::Next,
                Err(ForesightError::InvalidArgument(reason)) => {
                    tracing::warn!(reason, "dropping event outside declared capabilities");
                    return StageAction::IgnoreEvent;
                }
                Err(err) => {
                    attempts += 1;
                    tracing::warn!(attempt = attempts, %err, "emitter write failed");
                    if attempts >= crate::error::IO_RETRY_BUDGET {
                        tracing::error!("emitter exhausted retry budget, stopping pipeline");
                        return StageAction::Exit;
                    }
                }
            }
        }
    }
}

/// Replaces `(find_type, find_code)` with `(rep_type, rep_code)` on
/// matching events, leaving everything else untouched.
pub struct ReplaceCode {
    pub find_type: u16,
    pub find_code: u16,
    pub rep_type: u16,
    pub rep_code: u16,
}

impl Stage for ReplaceCode {
    fn process(&mut self, ctx: &mut Context) -> StageAction {
        if let Some(event) = ctx.event.as_mut() {
            if event.is_of(self.find_type, self.find_code) {
                event.set(self.rep_type, self.rep_code);
            }
        }
        StageAction::Next
    }
}
