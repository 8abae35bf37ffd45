//! The event vocabulary: a typed wrapper around the kernel's raw
//! `input_event` record, the raw read/write primitives devices and the
//! virtual emitter share, and the `StageAction` protocol stages use to
//! steer the pipeline.

use std::io::{self, ErrorKind};
use std::mem::size_of;
use std::os::unix::io::RawFd;

use input_linux_sys::{input_event, timeval, EV_KEY, EV_REL};

/// One input event, time-stamped the way the kernel stamps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    raw: input_event,
}

impl Event {
    pub fn new(type_: u16, code: u16, value: i32) -> Self {
        Event {
            raw: input_event {
                time: timeval {
                    tv_sec: 0,
                    tv_usec: 0,
                },
                type_,
                code,
                value,
            },
        }
    }

    #[inline]
    pub fn from_raw(raw: input_event) -> Self {
        Event { raw }
    }

    #[inline]
    pub fn as_raw(&self) -> &input_event {
        &self.raw
    }

    #[inline]
    pub fn into_raw(self) -> input_event {
        self.raw
    }

    #[inline]
    pub fn type_(&self) -> u16 {
        self.raw.type_
    }

    #[inline]
    pub fn set_type(&mut self, type_: u16) {
        self.raw.type_ = type_;
    }

    #[inline]
    pub fn code(&self) -> u16 {
        self.raw.code
    }

    #[inline]
    pub fn set_code(&mut self, code: u16) {
        self.raw.code = code;
    }

    #[inline]
    pub fn value(&self) -> i32 {
        self.raw.value
    }

    #[inline]
    pub fn set_value(&mut self, value: i32) {
        self.raw.value = value;
    }

    /// Rewrites type and code together; the common case for stages that
    /// reinterpret an event (abs-to-relative, code substitution).
    #[inline]
    pub fn set(&mut self, type_: u16, code: u16) {
        self.raw.type_ = type_;
        self.raw.code = code;
    }

    #[inline]
    pub fn is_of(&self, type_: u16, code: u16) -> bool {
        self.raw.type_ == type_ && self.raw.code == code
    }

    #[inline]
    pub fn is_syn(&self) -> bool {
        i32::from(self.raw.type_) == input_linux_sys::EV_SYN
    }

    #[inline]
    pub fn is_key_event(&self) -> bool {
        i32::from(self.raw.type_) == EV_KEY
    }

    /// Event timestamp, in microseconds since whatever epoch the source
    /// device's clock uses. Timestamps are assumed non-negative.
    #[inline]
    pub fn micros(&self) -> u64 {
        self.raw.time.tv_sec as u64 * 1_000_000 + self.raw.time.tv_usec as u64
    }

    /// Overwrites the event timestamp from a microsecond count; mainly
    /// useful for synthesizing test fixtures.
    #[inline]
    pub fn set_micros(&mut self, micros: u64) {
        self.raw.time.tv_sec = (micros / 1_000_000) as i64;
        self.raw.time.tv_usec = (micros % 1_000_000) as i64;
    }
}

/// True for `EV_REL` events on the X or Y pointer axes.
#[inline]
pub fn is_mouse_movement(event: &Event) -> bool {
    event.type_() as i32 == EV_REL
        && (event.code() == input_linux_sys::REL_X as u16
            || event.code() == input_linux_sys::REL_Y as u16)
}

/// What a stage asks the pipeline runner to do after processing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAction {
    /// Hand the (possibly mutated) event to the next stage.
    Next,
    /// Drop the event; do not invoke subsequent stages for it.
    IgnoreEvent,
    /// Stop advancing this tick without dropping the event permanently;
    /// used by stages waiting on more input before they can decide.
    Idle,
    /// Unwind the whole pipeline; no further events will be processed.
    Exit,
}

impl std::fmt::Display for StageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StageAction::Next => "Next",
            StageAction::IgnoreEvent => "Ignore Event",
            StageAction::Idle => "Idle",
            StageAction::Exit => "Exit",
        };
        f.write_str(s)
    }
}

/// Reads exactly one `input_event` directly off a raw file descriptor.
///
/// Retries on `EINTR`. Returns `Ok(None)` on a clean EOF *before* any bytes
/// of the next event were read, and an `UnexpectedEof` error if EOF lands
/// mid-event (a corrupted stream).
pub fn read_event_raw(fd: RawFd) -> io::Result<Option<input_event>> {
    let mut buf = vec![0u8; size_of::<input_event>()];
    let mut bytes_read = 0;
    let total_bytes = buf.len();

    while bytes_read < total_bytes {
        // SAFETY: `buf` is sized to `total_bytes` and the write offset
        // never exceeds it; `fd` is the caller's responsibility.
        let result = unsafe {
            libc::read(
                fd,
                buf.as_mut_ptr().add(bytes_read) as *mut libc::c_void,
                total_bytes - bytes_read,
            )
        };

        match result {
            -1 => {
                let err = io::Error::last_os_error();
                if err.kind() != ErrorKind::Interrupted {
                    return Err(err);
                }
            }
            0 => {
                if bytes_read == 0 {
                    return Ok(None);
                }
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "EOF reached mid-event",
                ));
            }
            n if n > 0 => bytes_read += n as usize,
            _ => return Err(io::Error::other("read returned an unexpected value")),
        }
    }

    // SAFETY: buf holds exactly size_of::<input_event>() bytes read from
    // the kernel; input_event has a stable C layout but the stream offers
    // no alignment guarantee, hence read_unaligned.
    let event: input_event = unsafe { std::ptr::read_unaligned(buf.as_ptr() as *const _) };
    Ok(Some(event))
}

/// Writes a single `input_event` to a raw file descriptor, retrying on
/// `EINTR` and partial writes.
pub fn write_event_raw(fd: RawFd, event: &input_event) -> io::Result<()> {
    let total_bytes = size_of::<input_event>();
    let mut bytes_written = 0;

    // SAFETY: `event` outlives the call and input_event has a stable C
    // representation, so reinterpreting it as bytes is sound.
    let buf: &[u8] =
        unsafe { std::slice::from_raw_parts(event as *const _ as *const u8, total_bytes) };

    while bytes_written < total_bytes {
        // SAFETY: offset stays within `buf`'s bounds; `fd` is the
        // caller's responsibility.
        let result = unsafe {
            libc::write(
                fd,
                buf.as_ptr().add(bytes_written) as *const libc::c_void,
                total_bytes - bytes_written,
            )
        };

        match result {
            -1 => {
                let err = io::Error::last_os_error();
                if err.kind() != ErrorKind::Interrupted {
                    return Err(err);
                }
            }
            0 => return Err(io::Error::new(ErrorKind::WriteZero, "write returned 0")),
            n if n > 0 => bytes_written += n as usize,
            _ => return Err(io::Error::other("write returned an unexpected value")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_movement_detects_rel_x_and_y() {
        let mut e = Event::new(EV_REL as u16, input_linux_sys::REL_X as u16, 5);
        assert!(is_mouse_movement(&e));
        e.set_code(input_linux_sys::REL_Y as u16);
        assert!(is_mouse_movement(&e));
        e.set_code(input_linux_sys::REL_WHEEL as u16);
        assert!(!is_mouse_movement(&e));
    }

    #[test]
    fn stage_action_display_matches_expected_strings() {
        assert_eq!(StageAction::Next.to_string(), "Next");
        assert_eq!(StageAction::IgnoreEvent.to_string(), "Ignore Event");
    }
}
