//! Device producer: reads raw events off a `/dev/input/eventN` node,
//! optionally holding it exclusively (`EVIOCGRAB`), and exposes the
//! device's reported capabilities for stages that need them (abs-to-rel
//! scaling, capability mirroring onto a virtual device).

pub mod capabilities;

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::{self, ErrorKind};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use input_linux_sys::{EV_ABS, EV_KEY, EV_LED, EV_MAX, EV_REL};
use libc::{c_ulong, ioctl};

use crate::context::{Context, Stage};
use crate::error::{ForesightError, Result};
use crate::event::{read_event_raw, Event, StageAction};

pub use capabilities::{AbsInfo, CapabilityDescriptor};

const fn ior(ty: u8, nr: u8, size: usize) -> c_ulong {
    ((2u64 << 30) | ((size as u64) << 16) | ((ty as u64) << 8) | (nr as u64)) as c_ulong
}

const fn iow(ty: u8, nr: u8, size: usize) -> c_ulong {
    ((1u64 << 30) | ((size as u64) << 16) | ((ty as u64) << 8) | (nr as u64)) as c_ulong
}

const EVIOCGNAME_LEN: usize = 256;
fn eviocgname_ioctl() -> c_ulong {
    ior(b'E', 0x06, EVIOCGNAME_LEN)
}
fn eviocgbit_ioctl(ty: u8, len: usize) -> c_ulong {
    ior(b'E', 0x20 + ty, len)
}
fn eviocgabs_ioctl(abs: u8) -> c_ulong {
    ior(b'E', 0x40 + abs, std::mem::size_of::<AbsInfo>())
}
fn eviocgrab_ioctl() -> c_ulong {
    iow(b'E', 0x90, std::mem::size_of::<i32>())
}

fn is_bit_set(buf: &[u8], bit: usize) -> bool {
    let (byte_index, bit_index) = (bit / 8, bit % 8);
    buf.get(byte_index).is_some_and(|b| b & (1 << bit_index) != 0)
}

/// A physical input device opened for reading (and, if grabbed,
/// exclusively).
pub struct Device {
    path: PathBuf,
    fd: std::fs::File,
    grabbed: bool,
}

impl Device {
    /// Opens the device non-blocking, so a producer polling several of
    /// these at once never stalls waiting on one that never has data.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&path)
            .map_err(|source| ForesightError::DeviceUnavailable {
                path: path.clone(),
                source,
            })?;
        Ok(Device {
            path,
            fd,
            grabbed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }

    /// Exclusively grab the device via `EVIOCGRAB`. A failure here is a
    /// soft condition: the caller may choose to continue ungrabbed rather
    /// than aborting the whole pipeline.
    pub fn grab(&mut self) -> Result<()> {
        // SAFETY: fd is a valid, open character device; `value` is a
        // plain `1` passed by pointer as EVIOCGRAB requires.
        let value: i32 = 1;
        let res = unsafe { ioctl(self.raw_fd(), eviocgrab_ioctl(), &value as *const i32) };
        if res < 0 {
            return Err(ForesightError::GrabFailure {
                path: self.path.clone(),
                source: io::Error::last_os_error(),
            });
        }
        self.grabbed = true;
        Ok(())
    }

    pub fn ungrab(&mut self) {
        if !self.grabbed {
            return;
        }
        let value: i32 = 0;
        // SAFETY: see `grab`; ignoring the result on teardown is correct,
        // there is nothing more useful to do with an ungrab failure.
        unsafe {
            ioctl(self.raw_fd(), eviocgrab_ioctl(), &value as *const i32);
        }
        self.grabbed = false;
    }

    pub fn name(&self) -> Result<String> {
        let mut buf = [0u8; EVIOCGNAME_LEN];
        // SAFETY: buf is exactly EVIOCGNAME_LEN bytes, matching the size
        // encoded in the ioctl number.
        let res = unsafe { ioctl(self.raw_fd(), eviocgname_ioctl(), buf.as_mut_ptr()) };
        if res < 0 {
            return Err(ForesightError::InvalidDevice {
                path: self.path.clone(),
                reason: io::Error::last_os_error().to_string(),
            });
        }
        let nul = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
        Ok(String::from_utf8_lossy(&buf[..nul]).into_owned())
    }

    fn type_bits(&self) -> io::Result<Vec<u8>> {
        let len = (EV_MAX / 8 + 1) as usize;
        let mut buf = vec![0u8; len];
        // SAFETY: buf.len() matches the size passed into the ioctl number.
        let res = unsafe { ioctl(self.raw_fd(), eviocgbit_ioctl(0, buf.len()), buf.as_mut_ptr()) };
        if res < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(buf)
    }

    fn code_bits(&self, ev_type: u8, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        // SAFETY: buf.len() matches the size passed into the ioctl number.
        let res =
            unsafe { ioctl(self.raw_fd(), eviocgbit_ioctl(ev_type, buf.len()), buf.as_mut_ptr()) };
        if res < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(buf)
    }

    /// Reads this device's abs-axis calibration for a single code via
    /// `EVIOCGABS`.
    pub fn abs_info(&self, abs_code: u8) -> io::Result<AbsInfo> {
        let mut info = AbsInfo::default();
        // SAFETY: `info` is sized exactly to AbsInfo, matching the ioctl
        // number's encoded size.
        let res =
            unsafe { ioctl(self.raw_fd(), eviocgabs_ioctl(abs_code), &mut info as *mut AbsInfo) };
        if res < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(info)
    }

    /// Enumerates every capability this device reports, suitable for
    /// mirroring onto a virtual device (`redirect`).
    pub fn capabilities(&self) -> io::Result<CapabilityDescriptor> {
        let type_bits = self.type_bits()?;
        let mut desc = CapabilityDescriptor::new();

        if is_bit_set(&type_bits, EV_KEY as usize) {
            let bits = self.code_bits(EV_KEY as u8, (input_linux_sys::KEY_MAX / 8 + 1) as usize)?;
            desc.key_codes = (0..input_linux_sys::KEY_MAX as u16)
                .filter(|&c| is_bit_set(&bits, c as usize))
                .collect();
        }
        if is_bit_set(&type_bits, EV_REL as usize) {
            let bits = self.code_bits(EV_REL as u8, 32)?;
            desc.rel_codes = (0..256u16).filter(|&c| is_bit_set(&bits, c as usize)).collect();
        }
        if is_bit_set(&type_bits, EV_ABS as usize) {
            let bits = self.code_bits(EV_ABS as u8, 8)?;
            for code in 0..64u16 {
                if is_bit_set(&bits, code as usize) {
                    if let Ok(info) = self.abs_info(code as u8) {
                        desc.abs_codes.push((code, info));
                    }
                }
            }
        }
        if is_bit_set(&type_bits, EV_LED as usize) {
            let bits = self.code_bits(EV_LED as u8, 4)?;
            desc.led_codes = (0..32u16).filter(|&c| is_bit_set(&bits, c as usize)).collect();
        }
        Ok(desc)
    }

    /// Reads the next raw event. Treats `EAGAIN` (non-blocking fd with
    /// nothing pending) as a soft `IoAgain` the caller should not retry
    /// immediately, and any other read error as `IoFatal`.
    pub fn next(&mut self) -> Result<Option<Event>> {
        match read_event_raw(self.raw_fd()) {
            Ok(Some(raw)) => Ok(Some(Event::from_raw(raw))),
            Ok(None) => Ok(None),
            Err(err) if err.kind() == ErrorKind::WouldBlock => Err(ForesightError::IoAgain {
                path: self.path.clone(),
            }),
            Err(source) => Err(ForesightError::IoFatal {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        // Ungrab before the file closes; closing first would make the
        // grab release implicit and unloggable.
        self.ungrab();
    }
}

/// Milliseconds between `poll(2)` wakeups in `DeviceProducer`, bounding
/// how long the cooperative stop flag can go unchecked while every
/// watched device sits idle.
const POLL_TIMEOUT_MS: libc::c_int = 200;

/// Reads from any number of devices at once via `poll(2)`, servicing
/// whichever descriptors are ready in the order `poll` reports them
/// rather than draining one device to completion before moving to the
/// next.
pub struct DeviceProducer {
    devices: Vec<Device>,
    queue: VecDeque<Event>,
}

impl DeviceProducer {
    pub fn new(devices: Vec<Device>) -> Self {
        DeviceProducer {
            devices,
            queue: VecDeque::new(),
        }
    }

    fn poll_ready(&self) -> io::Result<Vec<usize>> {
        let mut fds: Vec<libc::pollfd> = self
            .devices
            .iter()
            .map(|d| libc::pollfd {
                fd: d.raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            })
            .collect();

        loop {
            // SAFETY: fds is a valid pollfd array sized to fds.len() for
            // the duration of the call.
            let res = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, POLL_TIMEOUT_MS) };
            if res >= 0 {
                break;
            }
            let err = io::Error::last_os_error();
            if err.kind() != ErrorKind::Interrupted {
                return Err(err);
            }
        }

        Ok(fds
            .iter()
            .enumerate()
            .filter(|(_, pfd)| pfd.revents & libc::POLLIN != 0)
            .map(|(idx, _)| idx)
            .collect())
    }

    /// Drains every ready device into `queue`, in poll-reported order,
    /// dropping any device that hits EOF or a fatal I/O error.
    fn fill_queue(&mut self) -> Result<()> {
        let ready = self.poll_ready().map_err(|source| ForesightError::IoFatal {
            path: self.devices.first().map(|d| d.path.clone()).unwrap_or_default(),
            source,
        })?;

        let mut dead = Vec::new();
        for idx in ready {
            loop {
                match self.devices[idx].next() {
                    Ok(Some(event)) => self.queue.push_back(event),
                    Ok(None) => {
                        dead.push(idx);
                        break;
                    }
                    Err(ForesightError::IoAgain { .. }) => break,
                    Err(err) => {
                        tracing::warn!(path = %self.devices[idx].path().display(), %err, "device read failed, dropping it");
                        dead.push(idx);
                        break;
                    }
                }
            }
        }
        dead.sort_unstable();
        dead.dedup();
        for idx in dead.into_iter().rev() {
            self.devices.remove(idx);
        }
        Ok(())
    }
}

impl Stage for DeviceProducer {
    fn process(&mut self, ctx: &mut Context) -> StageAction {
        if let Some(event) = self.queue.pop_front() {
            ctx.event = Some(event);
            return StageAction::Next;
        }
        if self.devices.is_empty() {
            return StageAction::Exit;
        }
        if let Err(err) = self.fill_queue() {
            tracing::error!(%err, "device producer poll failed");
            return StageAction::Exit;
        }
        match self.queue.pop_front() {
            Some(event) => {
                ctx.event = Some(event);
                StageAction::Next
            }
            None => StageAction::Idle,
        }
    }
}

/// Enumerates `/dev/input/event*`, printing each device's name and
/// capability summary. Used by the `list-devices` CLI action.
pub fn list_input_devices() -> io::Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir("/dev/input/")?
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            let file_name = path.file_name()?.to_str()?;
            let num = file_name.strip_prefix("event")?.parse::<u64>().ok();
            Some((path, num))
        })
        .collect();
    entries.sort_by_key(|(_, num)| *num);

    println!("{:<20} {:<30} {}", "Device", "Name", "Capabilities");
    println!("{}", "-".repeat(70));

    for (path, _) in entries {
        let dev = match Device::open(&path) {
            Ok(dev) => dev,
            Err(err) => {
                println!("{:<20} {:<30} {}", path.display(), "", err);
                continue;
            }
        };
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        let caps = match dev.capabilities() {
            Ok(caps) => {
                let mut parts = Vec::new();
                if !caps.key_codes.is_empty() {
                    parts.push("EV_KEY".to_string());
                }
                if !caps.rel_codes.is_empty() {
                    parts.push("EV_REL".to_string());
                }
                if !caps.abs_codes.is_empty() {
                    parts.push("EV_ABS".to_string());
                }
                if !caps.led_codes.is_empty() {
                    parts.push("EV_LED".to_string());
                }
                parts.join(", ")
            }
            Err(err) => format!("error: {err}"),
        };
        println!("{:<20} {:<30} {}", path.display(), name, caps);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_bit_set_respects_byte_boundaries() {
        let buf = [0b0000_0010u8];
        assert!(is_bit_set(&buf, 1));
        assert!(!is_bit_set(&buf, 0));
        assert!(!is_bit_set(&buf, 9));
    }
}
