// Main application entry point: parses the CLI, assembles the requested
// pipeline, and drives it until a signal or a stage requests exit.

use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::process::exit;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use foresight::cli::{self, Action};
use foresight::context::{Context, Pipeline, Stage};
use foresight::device::{self, Device, DeviceProducer};
use foresight::emitter::{Emitter, VirtualDevice};
use foresight::error::{ForesightError, Result};
use foresight::event::{read_event_raw, write_event_raw, Event, StageAction};
use foresight::logging;
use foresight::systemd;

/// Writes the current event's raw bytes to stdout, the interception-tools
/// wire protocol `intercept`/`uinput` pipe consumers expect.
struct StdoutWriter;

impl Stage for StdoutWriter {
    fn process(&mut self, ctx: &mut Context) -> StageAction {
        let Some(event) = ctx.event else {
            return StageAction::Next;
        };
        let stdout = std::io::stdout();
        if let Err(err) = write_event_raw(stdout.as_raw_fd(), event.as_raw()) {
            tracing::error!(%err, "failed to write event to stdout");
            return StageAction::Exit;
        }
        StageAction::Next
    }
}

/// Reads one raw event per call from stdin, the `redirect` action's input.
struct StdinProducer;

impl Stage for StdinProducer {
    fn process(&mut self, ctx: &mut Context) -> StageAction {
        let stdin = std::io::stdin();
        match read_event_raw(stdin.as_raw_fd()) {
            Ok(Some(raw)) => {
                ctx.event = Some(Event::from_raw(raw));
                StageAction::Next
            }
            Ok(None) => StageAction::Exit,
            Err(err) => {
                tracing::error!(%err, "failed to read event from stdin");
                StageAction::Exit
            }
        }
    }
}

fn run_intercept(grab: bool, paths: &[std::path::PathBuf]) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    register_signal_handlers(&stop)?;

    let mut devices = Vec::with_capacity(paths.len());
    for path in paths {
        let mut dev = Device::open(path)?;
        if grab {
            if let Err(err) = dev.grab() {
                tracing::warn!(%err, path = %path.display(), "failed to grab device, continuing ungrabbed");
            }
        }
        tracing::info!(path = %path.display(), "intercepting device");
        devices.push(dev);
    }

    let mut ctx = Context::new(stop);
    let mut pipeline = Pipeline::builder()
        .stage(DeviceProducer::new(devices))
        .stage(StdoutWriter)
        .build();
    pipeline.run(&mut ctx);
    Ok(())
}

fn run_redirect(path: &Path) -> Result<()> {
    let source = Device::open(path)?;
    let caps = source
        .capabilities()
        .map_err(|source| ForesightError::InvalidDevice {
            path: path.to_path_buf(),
            reason: source.to_string(),
        })?;
    drop(source);

    let name = format!("foresight-redirect-{}", path.display());
    let virtual_device = VirtualDevice::mirror(&name, &caps)?;

    let stop = Arc::new(AtomicBool::new(false));
    register_signal_handlers(&stop)?;

    let mut ctx = Context::new(stop);
    let mut pipeline = Pipeline::builder()
        .stage(StdinProducer)
        .stage(Emitter::new(virtual_device))
        .build();
    pipeline.run(&mut ctx);
    Ok(())
}

fn run_systemd(exec: &str, args: &[String]) -> Result<()> {
    let description = format!("foresight pipeline: {exec}");
    let service_file = systemd::install(&description, exec, args)?;
    println!("Installed {}", service_file.display());
    Ok(())
}

fn run_list_devices() -> Result<()> {
    device::list_input_devices().map_err(|source| ForesightError::DeviceUnavailable {
        path: "/dev/input".into(),
        source,
    })
}

fn register_signal_handlers(stop: &Arc<AtomicBool>) -> Result<()> {
    for sig in [signal_hook::consts::SIGTERM, signal_hook::consts::SIGINT, signal_hook::consts::SIGQUIT] {
        signal_hook::flag::register(sig, Arc::clone(stop))
            .map_err(|source| ForesightError::IoFatal { path: "<signal>".into(), source })?;
    }
    Ok(())
}

fn exit_code(err: &ForesightError) -> i32 {
    match err {
        ForesightError::InvalidArgument(_) => 1,
        ForesightError::DeviceUnavailable { .. }
        | ForesightError::GrabFailure { .. }
        | ForesightError::InvalidDevice { .. }
        | ForesightError::IoAgain { .. }
        | ForesightError::IoFatal { .. }
        | ForesightError::DecodeFailure { .. } => 2,
        ForesightError::CodepointInvalid(_) | ForesightError::ComposeUnavailable => 3,
        ForesightError::ServiceInstallFailed(_) => 4,
    }
}

fn main() {
    logging::init();
    let args = cli::parse_args();

    let result = match args.action {
        Action::Intercept { grab, paths } => run_intercept(grab, &paths),
        Action::Redirect { path } => run_redirect(&path),
        Action::Systemd { exec, args } => run_systemd(&exec, &args),
        Action::ListDevices => run_list_devices(),
    };

    if let Err(err) = result {
        tracing::error!(%err, "foresight exited with an error");
        eprintln!("error: {err}");
        exit(exit_code(&err));
    }
}
