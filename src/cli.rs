use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// A composable userspace input-event transformation pipeline for
/// evdev/uinput.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "Reads raw Linux input events from one or more devices, runs them through a \
pipeline of transform stages, and either prints the result or replays it to a \
virtual device.\n\
\n\
EXAMPLES:\n\
  # Print events from a keyboard, grabbing it exclusively:\n\
  sudo foresight intercept -g /dev/input/by-id/your-keyboard-event-kbd\n\
\n\
  # Pipe intercepted events into a virtual device mirroring the source:\n\
  sudo sh -c 'foresight intercept -g /dev/input/event4 | foresight redirect /dev/input/event4'\n\
\n\
  # Install a user systemd service that keeps a pipeline running:\n\
  foresight systemd foresight intercept -g /dev/input/event4\n\
\n\
  # List available input devices:\n\
  foresight list-devices"
)]
pub struct Args {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand, Debug)]
pub enum Action {
    /// Read raw events from one or more devices and print them to stdout.
    Intercept {
        /// Grab each following device exclusively (EVIOCGRAB) before
        /// reading from it.
        #[arg(short = 'g', long)]
        grab: bool,

        /// Device paths to read from, in order.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Read events from stdin and replay them to a virtual device that
    /// mirrors a source device's capabilities.
    #[command(alias = "to")]
    Redirect {
        /// The device whose capabilities the virtual device should mirror.
        path: PathBuf,
    },

    /// Install a user-level systemd service that runs `exec args...` with
    /// automatic restart.
    Systemd {
        /// The command to run.
        exec: String,

        /// Arguments to pass to the command.
        args: Vec<String>,
    },

    /// List available input devices and their capabilities.
    ListDevices,
}

pub fn parse_args() -> Args {
    Args::parse()
}
