//! Installs a user-level systemd service unit that keeps a pipeline
//! command running under `Restart=always`.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use crate::error::{ForesightError, Result};

fn escape_command(args: &[String]) -> String {
    let mut result = String::new();
    for arg in args {
        if !result.is_empty() {
            result.push(' ');
        }

        let path = PathBuf::from(arg);
        if path.exists() {
            if let Ok(absolute) = path.canonicalize() {
                result.push_str(&absolute.to_string_lossy());
                continue;
            }
        }

        let needs_quotes = arg.chars().any(|c| " \t\"'\\".contains(c));
        if needs_quotes {
            result.push('"');
        }
        for c in arg.chars() {
            match c {
                '"' => result.push_str("\\\""),
                '\\' => result.push_str("\\\\"),
                other => result.push(other),
            }
        }
        if needs_quotes {
            result.push('"');
        }
    }
    result
}

pub fn systemd_supported() -> bool {
    PathBuf::from("/run/systemd/system").exists()
}

/// Writes `$HOME/.config/systemd/user/<execname>.service` for the given
/// command, named after the executable's file stem.
pub fn install(description: &str, exec: &str, args: &[String]) -> Result<PathBuf> {
    if !systemd_supported() {
        return Err(ForesightError::ServiceInstallFailed(
            "systemd is not running on this system".into(),
        ));
    }

    let home = std::env::var("HOME")
        .map_err(|_| ForesightError::ServiceInstallFailed("HOME environment variable not set".into()))?;
    let user_systemd_dir = PathBuf::from(home).join(".config/systemd/user");
    fs::create_dir_all(&user_systemd_dir)
        .map_err(|e| ForesightError::ServiceInstallFailed(format!("creating {}: {e}", user_systemd_dir.display())))?;

    let exec_path = PathBuf::from(exec);
    let service_name = format!(
        "{}.service",
        exec_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| exec.to_string())
    );
    let service_file = user_systemd_dir.join(&service_name);

    let mut full_args = vec![exec.to_string()];
    full_args.extend_from_slice(args);
    let cmd_str = escape_command(&full_args);

    let unit = format!(
        "[Unit]\nDescription={description}\n\n\
[Service]\nExecStart={cmd_str}\nRestart=always\nRestartSec=5\n\n\
[Install]\nWantedBy=default.target\n"
    );

    fs::write(&service_file, unit)
        .map_err(|e| ForesightError::ServiceInstallFailed(format!("writing {}: {e}", service_file.display())))?;

    tracing::info!(service = %service_name, path = %service_file.display(), "installed systemd user service");
    Ok(service_file)
}

/// Enables (and optionally starts) a previously installed service via
/// `systemctl --user`.
pub fn enable(service_name: &str, start_now: bool) -> Result<()> {
    let status = Command::new("systemctl")
        .args(["--user", "enable", service_name])
        .status()
        .map_err(|e| ForesightError::ServiceInstallFailed(format!("running systemctl enable: {e}")))?;
    if !status.success() {
        return Err(ForesightError::ServiceInstallFailed(format!(
            "systemctl --user enable {service_name} failed"
        )));
    }

    if start_now {
        let status = Command::new("systemctl")
            .args(["--user", "start", service_name])
            .status()
            .map_err(|e| ForesightError::ServiceInstallFailed(format!("running systemctl start: {e}")))?;
        if !status.success() {
            return Err(ForesightError::ServiceInstallFailed(format!(
                "systemctl --user start {service_name} failed"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_command_quotes_args_with_whitespace() {
        let escaped = escape_command(&["foresight".to_string(), "a b".to_string()]);
        assert!(escaped.contains("\"a b\""));
    }
}
