//! Command line and environment.

use std::path::PathBuf;

use clap::Parser;

/// fbmux - terminal multiplexer for the Linux framebuffer
#[derive(Debug, Parser)]
#[command(name = "fbmux")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Do not lock the screen; the lock command becomes a no-op
    #[arg(short = 'u', long = "unlocked")]
    pub unlocked: bool,

    /// Configuration file (default: $XDG_CONFIG_HOME/fbmux/config.toml)
    #[arg(short, long, env = "FBMUX_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Framebuffer device
    #[arg(long, env = "FBDEV", value_name = "DEVICE", default_value = "/dev/fb0")]
    pub fbdev: PathBuf,

    /// File whose first line is shown in the status bar
    #[arg(long, env = "FBMUX_STATUS", value_name = "FILE")]
    pub status: Option<PathBuf>,

    /// Log file; nothing is logged without one
    #[arg(long, env = "FBMUX_LOG", value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Process to send SIGTERM on exit
    #[arg(long, env = "STATUS_PID", value_name = "PID")]
    pub status_pid: Option<i32>,

    /// Run only this command; exit when it does
    #[arg(trailing_var_arg = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_takes_its_own_flags() {
        let cli = Cli::try_parse_from(["fbmux", "-u", "vi", "-R", "notes"]).unwrap();
        assert!(cli.unlocked);
        assert_eq!(cli.command, ["vi", "-R", "notes"]);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["fbmux", "--fbdev", "/dev/fb1"]).unwrap();
        assert!(!cli.unlocked);
        assert!(cli.command.is_empty());
        assert_eq!(cli.fbdev, PathBuf::from("/dev/fb1"));
    }
}
