mod cli;
mod config;
mod console;
mod notify;
mod password;

use std::fs::File;
use std::io::{self, Write};
use std::os::fd::AsFd;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fbmux_core::{Cycle, Launch, Mux, POLL_TIMEOUT};
use fbmux_fb::{Fonts, Framebuffer, Pad};
use fbmux_pty::TerminalSession;
use nix::sys::signal::{kill, Signal};
use nix::unistd::{geteuid, Pid, User};
use simplelog::{LevelFilter, WriteLogger};

use cli::Cli;
use config::AppConfig;
use console::VtConsole;
use notify::Notifier;
use password::SshVerifier;

/// Clear the console and hide its cursor.
const HIDE_CURSOR: &[u8] = b"\x1b[2J\x1b[H\x1b[?25l";
const SHOW_CURSOR: &[u8] = b"\x1b[?25h";

type App = Mux<TerminalSession, Pad<Framebuffer>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("fbmux: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Log to `path` only; the console belongs to the sessions.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(LevelFilter::Info);
    let file = File::create(path).with_context(|| format!("cannot create log file {}", path.display()))?;
    WriteLogger::init(level, simplelog::Config::default(), file).context("cannot install the logger")?;
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.log.as_deref())?;
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if cli.status.is_some() {
        config.mux.status_file = cli.status.clone();
    }

    let fb = Framebuffer::open(&cli.fbdev)
        .with_context(|| format!("failed to initialize the framebuffer {}", cli.fbdev.display()))?;
    let fonts = Fonts::load(
        &config.fonts.regular,
        config.fonts.italic.as_deref(),
        config.fonts.bold.as_deref(),
    )
    .with_context(|| format!("cannot load font {}", config.fonts.regular.display()))?;

    let user = match User::from_uid(geteuid()) {
        Ok(Some(user)) => Some(user.name),
        Ok(None) => None,
        Err(e) => {
            log::warn!("cannot look up the user: {e}");
            None
        }
    };
    let mut mux: App = Mux::new(config.mux, Pad::new(fb, fonts), |_| TerminalSession::new())?;
    match user {
        Some(name) => {
            mux = mux.with_user(name);
            if !cli.unlocked {
                mux = mux.with_verifier(Box::new(SshVerifier::new(config.ssh_port)));
            }
        }
        None => log::warn!("unknown user, the screen lock is disabled"),
    }

    let mut stdout = io::stdout();
    stdout.write_all(HIDE_CURSOR)?;
    stdout.flush()?;

    let stdin = io::stdin();
    let mut input = File::from(stdin.as_fd().try_clone_to_owned()?);
    let mut console = VtConsole::setup(stdin.as_fd()).context("cannot set up the console")?;
    let mut notifier = Notifier::new(config.status_interval.map(Duration::from_secs))
        .context("cannot install signal handlers")?;

    let command = (!cli.command.is_empty()).then(|| Launch::new(cli.command.clone()));
    mux.start(command);
    let result = main_loop(&mut mux, &mut input, &mut console, &mut notifier);
    mux.shutdown();
    drop(notifier);
    drop(console);

    stdout.write_all(SHOW_CURSOR)?;
    stdout.flush()?;
    if let Some(pid) = cli.status_pid {
        if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
            log::warn!("cannot stop status process {pid}: {e}");
        }
    }
    result
}

fn main_loop(mux: &mut App, input: &mut File, console: &mut VtConsole, notifier: &mut Notifier) -> Result<()> {
    while !mux.state().exiting {
        let cycle = mux.poll_cycle(input, Some(notifier.wake_fd()), POLL_TIMEOUT)?;
        for notification in notifier.take() {
            mux.handle_notification(notification, console);
        }
        if cycle == Cycle::Hangup {
            break;
        }
    }
    log::info!("leaving");
    Ok(())
}
