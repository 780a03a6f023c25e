// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `buzz top` command: a refreshing terminal dashboard.
//!
//! Sampling cycles run on the blocking pool while the screen stays live.
//! A new cycle starts once the previous one has finished and the refresh
//! interval has passed. Commands are typed on the bottom line and run on
//! Enter:
//!
//! | input                 | effect                                  |
//! |-----------------------|-----------------------------------------|
//! | `q`, `quit`, `exit`   | leave the dashboard                     |
//! | `d`                   | save the displayed snapshot as JSON     |
//! | `k <pid> [flags]`     | signal a process (see `buzz kill`)      |
//!
//! Esc on an empty line, Ctrl-C and SIGINT also exit.

mod ui;

use super::kill::parse_kill_line;
use super::CycleOutput;
use anyhow::Context;
use clap::{Args, ValueEnum};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, terminal};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use resource_monitor::{default_snapshot_filename, send_signal, SamplingConfig, SamplingSession, SystemSnapshot};
use std::io::{self, Stdout};
use std::process::ExitCode;
use std::time::Duration;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

const MIN_REFRESH_MS: u64 = 250;
const INPUT_POLL: Duration = Duration::from_millis(100);

type DashboardTerminal = Terminal<CrosstermBackend<Stdout>>;

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TopArgs {
    /// Refresh interval in milliseconds (at least 250).
    #[arg(long, default_value_t = 2000, value_parser = parse_refresh)]
    pub refresh: u64,

    /// Process table ordering.
    #[arg(long, value_enum, default_value_t = SortKey::Cpu)]
    pub sort: SortKey,

    /// Number of processes to show (at least 1).
    #[arg(long, default_value_t = 25, value_parser = parse_top)]
    pub top: usize,

    /// Disable colours.
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    Cpu,
    Mem,
}

fn parse_refresh(s: &str) -> Result<u64, String> {
    s.parse::<u64>()
        .map(|ms| ms.max(MIN_REFRESH_MS))
        .map_err(|e| format!("invalid refresh interval '{s}': {e}"))
}

fn parse_top(s: &str) -> Result<usize, String> {
    s.parse::<usize>()
        .map(|n| n.max(1))
        .map_err(|e| format!("invalid process count '{s}': {e}"))
}

/// A submitted command line.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Quit,
    Save,
    Kill(String),
    Unknown(String),
    Empty,
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    match cmd {
        "" => Command::Empty,
        "q" | "quit" | "exit" => Command::Quit,
        "d" => Command::Save,
        "k" | "kill" => Command::Kill(rest.trim().to_string()),
        other => Command::Unknown(other.to_string()),
    }
}

/// Terminal input forwarded from the reader thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Key(KeyEvent),
    Resize,
}

#[derive(Debug, PartialEq, Eq)]
enum KeyAction {
    Continue,
    Quit,
    Submit(Command),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoticeKind {
    Ok,
    Warn,
    Err,
}

/// One-line feedback for the last command.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Notice {
    kind: NoticeKind,
    text: String,
}

impl Notice {
    fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Everything the screen shows.
struct Dashboard {
    args: TopArgs,
    snapshot: Option<SystemSnapshot>,
    input: String,
    notice: Option<Notice>,
    sampling: bool,
}

impl Dashboard {
    fn new(args: TopArgs) -> Self {
        Self {
            args,
            snapshot: None,
            input: String::new(),
            notice: None,
            sampling: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> KeyAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') | KeyCode::Char('d') => KeyAction::Quit,
                KeyCode::Char('u') => {
                    self.input.clear();
                    KeyAction::Continue
                }
                _ => KeyAction::Continue,
            };
        }

        match key.code {
            KeyCode::Enter => match parse_command(&std::mem::take(&mut self.input)) {
                Command::Quit => KeyAction::Quit,
                Command::Empty => KeyAction::Continue,
                command => KeyAction::Submit(command),
            },
            KeyCode::Esc if self.input.is_empty() => KeyAction::Quit,
            KeyCode::Esc => {
                self.input.clear();
                KeyAction::Continue
            }
            KeyCode::Backspace => {
                self.input.pop();
                KeyAction::Continue
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                KeyAction::Continue
            }
            _ => KeyAction::Continue,
        }
    }
}

pub async fn execute(config: SamplingConfig, args: TopArgs) -> anyhow::Result<ExitCode> {
    // Registered before the first cycle so no SIGINT is lost.
    let mut interrupt = signal(SignalKind::interrupt()).context("installing the SIGINT handler")?;

    let mut terminal = enter_terminal()?;
    let result = run(&mut terminal, config, args, &mut interrupt).await;

    let _ = std::panic::take_hook();
    restore_terminal()?;
    result.map(|()| ExitCode::SUCCESS)
}

fn enter_terminal() -> anyhow::Result<DashboardTerminal> {
    terminal::enable_raw_mode().context("terminal does not support raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        original_hook(info);
    }));

    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal() -> io::Result<()> {
    terminal::disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)
}

/// Forwards key presses and resizes until the receiver goes away.
fn spawn_input_reader(tx: UnboundedSender<Input>) {
    std::thread::spawn(move || {
        while !tx.is_closed() {
            match event::poll(INPUT_POLL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::debug!(error = %e, "terminal input closed");
                    break;
                }
            }
            let input = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Input::Key(key),
                Ok(Event::Resize(..)) => Input::Resize,
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!(error = %e, "terminal input closed");
                    break;
                }
            };
            if tx.send(input).is_err() {
                break;
            }
        }
    });
}

/// What ended one wait of the refresh loop.
enum Wake<T> {
    Interrupt,
    Cycle(Result<T, JoinError>),
    Input(Option<Input>),
    Tick,
}

/// Waits for the in-flight cycle, terminal input, SIGINT, or the refresh
/// deadline when no cycle is running.
async fn next_wake<T>(
    cycle: &mut Option<JoinHandle<T>>,
    deadline: Instant,
    inputs: &mut UnboundedReceiver<Input>,
    interrupt: &mut Signal,
) -> Wake<T> {
    let idle = cycle.is_none();
    tokio::select! {
        biased;
        _ = interrupt.recv() => Wake::Interrupt,
        joined = async {
            match cycle.as_mut() {
                Some(handle) => handle.await,
                None => std::future::pending().await,
            }
        } => Wake::Cycle(joined),
        input = inputs.recv() => Wake::Input(input),
        _ = tokio::time::sleep_until(deadline), if idle => Wake::Tick,
    }
}

async fn run(
    terminal: &mut DashboardTerminal,
    config: SamplingConfig,
    args: TopArgs,
    interrupt: &mut Signal,
) -> anyhow::Result<()> {
    let refresh = Duration::from_millis(args.refresh);
    let (tx, mut inputs) = mpsc::unbounded_channel();
    spawn_input_reader(tx);

    let mut dashboard = Dashboard::new(args);
    let mut idle_session = Some(SamplingSession::new(config));
    let mut cycle: Option<JoinHandle<CycleOutput>> = None;
    let mut started = Instant::now();
    let mut deadline = started;

    loop {
        if cycle.is_none() && Instant::now() >= deadline {
            if let Some(session) = idle_session.take() {
                started = Instant::now();
                deadline = started + refresh;
                cycle = Some(super::spawn_cycle(session));
            }
        }
        dashboard.sampling = cycle.is_some();
        terminal.draw(|frame| ui::draw(frame, &dashboard))?;

        match next_wake(&mut cycle, deadline, &mut inputs, interrupt).await {
            Wake::Interrupt => return Ok(()),
            Wake::Tick | Wake::Input(Some(Input::Resize)) => {}
            Wake::Input(None) => return Ok(()),
            Wake::Cycle(joined) => {
                cycle = None;
                let (session, result) = joined.context("sampling task panicked")?;
                idle_session = Some(session);
                dashboard.snapshot = Some(result.context("sampling cycle failed")?);
                tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "dashboard cycle finished");
            }
            Wake::Input(Some(Input::Key(key))) => match dashboard.on_key(key) {
                KeyAction::Quit => return Ok(()),
                KeyAction::Submit(command) => {
                    dashboard.notice = handle(command, dashboard.snapshot.as_ref());
                }
                KeyAction::Continue => {}
            },
        }
    }
}

fn handle(command: Command, snapshot: Option<&SystemSnapshot>) -> Option<Notice> {
    let notice = match command {
        Command::Save => match snapshot {
            None => Notice::new(NoticeKind::Warn, "No snapshot yet: the first cycle is still running"),
            Some(snapshot) => {
                let name = default_snapshot_filename(chrono::Utc::now());
                let path = std::env::current_dir()
                    .map(|dir| dir.join(&name))
                    .unwrap_or_else(|_| name.into());
                match snapshot.save_to(&path) {
                    Ok(()) => Notice::new(NoticeKind::Ok, format!("Saved snapshot: {}", path.display())),
                    Err(e) => Notice::new(NoticeKind::Err, format!("Snapshot failed: {e}")),
                }
            }
        },
        Command::Kill(args) => match parse_kill_line(&args) {
            Ok((pid, sig)) => match send_signal(pid, sig) {
                Ok(()) => Notice::new(NoticeKind::Ok, format!("OK: kill({pid}, {sig}) success")),
                Err(e) => Notice::new(NoticeKind::Err, format!("ERR: kill({pid}, {sig}) {e}")),
            },
            Err(e) => Notice::new(
                NoticeKind::Warn,
                format!("Usage: k <pid> [--sigkill|--sigterm|--signal <n>]: {e}"),
            ),
        },
        Command::Unknown(cmd) => Notice::new(NoticeKind::Warn, format!("Unknown command '{cmd}'")),
        Command::Quit | Command::Empty => return None,
    };
    Some(notice)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn typed(dashboard: &mut Dashboard, text: &str) {
        for c in text.chars() {
            assert_eq!(dashboard.on_key(key(KeyCode::Char(c))), KeyAction::Continue);
        }
    }

    fn dashboard() -> Dashboard {
        Dashboard::new(TopArgs {
            refresh: 2000,
            sort: SortKey::Cpu,
            top: 25,
            no_color: true,
        })
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("  q "), Command::Quit);
        assert_eq!(parse_command("exit"), Command::Quit);
        assert_eq!(parse_command("d"), Command::Save);
        assert_eq!(parse_command("k 42 --sigkill"), Command::Kill("42 --sigkill".to_string()));
        assert_eq!(parse_command(""), Command::Empty);
        assert_eq!(parse_command("zz"), Command::Unknown("zz".to_string()));
    }

    #[test]
    fn test_refresh_and_top_floors() {
        assert_eq!(parse_refresh("10").unwrap(), 250);
        assert_eq!(parse_refresh("5000").unwrap(), 5000);
        assert!(parse_refresh("fast").is_err());
        assert_eq!(parse_top("0").unwrap(), 1);
        assert_eq!(parse_top("40").unwrap(), 40);
    }

    #[test]
    fn test_typed_line_submits_on_enter() {
        let mut dash = dashboard();
        typed(&mut dash, "k 42 --sigkilx");
        dash.on_key(key(KeyCode::Backspace));
        typed(&mut dash, "l");
        assert_eq!(dash.input, "k 42 --sigkill");
        assert_eq!(
            dash.on_key(key(KeyCode::Enter)),
            KeyAction::Submit(Command::Kill("42 --sigkill".to_string()))
        );
        assert!(dash.input.is_empty());
    }

    #[test]
    fn test_quit_keys() {
        let mut dash = dashboard();
        typed(&mut dash, "q");
        assert_eq!(dash.on_key(key(KeyCode::Enter)), KeyAction::Quit);

        typed(&mut dash, "half typed");
        assert_eq!(dash.on_key(key(KeyCode::Esc)), KeyAction::Continue);
        assert!(dash.input.is_empty());
        assert_eq!(dash.on_key(key(KeyCode::Esc)), KeyAction::Quit);

        typed(&mut dash, "d");
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(dash.on_key(ctrl_c), KeyAction::Quit);
    }

    #[test]
    fn test_empty_enter_is_ignored() {
        let mut dash = dashboard();
        typed(&mut dash, "   ");
        assert_eq!(dash.on_key(key(KeyCode::Enter)), KeyAction::Continue);
    }

    #[test]
    fn test_handle_refused_kill() {
        let notice = handle(Command::Kill("1".to_string()), None).unwrap();
        assert_eq!(notice.kind, NoticeKind::Err);
        assert!(notice.text.starts_with("ERR"));
        assert!(notice.text.contains("PID <= 1"));
    }

    #[test]
    fn test_handle_bad_kill_usage() {
        let notice = handle(Command::Kill(String::new()), None).unwrap();
        assert_eq!(notice.kind, NoticeKind::Warn);
        assert!(notice.text.starts_with("Usage"));
    }

    #[test]
    fn test_handle_save_before_first_cycle() {
        let notice = handle(Command::Save, None).unwrap();
        assert_eq!(notice.kind, NoticeKind::Warn);
        assert!(handle(Command::Empty, None).is_none());
    }

    #[tokio::test]
    async fn test_sigint_during_cycle_ends_wait() {
        let mut interrupt = signal(SignalKind::interrupt()).unwrap();
        let (_tx, mut inputs) = mpsc::unbounded_channel();
        let mut cycle = Some(tokio::task::spawn_blocking(|| {
            std::thread::sleep(Duration::from_millis(300));
        }));

        // Raised while nothing is waiting on the listener, as when Ctrl-C
        // arrives between two waits of the loop.
        // SAFETY: raise(3) only delivers a signal to this process, and a
        // handler for SIGINT is registered above.
        assert_eq!(unsafe { libc::raise(libc::SIGINT) }, 0);

        let deadline = Instant::now() + Duration::from_secs(5);
        let wake = next_wake(&mut cycle, deadline, &mut inputs, &mut interrupt).await;
        assert!(matches!(wake, Wake::Interrupt));
    }

    #[tokio::test]
    async fn test_wake_reports_cycle_input_and_tick() {
        // A signal nothing raises, so the SIGINT test cannot leak in here.
        let mut interrupt = signal(SignalKind::user_defined1()).unwrap();
        let (tx, mut inputs) = mpsc::unbounded_channel();
        let deadline = Instant::now() + Duration::from_secs(5);

        let mut cycle = Some(tokio::task::spawn_blocking(|| 7));
        let wake = next_wake(&mut cycle, deadline, &mut inputs, &mut interrupt).await;
        assert!(matches!(wake, Wake::Cycle(Ok(7))));

        tx.send(Input::Resize).unwrap();
        let mut idle: Option<JoinHandle<()>> = None;
        let wake = next_wake(&mut idle, deadline, &mut inputs, &mut interrupt).await;
        assert!(matches!(wake, Wake::Input(Some(Input::Resize))));

        let wake = next_wake(&mut idle, Instant::now(), &mut inputs, &mut interrupt).await;
        assert!(matches!(wake, Wake::Tick));

        drop(tx);
        let far = Instant::now() + Duration::from_secs(5);
        let wake = next_wake(&mut idle, far, &mut inputs, &mut interrupt).await;
        assert!(matches!(wake, Wake::Input(None)));
    }
}
