//! Line-driven view over an [`OptionsRuntime`].

use anyhow::Context;
use client_core::{
    Notification, OptionsController, OptionsEvent, OptionsHandle, OptionsRuntime, OptionsState,
};
use shared::domain::ProjectId;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::{mpsc::UnboundedReceiver, watch},
};

const HELP: &str = "commands: token <value> | domain <value> | save | refresh | select <id> | \
highlight <id> | clipboard on|off | advanced | reset | state | help | quit";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Dispatch(OptionsEventKind),
    PrintState,
    Help,
    Quit,
}

/// View events a line can produce. Kept separate from [`OptionsEvent`] so
/// parsing stays comparable in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsEventKind {
    Token(String),
    Domain(String),
    Save,
    Refresh,
    Select(ProjectId),
    Highlight(ProjectId),
    Clipboard(bool),
    Advanced,
    Reset,
}

impl From<OptionsEventKind> for OptionsEvent {
    fn from(kind: OptionsEventKind) -> Self {
        match kind {
            OptionsEventKind::Token(token) => Self::TokenEdited(token),
            OptionsEventKind::Domain(domain) => Self::DomainEdited(domain),
            OptionsEventKind::Save => Self::SaveRequested,
            OptionsEventKind::Refresh => Self::RefreshRequested,
            OptionsEventKind::Select(id) => Self::ProjectSelected(id),
            OptionsEventKind::Highlight(id) => Self::ProjectHighlighted(id),
            OptionsEventKind::Clipboard(enabled) => Self::ClipboardToggled(enabled),
            OptionsEventKind::Advanced => Self::AdvancedToggled,
            OptionsEventKind::Reset => Self::ResetRequested,
        }
    }
}

pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let kind = match word {
        // Empty values are legitimate edits: they clear the field.
        "token" => OptionsEventKind::Token(rest.to_string()),
        "domain" => OptionsEventKind::Domain(rest.to_string()),
        "save" => OptionsEventKind::Save,
        "refresh" => OptionsEventKind::Refresh,
        "select" => OptionsEventKind::Select(required_id(word, rest)?),
        "highlight" => OptionsEventKind::Highlight(required_id(word, rest)?),
        "clipboard" => OptionsEventKind::Clipboard(parse_toggle(rest)?),
        "advanced" => OptionsEventKind::Advanced,
        "reset" => OptionsEventKind::Reset,
        "state" => return Ok(Some(Command::PrintState)),
        "help" => return Ok(Some(Command::Help)),
        "quit" | "exit" => return Ok(Some(Command::Quit)),
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(Some(Command::Dispatch(kind)))
}

fn required_id(word: &str, rest: &str) -> Result<ProjectId, String> {
    if rest.is_empty() {
        return Err(format!("'{word}' needs a project id"));
    }
    Ok(ProjectId::from(rest))
}

pub fn parse_toggle(raw: &str) -> Result<bool, String> {
    match raw {
        "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        other => Err(format!("expected 'on' or 'off', got '{other}'")),
    }
}

/// Feeds lines from `input` into a runtime until EOF, `quit` or a read
/// error. The runtime is shut down and joined on every exit path.
pub async fn run<R>(
    controller: OptionsController,
    mut notifications: UnboundedReceiver<Notification>,
    input: R,
) -> anyhow::Result<OptionsController>
where
    R: AsyncBufRead + Unpin,
{
    let runtime = OptionsRuntime::new(controller);
    let handle = runtime.handle();
    let states = runtime.subscribe();
    let runtime_task = tokio::spawn(runtime.run());

    let read_outcome = read_commands(&handle, &states, &mut notifications, input).await;

    handle
        .send(OptionsEvent::Shutdown)
        .await
        .context("options runtime stopped unexpectedly")?;
    let controller = runtime_task.await.context("options runtime panicked")?;
    while let Ok(notification) = notifications.try_recv() {
        print_notification(&notification);
    }

    read_outcome?;
    Ok(controller)
}

async fn read_commands<R>(
    handle: &OptionsHandle,
    states: &watch::Receiver<OptionsState>,
    notifications: &mut UnboundedReceiver<Notification>,
    input: R,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    eprintln!("{HELP}");
    let mut lines = input.lines();
    loop {
        tokio::select! {
            Some(notification) = notifications.recv() => print_notification(&notification),
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read command input")? else {
                    return Ok(());
                };
                match parse_command(&line) {
                    Ok(None) => {}
                    Ok(Some(Command::Dispatch(kind))) => {
                        if let Err(err) = handle.dispatch(kind.into()) {
                            eprintln!("error: {err}");
                        }
                    }
                    Ok(Some(Command::PrintState)) => print_state(states)?,
                    Ok(Some(Command::Help)) => eprintln!("{HELP}"),
                    Ok(Some(Command::Quit)) => return Ok(()),
                    Err(message) => eprintln!("error: {message}"),
                }
            }
        }
    }
}

fn print_state(states: &watch::Receiver<OptionsState>) -> anyhow::Result<()> {
    let state = states.borrow().clone();
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

pub fn print_notification(notification: &Notification) {
    match notification {
        Notification::Success(message) => eprintln!("ok: {message}"),
        Notification::Error(message) => eprintln!("error: {message}"),
    }
}
