//! Terminal driver for the chat screen.
//!
//! Owns the terminal while the session runs: draws [`ChatView`] with ratatui,
//! reads keys from crossterm's event stream, forwards submitted lines to the
//! router and shows the messages the router hands to its [`QueueSink`].
//!
//! [`QueueSink`]: roomchat_core::QueueSink

use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures_util::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame, Terminal,
};
use roomchat_core::{LineStyle, Shutdown};
use roomchat_protocol::Message;
use std::io::{stdout, Stdout};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::view::{Action, ChatView, Focus, Row};

const BORDER_SIZE: u16 = 2;
const PROMPT: &str = "> ";

/// Channels connecting the screen to the router.
pub struct UiChannels {
    /// Messages to display, fed by the router's sink.
    pub displayed: mpsc::UnboundedReceiver<Message>,
    /// Submitted lines, read by the router.
    pub lines: mpsc::UnboundedSender<String>,
    /// Fired once when the operator presses a quit key.
    pub quit: oneshot::Sender<()>,
}

/// Raw mode and the alternate screen, restored on drop.
pub struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    /// Take over the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode or the alternate screen cannot be
    /// entered.
    pub fn enter() -> Result<Self, ClientError> {
        enable_raw_mode()?;
        if let Err(e) = stdout().execute(EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }

        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Run the chat screen until the session shuts down.
///
/// `view` may already hold lines to show on the first frame.
///
/// # Errors
///
/// Returns an error if drawing or reading terminal events fails. The lines
/// channel is dropped on return, which the router treats as the UI closing.
pub async fn run(
    guard: &mut TerminalGuard,
    mut view: ChatView,
    channels: UiChannels,
    shutdown: Shutdown,
) -> Result<(), ClientError> {
    let UiChannels {
        mut displayed,
        lines,
        quit,
    } = channels;
    let mut quit = Some(quit);
    let mut events = EventStream::new();

    draw(&mut guard.terminal, &mut view)?;

    loop {
        tokio::select! {
            biased;

            reason = shutdown.wait() => {
                debug!(%reason, "Chat screen closing");
                break;
            }

            Some(message) = displayed.recv() => {
                view.push_message(&message);
            }

            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    match view.handle_key(key) {
                        Action::None => {}
                        Action::Submit(text) => {
                            if lines.send(text).is_err() {
                                warn!("Router gone, line not sent");
                            }
                        }
                        Action::Quit => {
                            if let Some(quit) = quit.take() {
                                info!("Quit requested");
                                let _ = quit.send(());
                            }
                        }
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }

        draw(&mut guard.terminal, &mut view)?;
    }

    Ok(())
}

fn draw(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    view: &mut ChatView,
) -> Result<(), ClientError> {
    terminal.draw(|frame| render(frame, view))?;
    Ok(())
}

/// Draw the message view above the input line.
pub fn render(frame: &mut Frame, view: &mut ChatView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(90), Constraint::Min(3)])
        .split(frame.area());

    render_messages(frame, view, chunks[0]);
    render_input(frame, view, chunks[1]);
}

fn border(focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default().borders(Borders::ALL).border_style(style)
}

fn render_messages(frame: &mut Frame, view: &mut ChatView, area: Rect) {
    let width = usize::from(area.width.saturating_sub(BORDER_SIZE));
    let height = usize::from(area.height.saturating_sub(BORDER_SIZE));
    view.set_viewport(width, height);

    let items: Vec<ListItem> = view.visible().iter().map(styled).collect();
    let list = List::new(items).block(border(view.focus() == Focus::Messages));

    frame.render_widget(list, area);
}

fn styled(row: &Row) -> ListItem<'static> {
    let label = |color| {
        Span::styled(
            row.label.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )
    };
    let body = |color| Span::styled(row.body.clone(), Style::default().fg(color));

    let spans = match row.style {
        LineStyle::Notice => vec![body(Color::Yellow)],
        LineStyle::User => vec![label(Color::Green), body(Color::White)],
        LineStyle::Own => vec![label(Color::Red), body(Color::White)],
        LineStyle::Plain => vec![body(Color::White)],
    };

    ListItem::new(Line::from(spans))
}

fn render_input(frame: &mut Frame, view: &ChatView, area: Rect) {
    let focused = view.focus() == Focus::Input;
    let width = usize::from(area.width.saturating_sub(BORDER_SIZE));
    let (shown, cursor) = view.input_window(PROMPT, width);

    let paragraph = Paragraph::new(shown)
        .style(Style::default().fg(Color::White))
        .block(border(focused));

    frame.render_widget(paragraph, area);

    if focused {
        let x = area
            .x
            .saturating_add(1)
            .saturating_add(u16::try_from(cursor).unwrap_or(u16::MAX));
        frame.set_cursor_position((x, area.y.saturating_add(1)));
    }
}
