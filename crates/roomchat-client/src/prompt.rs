//! Identity prompt shown before the chat screen.

use crossterm::{
    cursor::MoveTo,
    execute,
    style::Stylize,
    terminal::{self, Clear, ClearType},
};
use std::io::{self, BufRead, Write};

use crate::error::ClientError;

/// Ask for a display name and a room, centered on a cleared screen.
///
/// Answers are normalized with [`sanitize`]. Blocks on stdin; run it off the
/// async runtime.
///
/// # Errors
///
/// Returns [`ClientError`] if the terminal cannot be queried or stdin
/// cannot be read.
pub fn ask_identity() -> Result<(String, String), ClientError> {
    let (width, height) = terminal::size()?;
    let mut stdout = io::stdout();
    let mut stdin = io::stdin().lock();

    clear(&mut stdout)?;
    for _ in 1..height / 2 {
        writeln!(stdout)?;
    }

    let name = ask(&mut stdout, &mut stdin, "Who are you?: ", width, "name")?;
    let room = ask(&mut stdout, &mut stdin, "Room: ", width, "room")?;
    clear(&mut stdout)?;

    Ok((name, room))
}

fn ask(
    out: &mut impl Write,
    input: &mut impl BufRead,
    label: &str,
    width: u16,
    field: &'static str,
) -> Result<String, ClientError> {
    let padding = usize::from(width).saturating_sub(label.len()) / 2;
    write!(out, "{}{}", " ".repeat(padding), label.green().bold())?;
    out.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|source| ClientError::Prompt { field, source })?;

    Ok(sanitize(&line))
}

fn clear(out: &mut impl Write) -> io::Result<()> {
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))
}

/// Trim surrounding whitespace and replace inner spaces with underscores.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    raw.trim().replace(' ', "_")
}
