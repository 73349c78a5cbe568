//! Chat screen state.
//!
//! Holds everything the screen shows and turns key presses into actions.
//! Pure state: drawing lives in [`crate::tui`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use roomchat_core::{DisplayLine, LineStyle};
use roomchat_protocol::Message;

/// Which widget receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// The input line.
    Input,
    /// The message view, for scrolling.
    Messages,
}

/// What a key press asks the driver to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing beyond a redraw.
    None,
    /// Send this line.
    Submit(String),
    /// The operator wants out.
    Quit,
}

/// One screen row of a wrapped [`DisplayLine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Style of the line this row belongs to.
    pub style: LineStyle,
    /// The part of the `label: ` prefix that falls on this row.
    pub label: String,
    /// The part of the body text that falls on this row.
    pub body: String,
}

/// Split `line` into rows of at most `width` characters.
///
/// Breaks after the last space that fits and hard-breaks words longer than a
/// row. Rows are contiguous: joined together they give back the full
/// `label: text` string.
#[must_use]
pub fn wrap(line: &DisplayLine, width: usize) -> Vec<Row> {
    let prefix = line
        .label
        .as_ref()
        .map(|label| format!("{label}: "))
        .unwrap_or_default();
    let label_len = prefix.chars().count();
    let chars: Vec<char> = prefix.chars().chain(line.text.chars()).collect();
    let width = width.max(1);

    let slice = |from: usize, to: usize| -> String {
        if from < to {
            chars[from..to].iter().collect()
        } else {
            String::new()
        }
    };
    let row = |from: usize, to: usize| Row {
        style: line.style,
        label: slice(from, to.min(label_len)),
        body: slice(from.max(label_len), to),
    };

    if chars.is_empty() {
        return vec![row(0, 0)];
    }

    let mut rows = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let limit = start.saturating_add(width).min(chars.len());
        let end = if limit == chars.len() {
            limit
        } else {
            chars[start..limit]
                .iter()
                .rposition(|c| *c == ' ')
                .map_or(limit, |i| start + i + 1)
        };
        rows.push(row(start, end));
        start = end;
    }
    rows
}

/// State of the chat screen.
#[derive(Debug)]
pub struct ChatView {
    lines: Vec<DisplayLine>,
    input: String,
    focus: Focus,
    /// Rows scrolled up from the bottom; 0 follows the newest line.
    scroll: usize,
    /// Message view size at the last draw.
    width: usize,
    height: usize,
}

impl ChatView {
    /// An empty screen with the input line focused.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            input: String::new(),
            focus: Focus::Input,
            scroll: 0,
            width: usize::MAX,
            height: 1,
        }
    }

    /// Append a received message and jump to the end.
    pub fn push_message(&mut self, message: &Message) {
        self.push(DisplayLine::from_message(message));
    }

    /// Append an unlabelled informational line.
    pub fn push_info(&mut self, text: impl Into<String>) {
        self.push(DisplayLine {
            style: LineStyle::Plain,
            label: None,
            text: text.into(),
        });
    }

    fn push(&mut self, line: DisplayLine) {
        self.lines.push(line);
        self.scroll = 0;
    }

    /// Handle one key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return Action::Quit,
            KeyCode::Esc => return Action::Quit,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Input => Focus::Messages,
                    Focus::Messages => Focus::Input,
                };
                return Action::None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Input => self.edit(key.code, ctrl),
            Focus::Messages => {
                self.navigate(key.code);
                Action::None
            }
        }
    }

    fn edit(&mut self, code: KeyCode, ctrl: bool) -> Action {
        match code {
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.input.pop();
                Action::None
            }
            KeyCode::Char(c) if !ctrl => {
                self.input.push(c);
                Action::None
            }
            _ => Action::None,
        }
    }

    fn submit(&mut self) -> Action {
        if self.input.is_empty() {
            return Action::None;
        }
        let text = std::mem::take(&mut self.input);
        self.push(DisplayLine::own(text.clone()));
        Action::Submit(text)
    }

    fn navigate(&mut self, code: KeyCode) {
        let max = self.max_scroll();
        self.scroll = match code {
            KeyCode::Up => self.scroll.saturating_add(1),
            KeyCode::Down => self.scroll.saturating_sub(1),
            KeyCode::PageUp => self.scroll.saturating_add(self.height),
            KeyCode::PageDown => self.scroll.saturating_sub(self.height),
            KeyCode::End => 0,
            KeyCode::Home => max,
            _ => self.scroll,
        }
        .min(max);
    }

    fn total_rows(&self) -> usize {
        self.lines
            .iter()
            .map(|line| wrap(line, self.width).len())
            .sum()
    }

    fn max_scroll(&self) -> usize {
        self.total_rows().saturating_sub(self.height)
    }

    /// Record the message view size so wrapping and paging match the screen.
    pub fn set_viewport(&mut self, width: usize, height: usize) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.scroll = self.scroll.min(self.max_scroll());
    }

    /// Rows that fit in the viewport at the current scroll, oldest first.
    #[must_use]
    pub fn visible(&self) -> Vec<Row> {
        let wanted = self.scroll.saturating_add(self.height);
        let mut rows = Vec::new();
        for line in self.lines.iter().rev() {
            if rows.len() >= wanted {
                break;
            }
            rows.extend(wrap(line, self.width).into_iter().rev());
        }

        let mut visible: Vec<Row> = rows
            .into_iter()
            .skip(self.scroll)
            .take(self.height)
            .collect();
        visible.reverse();
        visible
    }

    /// The end of `prompt` plus the typed text that fits in `width` columns,
    /// and the cursor column within it.
    ///
    /// One column is kept free for the cursor, so the newest character is
    /// always in view.
    #[must_use]
    pub fn input_window(&self, prompt: &str, width: usize) -> (String, usize) {
        let full: Vec<char> = prompt.chars().chain(self.input.chars()).collect();
        let room = width.saturating_sub(1);
        let skip = full.len().saturating_sub(room);
        (full[skip..].iter().collect(), full.len() - skip)
    }

    /// All lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> &[DisplayLine] {
        &self.lines
    }

    /// Text typed so far.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Focused widget.
    #[must_use]
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Current scroll offset from the bottom.
    #[must_use]
    pub fn scroll(&self) -> usize {
        self.scroll
    }
}

impl Default for ChatView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(view: &mut ChatView, text: &str) {
        for c in text.chars() {
            view.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn filled(count: usize) -> ChatView {
        let mut view = ChatView::new();
        for i in 0..count {
            view.push_info(format!("line {i}"));
        }
        view
    }

    #[test]
    fn test_enter_submits_and_echoes() {
        let mut view = ChatView::new();
        type_text(&mut view, "hello");

        assert_eq!(view.handle_key(key(KeyCode::Enter)), Action::Submit("hello".into()));
        assert_eq!(view.input(), "");

        let echo = view.lines().last().unwrap();
        assert_eq!(echo.style, LineStyle::Own);
        assert_eq!(echo.to_string(), "You: hello");
    }

    #[test]
    fn test_empty_enter_does_nothing() {
        let mut view = ChatView::new();
        assert_eq!(view.handle_key(key(KeyCode::Enter)), Action::None);
        assert!(view.lines().is_empty());
    }

    #[test]
    fn test_backspace() {
        let mut view = ChatView::new();
        type_text(&mut view, "hi!");
        view.handle_key(key(KeyCode::Backspace));
        assert_eq!(view.input(), "hi");
    }

    #[test]
    fn test_quit_keys() {
        let mut view = ChatView::new();
        assert_eq!(view.handle_key(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            view.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(view.input(), "");
    }

    #[test]
    fn test_tab_toggles_focus() {
        let mut view = ChatView::new();
        view.handle_key(key(KeyCode::Tab));
        assert_eq!(view.focus(), Focus::Messages);

        // Typing goes nowhere while the messages have focus
        type_text(&mut view, "x");
        assert_eq!(view.input(), "");

        view.handle_key(key(KeyCode::Tab));
        assert_eq!(view.focus(), Focus::Input);
    }

    #[test]
    fn test_scrolling_is_bounded() {
        let mut view = filled(20);
        view.set_viewport(80, 5);
        view.handle_key(key(KeyCode::Tab));

        view.handle_key(key(KeyCode::Up));
        assert_eq!(view.scroll(), 1);
        assert_eq!(view.visible().last().unwrap().body, "line 18");

        for _ in 0..10 {
            view.handle_key(key(KeyCode::PageUp));
        }
        assert_eq!(view.scroll(), 15);
        assert_eq!(view.visible()[0].body, "line 0");

        view.handle_key(key(KeyCode::PageDown));
        assert_eq!(view.scroll(), 10);

        for _ in 0..20 {
            view.handle_key(key(KeyCode::Down));
        }
        assert_eq!(view.scroll(), 0);
    }

    #[test]
    fn test_new_message_jumps_to_end() {
        let mut view = filled(20);
        view.set_viewport(80, 5);
        view.handle_key(key(KeyCode::Tab));
        view.handle_key(key(KeyCode::PageUp));
        assert_eq!(view.scroll(), 5);

        view.push_message(&Message::notice("lobby", "Alice joined"));
        assert_eq!(view.scroll(), 0);
        assert_eq!(view.visible().last().unwrap().body, "Alice joined");
    }

    #[test]
    fn test_visible_with_few_lines() {
        let mut view = filled(2);
        view.set_viewport(80, 10);
        assert_eq!(view.visible().len(), 2);
    }

    #[test]
    fn test_wrap_breaks_after_spaces() {
        let message = Message::user("a", "Alice", "lobby", "the quick brown fox");
        let rows = wrap(&DisplayLine::from_message(&message), 12);

        let joined: Vec<String> = rows
            .iter()
            .map(|r| format!("{}{}", r.label, r.body))
            .collect();
        assert_eq!(joined, ["Alice: the ", "quick brown ", "fox"]);
        assert_eq!(rows[0].label, "Alice: ");
        assert_eq!(rows[0].body, "the ");
        assert_eq!(rows[1].label, "");
    }

    #[test]
    fn test_wrap_splits_long_words_and_labels() {
        let message = Message::user("a", "Bartholomew", "lobby", "abcdefghij");
        let rows = wrap(&DisplayLine::from_message(&message), 5);

        let joined: String = rows
            .iter()
            .map(|r| format!("{}{}", r.label, r.body))
            .collect();
        assert_eq!(joined, "Bartholomew: abcdefghij");
        assert!(rows
            .iter()
            .all(|r| r.label.chars().count() + r.body.chars().count() <= 5));

        // The label ends mid-row and the body starts on the next one
        assert_eq!(rows[2].label, "w: ");
        assert_eq!(rows[2].body, "");
        assert_eq!(rows[3].label, "");
        assert_eq!(rows[3].body, "abcde");
    }

    #[test]
    fn test_wrap_empty_line_keeps_one_row() {
        let line = DisplayLine::from_message(&Message::notice("lobby", ""));
        assert_eq!(wrap(&line, 10).len(), 1);
    }

    #[test]
    fn test_scrolling_counts_wrapped_rows() {
        let mut view = ChatView::new();
        view.push_info("aaaa bbbb cccc");
        view.push_info("tail");
        view.set_viewport(5, 2);

        // Four rows in total, two fit
        let bodies: Vec<String> = view.visible().into_iter().map(|r| r.body).collect();
        assert_eq!(bodies, ["cccc", "tail"]);

        view.handle_key(key(KeyCode::Tab));
        view.handle_key(key(KeyCode::Home));
        assert_eq!(view.scroll(), 2);
        let bodies: Vec<String> = view.visible().into_iter().map(|r| r.body).collect();
        assert_eq!(bodies, ["aaaa ", "bbbb "]);
    }

    #[test]
    fn test_input_window_follows_cursor() {
        let mut view = ChatView::new();
        type_text(&mut view, "hi");
        assert_eq!(view.input_window("> ", 10), ("> hi".to_string(), 4));

        type_text(&mut view, " there, this is long");
        let (shown, cursor) = view.input_window("> ", 10);
        assert_eq!(shown, "s is long");
        assert_eq!(cursor, 9);
    }
}
