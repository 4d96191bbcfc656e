use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveToPreviousLine, Show};
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{QueueableCommand, queue};
use itc_core::traits::{OutputSink, StopMode};

/// Sortie terminal : redessine la frame en place, sans alternate screen.
///
/// Remembers how many rows the previous frame used, moves back up over
/// them and clears down before printing the next one. The cursor is hidden
/// while drawing and restored by [`OutputSink::finish`] or on drop.
///
/// # Example
/// ```
/// use itc_core::traits::{OutputSink, StopMode};
/// use itc_render::terminal::TerminalSink;
///
/// let mut sink = TerminalSink::new(Vec::new());
/// sink.draw("ab\ncd").unwrap();
/// sink.finish(StopMode::Finalize).unwrap();
/// assert!(String::from_utf8_lossy(sink.get_ref()).contains("cd"));
/// ```
pub struct TerminalSink<W: Write> {
    out: W,
    rows: u16,
    cursor_hidden: bool,
}

impl TerminalSink<io::Stdout> {
    /// Sink on the process stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSink<W> {
    /// Wrap any writer.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            rows: 0,
            cursor_hidden: false,
        }
    }

    /// Underlying writer.
    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Rows occupied by the last drawn frame.
    #[must_use]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    fn erase_previous(&mut self) -> io::Result<()> {
        if self.rows > 0 {
            queue!(self.out, MoveToPreviousLine(self.rows), Clear(ClearType::FromCursorDown))?;
            self.rows = 0;
        }
        Ok(())
    }

    fn show_cursor(&mut self) -> io::Result<()> {
        if self.cursor_hidden {
            self.out.queue(Show)?;
            self.cursor_hidden = false;
        }
        Ok(())
    }
}

impl<W: Write> OutputSink for TerminalSink<W> {
    fn draw(&mut self, frame: &str) -> io::Result<()> {
        if !self.cursor_hidden {
            self.out.queue(Hide)?;
            self.cursor_hidden = true;
        }
        self.erase_previous()?;
        let mut rows = 0u16;
        for line in frame.lines() {
            queue!(self.out, Print(line), Print("\n"))?;
            rows = rows.saturating_add(1);
        }
        self.rows = rows;
        self.out.flush()
    }

    fn finish(&mut self, mode: StopMode) -> io::Result<()> {
        if mode == StopMode::Clear {
            self.erase_previous()?;
        }
        self.rows = 0;
        self.show_cursor()?;
        self.out.flush()
    }
}

impl<W: Write> Drop for TerminalSink<W> {
    fn drop(&mut self) {
        if self.cursor_hidden {
            let _ = self.show_cursor();
            let _ = self.out.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(sink: &TerminalSink<Vec<u8>>) -> String {
        String::from_utf8_lossy(sink.get_ref()).into_owned()
    }

    #[test]
    fn redraw_moves_back_over_previous_rows() {
        let mut sink = TerminalSink::new(Vec::new());
        sink.draw("aa\nbb\ncc").unwrap();
        assert_eq!(sink.rows(), 3);
        let before = text(&sink);
        assert!(!before.contains("\x1b[3F"));

        sink.draw("dd\nee\nff").unwrap();
        let after = text(&sink);
        // CSI 3 F = cursor to the start of the line 3 rows up.
        assert!(after[before.len()..].starts_with("\x1b[3F\x1b[J"));
        assert!(after.ends_with("ff\n"));
    }

    #[test]
    fn finalize_keeps_last_frame_and_restores_cursor() {
        let mut sink = TerminalSink::new(Vec::new());
        sink.draw("xy").unwrap();
        let drawn = text(&sink).len();
        sink.finish(StopMode::Finalize).unwrap();
        assert_eq!(&text(&sink)[drawn..], "\x1b[?25h");
        assert_eq!(sink.rows(), 0);
    }

    #[test]
    fn clear_erases_last_frame() {
        let mut sink = TerminalSink::new(Vec::new());
        sink.draw("xy\nzz").unwrap();
        let drawn = text(&sink).len();
        sink.finish(StopMode::Clear).unwrap();
        assert_eq!(&text(&sink)[drawn..], "\x1b[2F\x1b[J\x1b[?25h");
    }

    #[test]
    fn cursor_is_hidden_once() {
        let mut sink = TerminalSink::new(Vec::new());
        sink.draw("a").unwrap();
        sink.draw("b").unwrap();
        assert_eq!(text(&sink).matches("\x1b[?25l").count(), 1);
    }
}
