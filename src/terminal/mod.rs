//! Terminal output through ANSI escape sequences
//!
//! The canvas only talks to a [`TerminalSink`]; [`AnsiTerminal`] is the
//! implementation that writes escape codes to any `io::Write`, so tests can
//! capture output in a `Vec<u8>`.

mod input;
mod session;
mod signals;

pub use input::{spawn_input_reader, InputDecoder, InputEvent, MouseAction, MouseButton};
pub use session::TerminalSession;
pub use signals::SignalFlags;

use std::io::{self, BufWriter, Write};

/// Where presented cells go
pub trait TerminalSink {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Zero-based column `x`, row `y`
    fn move_cursor(&mut self, x: usize, y: usize) -> io::Result<()>;
    /// Escape codes and other control text
    fn write_raw(&mut self, s: &str) -> io::Result<()>;
    fn write_glyph(&mut self, glyph: char) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// Buffered ANSI writer with a known size
pub struct AnsiTerminal<W: Write> {
    out: BufWriter<W>,
    width: usize,
    height: usize,
}

impl<W: Write> AnsiTerminal<W> {
    pub fn new(out: W, width: usize, height: usize) -> Self {
        Self {
            out: BufWriter::with_capacity(64 * 1024, out),
            width,
            height,
        }
    }

    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    /// Underlying writer. Bytes still buffered are not visible until a flush.
    pub fn get_mut(&mut self) -> &mut W {
        self.out.get_mut()
    }

    pub fn clear_screen(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x1b[2J")
    }

    pub fn alt_screen(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x1b[?1049h")
    }

    pub fn main_screen(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x1b[?1049l")
    }

    pub fn show_cursor(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x1b[?25h")
    }

    pub fn hide_cursor(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x1b[?25l")
    }

    /// Button presses, drags and releases, reported in SGR form
    pub fn enable_mouse(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x1b[?1000h\x1b[?1002h\x1b[?1006h")
    }

    pub fn disable_mouse(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x1b[?1006l\x1b[?1002l\x1b[?1000l")
    }

    /// Back to the terminal's default colors
    pub fn reset_style(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x1b[0m")
    }
}

impl<W: Write> TerminalSink for AnsiTerminal<W> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn move_cursor(&mut self, x: usize, y: usize) -> io::Result<()> {
        write!(self.out, "\x1b[{};{}H", y + 1, x + 1)
    }

    fn write_raw(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }

    fn write_glyph(&mut self, glyph: char) -> io::Result<()> {
        let mut buf = [0u8; 4];
        self.out.write_all(glyph.encode_utf8(&mut buf).as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Columns and rows of the terminal on stdout, if it is one
#[cfg(unix)]
pub fn terminal_size() -> Option<(usize, usize)> {
    // SAFETY: winsize is plain old data and TIOCGWINSZ only writes into it
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
    if rc != 0 || ws.ws_col == 0 || ws.ws_row == 0 {
        return None;
    }
    Some((ws.ws_col as usize, ws.ws_row as usize))
}

#[cfg(not(unix))]
pub fn terminal_size() -> Option<(usize, usize)> {
    None
}
