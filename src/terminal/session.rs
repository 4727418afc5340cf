//! Scoped terminal setup: raw input, alternate screen, hidden cursor and
//! mouse reporting.
//! Everything is undone when the session is dropped, panics included.

use std::io::{self, Write};
use std::ops::{Deref, DerefMut};

use super::{AnsiTerminal, TerminalSink};

#[cfg(unix)]
type SavedMode = libc::termios;
#[cfg(not(unix))]
type SavedMode = ();

pub struct TerminalSession<W: Write> {
    terminal: AnsiTerminal<W>,
    saved_mode: Option<SavedMode>,
}

impl<W: Write> TerminalSession<W> {
    pub fn enter(terminal: AnsiTerminal<W>) -> io::Result<Self> {
        let saved_mode = enable_raw_mode()?;
        if saved_mode.is_none() {
            log::info!("stdin is not a terminal, input stays in cooked mode");
        }
        Self::with_mode(terminal, saved_mode)
    }

    /// Screen setup only, input modes left as they are
    pub(crate) fn without_raw_mode(terminal: AnsiTerminal<W>) -> io::Result<Self> {
        Self::with_mode(terminal, None)
    }

    fn with_mode(terminal: AnsiTerminal<W>, saved_mode: Option<SavedMode>) -> io::Result<Self> {
        // From here on Drop restores the terminal even if setup fails halfway
        let mut session = Self { terminal, saved_mode };
        session.terminal.alt_screen()?;
        session.terminal.hide_cursor()?;
        session.terminal.enable_mouse()?;
        session.terminal.clear_screen()?;
        session.terminal.flush()?;
        Ok(session)
    }
}

impl<W: Write> Deref for TerminalSession<W> {
    type Target = AnsiTerminal<W>;

    fn deref(&self) -> &Self::Target {
        &self.terminal
    }
}

impl<W: Write> DerefMut for TerminalSession<W> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.terminal
    }
}

impl<W: Write> Drop for TerminalSession<W> {
    fn drop(&mut self) {
        let restored = self
            .terminal
            .disable_mouse()
            .and_then(|_| self.terminal.reset_style())
            .and_then(|_| self.terminal.show_cursor())
            .and_then(|_| self.terminal.main_screen())
            .and_then(|_| self.terminal.flush());
        if let Err(e) = restored {
            log::warn!("failed to restore terminal screen: {}", e);
        }

        if let Some(mode) = self.saved_mode.take() {
            restore_mode(&mode);
        }
        log::debug!("terminal session closed");
    }
}

/// Switch stdin to raw mode. Returns the previous mode, or `None` when
/// stdin is not a terminal.
#[cfg(unix)]
fn enable_raw_mode() -> io::Result<Option<SavedMode>> {
    let fd = libc::STDIN_FILENO;

    // SAFETY: isatty/tcgetattr/tcsetattr only read from or write into the
    // termios value we own
    unsafe {
        if libc::isatty(fd) == 0 {
            return Ok(None);
        }

        let mut original: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &mut original) != 0 {
            return Err(io::Error::last_os_error());
        }

        let mut raw = original;
        raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
        raw.c_iflag &= !(libc::IXON | libc::ICRNL);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;

        if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw) != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Some(original))
    }
}

#[cfg(unix)]
fn restore_mode(mode: &SavedMode) {
    // SAFETY: see enable_raw_mode
    let rc = unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, mode) };
    if rc != 0 {
        log::warn!("failed to restore terminal mode: {}", io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn enable_raw_mode() -> io::Result<Option<SavedMode>> {
    Ok(None)
}

#[cfg(not(unix))]
fn restore_mode(_mode: &SavedMode) {}
