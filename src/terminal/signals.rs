//! Process signals as flags the frame loop polls between frames.
//!
//! Handlers only set atomics. Quitting through a flag lets the frame loop
//! return normally, so the session restores the terminal on its way out.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct SignalFlags {
    quit: Arc<AtomicBool>,
    resized: Arc<AtomicBool>,
}

impl SignalFlags {
    /// Flags with no handlers behind them
    pub fn new() -> Self {
        Self::default()
    }

    /// SIGINT, SIGTERM and SIGHUP request a quit, SIGWINCH a resize.
    /// A second quit signal while the first is pending exits right away.
    #[cfg(unix)]
    pub fn register() -> io::Result<Self> {
        use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM, SIGWINCH};

        let flags = Self::new();
        for signal in [SIGINT, SIGTERM, SIGHUP] {
            signal_hook::flag::register_conditional_shutdown(signal, 1, Arc::clone(&flags.quit))?;
            signal_hook::flag::register(signal, Arc::clone(&flags.quit))?;
        }
        signal_hook::flag::register(SIGWINCH, Arc::clone(&flags.resized))?;

        log::debug!("signal handlers installed");
        Ok(flags)
    }

    #[cfg(not(unix))]
    pub fn register() -> io::Result<Self> {
        Ok(Self::new())
    }

    pub fn request_quit(&self) {
        self.quit.store(true, Ordering::SeqCst);
    }

    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }

    pub fn notify_resize(&self) {
        self.resized.store(true, Ordering::SeqCst);
    }

    /// Whether the terminal was resized since the last call
    pub fn take_resize(&self) -> bool {
        self.resized.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_start_clear() {
        let flags = SignalFlags::new();
        assert!(!flags.quit_requested());
        assert!(!flags.take_resize());
    }

    #[test]
    fn test_resize_is_taken_once() {
        let flags = SignalFlags::new();
        flags.notify_resize();
        assert!(flags.take_resize());
        assert!(!flags.take_resize());
    }

    #[test]
    fn test_clones_share_state() {
        let flags = SignalFlags::new();
        let handler_side = flags.clone();
        handler_side.request_quit();
        assert!(flags.quit_requested());
    }

    #[cfg(unix)]
    #[test]
    fn test_raised_signal_sets_quit() {
        let flags = SignalFlags::register().unwrap();
        // SAFETY: raise only delivers a signal to this process, and a
        // handler for SIGHUP is installed above
        unsafe {
            libc::raise(libc::SIGHUP);
        }
        assert!(flags.quit_requested());
    }
}
