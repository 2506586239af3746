//! Terminal setup for the wizard, restored when the guard drops.

use anyhow::Result;
use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Owns the TUI terminal and puts the real terminal back on drop,
/// including on early `?` returns.
pub struct TerminalGuard {
    terminal: Tui,
    active: AtomicBool,
}

impl TerminalGuard {
    /// Enter raw mode and the alternate screen
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        Ok(Self {
            terminal,
            active: AtomicBool::new(true),
        })
    }

    pub fn terminal(&mut self) -> &mut Tui {
        &mut self.terminal
    }

    /// Restore the terminal now instead of waiting for drop
    pub fn restore(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            Self::cleanup();
        }
    }

    /// Best-effort restore, also used by the panic hook
    pub fn cleanup() {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        let _ = io::stdout().flush();
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Restore the terminal before the panic message is printed
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        TerminalGuard::cleanup();
        original_hook(panic_info);
    }));
}
