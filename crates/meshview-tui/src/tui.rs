//! Terminal session for the mesh view.
//!
//! A [`Tui`] only exists while the terminal is in raw mode on the alternate
//! screen. Leaving happens once: explicitly through [`Tui::exit`], which
//! reports failures, or on drop and on panic, which cannot.

use std::io::{self, Stdout, stdout};

use color_eyre::eyre::Result;
use crossterm::{
    ExecutableCommand, cursor,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Frame, Terminal, backend::CrosstermBackend};
use tracing::debug;

/// Raw-mode terminal drawing the mesh view.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl Tui {
    /// Switch to raw mode on the alternate screen with a hidden cursor.
    ///
    /// If any step fails the terminal is put back before returning.
    pub fn enter() -> Result<Self> {
        let mut session = Self {
            terminal: Terminal::new(CrosstermBackend::new(stdout()))?,
            active: true,
        };
        terminal::enable_raw_mode()?;
        stdout()
            .execute(EnterAlternateScreen)?
            .execute(cursor::Hide)?;
        session.terminal.clear()?;
        debug!("terminal session started");
        Ok(session)
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }

    /// Leave the alternate screen and restore the cursor and cooked mode.
    pub fn exit(mut self) -> Result<()> {
        self.active = false;
        restore()?;
        debug!("terminal session ended");
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if self.active {
            let _ = restore();
        }
    }
}

fn restore() -> io::Result<()> {
    stdout().execute(cursor::Show)?.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()
}

/// Install color-eyre's report and panic hooks, putting the terminal back
/// before a panic message is printed. Call before [`Tui::enter`].
pub fn install_hooks() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .display_env_section(false)
        .into_hooks();
    eyre_hook.install()?;

    let panic_hook = panic_hook.into_panic_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore();
        panic_hook(info);
    }));
    Ok(())
}
