use std::{io, panic};

use color_eyre::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::client::{app::App, event::EventHandler, ui};

type Backend = CrosstermBackend<io::Stderr>;

/// Owns the terminal for as long as the board is on screen, along with the
/// key reader feeding it.
pub struct Tui {
    terminal: Terminal<Backend>,
    pub events: EventHandler,
}

impl Tui {
    pub fn new(events: EventHandler) -> Result<Self> {
        let terminal = Terminal::new(CrosstermBackend::new(io::stderr()))?;
        Ok(Self { terminal, events })
    }

    /// Raw mode plus the alternate screen. A panic restores the terminal
    /// before its message prints.
    pub fn enter(&mut self) -> Result<()> {
        enable_raw_mode()?;
        execute!(io::stderr(), EnterAlternateScreen)?;

        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if let Err(e) = restore() {
                eprintln!("could not restore the terminal: {e}");
            }
            previous(info);
        }));

        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        restore()?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    pub fn draw(&mut self, app: &App) -> Result<()> {
        self.terminal.draw(|frame| ui::render(app, frame))?;
        Ok(())
    }
}

fn restore() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stderr(), LeaveAlternateScreen)?;
    Ok(())
}
