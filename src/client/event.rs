use std::{sync::mpsc, thread, time::Duration};

use color_eyre::Result;
use crossterm::event::{self as term, KeyEvent, KeyEventKind};
use log::error;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// What the board view reacts to. Everything else crossterm reports is
/// dropped by the reader thread.
#[derive(Clone, Copy, Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
}

/// Reads the terminal on its own thread so the draw loop never blocks on
/// input.
pub struct EventHandler {
    events: mpsc::Receiver<Event>,
    _reader: thread::JoinHandle<()>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, events) = mpsc::channel();
        let _reader = thread::spawn(move || loop {
            let read = match term::poll(POLL_INTERVAL) {
                Ok(false) => continue,
                Ok(true) => term::read(),
                Err(e) => Err(e),
            };
            let event = match read {
                Ok(term::Event::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
                Ok(term::Event::Resize(..)) => Event::Resize,
                Ok(_) => continue,
                Err(e) => {
                    error!("client: terminal input failed: {e}");
                    break;
                }
            };
            if tx.send(event).is_err() {
                break;
            }
        });

        Self { events, _reader }
    }

    /// Waits up to `timeout` for the next event.
    pub fn next(&self, timeout: Duration) -> Result<Option<Event>> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
