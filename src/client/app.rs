use std::{sync::Arc, time::Duration};

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use log::{error, info};

use token_tracker::{
    engine::{
        prelude::*,
        snapshot::{self, KvStore},
    },
    lookup::{CardLookup, LookupCache, LookupListener},
};

use super::event::{Event, EventHandler};
use super::tui::Tui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Running,
    Quitting,
}

/// Which list the main pane shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Board,
    Stack,
    Graveyard,
}

/// Destructive actions wait here for a `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Cleanup(usize),
    ClearAll(usize),
    DestroyStack(usize),
    ClearGraveyard(usize),
}

impl Pending {
    pub fn prompt(self) -> String {
        match self {
            Pending::Cleanup(n) => format!("Destroy {n} dying token(s)? (y/n)"),
            Pending::ClearAll(n) => format!("Delete all {n} tokens? (y/n)"),
            Pending::DestroyStack(n) => format!("Move all {n} tokens in this stack to the graveyard? (y/n)"),
            Pending::ClearGraveyard(n) => format!("Empty the graveyard ({n} tokens)? (y/n)"),
        }
    }
}

/// The terminal application
pub struct App {
    pub board: Board,
    pub settings: Settings,
    store: Box<dyn KvStore>,
    cache: Arc<LookupCache<Box<dyn CardLookup>>>,
    lookups: LookupListener,
    runtime: tokio::runtime::Handle,

    pub view: View,
    pub cursor: usize,
    pub expanded: ExpandedStack,
    pub pending: Option<Pending>,
    pub status: String,
    pub show_help: bool,

    /// The state of the application.
    mode: Mode,
}

impl App {
    /// Constructs a new instance of [`App`]
    pub fn new(
        board: Board,
        settings: Settings,
        store: Box<dyn KvStore>,
        cache: Arc<LookupCache<Box<dyn CardLookup>>>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        let lookups = cache.subscribe();
        Self {
            board,
            settings,
            store,
            cache,
            lookups,
            runtime,
            view: View::Board,
            cursor: 0,
            expanded: ExpandedStack::default(),
            pending: None,
            status: "Press 1-9 to create tokens, ? for keys".into(),
            show_help: false,
            mode: Mode::Running,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        info!("Starting clientside application");

        let mut tui = Tui::new(EventHandler::new())?;
        tui.enter()?;

        info!("Entering main loop");
        while self.running() {
            tui.draw(self)?;

            let resolved = self.lookups.update();
            if let Some(name) = resolved.last() {
                self.status = format!("Card data ready for {name}");
            }

            if let Some(Event::Key(key)) = tui.events.next(Duration::from_millis(100))? {
                self.update(key);
            }
        }

        self.save();
        info!("Tearing down user interface");
        tui.exit()?;

        Ok(())
    }

    pub fn running(&self) -> bool {
        self.mode != Mode::Quitting
    }

    pub fn quit(&mut self) {
        self.mode = Mode::Quitting;
    }

    /// Built-in templates followed by saved ones, enriched with any card
    /// data that has arrived so far.
    pub fn templates(&self) -> Vec<TokenTemplate> {
        common_templates()
            .iter()
            .chain(self.board.templates())
            .map(|template| self.cache.enrich(template))
            .collect()
    }

    pub fn group_ids(&self) -> Vec<Vec<TokenID>> {
        self.board
            .groups(&self.settings)
            .iter()
            .map(|group| group.ids())
            .collect()
    }

    pub fn list_len(&self) -> usize {
        match self.view {
            View::Board => self.board.groups(&self.settings).len(),
            View::Stack => self.expanded.members(&self.board).len(),
            View::Graveyard => self.board.graveyard().len(),
        }
    }

    pub fn update(&mut self, key: KeyEvent) {
        if let Some(pending) = self.pending.take() {
            if key.code == KeyCode::Char('y') {
                self.confirm(pending);
                self.save();
            } else {
                self.status = "Cancelled".into();
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.quit();
                return;
            }
            KeyCode::Down | KeyCode::Char('j') => self.cursor += 1,
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Char('?') => self.show_help = !self.show_help,
            _ => match self.view {
                View::Board => self.board_key(key.code),
                View::Stack => self.stack_key(key.code),
                View::Graveyard => self.graveyard_key(key.code),
            },
        }

        if self.view == View::Stack && self.expanded.is_empty(&self.board) {
            self.back_to_board();
        }
        self.cursor = self.cursor.min(self.list_len().saturating_sub(1));
        self.save();
    }

    fn board_key(&mut self, code: KeyCode) {
        let current = self.group_ids().get(self.cursor).cloned().unwrap_or_default();
        let single = match current.as_slice() {
            [id] => Some(*id),
            _ => None,
        };
        let stack = ExpandedStack::from_ids(current.iter().copied());

        match code {
            KeyCode::Esc => self.quit(),
            KeyCode::Char(c @ '1'..='9') => self.quick_create(c as usize - '1' as usize),
            KeyCode::Char('+') => {
                let quantity = self.settings.quick_create_quantity() + 1;
                self.settings.set_quick_create_quantity(quantity);
            }
            KeyCode::Char('-') => {
                let quantity = self.settings.quick_create_quantity().saturating_sub(1);
                self.settings.set_quick_create_quantity(quantity);
            }
            KeyCode::Enter if current.len() > 1 => {
                self.expanded = stack;
                self.view = View::Stack;
                self.cursor = 0;
            }
            KeyCode::Char('t') => match single {
                Some(id) => {
                    self.board.toggle_tap(id);
                }
                None => {
                    if self.board.tap_stack(&stack) == 0 {
                        self.board.untap_stack(&stack);
                    }
                }
            },
            KeyCode::Char('p') => {
                self.board.add_plus_counter_to_stack(&stack);
            }
            KeyCode::Char('m') => {
                self.board.add_minus_counter_to_stack(&stack);
            }
            KeyCode::Char('d') => match single {
                Some(id) => {
                    self.board.move_to_graveyard(id);
                    self.status = "Moved to graveyard".into();
                }
                None if !current.is_empty() => {
                    self.expanded = stack;
                    self.pending = Some(Pending::DestroyStack(current.len()));
                }
                None => {}
            },
            KeyCode::Char('u') => {
                if let Some(&id) = current.first() {
                    self.board.duplicate_token(id);
                }
            }
            KeyCode::Char('h') => {
                for &id in current.iter() {
                    self.board.remove_summoning_sickness(id);
                }
            }
            KeyCode::Char('n') => {
                self.board.clear_summoning_sickness();
                self.status = "New turn: everything untapped and ready".into();
            }
            KeyCode::Char('T') => self.board.tap_all(),
            KeyCode::Char('U') => self.board.untap_all(),
            KeyCode::Char('P') => self.board.add_plus_counter_to_all(),
            KeyCode::Char('M') => self.board.add_minus_counter_to_all(),
            KeyCode::Char('c') => match self.board.dying_tokens().len() {
                0 => self.status = "No tokens need cleanup!".into(),
                n => self.pending = Some(Pending::Cleanup(n)),
            },
            KeyCode::Char('X') => match self.board.battlefield().len() {
                0 => {}
                n => self.pending = Some(Pending::ClearAll(n)),
            },
            KeyCode::Char('S') => {
                if let Some(&id) = current.first() {
                    if let Some(token) = self.board.get(id) {
                        let template = token.template();
                        self.status = format!("Saved preset '{}'", template.name);
                        self.board.save_template(template);
                    }
                }
            }
            KeyCode::Char('g') => {
                self.view = View::Graveyard;
                self.cursor = 0;
            }
            KeyCode::Char('s') => {
                self.settings.auto_stack_enabled = !self.settings.auto_stack_enabled;
            }
            KeyCode::Char('[') => {
                let size = self.settings.min_stack_size().saturating_sub(1);
                self.settings.set_min_stack_size(size);
            }
            KeyCode::Char(']') => {
                let size = self.settings.min_stack_size() + 1;
                self.settings.set_min_stack_size(size);
            }
            _ => {}
        }
    }

    fn stack_key(&mut self, code: KeyCode) {
        let members = self.expanded.member_ids(&self.board);
        let current = members.get(self.cursor).copied();

        match code {
            KeyCode::Esc | KeyCode::Enter => self.back_to_board(),
            KeyCode::Char(c @ '1'..='9') => {
                let count = c as usize - '0' as usize;
                if self.board.split_stack(&mut self.expanded, count) {
                    self.status = format!("Tapped {count} of {}", members.len());
                    self.back_to_board();
                } else {
                    self.status = format!("Split must be between 1 and {}", members.len().saturating_sub(1));
                }
            }
            KeyCode::Char('t') => {
                if let Some(id) = current {
                    self.board.toggle_tap(id);
                }
            }
            KeyCode::Char('a') => {
                self.board.tap_stack(&self.expanded);
            }
            KeyCode::Char('A') => {
                self.board.untap_stack(&self.expanded);
            }
            KeyCode::Char('h') => {
                self.board.tap_half_of_stack(&self.expanded);
            }
            KeyCode::Char('p') => {
                self.board.add_plus_counter_to_stack(&self.expanded);
            }
            KeyCode::Char('m') => {
                self.board.add_minus_counter_to_stack(&self.expanded);
            }
            KeyCode::Char('e') => {
                let attachments = current
                    .and_then(|id| self.board.get(id))
                    .map(|token| token.attachments.clone())
                    .unwrap_or_default();
                let changed: usize = attachments
                    .into_iter()
                    .map(|attachment| self.board.add_attachment_to_stack(&self.expanded, attachment))
                    .sum();
                self.status = format!("Shared attachments with {changed} member(s)");
            }
            KeyCode::Char('u') => {
                if let Some(id) = current {
                    self.board.duplicate_token(id);
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = current {
                    self.board.move_member_to_graveyard(&mut self.expanded, id);
                }
            }
            KeyCode::Char('D') => self.pending = Some(Pending::DestroyStack(members.len())),
            _ => {}
        }
    }

    fn graveyard_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc | KeyCode::Char('g') => self.back_to_board(),
            KeyCode::Char('r') => {
                if let Some(token) = self.board.graveyard().get(self.cursor) {
                    let id = token.id;
                    self.board.restore_from_graveyard(id);
                    self.status = "Restored to the battlefield".into();
                }
            }
            KeyCode::Char('C') => match self.board.graveyard().len() {
                0 => {}
                n => self.pending = Some(Pending::ClearGraveyard(n)),
            },
            _ => {}
        }
    }

    fn confirm(&mut self, pending: Pending) {
        match pending {
            Pending::Cleanup(_) => {
                let destroyed = self.board.cleanup();
                self.status = format!("Destroyed {} dying token(s)", destroyed.len());
            }
            Pending::ClearAll(_) => self.board.clear_all(),
            Pending::DestroyStack(_) => {
                let moved = self.board.move_stack_to_graveyard(&mut self.expanded);
                self.status = format!("Moved {moved} token(s) to the graveyard");
                self.back_to_board();
            }
            Pending::ClearGraveyard(_) => self.board.clear_graveyard(),
        }
        self.cursor = self.cursor.min(self.list_len().saturating_sub(1));
    }

    fn quick_create(&mut self, index: usize) {
        let Some(template) = self.templates().into_iter().nth(index) else {
            return;
        };
        let quantity = self.settings.quick_create_quantity() as usize;
        self.board.add_token(&template, quantity);
        self.status = format!("Added {quantity} x {}", template.name);

        // later printings of this template pick up the art once it lands
        if self.cache.cached(&template.name).is_none() {
            let cache = Arc::clone(&self.cache);
            self.runtime.spawn(async move {
                cache.get(&template.name).await;
            });
        }
    }

    fn back_to_board(&mut self) {
        self.expanded.collapse();
        self.view = View::Board;
        self.cursor = 0;
    }

    fn save(&mut self) {
        let saved = snapshot::save_board(self.store.as_ref(), &self.board)
            .and_then(|_| snapshot::save_settings(self.store.as_ref(), &self.settings));
        if let Err(e) = saved {
            error!("Failed to save board: {e}");
            self.status = format!("Could not save: {e}");
        }
    }
}
