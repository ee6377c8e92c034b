mod app;
mod event;
mod tui;
mod ui;

pub use app::App;
