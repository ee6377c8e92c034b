use ratatui::{
    prelude::{Alignment, Constraint, Direction, Frame, Layout, Line, Rect, Span},
    style::{Color as Shade, Modifier, Style},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use token_tracker::engine::prelude::*;

use crate::client::app::{App, View};

const HELP: &str = "\
1-9 create   +/- quantity   enter expand stack   t tap   p/m +1/-1 counter
d destroy   u duplicate   h ready   S save preset   n new turn
T/U tap/untap all   P/M counters on all   c cleanup   X clear all
g graveyard (r restore, C empty)   s auto-stack   [/] stack size   q quit
in a stack: a/A tap/untap all   h tap half   1-9 split off tapped   e share attachments   D destroy stack";

pub fn render(app: &App, f: &mut Frame) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(if app.show_help { 7 } else { 3 }),
        ])
        .split(f.size());

    render_templates(app, f, rows[0]);
    match app.view {
        View::Board => render_board(app, f, rows[1]),
        View::Stack => render_stack(app, f, rows[1]),
        View::Graveyard => render_graveyard(app, f, rows[1]),
    }
    render_footer(app, f, rows[2]);
}

fn titled(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
}

fn render_templates(app: &App, f: &mut Frame, area: Rect) {
    let spans: Vec<Span> = app
        .templates()
        .iter()
        .take(9)
        .enumerate()
        .flat_map(|(i, template)| {
            [
                Span::styled(format!("{}", i + 1), Style::default().fg(Shade::Yellow)),
                Span::raw(format!(" {}  ", template.name)),
            ]
        })
        .collect();
    let title = format!("Create x{}", app.settings.quick_create_quantity());
    f.render_widget(Paragraph::new(Line::from(spans)).block(titled(title)), area);
}

fn token_line(token: &Token, count: Option<usize>) -> Line<'static> {
    let mut spans = vec![];
    if let Some(count) = count {
        spans.push(Span::styled(
            format!("{count}x "),
            Style::default().fg(Shade::Yellow).add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(
        token.name.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    if let Some(stats) = token.current_stats() {
        let shade = match token.typed_counters.net() {
            0 => Shade::Reset,
            n if n > 0 => Shade::Green,
            _ => Shade::Red,
        };
        spans.push(Span::styled(format!(" {}/{}", stats.power, stats.toughness), Style::default().fg(shade)));
    }
    if !token.colors.is_empty() {
        spans.push(Span::raw(format!(" [{}]", colors_label(&token.colors))));
    }
    if token.typed_counters.plus_one > 0 {
        spans.push(Span::raw(format!(" +1/+1 x{}", token.typed_counters.plus_one)));
    }
    if token.typed_counters.minus_one > 0 {
        spans.push(Span::raw(format!(" -1/-1 x{}", token.typed_counters.minus_one)));
    }
    for counter in token.counters.iter() {
        spans.push(Span::raw(format!(" {} {} x{}", counter.icon, counter.kind, counter.count)));
    }
    for attachment in &token.attachments {
        spans.push(Span::styled(format!(" +{}", attachment.name), Style::default().fg(Shade::Magenta)));
    }
    if token.tapped {
        spans.push(Span::styled(" tapped", Style::default().fg(Shade::DarkGray)));
    }
    if token.summoning_sickness && !token.has_haste {
        spans.push(Span::styled(" sick", Style::default().fg(Shade::Cyan)));
    }
    if token.is_dying() {
        spans.push(Span::styled(" dying", Style::default().fg(Shade::Red).add_modifier(Modifier::BOLD)));
    }
    Line::from(spans)
}

fn render_list(app: &App, f: &mut Frame, area: Rect, title: String, items: Vec<ListItem>) {
    let mut state = ListState::default();
    if !items.is_empty() {
        state.select(Some(app.cursor));
    }
    let list = List::new(items)
        .block(titled(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut state);
}

fn render_board(app: &App, f: &mut Frame, area: Rect) {
    let groups = app.board.groups(&app.settings);
    let items = groups
        .iter()
        .map(|group| {
            let count = group.is_stack().then(|| group.count());
            ListItem::new(token_line(group.representative(), count))
        })
        .collect();
    let stacking = if app.settings.auto_stack_enabled {
        format!("stacks of {}+", app.settings.min_stack_size())
    } else {
        "stacking off".into()
    };
    let title = format!(
        "Battlefield: {} tokens ({stacking}), graveyard {}",
        app.board.battlefield().len(),
        app.board.graveyard().len()
    );
    render_list(app, f, area, title, items);
}

fn render_stack(app: &App, f: &mut Frame, area: Rect) {
    let members = app.expanded.members(&app.board);
    let name = members.first().map(|token| token.name.clone()).unwrap_or_default();
    let title = format!("Stack of {}: {}", members.len(), name);
    let items = members
        .into_iter()
        .map(|token| ListItem::new(token_line(token, None)))
        .collect();
    render_list(app, f, area, title, items);
}

fn render_graveyard(app: &App, f: &mut Frame, area: Rect) {
    let items = app
        .board
        .graveyard()
        .iter()
        .map(|token| ListItem::new(token_line(token, None)))
        .collect();
    let title = format!("Graveyard: {} tokens", app.board.graveyard().len());
    render_list(app, f, area, title, items);
}

fn render_footer(app: &App, f: &mut Frame, area: Rect) {
    let (text, shade) = match app.pending {
        Some(pending) => (pending.prompt(), Shade::Yellow),
        None if app.show_help => (HELP.to_string(), Shade::Gray),
        None => (app.status.clone(), Shade::Gray),
    };
    f.render_widget(
        Paragraph::new(text)
            .block(titled("Token Tracker".into()))
            .style(Style::default().fg(shade))
            .wrap(Wrap { trim: true }),
        area,
    );
}
