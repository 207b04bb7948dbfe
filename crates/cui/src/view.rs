use crate::app::{App, FocusPane};
use packdex_core::{Card, RarityTier, RevealPhase, WalletSession};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Color, Line, Modifier, Span, Style, Stylize};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

const SLOT_WIDTH: usize = 16;

pub fn draw(frame: &mut Frame, app: &App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(6),
            Constraint::Min(8),
            Constraint::Length(8),
        ])
        .split(frame.area());

    draw_header(frame, root[0], app);
    draw_reveal(frame, root[1], app);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(root[2]);

    draw_packs(frame, middle[0], app);
    draw_album(frame, middle[1], app);
    draw_events(frame, root[3], app);

    if app.show_help {
        draw_help_popup(frame);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let address = app.session.wallet().public_key().unwrap_or("disconnected");
    let progress = app
        .progress()
        .map(|progress| {
            format!(
                "{}/{} cards ({}%)",
                progress.total_collected, progress.catalog_size, progress.percent
            )
        })
        .unwrap_or_else(|| "-".to_string());
    let lines = vec![
        Line::from("PackDex".bold()),
        Line::from(format!(
            "Wallet: {address}  Balance: {:.4} SOL  Network: {}",
            app.balance_sol(),
            app.session.config().merchant.network
        )),
        Line::from(format!("Album: {progress}  Seed: {}", app.rng.seed())),
        Line::from(format!("Status: {}", app.status_line)),
    ];
    let block = Block::default().borders(Borders::ALL).title("Overview");
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    frame.render_widget(paragraph, area);
}

/// Range of strip indexes to draw so that `centered` sits mid-window.
pub(crate) fn strip_window(centered: usize, len: usize, slots: usize) -> (usize, usize) {
    if len == 0 || slots == 0 {
        return (0, 0);
    }
    let slots = slots.min(len);
    let start = centered
        .saturating_sub(slots / 2)
        .min(len.saturating_sub(slots));
    (start, start + slots)
}

fn slot_label(card: &Card) -> String {
    let mut name: String = card.name.chars().take(SLOT_WIDTH - 6).collect();
    name.push(' ');
    name.push_str(card.rarity.symbol());
    format!("{name:^width$}", width = SLOT_WIDTH)
}

fn rarity_color(card: &Card) -> Color {
    match card.rarity {
        RarityTier::Common => Color::Gray,
        RarityTier::Uncommon => Color::Green,
        RarityTier::Rare => Color::Blue,
        RarityTier::UltraRare => Color::Magenta,
    }
}

fn draw_reveal(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title("Reveal");
    let Some(sequence) = app.reveal_sequence() else {
        let hint = Paragraph::new("select a pack and press enter to open it").block(block);
        frame.render_widget(hint, area);
        return;
    };
    let (centered, highlighted, phase, progress) = match app.last_frame.as_ref() {
        Some(frame) => (frame.centered, frame.highlighted, frame.phase, frame.progress),
        None => (0, None, RevealPhase::Scrolling, 0.0),
    };
    let inner_width = area.width.saturating_sub(2) as usize;
    let slots = (inner_width / (SLOT_WIDTH + 1)).max(1);
    let (start, end) = strip_window(centered, sequence.len(), slots);

    let mut spans = Vec::new();
    for idx in start..end {
        let card = &sequence.cards[idx];
        let mut style = Style::default().fg(rarity_color(card));
        if idx == centered {
            style = style.add_modifier(Modifier::REVERSED);
        }
        if highlighted == Some(idx) {
            style = Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD);
        }
        spans.push(Span::styled(slot_label(card), style));
        spans.push(Span::raw(" "));
    }
    let marker_pad = centered.saturating_sub(start) * (SLOT_WIDTH + 1) + SLOT_WIDTH / 2;
    let status = match phase {
        RevealPhase::Scrolling => format!("scrolling {:>3.0}%", progress * 100.0),
        RevealPhase::Settling => "settling".to_string(),
        RevealPhase::Revealed => format!("revealed: {}", sequence.winner().name),
    };
    let lines = vec![
        Line::from(format!("{}v", " ".repeat(marker_pad))),
        Line::from(spans),
        Line::from(format!("{}^", " ".repeat(marker_pad))),
        Line::from(status),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_packs(frame: &mut Frame, area: Rect, app: &App) {
    let packs = &app.session.registry().packs;
    let items: Vec<ListItem<'_>> = if packs.is_empty() {
        vec![ListItem::new("no packs")]
    } else {
        packs
            .iter()
            .map(|pack| ListItem::new(app.pack_label(pack)))
            .collect()
    };
    let list = List::new(items)
        .block(pane_block("Packs", app.focus == FocusPane::Packs))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");
    let mut state = ListState::default();
    if !packs.is_empty() {
        state.select(Some(app.pack_cursor.min(packs.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_album(frame: &mut Frame, area: Rect, app: &App) {
    let rows = app.album_rows();
    let mut items: Vec<ListItem<'_>> = Vec::new();
    if let Some(progress) = app.progress() {
        for set in progress.sets.iter().filter(|set| set.obtained > 0) {
            items.push(ListItem::new(format!(
                "{}: {}/{} ({}%)",
                set.name, set.obtained, set.total, set.percent
            )));
        }
    }
    let header_len = items.len();
    if rows.is_empty() {
        items.push(ListItem::new("no cards yet"));
    }
    for row in &rows {
        let copies = if row.copies > 1 {
            format!(" x{}", row.copies)
        } else {
            String::new()
        };
        items.push(ListItem::new(format!("{}{copies}", row.label)));
    }
    let list = List::new(items)
        .block(pane_block("Album", app.focus == FocusPane::Album))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if app.focus == FocusPane::Album && !rows.is_empty() {
        state.select(Some(header_len + app.album_cursor.min(rows.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_events(frame: &mut Frame, area: Rect, app: &App) {
    let capacity = area.height.saturating_sub(2) as usize;
    let start = app.event_log.len().saturating_sub(capacity);
    let lines: Vec<Line<'_>> = app
        .event_log
        .iter()
        .skip(start)
        .map(|line| Line::from(line.clone()))
        .collect();
    let block = pane_block("Events", app.focus == FocusPane::Events);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_help_popup(frame: &mut Frame) {
    let area = centered_rect(60, 50, frame.area());
    frame.render_widget(Clear, area);
    let lines = vec![
        Line::from("q quit | ? help | tab focus | arrows/jk move"),
        Line::from("enter/o/space buy and open the selected pack"),
        Line::from("esc/x cancel the running reveal (the card is forfeited)"),
        Line::from("y sync album from opening history"),
        Line::from("r decline the next wallet transaction"),
        Line::from("w connect or disconnect the wallet"),
    ];
    let block = Block::default()
        .title("Help")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let mut block = Block::default().title(title).borders(Borders::ALL);
    if focused {
        block = block.border_style(Style::default().fg(Color::Yellow));
    }
    block
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
