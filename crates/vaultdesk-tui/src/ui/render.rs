use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use vaultdesk_core::session::{Notice, SessionState, View};

use crate::app::{App, LoginFocus};

use super::styles;

/// Width of the text inside the login form fields
const FIELD_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(5),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);

    match app.view() {
        View::Login => render_login_form(frame, app, chunks[1]),
        View::Vaults => render_vault_list(frame, app, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  vaultdesk";
    let server = format!("{}  ", app.config.api_base_url);

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize)
                .saturating_sub(title.len())
                .saturating_sub(server.len()),
        )),
        Span::styled(server, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

/// Style for the status notice, red for failures
fn notice_style(notice: &Notice) -> Style {
    if notice.is_error() {
        styles::error_style()
    } else if notice.is_progress() {
        styles::highlight_style()
    } else {
        styles::muted_style()
    }
}

fn field_line<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { " " };

    // Keep the tail visible once the text outgrows the field
    let shown: String = {
        let count = value.chars().count();
        value.chars().skip(count.saturating_sub(FIELD_WIDTH)).collect()
    };

    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{:<10}[", label), styles::muted_style()),
        Span::styled(format!("{:<width$}{}", shown, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn render_login_form(frame: &mut Frame, app: &App, area: Rect) {
    let status = app.session().status();
    let height = if status.is_some() { 12 } else { 10 };
    let form_area = centered_rect_fixed(46, height, area);

    frame.render_widget(Clear, form_area);

    let mut lines = vec![
        Line::from(Span::styled("  Log in", styles::title_style())),
        Line::from(""),
        field_line(
            "Email:",
            app.login_identifier.clone(),
            app.login_focus == LoginFocus::Identifier,
        ),
        field_line(
            "Password:",
            "*".repeat(app.login_secret.chars().count()),
            app.login_focus == LoginFocus::Secret,
        ),
        Line::from(""),
    ];

    let button_focused = app.login_focus == LoginFocus::Button;
    let button_label = if button_focused { " ▶ Log in ◀ " } else { "   Log in   " };
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    lines.push(Line::from(vec![
        Span::raw("              ["),
        Span::styled(button_label, button_style),
        Span::raw("]"),
    ]));

    if let Some(notice) = status {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", notice), notice_style(notice))));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style());

    frame.render_widget(Paragraph::new(lines).block(block), form_area);
}

fn render_vault_list(frame: &mut Frame, app: &App, area: Rect) {
    let vaults = app.session().vaults();

    let block = Block::default()
        .title(Span::styled(" Your vaults ", styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style());

    if vaults.is_empty() {
        let text = empty_list_text(app.is_busy(), app.session());
        let paragraph = Paragraph::new(Line::from(Span::styled(text, styles::muted_style()))).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = vaults
        .iter()
        .map(|vault| {
            let mut lines = vec![Line::from(Span::styled(
                vault.name.clone(),
                styles::list_item_style().add_modifier(Modifier::BOLD),
            ))];
            if !vault.description_display().is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("  {}", vault.description_display()),
                    styles::muted_style(),
                )));
            }
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(styles::selected_style())
        .highlight_symbol("▶ ");

    let mut list_state = ListState::default();
    list_state.select(Some(app.vault_selection));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.view() {
        View::Login => "[tab] next field | [enter] log in | [esc] quit",
        View::Vaults => "[r]efresh | [l]ogout | [q]uit",
    };

    let (left_text, left_style) = match app.session().status() {
        Some(notice) => (format!(" {} ", notice), notice_style(notice)),
        None if !app.store_in_sync() => (
            " Session could not be saved; you may need to log in again next time ".to_string(),
            styles::error_style(),
        ),
        None => {
            let count = app.session().vaults().len();
            (format!(" {} vault(s) ", count), styles::muted_style())
        }
    };

    let right_text = format!(" {} ", shortcuts);
    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(status_line).style(styles::status_bar_style()), area);
}

/// Create a centered rectangle with fixed dimensions
/// Placeholder for an empty vault list
fn empty_list_text(busy: bool, session: &SessionState) -> &'static str {
    if busy {
        "  Loading..."
    } else if session.listing_failed() {
        "  Your vaults could not be loaded. Press r to retry."
    } else {
        "  You don't have any vaults yet."
    }
}

fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
