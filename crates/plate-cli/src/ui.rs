//! UI rendering with ratatui.
//!
//! Two columns: the service list on the left, details of the selected service
//! on the right, and a one-line help bar at the bottom.

use plate_control::{RecordView, StatusTone};
use plate_gateway::CommandGateway;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::App;

/// Colors used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Titles and focused borders.
    pub brand: Color,
    /// Running services.
    pub healthy: Color,
    /// Services waiting on an operation.
    pub busy: Color,
    /// Stopped services.
    pub stopped: Color,
    /// Failed services and destructive prompts.
    pub failed: Color,
    /// Confirmation prompts.
    pub prompt: Color,
    /// Secondary text.
    pub muted: Color,
    /// Background of the selected row.
    pub highlight: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            brand: Color::Rgb(0xff, 0x4f, 0x00),
            healthy: Color::Green,
            busy: Color::Yellow,
            stopped: Color::Gray,
            failed: Color::Red,
            prompt: Color::Magenta,
            muted: Color::DarkGray,
            highlight: Color::Rgb(0x3a, 0x3a, 0x3a),
        }
    }
}

impl Theme {
    /// Style for a status tone.
    #[must_use]
    pub fn tone(&self, tone: StatusTone) -> Style {
        let color = match tone {
            StatusTone::Idle => self.muted,
            StatusTone::Busy => self.busy,
            StatusTone::Healthy => self.healthy,
            StatusTone::Stopped => self.stopped,
            StatusTone::Failed => self.failed,
            StatusTone::Prompt => self.prompt,
        };
        Style::default().fg(color)
    }
}

/// Render the UI.
pub fn render<G: CommandGateway + 'static>(frame: &mut Frame, app: &App<G>, theme: &Theme) {
    let area = frame.area();

    if app.is_quitting() || app.is_finished() {
        render_quitting(frame, app, theme, area);
        return;
    }

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Main content
            Constraint::Length(1), // Help bar
        ])
        .split(area);

    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(main_layout[0]);

    let views = app.views();
    render_service_list(frame, app, &views, theme, content_layout[0]);
    render_details(frame, app, &views, theme, content_layout[1]);
    render_help_bar(frame, app, theme, main_layout[1]);

    if let Some(view) = views.get(app.selected) {
        if view.tone == StatusTone::Prompt {
            render_confirm_dialog(frame, view, theme, area);
        }
    }
}

/// Render the service list.
fn render_service_list<G: CommandGateway + 'static>(
    frame: &mut Frame,
    app: &App<G>,
    views: &[RecordView],
    theme: &Theme,
    area: Rect,
) {
    let block = Block::default()
        .title(Span::styled(
            " Plate Dev Environment ",
            Style::default().fg(theme.brand).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.brand));

    if views.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            format!("No services in {}", app.config_path),
            Style::default().fg(theme.muted),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = views
        .iter()
        .map(|view| {
            let mut status = vec![Span::raw("  ")];
            if view.busy {
                status.push(Span::styled(
                    format!("{} ", app.spinner_char()),
                    theme.tone(StatusTone::Busy),
                ));
            }
            status.push(Span::styled(view.status.clone(), theme.tone(view.tone)));

            ListItem::new(Text::from(vec![
                Line::from(Span::styled(view.title.clone(), Style::default().bold())),
                Line::from(status),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(theme.highlight))
        .highlight_symbol("▌ ");

    let mut state = ListState::default();
    state.select(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Render the detail pane for the selected service.
fn render_details<G: CommandGateway + 'static>(
    frame: &mut Frame,
    app: &App<G>,
    views: &[RecordView],
    theme: &Theme,
    area: Rect,
) {
    let block = Block::default()
        .title(" Details ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.muted));

    let Some(view) = views.get(app.selected) else {
        frame.render_widget(block, area);
        return;
    };

    let label_width = view
        .details
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0);

    let mut lines = vec![
        Line::from(Span::styled(
            view.title.clone(),
            Style::default().fg(theme.brand).bold(),
        )),
        Line::from(""),
    ];
    for (label, value) in &view.details {
        let value_style = match *label {
            "Status" => theme.tone(view.state_tone),
            "Details" => theme.tone(StatusTone::Failed),
            _ => Style::default(),
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{label:<label_width$}  "),
                Style::default().fg(theme.muted),
            ),
            Span::styled(value.clone(), value_style),
        ]));
    }

    if app.show_copied() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Copied!",
            Style::default().fg(theme.healthy).bold(),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Render the key help bar.
fn render_help_bar<G: CommandGateway + 'static>(
    frame: &mut Frame,
    app: &App<G>,
    theme: &Theme,
    area: Rect,
) {
    let key = Style::default().fg(theme.brand);
    let mut spans = vec![
        Span::raw(" "),
        Span::styled("↑/↓", key),
        Span::raw(": navigate • "),
        Span::styled("q", key),
        Span::raw(": quit • "),
        Span::styled("s", key),
        Span::raw(": stop • "),
        Span::styled("b", key),
        Span::raw(": boot • "),
        Span::styled("r", key),
        Span::raw(": reset • "),
        Span::styled("d", key),
        Span::raw(": delete • "),
        Span::styled("c", key),
        Span::raw(": copy"),
    ];
    if app.show_copied() {
        spans.push(Span::styled("  Copied!", Style::default().fg(theme.healthy)));
    }

    let help = Paragraph::new(Line::from(spans)).style(Style::default().fg(theme.muted));
    frame.render_widget(help, area);
}

/// Render the y/n dialog for a pending destructive action.
fn render_confirm_dialog(frame: &mut Frame, view: &RecordView, theme: &Theme, area: Rect) {
    let dialog_area = centered_rect(50, 25, area);

    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .title(format!(" {} ", view.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.failed));

    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let text = Text::from(vec![
        Line::from(Span::styled(view.status.clone(), theme.tone(StatusTone::Prompt).bold())),
        Line::from(""),
        Line::from("Are you sure? This action cannot be undone."),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y]", Style::default().fg(theme.failed).bold()),
            Span::raw(" Yes  "),
            Span::styled("[n]", Style::default().fg(theme.healthy).bold()),
            Span::raw(" No"),
        ]),
    ]);

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

/// Render the screen shown while containers are being stopped.
fn render_quitting<G: CommandGateway + 'static>(
    frame: &mut Frame,
    app: &App<G>,
    theme: &Theme,
    area: Rect,
) {
    let dialog_area = centered_rect(60, 20, area);
    let text = Text::from(vec![Line::from(vec![
        Span::styled(format!("{} ", app.spinner_char()), theme.tone(StatusTone::Busy)),
        Span::styled(
            "Stopping containers... Please wait.",
            Style::default().fg(theme.brand).bold(),
        ),
    ])]);

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text).alignment(Alignment::Center),
        dialog_area,
    );
}

/// Helper to create a centered rect.
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
