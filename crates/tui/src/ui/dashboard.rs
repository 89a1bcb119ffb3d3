use crate::app::view::{MonitorView, Panel, Tone};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use xray_core::TxStatus;

/// Fits the header, eight rows and the borders
const PANEL_HEIGHT: u16 = 10;
const PANEL_WIDTH: u16 = 60;

pub struct Dashboard;

impl Dashboard {
    pub fn render(frame: &mut Frame, area: Rect, views: &[MonitorView]) {
        let per_row = panels_per_row(area.width);

        let mut constraints = Vec::new();
        for view in views {
            constraints.push(Constraint::Length(1));
            let rows = view.panels.len().div_ceil(per_row);
            constraints.extend(std::iter::repeat_n(Constraint::Length(PANEL_HEIGHT), rows));
        }
        constraints.push(Constraint::Min(0));
        constraints.push(Constraint::Length(1));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let mut next = 0;
        for view in views {
            Self::render_header(frame, chunks[next], view);
            next += 1;
            for row in view.panels.chunks(per_row) {
                Self::render_row(frame, chunks[next], row);
                next += 1;
            }
        }

        let status = Paragraph::new(Line::from(vec![
            Span::styled("q/Esc", Style::default().fg(Color::Yellow)),
            Span::raw(": quit"),
        ]));
        frame.render_widget(status, chunks[chunks.len() - 1]);
    }

    fn render_header(frame: &mut Frame, area: Rect, view: &MonitorView) {
        let mut spans = vec![Span::styled(
            view.name.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )];
        if let Some(error) = &view.error {
            spans.push(Span::styled(
                format!("  ● {error}"),
                Style::default().fg(Color::Red),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_row(frame: &mut Frame, area: Rect, panels: &[Panel]) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(
                panels
                    .iter()
                    .map(|_| Constraint::Length(PANEL_WIDTH))
                    .chain(std::iter::once(Constraint::Min(0))),
            )
            .split(area);

        for (panel, column) in panels.iter().zip(columns.iter()) {
            let lines: Vec<Line<'_>> = panel
                .rows
                .iter()
                .map(|row| Line::from(Span::styled(row.text.as_str(), tone_style(row.tone))))
                .collect();
            let widget = Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(panel.title.as_str()),
            );
            frame.render_widget(widget, *column);
        }
    }
}

/// Full-width boxes that fit side by side; at least one even on narrow terminals
pub fn panels_per_row(width: u16) -> usize {
    usize::from(width / PANEL_WIDTH).max(1)
}

pub fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Pending => Style::default().fg(Color::Indexed(33)),
        Tone::Resolved(TxStatus::Success) => Style::default().fg(Color::Indexed(42)),
        Tone::Resolved(TxStatus::Failed) => Style::default().fg(Color::Indexed(196)),
        Tone::Resolved(TxStatus::Evicted) => Style::default().fg(Color::Indexed(208)),
        Tone::Resolved(TxStatus::Unknown) => Style::default()
            .fg(Color::Indexed(240))
            .add_modifier(Modifier::DIM),
    }
}
