//! Alert list panel and the acknowledge modal.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use vigil_feed::AlertRow;

/// Selection state for the alert list.
#[derive(Debug, Default)]
pub struct AlertSelection {
    selected: usize,
}

impl AlertSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected index, clamped to the row count.
    pub fn index(&self, row_count: usize) -> Option<usize> {
        if row_count == 0 {
            None
        } else {
            Some(self.selected.min(row_count - 1))
        }
    }

    /// Fingerprint of the selected row, if any.
    pub fn selected_fingerprint<'a>(&self, rows: &'a [AlertRow]) -> Option<&'a str> {
        self.index(rows.len())
            .map(|i| rows[i].fingerprint.as_str())
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self, row_count: usize) {
        if row_count > 0 && self.selected < row_count - 1 {
            self.selected += 1;
        }
    }

    /// Keep the selection in range after the row set changed.
    pub fn clamp(&mut self, row_count: usize) {
        if row_count == 0 {
            self.selected = 0;
        } else if self.selected >= row_count {
            self.selected = row_count - 1;
        }
    }
}

/// Render the alert list with the current selection highlighted.
pub fn render_alert_panel(
    frame: &mut Frame,
    area: Rect,
    rows: &[AlertRow],
    count: u64,
    selection: &AlertSelection,
) {
    let title = format!(" Unacknowledged Alerts ({count}) ");

    let items: Vec<ListItem> = if rows.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No unacknowledged alerts",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        rows.iter()
            .map(|row| {
                let text = if row.text.is_empty() {
                    row.fingerprint.clone()
                } else {
                    row.text.clone()
                };
                ListItem::new(Line::from(text))
            })
            .collect()
    };

    let mut state = ListState::default();
    state.select(selection.index(rows.len()));

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut state);
}

/// State of the acknowledge modal while it is open.
#[derive(Debug, Clone)]
pub struct AckModal {
    pub fingerprint: String,
    pub comment: String,
    pub error: Option<String>,
    pub submitting: bool,
}

impl AckModal {
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            comment: String::new(),
            error: None,
            submitting: false,
        }
    }
}

/// Render the acknowledge modal centered over the alert panel.
pub fn render_ack_modal(frame: &mut Frame, area: Rect, modal: &AckModal) {
    let popup = centered_rect(60, 7, area);
    frame.render_widget(Clear, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .margin(1)
        .split(popup);

    let title = format!(" Acknowledge {} ", modal.fingerprint);
    frame.render_widget(
        Block::default().borders(Borders::ALL).title(title),
        popup,
    );

    let prompt = if modal.submitting {
        Line::from(Span::styled(
            "Submitting...",
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(vec![
            Span::raw("Comment: "),
            Span::styled(
                modal.comment.as_str(),
                Style::default().add_modifier(Modifier::UNDERLINED),
            ),
            Span::styled("_", Style::default().fg(Color::DarkGray)),
        ])
    };
    frame.render_widget(Paragraph::new(prompt), chunks[0]);

    if let Some(err) = &modal.error {
        frame.render_widget(
            Paragraph::new(err.as_str())
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true }),
            chunks[1],
        );
    }

    frame.render_widget(
        Paragraph::new("Enter to submit, Esc to cancel")
            .style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(height),
            Constraint::Min(1),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<AlertRow> {
        (0..n)
            .map(|i| AlertRow {
                fingerprint: format!("fp-{i}"),
                text: format!("alert {i}"),
            })
            .collect()
    }

    #[test]
    fn test_selection_navigation() {
        let mut sel = AlertSelection::new();
        let rows = rows(3);

        assert_eq!(sel.selected_fingerprint(&rows), Some("fp-0"));
        sel.move_down(rows.len());
        sel.move_down(rows.len());
        assert_eq!(sel.selected_fingerprint(&rows), Some("fp-2"));

        // Clamped at the end
        sel.move_down(rows.len());
        assert_eq!(sel.selected_fingerprint(&rows), Some("fp-2"));

        sel.move_up();
        assert_eq!(sel.selected_fingerprint(&rows), Some("fp-1"));
    }

    #[test]
    fn test_selection_clamps_after_shrink() {
        let mut sel = AlertSelection::new();
        sel.move_down(5);
        sel.move_down(5);
        sel.move_down(5);
        sel.move_down(5);

        sel.clamp(2);
        assert_eq!(sel.index(2), Some(1));

        sel.clamp(0);
        assert_eq!(sel.index(0), None);
    }

    #[test]
    fn test_empty_list_has_no_selection() {
        let sel = AlertSelection::new();
        assert_eq!(sel.selected_fingerprint(&[]), None);
    }
}
