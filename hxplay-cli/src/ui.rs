use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};

use hxplay_lib::playback::PlaybackStatus;

use crate::controls::StatusSnapshot;

pub fn draw_status(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    snapshot: &StatusSnapshot,
    status: &PlaybackStatus,
    log_lines: &[String],
) {
    let _ = terminal.draw(|f| {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(4),
                Constraint::Min(0),
            ])
            .split(f.size());

        let controls = Paragraph::new(
            "space=play/pause  s=stop  r=repeat on/off  -/= gain  q=quit",
        )
        .style(Style::default().fg(Color::Blue))
        .block(Block::default().borders(Borders::ALL).title("Controls"));
        f.render_widget(controls, rows[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(66), Constraint::Percentage(34)])
            .split(rows[1]);

        let status_widget = Paragraph::new(snapshot.text.as_str())
            .style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .block(Block::default().borders(Borders::ALL).title("Playback"));
        f.render_widget(status_widget, columns[0]);

        // The stream being played is bright, the rest dimmed.
        let queue: Vec<Line> = status
            .queued
            .iter()
            .enumerate()
            .map(|(index, id)| {
                let style = if index == status.queue_index {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                Line::from(Span::styled(id.to_string(), style))
            })
            .collect();
        let queue_widget =
            Paragraph::new(queue).block(Block::default().borders(Borders::ALL).title("Queue"));
        f.render_widget(queue_widget, columns[1]);

        let log_height = rows[2].height.saturating_sub(2) as usize;
        let start = log_lines.len().saturating_sub(log_height);
        let log_text = if log_lines.is_empty() {
            "No logs yet.".to_string()
        } else {
            log_lines[start..].join("\n")
        };

        let log_widget = Paragraph::new(log_text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Logs"));
        f.render_widget(log_widget, rows[2]);
    });
}
