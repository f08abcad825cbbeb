use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub fn render_loading(frame: &mut Frame, area: Rect) {
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "QUIZ AGE OF EMPIRES II",
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::from(""),
        Line::from("Chargement...".fg(Color::DarkGray)),
        Line::from(""),
        Line::from("q pour quitter".fg(Color::DarkGray)),
    ];
    render_centered(frame, area, content, Color::DarkGray);
}

pub fn render_blocked(frame: &mut Frame, area: Rect, message: &str) {
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Erreur lors de la récupération des questions.",
            Style::default().fg(Color::Red).bold(),
        )),
        Line::from(""),
        Line::from(message.fg(Color::Gray)),
        Line::from(""),
        Line::from("q pour quitter".fg(Color::DarkGray)),
    ];
    render_centered(frame, area, content, Color::Red);
}

pub fn render_submitting(frame: &mut Frame, area: Rect) {
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Envoi des réponses...",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
    ];
    render_centered(frame, area, content, Color::DarkGray);
}

fn render_centered(frame: &mut Frame, area: Rect, content: Vec<Line>, border: Color) {
    let height = content.len() as u16 + 2;
    let rows = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .split(area);
    let columns = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Max(70),
        Constraint::Fill(1),
    ])
    .split(rows[1]);

    let widget = Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).border_style(border));

    frame.render_widget(widget, columns[1]);
}
