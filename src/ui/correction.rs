use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};

use crate::scoring::{OptionMark, QuestionOutcome, ScoreReport};
use crate::session::{QuizSession, SubmissionOutcome};

pub fn render(frame: &mut Frame, area: Rect, session: &QuizSession, scroll: usize) {
    let report = session.report();
    let grade_color = get_grade_color(report.percentage());

    let chunks = Layout::vertical([
        Constraint::Length(5),
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .margin(1)
    .split(area);

    render_score_summary(frame, chunks[0], &report, grade_color);
    render_question_breakdown(frame, chunks[1], &report, scroll);
    render_submission_status(frame, chunks[2], session.submission_outcome());
    render_controls(frame, chunks[3]);
}

fn get_grade_color(percentage: f64) -> Color {
    match percentage as u32 {
        90..=100 => Color::Green,
        70..=89 => Color::Cyan,
        50..=69 => Color::Yellow,
        _ => Color::Red,
    }
}

fn render_score_summary(frame: &mut Frame, area: Rect, report: &ScoreReport, grade_color: Color) {
    let content = vec![
        Line::from(Span::styled(
            "CORRECTION",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Score : {} / {}", report.score, report.total),
            Style::default().fg(grade_color).bold(),
        )),
        Line::from(Span::styled(
            format!("Points : {}", report.points),
            Style::default().fg(Color::Green).bold(),
        )),
    ];

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, area);
}

fn render_question_breakdown(frame: &mut Frame, area: Rect, report: &ScoreReport, scroll: usize) {
    // Scroll is counted in questions; convert it to lines.
    let mut offset = 0usize;
    let mut lines: Vec<Line> = Vec::new();

    for (index, outcome) in report.outcomes.iter().enumerate() {
        if index == scroll {
            offset = lines.len();
        }
        lines.extend(question_lines(index, outcome));
        lines.push(Line::from(""));
    }

    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().padding(Padding::horizontal(1)))
        .scroll((offset.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(widget, area);
}

fn question_lines(index: usize, outcome: &QuestionOutcome) -> Vec<Line<'_>> {
    let (symbol, color) = if outcome.correct {
        ("+", Color::Green)
    } else {
        ("-", Color::Red)
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{} ", symbol), Style::default().fg(color)),
            Span::styled(format!("{}. ", index + 1), Style::default().fg(Color::DarkGray)),
            Span::styled(outcome.text.as_str(), Style::default().fg(Color::White).bold()),
        ]),
        Line::from(vec![
            Span::styled("  Points obtenus : ", Style::default().fg(Color::DarkGray)),
            Span::styled(outcome.points.to_string(), Style::default().fg(Color::Green).bold()),
            Span::styled("  |  Temps de réponse : ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{}s", outcome.elapsed_seconds),
                Style::default().fg(Color::Blue).bold(),
            ),
        ]),
    ];

    for option in &outcome.options {
        let (style, note) = match option.mark {
            OptionMark::Found => (
                Style::default().fg(Color::Green),
                " ✓ Bonne réponse (Votre choix)",
            ),
            OptionMark::Missed => (
                Style::default().fg(Color::Gray).bold(),
                " ✓ Bonne réponse (Non sélectionné)",
            ),
            OptionMark::Wrong => (Style::default().fg(Color::Red), " (Votre choix)"),
            OptionMark::Neutral => (Style::default().fg(Color::DarkGray), ""),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("    {}", option.text), style),
            Span::styled(note, style),
        ]));
    }

    lines
}

fn render_submission_status(frame: &mut Frame, area: Rect, outcome: Option<&SubmissionOutcome>) {
    let (text, color) = match outcome {
        Some(SubmissionOutcome::Submitted) => ("Réponses enregistrées".to_string(), Color::Green),
        Some(SubmissionOutcome::Skipped) => (
            "Non connecté : réponses non enregistrées".to_string(),
            Color::Yellow,
        ),
        Some(SubmissionOutcome::Failed(reason)) => {
            (format!("Échec de l'envoi des réponses : {}", reason), Color::Red)
        }
        None => (String::new(), Color::DarkGray),
    };
    let widget = Paragraph::new(text).alignment(Alignment::Center).fg(color);
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("j/k défiler  ·  q quitter")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
