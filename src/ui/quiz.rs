use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, Padding, Paragraph, Wrap},
};

use crate::models::{QuestionKind, QuizQuestion, SelectionMode};
use crate::runner::{MediaView, PlayState};
use crate::session::QuizSession;

const WARNING_SECONDS: u32 = 5;

pub fn render(frame: &mut Frame, area: Rect, session: &QuizSession, state: &PlayState) {
    let Some(question) = session.current_question() else {
        return;
    };
    let has_media = state.media.is_some();
    let chunks = create_layout(area, has_media);

    render_progress(frame, chunks[0], session, state.player.as_deref());
    render_countdown(frame, chunks[1], session);
    render_question_text(frame, chunks[2], &question.text);

    let options_chunk = match &state.media {
        Some(media) => {
            render_media(frame, chunks[3], media);
            chunks[4]
        }
        None => chunks[3],
    };

    let selected = session.current_selection();
    render_options(
        frame,
        options_chunk,
        question,
        |id| selected.is_some_and(|set| set.contains(&id)),
        state.cursor,
    );

    let controls_chunk = if has_media { chunks[5] } else { chunks[4] };
    render_controls(frame, controls_chunk, session.is_last_question());
}

fn create_layout(area: Rect, has_media: bool) -> std::rc::Rc<[Rect]> {
    if has_media {
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .margin(1)
        .split(area)
    } else {
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .margin(2)
        .split(area)
    }
}

fn render_progress(frame: &mut Frame, area: Rect, session: &QuizSession, player: Option<&str>) {
    let halves = Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).split(area);

    let who = player.unwrap_or("invité");
    frame.render_widget(Paragraph::new(who).fg(Color::DarkGray), halves[0]);

    let progress = format!(
        "Question {} / {}",
        session.current_question_number(),
        session.total_questions()
    );
    let widget = Paragraph::new(progress)
        .alignment(Alignment::Right)
        .fg(Color::DarkGray);
    frame.render_widget(widget, halves[1]);
}

fn render_countdown(frame: &mut Frame, area: Rect, session: &QuizSession) {
    let remaining = session.seconds_remaining();
    let total = session.timing().seconds_per_question.max(1);
    let color = if remaining <= WARNING_SECONDS {
        Color::Red
    } else {
        Color::Blue
    };

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color))
        .ratio(f64::from(remaining.min(total)) / f64::from(total))
        .label(format!("Temps restant : {}s", remaining));
    frame.render_widget(gauge, area);
}

fn render_question_text(frame: &mut Frame, area: Rect, text: &str) {
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .fg(Color::White)
        .bold();
    frame.render_widget(widget, area);
}

fn render_media(frame: &mut Frame, area: Rect, media: &MediaView) {
    let (title, hint) = match media.kind {
        QuestionKind::Sound => ("Son", "ouvrez le fichier pour l'écouter"),
        _ => ("Image", "ouvrez le lien pour l'afficher"),
    };

    let location = match &media.local {
        Some(path) => path.display().to_string(),
        None => media.url.clone(),
    };

    let lines = vec![
        Line::from(Span::styled(location, Style::default().fg(Color::Yellow))),
        Line::from(hint.fg(Color::DarkGray)),
    ];

    let widget = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Color::DarkGray)
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(widget, area);
}

fn render_options<F>(frame: &mut Frame, area: Rect, question: &QuizQuestion, is_selected: F, cursor: usize)
where
    F: Fn(i64) -> bool,
{
    if question.options.is_empty() {
        let widget = Paragraph::new("Aucune réponse proposée").fg(Color::DarkGray);
        frame.render_widget(widget, area);
        return;
    }

    let (on, off) = match question.kind.selection_mode() {
        SelectionMode::Multi => ("[x]", "[ ]"),
        SelectionMode::Single => ("(•)", "( )"),
    };

    let mut lines: Vec<Line> = Vec::with_capacity(question.options.len() * 2);
    for (index, (option, id)) in question.options.iter().zip(&question.option_ids).enumerate() {
        let selected = is_selected(*id);
        let focused = index == cursor;
        let style = match (selected, focused) {
            (true, _) => Style::default().fg(Color::Yellow).bold(),
            (false, true) => Style::default().fg(Color::Cyan).bold(),
            (false, false) => Style::default().fg(Color::Gray),
        };
        let marker = if focused { ">" } else { " " };

        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", marker), style),
            Span::styled(format!("{} ", if selected { on } else { off }), style),
            Span::styled(format!("{}. ", index + 1), style),
            Span::styled(option.as_str(), style),
        ]));
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_controls(frame: &mut Frame, area: Rect, last: bool) {
    let next = if last { "voir la correction" } else { "question suivante" };
    let text = format!("j/k naviguer  ·  espace choisir  ·  entrée {}  ·  q quitter", next);
    let widget = Paragraph::new(text)
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
