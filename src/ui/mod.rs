mod correction;
mod loading;
mod quiz;

use ratatui::{prelude::*, widgets::Block};

use crate::runner::{PlayState, Screen};
use crate::session::Phase;

pub fn render(frame: &mut Frame, state: &PlayState) {
    let area = frame.area();
    frame.render_widget(Block::default().bg(Color::Reset), area);

    match &state.screen {
        Screen::Loading => loading::render_loading(frame, area),
        Screen::Blocked(message) => loading::render_blocked(frame, area, message),
        Screen::Quiz(session) => match session.phase() {
            Phase::Playing => quiz::render(frame, area, session, state),
            Phase::Submitting => loading::render_submitting(frame, area),
            Phase::Correction => correction::render(frame, area, session, state.scroll),
        },
    }
}
