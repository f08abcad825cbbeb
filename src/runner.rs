//! Interactive quiz runner.
//!
//! Owns one [`QuizSession`] for one play-through. Background tasks (the
//! countdown ticker, the question fetch, the answer submission and media
//! downloads) report back over a channel; the UI loop drains it between
//! frames, so every state change happens on a single task.

use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::api::{media_file_name, AnswerSubmission, ApiClient};
use crate::auth::UserContext;
use crate::config::{QuizConfig, Timing};
use crate::data::normalize_questions;
use crate::models::{QuestionKind, QuizFilter, QuizQuestion};
use crate::scoring::ScoreReport;
use crate::session::{Advance, Phase, QuizSession, SubmissionOutcome, TickOutcome};
use crate::terminal;
use crate::ui;
use crate::QuizError;

const INPUT_POLL: Duration = Duration::from_millis(50);
const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Where the question set comes from.
#[derive(Debug, Clone)]
pub enum QuestionSource {
    Local(Vec<QuizQuestion>),
    Generated(QuizFilter),
    /// The backend's default set, used when no filter was chosen.
    Default,
}

#[derive(Debug)]
enum RunnerEvent {
    Loaded(Result<Vec<QuizQuestion>, String>),
    Tick { generation: u64 },
    Submitted(SubmissionOutcome),
    MediaReady { generation: u64, path: PathBuf },
}

pub(crate) enum Screen {
    Loading,
    /// The question set could not be fetched.
    Blocked(String),
    Quiz(QuizSession),
}

pub(crate) struct MediaView {
    pub kind: QuestionKind,
    pub url: String,
    /// Local copy of an audio file, once downloaded.
    pub local: Option<PathBuf>,
    generation: u64,
}

/// Everything the UI needs to draw a frame.
pub(crate) struct PlayState {
    pub screen: Screen,
    /// Highlighted option on the current question.
    pub cursor: usize,
    pub scroll: usize,
    pub media: Option<MediaView>,
    pub player: Option<String>,
}

struct Ticker {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct Runner {
    api: ApiClient,
    context: UserContext,
    timing: Timing,
    media_dir: PathBuf,
    events_tx: mpsc::UnboundedSender<RunnerEvent>,
    events_rx: mpsc::UnboundedReceiver<RunnerEvent>,
    ticker: Option<Ticker>,
    rendered_generation: u64,
    state: PlayState,
}

impl Runner {
    pub fn new(config: &QuizConfig, context: UserContext) -> Result<Self, QuizError> {
        config.validate()?;
        let api = ApiClient::new(&config.backend_url)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let player = context.user().map(|user| user.display_name().to_string());

        Ok(Self {
            api,
            context,
            timing: config.timing,
            media_dir: std::env::temp_dir().join("aoe-quiz"),
            events_tx,
            events_rx,
            ticker: None,
            rendered_generation: 0,
            state: PlayState {
                screen: Screen::Loading,
                cursor: 0,
                scroll: 0,
                media: None,
                player,
            },
        })
    }

    /// Play a local question set.
    pub async fn play(self, questions: Vec<QuizQuestion>) -> Result<Option<ScoreReport>, QuizError> {
        self.run(QuestionSource::Local(questions)).await
    }

    /// Take over the terminal and run one play-through.
    ///
    /// Returns the final report if the correction phase was reached.
    pub async fn run(mut self, source: QuestionSource) -> Result<Option<ScoreReport>, QuizError> {
        self.load(source);

        let mut term = terminal::init()?;
        let result = self.event_loop(&mut term).await;
        self.teardown();
        terminal::restore()?;
        result?;

        Ok(self.report())
    }

    async fn event_loop(&mut self, term: &mut terminal::AppTerminal) -> Result<(), QuizError> {
        loop {
            while let Ok(event) = self.events_rx.try_recv() {
                self.handle_event(event);
            }

            term.draw(|frame| ui::render(frame, &self.state))?;
            self.mark_rendered();

            if event::poll(INPUT_POLL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    fn load(&mut self, source: QuestionSource) {
        let filter = match source {
            QuestionSource::Local(questions) => {
                self.begin(questions);
                return;
            }
            QuestionSource::Generated(filter) => Some(filter),
            QuestionSource::Default => None,
        };

        self.state.screen = Screen::Loading;
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let fetched = match &filter {
                Some(filter) => api.generate_quiz(filter).await,
                None => api.fetch_default_quiz().await,
            };
            let result = fetched
                .map(|raw| normalize_questions(&raw))
                .map_err(|e| {
                    error!(error = %e, "failed to fetch questions");
                    e.to_string()
                });
            let _ = tx.send(RunnerEvent::Loaded(result));
        });
    }

    fn begin(&mut self, questions: Vec<QuizQuestion>) {
        match QuizSession::start(questions, self.timing) {
            Some(session) => {
                self.state.screen = Screen::Quiz(session);
                self.state.cursor = 0;
                self.state.scroll = 0;
                self.on_question_changed();
            }
            None => {
                warn!("question set is empty");
                self.state.screen = Screen::Loading;
            }
        }
    }

    fn session(&self) -> Option<&QuizSession> {
        match &self.state.screen {
            Screen::Quiz(session) => Some(session),
            _ => None,
        }
    }

    fn session_mut(&mut self) -> Option<&mut QuizSession> {
        match &mut self.state.screen {
            Screen::Quiz(session) => Some(session),
            _ => None,
        }
    }

    fn report(&self) -> Option<ScoreReport> {
        self.session()
            .filter(|session| session.phase() == Phase::Correction)
            .map(QuizSession::report)
    }

    /// Remember which countdown the player was looking at.
    fn mark_rendered(&mut self) {
        if let Some(generation) = self.session().map(QuizSession::generation) {
            self.rendered_generation = generation;
        }
    }

    fn handle_event(&mut self, event: RunnerEvent) {
        match event {
            RunnerEvent::Loaded(Ok(questions)) => {
                if matches!(self.state.screen, Screen::Loading) {
                    self.begin(questions);
                }
            }
            RunnerEvent::Loaded(Err(message)) => {
                self.state.screen = Screen::Blocked(message);
            }
            RunnerEvent::Tick { generation } => {
                let outcome = match self.session_mut() {
                    Some(session) => session.tick(generation),
                    None => return,
                };
                if outcome == TickOutcome::Expired {
                    let advance = self
                        .session_mut()
                        .map(|session| session.advance_for(generation))
                        .unwrap_or(Advance::Ignored);
                    self.apply_advance(advance);
                }
            }
            RunnerEvent::Submitted(outcome) => {
                if let Some(session) = self.session_mut() {
                    session.finish_submission(outcome);
                }
            }
            RunnerEvent::MediaReady { generation, path } => {
                if let Some(media) = &mut self.state.media {
                    if media.generation == generation {
                        media.local = Some(path);
                    }
                }
            }
        }
    }

    /// Returns true if the runner should exit.
    fn handle_key(&mut self, key: KeyCode) -> bool {
        if matches!(key, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc) {
            return true;
        }

        let phase = self.session().map(QuizSession::phase);
        match phase {
            Some(Phase::Playing) => self.handle_quiz_key(key),
            Some(Phase::Correction) => match key {
                KeyCode::Down | KeyCode::Char('j') => {
                    let max_scroll = self
                        .session()
                        .map(|session| session.total_questions().saturating_sub(1))
                        .unwrap_or(0);
                    self.state.scroll = (self.state.scroll + 1).min(max_scroll);
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.state.scroll = self.state.scroll.saturating_sub(1);
                }
                KeyCode::Enter => return true,
                _ => {}
            },
            Some(Phase::Submitting) | None => {}
        }

        false
    }

    fn handle_quiz_key(&mut self, key: KeyCode) {
        let option_count = self
            .session()
            .and_then(QuizSession::current_question)
            .map(QuizQuestion::option_count)
            .unwrap_or(0);

        match key {
            KeyCode::Up | KeyCode::Char('k') if option_count > 0 => {
                self.state.cursor = (self.state.cursor + option_count - 1) % option_count;
            }
            KeyCode::Down | KeyCode::Char('j') if option_count > 0 => {
                self.state.cursor = (self.state.cursor + 1) % option_count;
            }
            KeyCode::Char(' ') | KeyCode::Char('x') => {
                let cursor = self.state.cursor;
                if let Some(session) = self.session_mut() {
                    session.select_index(cursor);
                }
            }
            KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
                let index = (c as usize) - ('1' as usize);
                if index < option_count {
                    self.state.cursor = index;
                    if let Some(session) = self.session_mut() {
                        session.select_index(index);
                    }
                }
            }
            KeyCode::Enter | KeyCode::Char('n') => {
                let generation = self.rendered_generation;
                let advance = self
                    .session_mut()
                    .map(|session| session.advance_for(generation))
                    .unwrap_or(Advance::Ignored);
                self.apply_advance(advance);
            }
            _ => {}
        }
    }

    fn apply_advance(&mut self, advance: Advance) {
        match advance {
            Advance::Next(_) => {
                self.state.cursor = 0;
                self.on_question_changed();
            }
            Advance::Submit(payload) => {
                self.sync_ticker();
                self.state.media = None;
                self.spawn_submission(payload);
            }
            Advance::Ignored => {}
        }
    }

    fn on_question_changed(&mut self) {
        self.sync_ticker();
        self.prepare_media();
    }

    /// Keep exactly one ticker running, for the current countdown.
    fn sync_ticker(&mut self) {
        let wanted = self
            .session()
            .filter(|session| session.phase() == Phase::Playing)
            .map(QuizSession::generation);

        if let (Some(ticker), Some(generation)) = (&self.ticker, wanted) {
            if ticker.generation == generation {
                return;
            }
        }

        if let Some(ticker) = self.ticker.take() {
            ticker.handle.abort();
        }

        if let Some(generation) = wanted {
            let handle = spawn_ticker(self.events_tx.clone(), generation);
            self.ticker = Some(Ticker { generation, handle });
        }
    }

    fn prepare_media(&mut self) {
        self.state.media = None;

        let Some(session) = self.session() else {
            return;
        };
        let generation = session.generation();
        let Some(question) = session.current_question() else {
            return;
        };
        let Some(file_ref) = question.media_url.clone() else {
            return;
        };
        let kind = question.kind;
        let Some(url) = self.api.media_url(kind, &file_ref) else {
            return;
        };

        if kind == QuestionKind::Sound {
            if let Some(file_name) = media_file_name(&file_ref) {
                let path = self.media_dir.join(file_name);
                spawn_media_download(
                    self.api.clone(),
                    self.events_tx.clone(),
                    url.clone(),
                    path,
                    generation,
                );
            }
        }

        self.state.media = Some(MediaView {
            kind,
            url,
            local: None,
            generation,
        });
    }

    fn spawn_submission(&self, payload: Vec<AnswerSubmission>) {
        let api = self.api.clone();
        let jwt = self.context.jwt().map(str::to_string);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = submit_answers(&api, &payload, jwt.as_deref()).await;
            let _ = tx.send(RunnerEvent::Submitted(outcome));
        });
    }

    fn teardown(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.handle.abort();
        }
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn spawn_ticker(tx: mpsc::UnboundedSender<RunnerEvent>, generation: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_PERIOD);
        // The first tick of an interval completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            if tx.send(RunnerEvent::Tick { generation }).is_err() {
                break;
            }
        }
    })
}

fn spawn_media_download(
    api: ApiClient,
    tx: mpsc::UnboundedSender<RunnerEvent>,
    url: String,
    path: PathBuf,
    generation: u64,
) {
    tokio::spawn(async move {
        let downloaded = async {
            let bytes = api.fetch_media(&url).await?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, bytes).await?;
            Ok::<_, QuizError>(())
        };

        match downloaded.await {
            Ok(()) => {
                let _ = tx.send(RunnerEvent::MediaReady { generation, path });
            }
            // The direct URL stays on screen.
            Err(e) => warn!(url = %url, error = %e, "could not download audio"),
        }
    });
}

/// Send the answers once. Failures are logged and never propagated.
pub(crate) async fn submit_answers(
    api: &ApiClient,
    payload: &[AnswerSubmission],
    jwt: Option<&str>,
) -> SubmissionOutcome {
    let Some(jwt) = jwt else {
        warn!("no logged-in user, skipping answer submission");
        return SubmissionOutcome::Skipped;
    };

    match api.submit_answers(payload, Some(jwt)).await {
        Ok(()) => {
            info!(answers = payload.len(), "answers recorded by backend");
            SubmissionOutcome::Submitted
        }
        Err(e) => {
            error!(error = %e, "error submitting answers");
            SubmissionOutcome::Failed(e.to_string())
        }
    }
}
