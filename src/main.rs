use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use aoe_quiz::account::{self, ProfileChanges, Registration};
use aoe_quiz::review::{self, ReviewQuery};
use aoe_quiz::{
    load_questions_from_json, ApiClient, ImageSize, NewQuestion, QuestionKind, QuestionSource,
    QuestionStatus, QuizConfig, QuizFilter, QuizLength, Runner, UserContext, UserProfile, THEMES,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Backend base URL (overrides AOE_QUIZ_BACKEND_URL)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Where the logged-in user is saved
    #[arg(long, global = true)]
    user_file: Option<PathBuf>,

    /// Log file; the terminal belongs to the UI
    #[arg(long, global = true, default_value = "aoe-quiz.log")]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a timed quiz (default)
    Play(PlayArgs),
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Forget the saved session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Moderate submitted questions
    #[command(subcommand)]
    Review(ReviewCommand),
    /// Submit a new question from a JSON draft
    Create {
        draft: PathBuf,
        /// Image or sound to upload first; its stored path becomes the fileUrl
        #[arg(long)]
        file: Option<PathBuf>,
        /// Image width in pixels (required with an image file)
        #[arg(long)]
        width: Option<u32>,
        /// Image height in pixels (required with an image file)
        #[arg(long)]
        height: Option<u32>,
    },
    /// Create an account
    Register(RegisterArgs),
    /// Ask for a password reset email
    ForgotPassword {
        #[arg(short, long)]
        email: String,
    },
    /// Set a new password with the token from the reset email
    ResetPassword {
        #[arg(short, long)]
        token: String,
        #[arg(short, long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Show and edit player profiles
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(short, long)]
    username: String,
    #[arg(short, long)]
    email: String,
    #[arg(short, long)]
    password: String,
    #[arg(long)]
    confirm_password: String,
    /// Pseudo shown to other players
    #[arg(long)]
    pseudo: String,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    surname: String,
    #[arg(long, default_value = "")]
    discord: String,
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// Show your profile, or another player's by user id
    Show { id: Option<i64> },
    /// List player profiles
    List {
        /// Keep pseudos containing this text
        #[arg(long)]
        pseudo: Option<String>,
    },
    /// Change your email or profile fields
    Update {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        pseudo: Option<String>,
        #[arg(long)]
        discord: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Change your password
    Password {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Args, Debug, Default)]
struct PlayArgs {
    /// JSON file to load the questions from instead of the backend
    #[arg(short, long)]
    questions: Option<PathBuf>,

    /// short, medium, long or a question count
    #[arg(short, long, value_parser = parse_length)]
    length: Option<QuizLength>,

    /// Number of questions, between 1 and 100
    #[arg(short, long)]
    count: Option<u32>,

    #[arg(long)]
    theme: Option<String>,

    #[arg(long)]
    civilisation: Option<String>,

    #[arg(long)]
    building: Option<String>,

    /// Seconds allowed per question
    #[arg(long)]
    timer_seconds: Option<u32>,

    /// Points for an instant correct answer
    #[arg(long)]
    points_base: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum ReviewCommand {
    /// List questions, newest first
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        oldest_first: bool,
    },
    /// Change the status of a question
    Set { id: i64, status: String },
    /// Replace a question's content with a JSON draft
    Edit { id: i64, draft: PathBuf },
}

fn parse_length(input: &str) -> Result<QuizLength, String> {
    QuizLength::parse(input).ok_or_else(|| format!("invalid quiz length: {}", input))
}

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    let mut config = QuizConfig::from_env()?;
    if let Some(url) = cli.backend_url {
        config.backend_url = url.trim_end_matches('/').to_string();
    }
    if let Some(path) = cli.user_file {
        config.user_file = path;
    }

    let command = cli
        .command
        .unwrap_or_else(|| Command::Play(PlayArgs::default()));

    match command {
        Command::Play(args) => play(config, args).await,
        Command::Login { username, password } => login(&config, &username, &password).await,
        Command::Logout => {
            let mut context = UserContext::load(&config.user_file);
            context.set_user(None)?;
            println!("Déconnecté");
            Ok(())
        }
        Command::Whoami => {
            whoami(&UserContext::load(&config.user_file));
            Ok(())
        }
        Command::Review(command) => run_review(&config, command).await,
        Command::Create {
            draft,
            file,
            width,
            height,
        } => {
            let size = width.zip(height).map(|(w, h)| ImageSize::new(w, h));
            create(&config, &draft, file.map(|path| (path, size))).await
        }
        Command::Register(args) => register(&config, args).await,
        Command::ForgotPassword { email } => {
            let api = ApiClient::new(&config.backend_url)?;
            account::forgot_password(&api, &email).await?;
            println!("{}", account::RESET_LINK_SENT);
            Ok(())
        }
        Command::ResetPassword {
            token,
            password,
            confirm_password,
        } => {
            let api = ApiClient::new(&config.backend_url)?;
            account::reset_password(&api, &token, &password, &confirm_password).await?;
            println!("Mot de passe réinitialisé, vous pouvez vous connecter");
            Ok(())
        }
        Command::Profile(command) => run_profile(&config, command).await,
    }
}

async fn play(mut config: QuizConfig, args: PlayArgs) -> Result<()> {
    if let Some(seconds) = args.timer_seconds {
        config.timing.seconds_per_question = seconds;
    }
    if let Some(base) = args.points_base {
        config.timing.points_base = base;
    }

    let source = match &args.questions {
        Some(path) => QuestionSource::Local(load_questions_from_json(path)?),
        None => question_source(&args),
    };

    let context = UserContext::load(&config.user_file);
    let report = Runner::new(&config, context)?.run(source).await?;

    match report {
        Some(report) => {
            info!(score = report.score, points = report.points, "quiz finished");
            println!("Score : {} / {}", report.score, report.total);
            println!("Points : {}", report.points);
        }
        None => println!("Quiz interrompu"),
    }
    Ok(())
}

fn question_source(args: &PlayArgs) -> QuestionSource {
    let filtered = args.length.is_some()
        || args.count.is_some()
        || args.theme.is_some()
        || args.civilisation.is_some()
        || args.building.is_some();
    if !filtered {
        return QuestionSource::Default;
    }

    if let Some(theme) = &args.theme {
        let known = THEMES
            .iter()
            .any(|(tag, _)| tag.eq_ignore_ascii_case(&theme.replace([' ', '-'], "_")));
        if !known {
            warn!(theme = %theme, "unknown theme, sending it as is");
        }
    }

    let length = match args.count {
        Some(count) => QuizLength::Custom(count),
        None => args.length.unwrap_or_default(),
    };
    let filter = QuizFilter::default()
        .with_length(length)
        .with_theme(args.theme.as_deref())
        .with_civilisation(args.civilisation.as_deref())
        .with_building(args.building.as_deref());
    QuestionSource::Generated(filter)
}

async fn login(config: &QuizConfig, username: &str, password: &str) -> Result<()> {
    let api = ApiClient::new(&config.backend_url)?;
    let user = api.login(username, password).await?;
    println!("Connecté en tant que {}", user.display_name());

    let mut context = UserContext::load(&config.user_file);
    context
        .set_user(Some(user))
        .with_context(|| format!("cannot save user to {}", config.user_file.display()))?;
    Ok(())
}

fn whoami(context: &UserContext) {
    let Some(user) = context.user() else {
        println!("Non connecté");
        return;
    };

    let roles: Vec<&str> = user.roles.iter().map(|role| role.name.as_str()).collect();
    println!("{} ({})", user.display_name(), user.username);
    if !roles.is_empty() {
        println!("Rôles : {}", roles.join(", "));
    }
}

async fn run_review(config: &QuizConfig, command: ReviewCommand) -> Result<()> {
    let api = ApiClient::new(&config.backend_url)?;
    let context = UserContext::load(&config.user_file);

    match command {
        ReviewCommand::List {
            status,
            kind,
            oldest_first,
        } => {
            let query = ReviewQuery {
                status: status.as_deref().map(|s| QuestionStatus::from_tag(Some(s))),
                kind: kind.as_deref().map(|k| QuestionKind::from_tag(Some(k))),
                newest_first: !oldest_first,
            };
            let questions = review::list_questions(&api, &context, &query).await?;
            if questions.is_empty() {
                println!("Aucune question");
            }
            for question in &questions {
                let touched = question
                    .last_touched()
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "#{:<5} {:<16} {:<10} {:<16} {:<16} {}",
                    question.id,
                    question.status().label(),
                    question.kind().label(),
                    question.author().unwrap_or("-"),
                    touched,
                    question.libelle
                );
            }
        }
        ReviewCommand::Set { id, status } => {
            let status = QuestionStatus::from_tag(Some(&status));
            review::set_status(&api, &context, id, &status).await?;
            println!("Question #{} : {}", id, status.label());
        }
        ReviewCommand::Edit { id, draft } => {
            let draft = read_draft(&draft)?;
            review::update_question(&api, &context, id, draft).await?;
            println!("Question #{} modifiée", id);
        }
    }
    Ok(())
}

fn read_draft(path: &Path) -> Result<NewQuestion> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid question draft {}", path.display()))
}

async fn create(
    config: &QuizConfig,
    draft_path: &Path,
    media: Option<(PathBuf, Option<ImageSize>)>,
) -> Result<()> {
    let mut draft = read_draft(draft_path)?;

    let api = ApiClient::new(&config.backend_url)?;
    let context = UserContext::load(&config.user_file);
    if let Some((path, size)) = media {
        let stored = review::upload_media(&api, &context, draft.kind, &path, size).await?;
        println!("Fichier envoyé : {}", stored);
        draft.file_url = Some(stored);
    }
    let created = review::create_question(&api, &context, draft).await?;

    match created.get("id") {
        Some(id) => println!("Question créée (#{})", id),
        None => println!("Question créée"),
    }
    Ok(())
}

async fn register(config: &QuizConfig, args: RegisterArgs) -> Result<()> {
    let api = ApiClient::new(&config.backend_url)?;
    let username = args.username.trim().to_string();
    account::register(
        &api,
        Registration {
            username: args.username,
            email: args.email,
            password: args.password,
            confirm_password: args.confirm_password,
            name: args.name,
            surname: args.surname,
            pseudo: args.pseudo,
            pseudo_discord: args.discord,
        },
    )
    .await?;
    println!("Compte créé, connectez-vous avec `login -u {}`", username);
    Ok(())
}

async fn run_profile(config: &QuizConfig, command: ProfileCommand) -> Result<()> {
    let api = ApiClient::new(&config.backend_url)?;
    let mut context = UserContext::load(&config.user_file);

    match command {
        ProfileCommand::Show { id: Some(id) } => {
            print_profile(&account::profile(&api, &context, id).await?);
        }
        ProfileCommand::Show { id: None } => {
            let user = account::current_profile(&api, &context).await?;
            println!("{} ({}, {})", user.display_name(), user.username, user.email);
            if let Some(profile) = &user.user_profile {
                print_profile(profile);
            }
        }
        ProfileCommand::List { pseudo } => {
            let profiles = account::list_profiles(&api, &context, pseudo.as_deref()).await?;
            if profiles.is_empty() {
                println!("Aucun profil");
            }
            for profile in &profiles {
                println!("#{:<5} {:<20} {}", profile.id, profile.pseudo, profile.pseudo_discord);
            }
        }
        ProfileCommand::Update {
            email,
            pseudo,
            discord,
            bio,
            avatar,
        } => {
            let changes = ProfileChanges {
                email,
                pseudo,
                pseudo_discord: discord,
                bio,
                avatar,
            };
            let user = account::update_profile(&api, &mut context, changes).await?;
            println!("Profil mis à jour pour {}", user.display_name());
        }
        ProfileCommand::Password { old, new, confirm } => {
            account::update_password(&api, &context, &old, &new, &confirm).await?;
            println!("Mot de passe modifié");
        }
    }
    Ok(())
}

fn print_profile(profile: &UserProfile) {
    println!("Pseudo : {}", profile.pseudo);
    if !profile.pseudo_discord.is_empty() {
        println!("Discord : {}", profile.pseudo_discord);
    }
    if !profile.avatar.is_empty() {
        println!("Avatar : {}", profile.avatar);
    }
    if !profile.bio.is_empty() {
        println!("{}", profile.bio);
    }
}
