//! services/client/src/bin/storybook.rs

use clap::{Parser, Subcommand};
use client_lib::{config::Config, error::ClientError, export::export_pdf, state::AppState};
use std::path::PathBuf;
use storybook_core::{
    ports::StoryBackend, Gender, GenerationRequest, ProgressUpdate, SavedStory, Story, ART_STYLES,
    THEMES,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "storybook", about = "Generate and keep AI-illustrated storybooks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether the story server is reachable.
    Health,
    /// Log in and remember the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "STORYBOOK_PASSWORD")]
        password: String,
    },
    /// Create an account, then log in.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "STORYBOOK_PASSWORD")]
        password: String,
        #[arg(long)]
        username: String,
    },
    /// Forget the session (and tell the server, if it is reachable).
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// List the available themes and art styles.
    Themes,
    /// Generate a new story.
    Generate {
        #[arg(long)]
        name: String,
        #[arg(long)]
        theme: String,
        #[arg(long)]
        style: String,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        gender: Option<Gender>,
        /// Save the result to the local library.
        #[arg(long)]
        save: bool,
    },
    /// Browse the local library.
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },
    /// Download a saved story as a PDF.
    Export {
        id: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum LibraryAction {
    List,
    Show { id: String },
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!(api_url = %config.api_url, data_dir = %config.data_dir.display(), "Configuration loaded.");

    // --- 2. Build the Shared AppState ---
    let state = AppState::new(config)?;

    // --- 3. Run the Command ---
    match cli.command {
        Command::Health => {
            let reachable = state.api.health_check().await;
            println!("{}", if reachable { "Connected" } else { "Disconnected" });
        }
        Command::Login { email, password } => {
            let session = state.sessions.login(&email, &password).await?;
            println!("Welcome back, {}!", session.name);
        }
        Command::Register {
            email,
            password,
            username,
        } => {
            let session = state.sessions.register(&email, &password, &username).await?;
            println!("Account created. Welcome, {}!", session.name);
        }
        Command::Logout => {
            state.sessions.logout().await?;
            println!("Signed out.");
        }
        Command::Whoami => match state.sessions.store().current().await? {
            Some(session) => println!("{} <{}>", session.name, session.email),
            None => println!("Not signed in."),
        },
        Command::Themes => {
            println!("Themes: {}", THEMES.join(", "));
            println!("Art styles: {}", ART_STYLES.join(", "));
        }
        Command::Generate {
            name,
            theme,
            style,
            age,
            gender,
            save,
        } => {
            let mut request = GenerationRequest::new(name, theme, style);
            request.character_age = age;
            request.character_gender = gender;
            generate(&state, &request, save).await?;
        }
        Command::Library { action } => library(&state, action).await?,
        Command::Export { id, out } => {
            let saved = state.library.require(&id).await?;
            let export = export_pdf(&state.api, &saved.story, &state.config.target_age).await?;
            let path = out.unwrap_or_else(|| PathBuf::from(&export.filename));
            tokio::fs::write(&path, &export.bytes).await?;
            println!("PDF saved to {}", path.display());
        }
    }

    Ok(())
}

async fn generate(state: &AppState, request: &GenerationRequest, save: bool) -> Result<(), ClientError> {
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling generation.");
            ctrl_c.cancel();
        }
    });

    let observer = |update: &ProgressUpdate| eprintln!("[{:>3}%] {}", update.percent, update.message);
    let story = state
        .generator
        .generate_with_cancel(request, &observer, &cancel)
        .await?;

    print_story(&story);
    if save {
        let saved = state.library.save(story).await?;
        println!("Story saved to your library as '{}'.", saved.story.id);
    }
    Ok(())
}

async fn library(state: &AppState, action: LibraryAction) -> Result<(), ClientError> {
    match action {
        LibraryAction::List => {
            let stories = state.library.list().await?;
            if stories.is_empty() {
                println!("Your library is empty.");
            }
            for saved in stories {
                print_summary(&saved);
            }
        }
        LibraryAction::Show { id } => print_story(&state.library.require(&id).await?.story),
        LibraryAction::Delete { id } => {
            state.library.delete(&id).await?;
            println!("Removed '{}' from your library.", id);
        }
    }
    Ok(())
}

fn print_summary(saved: &SavedStory) {
    println!(
        "{}  {}  ({} chapters, {} words, saved {})",
        saved.story.id,
        saved.story.title,
        saved.story.chapters.len(),
        saved.story.word_count(),
        saved.saved_at.format("%Y-%m-%d %H:%M")
    );
}

fn print_story(story: &Story) {
    println!("\n{}\n", story.title);
    for chapter in &story.chapters {
        println!("Chapter {}: {}", chapter.number, chapter.title);
        println!("{}", chapter.content);
        match &chapter.illustration_url {
            Some(url) => println!("  [illustration] {}", url),
            None => println!("  [{}]", chapter.illustration_prompt),
        }
        println!();
    }
}
