use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use celebration_core::{
    run_first_login_sequence, AuthSession, CelebrationFeed, FirstLoginController,
    LocalAuthProvider, RegistrationForm,
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use shared::domain::DISPLAY_NAME_KEY;
use storage::{
    DurableStore, FilePreferences, MemoryPreferences, PreferenceMedium, SqlitePreferences,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, MediumKind, Settings};

#[derive(Parser, Debug)]
#[command(name = "birthday-cake", about = "Birthday celebrations from the terminal")]
struct Cli {
    /// Path to a flat TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account; the cake is shown right after.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// App load: show the first-login cake if it is still pending.
    Celebrate,
    Status,
    Wish {
        #[arg(required = true)]
        text: Vec<String>,
    },
    Plan {
        #[arg(required = true)]
        text: Vec<String>,
    },
    Pref {
        #[command(subcommand)]
        action: PrefCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PrefCommand {
    Get { key: String },
    /// VALUE is stored as JSON when it parses, otherwise as a string.
    Set { key: String, value: String },
    Remove { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = load_settings(cli.config.as_deref());
    let settings = loaded.settings;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    for warning in &loaded.warnings {
        warn!("config: {warning}");
    }

    let store = build_store(&settings).await;
    info!("storage: media order {:?}", store.media());

    match cli.command {
        Command::Register {
            name,
            email,
            password,
            confirm_password,
        } => {
            let session = AuthSession::new(LocalAuthProvider::new(), store.clone());
            let form = RegistrationForm {
                display_name: name,
                email,
                password,
                confirm_password,
            };
            match session.register(&form).await {
                Ok(identity) => println!("Welcome aboard, {}!", identity.email),
                Err(err) => {
                    println!("{}", err.user_message());
                    return Err(err).context("registration failed");
                }
            }
            celebrate(session.first_login(), &store, &settings).await;
        }
        Command::Celebrate => {
            let controller = FirstLoginController::new(store.clone());
            celebrate(&controller, &store, &settings).await;
        }
        Command::Status => {
            let controller = FirstLoginController::new(store.clone());
            println!("media: {}", store.media().join(" -> "));
            println!("first login pending: {}", controller.is_first_login().await);
            match store.get::<String>(DISPLAY_NAME_KEY).await {
                Ok(Some(name)) => println!("display name: {name}"),
                Ok(None) => println!("display name: (not set)"),
                Err(err) => println!("display name: unavailable ({err})"),
            }
        }
        Command::Wish { text } => {
            let feed = CelebrationFeed::new();
            report_submission(feed.submit_wish(&text.join(" ")));
        }
        Command::Plan { text } => {
            let feed = CelebrationFeed::new();
            report_submission(feed.submit_plan(&text.join(" ")));
        }
        Command::Pref { action } => run_pref(&store, action).await?,
    }

    Ok(())
}

async fn build_store(settings: &Settings) -> DurableStore {
    let mut media: Vec<Arc<dyn PreferenceMedium>> = Vec::new();
    for kind in &settings.media {
        match kind {
            MediumKind::Sqlite => match SqlitePreferences::new(&settings.database_url).await {
                Ok(sqlite) => media.push(Arc::new(sqlite)),
                Err(err) => warn!(
                    "storage: native store at {} unavailable, skipping: {err:#}",
                    settings.database_url
                ),
            },
            MediumKind::File => media.push(Arc::new(FilePreferences::new(
                settings.fallback_path.clone(),
            ))),
            MediumKind::Memory => media.push(Arc::new(MemoryPreferences::default())),
        }
    }
    DurableStore::new(media)
}

async fn celebrate(controller: &FirstLoginController, store: &DurableStore, settings: &Settings) {
    let display_name = store.get::<String>(DISPLAY_NAME_KEY).await.unwrap_or_else(|err| {
        warn!("celebration: display name unavailable: {err}");
        None
    });

    let feed = CelebrationFeed::new();
    let mut events = feed.subscribe();
    let hold = Duration::from_millis(settings.celebration_ms);

    let ran = run_first_login_sequence(controller, &feed, display_name.as_deref(), async {
        if let Ok(event) = events.recv().await {
            println!("{event:?}");
        }
        println!("Make a wish! (Ctrl-C to blow out the candles)");
        tokio::select! {
            _ = tokio::time::sleep(hold) => {}
            _ = tokio::signal::ctrl_c() => println!("Candles blown out."),
        }
    })
    .await;

    if !ran {
        println!("Welcome back!");
    }
}

fn report_submission(submission: Option<celebration_core::Submission>) {
    match submission {
        Some(submission) => {
            println!("{}", submission.toast);
            println!(
                "confetti for {}s",
                submission.confetti_for.as_secs()
            );
        }
        None => println!("Nothing to send."),
    }
}

async fn run_pref(store: &DurableStore, action: PrefCommand) -> Result<()> {
    match action {
        PrefCommand::Get { key } => match store.get::<Value>(&key).await? {
            Some(value) => println!("{value}"),
            None => println!("(absent)"),
        },
        PrefCommand::Set { key, value } => {
            let value = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
            store.set(&key, &value).await?;
            println!("stored {key}");
        }
        PrefCommand::Remove { key } => {
            store.remove(&key).await?;
            println!("removed {key}");
        }
    }
    Ok(())
}
