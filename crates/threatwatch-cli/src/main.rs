//! threatwatch - terminal front end for the threatwatch dashboard.
//!
//! A small interactive shell: sign in, register, open dashboard pages and
//! sign out. Protected pages are gated on the session the core library
//! keeps.

mod app;
mod console;
mod input;

use anyhow::Result;
use threatwatch_core::{AuthMode, Config, Registration, StorageBackend};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use input::{Command, HELP};

/// Log file name inside the data directory
const LOG_FILE: &str = "threatwatch.log";

/// Command-line switches layered over the config file.
#[derive(Debug, Default, PartialEq, Eq)]
struct Flags {
    mode: Option<AuthMode>,
    ephemeral: bool,
    verify: bool,
}

impl Flags {
    fn parse(args: &[String]) -> Result<Self> {
        let mut flags = Flags::default();
        for arg in args {
            match arg.as_str() {
                "--bypass" | "--dev" => flags.mode = Some(AuthMode::Bypass),
                "--remote" => flags.mode = Some(AuthMode::Remote),
                "--ephemeral" => flags.ephemeral = true,
                "--verify" => flags.verify = true,
                other => return Err(anyhow::anyhow!("Unknown argument: {}", other)),
            }
        }
        Ok(flags)
    }

    fn apply(&self, config: &mut Config) {
        if let Some(mode) = self.mode {
            config.auth_mode = mode;
        }
        if self.ephemeral {
            config.storage = StorageBackend::Memory;
        }
        if self.verify {
            config.verify_on_startup = true;
        }
    }
}

/// Initialize the tracing subscriber. Logs go to a file so they do not
/// interleave with the shell; the returned guard flushes it on exit.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match config.data_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(EnvFilter::new("warn"))
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let flags = Flags::parse(&args)?;

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config, using defaults: {}", e);
            let mut config = Config::default();
            config.apply_env();
            config
        }
    };
    flags.apply(&mut config);

    let _log_guard = init_tracing(&config);
    info!(mode = ?config.auth_mode, storage = ?config.storage, "threatwatch starting");

    let mut app = App::new(config)?;
    app.start().await;

    println!("{}", app.render());
    let result = run(&mut app).await;

    info!("threatwatch shutting down");
    result
}

async fn run(app: &mut App) -> Result<()> {
    loop {
        let Some(line) = input::prompt("\nthreatwatch> ")? else {
            return Ok(());
        };

        match Command::parse(&line) {
            Command::Empty => continue,
            Command::Quit => return Ok(()),
            Command::Help => {
                println!("{}", HELP);
                continue;
            }
            Command::Status => {
                println!("{}", app.status());
                continue;
            }
            Command::Unknown(text) => {
                println!("Unknown command: {}. Type `help` for commands.", text);
                continue;
            }
            Command::Login(username) => login(app, username).await?,
            Command::Register => register(app).await?,
            Command::Logout => app.logout(),
            Command::Open(path) => app.open(&path),
        }

        println!("{}", app.render());
    }
}

async fn login(app: &mut App, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => {
            let label = match app.last_username() {
                Some(last) => format!("Username [{}]: ", last),
                None => "Username: ".to_string(),
            };
            let Some(entered) = input::prompt(&label)? else {
                return Ok(());
            };
            match (entered.is_empty(), app.last_username()) {
                (true, Some(last)) => last.to_string(),
                _ => entered,
            }
        }
    };
    if !input::is_valid_username(&username) {
        println!("Username is too long or contains control characters");
        return Ok(());
    }

    let password = input::prompt_password("Password: ")?;
    if !input::is_valid_password(&password) {
        println!("Password is too long or contains control characters");
        return Ok(());
    }

    // The session manager already reported the failure to the user.
    let _ = app.login(&username, &password).await;
    Ok(())
}

async fn register(app: &mut App) -> Result<()> {
    let Some(username) = input::prompt("Username: ")? else {
        return Ok(());
    };
    let Some(email) = input::prompt("Email: ")? else {
        return Ok(());
    };
    let password = input::prompt_password("Password: ")?;
    let confirm = input::prompt_password("Confirm password: ")?;

    if password != confirm {
        println!("Passwords do not match");
        return Ok(());
    }
    if !input::is_valid_username(&username) || !input::is_valid_password(&password) {
        println!("Username or password is too long or contains control characters");
        return Ok(());
    }

    let _ = app
        .register(&Registration::new(username, email, password))
        .await;
    Ok(())
}
