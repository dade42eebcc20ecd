//! chatcsv CLI: talk to a chatcsvd server and manage local chat state.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use chatcsv::client::{HttpTransport, LocalTransport};
use chatcsv::config::ClientConfig;
use chatcsv::paths::ChatPaths;
use chatcsv::rules::RuleTable;
use chatcsv::session::{ChatHistoryEntry, ChatSession, Sender};
use chatcsv::storage::{ClientStorage, Theme};

#[derive(Parser)]
#[command(name = "chatcsv", version, about = "Keyword chat client")]
struct Cli {
    /// Base URL of the chat server.
    #[arg(long, global = true)]
    server: Option<String>,

    /// Directory for local chat state (name, theme, history, interests).
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the replies.
    Send {
        /// Message text.
        message: String,
    },

    /// Interactive chat; `/quit` or EOF to leave.
    Repl,

    /// Print the saved conversation.
    History,

    /// Show accumulated interest counters.
    Interests,

    /// Save display name and theme.
    Settings {
        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, value_enum, default_value_t = Theme::Light)]
        theme: Theme,
    },

    /// Forget name, theme, history, and interests.
    Clear,

    /// Match a message against a rule file locally, without a server.
    Match {
        message: String,

        /// Rule table to match against.
        #[arg(long, default_value = "responses.csv")]
        rules: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = ChatPaths::resolve().ok();

    let mut config = match &paths {
        Some(paths) => ClientConfig::load_or_default(&paths.client_config_file())?,
        None => ClientConfig::default(),
    };
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    if let Some(dir) = cli.storage_dir {
        config.storage_dir = Some(dir);
    }

    let storage = ClientStorage::open_configured(&config, paths.as_ref())?;

    match cli.command {
        Commands::Send { message } => {
            let mut session = ChatSession::open(storage);
            let transport = HttpTransport::new(&config.server_url);
            print_entries(&session.send(&message, &transport));
        }
        Commands::Repl => {
            let mut session = ChatSession::open(storage);
            let transport = HttpTransport::new(&config.server_url);
            print_entries(session.transcript());

            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            loop {
                print!("> ");
                stdout.flush().into_diagnostic()?;
                let mut line = String::new();
                if stdin.lock().read_line(&mut line).into_diagnostic()? == 0 {
                    break;
                }
                let line = line.trim();
                if line == "/quit" {
                    break;
                }
                print_entries(&session.send(line, &transport));
            }
        }
        Commands::History => {
            let session = ChatSession::open(storage);
            if session.history().is_empty() {
                println!("(no history)");
            }
            print_entries(session.history());
        }
        Commands::Interests => {
            let session = ChatSession::open(storage);
            let counters = session.tracker().counters();
            if counters.is_empty() {
                println!("(no interests recorded)");
            }
            for (interest, count) in counters.iter() {
                println!("{interest:<8} {count}");
            }
            if let Some(suggestion) = session.recall() {
                println!();
                print_entries(&[ChatHistoryEntry::from(suggestion)]);
            }
        }
        Commands::Settings { name, theme } => {
            let mut session = ChatSession::open(storage);
            session.save_settings(&name, theme);
            println!("theme: {}", session.theme());
            if !session.name().is_empty() {
                println!("Nice to meet you, {}!", session.name());
            }
        }
        Commands::Clear => {
            let mut session = ChatSession::open(storage);
            session.clear();
            print_entries(session.transcript());
        }
        Commands::Match { message, rules } => {
            let table = RuleTable::read(&rules)?;
            let mut session = ChatSession::open(storage);
            print_entries(&session.send(&message, &LocalTransport::new(table)));
        }
    }

    Ok(())
}

fn print_entries(entries: &[ChatHistoryEntry]) {
    for entry in entries {
        let who = match entry.sender {
            Sender::User => "you",
            Sender::Bot => "bot",
        };
        println!("{who}: {}", entry.text);
        if let Some(redirect) = &entry.redirect {
            println!("     → {redirect}");
        }
    }
}
