//! Contact book CLI.
//!
//! Reads `contacts.toml` for the contacts file location, then runs one
//! create/read/update/delete command against that file.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contacts::commands::{self, ContactInput, DeleteOutcome};
use contacts::exit_codes;
use contacts::io::config::{ContactsConfig, DEFAULT_CONFIG_PATH, load_config, write_config};
use contacts::io::store::ContactStore;
use contacts::logging;
use tracing::{info_span, warn};

#[derive(Parser)]
#[command(name = "contacts", version, about = "File-backed contact book")]
struct Cli {
    /// Config file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Contacts file; overrides `file` from the config.
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the contacts file and config if missing.
    Init,
    /// Print all contacts.
    List {
        /// Print a JSON array instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Add a new contact.
    Create {
        name: String,
        #[arg(allow_hyphen_values = true)]
        phone: String,
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Replace phone and email of an existing contact.
    Update {
        name: String,
        #[arg(allow_hyphen_values = true)]
        phone: String,
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Remove a contact by name (case-insensitive).
    Delete {
        name: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Report whether a phone number is accepted.
    CheckPhone {
        #[arg(allow_hyphen_values = true)]
        phone: String,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {:#}", err);
            std::process::exit(exit_codes::ERROR);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let file = cli.file.clone().unwrap_or_else(|| config.file.clone());
    let span = info_span!("contact_store", file = %file.display());
    let store = ContactStore::new(file, span);
    let mut out = io::stdout().lock();

    let code = match cli.command {
        Command::Init => {
            write_default_config(&cli.config, &config)?;
            commands::init(&store, &mut out)?;
            exit_codes::OK
        }
        Command::List { json } => {
            commands::list(&store, json, &mut out)?;
            exit_codes::OK
        }
        Command::Create { name, phone, email } => {
            initialize_quietly(&store);
            let input = ContactInput::from_fields(&name, &phone, email.as_deref())?;
            outcome_code(commands::create(&store, &input, &mut out)?.is_success())
        }
        Command::Update { name, phone, email } => {
            initialize_quietly(&store);
            let input = ContactInput::from_fields(&name, &phone, email.as_deref())?;
            outcome_code(commands::update(&store, &input, &mut out)?.is_success())
        }
        Command::Delete { name, yes } => {
            initialize_quietly(&store);
            let confirm = config.confirm_delete && !yes;
            let mut stdin = io::stdin().lock();
            match commands::delete(&store, &name, confirm, &mut stdin, &mut out)? {
                DeleteOutcome::Deleted | DeleteOutcome::Declined => exit_codes::OK,
                DeleteOutcome::NotFound => exit_codes::REJECTED,
            }
        }
        Command::CheckPhone { phone } => outcome_code(commands::check_phone(&phone, &mut out)?),
    };
    out.flush().context("flush stdout")?;
    Ok(code)
}

fn outcome_code(success: bool) -> i32 {
    if success {
        exit_codes::OK
    } else {
        exit_codes::REJECTED
    }
}

/// Opening the store is not fatal; failures are logged and the command runs.
fn initialize_quietly(store: &ContactStore) {
    match store.initialize() {
        Ok(report) if !report.dir_writable => {
            eprintln!("warning: no write permission in the contacts directory");
        }
        Ok(_) => {}
        Err(err) => {
            warn!(error = %format_args!("{err:#}"), "continuing without initialized contacts file");
            eprintln!("warning: {:#}", err);
        }
    }
}

fn write_default_config(path: &Path, config: &ContactsConfig) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    write_config(path, config).with_context(|| format!("write {}", path.display()))
}
