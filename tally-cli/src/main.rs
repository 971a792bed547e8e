use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use tally_core::{Row, TaskStore, TaskSync};

mod api;
mod auth;
mod config;
mod state;
mod sync_bridge;
mod tui;

use api::{ApiConfig, TodoistClient};

#[derive(Parser, Debug)]
#[command(name = "tally", version, about = "Todoist-backed task list with a moving input row")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive task list
    Tui {
        /// Keep tasks in memory only; no network
        #[arg(long, default_value_t = false)]
        local: bool,
    },

    /// Load and print the task list
    List,

    /// Create a task
    Add {
        /// Task text (words are joined)
        text: Vec<String>,
    },

    /// Flip a task's completion state
    Toggle { id: String },

    /// Rewrite a task's text
    Edit {
        id: String,
        text: Vec<String>,
    },

    /// Delete a task
    Rm { id: String },

    /// Credential management
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Config management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Prompt for a Todoist API token and store it in ~/.tally/auth.json
    PasteToken,

    /// Verify the token against the service and persist it on success
    Check,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Tui { local } => {
            let session = if local {
                tui::Session::Local(TaskStore::new())
            } else {
                let mut sync = build_sync()?;
                // a failed initial load shows up in the status line rather
                // than aborting the app
                let _ = sync.load_tasks().await;
                tui::Session::Remote(sync)
            };
            tui::run_tui(session)
        }

        Command::List => {
            let mut sync = build_sync()?;
            sync.load_tasks().await?;
            print_rows(sync.store());
            Ok(())
        }

        Command::Add { text } => {
            let mut sync = build_sync()?;
            match sync.add_task(&text.join(" ")).await? {
                Some(task) => println!("Added {}  {}", task.id, task.text),
                None => println!("Nothing to add (empty text)"),
            }
            Ok(())
        }

        Command::Toggle { id } => {
            let mut sync = loaded_sync().await?;
            if sync.store().task(&id).is_none() {
                bail!("no task with id {id}");
            }
            sync.toggle_task(&id).await?;
            let completed = sync.store().task(&id).map(|t| t.completed).unwrap_or(false);
            println!("{} {id}", if completed { "Closed" } else { "Reopened" });
            Ok(())
        }

        Command::Edit { id, text } => {
            let mut sync = loaded_sync().await?;
            if sync.store().task(&id).is_none() {
                bail!("no task with id {id}");
            }
            sync.edit_task(&id, &text.join(" ")).await?;
            println!("Updated {id}");
            Ok(())
        }

        Command::Rm { id } => {
            let mut sync = loaded_sync().await?;
            if sync.store().task(&id).is_none() {
                bail!("no task with id {id}");
            }
            sync.delete_task(&id).await?;
            println!("Deleted {id}");
            Ok(())
        }

        Command::Auth { command } => match command {
            AuthCommand::PasteToken => auth::paste_token(),
            AuthCommand::Check => auth_check().await,
        },

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(),
        },
    }
}

fn build_client(token: String) -> Result<TodoistClient> {
    let cfg = config::load_config()?;
    TodoistClient::new(ApiConfig {
        base_url: cfg.api.base_url,
        token,
        timeout_secs: cfg.api.timeout_secs,
        project_name: cfg.api.project,
    })
}

fn build_sync() -> Result<TaskSync<TodoistClient>> {
    let token = auth::resolve_token()?;
    Ok(TaskSync::new(build_client(token)?))
}

async fn loaded_sync() -> Result<TaskSync<TodoistClient>> {
    let mut sync = build_sync()?;
    sync.load_tasks().await?;
    Ok(sync)
}

async fn auth_check() -> Result<()> {
    let token = auth::resolve_token()?;
    let mut sync = TaskSync::new(build_client(String::new())?);
    sync.authenticate(&token).await?;

    // mirror the manual-auth flow: a verified token is written back to the
    // persisted store
    auth::save_auth(&auth::AuthState {
        todoist_token: Some(token),
    })?;
    println!("Connected to Todoist successfully. Token saved.");
    Ok(())
}

fn print_rows(store: &TaskStore) {
    for row in store.rows() {
        match row {
            Row::Input => println!("       ›"),
            Row::Task(t) => {
                println!("[{}] {}  {}", if t.completed { "x" } else { " " }, t.id, t.text);
            }
        }
    }
}
