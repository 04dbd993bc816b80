//! Command-line interface for taskboard
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::warn;

use crate::board::Board;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{EventKind, EventSink};
use crate::output::OutputOptions;

mod project;
mod task;
mod user;

/// taskboard - project and task board client
///
/// Browse and edit projects, tasks and users served by a board REST API.
/// Project status follows the status of its tasks.
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to ./.taskboard.toml, then the user config dir)
    #[arg(long, global = true, env = "TASKBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the board API (overrides the config file)
    #[arg(long, global = true, env = "TASKBOARD_API_URL")]
    pub api_url: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write JSONL events to a file, or '-' for stdout
    #[arg(long, global = true)]
    pub events: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// User directory
    #[command(subcommand)]
    User(UserCommands),
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List projects with task counts
    List,

    /// Show a project and its tasks
    Show {
        /// Project ID
        id: String,
    },

    /// Create a project
    New {
        /// Project name
        name: String,

        /// Optional description
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a project
    Delete {
        /// Project ID
        id: String,
    },

    /// Recompute project status from tasks and persist changes
    Sync {
        /// Project ID (all projects when omitted)
        id: Option<String>,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List tasks
    List {
        /// Only tasks of this project
        #[arg(long)]
        project: Option<String>,

        /// Only tasks with this status: new, in-progress, done
        #[arg(long)]
        status: Option<String>,
    },

    /// Create a task
    New {
        /// Project ID
        project: String,

        /// Task name
        name: String,

        /// Initial status: new, in-progress, done
        #[arg(long, default_value = "new")]
        status: String,

        /// Assignee user ID
        #[arg(long)]
        assign: Option<String>,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        end_date: Option<String>,

        /// Position within the project
        #[arg(long)]
        order: Option<i64>,
    },

    /// Update a task
    Update {
        /// Task ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New status: new, in-progress, done
        #[arg(long)]
        status: Option<String>,

        /// Assign to a user ID
        #[arg(long, conflicts_with = "unassign")]
        assign: Option<String>,

        /// Remove the assignee
        #[arg(long)]
        unassign: bool,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long, conflicts_with = "clear_end_date")]
        end_date: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_end_date: bool,

        /// Position within the project
        #[arg(long)]
        order: Option<i64>,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

/// User subcommands
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List users
    List,
}

/// Shared state for one command invocation.
pub(crate) struct CommandContext {
    pub board: Board,
    pub output: OutputOptions,
    events: Option<EventSink>,
}

impl CommandContext {
    fn load(
        config: Option<PathBuf>,
        api_url: Option<String>,
        json: bool,
        quiet: bool,
        events: Option<&str>,
    ) -> Result<Self> {
        let config = resolve_config(config)?.with_base_url(api_url)?;
        let board = Board::from_config(&config)?;

        let events = EventSink::open(events)?;
        let events_to_stdout = events.as_ref().is_some_and(EventSink::is_stdout);

        Ok(Self {
            board,
            output: OutputOptions::new(json, quiet, events_to_stdout),
            events,
        })
    }

    /// Write an event if a sink is configured; returns a warning on failure.
    pub fn emit_event<T: Serialize>(&mut self, kind: EventKind, data: &T) -> Option<String> {
        let sink = self.events.as_mut()?;
        sink.emit(kind, data)
            .err()
            .map(|err| format!("event output failed: {err}"))
    }

    /// Fail when the preceding fetches recorded errors.
    pub fn ensure_loaded(&self) -> Result<()> {
        let errors = self.board.errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::OperationFailed(errors.join("; ")))
        }
    }
}

fn resolve_config(explicit: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(&path);
    }
    let cwd = std::env::current_dir()?;
    match Config::discover(&cwd) {
        Some(path) => Ok(Config::load(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "ignoring invalid config");
            Config::default()
        })),
        None => Ok(Config::default()),
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run_async())
    }

    async fn run_async(self) -> Result<()> {
        let mut ctx = CommandContext::load(
            self.config,
            self.api_url,
            self.json,
            self.quiet,
            self.events.as_deref(),
        )?;

        match self.command {
            Commands::Project(cmd) => match cmd {
                ProjectCommands::List => project::run_list(&mut ctx).await,
                ProjectCommands::Show { id } => project::run_show(&mut ctx, &id).await,
                ProjectCommands::New { name, description } => {
                    project::run_new(&mut ctx, project::NewOptions { name, description }).await
                }
                ProjectCommands::Delete { id } => project::run_delete(&mut ctx, &id).await,
                ProjectCommands::Sync { id } => project::run_sync(&mut ctx, id.as_deref()).await,
            },
            Commands::Task(cmd) => match cmd {
                TaskCommands::List { project, status } => {
                    task::run_list(&mut ctx, task::ListOptions { project, status }).await
                }
                TaskCommands::New {
                    project,
                    name,
                    status,
                    assign,
                    end_date,
                    order,
                } => {
                    task::run_new(
                        &mut ctx,
                        task::NewOptions {
                            project,
                            name,
                            status,
                            assign,
                            end_date,
                            order,
                        },
                    )
                    .await
                }
                TaskCommands::Update {
                    id,
                    name,
                    status,
                    assign,
                    unassign,
                    end_date,
                    clear_end_date,
                    order,
                } => {
                    task::run_update(
                        &mut ctx,
                        task::UpdateOptions {
                            id,
                            name,
                            status,
                            assign,
                            unassign,
                            end_date,
                            clear_end_date,
                            order,
                        },
                    )
                    .await
                }
                TaskCommands::Delete { id } => task::run_delete(&mut ctx, &id).await,
            },
            Commands::User(cmd) => match cmd {
                UserCommands::List => user::run_list(&mut ctx).await,
            },
        }
    }
}
