//! taskboard project command implementations.

use crate::board::ProjectSummary;
use crate::error::{Error, Result};
use crate::events::EventKind;
use crate::model::{NewProject, Project, Task};
use crate::output::{emit_success, HumanOutput};
use crate::store::SyncOutcome;
use crate::sync::ProjectSync;

use super::CommandContext;

pub struct NewOptions {
    pub name: String,
    pub description: Option<String>,
}

#[derive(serde::Serialize)]
struct ProjectListOutput {
    total: usize,
    projects: Vec<ProjectSummary>,
}

#[derive(serde::Serialize)]
struct ProjectShowOutput {
    #[serde(flatten)]
    summary: ProjectSummary,
    tasks: Vec<Task>,
}

#[derive(serde::Serialize)]
struct ProjectDeleteOutput {
    id: String,
    deleted: bool,
}

#[derive(serde::Serialize)]
struct ProjectSyncOutput {
    updated: usize,
    projects: Vec<ProjectSync>,
}

pub async fn run_list(ctx: &mut CommandContext) -> Result<()> {
    ctx.board.load().await;
    ctx.ensure_loaded()?;

    let projects = ctx.board.project_summaries();
    let mut human = HumanOutput::new(format!("Projects ({})", projects.len()));
    let mut drifted = 0;
    for summary in &projects {
        human.push_detail(format_summary(summary));
        if summary.is_drifted() {
            drifted += 1;
        }
    }
    if drifted > 0 {
        human.push_warning(format!(
            "{drifted} project(s) have a status that does not match their tasks"
        ));
        human.push_next_step("taskboard project sync");
    }

    emit_success(
        ctx.output,
        "project list",
        &ProjectListOutput {
            total: projects.len(),
            projects,
        },
        Some(&human),
    )
}

pub async fn run_show(ctx: &mut CommandContext, id: &str) -> Result<()> {
    ctx.board.load().await;
    ctx.ensure_loaded()?;

    let summary = ctx
        .board
        .project_summaries()
        .into_iter()
        .find(|summary| summary.project.id == id)
        .ok_or_else(|| Error::ProjectNotFound(id.to_string()))?;
    let tasks = ctx.board.tasks().tasks_by_project(id);

    let mut human = HumanOutput::new(format!("Project {}", summary.project.name));
    push_project_summary(&mut human, &summary.project);
    human.push_summary("Tasks", summary.task_count.to_string());
    for task in &tasks {
        human.push_detail(format!("{} [{}] {}", task.id, task.status, task.name));
    }
    if summary.is_drifted() {
        human.push_warning(format!(
            "tasks imply status '{}'",
            summary.derived_status
        ));
        human.push_next_step(format!("taskboard project sync {id}"));
    }

    emit_success(
        ctx.output,
        "project show",
        &ProjectShowOutput { summary, tasks },
        Some(&human),
    )
}

pub async fn run_new(ctx: &mut CommandContext, options: NewOptions) -> Result<()> {
    let name = options.name.trim();
    if name.is_empty() {
        return Err(Error::InvalidArgument(
            "project name cannot be empty".to_string(),
        ));
    }
    let description = options
        .description
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    let project = ctx
        .board
        .projects()
        .create(NewProject::new(name, description))
        .await?;
    let event_warning = ctx.emit_event(EventKind::ProjectCreated, &project);

    let mut human = HumanOutput::new("Project created");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    push_project_summary(&mut human, &project);
    human.push_next_step(format!("taskboard task new {} <name>", project.id));

    emit_success(ctx.output, "project new", &project, Some(&human))
}

pub async fn run_delete(ctx: &mut CommandContext, id: &str) -> Result<()> {
    ctx.board.projects().fetch_all().await;
    ctx.ensure_loaded()?;
    if ctx.board.projects().get_by_id(id).is_none() {
        return Err(Error::ProjectNotFound(id.to_string()));
    }

    ctx.board.projects().delete(id).await?;
    let output = ProjectDeleteOutput {
        id: id.to_string(),
        deleted: true,
    };
    let event_warning = ctx.emit_event(EventKind::ProjectDeleted, &output);

    let mut human = HumanOutput::new("Project deleted");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", id);

    emit_success(ctx.output, "project delete", &output, Some(&human))
}

pub async fn run_sync(ctx: &mut CommandContext, id: Option<&str>) -> Result<()> {
    ctx.board.load().await;
    ctx.ensure_loaded()?;

    let results = match id {
        Some(id) => {
            if ctx.board.projects().get_by_id(id).is_none() {
                return Err(Error::ProjectNotFound(id.to_string()));
            }
            let tasks = ctx.board.tasks().tasks_by_project(id);
            let outcome = ctx.board.projects().sync_project_status(id, &tasks).await;
            vec![ProjectSync {
                project_id: id.to_string(),
                outcome,
            }]
        }
        None => ctx.board.reconcile_all().await,
    };

    let mut human = HumanOutput::new("Project status sync");
    let mut updated = 0;
    for result in &results {
        match &result.outcome {
            SyncOutcome::Updated { from, to } => {
                updated += 1;
                human.push_detail(format!("{}: {from} -> {to}", result.project_id));
                if let Some(warning) = ctx.emit_event(EventKind::ProjectStatusChanged, result) {
                    human.push_warning(warning);
                }
            }
            SyncOutcome::Unchanged { status } => {
                human.push_detail(format!("{}: {status} (unchanged)", result.project_id));
            }
            SyncOutcome::Failed { status, message } => {
                human.push_warning(format!(
                    "{}: kept {status}, update failed: {message}",
                    result.project_id
                ));
            }
            SyncOutcome::Missing => {}
        }
    }
    human.push_summary("Checked", results.len().to_string());
    human.push_summary("Updated", updated.to_string());

    emit_success(
        ctx.output,
        "project sync",
        &ProjectSyncOutput {
            updated,
            projects: results,
        },
        Some(&human),
    )
}

fn push_project_summary(human: &mut HumanOutput, project: &Project) {
    human.push_summary("ID", project.id.clone());
    human.push_summary("Name", project.name.clone());
    human.push_summary("Status", project.status.to_string());
    if let Some(description) = project.description.as_ref() {
        human.push_summary("Description", description.clone());
    }
    human.push_summary("Created", project.created_at.format("%Y-%m-%d").to_string());
}

fn format_summary(summary: &ProjectSummary) -> String {
    let mut line = format!(
        "{} [{}] {} ({} tasks)",
        summary.project.id, summary.project.status, summary.project.name, summary.task_count
    );
    if summary.is_drifted() {
        line.push_str(&format!(" - tasks imply {}", summary.derived_status));
    }
    line
}
