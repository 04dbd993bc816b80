//! taskboard task command implementations.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{Error, Result};
use crate::events::EventKind;
use crate::model::{NewTask, Task, TaskPatch, TaskStatus};
use crate::output::{emit_success, HumanOutput};
use crate::store::SyncOutcome;
use crate::sync::ProjectSync;

use super::CommandContext;

pub struct ListOptions {
    pub project: Option<String>,
    pub status: Option<String>,
}

pub struct NewOptions {
    pub project: String,
    pub name: String,
    pub status: String,
    pub assign: Option<String>,
    pub end_date: Option<String>,
    pub order: Option<i64>,
}

pub struct UpdateOptions {
    pub id: String,
    pub name: Option<String>,
    pub status: Option<String>,
    pub assign: Option<String>,
    pub unassign: bool,
    pub end_date: Option<String>,
    pub clear_end_date: bool,
    pub order: Option<i64>,
}

#[derive(serde::Serialize)]
struct TaskListOutput {
    total: usize,
    tasks: Vec<Task>,
}

#[derive(serde::Serialize)]
struct TaskChangeOutput {
    task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_sync: Option<ProjectSync>,
}

pub async fn run_list(ctx: &mut CommandContext, options: ListOptions) -> Result<()> {
    let status = options
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()?;

    ctx.board.load().await;
    ctx.ensure_loaded()?;

    let tasks = ctx.board.tasks();
    let mut listed = match (options.project.as_deref(), status) {
        (Some(project), Some(status)) => tasks.tasks_by_project_and_status(project, status),
        (Some(project), None) => tasks.tasks_by_project(project),
        (None, _) => tasks.tasks(),
    };
    if let (None, Some(status)) = (options.project.as_deref(), status) {
        listed.retain(|task| task.status == status);
    }

    let mut human = HumanOutput::new(format!("Tasks ({})", listed.len()));
    for task in &listed {
        human.push_detail(format_task(ctx, task));
    }

    emit_success(
        ctx.output,
        "task list",
        &TaskListOutput {
            total: listed.len(),
            tasks: listed,
        },
        Some(&human),
    )
}

pub async fn run_new(ctx: &mut CommandContext, options: NewOptions) -> Result<()> {
    let name = options.name.trim();
    if name.is_empty() {
        return Err(Error::InvalidArgument("task name cannot be empty".to_string()));
    }
    let status: TaskStatus = options.status.parse()?;
    let end_date = options.end_date.as_deref().map(parse_end_date).transpose()?;

    ctx.board.load().await;
    ctx.ensure_loaded()?;
    if ctx.board.projects().get_by_id(&options.project).is_none() {
        return Err(Error::ProjectNotFound(options.project));
    }
    if let Some(user_id) = options.assign.as_deref() {
        ensure_user(ctx, user_id)?;
    }

    let mut new_task = NewTask::new(options.project, name).with_status(status);
    new_task.assigned_to = options.assign;
    new_task.end_date = end_date;
    new_task.order = options.order;

    let task = ctx.board.tasks().create(new_task).await?;
    let output = TaskChangeOutput {
        project_sync: ctx.board.synchronizer().last_outcome(),
        task,
    };
    let event_warning = ctx.emit_event(EventKind::TaskCreated, &output.task);

    let mut human = HumanOutput::new("Task created");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    push_task_summary(&mut human, &output.task);
    push_sync_result(ctx, &mut human, output.project_sync.as_ref());

    emit_success(ctx.output, "task new", &output, Some(&human))
}

pub async fn run_update(ctx: &mut CommandContext, options: UpdateOptions) -> Result<()> {
    let patch = build_patch(&options)?;
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to update (pass --name, --status, --assign, ...)".to_string(),
        ));
    }

    ctx.board.load().await;
    ctx.ensure_loaded()?;
    if let Some(Some(user_id)) = patch.assigned_to.as_ref() {
        ensure_user(ctx, user_id)?;
    }

    let task = ctx
        .board
        .tasks()
        .update(&options.id, patch)
        .await?
        .ok_or_else(|| Error::TaskNotFound(options.id.clone()))?;
    let output = TaskChangeOutput {
        project_sync: ctx.board.synchronizer().last_outcome(),
        task,
    };
    let event_warning = ctx.emit_event(EventKind::TaskUpdated, &output.task);

    let mut human = HumanOutput::new("Task updated");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    push_task_summary(&mut human, &output.task);
    push_sync_result(ctx, &mut human, output.project_sync.as_ref());

    emit_success(ctx.output, "task update", &output, Some(&human))
}

pub async fn run_delete(ctx: &mut CommandContext, id: &str) -> Result<()> {
    ctx.board.load().await;
    ctx.ensure_loaded()?;

    let task = ctx
        .board
        .tasks()
        .delete(id)
        .await?
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
    let output = TaskChangeOutput {
        project_sync: ctx.board.synchronizer().last_outcome(),
        task,
    };
    let event_warning = ctx.emit_event(EventKind::TaskDeleted, &output.task);

    let mut human = HumanOutput::new("Task deleted");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", output.task.id.clone());
    push_sync_result(ctx, &mut human, output.project_sync.as_ref());

    emit_success(ctx.output, "task delete", &output, Some(&human))
}

fn build_patch(options: &UpdateOptions) -> Result<TaskPatch> {
    let name = match options.name.as_deref().map(str::trim) {
        Some("") => {
            return Err(Error::InvalidArgument(
                "task name cannot be empty".to_string(),
            ))
        }
        other => other.map(str::to_string),
    };
    let status = options
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()?;
    let assigned_to = if options.unassign {
        Some(None)
    } else {
        options.assign.clone().map(Some)
    };
    let end_date = if options.clear_end_date {
        Some(None)
    } else {
        options
            .end_date
            .as_deref()
            .map(parse_end_date)
            .transpose()?
            .map(Some)
    };

    Ok(TaskPatch {
        project_id: None,
        name,
        status,
        assigned_to,
        end_date,
        order: options.order,
    })
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
fn parse_end_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|err| Error::InvalidArgument(format!("invalid end date '{raw}': {err}")))
}

fn ensure_user(ctx: &CommandContext, user_id: &str) -> Result<()> {
    if ctx.board.users().get_by_id(user_id).is_none() {
        return Err(Error::InvalidArgument(format!("unknown user: {user_id}")));
    }
    Ok(())
}

fn assignee_name(ctx: &CommandContext, task: &Task) -> Option<String> {
    let user_id = task.assigned_to.as_deref()?;
    Some(
        ctx.board
            .users()
            .get_by_id(user_id)
            .map(|user| user.name)
            .unwrap_or_else(|| user_id.to_string()),
    )
}

fn format_task(ctx: &CommandContext, task: &Task) -> String {
    let mut line = format!(
        "{} [{}] {} (project {})",
        task.id, task.status, task.name, task.project_id
    );
    if let Some(name) = assignee_name(ctx, task) {
        line.push_str(&format!(", assigned to {name}"));
    }
    if let Some(end_date) = task.end_date {
        line.push_str(&format!(", due {}", end_date.format("%Y-%m-%d")));
    }
    line
}

fn push_task_summary(human: &mut HumanOutput, task: &Task) {
    human.push_summary("ID", task.id.clone());
    human.push_summary("Project", task.project_id.clone());
    human.push_summary("Name", task.name.clone());
    human.push_summary("Status", task.status.to_string());
    if let Some(user_id) = task.assigned_to.as_ref() {
        human.push_summary("Assigned to", user_id.clone());
    }
    if let Some(end_date) = task.end_date {
        human.push_summary("Due", end_date.format("%Y-%m-%d").to_string());
    }
}

fn push_sync_result(ctx: &mut CommandContext, human: &mut HumanOutput, sync: Option<&ProjectSync>) {
    let Some(sync) = sync else {
        return;
    };
    match &sync.outcome {
        SyncOutcome::Updated { from, to } => {
            human.push_detail(format!("project {}: {from} -> {to}", sync.project_id));
            if let Some(warning) = ctx.emit_event(EventKind::ProjectStatusChanged, sync) {
                human.push_warning(warning);
            }
        }
        SyncOutcome::Failed { status, message } => {
            human.push_warning(format!(
                "project {} kept status {status}: {message}",
                sync.project_id
            ));
            human.push_next_step(format!("taskboard project sync {}", sync.project_id));
        }
        SyncOutcome::Unchanged { .. } | SyncOutcome::Missing => {}
    }
}
