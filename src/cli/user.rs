//! taskboard user command implementations.

use crate::error::{Error, Result};
use crate::model::User;
use crate::output::{emit_success, HumanOutput};

use super::CommandContext;

#[derive(serde::Serialize)]
struct UserListOutput {
    total: usize,
    users: Vec<User>,
}

pub async fn run_list(ctx: &mut CommandContext) -> Result<()> {
    let users = ctx.board.users();
    users.fetch_all().await;
    if let Some(message) = users.error() {
        return Err(Error::OperationFailed(message));
    }

    let listed = users.users();
    let mut human = HumanOutput::new(format!("Users ({})", listed.len()));
    for user in &listed {
        human.push_detail(format!("{} {}", user.id, user.name));
    }

    emit_success(
        ctx.output,
        "user list",
        &UserListOutput {
            total: listed.len(),
            users: listed,
        },
        Some(&human),
    )
}
