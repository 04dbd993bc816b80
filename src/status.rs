//! Project status derivation.
//!
//! A project's status is a pure function of its tasks:
//!
//! | tasks                          | project status |
//! |--------------------------------|----------------|
//! | none                           | `new`          |
//! | any `in-progress`              | `in-progress`  |
//! | all `done`                     | `completed`    |
//! | all `new`                      | `new`          |
//! | mixed `new`/`done`             | `in-progress`  |

use std::borrow::{Borrow, Cow};

use crate::model::{Project, ProjectStatus, Task, TaskStatus};

/// Derive the aggregate project status for a set of tasks.
///
/// Order of the input does not matter.
pub fn derive_status<I, T>(tasks: I) -> ProjectStatus
where
    I: IntoIterator<Item = T>,
    T: Borrow<Task>,
{
    let mut total = 0usize;
    let mut done = 0usize;
    let mut fresh = 0usize;

    for task in tasks {
        total += 1;
        match task.borrow().status {
            TaskStatus::InProgress => return ProjectStatus::InProgress,
            TaskStatus::Done => done += 1,
            TaskStatus::New => fresh += 1,
        }
    }

    if total == 0 || fresh == total {
        ProjectStatus::New
    } else if done == total {
        ProjectStatus::Completed
    } else {
        ProjectStatus::InProgress
    }
}

/// Bring `project.status` in line with `tasks`.
///
/// Returns the input borrowed when nothing changes, otherwise an owned copy
/// with only `status` replaced.
pub fn reconcile<'a, I, T>(project: &'a Project, tasks: I) -> Cow<'a, Project>
where
    I: IntoIterator<Item = T>,
    T: Borrow<Task>,
{
    let status = derive_status(tasks);
    if status == project.status {
        Cow::Borrowed(project)
    } else {
        Cow::Owned(project.with_status(status))
    }
}
