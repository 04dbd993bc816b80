//! Command output: aligned human text or a versioned JSON envelope.

use std::fmt;

use serde::Serialize;

use crate::error::{exit_codes, Error, Result};

pub const SCHEMA_VERSION: &str = "taskboard.v1";

const GLOBAL_VALUE_FLAGS: [&str; 3] = ["--config", "--api-url", "--events"];
const COMMAND_GROUPS: [&str; 3] = ["project", "task", "user"];

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

impl OutputOptions {
    /// Events on stdout take over the stream, so command output goes quiet.
    pub fn new(json: bool, quiet: bool, events_to_stdout: bool) -> Self {
        Self {
            json: json && !events_to_stdout,
            quiet: quiet || events_to_stdout,
        }
    }
}

/// Human-readable result of one command.
///
/// Renders as the header, an aligned `key: value` block, then the
/// non-empty `Details`, `Warnings` and `Next steps` lists.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

impl fmt::Display for HumanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header)?;

        if !self.summary.is_empty() {
            writeln!(f)?;
            let width = self.summary.iter().map(|(key, _)| key.len() + 1).max().unwrap_or(0);
            for (key, value) in &self.summary {
                let line = format!("  {:<width$} {value}", format!("{key}:"));
                write!(f, "\n{}", line.trim_end())?;
            }
        }

        let sections = [
            ("Details", &self.details),
            ("Warnings", &self.warnings),
            ("Next steps", &self.next_steps),
        ];
        for (title, items) in sections {
            if items.is_empty() {
                continue;
            }
            write!(f, "\n\n{title}:")?;
            for item in items {
                write!(f, "\n- {item}")?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    next_steps: &'a [String],
}

/// JSON envelope for a successful command.
pub fn success_json<T: Serialize>(
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<String> {
    let envelope = Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        status: "success",
        data: Some(data),
        error: None,
        warnings: human.map(|h| h.warnings.as_slice()).unwrap_or_default(),
        next_steps: human.map(|h| h.next_steps.as_slice()).unwrap_or_default(),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// JSON envelope for a failed command.
pub fn error_json(command: &str, err: &Error) -> Result<String> {
    let next_steps = error_next_steps(err);
    let envelope = Envelope::<()> {
        schema_version: SCHEMA_VERSION,
        command,
        status: "error",
        data: None,
        error: Some(ErrorBody {
            message: err.to_string(),
            code: err.exit_code(),
            kind: error_kind(err),
            details: err.details(),
        }),
        warnings: &[],
        next_steps: &next_steps,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        println!("{}", success_json(command, data, human)?);
    } else if let Some(human) = human.filter(|_| !options.quiet) {
        println!("{human}");
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    if json {
        println!("{}", error_json(command, err)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = error_next_steps(err).first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn infer_command_name_from_args() -> String {
    infer_command_name(std::env::args().skip(1))
}

/// `"<group> <subcommand>"` from raw arguments, skipping flags and the
/// values of global flags.
pub fn infer_command_name<I: IntoIterator<Item = String>>(args: I) -> String {
    let mut args = args.into_iter();
    let mut positional = Vec::with_capacity(2);
    while positional.len() < 2 {
        let Some(arg) = args.next() else { break };
        if GLOBAL_VALUE_FLAGS.contains(&arg.as_str()) {
            args.next();
        } else if !arg.starts_with('-') {
            positional.push(arg);
        }
    }

    match positional.as_slice() {
        [] => "taskboard".to_string(),
        [group, sub] if COMMAND_GROUPS.contains(&group.as_str()) => format!("{group} {sub}"),
        [command, ..] => command.clone(),
    }
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        exit_codes::USER_ERROR => "user_error",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    let step = match err {
        Error::InvalidConfig(_) => "fix .taskboard.toml or --api-url, then retry",
        Error::ConfigNotFound(_) => "drop --config to use defaults",
        Error::ProjectNotFound(_) => "taskboard project list",
        Error::TaskNotFound(_) => "taskboard task list",
        Error::Transport(_) | Error::OperationFailed(_) => {
            "check api.base_url or pass --api-url"
        }
        _ => return Vec::new(),
    };
    vec![step.to_string()]
}
