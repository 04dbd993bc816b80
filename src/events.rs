//! JSONL event stream for external integrations.
//!
//! `--events <path>` appends one JSON object per line to a file; `--events -`
//! writes them to stdout, in which case regular command output is suppressed.

use std::fs::OpenOptions;
use std::io::{self, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

pub const EVENT_SCHEMA_VERSION: &str = "taskboard.event.v1";

/// Board mutations reported on the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ProjectCreated,
    ProjectDeleted,
    ProjectStatusChanged,
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
}

#[derive(Serialize)]
struct EventLine<'a, T: Serialize> {
    schema_version: &'static str,
    event: EventKind,
    timestamp: DateTime<Utc>,
    data: &'a T,
}

pub struct EventSink {
    writer: Box<dyn Write + Send>,
    to_stdout: bool,
}

impl EventSink {
    /// Open the destination given to `--events`. Blank or absent means no sink.
    pub fn open(raw: Option<&str>) -> Result<Option<Self>> {
        let Some(target) = raw.map(str::trim).filter(|target| !target.is_empty()) else {
            return Ok(None);
        };
        if target == "-" {
            return Ok(Some(Self {
                writer: Box::new(io::stdout()),
                to_stdout: true,
            }));
        }
        let file = OpenOptions::new().create(true).append(true).open(target)?;
        Ok(Some(Self {
            writer: Box::new(file),
            to_stdout: false,
        }))
    }

    pub fn is_stdout(&self) -> bool {
        self.to_stdout
    }

    /// Write one event line and flush it.
    pub fn emit<T: Serialize>(&mut self, kind: EventKind, data: &T) -> Result<()> {
        let line = EventLine {
            schema_version: EVENT_SCHEMA_VERSION,
            event: kind,
            timestamp: Utc::now(),
            data,
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_destination_means_no_sink() -> Result<()> {
        assert!(EventSink::open(None)?.is_none());
        assert!(EventSink::open(Some("   "))?.is_none());
        assert!(EventSink::open(Some("-"))?.is_some_and(|sink| sink.is_stdout()));
        Ok(())
    }

    #[test]
    fn file_sink_appends_one_line_per_event() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("events.jsonl");
        let raw = path.to_string_lossy().into_owned();

        let mut sink = EventSink::open(Some(&raw))?.expect("file sink");
        assert!(!sink.is_stdout());
        sink.emit(EventKind::TaskCreated, &json!({ "id": "t1" }))?;
        drop(sink);

        // Reopening appends rather than truncating.
        let mut sink = EventSink::open(Some(&raw))?.expect("file sink");
        sink.emit(
            EventKind::ProjectStatusChanged,
            &json!({ "project_id": "p1", "from": "new", "to": "in-progress" }),
        )?;

        let contents = std::fs::read_to_string(&path)?;
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(serde_json::from_str)
            .collect::<std::result::Result<_, _>>()?;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["schema_version"], EVENT_SCHEMA_VERSION);
        assert_eq!(lines[0]["event"], "task_created");
        assert_eq!(lines[0]["data"]["id"], "t1");
        assert_eq!(lines[1]["event"], "project_status_changed");
        assert_eq!(lines[1]["data"]["to"], "in-progress");
        Ok(())
    }
}
