//! 异步任务：Pending → In Progress → Finished / Canceled。
//!
//! Asynchronous job state machine.
//!
//! A task only moves when the caller asks: [`Task::update`] refetches it by
//! `job_id` and replaces the whole field set, [`Task::cancel`] asks the service
//! to cancel it. Nothing polls in the background.

use super::{resolve_result, FromPayload, ResourceKind};
use crate::client::Client;
use crate::types::Outcome;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress", alias = "InProgress")]
    InProgress,
    Finished,
    Canceled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Finished => "Finished",
            TaskStatus::Canceled => "Canceled",
        }
    }

    /// Finished and Canceled never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Finished | TaskStatus::Canceled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Pending" => Ok(TaskStatus::Pending),
            "In Progress" | "InProgress" => Ok(TaskStatus::InProgress),
            "Finished" => Ok(TaskStatus::Finished),
            "Canceled" => Ok(TaskStatus::Canceled),
            other => Err(Error::validation_with_context(
                format!("unknown task status '{}'", other),
                ErrorContext::new()
                    .with_field_path("task.status")
                    .with_source("task"),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TaskPayload {
    #[serde(default)]
    job_id: Option<String>,
    #[serde(default)]
    status: Option<TaskStatus>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    is_encrypted: Option<bool>,
    #[serde(default)]
    is_canceled: Option<bool>,
    #[serde(default)]
    callback_param: Option<Value>,
    #[serde(default)]
    predictions: Option<Value>,
    #[serde(default)]
    evaluations: Option<Value>,
    #[serde(default)]
    monitors: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// A job the service runs asynchronously, tracked by `job_id`.
#[derive(Debug, Clone)]
pub struct Task {
    job_id: String,
    status: TaskStatus,
    success: Option<bool>,
    error: Option<Value>,
    is_encrypted: bool,
    is_canceled: Option<bool>,
    callback_param: Option<Value>,
    predictions: Option<Value>,
    evaluations: Option<Value>,
    monitors: Option<Value>,
    extra: Map<String, Value>,
    client: Client,
}

impl FromPayload for Task {
    const KIND: ResourceKind = ResourceKind::Task;

    fn from_payload(payload: Map<String, Value>, client: &Client) -> Result<Self> {
        let p: TaskPayload = serde_json::from_value(Value::Object(payload))?;
        let job_id = p
            .job_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::missing_field("job_id", "task"))?;
        let status = p.status.unwrap_or_default();
        let is_encrypted = p.is_encrypted.unwrap_or(false);

        // Results are only exposed for a successful finish; anything else
        // (including encrypted bytes of a failed run) stays hidden.
        let (predictions, evaluations, monitors) =
            if status == TaskStatus::Finished && p.success == Some(true) {
                (
                    resolve_result(p.predictions, is_encrypted, client)?,
                    resolve_result(p.evaluations, is_encrypted, client)?,
                    resolve_result(p.monitors, is_encrypted, client)?,
                )
            } else {
                (None, None, None)
            };

        Ok(Self {
            job_id,
            status,
            success: p.success,
            error: p.error,
            is_encrypted,
            is_canceled: p.is_canceled,
            callback_param: p.callback_param,
            predictions,
            evaluations,
            monitors,
            extra: p.extra,
            client: client.clone(),
        })
    }
}

impl Task {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn current_status(&self) -> TaskStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn success(&self) -> Option<bool> {
        self.success
    }

    pub fn error(&self) -> Option<&Value> {
        self.error.as_ref()
    }

    pub fn is_encrypted(&self) -> bool {
        self.is_encrypted
    }

    pub fn is_canceled(&self) -> Option<bool> {
        self.is_canceled
    }

    pub fn callback_param(&self) -> Option<&Value> {
        self.callback_param.as_ref()
    }

    pub fn predictions(&self) -> Option<&Value> {
        self.predictions.as_ref()
    }

    pub fn evaluations(&self) -> Option<&Value> {
        self.evaluations.as_ref()
    }

    pub fn monitors(&self) -> Option<&Value> {
        self.monitors.as_ref()
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Refetch the task and replace every field with the fresh state.
    ///
    /// Returns `false`, leaving the task untouched, when the fetch failed with a
    /// recorded HTTP error.
    pub fn update(&mut self) -> Result<bool> {
        match self.client.get_task_result(&self.job_id)? {
            Outcome::Resource(fresh) => {
                info!(
                    job_id = %self.job_id,
                    from = %self.status,
                    to = %fresh.status,
                    "task refreshed"
                );
                *self = fresh;
                Ok(true)
            }
            Outcome::Text(_) | Outcome::Failed => Ok(false),
        }
    }

    /// Ask the service to cancel the job. Returns whether it confirmed.
    pub fn cancel(&mut self) -> Result<bool> {
        let answer = match self.client.cancel_task(&self.job_id)? {
            Outcome::Resource(task) => task,
            Outcome::Text(_) | Outcome::Failed => return Ok(false),
        };

        self.status = answer.status;
        self.is_canceled = answer.is_canceled;
        if !(self.status == TaskStatus::Finished && self.success == Some(true)) {
            self.predictions = None;
            self.evaluations = None;
            self.monitors = None;
        }

        let confirmed = answer.is_canceled.unwrap_or(false);
        info!(job_id = %self.job_id, status = %self.status, confirmed, "task cancel requested");
        Ok(confirmed)
    }
}
