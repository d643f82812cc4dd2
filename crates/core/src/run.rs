//! ETL run lifecycle types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Run status: `Running` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl std::str::FromStr for RunStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(Error::internal(format!("unknown run status: {other}"))),
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit record per pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlRun {
    pub run_id: i64,
    /// Provenance tag, e.g. "csv".
    pub source: String,
    pub job_name: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    /// Set once, on the terminal transition.
    pub finished_at: Option<DateTime<Utc>>,
    pub rows_extracted: i64,
    pub rows_loaded: i64,
    pub error_message: Option<String>,
}
