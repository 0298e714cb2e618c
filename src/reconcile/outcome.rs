use std::fmt;

use serde::Serialize;

use crate::reconcile::plan::Variant;
use crate::registry::repo_types::RegistryUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
    Present,
    Missing,
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Created => "created",
            Outcome::Updated => "updated",
            Outcome::Unchanged => "unchanged",
            Outcome::Present => "present",
            Outcome::Missing => "missing",
            Outcome::Failed => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub username: String,
    pub schema: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CandidateReport {
    pub fn new(user: &RegistryUser, outcome: Outcome) -> Self {
        Self {
            username: user.username.clone(),
            schema: user.schema_name.clone(),
            outcome,
            error: None,
        }
    }

    pub fn failed(user: &RegistryUser, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(user, Outcome::Failed)
        }
    }
}

/// Counts per outcome for one run, plus the individual reports.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub variant: Variant,
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub present: usize,
    pub missing: usize,
    pub failed: usize,
    pub reports: Vec<CandidateReport>,
}

impl Summary {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            total: 0,
            created: 0,
            updated: 0,
            unchanged: 0,
            present: 0,
            missing: 0,
            failed: 0,
            reports: Vec::new(),
        }
    }

    pub fn record(&mut self, report: CandidateReport) {
        self.total += 1;
        let counter = match report.outcome {
            Outcome::Created => &mut self.created,
            Outcome::Updated => &mut self.updated,
            Outcome::Unchanged => &mut self.unchanged,
            Outcome::Present => &mut self.present,
            Outcome::Missing => &mut self.missing,
            Outcome::Failed => &mut self.failed,
        };
        *counter += 1;
        self.reports.push(report);
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        match outcome {
            Outcome::Created => self.created,
            Outcome::Updated => self.updated,
            Outcome::Unchanged => self.unchanged,
            Outcome::Present => self.present,
            Outcome::Missing => self.missing,
            Outcome::Failed => self.failed,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Rows written during the run.
    pub fn writes(&self) -> usize {
        self.created + self.updated
    }
}
