use std::{fmt, fs::OpenOptions, io, path::Path};

use anyhow::Context;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Export,
    Narration,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Export => "EXPORT",
            AuditAction::Narration => "NARRATION",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub at: OffsetDateTime,
    pub user: String,
    pub action: AuditAction,
    /// A reading id for narrations, the export path for exports.
    pub target: String,
}

#[derive(serde::Serialize)]
struct AuditRow<'a> {
    at: String,
    user: &'a str,
    action: &'static str,
    target: &'a str,
}

/// Record of who narrated or exported what. Owned by the caller; the engine
/// never sees it.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, user: &str, action: AuditAction, target: impl Into<String>) -> &AuditEntry {
        self.record_at(OffsetDateTime::now_utc(), user, action, target)
    }

    pub fn record_at(
        &mut self,
        at: OffsetDateTime,
        user: &str,
        action: AuditAction,
        target: impl Into<String>,
    ) -> &AuditEntry {
        let target = target.into();
        tracing::info!(user, action = %action, target = %target, "audit entry recorded");
        self.entries.push(AuditEntry {
            at,
            user: user.to_string(),
            action,
            target,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write entries as `at,user,action,target` rows.
    pub fn write_csv<W: io::Write>(&self, writer: W, with_headers: bool) -> anyhow::Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(with_headers)
            .from_writer(writer);

        for e in &self.entries {
            wtr.serialize(AuditRow {
                at: e.at.format(&Rfc3339)?,
                user: &e.user,
                action: e.action.as_str(),
                target: &e.target,
            })?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Append to an audit file, writing the header only when the file is new.
    pub fn append_to(&self, path: &Path) -> anyhow::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open audit log {}", path.display()))?;
        let is_new = file.metadata()?.len() == 0;
        self.write_csv(file, is_new)
    }
}
