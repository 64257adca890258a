//! Bulk lead import: column contract, reconciliation of the backend's
//! per-row verdicts, and the upload state machine.
//!
//! The backend validates rows and detects duplicates (keyed on email and
//! phone). This module never re-validates rows; it only makes sure every
//! verdict the backend returned ends up in the [`ImportOutcome`] summary.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::wire;

// ── Column contract ──────────────────────────────────────────────────

/// Header names the backend parser requires, spelled exactly.
pub const REQUIRED_IMPORT_COLUMNS: &[&str] = &["Name", "Mobile", "Email"];

/// Header names the backend parser understands but does not require.
pub const OPTIONAL_IMPORT_COLUMNS: &[&str] = &[
    "Address",
    "Purpose",
    "Detail",
    "Extra_field1",
    "Extra_field2",
    "Extra_field3",
];

/// File extensions checked locally before upload.
pub const CSV_EXTENSIONS: &[&str] = &["csv"];

/// Split a CSV header line into trimmed column names (BOM and surrounding
/// quotes removed).
pub fn parse_csv_header(line: &str) -> Vec<String> {
    line.trim_start_matches('\u{feff}')
        .trim_end_matches(['\r', '\n'])
        .split(',')
        .map(|col| col.trim().trim_matches('"').trim().to_string())
        .collect()
}

/// Check that every required column is present. Names are case-sensitive.
pub fn validate_import_headers<S: AsRef<str>>(headers: &[S]) -> Result<(), CoreError> {
    let missing: Vec<&str> = REQUIRED_IMPORT_COLUMNS
        .iter()
        .copied()
        .filter(|required| !headers.iter().any(|h| AsRef::<str>::as_ref(h) == *required))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Import file is missing required column(s): {}",
            missing.join(", ")
        )))
    }
}

/// Columns the backend parser will ignore.
pub fn unknown_import_columns<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    headers
        .iter()
        .map(|h| AsRef::<str>::as_ref(h))
        .filter(|h| !h.is_empty())
        .filter(|h| !REQUIRED_IMPORT_COLUMNS.contains(h) && !OPTIONAL_IMPORT_COLUMNS.contains(h))
        .map(str::to_string)
        .collect()
}

// ── Row verdicts ─────────────────────────────────────────────────────

/// A row the backend rejected as a duplicate of an existing lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateRow {
    #[serde(default, deserialize_with = "wire::opt_id")]
    pub row: Option<i64>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub phone: Option<String>,
    #[serde(default, alias = "message")]
    pub reason: String,
}

impl From<String> for DuplicateRow {
    fn from(reason: String) -> Self {
        Self {
            row: None,
            email: None,
            phone: None,
            reason,
        }
    }
}

/// A row (or the whole file) the backend could not import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    #[serde(default, deserialize_with = "wire::opt_id")]
    pub row: Option<i64>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub field: Option<String>,
    #[serde(default, alias = "message", alias = "error")]
    pub reason: String,
}

impl From<String> for RowError {
    fn from(reason: String) -> Self {
        Self {
            row: None,
            field: None,
            reason,
        }
    }
}

/// Decode a verdict list entry by entry. Entries that are not the expected
/// object shape are kept with their raw text as the reason, so nothing the
/// backend reported disappears.
fn verdicts<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + From<String>,
{
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            Value::String(text) => T::from(text),
            other => serde_json::from_value(other.clone())
                .unwrap_or_else(|_| T::from(other.to_string())),
        })
        .collect())
}

/// Response body of the import endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    #[serde(default, deserialize_with = "wire::flag")]
    pub success: bool,
    #[serde(default, deserialize_with = "wire::opt_id")]
    pub imported: Option<i64>,
    #[serde(default, deserialize_with = "verdicts")]
    pub duplicates: Vec<DuplicateRow>,
    #[serde(default, deserialize_with = "verdicts")]
    pub errors: Vec<RowError>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub message: Option<String>,
}

// ── Outcome ──────────────────────────────────────────────────────────

/// How an import ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    /// Every reported row was imported.
    Success,
    /// Some rows were duplicates or errors. Informational, not a failure.
    Partial,
    /// Nothing was confirmed imported: the upload never reached the
    /// backend or the backend rejected the file as a whole.
    Failed,
}

/// Summary shown to the operator after an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub status: ImportStatus,
    pub imported_count: u64,
    pub duplicates: Vec<DuplicateRow>,
    pub errors: Vec<RowError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ImportOutcome {
    /// Rows covered by the summary: imported + duplicates + errors.
    pub fn accounted_rows(&self) -> u64 {
        self.imported_count + self.duplicates.len() as u64 + self.errors.len() as u64
    }

    /// Submitted rows the backend gave no verdict for.
    pub fn unaccounted_rows(&self, submitted: u64) -> u64 {
        submitted.saturating_sub(self.accounted_rows())
    }

    /// One-line breakdown, e.g. `"3 imported, 1 duplicate, 1 error"`.
    pub fn summary(&self) -> String {
        fn plural(n: usize, word: &str) -> String {
            if n == 1 {
                format!("{n} {word}")
            } else {
                format!("{n} {word}s")
            }
        }
        format!(
            "{} imported, {}, {}",
            self.imported_count,
            plural(self.duplicates.len(), "duplicate"),
            plural(self.errors.len(), "error"),
        )
    }
}

/// Turn a structured backend response into an outcome, verbatim.
///
/// If the backend reports failure without any row entries, its message is
/// kept as a synthetic error so the failure is visible in the breakdown.
pub fn reconcile(response: ImportResponse) -> ImportOutcome {
    let imported_count = response.imported.unwrap_or(0).max(0) as u64;
    let mut errors = response.errors;
    let duplicates = response.duplicates;

    let has_rows = !duplicates.is_empty() || !errors.is_empty();
    if !response.success && !has_rows {
        let reason = response
            .message
            .clone()
            .unwrap_or_else(|| "The server rejected the import file".to_string());
        errors.push(RowError::from(reason));
    }

    let status = if !response.success && imported_count == 0 && duplicates.is_empty() {
        ImportStatus::Failed
    } else if duplicates.is_empty() && errors.is_empty() {
        ImportStatus::Success
    } else {
        ImportStatus::Partial
    };

    tracing::info!(
        ?status,
        imported = imported_count,
        duplicates = duplicates.len(),
        errors = errors.len(),
        "Import reconciled"
    );

    ImportOutcome {
        status,
        imported_count,
        duplicates,
        errors,
        message: response.message,
    }
}

/// Outcome for an upload that got no response. Claims nothing imported.
pub fn transport_failure(description: impl Into<String>) -> ImportOutcome {
    ImportOutcome {
        status: ImportStatus::Failed,
        imported_count: 0,
        duplicates: Vec::new(),
        errors: vec![RowError::from(description.into())],
        message: None,
    }
}

// ── State machine ────────────────────────────────────────────────────

/// `Idle → Uploading → {Succeeded | Partial | Failed}`.
///
/// Terminal states may start a new upload; an upload may not start while
/// another is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportPhase {
    #[default]
    Idle,
    Uploading,
    Succeeded,
    Partial,
    Failed,
}

impl ImportPhase {
    pub fn is_uploading(&self) -> bool {
        matches!(self, Self::Uploading)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Partial | Self::Failed)
    }

    /// Enter `Uploading`.
    pub fn begin_upload(&mut self) -> Result<(), CoreError> {
        if self.is_uploading() {
            return Err(CoreError::Conflict(
                "An import is already in progress".to_string(),
            ));
        }
        *self = Self::Uploading;
        Ok(())
    }

    /// Leave `Uploading` according to the outcome.
    pub fn complete(&mut self, outcome: &ImportOutcome) -> Result<(), CoreError> {
        if !self.is_uploading() {
            return Err(CoreError::Internal(format!(
                "Cannot complete an import from state {self:?}"
            )));
        }
        *self = match outcome.status {
            ImportStatus::Success => Self::Succeeded,
            ImportStatus::Partial => Self::Partial,
            ImportStatus::Failed => Self::Failed,
        };
        Ok(())
    }

    /// The upload was dropped before an outcome arrived. Returns `true` if
    /// the phase moved to `Failed`; a settled phase is left alone.
    pub fn abandon(&mut self) -> bool {
        if !self.is_uploading() {
            return false;
        }
        *self = Self::Failed;
        true
    }
}

// ── Tests ────────────────────────────────────────────────────────────
