//! Import action: upload a lead file and reconcile the backend's verdicts.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use leadconsole_core::import::{
    parse_csv_header, reconcile, transport_failure, unknown_import_columns,
    validate_import_headers, ImportOutcome, ImportPhase, ImportResponse, CSV_EXTENSIONS,
};
use leadconsole_core::types::CampaignId;

use crate::backend::LeadBackend;
use crate::error::{ClientError, ClientResult};
use crate::models::ImportUpload;

const TRANSPORT_FAILURE: &str = "Could not reach the server, nothing was imported";

pub struct ImportService<B: LeadBackend + ?Sized> {
    backend: Arc<B>,
    phase: Mutex<ImportPhase>,
}

impl<B: LeadBackend + ?Sized> ImportService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            phase: Mutex::new(ImportPhase::Idle),
        }
    }

    pub fn phase(&self) -> ImportPhase {
        *lock_phase(&self.phase)
    }

    /// Read `path` and import it into `campaign_id`.
    pub async fn import_file(
        &self,
        path: impl AsRef<Path>,
        campaign_id: CampaignId,
    ) -> ClientResult<ImportOutcome> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("leads.csv")
            .to_string();
        self.import(ImportUpload {
            file_name,
            bytes,
            campaign_id,
        })
        .await
    }

    /// Upload a file already in memory.
    ///
    /// Errors are returned only for problems caught before the upload
    /// (missing CSV columns, an import already running). Once the upload
    /// starts, every failure becomes a `Failed` outcome. If this future is
    /// dropped mid-upload the phase moves to `Failed`, so the import can be
    /// submitted again.
    pub async fn import(&self, upload: ImportUpload) -> ClientResult<ImportOutcome> {
        check_csv_header(&upload)?;
        let upload_guard = UploadGuard::begin(&self.phase)?;

        tracing::info!(
            file = %upload.file_name,
            bytes = upload.bytes.len(),
            campaign_id = upload.campaign_id,
            "Uploading lead import"
        );
        let outcome = match self.backend.import_leads(&upload).await {
            Ok(response) => reconcile(response),
            Err(err) => outcome_for_error(err),
        };

        upload_guard.complete(&outcome)?;
        Ok(outcome)
    }
}

fn lock_phase(phase: &Mutex<ImportPhase>) -> MutexGuard<'_, ImportPhase> {
    phase.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the phase in `Uploading`. Dropping it before
/// [`complete`](Self::complete) marks the upload as abandoned.
struct UploadGuard<'a> {
    phase: &'a Mutex<ImportPhase>,
}

impl<'a> UploadGuard<'a> {
    fn begin(phase: &'a Mutex<ImportPhase>) -> ClientResult<Self> {
        lock_phase(phase).begin_upload()?;
        Ok(Self { phase })
    }

    fn complete(self, outcome: &ImportOutcome) -> ClientResult<()> {
        lock_phase(self.phase).complete(outcome)?;
        Ok(())
    }
}

impl Drop for UploadGuard<'_> {
    fn drop(&mut self) {
        if lock_phase(self.phase).abandon() {
            tracing::warn!("Lead import abandoned before the server answered");
        }
    }
}

/// For CSV files, make sure the required columns are present before
/// anything is sent. Other formats are left to the backend parser.
fn check_csv_header(upload: &ImportUpload) -> ClientResult<()> {
    let is_csv = upload
        .extension()
        .is_some_and(|ext| CSV_EXTENSIONS.contains(&ext.as_str()));
    if !is_csv {
        return Ok(());
    }

    let text = String::from_utf8_lossy(&upload.bytes);
    let headers = parse_csv_header(text.lines().next().unwrap_or_default());
    validate_import_headers(&headers)?;

    let unknown = unknown_import_columns(&headers);
    if !unknown.is_empty() {
        tracing::debug!(?unknown, "Import file has columns the backend will ignore");
    }
    Ok(())
}

fn outcome_for_error(err: ClientError) -> ImportOutcome {
    if let ClientError::Api { status, body } = &err {
        // Only validation failures carry a structured import body; 5xx
        // bodies are never shown.
        if (400..500).contains(status) {
            if let Ok(response) = serde_json::from_str::<ImportResponse>(body) {
                tracing::warn!(status, "Import rejected with a structured response");
                return reconcile(response);
            }
        }
    }
    if err.is_transport() {
        tracing::error!(error = %err, "Import upload failed");
        return transport_failure(TRANSPORT_FAILURE);
    }
    transport_failure(err.user_message())
}
