//! Status-update action for a single lead.

use leadconsole_core::status_update::{StatusUpdate, StatusUpdateResponse};

use crate::backend::LeadBackend;
use crate::error::{ClientError, ClientResult};

/// Validate `update` locally, send it, and map a refusal to
/// [`ClientError::Rejected`] with the backend's per-field messages.
///
/// A 4xx reply whose body has the usual `{result, message, errors}` shape
/// is treated the same as a `result = false` reply.
pub async fn update_lead_status<B: LeadBackend + ?Sized>(
    backend: &B,
    update: &StatusUpdate,
) -> ClientResult<StatusUpdateResponse> {
    update.validate()?;

    let response = match backend.update_status(&update.to_payload()).await {
        Ok(response) => response,
        Err(ClientError::Api { status, body }) if (400..500).contains(&status) => {
            match serde_json::from_str::<StatusUpdateResponse>(&body) {
                Ok(response) if !response.result => response,
                _ => return Err(ClientError::Api { status, body }),
            }
        }
        Err(err) => return Err(err),
    };

    if !response.result {
        let field_errors = response.field_errors();
        tracing::warn!(
            lead_id = update.lead_id,
            fields = field_errors.len(),
            "Status update rejected"
        );
        return Err(ClientError::Rejected {
            message: response
                .message
                .unwrap_or_else(|| "The status could not be updated".to_string()),
            field_errors,
        });
    }

    tracing::info!(lead_id = update.lead_id, status = %update.status_name, "Lead status updated");
    Ok(response)
}
