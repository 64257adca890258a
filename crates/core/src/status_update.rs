//! Lead status updates (status, activity, follow-up scheduling).
//!
//! [`StatusUpdate::validate`] catches the mistakes the backend would reject
//! anyway, before a request is sent. The wire form encodes booleans as
//! `0`/`1` and absent values as empty strings.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::LeadId;
use crate::wire;

/// Mobile numbers: optional leading `+`, then 7 to 15 digits.
static MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("valid regex"));

/// Wire format of follow-up dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Wire format of call start/end times.
pub const TIME_FORMAT: &str = "%H:%M";

/// Maximum length of a follow-up remark.
const MAX_REMARK_LEN: usize = 1000;

/// A status change for one lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub lead_id: LeadId,
    pub status_name: String,
    pub activity_name: Option<String>,
    pub followup: bool,
    pub followup_remark: Option<String>,
    pub followup_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub mobile_no: Option<String>,
    pub is_client: bool,
}

impl StatusUpdate {
    pub fn new(lead_id: LeadId, status_name: impl Into<String>) -> Self {
        Self {
            lead_id,
            status_name: status_name.into(),
            activity_name: None,
            followup: false,
            followup_remark: None,
            followup_date: None,
            start_time: None,
            end_time: None,
            mobile_no: None,
            is_client: false,
        }
    }

    /// Schedule a follow-up.
    pub fn with_followup(mut self, date: NaiveDate, remark: impl Into<String>) -> Self {
        self.followup = true;
        self.followup_date = Some(date);
        self.followup_remark = Some(remark.into());
        self
    }

    pub fn with_call_window(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    /// Validate the update.
    ///
    /// Rules:
    /// - The status name must not be blank.
    /// - A follow-up requires a date.
    /// - The remark must not exceed `MAX_REMARK_LEN` characters.
    /// - A mobile number, if given, must be 7-15 digits with an optional `+`.
    /// - If both call times are given, start must not be after end.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.status_name.trim().is_empty() {
            return Err(CoreError::Validation("Status is required".to_string()));
        }
        if self.followup && self.followup_date.is_none() {
            return Err(CoreError::Validation(
                "A follow-up date is required when follow-up is enabled".to_string(),
            ));
        }
        if self
            .followup_remark
            .as_deref()
            .is_some_and(|r| r.chars().count() > MAX_REMARK_LEN)
        {
            return Err(CoreError::Validation(format!(
                "Follow-up remark must not exceed {MAX_REMARK_LEN} characters"
            )));
        }
        if let Some(mobile) = self.mobile_no.as_deref() {
            let compact: String = mobile.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
            if !MOBILE_RE.is_match(&compact) {
                return Err(CoreError::Validation(format!(
                    "'{mobile}' is not a valid mobile number"
                )));
            }
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start > end {
                return Err(CoreError::Validation(
                    "Start time must not be after end time".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The request body sent to the backend.
    pub fn to_payload(&self) -> StatusUpdatePayload {
        let text = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or_default().to_string();
        StatusUpdatePayload {
            lead_id: self.lead_id,
            followup: u8::from(self.followup),
            followup_remark: text(&self.followup_remark),
            followup_date: self
                .followup_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            status_name: self.status_name.trim().to_string(),
            activity_name: text(&self.activity_name),
            start_time: self
                .start_time
                .map(|t| t.format(TIME_FORMAT).to_string())
                .unwrap_or_default(),
            end_time: self
                .end_time
                .map(|t| t.format(TIME_FORMAT).to_string())
                .unwrap_or_default(),
            mobile_no: text(&self.mobile_no),
            is_client: u8::from(self.is_client),
        }
    }
}

/// Wire form of [`StatusUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdatePayload {
    pub lead_id: LeadId,
    pub followup: u8,
    pub followup_remark: String,
    pub followup_date: String,
    pub status_name: String,
    pub activity_name: String,
    pub start_time: String,
    pub end_time: String,
    pub mobile_no: String,
    pub is_client: u8,
}

/// A backend validation message tied to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Reply of the status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateResponse {
    #[serde(default, deserialize_with = "wire::flag")]
    pub result: bool,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<Value>,
}

impl StatusUpdateResponse {
    pub fn field_errors(&self) -> Vec<FieldError> {
        self.errors.as_ref().map(parse_field_errors).unwrap_or_default()
    }
}

/// Flatten the shapes backends use for field errors:
/// `{"field": ["msg", ...]}`, `{"field": "msg"}`, or
/// `[{"field": ..., "message": ...}]`.
pub fn parse_field_errors(errors: &Value) -> Vec<FieldError> {
    let as_text = |v: &Value| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    match errors {
        Value::Object(map) => map
            .iter()
            .flat_map(|(field, messages)| {
                let messages: Vec<String> = match messages {
                    Value::Array(items) => items.iter().map(as_text).collect(),
                    other => vec![as_text(other)],
                };
                messages.into_iter().map(move |message| FieldError {
                    field: field.clone(),
                    message,
                })
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| FieldError {
                field: item.get("field").map(as_text).unwrap_or_default(),
                message: item
                    .get("message")
                    .map(as_text)
                    .unwrap_or_else(|| as_text(item)),
            })
            .collect(),
        Value::Null => Vec::new(),
        other => vec![FieldError {
            field: String::new(),
            message: as_text(other),
        }],
    }
}
