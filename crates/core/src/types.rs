/// Backend primary keys are integer ids.
pub type DbId = i64;

pub type LeadId = DbId;
pub type UserId = DbId;
pub type CampaignId = DbId;
pub type StatusId = DbId;
pub type TeamId = DbId;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
