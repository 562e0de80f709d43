use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle of a single attendance row. Stored lowercase in MySQL.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RecordStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl RecordStatus {
    /// Approved and Rejected are final for a submission; a new submission
    /// starts over with fresh Draft rows.
    pub fn is_terminal(self) -> bool {
        matches!(self, RecordStatus::Approved | RecordStatus::Rejected)
    }

    // Dominance order for a mixed-status month. Any rejected day flags the
    // whole month, any pending day means review is still owed, and Approved
    // only wins when every row agrees.
    fn rank(self) -> u8 {
        match self {
            RecordStatus::Rejected => 3,
            RecordStatus::Pending => 2,
            RecordStatus::Draft => 1,
            RecordStatus::Approved => 0,
        }
    }

    /// Derive the aggregate status of a set of rows. `None` for an empty set.
    pub fn dominant(statuses: impl IntoIterator<Item = RecordStatus>) -> Option<RecordStatus> {
        statuses.into_iter().max_by_key(|s| s.rank())
    }
}

/// What a day's row represents. Zero-hour rows are disambiguated by this.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EntryType {
    Work,
    Leave,
    Holiday,
}

/// Review lifecycle shared by leave requests and the generalized approval feed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}
