use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrpOrderStatus {
    #[default]
    Pending,
    Producing,
    Finished,
    Failed,
    Revoked,
}

/// A CRP production order as reported by CRP.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CrpOrder {
    pub task_id: String,
    pub status: CrpOrderStatus,
    /// CRP refuses revocation once devices are being handed over.
    #[serde(default)]
    pub revocable: bool,
}

impl CrpOrder {
    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            CrpOrderStatus::Finished | CrpOrderStatus::Failed | CrpOrderStatus::Revoked
        )
    }

    pub fn should_revoke(&self) -> bool {
        !self.is_finished() && self.revocable
    }
}
