use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storefront session state passed explicitly into queries that depend on
/// who is browsing. Built by the caller from whatever it keeps per browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Lead identifier assigned after the first inquiry
    pub lead_id: Option<Uuid>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_lead(lead_id: Uuid) -> Self {
        Self {
            lead_id: Some(lead_id),
        }
    }
}
