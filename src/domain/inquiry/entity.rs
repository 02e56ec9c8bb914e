use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchase inquiry submitted from the storefront.
/// Vehicles listed in an inquiry count as reserved for the submitting lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: Uuid,

    /// Lead identifier stored in the buyer's browser session
    pub lead_id: Uuid,

    pub name: String,
    pub email: String,
    pub message: Option<String>,

    /// Selected vehicles, in selection order
    pub vehicle_ids: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
}

impl Inquiry {
    pub fn new(
        lead_id: Uuid,
        name: String,
        email: String,
        message: Option<String>,
        vehicle_ids: Vec<Uuid>,
    ) -> Self {
        let mut unique = Vec::with_capacity(vehicle_ids.len());
        for id in vehicle_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        Self {
            id: Uuid::new_v4(),
            lead_id,
            name,
            email,
            message,
            vehicle_ids: unique,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_inquiry_deduplicates_vehicles() {
        let vehicle = Uuid::new_v4();
        let inquiry = Inquiry::new(
            Uuid::new_v4(),
            "Erika Muster".to_string(),
            "erika@example.com".to_string(),
            None,
            vec![vehicle, vehicle],
        );
        assert_eq!(inquiry.vehicle_ids, vec![vehicle]);
    }
}
