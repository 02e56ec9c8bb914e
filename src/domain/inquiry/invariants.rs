use super::entity::Inquiry;
use crate::domain::{DomainError, DomainResult};

/// Validates all Inquiry invariants
pub fn validate_inquiry(inquiry: &Inquiry) -> DomainResult<()> {
    if inquiry.vehicle_ids.is_empty() {
        return Err(DomainError::InvariantViolation(
            "Inquiry must reference at least one vehicle".to_string(),
        ));
    }

    if inquiry.name.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Inquiry name cannot be empty".to_string(),
        ));
    }

    let email = inquiry.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(DomainError::InvariantViolation(format!(
            "Invalid email address: {:?}",
            inquiry.email
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn inquiry(email: &str, vehicles: Vec<Uuid>) -> Inquiry {
        Inquiry::new(Uuid::new_v4(), "Max".to_string(), email.to_string(), None, vehicles)
    }

    #[test]
    fn test_valid_inquiry() {
        assert!(validate_inquiry(&inquiry("max@example.com", vec![Uuid::new_v4()])).is_ok());
    }

    #[test]
    fn test_inquiry_without_vehicles_fails() {
        assert!(validate_inquiry(&inquiry("max@example.com", vec![])).is_err());
    }

    #[test]
    fn test_bad_email_fails() {
        assert!(validate_inquiry(&inquiry("max", vec![Uuid::new_v4()])).is_err());
        assert!(validate_inquiry(&inquiry("@example.com", vec![Uuid::new_v4()])).is_err());
        assert!(validate_inquiry(&inquiry("max@localhost", vec![Uuid::new_v4()])).is_err());
    }
}
