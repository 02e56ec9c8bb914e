use super::entity::Vehicle;
use crate::domain::{DomainError, DomainResult};

/// Validates all Vehicle invariants
pub fn validate_vehicle(vehicle: &Vehicle) -> DomainResult<()> {
    validate_report_number(&vehicle.report_number)?;
    validate_brand(&vehicle.brand)?;
    validate_photo_urls(vehicle)?;
    Ok(())
}

/// Report number must be a non-empty run of ASCII digits
pub fn validate_report_number(report_number: &str) -> DomainResult<()> {
    if report_number.is_empty() || !report_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::InvariantViolation(format!(
            "Report number must contain digits only: {:?}",
            report_number
        )));
    }
    Ok(())
}

fn validate_brand(brand: &str) -> DomainResult<()> {
    if brand.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Vehicle brand cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_photo_urls(vehicle: &Vehicle) -> DomainResult<()> {
    for (idx, url) in vehicle.photo_urls.iter().enumerate() {
        if vehicle.photo_urls[..idx].contains(url) {
            return Err(DomainError::InvariantViolation(format!(
                "Duplicate photo URL: {}",
                url
            )));
        }
    }
    Ok(())
}
