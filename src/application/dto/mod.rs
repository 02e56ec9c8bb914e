// src/application/dto/mod.rs
//
// Data Transfer Objects
//
// CRITICAL PRINCIPLES:
// - DTOs are output-friendly representations (CLI text and --json)
// - DTOs are simple, serializable structs
// - Conversion FROM domain types only (never TO)

use serde::{Deserialize, Serialize};

use crate::domain::CandidateProgress;
use crate::services::{ImportReport, StorefrontVehicle};

// ============================================================================
// IMPORT DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateOutcomeDto {
    pub file: String,
    pub report_number: Option<String>,
    pub status: String,
    pub message: Option<String>,
    pub matched_label: Option<String>,
    pub stored_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReportDto {
    pub batch_id: String,
    pub kind: String,
    pub total: usize,
    pub matched: usize,
    pub not_found: usize,
    pub invalid: usize,
    pub failed: usize,
    pub rejected: usize,
    pub percent_complete: u8,
    pub duration_ms: u64,
    pub unresolved: Vec<String>,
    pub orphaned_paths: Vec<String>,
    pub shared_paths: Vec<String>,
    pub candidates: Vec<CandidateOutcomeDto>,
}

// ============================================================================
// STOREFRONT DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorefrontVehicleDto {
    pub id: String,
    pub report_number: String,
    pub label: String,
    pub first_registration: Option<String>,
    pub mileage_km: Option<u64>,
    pub power_kw: Option<u32>,
    pub fuel: Option<String>,
    pub photo_urls: Vec<String>,
    pub report_url: Option<String>,

    /// Rendered "am DD.MM.YYYY bei N km" lines
    pub maintenance: Vec<String>,
    pub reserved: bool,
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<&CandidateProgress> for CandidateOutcomeDto {
    fn from(row: &CandidateProgress) -> Self {
        Self {
            file: row.source_identifier.clone(),
            report_number: row.extracted_key.clone(),
            status: row.status.to_string(),
            message: row.message.clone(),
            matched_label: row.matched_label.clone(),
            stored_path: row.stored_path.clone(),
        }
    }
}

impl From<&ImportReport> for ImportReportDto {
    fn from(report: &ImportReport) -> Self {
        let summary = &report.summary;
        Self {
            batch_id: report.batch_id.to_string(),
            kind: report.kind.to_string(),
            total: summary.total,
            matched: summary.matched,
            not_found: summary.not_found,
            invalid: summary.invalid,
            failed: summary.failed,
            rejected: report.rejected,
            percent_complete: summary.percent_complete,
            duration_ms: report.duration_ms,
            unresolved: summary.unresolved.clone(),
            orphaned_paths: summary.orphaned_paths.clone(),
            shared_paths: summary.shared_paths.clone(),
            candidates: report.candidates.iter().map(CandidateOutcomeDto::from).collect(),
        }
    }
}

impl From<StorefrontVehicle> for StorefrontVehicleDto {
    fn from(item: StorefrontVehicle) -> Self {
        let vehicle = item.vehicle;
        Self {
            id: vehicle.id.to_string(),
            label: vehicle.display_label(),
            maintenance: vehicle.maintenance.iter().map(|m| m.to_string()).collect(),
            report_number: vehicle.report_number,
            first_registration: vehicle.first_registration,
            mileage_km: vehicle.mileage_km,
            power_kw: vehicle.power_kw,
            fuel: vehicle.fuel,
            photo_urls: vehicle.photo_urls,
            report_url: vehicle.report_url,
            reserved: item.reserved_by_session,
        }
    }
}
