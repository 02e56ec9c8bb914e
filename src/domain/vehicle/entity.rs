use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::field_import::{VehicleField, VehicleFieldImport};

/// A vehicle offered for sale out of an insolvency estate.
/// The appraisal report number is the business identifier every bulk
/// import matches against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Appraisal (DEKRA) report number, digits only, leading zeros kept
    pub report_number: String,

    pub brand: String,
    pub model: String,

    /// First registration as printed on the papers (MM/YYYY or DD.MM.YYYY)
    pub first_registration: Option<String>,

    pub mileage_km: Option<u64>,

    /// Vehicle identification number (FIN)
    pub vin: Option<String>,

    pub power_kw: Option<u32>,
    pub fuel: Option<String>,
    pub color: Option<String>,

    /// Public URLs of uploaded photos, in upload order, no duplicates
    pub photo_urls: Vec<String>,

    /// Public URL of the uploaded appraisal report
    pub report_url: Option<String>,

    /// Service history entries
    pub maintenance: Vec<MaintenanceReading>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One service-history entry: "am 28.02.2024 bei 111.185 km"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceReading {
    /// Service date, DD.MM.YYYY
    pub date: String,

    /// Odometer reading with separators normalized away
    pub mileage_km: u64,
}

impl MaintenanceReading {
    pub fn new(date: String, mileage_km: u64) -> Self {
        Self { date, mileage_km }
    }
}

impl std::fmt::Display for MaintenanceReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "am {} bei {} km", self.date, self.mileage_km)
    }
}

impl Vehicle {
    /// Create a new Vehicle entity
    pub fn new(report_number: String, brand: String, model: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            report_number,
            brand,
            model,
            first_registration: None,
            mileage_km: None,
            vin: None,
            power_kw: None,
            fuel: None,
            color: None,
            photo_urls: Vec::new(),
            report_url: None,
            maintenance: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Human-readable label used in import outcomes ("BMW 320d")
    pub fn display_label(&self) -> String {
        format!("{} {}", self.brand, self.model).trim().to_string()
    }

    /// Append a photo URL unless it is already listed.
    /// Returns true if the list changed.
    pub fn add_photo_url(&mut self, url: String) -> bool {
        if self.photo_urls.contains(&url) {
            return false;
        }
        self.photo_urls.push(url);
        self.updated_at = Utc::now();
        true
    }

    pub fn set_report_url(&mut self, url: String) {
        self.report_url = Some(url);
        self.updated_at = Utc::now();
    }

    /// Append a maintenance entry unless an identical one exists
    pub fn add_maintenance(&mut self, reading: MaintenanceReading) -> bool {
        if self.maintenance.contains(&reading) {
            return false;
        }
        self.maintenance.push(reading);
        self.updated_at = Utc::now();
        true
    }

    /// Apply every recognized field of a pasted field import.
    /// Later occurrences of the same field overwrite earlier ones;
    /// maintenance readings accumulate.
    pub fn apply_fields(&mut self, import: &VehicleFieldImport) {
        for field in &import.fields {
            match field {
                VehicleField::ReportNumber(value) => self.report_number = value.clone(),
                VehicleField::Brand(value) => self.brand = value.clone(),
                VehicleField::Model(value) => self.model = value.clone(),
                VehicleField::FirstRegistration(value) => {
                    self.first_registration = Some(value.clone())
                }
                VehicleField::Mileage(km) => self.mileage_km = Some(*km),
                VehicleField::Vin(value) => self.vin = Some(value.clone()),
                VehicleField::Power(kw) => self.power_kw = Some(*kw),
                VehicleField::Fuel(value) => self.fuel = Some(value.clone()),
                VehicleField::Color(value) => self.color = Some(value.clone()),
                VehicleField::Maintenance(reading) => {
                    self.add_maintenance(reading.clone());
                }
            }
        }
        self.updated_at = Utc::now();
    }
}
