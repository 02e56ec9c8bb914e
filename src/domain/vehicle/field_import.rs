// Typed result of a pasted tab-separated field import.
//
// Every recognized label maps onto exactly one variant; anything else lands in
// `unrecognized` so the caller can show it instead of silently dropping it.

use serde::{Deserialize, Serialize};

use super::entity::MaintenanceReading;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum VehicleField {
    ReportNumber(String),
    Brand(String),
    Model(String),
    FirstRegistration(String),
    Mileage(u64),
    Vin(String),
    Power(u32),
    Fuel(String),
    Color(String),
    Maintenance(MaintenanceReading),
}

impl VehicleField {
    /// Stable field name, used for display and logging
    pub fn name(&self) -> &'static str {
        match self {
            VehicleField::ReportNumber(_) => "report_number",
            VehicleField::Brand(_) => "brand",
            VehicleField::Model(_) => "model",
            VehicleField::FirstRegistration(_) => "first_registration",
            VehicleField::Mileage(_) => "mileage",
            VehicleField::Vin(_) => "vin",
            VehicleField::Power(_) => "power",
            VehicleField::Fuel(_) => "fuel",
            VehicleField::Color(_) => "color",
            VehicleField::Maintenance(_) => "maintenance",
        }
    }
}

/// A pasted line that could not be mapped onto a typed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnrecognizedField {
    /// 1-based line number in the pasted text
    pub line: usize,
    pub label: String,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleFieldImport {
    pub fields: Vec<VehicleField>,
    pub unrecognized: Vec<UnrecognizedField>,
}

impl VehicleFieldImport {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.unrecognized.is_empty()
    }

    /// Last value given for the report number, if any
    pub fn report_number(&self) -> Option<&str> {
        self.fields.iter().rev().find_map(|field| match field {
            VehicleField::ReportNumber(value) => Some(value.as_str()),
            _ => None,
        })
    }
}
