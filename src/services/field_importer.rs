// src/services/field_importer.rs
//
// Tab-separated field import
//
// Operators paste two-column data copied out of an appraisal spreadsheet:
// one `label<TAB>value` pair per line. Known labels (German or English) are
// mapped onto typed `VehicleField`s; everything else is reported back in
// `unrecognized` with a reason.

use std::collections::HashMap;

use crate::domain::vehicle::{UnrecognizedField, VehicleField, VehicleFieldImport};
use crate::services::extraction_rules::{normalize_integer, MaintenanceExtractor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    ReportNumber,
    Brand,
    Model,
    FirstRegistration,
    Mileage,
    Vin,
    Power,
    Fuel,
    Color,
    Maintenance,
}

const LABELS: &[(&str, FieldKind)] = &[
    ("gutachten", FieldKind::ReportNumber),
    ("gutachten-nr", FieldKind::ReportNumber),
    ("gutachtennummer", FieldKind::ReportNumber),
    ("report number", FieldKind::ReportNumber),
    ("marke", FieldKind::Brand),
    ("hersteller", FieldKind::Brand),
    ("brand", FieldKind::Brand),
    ("modell", FieldKind::Model),
    ("typ", FieldKind::Model),
    ("model", FieldKind::Model),
    ("erstzulassung", FieldKind::FirstRegistration),
    ("ez", FieldKind::FirstRegistration),
    ("first registration", FieldKind::FirstRegistration),
    ("kilometerstand", FieldKind::Mileage),
    ("laufleistung", FieldKind::Mileage),
    ("km-stand", FieldKind::Mileage),
    ("mileage", FieldKind::Mileage),
    ("fin", FieldKind::Vin),
    ("fahrgestellnummer", FieldKind::Vin),
    ("vin", FieldKind::Vin),
    ("leistung", FieldKind::Power),
    ("power", FieldKind::Power),
    ("kraftstoff", FieldKind::Fuel),
    ("kraftstoffart", FieldKind::Fuel),
    ("fuel", FieldKind::Fuel),
    ("farbe", FieldKind::Color),
    ("color", FieldKind::Color),
    ("colour", FieldKind::Color),
    ("wartung", FieldKind::Maintenance),
    ("service", FieldKind::Maintenance),
    ("scheckheft", FieldKind::Maintenance),
    ("maintenance", FieldKind::Maintenance),
];

pub struct FieldImporter {
    labels: HashMap<&'static str, FieldKind>,
    maintenance: MaintenanceExtractor,
}

impl Default for FieldImporter {
    fn default() -> Self {
        Self {
            labels: LABELS.iter().copied().collect(),
            maintenance: MaintenanceExtractor::default(),
        }
    }
}

impl FieldImporter {
    /// Parse pasted text. Never fails: unparseable lines end up in
    /// `unrecognized`.
    pub fn parse(&self, text: &str) -> VehicleFieldImport {
        let mut result = VehicleFieldImport::default();

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }

            let Some((raw_label, raw_value)) = line.split_once('\t') else {
                result.unrecognized.push(UnrecognizedField {
                    line: line_no,
                    label: line.trim().to_string(),
                    value: String::new(),
                    reason: "no tab separator".to_string(),
                });
                continue;
            };

            let label = raw_label
                .trim()
                .trim_end_matches([':', '.'])
                .trim()
                .to_string();
            let value = raw_value.replace('\t', " ").trim().to_string();

            let unrecognized = |reason: &str| UnrecognizedField {
                line: line_no,
                label: label.clone(),
                value: value.clone(),
                reason: reason.to_string(),
            };

            let Some(kind) = self.labels.get(label.to_lowercase().as_str()).copied() else {
                result.unrecognized.push(unrecognized("unknown label"));
                continue;
            };

            if value.is_empty() {
                result.unrecognized.push(unrecognized("empty value"));
                continue;
            }

            match self.parse_value(kind, &value) {
                Ok(fields) => result.fields.extend(fields),
                Err(reason) => result.unrecognized.push(unrecognized(reason)),
            }
        }

        log::debug!(
            "Field import: {} recognized, {} unrecognized",
            result.fields.len(),
            result.unrecognized.len()
        );
        result
    }

    fn parse_value(&self, kind: FieldKind, value: &str) -> Result<Vec<VehicleField>, &'static str> {
        let field = match kind {
            FieldKind::ReportNumber => {
                let digits = first_digit_run(value).ok_or("report number has no digits")?;
                VehicleField::ReportNumber(digits.to_string())
            }
            FieldKind::Brand => VehicleField::Brand(value.to_string()),
            FieldKind::Model => VehicleField::Model(value.to_string()),
            FieldKind::FirstRegistration => VehicleField::FirstRegistration(value.to_string()),
            FieldKind::Mileage => {
                let number = value
                    .trim_end_matches(|c: char| c.is_alphabetic() || c.is_whitespace())
                    .trim();
                VehicleField::Mileage(normalize_integer(number).ok_or("mileage is not a number")?)
            }
            FieldKind::Vin => {
                let vin: String = value
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_ascii_uppercase();
                if vin.len() != 17 || !vin.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err("VIN must be 17 letters or digits");
                }
                VehicleField::Vin(vin)
            }
            FieldKind::Power => {
                let kw = first_digit_run(value)
                    .and_then(|digits| digits.parse::<u32>().ok())
                    .ok_or("power has no kW figure")?;
                VehicleField::Power(kw)
            }
            FieldKind::Fuel => VehicleField::Fuel(value.to_string()),
            FieldKind::Color => VehicleField::Color(value.to_string()),
            FieldKind::Maintenance => {
                let readings = self.maintenance.extract_all(value);
                if readings.is_empty() {
                    return Err("expected 'am TT.MM.JJJJ bei <Kilometer> km'");
                }
                return Ok(readings.into_iter().map(VehicleField::Maintenance).collect());
            }
        };

        Ok(vec![field])
    }
}

fn first_digit_run(value: &str) -> Option<&str> {
    let start = value.find(|c: char| c.is_ascii_digit())?;
    let rest = &value[start..];
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    Some(&rest[..end])
}
