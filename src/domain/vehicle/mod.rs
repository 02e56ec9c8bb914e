pub mod entity;
pub mod field_import;
pub mod invariants;

pub use entity::{MaintenanceReading, Vehicle};
pub use field_import::{UnrecognizedField, VehicleField, VehicleFieldImport};
pub use invariants::{validate_report_number, validate_vehicle};
