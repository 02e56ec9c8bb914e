// src/application/mod.rs
//
// Application Layer
//
// ARCHITECTURE:
// - Sits between the CLI and the services
// - Wires state once per process
// - Translates service results into DTOs and errors into ErrorResponse

pub mod dto;
pub mod error_handling;
pub mod state;

pub use dto::{CandidateOutcomeDto, ImportReportDto, StorefrontVehicleDto};
pub use error_handling::{ErrorResponse, ErrorType};
pub use state::AppState;
