// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO invariant enforcement
// - NO event emission
// - NO cross-repository calls
// - Explicit SQL only

pub mod inquiry_repository;
pub mod vehicle_repository;

pub use inquiry_repository::{InquiryRepository, SqliteInquiryRepository};
pub use vehicle_repository::{SqliteVehicleRepository, VehicleRepository};
