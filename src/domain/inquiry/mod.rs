pub mod entity;
pub mod invariants;

pub use entity::Inquiry;
pub use invariants::validate_inquiry;
