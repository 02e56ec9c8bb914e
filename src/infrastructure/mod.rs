// src/infrastructure/mod.rs
//
// Infrastructure Layer
//
// Contains implementation details that support the domain
// but are not part of the domain itself.
//
// RULES:
// - Infrastructure serves the domain
// - Infrastructure never dictates domain behavior
// - Infrastructure is replaceable

pub mod local_storage;
pub mod storage;

pub use local_storage::LocalFileStorage;
pub use storage::{validate_object_path, FileStorage, StoredObject};

#[cfg(test)]
pub use storage::MockFileStorage;
