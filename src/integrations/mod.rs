// src/integrations/mod.rs
//
// External Integrations Module

pub mod object_storage;

pub use object_storage::client::HttpObjectStorage;
