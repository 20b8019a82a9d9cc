//! Shared core for the smart-home sensor query service: the fixed query
//! catalog, the canonical sensor-reading model, the document-store
//! boundary, and the windowed-mean aggregation engine used by the server.

pub mod aggregate;
pub mod catalog;
pub mod errors;
pub mod reading;
pub mod store;
