//! Append-only audit and consent logs.

pub mod domain;
pub mod repository;
pub mod trail;

pub use domain::{AuditEntry, ConsentKind, ConsentRecord};
pub use repository::AuditRepository;
pub use trail::{AuditEvent, AuditTrail};
