//! Outbound ports (driven side): the backend collaborators the core calls.

pub mod property;
pub mod video;
