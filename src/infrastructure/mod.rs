//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without
//! containing business logic: configuration, logging and the composition
//! root that wires adapters into the shared services.
//!
//! # Submodules
//!
//! - [`config`] - Configuration loading and validation
//! - [`services`] - Process-wide composition root

pub mod config;
pub mod services;
