//! Infrastructure configuration modules.

pub mod api;
pub mod logging;
pub mod settings;
pub mod video;
pub mod viewport;
