//! Application services.
//!
//! These services own the request-coordination policy and coordinate the
//! outbound ports to implement viewport loading and video resolution.

pub mod cache;
pub mod coordinator;
pub mod video;
pub mod viewport;
