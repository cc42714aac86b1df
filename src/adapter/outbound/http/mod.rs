//! HTTP adapters for the property backend and the video endpoint.

pub mod client;
pub mod dto;
pub mod interceptor;
pub mod property;
pub mod video;

pub use client::build_client;
pub use interceptor::{BearerToken, HeaderInterceptor, ProbeInterceptor};
pub use property::HttpPropertySource;
pub use video::HttpVideoProbe;
