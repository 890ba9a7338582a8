// meraprov-api: Async Rust client for the Meraki Dashboard API provisioning endpoints

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::{API_KEY_HEADER, DEFAULT_BASE_URL, DashboardClient};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
