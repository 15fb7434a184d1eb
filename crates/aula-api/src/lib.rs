// aula-api: Async Rust client for the auditorium AV control server

pub mod admin;
pub mod client;
pub mod control;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;

pub use client::AulaClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
