//! Core Karma admin library (session, API client, listing helpers, config).

pub mod api;
pub mod config;
pub mod display;
pub mod error;
pub mod listing;
pub mod registration;
pub mod session;

pub use error::{AdminError, AdminErrorKind};
