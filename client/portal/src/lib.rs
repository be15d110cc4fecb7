//! Bookshelf portal: registration form, live book list, refresh countdown
//! and theme switch, driven by a single [`app::Portal`] controller.

pub mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod form;
pub mod models;
pub mod notice;
pub mod phone;
pub mod render;
pub mod schedule;
pub mod store;
pub mod theme;
pub mod validators;

pub use app::{Portal, PortalState, StopSignal, SubmitOutcome};
pub use config::{load_config, PortalConfig};
