//! Backend of the DayRoute marketing site: waitlist signups, support-form
//! relay, and the release flags that decide which download links the pages
//! show.
//!
//! API endpoints:
//! - `GET /health_check`
//! - `POST /api/waitlist`
//! - `POST /api/support`

pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod release;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod utils;
pub mod waitlist_store;
