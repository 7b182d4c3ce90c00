//! Terminal front end for the campus navigation assistant.
//!
//! ## Backend selection
//!
//! - `CAMPUS_NAV_BACKEND=http` (default) talks to the navigation backend
//! - `CAMPUS_NAV_BACKEND=mock` or `--mock` replays a deterministic script
//!
//! The backend URL comes from `--base-url`, then `CAMPUS_NAV_BASE_URL`, then
//! the config file. Set `CAMPUS_NAV_CONFIG_PATH` (or pass `--config`) to a
//! JSON file with this shape:
//!
//! ```json
//! {
//!   "base_url": "http://localhost:4000",
//!   "timeout_sec": 30,
//!   "recalc_interval_ms": 5000,
//!   "headers": { "x-campus": "main" }
//! }
//! ```
//!
//! Every field is optional. `timeout_sec` and `recalc_interval_ms` must be
//! > 0 when provided. Unknown JSON fields are rejected.
//!
//! ## Location
//!
//! A terminal has no geolocation capability, so the campus reference point
//! is used unless `--fix <lat>,<lng>` simulates a device fix.
//! `--deny-location` simulates a refused permission prompt.
//!
//! Logs go to stderr, filtered by `CAMPUS_NAV_LOG` (default `warn`).

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod providers;
