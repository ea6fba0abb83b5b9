//! ODPT open-data API gateway.
//!
//! The only module that performs network I/O. Key characteristics of the
//! upstream:
//! - Collections page via `$top`/`$skip`, but some resources only answer
//!   unparameterized requests; the first-empty-page fallback covers those.
//! - 404 on a collection means "no data", not an error.
//! - Rate limiting (429) is common; requests back off and retry within a
//!   fixed budget.
//! - Field names vary by feed generation; `extract` centralizes the
//!   per-concept fallback lists.

mod client;
pub mod extract;
mod error;
mod types;

pub use client::{DEFAULT_BASE_URL, OdptClient, OdptConfig, TOEI_OPERATOR};
pub use error::OdptError;
pub use types::{
    BusDto, BusroutePatternDto, BusstopPoleDto, BusTimetableDto, PoleOrderDto, TimetableObjectDto,
};
