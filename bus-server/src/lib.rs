//! Next-bus departure board server.
//!
//! A read-through aggregation layer over the ODPT open-data API that answers:
//! "given an origin stop and a destination stop, what are the next scheduled
//! bus departures, adjusted for live delay and occupancy?"

pub mod board;
pub mod cache;
pub mod domain;
pub mod odpt;
pub mod realtime;
pub mod stops;
pub mod web;
