//! Application core — pure sequencing logic, zero I/O.
//!
//! All interaction with hardware happens through the **port traits** in
//! [`ports`]; [`requests`] moves power actions from contexts that cannot
//! block onto the worker that owns a domain.

pub mod ports;
pub mod requests;
