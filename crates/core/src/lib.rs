//! Functional core for the BOAC advising service.
//!
//! Domain types, filter evaluation, authorization predicates and the
//! repository traits implemented by the server's storage backends. Nothing in
//! this crate performs I/O.

pub mod appointment;
#[cfg(feature = "auth")]
pub mod auth;
pub mod cohort;
pub mod curated;
pub mod note;
pub mod redirect;
pub mod serde;
pub mod storage;
pub mod student;
pub mod topic;
pub mod user;
