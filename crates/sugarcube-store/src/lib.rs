//! SQLite storage for the SugarCube server.
//!
//! Holds the site catalogue with its coupon entries and the IP ban list.
//! All access goes through [`CouponStore`], which serializes statements on a
//! single connection.

pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use store::{BAN_INSERT_CHUNK, CouponStore};
pub use types::{CouponEntry, PruneReport, Site};
