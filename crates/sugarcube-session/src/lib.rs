//! Ephemeral request-correlation sessions.
//!
//! A session ties an inbound request to an asynchronous callback that arrives
//! later. This crate provides:
//! - A concurrent session index keyed by a random 128-bit identifier
//! - A min-ordered expiry queue so expired sessions are found without scanning
//! - A background pruner that drains the queue on a fixed interval
//! - Lazy TTL enforcement on validation, independent of the pruner
//!
//! # Example
//!
//! ```rust,ignore
//! use sugarcube_session::{SessionConfig, SessionManager};
//!
//! let sessions = Arc::new(SessionManager::new(SessionConfig::default()));
//! sessions.start_pruner();
//!
//! let id = sessions.create_session("10.0.0.5".parse()?);
//! // ... later, when the callback arrives:
//! sessions.validate_session(&id)?;
//! sessions.remove_session(&id);
//! ```

mod clock;
mod config;
mod error;
mod index;
mod manager;
mod pruner;
mod queue;
mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use index::SessionIndex;
pub use manager::{SessionManager, SessionStats};
pub use queue::ExpiryQueue;
pub use session::{Session, SessionId};
