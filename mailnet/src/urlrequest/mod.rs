//! Request-level API: one logical request followed through its redirects.
//!
//! - [`context`]: shared transport and header settings
//! - [`request`]: what to fetch and with which cookie jar
//! - [`job`]: hop-by-hop redirect driver

pub mod context;
pub mod job;
pub mod request;

pub use context::{SessionConfig, URLRequestContext};
pub use request::{RequestMethod, SessionRequest};
