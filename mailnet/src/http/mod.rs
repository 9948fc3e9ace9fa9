//! One HTTP/1.1 exchange per hop.
//!
//! - [`transport`]: the single-exchange seam ([`Transport`])
//! - [`streamfactory`]: the real network transport (hyper over BoringSSL)
//! - [`transaction`]: attach cookies, send, store `Set-Cookie` lines

pub mod requestbody;
pub mod response;
pub mod streamfactory;
pub mod transaction;
pub mod transport;

// Re-exports for convenience
pub use requestbody::{FormData, RequestBody};
pub use response::HttpResponse;
pub use streamfactory::HttpStreamFactory;
pub use transport::{Exchanging, OutgoingRequest, Transport};
