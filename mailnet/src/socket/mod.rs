//! Socket management.
//!
//! Opens one connection per hop, mirroring Chromium's `net/socket/`:
//! - [`connectjob`]: DNS → TCP → TLS connection flow (BoringSSL)
//! - [`client`]: plain or TLS stream behind one `AsyncRead + AsyncWrite` type

pub mod client;
pub mod connectjob;
