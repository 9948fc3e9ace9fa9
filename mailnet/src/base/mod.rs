//! Base types and error handling.
//!
//! Provides foundational types mirroring Chromium's `net/base/`:
//! - [`NetError`](neterror::NetError): every failure the session engine can report

pub mod neterror;

#[cfg(test)]
mod tests;
