//! HTML documents as returned by the session client.

pub mod document;

pub use document::Document;
