//! Social media extraction engine
//!
//! Features:
//! - Platform detection for TikTok and Twitter/X post URLs
//! - Ordered multi-provider fallback with per-provider failure isolation
//! - Normalization of heterogeneous provider payloads into one descriptor
//! - Photo carousel support alongside video and audio streams

pub mod error;
pub mod models;
pub mod providers;
pub mod request;
pub mod resolver;
pub mod url_parser;

pub use error::{ResolveError, Result};
pub use models::{ImageItem, MediaDescriptor, Platform};
pub use resolver::MediaResolver;
pub use url_parser::UrlParser;
