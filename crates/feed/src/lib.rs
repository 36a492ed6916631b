// ABOUTME: Feed parsing library for the spouts workspace.
// ABOUTME: Turns RSS, Atom and JSON Feed bytes into Feed/FeedItem models.

pub mod error;
pub mod models;
pub mod parser;

pub use error::FeedError;
pub use models::{Author, Feed, FeedItem};
pub use parser::parse_feed_bytes;
