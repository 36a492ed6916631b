// ABOUTME: Built-in source plugins.
// ABOUTME: Each module exposes its TYPE_ID and a Source implementation.

pub mod feed;
pub mod heise;

pub use feed::GenericFeed;
pub use heise::Heise;
