//! MangaDex content source for manga-reading hosts.
//!
//! The crate splits into a pure response-mapping layer
//! ([`mangadex::types`]), a thin rate-limited transport
//! ([`transport`]), and the client tying them together
//! ([`mangadex::client`]). Hosts talk to the source through the
//! [`traits::MangaSource`] trait and the domain records it returns.

pub mod config;
pub mod error;
pub mod mangadex;
pub mod ratelimit;
pub mod traits;
pub mod transport;

pub use config::{ContentRating, SourceConfig};
pub use error::SourceError;
pub use mangadex::MangaDexSource;
pub use traits::MangaSource;
