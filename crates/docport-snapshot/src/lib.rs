//! # docport-snapshot
//!
//! Sanitized snapshots of a rendered editor surface.
//!
//! A snapshot is the markup the semantic exporter packages: editor chrome
//! and host styling removed, computed alignment made explicit and images
//! inlined so the markup is self-contained.
//!
//! ## Example
//!
//! ```
//! use docport_snapshot::{MapFetcher, SnapshotExtractor};
//! use docport_surface::RenderTree;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tree = RenderTree::from_page(
//!     r#"<body><div><p>Hi</p><button>Menu</button></div></body>"#,
//!     None,
//! )?;
//! let extractor = SnapshotExtractor::new(MapFetcher::new());
//! let snapshot = extractor.extract(&tree).await.unwrap();
//! assert_eq!(snapshot.markup, "<p>Hi</p>");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod extract;
pub mod fetch;

pub use error::{FetchError, Result};
pub use extract::{sanitize, to_data_uri, SanitizedSnapshot, SnapshotExtractor, COLOR_SCHEME_ATTR};
pub use fetch::{decode_data_uri, FetchedResource, HttpFetcher, MapFetcher, ResourceFetcher};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
