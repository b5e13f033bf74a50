//! Suggestion box services
//!
//! Business rules live here; the HTTP layer only parses input and picks
//! the operation.

pub mod blob_store;
pub mod identity;
pub mod lifecycle;
pub mod registry;
pub mod routing;
pub mod visibility;

pub use blob_store::{BlobStore, LocalBlobStore, MemoryBlobStore, StoredBlob};
pub use identity::{IdentityProvider, JwtIdentityProvider};
pub use lifecycle::SuggestionLifecycle;
pub use visibility::{SuggestionView, TrackView};
