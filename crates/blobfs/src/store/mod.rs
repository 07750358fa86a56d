//! Object store clients.
//!
//! - [`ObjectStoreClient`]: the flat-key capability set the core consumes
//! - [`InMemoryStore`]: reference implementation for tests and embedding

mod memory;
mod traits;

pub use memory::InMemoryStore;
pub use traits::{ListItem, ObjectMetadata, ObjectProperties, ObjectStoreClient};
