//! Asset loading, validation and file-backed album storage.

pub mod bootstrap;
pub mod load;
pub mod schema;
pub mod store;

pub use bootstrap::*;
pub use load::*;
pub use schema::*;
pub use store::*;
