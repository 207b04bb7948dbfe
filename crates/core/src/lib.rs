//! Core pack-opening logic. Keep this crate free of IO and platform concerns.

pub mod cards;
pub mod catalog;
pub mod collection;
pub mod config;
pub mod draw;
pub mod events;
pub mod packs;
pub mod reveal;
pub mod rng;
pub mod session;
pub mod store;
pub mod timeline;
pub mod wallet;

pub use cards::*;
pub use catalog::*;
pub use collection::*;
pub use config::*;
pub use draw::*;
pub use events::*;
pub use packs::*;
pub use reveal::*;
pub use rng::*;
pub use session::*;
pub use store::*;
pub use timeline::*;
pub use wallet::*;
