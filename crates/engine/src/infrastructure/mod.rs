//! Infrastructure layer - ports, loaders, caches and settings.
//!
//! Everything here is independent of story semantics: the store composes
//! these pieces.

pub mod cache;
pub mod loaders;
pub mod ports;
pub mod ready_gate;
pub mod settings;
