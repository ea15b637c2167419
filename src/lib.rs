//! Memorabilia catalog: a cached query engine over a remote item store.
//!
//! [`catalog`] holds the data model, the query cache and the view pipeline,
//! [`storage`] is the SQLite-backed store, and [`config`] reads the user's
//! settings.

pub mod blob;
pub mod catalog;
pub mod config;
pub mod storage;
pub mod util;
