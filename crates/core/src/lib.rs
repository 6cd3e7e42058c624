pub mod catalog;
pub mod classify;
pub mod config;
pub mod fallback;
pub mod io;
pub mod knowledge;
pub mod laws;
pub mod ops;
pub mod router;
pub mod runtime;
pub mod store;
pub mod types;
