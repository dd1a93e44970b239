//! Value stores: where cached payloads live.
//!
//! [`traits::ValueStore`] is the capability the cache needs from a backend.
//! [`memory`] provides single-lock and sharded in-memory implementations.

pub mod memory;
pub mod traits;
