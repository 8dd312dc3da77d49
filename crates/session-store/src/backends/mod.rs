//! Backend implementations for the persistence ports
//!
//! - `memory`: in-process cache and store (always available)
//! - `redb`: durable embedded store (requires `redb` feature)
//! - `redis`: networked cache (requires `redis` feature)

pub mod memory;

#[cfg(feature = "redb")]
pub mod redb;

#[cfg(feature = "redis")]
pub mod redis;
