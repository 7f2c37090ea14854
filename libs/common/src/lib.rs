//! Common library for the Carhive rental backend
//!
//! This crate provides shared infrastructure used by the rental service:
//! PostgreSQL connection pooling, the Redis cache used for admin statistics,
//! and shared error types.

pub mod cache;
pub mod database;
pub mod error;
