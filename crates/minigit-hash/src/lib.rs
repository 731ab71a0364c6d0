//! Hash computation and object identity for the minigit implementation.
//!
//! This crate provides the core `ObjectId` type, SHA-1 hash computation, and
//! hex encoding/decoding used throughout minigit.

mod error;
pub mod hasher;
pub mod hex;
mod oid;

pub use error::HashError;
pub use oid::ObjectId;
