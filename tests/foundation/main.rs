//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: ObjectId, the id allocator, field keys, errors, and
//! configuration.

mod config;
mod keys;
