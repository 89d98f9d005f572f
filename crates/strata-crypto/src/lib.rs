//! Content hashing for strata.
//!
//! Every revision object kind hashes under its own domain tag so that two
//! objects of different kinds never share an id, even with identical bytes.

pub mod hasher;

pub use hasher::ContentHasher;
