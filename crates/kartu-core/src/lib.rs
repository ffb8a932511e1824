//! Core types and trait definitions for the Kartu competency store.
//!
//! This crate has no database or runtime dependencies. Every other crate
//! depends on it.

// Native `async fn` in trait impls; the trait itself spells out `Send`.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod decode;
pub mod employee;
pub mod error;
pub mod id;
pub mod query;
pub mod skill;
pub mod store;
pub mod validate;

pub use error::{Error, ErrorKind, Result, ValidationError};
