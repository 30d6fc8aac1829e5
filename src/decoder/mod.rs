//! Decoder port
//!
//! The symbol recognition algorithm is an external dependency. The session
//! core only needs the narrow [`Decoder`] capability defined here.

/// Decoder trait, closure adapter and error type
pub mod port;

pub use port::{Decoder, DecoderError};
