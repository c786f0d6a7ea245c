//! Canonical recursive length-prefixed encoding.
//!
//! Two shapes exist: byte strings and lists of items. Integers are written as
//! their minimal big-endian byte string, so zero encodes as the empty string.
pub mod constants;
pub mod decode;
pub mod encode;
pub mod error;
pub mod structs;
