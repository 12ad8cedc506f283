// FFI functions perform null checks before dereferencing raw pointers.
// Clippy cannot verify this statically, so we allow it at crate level.
#![allow(clippy::not_unsafe_ptr_arg_deref)]

pub mod converter;
pub mod dict;
pub mod engine;
mod ffi;
pub mod furigana;
pub mod segmenter;
pub mod trace_init;
pub mod trie;
pub mod unicode;

pub use ffi::*;
