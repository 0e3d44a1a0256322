//! Составные payload.
//!
//! Каждый из них читается в два этапа внутри sub-reader, ограниченного
//! объявленным размером: разбор, затем проверка, что sub-reader исчерпан.

pub mod arrays;
pub mod bigint;
pub mod dictionary;
pub mod range;
pub mod version;

pub use arrays::*;
pub use bigint::*;
pub use dictionary::*;
pub use range::*;
pub use version::*;

/// Сколько элементов резервировать заранее, не доверяя счётчику из потока.
pub(crate) const PREALLOC_LIMIT: u64 = 1024;
