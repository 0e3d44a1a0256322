//! Теги: контракт payload, сам тег, стандартные payload, фабрика и
//! обобщённые расширения.

pub mod composite;
pub mod factory;
pub mod payload;
pub mod primitives;
pub mod tag;
pub mod versioned;
pub mod wrapped;

pub use composite::*;
pub use factory::*;
pub use payload::*;
pub use primitives::*;
pub use tag::*;
pub use versioned::*;
pub use wrapped::*;
