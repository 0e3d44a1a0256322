//! Нижний уровень формата: varint, заголовки тегов и примитивы потока.
//!
//! ## Модули
//!
//! - [`varint`]: беззнаковый varint с базой `0xF8` и zigzag-вариант
//! - [`header`]: кодирование `(TagID, размер)` и таблица неявных размеров
//! - [`ids`]: стандартный каталог зарезервированных ID
//! - [`stream`]: big-endian чтение/запись фиксированной ширины
//! - [`bounded`]: чтение payload в границах объявленного размера

pub mod bounded;
pub mod header;
pub mod ids;
pub mod stream;
pub mod varint;

pub use bounded::*;
pub use header::*;
pub use ids::*;
pub use stream::*;
pub use varint::*;
