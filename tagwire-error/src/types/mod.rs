pub mod tag_error;

// Публичный экспорт всех типов ошибок, чтобы упростить доступ к ним из
// внешнего кода.
pub use tag_error::*;
