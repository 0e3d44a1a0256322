use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Основная ошибка кодека тегов.
///
/// Каждая операция возвращает её немедленно, без внутренних повторов.
/// Варианты, связанные с потоком, несут счётчики байт, чтобы вызывающий код
/// мог учесть частичный прогресс.
#[derive(Debug, Error)]
pub enum TagError {
    /// Тело varint имеет недопустимую длину
    #[error("Invalid varint: {reason} (body length {body_len})")]
    InvalidVarint {
        body_len: usize,
        reason: &'static str,
    },

    /// Декодированное значение не помещается в целевой тип
    #[error("Varint value does not fit into {target}")]
    VarintOverflow { target: &'static str },

    /// Источник закончился раньше, чем были прочитаны все байты
    #[error("Unexpected end of stream (expected {expected} bytes, got {got})")]
    UnexpectedEndOfStream { expected: u64, got: u64 },

    /// Приёмник принял меньше байт, чем требовалось
    #[error("Short write (expected {expected} bytes, written {written})")]
    ShortWrite { expected: u64, written: u64 },

    /// Фабрика не может создать тип для этого ID
    #[error("Unsupported tag id {id}")]
    UnsupportedTagId { id: u64 },

    /// В потоке встретился не тот ID, который ожидался
    #[error("Unexpected tag id {actual} (expected {expected})")]
    UnexpectedTagId { expected: u64, actual: u64 },

    /// Структурно некорректный payload
    #[error("Bad tag format: {0}")]
    BadTagFormat(#[from] FormatError),

    /// Объявленный размер больше настроенного лимита
    #[error("Tag size {size} exceeds limit {limit} bytes")]
    TagTooLarge { size: u64, limit: u64 },

    /// Прочие ошибки ввода-вывода
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Причина, по которой payload признан структурно некорректным.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("{what}: declared size {declared} does not match expected {expected}")]
    SizeMismatch {
        what: &'static str,
        expected: u64,
        declared: u64,
    },

    #[error("{what}: declared size {declared} is below the minimum of {minimum}")]
    TooShort {
        what: &'static str,
        minimum: u64,
        declared: u64,
    },

    #[error("{what}: {remaining} unconsumed bytes left")]
    TrailingBytes { what: &'static str, remaining: u64 },

    #[error("{what}: {count} elements claimed but only {available} bytes remain")]
    CountOverrun {
        what: &'static str,
        count: u64,
        available: u64,
    },

    #[error("{what}: payload runs past its declared size of {declared} bytes")]
    Overrun { what: &'static str, declared: u64 },

    #[error("invalid UTF-8 string: {reason}")]
    BadUtf8 { reason: String },

    #[error("{what}: unsupported version {version}")]
    UnsupportedVersion { what: &'static str, version: u16 },

    #[error("{what} requires an explicit size")]
    SizeRequired { what: &'static str },

    #[error("{what}: duplicate key {key:?}")]
    DuplicateKey { what: &'static str, key: String },

    #[error("tag nesting exceeds the limit of {limit} levels")]
    TooDeep { limit: u32 },

    #[error("{what} holds no value")]
    MissingValue { what: &'static str },

    #[error("implicit tag {id}: payload size {actual} does not match fixed size {expected}")]
    ImplicitSizeMismatch { id: u64, expected: u64, actual: u64 },
}

impl TagError {
    /// Кол-во байт, успешно прочитанных или записанных до ошибки.
    pub fn bytes_transferred(&self) -> Option<u64> {
        match self {
            Self::UnexpectedEndOfStream { got, .. } => Some(*got),
            Self::ShortWrite { written, .. } => Some(*written),
            _ => None,
        }
    }

    /// Является ли ошибка ошибкой формата payload.
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::BadTagFormat(_))
    }

    /// Возвращает причину ошибки формата, если это она.
    pub fn format_error(&self) -> Option<&FormatError> {
        match self {
            Self::BadTagFormat(f) => Some(f),
            _ => None,
        }
    }
}

impl ErrorExt for TagError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidVarint { .. } => StatusCode::InvalidInteger,
            Self::VarintOverflow { .. } => StatusCode::IntegerOverflow,
            Self::UnexpectedEndOfStream { .. } => StatusCode::UnexpectedEof,
            Self::ShortWrite { .. } => StatusCode::ShortWrite,
            Self::UnsupportedTagId { .. } => StatusCode::UnsupportedTag,
            Self::UnexpectedTagId { .. } => StatusCode::UnexpectedTag,
            Self::BadTagFormat(FormatError::BadUtf8 { .. }) => StatusCode::InvalidUtf8,
            Self::BadTagFormat(FormatError::UnsupportedVersion { .. }) => {
                StatusCode::UnsupportedVersion
            }
            Self::BadTagFormat(_) => StatusCode::InvalidFrame,
            Self::TagTooLarge { .. } => StatusCode::SizeLimit,
            Self::Io(_) => StatusCode::Io,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let code = self.status_code();
        let category = if code.is_io_error() {
            "io"
        } else if code.is_protocol_error() {
            "format"
        } else {
            "other"
        };
        let mut tags = vec![
            ("error_type", self.type_name()),
            ("status_code", code.to_string()),
            ("category", category.to_string()),
        ];

        match self {
            Self::UnsupportedTagId { id } => tags.push(("tag_id", id.to_string())),
            Self::UnexpectedTagId { actual, .. } => tags.push(("tag_id", actual.to_string())),
            Self::TagTooLarge { size, .. } => tags.push(("tag_size", size.to_string())),
            _ => {}
        }

        tags
    }
}

// Конверсия в std::io::Error для кода, работающего поверх Read/Write
impl From<TagError> for std::io::Error {
    fn from(e: TagError) -> Self {
        let kind = match e {
            TagError::Io(inner) => return inner,
            TagError::UnexpectedEndOfStream { .. } => std::io::ErrorKind::UnexpectedEof,
            TagError::ShortWrite { .. } => std::io::ErrorKind::WriteZero,
            TagError::TagTooLarge { .. } => std::io::ErrorKind::InvalidInput,
            TagError::UnsupportedTagId { .. } => std::io::ErrorKind::Unsupported,
            _ => std::io::ErrorKind::InvalidData,
        };

        std::io::Error::new(kind, e.to_string())
    }
}
