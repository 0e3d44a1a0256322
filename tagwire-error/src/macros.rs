/// Немедленно возвращает ошибку (аналогично `anyhow::bail!`).
///
/// Принимает любой тип, конвертируемый в [`TagError`](crate::TagError),
/// например [`FormatError`](crate::FormatError).
///
/// Пример:
///
/// ```
/// use tagwire_error::{bail, FormatError, TagResult};
///
/// fn check_len(len: u64) -> TagResult<()> {
///     if len != 16 {
///         bail!(FormatError::SizeMismatch {
///             what: "version",
///             expected: 16,
///             declared: len,
///         });
///     }
///     Ok(())
/// }
///
/// assert!(check_len(16).is_ok());
/// assert!(check_len(3).is_err());
/// ```
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::TagError::from($err))
    };
}

/// Проверяет условие и вызывает `bail!`, если условие ложно.
///
/// Пример:
///
/// ```
/// use tagwire_error::{ensure, TagError, TagResult};
///
/// fn expect_id(expected: u64, actual: u64) -> TagResult<()> {
///     ensure!(expected == actual, TagError::UnexpectedTagId { expected, actual });
///     Ok(())
/// }
///
/// assert!(expect_id(3, 3).is_ok());
/// assert!(expect_id(3, 4).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            $crate::bail!($err);
        }
    };
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
