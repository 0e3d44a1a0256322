use std::{any::Any, error::Error};

use crate::StatusCode;

/// Расширение ошибок кодека (object-safe): статус-код и теги для метрик.
pub trait ErrorExt: Error + Send + Sync + 'static {
    fn status_code(&self) -> StatusCode;

    /// Возвращает ошибку как [`Any`](std::any::Any) для downcast.
    fn as_any(&self) -> &dyn Any;

    /// Пары ключ–значение для систем наблюдаемости.
    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("error_type", self.type_name()),
            ("status_code", self.status_code().to_string()),
        ]
    }

    /// Короткое имя типа ошибки.
    fn type_name(&self) -> String {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("Unknown")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;

    #[derive(Debug)]
    struct FrameError(pub &'static str);

    impl fmt::Display for FrameError {
        fn fmt(
            &self,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            write!(f, "FrameError: {}", self.0)
        }
    }

    impl Error for FrameError {}

    impl ErrorExt for FrameError {
        fn status_code(&self) -> StatusCode {
            StatusCode::InvalidFrame
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_as_any_downcast() {
        let e = FrameError("x");
        let down = e.as_any().downcast_ref::<FrameError>();
        assert_eq!(down.map(|e| e.0), Some("x"));
    }

    #[test]
    fn test_type_name_is_short() {
        assert_eq!(FrameError("x").type_name(), "FrameError");
    }

    #[test]
    fn test_metrics_tags_contains_expected_pairs() {
        let e = FrameError("t");
        let tags = e.metrics_tags();
        assert!(tags.contains(&("error_type", "FrameError".to_string())));
        assert!(tags.contains(&("status_code", StatusCode::InvalidFrame.to_string())));
    }
}
