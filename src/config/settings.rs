use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::codec::DEFAULT_MAX_TAG_SIZE;

/// Допустимая глубина вложенности тегов по умолчанию.
pub const DEFAULT_MAX_DEPTH: u32 = 128;

/// Поведение фабрики для незарегистрированных свободных ID.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTagPolicy {
    /// Неизвестный ID даёт ошибку `UnsupportedTagId`
    #[default]
    Strict,
    /// Неизвестный тег сохраняется как сырые байты
    Permissive,
}

/// Настройки кодека.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Максимальный объявленный размер явного payload в байтах
    pub max_tag_size: u64,
    /// Максимальная глубина вложенности при разборе; корневой тег имеет
    /// глубину 1
    pub max_depth: u32,
    pub unknown_tags: UnknownTagPolicy,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_tag_size: DEFAULT_MAX_TAG_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            unknown_tags: UnknownTagPolicy::Strict,
        }
    }
}

impl CodecConfig {
    /// Читает настройки из переменных окружения `TAGWIRE_*`.
    ///
    /// - `TAGWIRE_MAX_TAG_SIZE`: лимит размера в байтах
    /// - `TAGWIRE_MAX_DEPTH`: лимит вложенности
    /// - `TAGWIRE_UNKNOWN_TAGS`: `strict` или `permissive`
    pub fn load() -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            .set_default("max_tag_size", DEFAULT_MAX_TAG_SIZE)?
            .set_default("max_depth", u64::from(DEFAULT_MAX_DEPTH))?
            .set_default("unknown_tags", "strict")?
            .add_source(Environment::with_prefix("TAGWIRE").try_parsing(true))
            .build()?;

        cfg.try_deserialize()
    }

    pub fn with_max_tag_size(
        mut self,
        max_tag_size: u64,
    ) -> Self {
        self.max_tag_size = max_tag_size;
        self
    }

    pub fn with_max_depth(
        mut self,
        max_depth: u32,
    ) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_unknown_tags(
        mut self,
        policy: UnknownTagPolicy,
    ) -> Self {
        self.unknown_tags = policy;
        self
    }
}
