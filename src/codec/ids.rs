//! Каталог стандартных тегов.
//!
//! ID `0..16` неявные: их размер никогда не пишется в поток.
//! ID `0..32` зарезервированы, приложениям доступны ID начиная с
//! [`FIRST_FREE_ID`].

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Числовой идентификатор тега.
pub type TagId = u64;

/// Первый ID, не входящий в неявный диапазон.
pub const IMPLICIT_ID_LIMIT: TagId = 16;
/// Первый ID, доступный приложениям.
pub const FIRST_FREE_ID: TagId = 32;

/// Null, пустой payload
pub const TAG_NULL: TagId = 0;
/// Логическое значение (1 байт)
pub const TAG_BOOL: TagId = 1;
pub const TAG_UINT8: TagId = 2;
pub const TAG_INT8: TagId = 3;
pub const TAG_UINT16: TagId = 4;
pub const TAG_INT16: TagId = 5;
pub const TAG_UINT32: TagId = 6;
pub const TAG_INT32: TagId = 7;
pub const TAG_UINT64: TagId = 8;
pub const TAG_INT64: TagId = 9;
/// Беззнаковый varint, размер определяется самим значением
pub const TAG_VARINT: TagId = 10;
pub const TAG_FLOAT32: TagId = 11;
pub const TAG_FLOAT64: TagId = 12;
/// IEEE 754 binary128, хранится как 16 байт
pub const TAG_FLOAT128: TagId = 13;
/// Знаковый (zigzag) varint
pub const TAG_SIGNED_VARINT: TagId = 14;
/// Сырые байты
pub const TAG_BYTES: TagId = 16;
/// Строка UTF-8
pub const TAG_STRING: TagId = 17;
/// Целое произвольной длины
pub const TAG_BIG_INT: TagId = 18;
/// Десятичное число произвольной длины
pub const TAG_BIG_DEC: TagId = 19;
/// Массив varint
pub const TAG_VARINT_ARRAY: TagId = 20;
/// Массив вложенных тегов (со счётчиком)
pub const TAG_TAG_ARRAY: TagId = 21;
/// Последовательность вложенных тегов (без счётчика)
pub const TAG_TAG_SEQUENCE: TagId = 22;
/// Диапазон `start..start+count`
pub const TAG_RANGE: TagId = 23;
/// Версия из четырёх i32
pub const TAG_VERSION: TagId = 24;
/// OID, тот же payload, что у массива varint
pub const TAG_OID: TagId = 25;
/// Словарь строка -> тег
pub const TAG_DICTIONARY: TagId = 30;
/// Словарь строка -> строка
pub const TAG_STRING_DICTIONARY: TagId = 31;

/// Назначенные ID стандартного каталога.
///
/// Незанятые зарезервированные ID (15, 26..=29) сюда не входят, поэтому
/// `StandardTag::try_from` для них возвращает ошибку.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u64)]
pub enum StandardTag {
    Null = 0,
    Bool = 1,
    UInt8 = 2,
    Int8 = 3,
    UInt16 = 4,
    Int16 = 5,
    UInt32 = 6,
    Int32 = 7,
    UInt64 = 8,
    Int64 = 9,
    Varint = 10,
    Float32 = 11,
    Float64 = 12,
    Float128 = 13,
    SignedVarint = 14,
    Bytes = 16,
    String = 17,
    BigInt = 18,
    BigDec = 19,
    VarintArray = 20,
    TagArray = 21,
    TagSequence = 22,
    Range = 23,
    Version = 24,
    Oid = 25,
    Dictionary = 30,
    StringDictionary = 31,
}

impl StandardTag {
    /// Числовой ID тега.
    pub const fn id(self) -> TagId {
        self as TagId
    }

    /// Ищет стандартный тег по ID.
    pub fn from_id(id: TagId) -> Option<Self> {
        Self::try_from(id).ok()
    }
}

/// ID в неявном диапазоне: длина payload не пишется.
pub const fn is_implicit(id: TagId) -> bool {
    id < IMPLICIT_ID_LIMIT
}

/// ID в зарезервированном диапазоне стандартного каталога.
pub const fn is_reserved(id: TagId) -> bool {
    id < FIRST_FREE_ID
}
