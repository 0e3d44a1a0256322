/// Wire-level building blocks: varint, tag header, stream primitives, ids.
pub mod codec;
/// Insertion-ordered map used by the dictionary payloads.
pub mod collections;
/// Codec configuration (size limit, unknown-tag policy).
pub mod config;
/// Tags, payloads, factory and the generic extensions.
pub mod tag;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Varint and header codec.
pub use codec::{
    decode, decode_signed, encode, encode_signed, encoded_size, read_signed_varint, read_varint,
    unzigzag, write_signed_varint, write_varint, zigzag, DeclaredSize, StandardTag, TagHeader,
    TagId, FIRST_FREE_ID,
};
/// Insertion-ordered map.
pub use collections::OrderedMap;
/// Configuration.
pub use config::{CodecConfig, UnknownTagPolicy};
/// Tag framework.
pub use tag::{
    BigDec, BigInt, Bool, Bytes, Dictionary, Float128, Float32, Float64, Int16, Int32, Int64,
    Int8, Null, Oid, Payload, Range, SignedVarint, StandardPayload, StringDictionary, Tag,
    TagArray, TagFactory, TagSequence, UInt16, UInt32, UInt64, UInt8, Utf8String, ValueCodec,
    Varint, VarintArray, Version, Versioned, VersionedCodec, WrappedTag,
};
/// Errors and result types.
pub use tagwire_error::{ErrorExt, FormatError, StatusCode, TagError, TagResult};
