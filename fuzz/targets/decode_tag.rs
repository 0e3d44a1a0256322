#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tagwire::{CodecConfig, TagFactory, UnknownTagPolicy};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    data: Vec<u8>,
    permissive: bool,
    max_tag_size: u16,
    max_depth: u8,
}

fuzz_target!(|input: FuzzInput| {
    let data = &input.data[..];

    let policy = if input.permissive {
        UnknownTagPolicy::Permissive
    } else {
        UnknownTagPolicy::Strict
    };
    let config = CodecConfig::default()
        .with_unknown_tags(policy)
        .with_max_tag_size(input.max_tag_size as u64)
        .with_max_depth(u32::from(input.max_depth));
    let factory = TagFactory::with_config(config);

    // Разбор не должен паниковать ни на каких данных.
    let Ok(tag) = factory.from_bytes(data) else {
        return;
    };

    // Успешно разобранный тег записывается в тот же размер
    // и разбирается повторно.
    let bytes = tag.to_bytes().expect("decoded tag must serialize");
    assert_eq!(bytes.len(), data.len());
    assert_eq!(tag.size(), data.len() as u64);

    let again = factory.from_bytes(&bytes).expect("re-encoded tag must decode");
    assert_eq!(again.to_bytes().expect("second encode"), bytes);

    // skip согласован с разбором
    let mut cursor = std::io::Cursor::new(data);
    assert_eq!(factory.skip(&mut cursor).ok(), Some(data.len() as u64));
});
