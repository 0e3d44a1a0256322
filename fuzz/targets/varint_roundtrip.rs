#![no_main]

use libfuzzer_sys::fuzz_target;
use tagwire::codec::{decode, decode_signed, encode, encode_signed, encoded_size, MAX_VARINT_LEN};

fuzz_target!(|input: (u64, i64, Vec<u8>)| {
    let (unsigned, signed, raw) = input;
    let mut buf = [0u8; MAX_VARINT_LEN];

    let len = encode(unsigned, &mut buf).unwrap();
    assert_eq!(len, encoded_size(unsigned));
    assert_eq!(decode(&buf[..len]).unwrap(), (unsigned, len));

    let len = encode_signed(signed, &mut buf).unwrap();
    assert_eq!(decode_signed(&buf[..len]).unwrap(), (signed, len));

    // произвольные байты: либо ошибка, либо каноническое кодирование
    if let Ok((value, len)) = decode(&raw) {
        let canonical = tagwire::codec::to_vec(value);
        assert_eq!(&raw[..len], canonical.as_slice());
    }
});
