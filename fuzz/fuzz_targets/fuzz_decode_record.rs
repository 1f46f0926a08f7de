#![no_main]

use libfuzzer_sys::fuzz_target;
use ras_codec::{decode, encode, ras_record};
use uuid::Uuid;

ras_record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Entry {
        #[ras(",1")]
        id: Uuid,
        #[ras("null-size,2")]
        weight: u32,
        #[ras(",3")]
        name: String,
    }
}

ras_record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Envelope {
        #[ras(",1")]
        owner: Uuid,
        #[ras("time,2")]
        created_ms: i64,
        #[ras(",3,4")]
        entries: Vec<Entry>,
        #[ras(",4")]
        nested: Option<Box<Entry>>,
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&version, body)) = data.split_first() else {
        return;
    };
    let version = i64::from(version % 8);

    // Re-encode whatever decodes to exercise the write path on odd values
    if let Ok(value) = decode::<Envelope>(body, version) {
        let _ = encode(&value, version);
    }
});
