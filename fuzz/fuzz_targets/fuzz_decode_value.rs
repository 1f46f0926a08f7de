#![no_main]

use libfuzzer_sys::fuzz_target;
use ras_codec::{decode, Value};

fuzz_target!(|data: &[u8]| {
    // Typed values, strings and sequences from arbitrary bytes: errors are fine, panics are not
    let _ = decode::<Value>(data, 0);
    let _ = decode::<String>(data, 0);
    let _ = decode::<Vec<Value>>(data, 0);
});
