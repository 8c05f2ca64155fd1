#![no_main]

use libfuzzer_sys::fuzz_target;
use stream_upload::{Segments, UploadBody};

fuzz_target!(|data: &[u8]| {
    // The first bytes pick the read sizes, the rest is the file content.
    let split = data.len().min(16);
    let (sizes, content) = data.split_at(split);

    let segments = match Segments::build("file", "fuzz.bin", &[("k", "v")], Some("X-BOUNDARY")) {
        Ok(segments) => segments,
        Err(_) => return,
    };
    let mut expected = segments.head().to_vec();
    expected.extend_from_slice(content);
    expected.extend_from_slice(segments.tail());

    let mut body = UploadBody::from_reader(segments, content);
    let mut out = Vec::new();
    let mut call = 0;
    loop {
        let size = sizes.get(call % sizes.len().max(1)).map_or(1, |&s| s as usize + 1);
        let mut buf = vec![0u8; size];
        let outcome = body.read_chunk(&mut buf).expect("in-memory source never fails");
        out.extend_from_slice(&buf[..outcome.written]);
        call += 1;
        if outcome.end_of_stream {
            break;
        }
    }

    assert_eq!(out, expected);
});
