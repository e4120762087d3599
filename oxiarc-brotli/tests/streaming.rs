//! Output must not depend on how input and output are sliced.

mod common;

use common::{decode_chunked, fixtures};
use oxiarc_brotli::{BrotliDecoder, DecoderConfig, SessionStatus};
use oxiarc_core::{DecompressStatus, Decompressor};

const INPUT_CHUNKS: [usize; 4] = [1, 7, 64, 4096];
const OUTPUT_SIZES: [usize; 3] = [1, 13, 8192];

#[test]
fn test_chunking_does_not_change_output() {
    for fixture in fixtures() {
        for &eager in &[false, true] {
            for &chunk in &INPUT_CHUNKS {
                for &out_size in &OUTPUT_SIZES {
                    // One-byte pieces into one-byte buffers only on the small streams.
                    if chunk * out_size == 1 && fixture.expected.len() > 70_000 {
                        continue;
                    }
                    let config = DecoderConfig::new()
                        .with_large_window(fixture.large_window)
                        .with_eager_output(eager);
                    let mut decoder = BrotliDecoder::with_config(config);
                    let decoded = decode_chunked(&mut decoder, &fixture.compressed, chunk, out_size)
                        .unwrap_or_else(|err| {
                            panic!("{} chunk={chunk} out={out_size} eager={eager}: {err}", fixture.name)
                        });
                    assert!(
                        decoded == fixture.expected,
                        "{} chunk={chunk} out={out_size} eager={eager} differs",
                        fixture.name
                    );
                    assert_eq!(decoder.status(), SessionStatus::Finished);
                }
            }
        }
    }
}

#[test]
fn test_eager_output_streams_before_window_fills() {
    let fixture = fixtures()
        .into_iter()
        .find(|f| f.name == "text_q11.br")
        .expect("text fixture");
    let mut decoder = BrotliDecoder::with_config(DecoderConfig::LOW_LATENCY);
    decoder.feed(&fixture.compressed).unwrap();
    let mut out = [0u8; 100];
    let (written, status) = decoder.decode(&mut out).unwrap();
    assert_eq!(status, DecompressStatus::NeedsOutput);
    assert_eq!(written, out.len());
    assert_eq!(&out[..], &fixture.expected[..100]);
}

#[test]
fn test_window_flushes_fill_output() {
    let fixture = fixtures()
        .into_iter()
        .find(|f| f.name == "text_lgwin10.br")
        .expect("text fixture");
    // A 1 KiB window is flushed many times into one large buffer.
    let mut decoder = BrotliDecoder::new();
    decoder.feed(&fixture.compressed).unwrap();
    decoder.finish_input().unwrap();
    let mut out = vec![0u8; 5000];
    let (written, status) = decoder.decode(&mut out).unwrap();
    assert_eq!(status, DecompressStatus::NeedsOutput);
    assert_eq!(written, out.len());
    assert!(out == fixture.expected[..written]);
}

#[test]
fn test_decompressor_backpressure() {
    for fixture in fixtures() {
        let mut decoder = BrotliDecoder::with_config(
            DecoderConfig::new().with_large_window(fixture.large_window),
        );
        let mut decoded = Vec::new();
        let mut pos = 0;
        let mut out = vec![0u8; 777];
        loop {
            let input = &fixture.compressed[pos..];
            let (consumed, written, status) = decoder.decompress(input, &mut out, true).unwrap();
            assert!(consumed <= input.len());
            pos += consumed;
            decoded.extend_from_slice(&out[..written]);
            if status == DecompressStatus::Done {
                break;
            }
        }
        assert_eq!(pos, fixture.compressed.len(), "{}", fixture.name);
        assert!(decoded == fixture.expected, "{} differs", fixture.name);
        assert!(Decompressor::is_finished(&decoder));

        // A finished session accepts empty calls.
        assert_eq!(
            decoder.decompress(&[], &mut out, true).unwrap(),
            (0, 0, DecompressStatus::Done)
        );
    }
}

#[test]
fn test_status_transitions() {
    let fixture = fixtures()
        .into_iter()
        .find(|f| f.name == "html_q11.br")
        .expect("html fixture");
    let mut decoder = BrotliDecoder::new();
    assert_eq!(decoder.status(), SessionStatus::Fresh);

    let (head, tail) = fixture.compressed.split_at(100);
    decoder.feed(head).unwrap();
    assert_eq!(decoder.status(), SessionStatus::Running);

    let mut sink = Vec::new();
    let mut out = vec![0u8; 1 << 16];
    loop {
        let (n, status) = decoder.decode(&mut out).unwrap();
        sink.extend_from_slice(&out[..n]);
        if status == DecompressStatus::NeedsInput {
            break;
        }
    }
    assert_eq!(decoder.status(), SessionStatus::NeedsInput);

    decoder.feed(tail).unwrap();
    decoder.finish_input().unwrap();
    let mut small = [0u8; 10];
    let (n, status) = decoder.decode(&mut small).unwrap();
    sink.extend_from_slice(&small[..n]);
    assert_eq!(status, DecompressStatus::NeedsOutput);
    assert_eq!(decoder.status(), SessionStatus::NeedsOutput);

    loop {
        let (n, status) = decoder.decode(&mut out).unwrap();
        sink.extend_from_slice(&out[..n]);
        if status == DecompressStatus::Done {
            break;
        }
    }
    assert_eq!(decoder.status(), SessionStatus::Finished);
    assert!(sink == fixture.expected);

    decoder.close();
    assert_eq!(decoder.status(), SessionStatus::Closed);
}
