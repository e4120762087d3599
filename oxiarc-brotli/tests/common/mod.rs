//! Fixture streams and the generators that reproduce their contents.
#![allow(dead_code)]

use oxiarc_brotli::{BrotliDecoder, Result};
use oxiarc_core::DecompressStatus;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Route decoder logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const TEXT: &[u8] = b"The quick brown fox jumps over the lazy dog. \
Pack my box with five dozen liquor jugs. \
How vexingly quick daft zebras jump! \
Lorem ipsum dolor sit amet, consectetur adipiscing elit. ";

/// Text-like data: the pangram paragraph repeated.
pub fn text_like(size: usize) -> Vec<u8> {
    TEXT.iter().copied().cycle().take(size).collect()
}

/// Reproducible noise from a linear congruential generator.
pub fn random(size: usize) -> Vec<u8> {
    let mut seed: u64 = 0x123456789ABCDEF0;
    (0..size)
        .map(|_| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            (seed >> 32) as u8
        })
        .collect()
}

/// Markup sample stored next to the fixtures.
pub fn html() -> Vec<u8> {
    read(&data_path("html.txt"))
}

/// Text, noise and markup spliced together.
pub fn mixed() -> Vec<u8> {
    let mut data = text_like(20_000);
    data.extend(random(5_000));
    data.extend_from_slice(&html()[..30_000]);
    data.extend(random(300));
    data.extend(text_like(7_000));
    data
}

/// A compressed stream and the bytes it decodes to.
pub struct Fixture {
    pub name: &'static str,
    pub compressed: Vec<u8>,
    pub expected: Vec<u8>,
    pub large_window: bool,
}

fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn read(path: &PathBuf) -> Vec<u8> {
    std::fs::read(path).unwrap_or_else(|err| panic!("{}: {err}", path.display()))
}

fn fixture(name: &'static str, expected: Vec<u8>, large_window: bool) -> Fixture {
    Fixture {
        name,
        compressed: read(&data_path(name)),
        expected,
        large_window,
    }
}

/// Every fixture stream.
pub fn fixtures() -> Vec<Fixture> {
    init_tracing();
    vec![
        fixture("text_q11.br", text_like(65_536), false),
        fixture("text_lgwin10.br", text_like(200_000), false),
        fixture("random_q9.br", random(4_096), false),
        fixture("html_q11.br", html(), false),
        fixture("mixed_q4_lgwin12.br", mixed(), false),
        fixture("mixed_q11.br", mixed(), false),
        fixture("mixed_q1.br", mixed(), false),
        fixture("text_large_window.br", text_like(100_000), true),
    ]
}

/// Compound dictionary stream that copies 22 bytes from just past the
/// window; without chunks the copy lands in the static dictionary.
pub const ONE_COPY: [u8; 11] = [
    0xa1, 0xa8, 0x00, 0xc0, 0x2f, 0x01, 0x10, 0xc4, 0x44, 0x09, 0x00,
];

/// Feed `data` in `chunk` sized pieces and drain into `out_size` buffers.
pub fn decode_chunked(
    decoder: &mut BrotliDecoder,
    data: &[u8],
    chunk: usize,
    out_size: usize,
) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut buffer = vec![0u8; out_size];
    let mut pieces = data.chunks(chunk);
    loop {
        let (written, status) = decoder.decode(&mut buffer)?;
        output.extend_from_slice(&buffer[..written]);
        match status {
            DecompressStatus::Done => return Ok(output),
            DecompressStatus::NeedsOutput => {}
            DecompressStatus::NeedsInput => match pieces.next() {
                Some(piece) => decoder.feed(piece)?,
                None => decoder.finish_input()?,
            },
        }
    }
}
