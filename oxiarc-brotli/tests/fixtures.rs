//! Decoding of streams produced by a reference encoder.

mod common;

use common::{Fixture, fixtures};
use oxiarc_brotli::{
    BrotliDecoder, BrotliError, BrotliReader, DecoderConfig, StreamError, decompress,
    decompress_with_config,
};
use oxiarc_core::Decompressor;
use std::io::Read;

fn config_for(fixture: &Fixture) -> DecoderConfig {
    if fixture.large_window {
        DecoderConfig::LARGE_WINDOW
    } else {
        DecoderConfig::DEFAULT
    }
}

#[test]
fn test_fixtures_one_shot() {
    for fixture in fixtures() {
        let decoded = decompress_with_config(&fixture.compressed, config_for(&fixture))
            .unwrap_or_else(|err| panic!("{}: {err}", fixture.name));
        assert_eq!(decoded.len(), fixture.expected.len(), "{}", fixture.name);
        assert!(decoded == fixture.expected, "{} differs", fixture.name);
    }
}

#[test]
fn test_fixtures_through_reader() {
    for fixture in fixtures() {
        let config = config_for(&fixture).with_input_chunk_size(1000);
        let mut reader = BrotliReader::with_config(fixture.compressed.as_slice(), config);
        let mut decoded = Vec::new();
        reader
            .read_to_end(&mut decoded)
            .unwrap_or_else(|err| panic!("{}: {err}", fixture.name));
        assert!(decoded == fixture.expected, "{} differs", fixture.name);
        assert_eq!(
            reader.decoder().total_in(),
            fixture.compressed.len() as u64,
            "{}",
            fixture.name
        );
        assert_eq!(
            reader.decoder().total_out(),
            fixture.expected.len() as u64,
            "{}",
            fixture.name
        );
    }
}

#[test]
fn test_fixtures_through_decompressor_trait() {
    for fixture in fixtures() {
        let mut decoder = BrotliDecoder::with_config(config_for(&fixture));
        let decoded = decoder
            .decompress_all(&fixture.compressed)
            .unwrap_or_else(|err| panic!("{}: {err}", fixture.name));
        assert!(decoded == fixture.expected, "{} differs", fixture.name);
        assert!(Decompressor::is_finished(&decoder));
    }
}

#[test]
fn test_large_window_requires_opt_in() {
    let fixture = fixtures()
        .into_iter()
        .find(|f| f.large_window)
        .expect("large window fixture");
    assert_eq!(
        decompress(&fixture.compressed),
        Err(BrotliError::from(StreamError::InvalidWindowBits))
    );

    let mut decoder = BrotliDecoder::new();
    decoder.enable_large_window().unwrap();
    let decoded = common::decode_chunked(&mut decoder, &fixture.compressed, 16, 4096).unwrap();
    assert!(decoded == fixture.expected);
}

#[test]
fn test_decoder_reuse_after_reset() {
    let all = fixtures();
    let mut decoder = BrotliDecoder::with_config(DecoderConfig::LARGE_WINDOW);
    for fixture in all.iter().chain(all.iter().rev()) {
        decoder.reset().unwrap();
        let decoded = common::decode_chunked(&mut decoder, &fixture.compressed, 512, 1500)
            .unwrap_or_else(|err| panic!("{}: {err}", fixture.name));
        assert!(decoded == fixture.expected, "{} differs", fixture.name);
        assert!(decoder.is_finished());
    }
}
