//! Shared test helpers for pawid-engine integration tests
//!
//! Not every test file uses every helper.
#![allow(dead_code)]

pub mod backends;
pub mod http_stub;
pub mod log_capture;

use pawid_engine::{ImageInput, ImageLimits};

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Bytes that pass image validation (PNG magic, padded to `size`)
pub fn fake_png(size: usize) -> Vec<u8> {
    let mut bytes = PNG_MAGIC.to_vec();
    bytes.resize(size, 0x42);
    bytes
}

/// A validated 4 KiB image
pub fn valid_image() -> ImageInput {
    ImageInput::from_bytes(fake_png(4096), &ImageLimits::default()).unwrap()
}
