//! WAV fixture generation
//!
//! Writes short silent files with a known length so metadata probing has
//! something real to read.

use hound::{WavSpec, WavWriter};
use std::path::Path;

/// Low rate keeps fixtures small; probing only needs the header
const TEST_SAMPLE_RATE: u32 = 8000;

/// Write a silent mono 16-bit WAV of `duration_ms`
pub fn generate_silent_wav<P: AsRef<Path>>(path: P, duration_ms: u64) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: TEST_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    let total_frames = (TEST_SAMPLE_RATE as u64 * duration_ms) / 1000;
    for _ in 0..total_frames {
        writer.write_sample(0i16)?;
    }

    writer.finalize()?;
    Ok(())
}
