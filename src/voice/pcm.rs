//! PCM payload decoding and buffer construction
//!
//! The Gemini TTS endpoint returns raw signed 16-bit little-endian PCM at
//! 24 kHz, mono, transported as base64. These are the pure decode steps
//! between that payload and the floating-point frames the audio sink plays.

use base64::Engine;

use crate::{Error, Result};

/// Sample rate of synthesized speech (24 kHz)
pub const TTS_SAMPLE_RATE: u32 = 24_000;

/// Channel count of synthesized speech (mono)
pub const TTS_CHANNELS: usize = 1;

/// Decode a base64 audio payload into signed 16-bit little-endian samples
///
/// A trailing odd byte is silently dropped; the payload is otherwise
/// consumed whole.
///
/// # Errors
///
/// Returns [`Error::Synthesis`] if the payload is not valid base64.
pub fn decode_base64_pcm(payload: &str) -> Result<Vec<i16>> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| Error::Synthesis(format!("malformed audio payload: {e}")))?;

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// De-interleave integer samples into normalized floating-point channels
///
/// Produces `channel_count` arrays of `floor(len / channel_count)` frames
/// each, with every sample scaled by `1 / 32768` into `[-1.0, 1.0)`. Any
/// trailing partial frame is silently dropped. Pure and deterministic.
#[must_use]
pub fn build_channels(samples: &[i16], channel_count: usize) -> Vec<Vec<f32>> {
    if channel_count == 0 {
        return Vec::new();
    }

    let frames = samples.len() / channel_count;
    let mut channels: Vec<Vec<f32>> = (0..channel_count)
        .map(|_| Vec::with_capacity(frames))
        .collect();

    for frame in samples.chunks_exact(channel_count) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(f32::from(sample) / 32768.0);
        }
    }

    channels
}

/// Decode a base64 payload straight to mono playback frames
///
/// # Errors
///
/// Returns [`Error::Synthesis`] if the payload is not valid base64.
pub fn decode_payload(payload: &str) -> Result<Vec<f32>> {
    let samples = decode_base64_pcm(payload)?;
    let mut channels = build_channels(&samples, TTS_CHANNELS);
    Ok(channels.swap_remove(0))
}

/// Convert f32 samples to WAV bytes
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
