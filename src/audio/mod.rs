//! # Audio Transcoding Pipeline
//!
//! Everything between the two wire formats lives here. The telephony leg
//! speaks base64 μ-law at 8kHz; the AI leg speaks raw little-endian PCM16 at
//! 16kHz (input) and 24kHz (output).
//!
//! ## Key Components:
//! - **codec**: μ-law ⇄ PCM16 conversion (stateless)
//! - **resampler**: sample-rate conversion with carried interpolation state
//! - **buffer**: accumulates inbound PCM into provider-sized frames
//!
//! ## Data Flow:
//! inbound:  base64 → μ-law bytes → PCM16 @8k → PCM16 @16k → FrameBuffer → AI
//! outbound: PCM16 @24k → PCM16 @8k → μ-law bytes → base64 → telephony

pub mod buffer;       // Provider-sized frame accumulation
pub mod codec;        // G.711 μ-law companding
pub mod resampler;    // Stateful linear-interpolation rate conversion

use byteorder::{ByteOrder, LittleEndian};

/// Reinterpret little-endian PCM16 bytes as samples.
///
/// A buffer of odd byte length is a protocol violation on the AI leg and is
/// rejected rather than truncated.
pub fn pcm_bytes_to_samples(bytes: &[u8]) -> Result<Vec<i16>, String> {
    if bytes.len() % 2 != 0 {
        return Err(format!(
            "PCM buffer length {} is not a whole number of 16-bit samples",
            bytes.len()
        ));
    }
    let mut samples = vec![0i16; bytes.len() / 2];
    LittleEndian::read_i16_into(bytes, &mut samples);
    Ok(samples)
}

/// Serialize samples as little-endian PCM16 bytes.
pub fn samples_to_pcm_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = vec![0u8; samples.len() * 2];
    LittleEndian::write_i16_into(samples, &mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::codec::{decode_ulaw, encode_ulaw};
    use crate::audio::resampler::{resample, ResampleState};

    #[test]
    fn test_pcm_byte_sample_round_trip() {
        let samples = vec![0i16, 1, -1, i16::MAX, i16::MIN, 12345];
        let bytes = samples_to_pcm_bytes(&samples);
        assert_eq!(bytes.len(), samples.len() * 2);
        assert_eq!(pcm_bytes_to_samples(&bytes).unwrap(), samples);
    }

    #[test]
    fn test_odd_length_buffer_is_rejected() {
        assert!(pcm_bytes_to_samples(&[0u8, 1, 2]).is_err());
    }

    #[test]
    fn test_tone_survives_full_bridge_round_trip() {
        // 20ms of a 400Hz tone, the way it arrives from the telephony leg,
        // pushed through both directions of the bridge: decode, upsample to
        // the provider input rate, simulate the provider echoing at its
        // output rate, downsample back and re-encode.
        let rate = 8000u32;
        let tone: Vec<i16> = (0..160)
            .map(|i| {
                let t = i as f32 / rate as f32;
                ((t * 400.0 * 2.0 * std::f32::consts::PI).sin() * 8000.0) as i16
            })
            .collect();
        let ulaw_in = encode_ulaw(&tone);

        let pcm_8k = decode_ulaw(&ulaw_in);
        let (pcm_16k, _) = resample(&pcm_8k, 8000, 16000, ResampleState::default());
        let (pcm_24k, _) = resample(&pcm_16k, 16000, 24000, ResampleState::default());
        let (pcm_out, _) = resample(&pcm_24k, 24000, 8000, ResampleState::default());
        let ulaw_out = encode_ulaw(&pcm_out);
        let final_pcm = decode_ulaw(&ulaw_out);

        let peak = final_pcm.iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!(peak > 500, "signal lost in round trip, peak {}", peak);
    }

    #[test]
    fn test_silence_stays_silent_through_bridge() {
        let silence = vec![0xFFu8; 160];
        let pcm = decode_ulaw(&silence);
        let (up, _) = resample(&pcm, 8000, 16000, ResampleState::default());
        let peak = up.iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!(peak < 100, "silence gained amplitude: {}", peak);
    }
}
