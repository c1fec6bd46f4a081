//! # Sample-Rate Conversion
//!
//! Linear-interpolation resampling between the telephony rate (8kHz) and the
//! AI provider's rates (16kHz in, 24kHz out). A call streams several hundred
//! small buffers per direction, so the interpolation phase must carry across
//! calls: restarting cold at every buffer boundary introduces audible clicks.
//!
//! ## Contract:
//! - `resample(input, from, to, state)` returns `round(len * to/from)` samples
//! - equal rates are a pure passthrough (input and state untouched)
//! - the returned state continues the interpolation seamlessly on the next call
//! - one state per direction per session; never shared

/// Carry-over position for one direction of one session.
///
/// `prev` is the final input sample of the previous call; `pos` is the
/// fractional read position into the virtual stream `[prev, input...]` where
/// index 0 is `prev` and index `i + 1` is `input[i]`. Created with
/// `ResampleState::default()` at session start and threaded through every
/// call for that direction until the session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResampleState {
    prev: i16,
    pos: f64,
}

/// Resample PCM16 samples from `from_rate` to `to_rate`.
///
/// Returns the converted samples together with the state to pass into the
/// next call for the same direction. Output values are rounded and clamped to
/// the i16 domain; no wraparound.
pub fn resample(
    input: &[i16],
    from_rate: u32,
    to_rate: u32,
    state: ResampleState,
) -> (Vec<i16>, ResampleState) {
    if from_rate == to_rate {
        return (input.to_vec(), state);
    }
    if input.is_empty() {
        return (Vec::new(), state);
    }

    let n = input.len();
    let out_len = ((n as f64) * (to_rate as f64) / (from_rate as f64)).round() as usize;
    let step = from_rate as f64 / to_rate as f64;

    // Virtual stream: index 0 is the carried sample, 1..=n are this chunk.
    let sample_at = |i: usize| -> f64 {
        if i == 0 {
            state.prev as f64
        } else {
            input[(i - 1).min(n - 1)] as f64
        }
    };

    let mut output = Vec::with_capacity(out_len);
    let mut pos = state.pos;

    for _ in 0..out_len {
        // Rounding can leave the carried position slightly before the virtual
        // origin; clamp instead of extrapolating.
        let p = pos.max(0.0);
        let i = (p.floor() as usize).min(n);
        let frac = p - i as f64;
        let s0 = sample_at(i);
        let s1 = sample_at(i + 1);
        let value = s0 + (s1 - s0) * frac;
        output.push(value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16);
        pos += step;
    }

    // This call consumed n input samples; the leftover fraction carries over.
    let next = ResampleState {
        prev: input[n - 1],
        pos: pos - n as f64,
    };

    (output, next)
}
