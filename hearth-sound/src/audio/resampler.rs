//! Audio resampling using rubato
//!
//! Converts decoded assets to the output device's sample rate.

use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Input frames per resampler call
const CHUNK_SIZE: usize = 1024;

/// Audio resampler using rubato for sample rate conversion.
pub struct Resampler;

impl Resampler {
    /// Resample interleaved stereo audio from `input_rate` to `output_rate`.
    ///
    /// The whole asset is fed through in fixed chunks, the tail is flushed
    /// with partial calls, and the resampler's output delay is trimmed, so
    /// the result holds exactly `round(frames * ratio)` frames aligned with
    /// the input. Loops therefore wrap without a gap or a dropped tail.
    ///
    /// Returns a copy when the rates already match.
    pub fn resample_stereo(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
        if input_rate == output_rate || input.len() < 2 {
            return Ok(input.to_vec());
        }

        debug!("Resampling from {}Hz to {}Hz", input_rate, output_rate);

        let ratio = output_rate as f64 / input_rate as f64;
        let planar_input = Self::deinterleave(input);
        let input_frames = planar_input[0].len();
        let expected_frames = (input_frames as f64 * ratio).round() as usize;

        let mut resampler = Self::create_resampler(ratio, CHUNK_SIZE)?;
        let delay = resampler.output_delay();
        let wanted = expected_frames + delay;
        let mut planar_output = vec![Vec::with_capacity(wanted); 2];

        let mut pos = 0;
        while input_frames - pos >= resampler.input_frames_next() {
            let n = resampler.input_frames_next();
            let chunk: Vec<&[f32]> = planar_input.iter().map(|c| &c[pos..pos + n]).collect();
            let out = resampler
                .process(&chunk, None)
                .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;
            Self::append(&mut planar_output, out);
            pos += n;
        }

        if pos < input_frames {
            let rest: Vec<&[f32]> = planar_input.iter().map(|c| &c[pos..]).collect();
            let out = resampler
                .process_partial(Some(rest.as_slice()), None)
                .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;
            Self::append(&mut planar_output, out);
        }

        // Flush the samples still held back by the output delay
        while planar_output[0].len() < wanted {
            let flush: Option<&[Vec<f32>]> = None;
            let out = resampler
                .process_partial(flush, None)
                .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;
            if out[0].is_empty() {
                break;
            }
            Self::append(&mut planar_output, out);
        }

        for channel in &mut planar_output {
            channel.drain(..delay.min(channel.len()));
            channel.resize(expected_frames, 0.0);
        }

        debug!(
            "Resampled {} input frames to {} output frames",
            input_frames, expected_frames
        );

        Ok(Self::interleave(&planar_output))
    }

    fn create_resampler(ratio: f64, chunk_size: usize) -> Result<FastFixedIn<f32>> {
        FastFixedIn::<f32>::new(
            ratio,
            1.0, // no runtime ratio changes
            PolynomialDegree::Septic,
            chunk_size,
            2,
        )
        .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))
    }

    fn append(planar: &mut [Vec<f32>], chunk: Vec<Vec<f32>>) {
        for (channel, samples) in planar.iter_mut().zip(chunk) {
            channel.extend(samples);
        }
    }

    fn deinterleave(input: &[f32]) -> Vec<Vec<f32>> {
        let frames = input.len() / 2;
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        for frame in input.chunks_exact(2) {
            left.push(frame[0]);
            right.push(frame[1]);
        }
        vec![left, right]
    }

    fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
        let frames = planar.first().map_or(0, Vec::len);
        let mut output = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            output.push(planar[0][i]);
            output.push(planar[1][i]);
        }
        output
    }
}
