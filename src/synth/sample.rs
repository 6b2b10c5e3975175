//! Sample data — WAV decoding, mono mixdown, and rate conversion.
//!
//! Banks can be filled from recorded drum samples instead of the synthetic
//! generators. Decoding is reader-generic; where the bytes come from is the
//! host's business.

use std::io::{Read, Seek};

/// Errors from loading or converting sample data.
#[derive(Debug)]
pub enum SampleError {
    /// WAV decoding or I/O failure.
    Wav(hound::Error),
    /// The file decoded to zero samples.
    Empty,
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleError::Wav(e) => write!(f, "WAV error: {e}"),
            SampleError::Empty => write!(f, "WAV file contains no samples"),
        }
    }
}

impl std::error::Error for SampleError {}

impl From<hound::Error> for SampleError {
    fn from(e: hound::Error) -> Self {
        SampleError::Wav(e)
    }
}

/// A mono f32 buffer at a known sample rate.
#[derive(Debug, Clone)]
pub struct SampleData {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleData {
    /// Wrap raw mono samples.
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Decode a WAV stream into mono f32 at `target_sample_rate`.
    ///
    /// Integer and float formats are accepted; multi-channel input is mixed
    /// down by averaging. A rate mismatch is fixed up with linear
    /// interpolation.
    pub fn from_wav<R: Read + Seek>(
        reader: R,
        target_sample_rate: u32,
    ) -> Result<Self, SampleError> {
        let wav = hound::WavReader::new(reader)?;
        let spec = wav.spec();
        let channels = spec.channels as usize;
        let source_rate = spec.sample_rate;

        let raw: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => {
                let full_scale = (1u32 << (spec.bits_per_sample - 1)) as f32;
                wav.into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / full_scale))
                    .collect::<Result<_, _>>()?
            }
            hound::SampleFormat::Float => {
                wav.into_samples::<f32>().collect::<Result<_, _>>()?
            }
        };
        if raw.is_empty() {
            return Err(SampleError::Empty);
        }

        let mono: Vec<f32> = raw
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        let samples = if source_rate == target_sample_rate {
            mono
        } else {
            resample_linear(&mono, source_rate, target_sample_rate)
        };

        Ok(Self {
            samples,
            sample_rate: target_sample_rate,
        })
    }

    /// The mono sample buffer.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Linear-interpolation resampling.
fn resample_linear(input: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if input.len() < 2 {
        return input.to_vec();
    }

    let ratio = source_rate as f64 / target_rate as f64;
    let output_len = (input.len() as f64 / ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 * ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < input.len() {
            input[idx] * (1.0 - frac) + input[idx + 1] * frac
        } else {
            input[input.len() - 1]
        };
        output.push(sample);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav_bytes(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::new(&mut buf, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        buf.into_inner()
    }

    #[test]
    fn from_mono_wraps() {
        let sd = SampleData::from_mono(vec![0.1, -0.2], 48000);
        assert_eq!(sd.len(), 2);
        assert_eq!(sd.sample_rate(), 48000);
        assert!(!sd.is_empty());
    }

    #[test]
    fn from_wav_mono_float() {
        let bytes = wav_bytes(&[0.0, 0.5, -0.5], 44100, 1);
        let sd = SampleData::from_wav(Cursor::new(bytes), 44100).unwrap();
        assert_eq!(sd.len(), 3);
        assert!((sd.samples()[1] - 0.5).abs() < 1e-6);
        assert!((sd.samples()[2] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn from_wav_16bit_int() {
        let mut buf = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut buf, spec).unwrap();
        for s in [0i16, 16384, -16384] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let sd = SampleData::from_wav(Cursor::new(buf.into_inner()), 44100).unwrap();
        assert!(sd.samples()[0].abs() < 1e-6);
        assert!((sd.samples()[1] - 0.5).abs() < 1e-3);
        assert!((sd.samples()[2] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn stereo_mixes_down_by_averaging() {
        let bytes = wav_bytes(&[0.8, 0.2, -0.4, -0.6], 44100, 2);
        let sd = SampleData::from_wav(Cursor::new(bytes), 44100).unwrap();
        assert_eq!(sd.len(), 2);
        assert!((sd.samples()[0] - 0.5).abs() < 1e-6);
        assert!((sd.samples()[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn rate_mismatch_resamples() {
        let input: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let bytes = wav_bytes(&input, 22050, 1);
        let sd = SampleData::from_wav(Cursor::new(bytes), 44100).unwrap();
        assert!(sd.len() >= 190 && sd.len() <= 210);
        assert!((sd.samples()[0] - input[0]).abs() < 1e-6);
        assert_eq!(sd.sample_rate(), 44100);
    }

    #[test]
    fn from_wav_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kick.wav");
        std::fs::write(&path, wav_bytes(&[0.25, -0.25], 44100, 1)).unwrap();

        let file = std::fs::File::open(&path).unwrap();
        let sd = SampleData::from_wav(std::io::BufReader::new(file), 44100).unwrap();
        assert_eq!(sd.len(), 2);
        assert!((sd.samples()[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn empty_wav_is_an_error() {
        let bytes = wav_bytes(&[], 44100, 1);
        assert!(matches!(
            SampleData::from_wav(Cursor::new(bytes), 44100),
            Err(SampleError::Empty)
        ));
    }

    #[test]
    fn garbage_bytes_are_a_wav_error() {
        let err = SampleData::from_wav(Cursor::new(vec![1u8, 2, 3, 4]), 44100).unwrap_err();
        assert!(matches!(err, SampleError::Wav(_)));
        assert!(err.to_string().starts_with("WAV error"));
    }

    #[test]
    fn resample_identity_at_equal_rates() {
        let input = vec![0.1, 0.2, 0.3, 0.4];
        let output = resample_linear(&input, 48000, 48000);
        for (a, b) in output.iter().zip(&input) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn resample_tiny_inputs_pass_through() {
        assert!(resample_linear(&[], 22050, 44100).is_empty());
        assert_eq!(resample_linear(&[0.7], 22050, 44100), vec![0.7]);
    }
}
