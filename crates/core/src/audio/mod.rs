use std::{fs::File, path::Path};

use lewton::inside_ogg::OggStreamReader;

use crate::{LightingError, Result};

/// Decoded mono audio ready for analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Length of the waveform in seconds.
    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f32 / self.sample_rate as f32
        }
    }

    /// Averages interleaved frames down to a single channel.
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        let samples = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();
        Self::new(samples, sample_rate)
    }
}

/// Decodes an Ogg Vorbis asset (`song.ogg`, or the same stream renamed to
/// `song.egg`).
pub fn decode_file(path: &Path) -> Result<Waveform> {
    let decode_error = |reason: String| LightingError::AudioDecode {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|err| decode_error(err.to_string()))?;
    let mut reader = OggStreamReader::new(file).map_err(|err| decode_error(err.to_string()))?;

    let channels = usize::from(reader.ident_hdr.audio_channels);
    let sample_rate = reader.ident_hdr.audio_sample_rate;

    let mut interleaved: Vec<f32> = Vec::new();
    while let Some(packet) = reader
        .read_dec_packet_itl()
        .map_err(|err| decode_error(err.to_string()))?
    {
        interleaved.extend(packet.iter().map(|&s| s as f32 / i16::MAX as f32));
    }

    let waveform = Waveform::from_interleaved(&interleaved, channels, sample_rate);
    tracing::debug!(
        path = %path.display(),
        channels,
        sample_rate,
        seconds = waveform.duration_seconds(),
        "decoded audio"
    );
    Ok(waveform)
}
