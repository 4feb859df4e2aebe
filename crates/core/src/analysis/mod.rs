use std::{f32::consts::PI, fmt, path::Path, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{audio, LightingError, Result, Waveform};

const BEAT_GAIN: f32 = 12.0;
const BEAT_THRESHOLD: f32 = 0.6;
const MIN_BEAT_INTERVAL: f32 = 0.2;
const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Output of a beat tracker: tempo estimate plus beat timestamps in seconds,
/// ordered by time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatAnalysis {
    pub tempo_bpm: Option<f32>,
    pub beat_times: Vec<f64>,
}

/// Seam for the audio analysis collaborator: audio asset in, beats out.
pub trait BeatTracker {
    fn track(&mut self, audio: &Path) -> Result<BeatAnalysis>;
}

impl<T: BeatTracker + ?Sized> BeatTracker for &mut T {
    fn track(&mut self, audio: &Path) -> Result<BeatAnalysis> {
        (**self).track(audio)
    }
}

/// Default tracker: decodes the asset and runs [`AnalysisEngine`] over it in
/// fixed-size blocks.
#[derive(Debug, Clone)]
pub struct OnsetBeatTracker {
    block_size: usize,
}

impl Default for OnsetBeatTracker {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl OnsetBeatTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            block_size: block_size.max(2),
        }
    }

    /// Runs the onset detector over an already decoded waveform.
    pub fn analyse(&self, waveform: &Waveform) -> Result<BeatAnalysis> {
        if waveform.sample_rate == 0 {
            return Err(LightingError::msg("waveform has no sample rate"));
        }

        let mut engine = AnalysisEngine::with_sample_rate(waveform.sample_rate);
        for block in waveform.samples.chunks(self.block_size) {
            // A trailing single sample is too short to analyse.
            if block.len() < 2 {
                break;
            }
            engine.process_block(block)?;
        }

        Ok(BeatAnalysis {
            tempo_bpm: engine.summary().tempo_bpm,
            beat_times: engine.beats().iter().map(|&beat| f64::from(beat)).collect(),
        })
    }
}

impl BeatTracker for OnsetBeatTracker {
    fn track(&mut self, audio: &Path) -> Result<BeatAnalysis> {
        let waveform = audio::decode_file(audio)?;
        self.analyse(&waveform)
    }
}

/// Summary of the analysis metadata accumulated so far.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisSummary {
    pub sample_rate: u32,
    pub tempo_bpm: Option<f32>,
    pub duration_seconds: Option<f32>,
}

/// Onset features for a single analysed block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisFrame {
    pub time: f32,
    pub rms: f32,
    /// Normalised [0, 1] positive change in spectral magnitude relative to
    /// the previous block.
    pub spectral_flux: f32,
    pub beat_confidence: f32,
}

/// Block-based onset detector. Beats are blocks whose energy rise or
/// spectral flux crosses a threshold, at least [`MIN_BEAT_INTERVAL`] apart.
pub struct AnalysisEngine {
    sample_rate: u32,
    summary: AnalysisSummary,
    processed_samples: usize,
    last_rms: f32,
    beat_timestamps: Vec<f32>,
    fft_planner: RealFftPlanner<f32>,
    fft: Option<FftResources>,
}

impl AnalysisEngine {
    /// Creates a new engine using the default 48 kHz sample rate.
    pub fn new() -> Self {
        Self::with_sample_rate(48_000)
    }

    /// Creates a new engine that operates at the provided sample rate.
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            summary: AnalysisSummary {
                sample_rate,
                ..Default::default()
            },
            processed_samples: 0,
            last_rms: 0.0,
            beat_timestamps: Vec::new(),
            fft_planner: RealFftPlanner::new(),
            fft: None,
        }
    }

    /// Returns metadata collected so far about the analysed stream.
    pub fn summary(&self) -> &AnalysisSummary {
        &self.summary
    }

    /// Detected beat timestamps in seconds, ascending.
    pub fn beats(&self) -> &[f32] {
        &self.beat_timestamps
    }

    /// Consumes audio samples and updates the tracked features.
    pub fn process_block(&mut self, samples: &[f32]) -> Result<AnalysisFrame> {
        if samples.len() < 2 {
            return Err(LightingError::msg(
                "analysis requires blocks with at least two samples",
            ));
        }

        let block_size = samples.len();
        let sample_rate = self.sample_rate as f32;
        let start_time = self.processed_samples as f32 / sample_rate;
        let end_time = (self.processed_samples + block_size) as f32 / sample_rate;
        let timestamp = start_time + (end_time - start_time) * 0.5;

        let rms = compute_rms(samples);
        let spectral_flux = self.compute_spectral_flux(samples)?;
        let beat_confidence = self.update_beats(timestamp, rms, spectral_flux);

        self.processed_samples += block_size;
        self.summary.duration_seconds = Some(
            self.summary
                .duration_seconds
                .map(|d| d.max(end_time))
                .unwrap_or(end_time),
        );

        Ok(AnalysisFrame {
            time: timestamp,
            rms,
            spectral_flux,
            beat_confidence,
        })
    }

    fn update_beats(&mut self, timestamp: f32, rms: f32, flux: f32) -> f32 {
        let delta = (rms - self.last_rms).max(0.0);
        self.last_rms = rms;
        let confidence = (delta * BEAT_GAIN).max(flux).clamp(0.0, 1.0);

        if confidence >= BEAT_THRESHOLD
            && self
                .beat_timestamps
                .last()
                .map(|last| timestamp - last >= MIN_BEAT_INTERVAL)
                .unwrap_or(true)
        {
            self.beat_timestamps.push(timestamp);
            self.update_tempo_estimate();
        }

        confidence
    }

    fn update_tempo_estimate(&mut self) {
        if self.beat_timestamps.len() < 2 {
            return;
        }

        let mut sum = 0.0;
        let mut count = 0;
        for window in self.beat_timestamps.windows(2) {
            let interval = window[1] - window[0];
            if interval > f32::EPSILON {
                sum += interval;
                count += 1;
            }
        }

        if count > 0 {
            let average_interval = sum / count as f32;
            if average_interval > 0.0 {
                self.summary.tempo_bpm = Some(60.0 / average_interval);
            }
        }
    }

    fn compute_spectral_flux(&mut self, samples: &[f32]) -> Result<f32> {
        let len = samples.len();
        let fft = self.prepare_fft(len);

        for (index, value) in samples.iter().enumerate() {
            fft.input[index] = *value * hann_value(index, len);
        }

        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)
            .map_err(|err| LightingError::msg(format!("fft failed: {err}")))?;

        let mut rise = 0.0;
        let mut magnitude_sum = 0.0;
        for (bin, previous) in fft.spectrum.iter().zip(fft.previous.iter_mut()) {
            let magnitude = bin.norm();
            rise += (magnitude - *previous).max(0.0);
            magnitude_sum += magnitude;
            *previous = magnitude;
        }

        if magnitude_sum <= f32::EPSILON {
            Ok(0.0)
        } else {
            Ok((rise / magnitude_sum).clamp(0.0, 1.0))
        }
    }

    fn prepare_fft(&mut self, size: usize) -> &mut FftResources {
        let planner = &mut self.fft_planner;
        let fft = self.fft.get_or_insert_with(|| FftResources::new(planner, size));
        if fft.size != size {
            *fft = FftResources::new(planner, size);
        }
        fft
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
    previous: Vec<f32>,
}

impl FftResources {
    fn new(planner: &mut RealFftPlanner<f32>, size: usize) -> Self {
        let plan = planner.plan_fft_forward(size);
        let scratch = plan.make_scratch_vec();
        let spectrum = plan.make_output_vec();
        let input = plan.make_input_vec();
        let previous = vec![0.0; spectrum.len()];
        Self {
            size,
            plan,
            scratch,
            spectrum,
            input,
            previous,
        }
    }
}

impl fmt::Debug for AnalysisEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisEngine")
            .field("sample_rate", &self.sample_rate)
            .field("summary", &self.summary)
            .field("processed_samples", &self.processed_samples)
            .field("last_rms", &self.last_rms)
            .field("beat_timestamps", &self.beat_timestamps.len())
            .finish()
    }
}

impl fmt::Debug for FftResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftResources")
            .field("size", &self.size)
            .finish()
    }
}

fn compute_rms(samples: &[f32]) -> f32 {
    let sum: f32 = samples.iter().map(|sample| sample * sample).sum();
    (sum / samples.len() as f32).sqrt()
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}
