// Signal-to-noise ratio
// Noise/signal amplitude spectra, smoothing and per-frequency SNR

use realfft::RealFftPlanner;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::params::{SignalEnd, SignalSplit};
use crate::model::time::seconds_between;
use crate::model::trace::StationTrace;
use crate::processing::smoothing::{konno_ohmachi_smooth, log_frequencies};

/// Fewest samples a window may have for a spectrum to be computed
pub const MIN_POINTS_IN_WINDOW: usize = 10;

/// Fraction of each window end tapered with a Hann half-window
pub const TAPER_WIDTH: f64 = 0.05;

pub const NOISE_SPECTRUM: &str = "noise_spectrum";
pub const SIGNAL_SPECTRUM: &str = "signal_spectrum";
pub const SNR: &str = "snr";

#[derive(Debug, Error)]
pub enum SnrError {
    #[error("Cannot compute SNR; no signal split method available.")]
    NoSplit,

    #[error("Not enough points in noise window to compute SNR.")]
    NoiseTooShort,

    #[error("Not enough points in signal window to compute SNR.")]
    SignalTooShort,

    #[error("FFT failed: {0}")]
    Fft(#[from] realfft::FftError),
}

pub type SnrResult<T> = Result<T, SnrError>;

/// Smoothed spectra and their ratio on a shared log-spaced grid
#[derive(Debug, Clone, PartialEq)]
pub struct SnrSpectra {
    pub freq: Vec<f64>,
    pub noise: Vec<f64>,
    pub signal: Vec<f64>,
    pub snr: Vec<f64>,
}

/// Samples strictly before `split` are noise; the rest (up to the signal
/// end, when known) are signal
pub fn split_windows(trace: &StationTrace, split: &SignalSplit) -> (Vec<f64>, Vec<f64>) {
    let n = trace.npts();
    let sr = trace.sampling_rate();
    let index_at = |seconds: f64| -> usize {
        let k = (seconds * sr - 1e-9).ceil();
        if k <= 0.0 {
            0
        } else {
            (k as usize).min(n)
        }
    };

    let split_idx = index_at(seconds_between(split.split_time, trace.starttime()));
    let end_idx = match trace.get_typed::<SignalEnd>() {
        Ok(end) => (index_at(seconds_between(end.end_time, trace.starttime())) + 1)
            .clamp(split_idx, n),
        Err(_) => n,
    };

    let data = trace.data();
    (
        data[..split_idx].to_vec(),
        data[split_idx..end_idx].to_vec(),
    )
}

pub fn demean(samples: &mut [f64]) {
    if samples.is_empty() {
        return;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    for x in samples.iter_mut() {
        *x -= mean;
    }
}

/// Hann taper over `width` of the samples at each end
pub fn taper_hann(samples: &mut [f64], width: f64) {
    let n = samples.len();
    let w = (width * n as f64).floor() as usize;
    if w == 0 {
        return;
    }
    for i in 0..w {
        let factor = 0.5 * (1.0 - (std::f64::consts::PI * i as f64 / w as f64).cos());
        samples[i] *= factor;
        samples[n - 1 - i] *= factor;
    }
}

/// Amplitude spectrum `|rfft| * delta` of samples zero-padded to `nfft`
pub fn amplitude_spectrum(samples: &[f64], nfft: usize, delta: f64) -> SnrResult<Vec<f64>> {
    let mut planner = RealFftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nfft);

    let mut input = fft.make_input_vec();
    let copy_len = samples.len().min(nfft);
    input[..copy_len].copy_from_slice(&samples[..copy_len]);
    let mut spectrum = fft.make_output_vec();

    fft.process(&mut input, &mut spectrum)?;

    Ok(spectrum.iter().map(|c| c.norm() * delta).collect())
}

fn prepare_window(mut samples: Vec<f64>) -> Vec<f64> {
    demean(&mut samples);
    taper_hann(&mut samples, TAPER_WIDTH);
    samples
}

/// Smoothed noise and signal spectra and their ratio for one trace
pub fn compute_snr(
    trace: &StationTrace,
    bandwidth: f64,
    points: usize,
) -> SnrResult<SnrSpectra> {
    let split = trace
        .get_typed::<SignalSplit>()
        .map_err(|_| SnrError::NoSplit)?;

    let (noise, signal) = split_windows(trace, &split);
    if noise.len() < MIN_POINTS_IN_WINDOW {
        return Err(SnrError::NoiseTooShort);
    }
    if signal.len() < MIN_POINTS_IN_WINDOW {
        return Err(SnrError::SignalTooShort);
    }

    let noise = prepare_window(noise);
    let signal = prepare_window(signal);

    let nfft = noise.len().max(signal.len()).next_power_of_two();
    let delta = trace.delta();
    let noise_raw = amplitude_spectrum(&noise, nfft, delta)?;
    let signal_raw = amplitude_spectrum(&signal, nfft, delta)?;

    let df = 1.0 / (nfft as f64 * delta);
    let raw_freqs: Vec<f64> = (0..noise_raw.len()).map(|k| k as f64 * df).collect();
    let nyquist = 0.5 * trace.sampling_rate();
    let freq = log_frequencies(df, nyquist, points);

    let noise = konno_ohmachi_smooth(&noise_raw, &raw_freqs, &freq, bandwidth);
    let signal = konno_ohmachi_smooth(&signal_raw, &raw_freqs, &freq, bandwidth);

    let snr = signal
        .iter()
        .zip(&noise)
        .map(|(&s, &n)| {
            if n > 0.0 {
                s / n
            } else if s > 0.0 {
                f64::INFINITY
            } else {
                0.0
            }
        })
        .collect();

    log::debug!("{}: SNR on {} points, nfft {}", trace.id(), freq.len(), nfft);

    Ok(SnrSpectra {
        freq,
        noise,
        signal,
        snr,
    })
}

/// Compute the SNR of a trace and cache the spectra on it
pub fn compute_snr_trace(
    trace: &mut StationTrace,
    bandwidth: f64,
    points: usize,
) -> SnrResult<SnrSpectra> {
    let spectra = compute_snr(trace, bandwidth, points)?;

    let cached = |values: &[f64]| {
        let mut arrays = BTreeMap::new();
        arrays.insert("freq".to_string(), spectra.freq.clone());
        arrays.insert("spec".to_string(), values.to_vec());
        arrays
    };
    trace.set_cached(NOISE_SPECTRUM, cached(&spectra.noise));
    trace.set_cached(SIGNAL_SPECTRUM, cached(&spectra.signal));

    let mut snr = BTreeMap::new();
    snr.insert("freq".to_string(), spectra.freq.clone());
    snr.insert("snr".to_string(), spectra.snr.clone());
    trace.set_cached(SNR, snr);

    Ok(spectra)
}
