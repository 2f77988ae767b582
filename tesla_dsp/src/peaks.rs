//! Picks the dominant frequencies out of a magnitude spectrum.
use crate::config::PeakThresholds;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyPeak {
    pub frequency: f32,
    pub magnitude: f32,
}

/// One entry per oscillator. `None` means the slot is inactive for this pass.
pub type PeakSlots<const N: usize> = [Option<FrequencyPeak>; N];

pub fn bin_frequency(bin: usize, sample_rate: f32, fft_size: usize) -> f32 {
    bin as f32 * sample_rate / fft_size as f32
}

/// Fills exactly `N` slots from `magnitudes` (bins `0..fft_size/2`, bin 0 ignored).
///
/// Every slot takes the largest bin still in the spectrum. If that bin passes the thresholds it
/// is zeroed so the next slot looks further down, otherwise the slot stays empty and the bin is
/// left alone. Only the exact winning bin is zeroed, neighbours leaking energy from the same
/// tone can win later slots.
pub fn extract_top_peaks<const N: usize>(
    magnitudes: &mut [f32],
    thresholds: &PeakThresholds,
    sample_rate: f32,
    fft_size: usize,
) -> PeakSlots<N> {
    let relative_cutoff = global_max(magnitudes) * thresholds.rel_fraction;

    let mut slots = [None; N];
    for slot in slots.iter_mut() {
        let Some((bin, magnitude)) = loudest_bin(magnitudes) else {
            continue;
        };
        let frequency = bin_frequency(bin, sample_rate, fft_size);

        let accepted = frequency > thresholds.min_freq
            && frequency < thresholds.max_freq
            && magnitude > thresholds.abs_floor
            && magnitude > relative_cutoff;

        if accepted {
            magnitudes[bin] = 0.0;
            *slot = Some(FrequencyPeak {
                frequency,
                magnitude,
            });
        }
    }

    slots
}

/// Strongest non-DC bin, or 0 for an empty spectrum.
pub fn global_max(magnitudes: &[f32]) -> f32 {
    magnitudes
        .iter()
        .skip(1)
        .fold(0.0, |max, mag| if *mag > max { *mag } else { max })
}

/// Lowest index wins a tie. DC is never a candidate.
fn loudest_bin(magnitudes: &[f32]) -> Option<(usize, f32)> {
    let mut loudest = None;
    let mut max = 0.0;
    for (bin, mag) in magnitudes.iter().enumerate().skip(1) {
        if *mag > max {
            max = *mag;
            loudest = Some((bin, *mag));
        }
    }
    loudest
}

pub fn active_count<const N: usize>(slots: &PeakSlots<N>) -> usize {
    slots.iter().filter(|s| s.is_some()).count()
}
