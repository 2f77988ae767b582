//! In place radix-2 decimation in time FFT.
//!
//! Twiddle factors are advanced by complex multiplication inside each block, so there is one
//! `sin`/`cos` pair per stage and none in the butterfly loop.
use core::f32::consts::PI;

use num_complex::Complex32;
// std float methods shadow it in test builds
#[cfg(not(test))]
use num_traits::Float;

/// Forward transform (`e^{-i2πkn/N}`) of `data`, in place.
///
/// `data.len()` has to be a power of two. The sample buffer and the acquisition config make
/// sure of that, so it is only checked in debug builds.
pub fn transform(data: &mut [Complex32]) {
    let n = data.len();
    debug_assert!(n.is_power_of_two(), "fft size {} is not a power of two", n);
    if n < 2 {
        return;
    }

    bit_reverse(data);

    let mut len = 2;
    while len <= n {
        let angle = -2.0 * PI / len as f32;
        let w_len = Complex32::new(angle.cos(), angle.sin());
        let half = len / 2;

        for block in data.chunks_exact_mut(len) {
            let (lower, upper) = block.split_at_mut(half);
            let mut w = Complex32::new(1.0, 0.0);
            for (a, b) in lower.iter_mut().zip(upper.iter_mut()) {
                let u = *a;
                let v = *b * w;
                *a = u + v;
                *b = u - v;
                w *= w_len;
            }
        }

        len <<= 1;
    }
}

fn bit_reverse(data: &mut [Complex32]) {
    let n = data.len();
    let mut j = 0;
    for i in 1..n {
        let mut bit = n >> 1;
        while j >= bit {
            j -= bit;
            bit >>= 1;
        }
        j += bit;
        if i < j {
            data.swap(i, j);
        }
    }
}

/// Magnitudes of bins `1..n/2` of a transformed buffer into `out[1..n/2]`.
///
/// Bin 0 is DC and always reported as zero, everything above Nyquist mirrors the lower half and
/// is never looked at.
pub fn magnitudes(spectrum: &[Complex32], out: &mut [f32]) {
    let half = spectrum.len() / 2;
    debug_assert!(out.len() >= half);

    if let Some(dc) = out.first_mut() {
        *dc = 0.0;
    }
    for (mag, bin) in out[..half].iter_mut().zip(spectrum).skip(1) {
        *mag = bin.norm_sqr().sqrt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    fn sine(n: usize, k: usize) -> Vec<Complex32> {
        (0..n)
            .map(|t| {
                let phase = 2.0 * core::f64::consts::PI * (k * t) as f64 / n as f64;
                Complex32::new(phase.sin() as f32, 0.0)
            })
            .collect()
    }

    fn spectrum_of(mut data: Vec<Complex32>) -> Vec<f32> {
        transform(&mut data);
        let mut mags = std::vec![0.0; data.len() / 2];
        magnitudes(&data, &mut mags);
        mags
    }

    #[test]
    fn bin_aligned_sine_peaks_at_its_bin() {
        for exp in 2..=10 {
            let n = 1 << exp;
            for k in [1, n / 4, n / 2 - 1] {
                let mags = spectrum_of(sine(n, k));
                let expected = n as f32 / 2.0;

                assert!(
                    (mags[k] - expected).abs() < expected * 1e-3,
                    "n={} k={} mag={}",
                    n,
                    k,
                    mags[k]
                );
                for (bin, mag) in mags.iter().enumerate().skip(1) {
                    if bin != k {
                        assert!(*mag < expected * 1e-2, "n={} k={} bin {} = {}", n, k, bin, mag);
                    }
                }
            }
        }
    }

    #[test]
    fn zeros_stay_zero() {
        let mags = spectrum_of(std::vec![Complex32::new(0.0, 0.0); 256]);
        assert!(mags.iter().all(|m| *m == 0.0));
    }

    #[test]
    fn dc_is_excluded() {
        let mags = spectrum_of(std::vec![Complex32::new(0.75, 0.0); 64]);
        assert_eq!(mags[0], 0.0);
        assert!(mags.iter().skip(1).all(|m| *m < 1e-4));
    }

    #[test]
    fn matches_naive_dft() {
        let n = 16;
        let input: Vec<Complex32> = (0..n)
            .map(|t| Complex32::new(((t * 7 + 3) % 11) as f32 - 5.0, ((t * 3) % 5) as f32))
            .collect();

        let mut fast = input.clone();
        transform(&mut fast);

        for (k, out) in fast.iter().enumerate() {
            let mut acc = Complex32::new(0.0, 0.0);
            for (t, x) in input.iter().enumerate() {
                let angle = -2.0 * PI * (k * t) as f32 / n as f32;
                acc += x * Complex32::new(angle.cos(), angle.sin());
            }
            assert!((acc - out).norm() < 1e-3, "bin {}: {} vs {}", k, acc, out);
        }
    }

    #[test]
    fn impulse_is_flat() {
        let mut data = std::vec![Complex32::new(0.0, 0.0); 32];
        data[0] = Complex32::new(1.0, 0.0);
        transform(&mut data);
        assert!(data.iter().all(|c| (c.re - 1.0).abs() < 1e-6 && c.im.abs() < 1e-6));
    }
}
