//! Handoff between the sample producer (ADC + DMA) and the spectrum analysis.
//!
//! A [`SampleBuffer`] holds two generations. The producer fills one while the other waits for
//! the consumer. When the producer finishes a generation while the previous one still has not
//! been consumed, the fresh generation is thrown away and counted as an overrun. This is lossy
//! on purpose; the alternative would be stalling the converter.
use crate::config::check_power_of_two;
use crate::error::ConfigurationError;

/// Raw reading from a 12 bit converter.
pub type Sample = u16;

/// Outcome of handing samples to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deposit {
    /// The current generation is still filling.
    Pending,
    /// A generation completed and can be consumed.
    Ready,
    /// A generation completed but the previous one was never consumed, so it was dropped.
    Overrun,
}

pub struct SampleBuffer<const N: usize> {
    generations: [[Sample; N]; 2],
    writing: usize,
    cursor: usize,
    ready: bool,
    completed: u32,
    overruns: u32,
}

impl<const N: usize> SampleBuffer<N> {
    pub fn new() -> Result<Self, ConfigurationError> {
        check_power_of_two(N)?;
        Ok(Self {
            generations: [[0; N]; 2],
            writing: 0,
            cursor: 0,
            ready: false,
            completed: 0,
            overruns: 0,
        })
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Append a single sample, for producers that fire once per conversion.
    pub fn deposit(&mut self, sample: Sample) -> Deposit {
        self.generations[self.writing][self.cursor] = sample;
        self.cursor += 1;
        if self.cursor < N {
            Deposit::Pending
        } else {
            self.complete_generation()
        }
    }

    /// Hand over a whole block at once, for producers that move a full buffer by DMA.
    ///
    /// Any partially deposited samples are discarded.
    pub fn load_generation(&mut self, block: &[Sample; N]) -> Deposit {
        if !self.ready {
            self.generations[self.writing].copy_from_slice(block);
        }
        self.complete_generation()
    }

    fn complete_generation(&mut self) -> Deposit {
        self.cursor = 0;
        if self.ready {
            self.overruns = self.overruns.wrapping_add(1);
            Deposit::Overrun
        } else {
            self.ready = true;
            self.writing ^= 1;
            self.completed = self.completed.wrapping_add(1);
            Deposit::Ready
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Read the ready generation, if any, and release it back to the producer.
    pub fn consume<R>(&mut self, f: impl FnOnce(&[Sample; N]) -> R) -> Option<R> {
        if !self.ready {
            return None;
        }
        let result = f(&self.generations[self.writing ^ 1]);
        self.ready = false;
        Some(result)
    }

    /// Generations that were handed to the consumer.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Generations dropped because the consumer was still behind.
    pub fn overruns(&self) -> u32 {
        self.overruns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill<const N: usize>(buffer: &mut SampleBuffer<N>, start: Sample) -> Deposit {
        let mut last = Deposit::Pending;
        for i in 0..N {
            last = buffer.deposit(start + i as Sample);
        }
        last
    }

    #[test]
    fn size_must_be_power_of_two() {
        assert!(SampleBuffer::<256>::new().is_ok());
        assert_eq!(
            SampleBuffer::<100>::new().err(),
            Some(ConfigurationError::BufferSizeNotPowerOfTwo(100))
        );
    }

    #[test]
    fn completes_once_per_generation() {
        let mut buffer = SampleBuffer::<8>::new().unwrap();
        for i in 0..7 {
            assert_eq!(buffer.deposit(i), Deposit::Pending);
            assert!(!buffer.is_ready());
        }
        assert_eq!(buffer.deposit(7), Deposit::Ready);
        assert!(buffer.is_ready());
        assert_eq!(buffer.completed(), 1);

        let samples = buffer.consume(|s| *s).unwrap();
        assert_eq!(samples, [0, 1, 2, 3, 4, 5, 6, 7]);
        assert!(buffer.consume(|_| ()).is_none());
    }

    #[test]
    fn producer_writes_other_generation_while_ready() {
        let mut buffer = SampleBuffer::<4>::new().unwrap();
        fill(&mut buffer, 10);
        // Half of the next generation lands while the consumer has not looked yet.
        buffer.deposit(100);
        buffer.deposit(101);

        assert_eq!(buffer.consume(|s| *s), Some([10, 11, 12, 13]));

        buffer.deposit(102);
        assert_eq!(buffer.deposit(103), Deposit::Ready);
        assert_eq!(buffer.consume(|s| *s), Some([100, 101, 102, 103]));
    }

    #[test]
    fn overrun_drops_newest_generation() {
        let mut buffer = SampleBuffer::<4>::new().unwrap();
        assert_eq!(fill(&mut buffer, 0), Deposit::Ready);
        assert_eq!(fill(&mut buffer, 20), Deposit::Overrun);
        assert_eq!(fill(&mut buffer, 40), Deposit::Overrun);
        assert_eq!(buffer.overruns(), 2);
        assert_eq!(buffer.completed(), 1);

        // The generation the consumer was promised is untouched.
        assert_eq!(buffer.consume(|s| *s), Some([0, 1, 2, 3]));

        assert_eq!(fill(&mut buffer, 60), Deposit::Ready);
        assert_eq!(buffer.consume(|s| *s), Some([60, 61, 62, 63]));
    }

    #[test]
    fn load_generation_hands_over_whole_block() {
        let mut buffer = SampleBuffer::<4>::new().unwrap();
        buffer.deposit(999);
        assert_eq!(buffer.load_generation(&[1, 2, 3, 4]), Deposit::Ready);
        assert_eq!(buffer.load_generation(&[5, 6, 7, 8]), Deposit::Overrun);
        assert_eq!(buffer.consume(|s| *s), Some([1, 2, 3, 4]));
        assert_eq!(buffer.load_generation(&[5, 6, 7, 8]), Deposit::Ready);
        assert_eq!(buffer.consume(|s| *s), Some([5, 6, 7, 8]));
    }
}
