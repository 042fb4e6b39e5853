//! Simulated channel noise applied by the relay.
//!
//! One Bernoulli trial per record decides whether corruption is attempted.
//! When it fires, 1 to 3 payload bytes are picked (uniformly, independently,
//! possibly the same byte twice) and every bit of each is flipped. A byte
//! flipped twice is restored, so an attempt is not guaranteed to be visible.
//!
//! The checksum field is never touched.
//!
//! # Determinism
//!
//! All randomness comes from an owned ChaCha8 RNG. Seeded injectors produce
//! identical corruption for identical input.

use protocol::{Frame, PAYLOAD_SIZE};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Most bytes flipped in one attempt.
pub const MAX_FLIPS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbabilityError {
    #[error("invalid error probability '{0}', expected an integer 0-100")]
    Parse(String),

    #[error("error probability {0} is out of range 0-100")]
    OutOfRange(u32),
}

/// Chance of corruption per record, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probability(u8);

impl Probability {
    pub const NEVER: Probability = Probability(0);
    pub const ALWAYS: Probability = Probability(100);

    pub fn new(percent: u32) -> Result<Self, ProbabilityError> {
        if percent > 100 {
            return Err(ProbabilityError::OutOfRange(percent));
        }
        Ok(Probability(percent as u8))
    }

    pub fn percent(self) -> u8 {
        self.0
    }
}

impl FromStr for Probability {
    type Err = ProbabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let percent = s
            .trim()
            .parse::<u32>()
            .map_err(|_| ProbabilityError::Parse(s.to_string()))?;
        Probability::new(percent)
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// What one call to [`ErrorInjector::corrupt`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corruption {
    offsets: Vec<usize>,
}

impl Corruption {
    /// Whether the trial fired and at least one flip was applied.
    pub fn attempted(&self) -> bool {
        !self.offsets.is_empty()
    }

    /// Flipped payload offsets, in the order they were drawn.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }
}

/// Probabilistic byte flipper.
///
/// # Thread Safety
/// Owns its RNG; give each relay loop its own instance.
pub struct ErrorInjector<R = ChaCha8Rng> {
    probability: Probability,
    rng: R,
}

impl ErrorInjector<ChaCha8Rng> {
    /// Deterministic injector for reproducible runs and tests.
    pub fn seeded(probability: Probability, seed: u64) -> Self {
        Self::with_rng(probability, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Injector seeded from operating system entropy.
    pub fn from_entropy(probability: Probability) -> Self {
        Self::with_rng(probability, ChaCha8Rng::from_entropy())
    }
}

impl<R: Rng> ErrorInjector<R> {
    pub fn with_rng(probability: Probability, rng: R) -> Self {
        ErrorInjector { probability, rng }
    }

    pub fn probability(&self) -> Probability {
        self.probability
    }

    /// Maybe corrupt the payload of `frame` in place.
    pub fn corrupt(&mut self, frame: &mut Frame) -> Corruption {
        let roll: u8 = self.rng.gen_range(0..100);
        if roll >= self.probability.percent() {
            return Corruption::default();
        }

        let flips = self.rng.gen_range(1..=MAX_FLIPS);
        let mut offsets = Vec::with_capacity(flips);
        for _ in 0..flips {
            let offset = self.rng.gen_range(0..PAYLOAD_SIZE);
            frame[offset] ^= 0xFF;
            offsets.push(offset);
        }

        Corruption { offsets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{OperationKind, OperationRecord, RECORD_SIZE};

    fn sample_frame() -> Frame {
        OperationRecord::request(OperationKind::Add, 1234, -5678).encode()
    }

    #[test]
    fn test_probability_parse() {
        assert_eq!("0".parse::<Probability>(), Ok(Probability::NEVER));
        assert_eq!("100".parse::<Probability>(), Ok(Probability::ALWAYS));
        assert_eq!(" 42 ".parse::<Probability>().unwrap().percent(), 42);
        assert_eq!(
            "101".parse::<Probability>(),
            Err(ProbabilityError::OutOfRange(101))
        );
        assert!(matches!(
            "-3".parse::<Probability>(),
            Err(ProbabilityError::Parse(_))
        ));
        assert!("often".parse::<Probability>().is_err());
    }

    #[test]
    fn test_never_mutates_at_zero() {
        let mut injector = ErrorInjector::seeded(Probability::NEVER, 7);
        let original = sample_frame();

        for _ in 0..1000 {
            let mut frame = original;
            let corruption = injector.corrupt(&mut frame);
            assert!(!corruption.attempted());
            assert_eq!(frame, original);
        }
    }

    #[test]
    fn test_always_attempts_at_hundred() {
        let mut injector = ErrorInjector::seeded(Probability::ALWAYS, 11);

        for _ in 0..1000 {
            let mut frame = sample_frame();
            let corruption = injector.corrupt(&mut frame);
            assert!(corruption.attempted());
            assert!((1..=MAX_FLIPS).contains(&corruption.offsets().len()));
        }
    }

    #[test]
    fn test_flips_match_report() {
        let mut injector = ErrorInjector::seeded(Probability::ALWAYS, 3);

        for _ in 0..500 {
            let original = sample_frame();
            let mut frame = original;
            let corruption = injector.corrupt(&mut frame);

            // Replay the reported flips on a copy
            let mut expected = original;
            for &offset in corruption.offsets() {
                expected[offset] ^= 0xFF;
            }
            assert_eq!(frame, expected);
        }
    }

    #[test]
    fn test_never_touches_crc() {
        let mut injector = ErrorInjector::seeded(Probability::ALWAYS, 99);
        let original = sample_frame();

        for _ in 0..5000 {
            let mut frame = original;
            injector.corrupt(&mut frame);
            assert_eq!(&frame[PAYLOAD_SIZE..RECORD_SIZE], &original[PAYLOAD_SIZE..]);
        }
    }

    #[test]
    fn test_offsets_are_uniform() {
        let mut injector = ErrorInjector::seeded(Probability::ALWAYS, 2024);
        let mut hits = [0u32; PAYLOAD_SIZE];
        let mut total = 0u32;

        for _ in 0..20_000 {
            let mut frame = sample_frame();
            for &offset in injector.corrupt(&mut frame).offsets() {
                hits[offset] += 1;
                total += 1;
            }
        }

        // About 40_000 draws over 20 offsets; allow 15% either side
        let expected = total as f64 / PAYLOAD_SIZE as f64;
        for (offset, &count) in hits.iter().enumerate() {
            let ratio = count as f64 / expected;
            assert!(
                (0.85..1.15).contains(&ratio),
                "offset {offset} hit {count} times, expected ~{expected:.0}"
            );
        }
    }

    #[test]
    fn test_flip_count_is_uniform() {
        let mut injector = ErrorInjector::seeded(Probability::ALWAYS, 5);
        let mut counts = [0u32; MAX_FLIPS + 1];

        for _ in 0..9_000 {
            let mut frame = sample_frame();
            counts[injector.corrupt(&mut frame).offsets().len()] += 1;
        }

        assert_eq!(counts[0], 0);
        for &count in &counts[1..] {
            assert!((2_500..3_500).contains(&count), "count {count}");
        }
    }

    #[test]
    fn test_trial_rate() {
        let mut injector = ErrorInjector::seeded(Probability::new(30).unwrap(), 42);
        let mut fired = 0;

        for _ in 0..10_000 {
            let mut frame = sample_frame();
            if injector.corrupt(&mut frame).attempted() {
                fired += 1;
            }
        }

        assert!((2_600..3_400).contains(&fired), "fired {fired} times");
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let mut a = ErrorInjector::seeded(Probability::new(50).unwrap(), 12345);
        let mut b = ErrorInjector::seeded(Probability::new(50).unwrap(), 12345);

        for _ in 0..200 {
            let mut fa = sample_frame();
            let mut fb = sample_frame();
            assert_eq!(a.corrupt(&mut fa), b.corrupt(&mut fb));
            assert_eq!(fa, fb);
        }
    }
}
