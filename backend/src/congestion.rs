use rand::{seq::SliceRandom, Rng};
use shared::{Congestion, CongestionLevel, CongestionSegment};

/// How a path is cut into congestion segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stride {
    /// One segment per consecutive pair of points.
    EveryPair,
    /// Roughly five segments, stride `len / 5`.
    Fifths,
}

impl Stride {
    fn step(self, len: usize) -> usize {
        match self {
            Stride::EveryPair => 1,
            Stride::Fifths => (len / 5).max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CongestionPolicy {
    /// Uniform score in `[min, max]`.
    Continuous { min: f64, max: f64 },
    /// Uniform draw over low/medium/high, stored as the band midpoint.
    Categorical,
}

impl CongestionPolicy {
    pub fn continuous(min: f64, max: f64) -> Self {
        CongestionPolicy::Continuous {
            min: min.min(max),
            max: max.max(min),
        }
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Congestion {
        match *self {
            CongestionPolicy::Continuous { min, max } if max > min => {
                Congestion::new(rng.gen_range(min..max))
            }
            CongestionPolicy::Continuous { min, .. } => Congestion::new(min),
            CongestionPolicy::Categorical => {
                let level = CongestionLevel::ALL
                    .choose(rng)
                    .copied()
                    .unwrap_or(CongestionLevel::Medium);
                Congestion::from(level)
            }
        }
    }
}

/// Cuts a path of `len` points into segments that cover every index exactly
/// once: the first starts at 0, each starts where the previous ended, and the
/// last ends at `len - 1`. Paths shorter than two points yield no segments.
pub fn sample<R: Rng + ?Sized>(
    len: usize,
    stride: Stride,
    policy: CongestionPolicy,
    rng: &mut R,
) -> Vec<CongestionSegment> {
    if len < 2 {
        return Vec::new();
    }
    let last = len - 1;
    let step = stride.step(len);

    let mut segments = Vec::with_capacity(last / step + 1);
    let mut start = 0;
    while start < last {
        let end = (start + step).min(last);
        segments.push(CongestionSegment {
            start,
            end,
            congestion: policy.draw(rng),
        });
        start = end;
    }
    segments
}

/// Length-unweighted mean of the segment scores.
pub fn mean_congestion(segments: &[CongestionSegment]) -> Congestion {
    if segments.is_empty() {
        return Congestion::new(0.0);
    }
    let total: f64 = segments.iter().map(|s| s.congestion.score()).sum();
    Congestion::new(total / segments.len() as f64)
}
