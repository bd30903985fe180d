use chrono::{Datelike, NaiveDate, Weekday};
use rand::Rng;
use tracing::{debug, warn};

pub const DEFAULT_MAX_PER_DAY: u32 = 13;
pub const DEFAULT_ZERO_PCT: f64 = 0.05;

const MIN_STREAKS: usize = 3;
const DAYS_PER_STREAK: usize = 90;

#[derive(Debug, Clone, Copy)]
pub struct AllocConfig {
    /// `None` means `round(eligible * 1.5)`.
    pub target: Option<u32>,
    pub max_per_day: u32,
    pub zero_pct: f64,
}

impl Default for AllocConfig {
    fn default() -> Self {
        Self { target: None, max_per_day: DEFAULT_MAX_PER_DAY, zero_pct: DEFAULT_ZERO_PCT }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCount {
    pub day: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone)]
pub struct Allocation {
    pub days: Vec<DayCount>,
    /// Indices into `days` forced to zero.
    pub zero_days: Vec<usize>,
    pub target: u32,
    pub max_per_day: u32,
}

impl Allocation {
    pub fn total(&self) -> u64 {
        self.days.iter().map(|d| d.count as u64).sum()
    }

    /// Commits requested but not placeable under the per-day cap.
    pub fn shortfall(&self) -> u64 {
        (self.target as u64).saturating_sub(self.total())
    }
}

/// Spread `cfg.target` commits over `days`.
///
/// The total equals the target whenever `target <= eligible * max_per_day`;
/// beyond that the allocation is capped and `Allocation::shortfall` reports
/// the difference.
pub fn allocate<R: Rng + ?Sized>(days: &[NaiveDate], cfg: &AllocConfig, rng: &mut R) -> Allocation {
    let n = days.len();
    let max_per_day = cfg.max_per_day.max(1);
    let zero_pct = if cfg.zero_pct.is_finite() { cfg.zero_pct.clamp(0.0, 1.0) } else { DEFAULT_ZERO_PCT };

    let mut weights = base_weights(days, rng);
    add_streaks(&mut weights, rng);

    let zero_n = ((n as f64 * zero_pct).round() as usize).min(n);
    let mut zero_days = rand::seq::index::sample(rng, n, zero_n).into_vec();
    zero_days.sort_unstable();

    let mut is_zero = vec![false; n];
    for &i in &zero_days {
        is_zero[i] = true;
        weights[i] = 0.0;
    }

    let eligible = n - zero_n;
    let target = cfg.target.unwrap_or_else(|| (eligible as f64 * 1.5).round() as u32);
    debug!(days = n, eligible, zero_days = zero_n, target, max_per_day, "allocating");

    let mut counts = vec![0u32; n];
    let mut placed: u64 = 0;

    while placed < target as u64 {
        if !weights.iter().any(|w| *w > 0.0) {
            break;
        }
        let Some(i) = weighted_pick(&weights, rng) else { break };
        counts[i] += 1;
        placed += 1;
        if counts[i] >= max_per_day {
            weights[i] = 0.0;
        }
    }

    if placed < target as u64 {
        for i in (0..n).filter(|i| !is_zero[*i]) {
            while counts[i] < max_per_day && placed < target as u64 {
                counts[i] += 1;
                placed += 1;
            }
            if placed >= target as u64 {
                break;
            }
        }
    }

    for &i in &zero_days {
        counts[i] = 0;
    }

    let alloc = Allocation {
        days: days.iter().zip(counts).map(|(&day, count)| DayCount { day, count }).collect(),
        zero_days,
        target,
        max_per_day,
    };
    if alloc.shortfall() > 0 {
        warn!(
            target,
            capacity = eligible as u64 * max_per_day as u64,
            shortfall = alloc.shortfall(),
            "target exceeds per-day capacity; allocation is capped"
        );
    }
    alloc
}

/// Weight-proportional index draw. Zero-weight entries are never chosen.
/// Returns `None` when there is nothing to draw from.
pub fn weighted_pick<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if total.is_nan() || total <= 0.0 {
        return None;
    }
    let draw = rng.random_range(0.0..total);
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if *w > 0.0 && acc > draw {
            return Some(i);
        }
    }
    // float drift: fall back to the last drawable entry
    weights.iter().rposition(|w| *w > 0.0)
}

fn base_weights<R: Rng + ?Sized>(days: &[NaiveDate], rng: &mut R) -> Vec<f64> {
    days.iter()
        .map(|d| match d.weekday() {
            Weekday::Sat | Weekday::Sun => 0.35 + rng.random_range(0.0..0.3),
            _ => 1.0 + rng.random_range(0.0..0.5),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Streak {
    start: usize,
    len: usize,
    peak: f64,
}

impl Streak {
    /// Boost decaying linearly from `peak`; runs past the end are clipped.
    fn apply(&self, weights: &mut [f64]) {
        let Some(run) = weights.get_mut(self.start..) else { return };
        for (k, w) in run.iter_mut().take(self.len).enumerate() {
            *w += self.peak * (1.0 - k as f64 / self.len as f64);
        }
    }
}

fn plan_streaks<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<Streak> {
    if n == 0 {
        return Vec::new();
    }
    (0..MIN_STREAKS.max(n / DAYS_PER_STREAK))
        .map(|_| Streak {
            start: rng.random_range(0..n),
            len: rng.random_range(3..=12usize),
            peak: rng.random_range(1.0..3.0),
        })
        .collect()
}

fn add_streaks<R: Rng + ?Sized>(weights: &mut [f64], rng: &mut R) {
    for streak in plan_streaks(weights.len(), rng) {
        streak.apply(weights);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::generate_dates;
    use rand::{rngs::StdRng, SeedableRng};

    fn year() -> Vec<NaiveDate> {
        generate_dates(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap())
    }

    fn cfg(target: Option<u32>, max_per_day: u32, zero_pct: f64) -> AllocConfig {
        AllocConfig { target, max_per_day, zero_pct }
    }

    #[test]
    fn hits_target_with_expected_zero_days() {
        let days = year();
        assert_eq!(days.len(), 365);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let a = allocate(&days, &cfg(Some(100), 13, 0.05), &mut rng);
            assert_eq!(a.total(), 100);
            assert_eq!(a.zero_days.len(), 18);
            for &i in &a.zero_days {
                assert_eq!(a.days[i].count, 0);
            }
        }
    }

    #[test]
    fn counts_respect_cap() {
        let days = year();
        let mut rng = StdRng::seed_from_u64(7);
        let a = allocate(&days, &cfg(Some(2000), 9, 0.1), &mut rng);
        assert_eq!(a.total(), 2000);
        assert!(a.days.iter().all(|d| d.count <= 9));
    }

    #[test]
    fn default_target_scales_with_eligible_days() {
        let days = year();
        let mut rng = StdRng::seed_from_u64(3);
        let a = allocate(&days, &AllocConfig::default(), &mut rng);
        // 365 - 18 eligible days
        assert_eq!(a.target, 521);
        assert_eq!(a.total(), 521);
    }

    #[test]
    fn exact_capacity_is_filled() {
        let days = year();
        let mut rng = StdRng::seed_from_u64(11);
        let a = allocate(&days, &cfg(Some(347 * 2), 2, 0.05), &mut rng);
        assert_eq!(a.total(), 694);
        assert_eq!(a.shortfall(), 0);
        let zero: std::collections::HashSet<_> = a.zero_days.iter().copied().collect();
        for (i, d) in a.days.iter().enumerate() {
            assert_eq!(d.count, if zero.contains(&i) { 0 } else { 2 });
        }
    }

    #[test]
    fn over_capacity_is_capped_not_fixed() {
        let days = year();
        let mut rng = StdRng::seed_from_u64(5);
        let a = allocate(&days, &cfg(Some(10_000), 3, 0.05), &mut rng);
        assert_eq!(a.total(), 347 * 3);
        assert_eq!(a.shortfall(), 10_000 - 347 * 3);
    }

    #[test]
    fn max_per_day_floored_at_one() {
        let days = year();
        let mut rng = StdRng::seed_from_u64(1);
        let a = allocate(&days, &cfg(Some(30), 0, 0.0), &mut rng);
        assert_eq!(a.max_per_day, 1);
        assert_eq!(a.total(), 30);
        assert!(a.days.iter().all(|d| d.count <= 1));
    }

    #[test]
    fn all_zero_days_allocates_nothing() {
        let days = year();
        let mut rng = StdRng::seed_from_u64(9);
        let a = allocate(&days, &cfg(Some(50), 13, 1.0), &mut rng);
        assert_eq!(a.total(), 0);
        assert_eq!(a.zero_days.len(), 365);
        assert_eq!(a.shortfall(), 50);
    }

    #[test]
    fn empty_range() {
        let mut rng = StdRng::seed_from_u64(0);
        let a = allocate(&[], &cfg(Some(10), 13, 0.05), &mut rng);
        assert!(a.days.is_empty());
        assert_eq!(a.total(), 0);
    }

    #[test]
    fn weighted_pick_skips_zero_weights() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            assert_eq!(weighted_pick(&[0.0, 0.0, 5.0], &mut rng), Some(2));
        }
    }

    #[test]
    fn weighted_pick_degenerate_input() {
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(weighted_pick(&[], &mut rng), None);
        assert_eq!(weighted_pick(&[0.0, 0.0], &mut rng), None);
    }

    #[test]
    fn weekdays_outweigh_weekends() {
        let days = year();
        let mut rng = StdRng::seed_from_u64(21);
        let w = base_weights(&days, &mut rng);
        for (d, w) in days.iter().zip(w) {
            match d.weekday() {
                Weekday::Sat | Weekday::Sun => assert!(w < 0.65),
                _ => assert!(w >= 1.0),
            }
        }
    }

    #[test]
    fn streak_count_and_shape() {
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(plan_streaks(10, &mut rng).len(), 3);
        assert_eq!(plan_streaks(365, &mut rng).len(), 4);
        assert_eq!(plan_streaks(1000, &mut rng).len(), 11);
        assert!(plan_streaks(0, &mut rng).is_empty());

        for s in plan_streaks(365, &mut rng) {
            assert!(s.start < 365);
            assert!((3..=12).contains(&s.len));
            assert!((1.0..3.0).contains(&s.peak));
        }
    }

    #[test]
    fn streak_decays_linearly() {
        let streak = Streak { start: 2, len: 4, peak: 2.0 };
        let mut weights = vec![0.0; 10];
        streak.apply(&mut weights);
        assert_eq!(weights, vec![0.0, 0.0, 2.0, 1.5, 1.0, 0.5, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn streaks_clip_at_end() {
        let streak = Streak { start: 3, len: 12, peak: 1.0 };
        let mut weights = vec![0.0; 5];
        streak.apply(&mut weights);
        assert_eq!(weights.len(), 5);
        assert_eq!(&weights[..3], &[0.0, 0.0, 0.0]);
        assert!(weights[3] > weights[4] && weights[4] > 0.0);

        // every streak on a single day lands on index 0
        let mut one = vec![0.0];
        let mut rng = StdRng::seed_from_u64(2);
        add_streaks(&mut one, &mut rng);
        assert_eq!(one.len(), 1);
        assert!(one[0] >= 3.0 && one[0] < 9.0);
    }
}
