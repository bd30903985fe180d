use std::collections::BTreeMap;
use std::fmt::Write;
use chrono::NaiveDate;

use crate::allocate::Allocation;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub days: usize,
    pub total: u64,
    pub target: u32,
    pub shortfall: u64,
    pub zero_days: usize,
    /// Days sampled as zero-days before allocation.
    pub designated_zero: usize,
    pub zero_pct: f64,
    pub max_day: u32,
    pub cap: u32,
    pub longest_streak: usize,
    /// count value -> number of days with that count
    pub histogram: BTreeMap<u32, usize>,
    pub weekly: Vec<u64>,
}

impl Summary {
    pub fn of(alloc: &Allocation) -> Self {
        let days = alloc.days.len();
        let mut histogram = BTreeMap::new();
        for d in &alloc.days {
            *histogram.entry(d.count).or_insert(0) += 1;
        }
        let zero_days = histogram.get(&0).copied().unwrap_or(0);
        let zero_pct = if days == 0 { 0.0 } else { zero_days as f64 * 100.0 / days as f64 };

        Self {
            start: alloc.days.first().map(|d| d.day),
            end: alloc.days.last().map(|d| d.day),
            days,
            total: alloc.total(),
            target: alloc.target,
            shortfall: alloc.shortfall(),
            zero_days,
            designated_zero: alloc.zero_days.len(),
            zero_pct,
            max_day: alloc.days.iter().map(|d| d.count).max().unwrap_or(0),
            cap: alloc.max_per_day,
            longest_streak: longest_streak(alloc),
            histogram,
            weekly: alloc
                .days
                .chunks(7)
                .map(|w| w.iter().map(|d| d.count as u64).sum())
                .collect(),
        }
    }

    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut s = String::new();
        match (self.start, self.end) {
            (Some(a), Some(b)) => writeln!(s, "Window:         {a} .. {b}")?,
            _ => writeln!(s, "Window:         (empty)")?,
        }
        writeln!(s, "Days:           {}", self.days)?;
        writeln!(s, "Commits:        {} (target {})", self.total, self.target)?;
        if self.shortfall > 0 {
            writeln!(s, "Shortfall:      {} (per-day cap reached)", self.shortfall)?;
        }
        writeln!(
            s,
            "Zero days:      {} ({:.1}%, {} designated)",
            self.zero_days, self.zero_pct, self.designated_zero
        )?;
        writeln!(s, "Max per day:    {} (cap {})", self.max_day, self.cap)?;
        writeln!(s, "Longest streak: {} days", self.longest_streak)?;
        writeln!(s, "Weekly:         {}", sparkline(&self.weekly))?;
        writeln!(s)?;
        writeln!(s, "Histogram (commits -> days):")?;
        let widest = self.histogram.values().copied().max().unwrap_or(0);
        for (count, n) in &self.histogram {
            let bar = if widest == 0 { 0 } else { (n * 40).div_ceil(widest) };
            writeln!(s, "  {count:>3} | {n:>4} {}", "#".repeat(bar))?;
        }
        Ok(s)
    }
}

fn longest_streak(alloc: &Allocation) -> usize {
    let mut best = 0;
    let mut run = 0;
    for d in &alloc.days {
        if d.count > 0 { run += 1; best = best.max(run); } else { run = 0; }
    }
    best
}

fn sparkline(vals: &[u64]) -> String {
    const BLOCKS: &[char] = &['▁','▂','▃','▄','▅','▆','▇','█'];

    let (min_v, max_v) = match (vals.iter().min(), vals.iter().max()) {
        (Some(a), Some(b)) => (*a, *b),
        _ => (0, 0),
    };

    if max_v == min_v {
        return std::iter::repeat(BLOCKS[0]).take(vals.len()).collect();
    }

    vals.iter()
        .map(|v| {
            let norm = (v - min_v) as f64 / (max_v - min_v) as f64;
            let idx = (norm * ((BLOCKS.len() - 1) as f64)).round() as usize;
            BLOCKS[idx]
        })
        .collect()
}
