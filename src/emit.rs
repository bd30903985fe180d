use std::path::Path;
use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, error, info};

use crate::allocate::Allocation;
use crate::gitops::Vcs;
use crate::store::write_marker;
use crate::util::iso;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DayOutcome {
    pub created: u32,
    /// Units left unattempted after a failed commit.
    pub skipped: u32,
    pub failed: bool,
}

pub fn commit_message(day: NaiveDate, index: u32, count: u32) -> String {
    format!("backfill: {day} ({index}/{count})")
}

/// Make `count` commits dated `day`. A version-control error ends this day
/// only; marker write errors are returned.
pub fn emit_day<V: Vcs + ?Sized>(
    vcs: &mut V,
    marker: &Path,
    day: NaiveDate,
    count: u32,
    dry_run: bool,
) -> Result<DayOutcome> {
    let mut outcome = DayOutcome::default();
    if count == 0 {
        return Ok(outcome);
    }
    if dry_run {
        println!("[dry-run] {day}: {count} commit(s)");
        return Ok(outcome);
    }

    let date = iso(day);
    for i in 1..=count {
        write_marker(marker, day)?;
        let message = commit_message(day, i, count);
        let res = vcs.stage(marker).and_then(|_| vcs.commit(&message, &date));
        match res {
            Ok(()) => {
                debug!(%day, %message, "committed");
                outcome.created += 1;
            }
            Err(e) => {
                error!(%day, %message, "commit failed, skipping rest of day: {e}");
                outcome.failed = true;
                outcome.skipped = count - i;
                break;
            }
        }
    }
    Ok(outcome)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub created: u64,
    pub skipped: u64,
    pub failed_days: usize,
    /// `None` when no push was attempted.
    pub pushed: Option<bool>,
}

/// Emit every non-zero day of `alloc` in order, then push if asked.
/// Dry runs never push. A push failure is logged and reported, not returned.
pub fn emit_all<V: Vcs + ?Sized>(
    vcs: &mut V,
    alloc: &Allocation,
    marker: &Path,
    dry_run: bool,
    push: bool,
) -> Result<RunReport> {
    let mut report = RunReport::default();
    for d in alloc.days.iter().filter(|d| d.count > 0) {
        let out = emit_day(vcs, marker, d.day, d.count, dry_run)?;
        report.created += out.created as u64;
        report.skipped += out.skipped as u64;
        if out.failed {
            report.failed_days += 1;
        }
    }

    if push && !dry_run {
        info!("pushing");
        report.pushed = Some(match vcs.push() {
            Ok(()) => true,
            Err(e) => {
                error!("push failed: {e}");
                false
            }
        });
    }
    Ok(report)
}
