use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone};
use std::str::FromStr;

pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Local midnight of `day`. Falls back to UTC midnight when the local zone
/// skips midnight (DST gap).
pub fn start_of_day(day: NaiveDate) -> DateTime<FixedOffset> {
    let naive = day.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.fixed_offset(),
        None => naive.and_utc().fixed_offset(),
    }
}

pub fn iso(day: NaiveDate) -> String {
    start_of_day(day).to_rfc3339()
}

/// Lenient numeric flag parsing: missing, empty or malformed input yields `None`.
pub fn parse_lenient<T: FromStr>(raw: Option<&str>) -> Option<T> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<T>().ok())
}

/// Lenient integer flag parsing: accepts signed values and truncates a
/// fractional part (`"2.5"` -> 2, `"-3"` -> -3).
pub fn parse_lenient_int(raw: Option<&str>) -> Option<i64> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}
