use chrono::{Days, Months, NaiveDate};

/// Every day from one year before `today` (exclusive) through `today`, ascending.
pub fn generate_dates(today: NaiveDate) -> Vec<NaiveDate> {
    let start = today
        .checked_sub_months(Months::new(12))
        .and_then(|d| d.checked_add_days(Days::new(1)))
        .unwrap_or(today);
    start.iter_days().take_while(|d| *d <= today).collect()
}
