//! Year extraction from free-form page dates.
//!
//! Dates are whatever the ingestion process transcribed ("1845",
//! "March 3, 1845", "1845-1847"). Only four-digit years 1000-2999 count.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::YearSummary;

static YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^0-9])([12][0-9]{3})(?:[^0-9]|$)").expect("valid regex"));

/// Four-digit years mentioned in a date string, in order of appearance.
pub fn years_in(date: &str) -> Vec<i32> {
    // Matches consume the delimiting character, so adjacent years like
    // "1845-1847" need an overlapping scan.
    let mut years = Vec::new();
    let mut pos = 0;
    while let Some(caps) = YEAR_PATTERN.captures_at(date, pos) {
        let Some(year) = caps.get(1) else { break };
        if let Ok(value) = year.as_str().parse() {
            years.push(value);
        }
        pos = year.end();
    }
    years
}

/// Collect distinct years and multi-year ranges across dates.
pub fn collect_years<'a>(dates: impl IntoIterator<Item = &'a str>) -> YearSummary {
    let mut years = BTreeSet::new();
    let mut ranges = BTreeSet::new();

    for date in dates {
        let found = years_in(date);
        if let (Some(first), Some(last)) = (found.iter().min(), found.iter().max()) {
            if first != last {
                ranges.insert(format!("{}-{}", first, last));
            }
        }
        years.extend(found);
    }

    YearSummary {
        years: years.into_iter().collect(),
        ranges: ranges.into_iter().collect(),
    }
}
