use std::fmt;

use crate::error::{QueryError, QueryResult};
use crate::models::{MonthRef, PayRecord};

const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Maps a calendar month name (case-insensitive) to 1..=12.
pub fn normalize_month(name: &str) -> QueryResult<u32> {
    let wanted = name.trim().to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|candidate| candidate.to_lowercase() == wanted)
        .map(|idx| idx as u32 + 1)
        .ok_or_else(|| QueryError::InvalidMonth(name.to_string()))
}

pub fn month_names() -> &'static [&'static str] {
    &MONTH_NAMES
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize))
        .copied()
        .unwrap_or("?")
}

/// A selection over the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    All,
    /// Inclusive on both ends.
    Range { start: MonthRef, end: MonthRef },
    LastMonths(usize),
}

impl Period {
    pub fn range(
        start_month: &str,
        start_year: i32,
        end_month: &str,
        end_year: i32,
    ) -> QueryResult<Period> {
        let start = MonthRef {
            year: start_year,
            month: normalize_month(start_month)?,
        };
        let end = MonthRef {
            year: end_year,
            month: normalize_month(end_month)?,
        };
        Ok(Period::Range { start, end })
    }

    /// The matching contiguous run of `records`, which must be sorted. May be empty.
    pub fn resolve<'a>(&self, records: &'a [PayRecord]) -> &'a [PayRecord] {
        match *self {
            Period::All => records,
            Period::Range { start, end } => select_range(records, start, end),
            Period::LastMonths(n) => resolve_last_n(n, records),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::All => f.write_str("todo o período"),
            Period::Range { start, end } => write!(
                f,
                "{}/{} a {}/{}",
                month_name(start.month),
                start.year,
                month_name(end.month),
                end.year
            ),
            Period::LastMonths(n) => write!(f, "últimos {n} meses"),
        }
    }
}

fn select_range(records: &[PayRecord], start: MonthRef, end: MonthRef) -> &[PayRecord] {
    let lo = records.partition_point(|r| r.at() < start);
    let hi = records.partition_point(|r| r.at() <= end);
    if lo >= hi {
        return &[];
    }
    &records[lo..hi]
}

/// Records whose (year, month) falls inside the inclusive bound. A valid but
/// inverted or out-of-range bound yields an empty slice.
pub fn resolve_range<'a>(
    start_month: &str,
    start_year: i32,
    end_month: &str,
    end_year: i32,
    records: &'a [PayRecord],
) -> QueryResult<&'a [PayRecord]> {
    let period = Period::range(start_month, start_year, end_month, end_year)?;
    Ok(period.resolve(records))
}

/// The chronological tail of length `min(n, len)`. Asking for more months than
/// exist returns everything.
pub fn resolve_last_n(n: usize, records: &[PayRecord]) -> &[PayRecord] {
    let take = n.min(records.len());
    &records[records.len() - take..]
}

pub fn resolve_point<'a>(
    month: &str,
    year: i32,
    records: &'a [PayRecord],
) -> QueryResult<&'a PayRecord> {
    let at = MonthRef {
        year,
        month: normalize_month(month)?,
    };
    find_month(at, records)
}

pub fn find_month(at: MonthRef, records: &[PayRecord]) -> QueryResult<&PayRecord> {
    records
        .binary_search_by_key(&at, PayRecord::at)
        .map(|idx| &records[idx])
        .map_err(|_| QueryError::NoRecordForMonth(at))
}
