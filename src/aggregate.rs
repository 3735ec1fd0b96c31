use crate::error::{QueryError, QueryResult};
use crate::models::{Column, MonthRef, PayRecord};

/// A single number, optionally pinned to the month it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub value: f64,
    pub at: Option<MonthRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub label: String,
    pub value: f64,
}

impl Point {
    fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Labelled values in display order; chronological for evolutions.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<Point>,
}

impl Series {
    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(|p| p.label.clone()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Per-category sums with their grand total.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown {
    pub items: Vec<Point>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Growth {
    Percent {
        value: f64,
        first: Scalar,
        last: Scalar,
    },
    NotComputable {
        reason: String,
    },
}

impl Growth {
    /// The percentage, or `NotComputable` for callers that want a hard error.
    pub fn percent(&self) -> QueryResult<f64> {
        match self {
            Growth::Percent { value, .. } => Ok(*value),
            Growth::NotComputable { reason } => Err(QueryError::NotComputable(reason.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateResult {
    Scalar(Scalar),
    Series(Series),
    Breakdown(Breakdown),
    NotComputable { reason: String },
}

/// Half away from zero, to cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn require(subset: &[PayRecord], needed: usize) -> QueryResult<()> {
    if subset.len() < needed {
        return Err(QueryError::InsufficientData {
            needed,
            found: subset.len(),
        });
    }
    Ok(())
}

pub fn sum_total(column: Column, subset: &[PayRecord]) -> QueryResult<Scalar> {
    require(subset, 1)?;
    let total: f64 = subset.iter().map(|r| r.value(column)).sum();
    Ok(Scalar {
        value: round2(total),
        at: None,
    })
}

pub fn mean(column: Column, subset: &[PayRecord]) -> QueryResult<Scalar> {
    let total = sum_total(column, subset)?;
    Ok(Scalar {
        value: round2(total.value / subset.len() as f64),
        at: None,
    })
}

/// Largest value; ties go to the chronologically first record.
pub fn max_value(column: Column, subset: &[PayRecord]) -> QueryResult<Scalar> {
    extreme(column, subset, |candidate, best| candidate > best)
}

/// Smallest value; ties go to the chronologically first record.
pub fn min_value(column: Column, subset: &[PayRecord]) -> QueryResult<Scalar> {
    extreme(column, subset, |candidate, best| candidate < best)
}

fn extreme(
    column: Column,
    subset: &[PayRecord],
    beats: impl Fn(f64, f64) -> bool,
) -> QueryResult<Scalar> {
    require(subset, 1)?;
    let mut best = &subset[0];
    for record in &subset[1..] {
        if beats(record.value(column), best.value(column)) {
            best = record;
        }
    }
    Ok(Scalar {
        value: round2(best.value(column)),
        at: Some(best.at()),
    })
}

/// `(last - first) / first * 100` between the first and last record.
pub fn growth_percent(column: Column, subset: &[PayRecord]) -> QueryResult<Growth> {
    let [first, .., last] = subset else {
        return Err(QueryError::InsufficientData {
            needed: 2,
            found: subset.len(),
        });
    };

    let start = first.value(column);
    let end = last.value(column);
    if start == 0.0 {
        return Ok(Growth::NotComputable {
            reason: format!(
                "O valor inicial de {column} em {} é zero; não é possível calcular a variação percentual.",
                first.at()
            ),
        });
    }

    Ok(Growth::Percent {
        value: round2((end - start) / start * 100.0),
        first: Scalar {
            value: round2(start),
            at: Some(first.at()),
        },
        last: Scalar {
            value: round2(end),
            at: Some(last.at()),
        },
    })
}

pub fn evolution(column: Column, subset: &[PayRecord]) -> QueryResult<Series> {
    require(subset, 1)?;
    Ok(Series {
        name: column.header().to_string(),
        points: subset
            .iter()
            .map(|r| Point::new(r.at().to_string(), round2(r.value(column))))
            .collect(),
    })
}

/// Sum of each category across the subset, in the order given.
pub fn breakdown(categories: &[Column], subset: &[PayRecord]) -> QueryResult<Breakdown> {
    require(subset, 1)?;
    let items: Vec<Point> = categories
        .iter()
        .map(|&column| {
            let total: f64 = subset.iter().map(|r| r.value(column)).sum();
            Point::new(column.header(), round2(total))
        })
        .collect();
    Ok(with_total(items))
}

/// Month-by-month sum of `categories`, e.g. total deductions per month.
pub fn monthly_totals(
    name: &str,
    categories: &[Column],
    subset: &[PayRecord],
) -> QueryResult<Series> {
    require(subset, 1)?;
    Ok(Series {
        name: name.to_string(),
        points: subset
            .iter()
            .map(|r| {
                let total: f64 = categories.iter().map(|&c| r.value(c)).sum();
                Point::new(r.at().to_string(), round2(total))
            })
            .collect(),
    })
}

/// Earnings, deductions and net pay totals for the subset. Earnings already
/// equal deductions plus net, so the three carry no grand total.
pub fn payslip_totals(subset: &[PayRecord]) -> QueryResult<Series> {
    let earnings = breakdown(&Column::EARNINGS, subset)?;
    let deductions = breakdown(&Column::DEDUCTIONS, subset)?;
    let net = sum_total(Column::NetPay, subset)?;
    Ok(Series {
        name: "Resumo Geral".to_string(),
        points: vec![
            Point::new("Vencimentos", earnings.total),
            Point::new("Descontos", deductions.total),
            Point::new("Líquido", net.value),
        ],
    })
}

fn with_total(items: Vec<Point>) -> Breakdown {
    let total = round2(items.iter().map(|p| p.value).sum());
    Breakdown { items, total }
}
