use std::io;
use std::path::Path;

use crate::error::StoreError;
use crate::models::{Column, MonthRef, PayRecord};
use crate::period;

const MONTH_HEADER: &str = "Mês";
const YEAR_HEADER: &str = "Ano";

/// Monthly pay records for one employee, sorted by (year, month), one record
/// per month. Never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesStore {
    records: Vec<PayRecord>,
}

impl TimeSeriesStore {
    pub fn new(mut records: Vec<PayRecord>) -> Result<Self, StoreError> {
        for record in &records {
            if MonthRef::new(record.month, record.year).is_none() {
                return Err(StoreError::MonthOutOfRange {
                    month: record.month,
                    year: record.year,
                });
            }
        }

        records.sort_by_key(PayRecord::at);
        if let Some(pair) = records.windows(2).find(|pair| pair[0].at() == pair[1].at()) {
            return Err(StoreError::DuplicateMonth(pair[0].at()));
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[PayRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn from_csv(path: &Path) -> Result<Self, StoreError> {
        let reader = csv::Reader::from_path(path)?;
        Self::read(reader)
    }

    pub fn from_reader<R: io::Read>(input: R) -> Result<Self, StoreError> {
        Self::read(csv::Reader::from_reader(input))
    }

    fn read<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, StoreError> {
        let headers = reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let month_idx = position(MONTH_HEADER);
        let year_idx = position(YEAR_HEADER);
        let mut columns = Vec::new();
        for column in Column::ALL {
            match position(column.header()) {
                Some(idx) => columns.push((column, idx)),
                None => tracing::warn!(column = column.header(), "column missing from csv; loading as zero"),
            }
        }

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let line = result?;
            let row = row + 1;

            let month_text = month_idx
                .and_then(|idx| line.get(idx))
                .ok_or(StoreError::MissingField { row, field: MONTH_HEADER })?;
            let year_text = year_idx
                .and_then(|idx| line.get(idx))
                .ok_or(StoreError::MissingField { row, field: YEAR_HEADER })?;

            let month = parse_month(month_text).ok_or_else(|| StoreError::BadMonth {
                row,
                value: month_text.to_string(),
            })?;
            let year: i32 = year_text.trim().parse().map_err(|_| StoreError::BadNumber {
                row,
                field: YEAR_HEADER.to_string(),
                value: year_text.to_string(),
            })?;

            let mut record = PayRecord::new(month, year);
            for &(column, idx) in &columns {
                let text = line.get(idx).unwrap_or_default();
                *record.field_mut(column) =
                    parse_decimal(text).ok_or_else(|| StoreError::BadNumber {
                        row,
                        field: column.header().to_string(),
                        value: text.to_string(),
                    })?;
            }
            records.push(record);
        }

        tracing::debug!(records = records.len(), "loaded payroll csv");
        Self::new(records)
    }
}

fn parse_month(text: &str) -> Option<u32> {
    let text = text.trim();
    match text.parse::<u32>() {
        Ok(number) => Some(number),
        Err(_) => period::normalize_month(text).ok(),
    }
}

/// Parses pt-BR numeric text: `1.234,56` and `1234,56` as well as `1234.56`.
/// Blank cells read as zero. `NaN` and infinities are rejected.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }
    let parsed = if text.contains(',') {
        text.replace('.', "").replace(',', ".").parse().ok()
    } else {
        text.parse().ok()
    };
    parsed.filter(|v: &f64| v.is_finite())
}

/// Eighteen months of realistic payroll for one employee, January 2023
/// through June 2024. Used by `--sample` and by tests.
pub fn sample_records() -> Vec<PayRecord> {
    let commissions = [
        350.0, 420.0, 0.0, 510.0, 380.0, 600.0, 275.0, 450.0, 390.0, 720.0, 530.0, 980.0,
        410.0, 0.0, 560.0, 620.0, 480.0, 700.0,
    ];
    let overtime = [
        4.0, 0.0, 6.0, 2.0, 0.0, 8.0, 3.0, 0.0, 5.0, 10.0, 4.0, 12.0, 0.0, 2.0, 6.0, 4.0, 0.0,
        7.0,
    ];

    let mut records = Vec::with_capacity(commissions.len());
    for (i, (&commission, &hours)) in commissions.iter().zip(overtime.iter()).enumerate() {
        let year = 2023 + (i / 12) as i32;
        let month = (i % 12) as u32 + 1;
        let base_salary: f64 = if year == 2024 && month >= 3 { 4500.0 } else { 4200.0 };
        let overtime_pay = (hours * base_salary / 220.0 * 1.5 * 100.0).round() / 100.0;
        let bonuses = if month == 12 { 1500.0 } else { 0.0 };
        let additional = if month == 7 { 300.0 } else { 0.0 };

        let gross = base_salary + commission + overtime_pay + bonuses + additional;
        let inss = (gross * 0.09 * 100.0).round() / 100.0;
        let irrf_base = gross - inss;
        let irrf = ((irrf_base * 0.075 - 169.44).max(0.0) * 100.0).round() / 100.0;
        let health = 189.9;
        let deductions = inss + irrf + health;

        records.push(
            PayRecord::new(month, year)
                .with(Column::BaseSalary, base_salary)
                .with(Column::Commission, commission)
                .with(Column::AdditionalPay, additional)
                .with(Column::Bonuses, bonuses)
                .with(Column::OvertimeHours, overtime_pay)
                .with(Column::ContractHours, 220.0)
                .with(Column::GrossTotal, gross)
                .with(Column::InssAmount, inss)
                .with(Column::InssRate, 9.0)
                .with(Column::IrrfAmount, irrf)
                .with(Column::IrrfRate, 7.5)
                .with(Column::HealthPlan, health)
                .with(Column::DeductionsTotal, deductions)
                .with(Column::NetPay, gross - deductions)
                .with(Column::FgtsDeposit, (gross * 0.08 * 100.0).round() / 100.0)
                .with(Column::FgtsBase, gross)
                .with(Column::InssBase, gross)
                .with(Column::IrrfBase, irrf_base),
        );
    }
    records
}

pub fn sample_store() -> Result<TimeSeriesStore, StoreError> {
    TimeSeriesStore::new(sample_records())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sorts_records_chronologically() {
        let store = TimeSeriesStore::new(vec![
            PayRecord::new(2, 2023),
            PayRecord::new(12, 2022),
            PayRecord::new(1, 2023),
        ])
        .unwrap();
        let order: Vec<String> = store.records().iter().map(|r| r.at().to_string()).collect();
        assert_eq!(order, vec!["12/2022", "1/2023", "2/2023"]);
    }

    #[test]
    fn rejects_duplicate_month() {
        let result = TimeSeriesStore::new(vec![PayRecord::new(3, 2023), PayRecord::new(3, 2023)]);
        assert!(matches!(result, Err(StoreError::DuplicateMonth(at)) if at.to_string() == "3/2023"));
    }

    #[test]
    fn rejects_month_out_of_range() {
        let result = TimeSeriesStore::new(vec![PayRecord::new(13, 2023)]);
        assert!(matches!(
            result,
            Err(StoreError::MonthOutOfRange { month: 13, year: 2023 })
        ));
    }

    #[test]
    fn parses_locale_decimals() {
        assert_eq!(parse_decimal("1234,56"), Some(1234.56));
        assert_eq!(parse_decimal("1.234,56"), Some(1234.56));
        assert_eq!(parse_decimal("1234.56"), Some(1234.56));
        assert_eq!(parse_decimal("  "), Some(0.0));
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(parse_decimal("-infinity"), None);
    }

    #[test]
    fn rejects_non_finite_cells() {
        let data = "Mês,Ano,Salário Base\nJaneiro,2022,NaN\nFevereiro,2022,1000\n";
        let result = TimeSeriesStore::from_reader(data.as_bytes());
        assert!(matches!(
            result,
            Err(StoreError::BadNumber { row: 1, ref field, ref value })
                if field == "Salário Base" && value == "NaN"
        ));
    }

    #[test]
    fn loads_csv_with_month_names() {
        let data = "Mês,Ano,Salário Base,INSS (R$),Líquido a Receber\n\
                    Fevereiro,2022,\"1100,00\",\"99,00\",\"1001,00\"\n\
                    Janeiro,2022,\"1000,00\",\"90,00\",\"910,00\"\n";
        let store = TimeSeriesStore::from_reader(data.as_bytes()).unwrap();
        assert_eq!(store.len(), 2);
        let first = &store.records()[0];
        assert_eq!(first.at().to_string(), "1/2022");
        assert_eq!(first.base_salary, 1000.0);
        assert_eq!(first.inss_amount, 90.0);
        assert_eq!(first.commission, 0.0);
    }

    #[test]
    fn loads_csv_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Mês,Ano,Salário Base").unwrap();
        writeln!(file, "3,2023,4200.00").unwrap();
        let store = TimeSeriesStore::from_csv(file.path()).unwrap();
        assert_eq!(store.records()[0].base_salary, 4200.0);
    }

    #[test]
    fn reports_bad_month_cell() {
        let data = "Mês,Ano,Salário Base\nSmarch,2023,1\n";
        let result = TimeSeriesStore::from_reader(data.as_bytes());
        assert!(matches!(result, Err(StoreError::BadMonth { row: 1, .. })));
    }

    #[test]
    fn sample_store_is_well_formed() {
        let store = sample_store().unwrap();
        assert_eq!(store.len(), 18);
        assert_eq!(store.records()[13].base_salary, 4200.0);
        assert_eq!(store.records()[14].base_salary, 4500.0);
        for record in store.records() {
            let earnings: f64 = Column::EARNINGS.iter().map(|&c| record.value(c)).sum();
            assert!((earnings - record.gross_total).abs() < 1e-9);
            assert!((record.gross_total - record.deductions_total - record.net_pay).abs() < 1e-9);
        }
    }
}
