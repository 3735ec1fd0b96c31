use std::fmt;

use chrono::Month;

use crate::error::{QueryError, QueryResult};

/// Calendar position of a record. Field order gives the (year, month) ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthRef {
    pub year: i32,
    pub month: u32,
}

impl MonthRef {
    pub fn new(month: u32, year: i32) -> Option<Self> {
        let valid = u8::try_from(month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .is_some();
        valid.then_some(Self { year, month })
    }
}

impl fmt::Display for MonthRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}

/// The whitelist of numeric payroll fields a query may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    BaseSalary,
    Commission,
    AdditionalPay,
    Bonuses,
    OvertimeHours,
    ContractHours,
    GrossTotal,
    InssAmount,
    InssRate,
    IrrfAmount,
    IrrfRate,
    HealthPlan,
    DeductionsTotal,
    NetPay,
    FgtsDeposit,
    FgtsBase,
    InssBase,
    IrrfBase,
}

impl Column {
    pub const ALL: [Column; 18] = [
        Column::BaseSalary,
        Column::Commission,
        Column::AdditionalPay,
        Column::Bonuses,
        Column::OvertimeHours,
        Column::ContractHours,
        Column::GrossTotal,
        Column::InssAmount,
        Column::InssRate,
        Column::IrrfAmount,
        Column::IrrfRate,
        Column::HealthPlan,
        Column::DeductionsTotal,
        Column::NetPay,
        Column::FgtsDeposit,
        Column::FgtsBase,
        Column::InssBase,
        Column::IrrfBase,
    ];

    pub const EARNINGS: [Column; 5] = [
        Column::BaseSalary,
        Column::Commission,
        Column::Bonuses,
        Column::OvertimeHours,
        Column::AdditionalPay,
    ];

    pub const DEDUCTIONS: [Column; 3] = [Column::InssAmount, Column::IrrfAmount, Column::HealthPlan];

    /// Header as it appears in the payroll export.
    pub fn header(self) -> &'static str {
        match self {
            Column::BaseSalary => "Salário Base",
            Column::Commission => "Comissão",
            Column::AdditionalPay => "Valores Adicionais",
            Column::Bonuses => "Bonificações",
            Column::OvertimeHours => "Horas Extras",
            Column::ContractHours => "Carga Horária",
            Column::GrossTotal => "Total Vencimentos",
            Column::InssAmount => "INSS (R$)",
            Column::InssRate => "INSS (%)",
            Column::IrrfAmount => "IRRF (R$)",
            Column::IrrfRate => "IRRF (%)",
            Column::HealthPlan => "Plano de Saúde",
            Column::DeductionsTotal => "Total Descontos",
            Column::NetPay => "Líquido a Receber",
            Column::FgtsDeposit => "FGTS do Mês",
            Column::FgtsBase => "Base FGTS",
            Column::InssBase => "Base INSS",
            Column::IrrfBase => "Base IRRF",
        }
    }

    fn alias(self) -> Option<&'static str> {
        match self {
            Column::InssAmount => Some("INSS"),
            Column::IrrfAmount => Some("IRRF"),
            Column::FgtsDeposit => Some("FGTS"),
            _ => None,
        }
    }

    /// Resolves a column reference. Names must match exactly (surrounding
    /// whitespace is ignored).
    pub fn parse(name: &str) -> QueryResult<Column> {
        let name = name.trim();
        Column::ALL
            .into_iter()
            .find(|c| c.header() == name || c.alias() == Some(name))
            .ok_or_else(|| QueryError::ColumnNotFound(name.to_string()))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// One employee, one calendar month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayRecord {
    pub month: u32,
    pub year: i32,
    pub base_salary: f64,
    pub commission: f64,
    pub additional_pay: f64,
    pub bonuses: f64,
    pub overtime_hours: f64,
    pub contract_hours: f64,
    pub gross_total: f64,
    pub inss_amount: f64,
    pub inss_rate: f64,
    pub irrf_amount: f64,
    pub irrf_rate: f64,
    pub health_plan: f64,
    pub deductions_total: f64,
    pub net_pay: f64,
    pub fgts_deposit: f64,
    pub fgts_base: f64,
    pub inss_base: f64,
    pub irrf_base: f64,
}

impl PayRecord {
    pub fn new(month: u32, year: i32) -> Self {
        Self {
            month,
            year,
            ..Self::default()
        }
    }

    pub fn with(mut self, column: Column, value: f64) -> Self {
        *self.field_mut(column) = value;
        self
    }

    pub fn at(&self) -> MonthRef {
        MonthRef {
            year: self.year,
            month: self.month,
        }
    }

    pub fn value(&self, column: Column) -> f64 {
        match column {
            Column::BaseSalary => self.base_salary,
            Column::Commission => self.commission,
            Column::AdditionalPay => self.additional_pay,
            Column::Bonuses => self.bonuses,
            Column::OvertimeHours => self.overtime_hours,
            Column::ContractHours => self.contract_hours,
            Column::GrossTotal => self.gross_total,
            Column::InssAmount => self.inss_amount,
            Column::InssRate => self.inss_rate,
            Column::IrrfAmount => self.irrf_amount,
            Column::IrrfRate => self.irrf_rate,
            Column::HealthPlan => self.health_plan,
            Column::DeductionsTotal => self.deductions_total,
            Column::NetPay => self.net_pay,
            Column::FgtsDeposit => self.fgts_deposit,
            Column::FgtsBase => self.fgts_base,
            Column::InssBase => self.inss_base,
            Column::IrrfBase => self.irrf_base,
        }
    }

    pub(crate) fn field_mut(&mut self, column: Column) -> &mut f64 {
        match column {
            Column::BaseSalary => &mut self.base_salary,
            Column::Commission => &mut self.commission,
            Column::AdditionalPay => &mut self.additional_pay,
            Column::Bonuses => &mut self.bonuses,
            Column::OvertimeHours => &mut self.overtime_hours,
            Column::ContractHours => &mut self.contract_hours,
            Column::GrossTotal => &mut self.gross_total,
            Column::InssAmount => &mut self.inss_amount,
            Column::InssRate => &mut self.inss_rate,
            Column::IrrfAmount => &mut self.irrf_amount,
            Column::IrrfRate => &mut self.irrf_rate,
            Column::HealthPlan => &mut self.health_plan,
            Column::DeductionsTotal => &mut self.deductions_total,
            Column::NetPay => &mut self.net_pay,
            Column::FgtsDeposit => &mut self.fgts_deposit,
            Column::FgtsBase => &mut self.fgts_base,
            Column::InssBase => &mut self.inss_base,
            Column::IrrfBase => &mut self.irrf_base,
        }
    }
}
