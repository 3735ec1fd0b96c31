use thiserror::Error;

use crate::models::MonthRef;

/// Query-time failures. The `Display` text is what the caller sees under `"erro"`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Coluna '{0}' não encontrada na base de dados.")]
    ColumnNotFound(String),
    #[error("Mês '{0}' inválido.")]
    InvalidMonth(String),
    #[error("Nenhum dado encontrado dentro do período especificado.")]
    EmptyPeriod,
    #[error("Nenhum dado encontrado para {0}.")]
    NoRecordForMonth(MonthRef),
    #[error("Dados insuficientes: são necessários {needed} registro(s), encontrados {found}.")]
    InsufficientData { needed: usize, found: usize },
    #[error("{0}")]
    NotComputable(String),
    #[error("Função '{0}' não implementada.")]
    OperationNotRecognized(String),
    #[error("Argumentos inválidos para '{operation}': {reason}")]
    InvalidArguments { operation: String, reason: String },
}

/// Failures while building a [`crate::store::TimeSeriesStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate record for {0}")]
    DuplicateMonth(MonthRef),
    #[error("month {month} out of range in year {year}")]
    MonthOutOfRange { month: u32, year: i32 },
    #[error("row {row}: missing required field '{field}'")]
    MissingField { row: usize, field: &'static str },
    #[error("row {row}: unrecognised month '{value}'")]
    BadMonth { row: usize, value: String },
    #[error("row {row}: cannot parse '{value}' in '{field}'")]
    BadNumber {
        row: usize,
        field: String,
        value: String,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type QueryResult<T> = Result<T, QueryError>;
