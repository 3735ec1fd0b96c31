use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::aggregate::{self, AggregateResult, Growth, Point, Series};
use crate::error::{QueryError, QueryResult};
use crate::insight::{self, ChartKind, Insight, InsightBatch, Presentation};
use crate::models::{Column, MonthRef, PayRecord};
use crate::period::{self, Period};
use crate::store::TimeSeriesStore;

/// What every call returns: `{"insights": [...]}` or `{"erro": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Insights(InsightBatch),
    Error { erro: String },
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
    StringList,
}

#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Param {
    Param {
        name,
        kind,
        required: true,
        description,
    }
}

const COLUMN: Param = required("column", ParamKind::String, "Nome exato da coluna.");
const START_MONTH: Param = required("start_month", ParamKind::String, "Mês inicial (ex: 'Janeiro').");
const START_YEAR: Param = required("start_year", ParamKind::Integer, "Ano inicial (ex: 2022).");
const END_MONTH: Param = required("end_month", ParamKind::String, "Mês final (ex: 'Dezembro').");
const END_YEAR: Param = required("end_year", ParamKind::Integer, "Ano final (ex: 2023).");
const MONTHS: Param = required("months", ParamKind::Integer, "Quantidade de meses mais recentes.");
const MONTH: Param = required("month", ParamKind::String, "Mês (ex: 'Março').");
const YEAR: Param = required("year", ParamKind::Integer, "Ano (ex: 2023).");
const COLUMNS: Param = required("columns", ParamKind::StringList, "Colunas a comparar, em geral de vencimento.");
const DETAIL: Param = Param {
    name: "detail",
    kind: ParamKind::Boolean,
    required: false,
    description: "Inclui o líquido mês a mês (padrão: true).",
};

const NO_PARAMS: &[Param] = &[];
const WHOLE: &[Param] = &[COLUMN];
const RANGE: &[Param] = &[COLUMN, START_MONTH, START_YEAR, END_MONTH, END_YEAR];
const LAST: &[Param] = &[COLUMN, MONTHS];
const POINT: &[Param] = &[COLUMN, MONTH, YEAR];
const RANGE_ONLY: &[Param] = &[START_MONTH, START_YEAR, END_MONTH, END_YEAR];
const PAYSLIP: &[Param] = &[START_MONTH, START_YEAR, END_MONTH, END_YEAR, DETAIL];
const SHARE: &[Param] = &[COLUMNS, MONTH, YEAR];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Mean,
    Max,
    Min,
    Total,
    Evolution,
    Growth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Range,
    LastMonths,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Columns,
    ColumnStat(Statistic, Scope),
    ValueAt,
    EarningsSummary,
    DeductionsSummary,
    PayslipSummary,
    EarningsShare,
}

/// One registry entry: name, argument schema and default presentation.
#[derive(Debug, Clone, Copy)]
pub struct OperationSpec {
    pub name: &'static str,
    pub kind: OperationKind,
    pub default_chart: ChartKind,
    pub params: &'static [Param],
    pub description: &'static str,
}

macro_rules! op {
    ($name:literal, $kind:expr, $chart:ident, $params:expr, $description:literal) => {
        OperationSpec {
            name: $name,
            kind: $kind,
            default_chart: ChartKind::$chart,
            params: $params,
            description: $description,
        }
    };
}

use OperationKind::ColumnStat as Stat;

pub static OPERATIONS: [OperationSpec; 24] = [
    op!("columns", OperationKind::Columns, Text, NO_PARAMS,
        "Lista as colunas disponíveis na folha de pagamento."),
    op!("mean", Stat(Statistic::Mean, Scope::All), Line, WHOLE,
        "Média da coluna em todo o histórico."),
    op!("mean_period", Stat(Statistic::Mean, Scope::Range), Line, RANGE,
        "Média da coluna dentro de um período mês/ano a mês/ano."),
    op!("mean_last_months", Stat(Statistic::Mean, Scope::LastMonths), Line, LAST,
        "Média da coluna nos últimos N meses."),
    op!("max", Stat(Statistic::Max, Scope::All), Line, WHOLE,
        "Maior valor da coluna e o mês em que ocorreu."),
    op!("max_period", Stat(Statistic::Max, Scope::Range), Line, RANGE,
        "Maior valor da coluna dentro de um período."),
    op!("max_last_months", Stat(Statistic::Max, Scope::LastMonths), Line, LAST,
        "Maior valor da coluna nos últimos N meses."),
    op!("min", Stat(Statistic::Min, Scope::All), Line, WHOLE,
        "Menor valor da coluna e o mês em que ocorreu."),
    op!("min_period", Stat(Statistic::Min, Scope::Range), Line, RANGE,
        "Menor valor da coluna dentro de um período."),
    op!("min_last_months", Stat(Statistic::Min, Scope::LastMonths), Line, LAST,
        "Menor valor da coluna nos últimos N meses."),
    op!("total", Stat(Statistic::Total, Scope::All), Bar, WHOLE,
        "Soma da coluna em todo o histórico."),
    op!("total_period", Stat(Statistic::Total, Scope::Range), Bar, RANGE,
        "Soma da coluna dentro de um período."),
    op!("total_last_months", Stat(Statistic::Total, Scope::LastMonths), Bar, LAST,
        "Soma da coluna nos últimos N meses."),
    op!("evolution", Stat(Statistic::Evolution, Scope::All), Line, WHOLE,
        "Evolução mês a mês da coluna em todo o histórico."),
    op!("evolution_period", Stat(Statistic::Evolution, Scope::Range), Line, RANGE,
        "Evolução mês a mês da coluna dentro de um período."),
    op!("evolution_last_months", Stat(Statistic::Evolution, Scope::LastMonths), Line, LAST,
        "Evolução mês a mês da coluna nos últimos N meses."),
    op!("growth", Stat(Statistic::Growth, Scope::All), Bar, WHOLE,
        "Crescimento percentual da coluna do primeiro ao último mês."),
    op!("growth_period", Stat(Statistic::Growth, Scope::Range), Bar, RANGE,
        "Crescimento percentual da coluna dentro de um período."),
    op!("growth_last_months", Stat(Statistic::Growth, Scope::LastMonths), Bar, LAST,
        "Crescimento percentual da coluna nos últimos N meses."),
    op!("value_at", OperationKind::ValueAt, Pie, POINT,
        "Valor da coluna em um mês e ano específicos."),
    op!("earnings_summary", OperationKind::EarningsSummary, Pie, RANGE_ONLY,
        "Vencimentos por tipo e evolução mensal do total de vencimentos no período."),
    op!("deductions_summary", OperationKind::DeductionsSummary, Pie, RANGE_ONLY,
        "Descontos por tipo e evolução mensal do total de descontos no período."),
    op!("payslip_summary", OperationKind::PayslipSummary, Pie, PAYSLIP,
        "Resumo da folha no período: vencimentos, descontos, líquido e detalhamento."),
    op!("earnings_share", OperationKind::EarningsShare, Pie, SHARE,
        "Participação de cada coluna de vencimento em um mês/ano específico."),
];

pub fn find_operation(name: &str) -> Option<&'static OperationSpec> {
    OPERATIONS.iter().find(|spec| spec.name == name)
}

/// A validated request with typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Columns,
    ColumnStat {
        statistic: Statistic,
        column: Column,
        period: Period,
    },
    ValueAt {
        column: Column,
        at: MonthRef,
    },
    EarningsSummary(Period),
    DeductionsSummary(Period),
    PayslipSummary {
        period: Period,
        detail: bool,
    },
    EarningsShare {
        columns: Vec<Column>,
        at: MonthRef,
    },
}

struct Args<'a> {
    operation: &'static str,
    map: &'a Map<String, Value>,
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

fn coercible(kind: ParamKind, value: &Value) -> bool {
    match kind {
        ParamKind::String => value.is_string(),
        ParamKind::Integer => as_integer(value).is_some(),
        ParamKind::Boolean => as_boolean(value).is_some(),
        ParamKind::StringList => as_string_list(value).is_some_and(|list| !list.is_empty()),
    }
}

/// Checks presence and types only; column and month names are checked later.
pub fn validate_args(spec: &OperationSpec, args: &Map<String, Value>) -> QueryResult<()> {
    let invalid = |reason: String| QueryError::InvalidArguments {
        operation: spec.name.to_string(),
        reason,
    };

    if let Some(unknown) = args
        .keys()
        .find(|key| !spec.params.iter().any(|p| p.name == key.as_str()))
    {
        return Err(invalid(format!("argumento desconhecido '{unknown}'")));
    }

    for param in spec.params {
        match args.get(param.name) {
            None | Some(Value::Null) if param.required => {
                return Err(invalid(format!("argumento obrigatório '{}' ausente", param.name)));
            }
            None | Some(Value::Null) => {}
            Some(value) if !coercible(param.kind, value) => {
                return Err(invalid(format!(
                    "argumento '{}' com tipo inválido: {value}",
                    param.name
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

impl Args<'_> {
    fn invalid(&self, reason: String) -> QueryError {
        QueryError::InvalidArguments {
            operation: self.operation.to_string(),
            reason,
        }
    }

    fn get(&self, key: &str) -> QueryResult<&Value> {
        self.map
            .get(key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| self.invalid(format!("argumento obrigatório '{key}' ausente")))
    }

    fn string(&self, key: &str) -> QueryResult<&str> {
        self.get(key)?
            .as_str()
            .ok_or_else(|| self.invalid(format!("argumento '{key}' deve ser texto")))
    }

    fn integer(&self, key: &str) -> QueryResult<i64> {
        as_integer(self.get(key)?)
            .ok_or_else(|| self.invalid(format!("argumento '{key}' deve ser inteiro")))
    }

    fn year(&self, key: &str) -> QueryResult<i32> {
        i32::try_from(self.integer(key)?)
            .map_err(|_| self.invalid(format!("argumento '{key}' fora do intervalo")))
    }

    fn months(&self, key: &str) -> QueryResult<usize> {
        usize::try_from(self.integer(key)?)
            .map_err(|_| self.invalid(format!("argumento '{key}' não pode ser negativo")))
    }

    fn boolean_or(&self, key: &str, default: bool) -> QueryResult<bool> {
        match self.map.get(key).filter(|v| !v.is_null()) {
            None => Ok(default),
            Some(value) => as_boolean(value)
                .ok_or_else(|| self.invalid(format!("argumento '{key}' deve ser booleano"))),
        }
    }

    fn column(&self) -> QueryResult<Column> {
        Column::parse(self.string(COLUMN.name)?)
    }

    fn range(&self) -> QueryResult<Period> {
        Period::range(
            self.string(START_MONTH.name)?,
            self.year(START_YEAR.name)?,
            self.string(END_MONTH.name)?,
            self.year(END_YEAR.name)?,
        )
    }

    fn point(&self) -> QueryResult<MonthRef> {
        let month = period::normalize_month(self.string(MONTH.name)?)?;
        Ok(MonthRef {
            year: self.year(YEAR.name)?,
            month,
        })
    }
}

impl Operation {
    /// Builds the typed operation. Column names are checked before months.
    pub fn parse(spec: &'static OperationSpec, args: &Map<String, Value>) -> QueryResult<Operation> {
        validate_args(spec, args)?;
        let args = Args {
            operation: spec.name,
            map: args,
        };

        let operation = match spec.kind {
            OperationKind::Columns => Operation::Columns,
            OperationKind::ColumnStat(statistic, scope) => {
                let column = args.column()?;
                let period = match scope {
                    Scope::All => Period::All,
                    Scope::Range => args.range()?,
                    Scope::LastMonths => Period::LastMonths(args.months(MONTHS.name)?),
                };
                Operation::ColumnStat {
                    statistic,
                    column,
                    period,
                }
            }
            OperationKind::ValueAt => {
                let column = args.column()?;
                Operation::ValueAt {
                    column,
                    at: args.point()?,
                }
            }
            OperationKind::EarningsSummary => Operation::EarningsSummary(args.range()?),
            OperationKind::DeductionsSummary => Operation::DeductionsSummary(args.range()?),
            OperationKind::PayslipSummary => Operation::PayslipSummary {
                period: args.range()?,
                detail: args.boolean_or(DETAIL.name, true)?,
            },
            OperationKind::EarningsShare => {
                let names = args.get(COLUMNS.name).map(as_string_list)?.unwrap_or_default();
                let columns = names
                    .iter()
                    .map(|name| Column::parse(name))
                    .collect::<QueryResult<Vec<_>>>()?;
                Operation::EarningsShare {
                    columns,
                    at: args.point()?,
                }
            }
        };
        Ok(operation)
    }

    /// Runs against `store`, drawing the primary insight as `chart`.
    pub fn execute(&self, store: &TimeSeriesStore, chart: ChartKind) -> QueryResult<InsightBatch> {
        let records = store.records();
        match self {
            Operation::Columns => {
                let names: Vec<&str> = Column::ALL.iter().map(|c| c.header()).collect();
                Ok(Insight::text("Colunas Disponíveis", names.join(", ")).into())
            }
            Operation::ColumnStat {
                statistic,
                column,
                period,
            } => column_stat(*statistic, *column, period, chart, select(period, records)?),
            Operation::ValueAt { column, at } => {
                let record = period::find_month(*at, records)?;
                let value = aggregate::Scalar {
                    value: aggregate::round2(record.value(*column)),
                    at: Some(*at),
                };
                let presentation =
                    Presentation::new(chart, format!("{column} em {}", month_label(*at)))
                        .with_y_axis(column.header())
                        .with_headline(aggregate::Scalar {
                            value: value.value,
                            at: None,
                        });
                Ok(insight::render(&AggregateResult::Scalar(value), &presentation).into())
            }
            Operation::EarningsSummary(period) => category_summary(
                "Vencimentos",
                &Column::EARNINGS,
                period,
                chart,
                select(period, records)?,
            ),
            Operation::DeductionsSummary(period) => category_summary(
                "Descontos",
                &Column::DEDUCTIONS,
                period,
                chart,
                select(period, records)?,
            ),
            Operation::PayslipSummary { period, detail } => {
                payslip_summary(period, *detail, chart, select(period, records)?)
            }
            Operation::EarningsShare { columns, at } => {
                let record = period::find_month(*at, records)?;
                let share = aggregate::breakdown(columns, std::slice::from_ref(record))?;
                let presentation = Presentation::new(
                    chart,
                    format!("Participação dos vencimentos em {}", month_label(*at)),
                );
                Ok(insight::render(&AggregateResult::Breakdown(share), &presentation).into())
            }
        }
    }
}

fn select<'a>(period: &Period, records: &'a [PayRecord]) -> QueryResult<&'a [PayRecord]> {
    let subset = period.resolve(records);
    if subset.is_empty() {
        return Err(QueryError::EmptyPeriod);
    }
    Ok(subset)
}

fn month_label(at: MonthRef) -> String {
    format!("{}/{}", period::month_name(at.month), at.year)
}

fn titled(base: String, period: &Period) -> String {
    match period {
        Period::All => base,
        _ => format!("{base} ({period})"),
    }
}

fn column_stat(
    statistic: Statistic,
    column: Column,
    period: &Period,
    chart: ChartKind,
    subset: &[PayRecord],
) -> QueryResult<InsightBatch> {
    let (result, presentation) = match statistic {
        Statistic::Mean => (
            AggregateResult::Series(aggregate::evolution(column, subset)?),
            Presentation::new(chart, titled(format!("Média de {column}"), period))
                .with_headline(aggregate::mean(column, subset)?),
        ),
        Statistic::Max => (
            AggregateResult::Series(aggregate::evolution(column, subset)?),
            Presentation::new(chart, titled(format!("Maior {column}"), period))
                .with_headline(aggregate::max_value(column, subset)?),
        ),
        Statistic::Min => (
            AggregateResult::Series(aggregate::evolution(column, subset)?),
            Presentation::new(chart, titled(format!("Menor {column}"), period))
                .with_headline(aggregate::min_value(column, subset)?),
        ),
        Statistic::Total => {
            let total = aggregate::sum_total(column, subset)?;
            (
                AggregateResult::Series(aggregate::evolution(column, subset)?),
                Presentation::new(chart, titled(format!("Total de {column}"), period))
                    .with_total(total.value)
                    .with_headline(total),
            )
        }
        Statistic::Evolution => (
            AggregateResult::Series(aggregate::evolution(column, subset)?),
            Presentation::new(chart, titled(format!("Evolução de {column}"), period)),
        ),
        Statistic::Growth => {
            let title = titled(format!("Crescimento de {column}"), period);
            match aggregate::growth_percent(column, subset)? {
                Growth::Percent { value, first, last } => {
                    let series = match period {
                        Period::All => Series {
                            name: column.header().to_string(),
                            points: [first, last]
                                .into_iter()
                                .map(|s| Point {
                                    label: s.at.map(|at| at.to_string()).unwrap_or_default(),
                                    value: s.value,
                                })
                                .collect(),
                        },
                        // Bounded periods plot every month in between.
                        _ => aggregate::evolution(column, subset)?,
                    };
                    (
                        AggregateResult::Series(series),
                        Presentation::new(chart, format!("{title}: {value:.2}%")),
                    )
                }
                Growth::NotComputable { reason } => (
                    AggregateResult::NotComputable { reason },
                    Presentation::new(ChartKind::Text, title),
                ),
            }
        }
    };

    Ok(insight::render(&result, &presentation).into())
}

fn category_summary(
    label: &str,
    categories: &[Column],
    period: &Period,
    chart: ChartKind,
    subset: &[PayRecord],
) -> QueryResult<InsightBatch> {
    let by_type = AggregateResult::Breakdown(aggregate::breakdown(categories, subset)?);
    let monthly = AggregateResult::Series(aggregate::monthly_totals(
        &format!("Total {label} (R$)"),
        categories,
        subset,
    )?);

    let by_type_view = Presentation::new(chart, format!("{label} por Tipo ({period})"));
    let monthly_view = Presentation::new(
        ChartKind::Line,
        format!("Evolução Mensal dos {label} ({period})"),
    );
    Ok(insight::render_batch([
        (&by_type, &by_type_view),
        (&monthly, &monthly_view),
    ]))
}

fn payslip_summary(
    period: &Period,
    detail: bool,
    chart: ChartKind,
    subset: &[PayRecord],
) -> QueryResult<InsightBatch> {
    let mut results = vec![
        (
            AggregateResult::Series(aggregate::payslip_totals(subset)?),
            Presentation::new(chart, format!("Resumo Geral ({period})")),
        ),
        (
            AggregateResult::Breakdown(aggregate::breakdown(&Column::EARNINGS, subset)?),
            Presentation::new(chart, format!("Vencimentos por Tipo ({period})")),
        ),
        (
            AggregateResult::Breakdown(aggregate::breakdown(&Column::DEDUCTIONS, subset)?),
            Presentation::new(chart, format!("Descontos por Tipo ({period})")),
        ),
    ];
    if detail {
        results.push((
            AggregateResult::Series(aggregate::evolution(Column::NetPay, subset)?),
            Presentation::new(ChartKind::Line, format!("Líquido Mês a Mês ({period})"))
                .with_y_axis("Líquido (R$)"),
        ));
    }
    Ok(insight::render_batch(results.iter().map(|(r, p)| (r, p))))
}

fn run(store: &TimeSeriesStore, name: &str, args: &Map<String, Value>) -> QueryResult<InsightBatch> {
    let spec = find_operation(name)
        .ok_or_else(|| QueryError::OperationNotRecognized(name.to_string()))?;
    let operation = Operation::parse(spec, args)?;
    tracing::debug!(operation = spec.name, request = ?operation, "dispatching");
    operation.execute(store, spec.default_chart)
}

fn failure(operation: &str, err: QueryError) -> Response {
    tracing::warn!(operation, error = %err, "operation failed");
    Response::Error {
        erro: err.to_string(),
    }
}

/// The single entry point. Never panics on bad input: every failure comes
/// back as `{"erro": ...}`.
pub fn call_operation(store: &TimeSeriesStore, name: &str, args: &Map<String, Value>) -> Response {
    match run(store, name, args) {
        Ok(batch) => Response::Insights(batch),
        Err(err) => failure(name, err),
    }
}

/// Same as [`call_operation`] for arguments that arrive as raw JSON text, as
/// in a tool call. Blank text means no arguments.
pub fn call_operation_json(store: &TimeSeriesStore, name: &str, raw_args: &str) -> Response {
    if raw_args.trim().is_empty() {
        return call_operation(store, name, &Map::new());
    }

    let invalid = |reason: String| QueryError::InvalidArguments {
        operation: name.to_string(),
        reason,
    };
    match serde_json::from_str::<Value>(raw_args) {
        Ok(Value::Object(map)) => call_operation(store, name, &map),
        Ok(Value::Null) => call_operation(store, name, &Map::new()),
        Ok(other) => failure(name, invalid(format!("esperado um objeto JSON, recebido {other}"))),
        Err(err) => failure(name, invalid(err.to_string())),
    }
}

fn param_schema(param: &Param) -> Value {
    let mut schema = match param.kind {
        ParamKind::String => json!({ "type": "string" }),
        ParamKind::Integer => json!({ "type": "integer" }),
        ParamKind::Boolean => json!({ "type": "boolean" }),
        ParamKind::StringList => json!({ "type": "array", "items": { "type": "string" } }),
    };
    schema["description"] = json!(param.description);

    let choices: Option<Vec<&str>> = match param.name {
        "column" => Some(Column::ALL.iter().map(|c| c.header()).collect()),
        "columns" => {
            schema["items"]["enum"] = json!(Column::ALL.iter().map(|c| c.header()).collect::<Vec<_>>());
            None
        }
        "month" | "start_month" | "end_month" => Some(period::month_names().to_vec()),
        _ => None,
    };
    if let Some(choices) = choices {
        schema["enum"] = json!(choices);
    }
    schema
}

/// The registry as function-calling tool schemas.
pub fn tool_definitions() -> Vec<Value> {
    OPERATIONS
        .iter()
        .map(|spec| {
            let properties: Map<String, Value> = spec
                .params
                .iter()
                .map(|p| (p.name.to_string(), param_schema(p)))
                .collect();
            let required: Vec<&str> = spec
                .params
                .iter()
                .filter(|p| p.required)
                .map(|p| p.name)
                .collect();
            json!({
                "type": "function",
                "function": {
                    "name": spec.name,
                    "description": spec.description,
                    "parameters": {
                        "type": "object",
                        "properties": properties,
                        "required": required,
                        "additionalProperties": false
                    }
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insight::InsightData;
    use crate::store::sample_store;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn store() -> TimeSeriesStore {
        sample_store().unwrap()
    }

    fn insights(response: Response) -> Vec<Insight> {
        match response {
            Response::Insights(batch) => batch.insights,
            Response::Error { erro } => panic!("unexpected error: {erro}"),
        }
    }

    fn error(response: Response) -> String {
        match response {
            Response::Error { erro } => erro,
            Response::Insights(batch) => panic!("unexpected success: {batch:?}"),
        }
    }

    #[test]
    fn registry_names_are_unique() {
        for (i, spec) in OPERATIONS.iter().enumerate() {
            assert!(
                OPERATIONS[i + 1..].iter().all(|other| other.name != spec.name),
                "duplicate {}",
                spec.name
            );
        }
    }

    #[test]
    fn unknown_operation_is_reported() {
        let response = call_operation(&store(), "bogus_op", &Map::new());
        assert_eq!(error(response), "Função 'bogus_op' não implementada.");
    }

    #[test]
    fn missing_argument_is_reported_not_panicked() {
        let response = call_operation(&store(), "mean", &Map::new());
        assert!(error(response).contains("'column'"));
    }

    #[test]
    fn unknown_argument_is_rejected() {
        let response = call_operation(
            &store(),
            "mean",
            &args(json!({"column": "Salário Base", "coluna": "Salário Base"})),
        );
        assert!(error(response).contains("'coluna'"));
    }

    #[test]
    fn integers_are_coerced_from_strings_and_floats() {
        let response = call_operation(
            &store(),
            "total_period",
            &args(json!({
                "column": "Salário Base",
                "start_month": "janeiro",
                "start_year": "2023",
                "end_month": "março",
                "end_year": 2023.0
            })),
        );
        let insight = &insights(response)[0];
        assert_eq!(insight.x_axis, vec!["1/2023", "2/2023", "3/2023"]);
        assert_eq!(insight.total, Some(12600.0));
    }

    #[test]
    fn column_is_checked_before_months() {
        let response = call_operation(
            &store(),
            "mean_period",
            &args(json!({
                "column": "Foo",
                "start_month": "Smarch",
                "start_year": 2023,
                "end_month": "Março",
                "end_year": 2023
            })),
        );
        assert_eq!(error(response), "Coluna 'Foo' não encontrada na base de dados.");
    }

    #[test]
    fn invalid_month_is_reported() {
        let response = call_operation(
            &store(),
            "value_at",
            &args(json!({"column": "Salário Base", "month": "Smarch", "year": 2023})),
        );
        assert_eq!(error(response), "Mês 'Smarch' inválido.");
    }

    #[test]
    fn max_title_names_the_first_peak() {
        let response = call_operation(&store(), "max", &args(json!({"column": "Salário Base"})));
        let insight = &insights(response)[0];
        assert_eq!(insight.kind, ChartKind::Line);
        assert_eq!(insight.title, "Maior Salário Base: 4500.00 em 3/2024");
        assert_eq!(insight.x_axis.len(), 18);
    }

    #[test]
    fn value_at_is_a_single_slice_pie() {
        let response = call_operation(
            &store(),
            "value_at",
            &args(json!({"column": "Salário Base", "month": "março", "year": 2024})),
        );
        let insight = &insights(response)[0];
        assert_eq!(insight.kind, ChartKind::Pie);
        assert_eq!(insight.title, "Salário Base em Março/2024: 4500.00");
        assert!(insight.x_axis.is_empty());
        match &insight.data {
            Some(InsightData::Slices(slices)) => {
                assert_eq!(slices.len(), 1);
                assert_eq!(slices[0].label, "Salário Base");
            }
            other => panic!("unexpected data {other:?}"),
        }
    }

    #[test]
    fn growth_from_zero_base_is_a_text_insight() {
        // February 2024 has no commission in the sample.
        let response = call_operation(
            &store(),
            "growth_period",
            &args(json!({
                "column": "Comissão",
                "start_month": "Fevereiro",
                "start_year": 2024,
                "end_month": "Junho",
                "end_year": 2024
            })),
        );
        let batch = insights(response);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].kind, ChartKind::Text);
        assert!(batch[0].message.as_deref().unwrap_or_default().contains("zero"));
    }

    #[test]
    fn growth_with_one_record_is_insufficient() {
        let response = call_operation(
            &store(),
            "growth_last_months",
            &args(json!({"column": "Salário Base", "months": 1})),
        );
        assert!(error(response).starts_with("Dados insuficientes"));
    }

    #[test]
    fn zero_months_is_an_empty_period() {
        let response = call_operation(
            &store(),
            "mean_last_months",
            &args(json!({"column": "Salário Base", "months": 0})),
        );
        assert_eq!(
            error(response),
            "Nenhum dado encontrado dentro do período especificado."
        );
    }

    #[test]
    fn negative_months_is_invalid() {
        let response = call_operation(
            &store(),
            "mean_last_months",
            &args(json!({"column": "Salário Base", "months": -3})),
        );
        assert!(error(response).starts_with("Argumentos inválidos"));
    }

    #[test]
    fn payslip_summary_detail_is_optional() {
        let range = json!({
            "start_month": "Janeiro",
            "start_year": 2023,
            "end_month": "Dezembro",
            "end_year": 2023
        });
        let full = insights(call_operation(&store(), "payslip_summary", &args(range.clone())));
        assert_eq!(full.len(), 4);
        assert_eq!(full[3].y_axis, "Líquido (R$)");

        let mut brief = args(range);
        brief.insert("detail".to_string(), json!(false));
        assert_eq!(insights(call_operation(&store(), "payslip_summary", &brief)).len(), 3);
    }

    #[test]
    fn payslip_overview_carries_no_grand_total() {
        let store = store();
        let response = call_operation(
            &store,
            "payslip_summary",
            &args(json!({
                "start_month": "Janeiro",
                "start_year": 2023,
                "end_month": "Janeiro",
                "end_year": 2023,
                "detail": false
            })),
        );
        let batch = insights(response);
        assert_eq!(batch[0].kind, ChartKind::Pie);
        assert_eq!(batch[0].total, None);
        assert!(batch[1].total.is_some());

        let january = &store.records()[0];
        match &batch[0].data {
            Some(InsightData::Slices(slices)) => {
                assert_eq!(slices[0].label, "Vencimentos");
                assert_eq!(slices[0].value, aggregate::round2(january.gross_total));
                assert_eq!(slices[2].label, "Líquido");
            }
            other => panic!("unexpected data {other:?}"),
        }
    }

    #[test]
    fn growth_over_a_period_plots_every_month() {
        let response = call_operation(
            &store(),
            "growth_period",
            &args(json!({
                "column": "Salário Base",
                "start_month": "Janeiro",
                "start_year": 2024,
                "end_month": "Junho",
                "end_year": 2024
            })),
        );
        let insight = &insights(response)[0];
        assert_eq!(insight.kind, ChartKind::Bar);
        assert_eq!(
            insight.title,
            "Crescimento de Salário Base (Janeiro/2024 a Junho/2024): 7.14%"
        );
        assert_eq!(insight.x_axis.len(), 6);
        assert_eq!(
            insight.data,
            Some(InsightData::Values(vec![4200.0, 4200.0, 4500.0, 4500.0, 4500.0, 4500.0]))
        );

        let last = &insights(call_operation(
            &store(),
            "growth_last_months",
            &args(json!({"column": "Salário Base", "months": 3})),
        ))[0];
        assert_eq!(last.x_axis, vec!["4/2024", "5/2024", "6/2024"]);
    }

    #[test]
    fn earnings_share_schema_matches_accepted_columns() {
        let tools = tool_definitions();
        let share = tools
            .iter()
            .find(|t| t["function"]["name"] == "earnings_share")
            .unwrap();
        let allowed = &share["function"]["parameters"]["properties"]["columns"]["items"]["enum"];
        assert_eq!(allowed.as_array().map(Vec::len), Some(Column::ALL.len()));
        assert!(allowed.as_array().unwrap().iter().any(|v| v == "INSS (R$)"));

        let response = call_operation(
            &store(),
            "earnings_share",
            &args(json!({"columns": ["Salário Base", "INSS (R$)"], "month": "Janeiro", "year": 2023})),
        );
        assert!(!response.is_error());
    }

    #[test]
    fn earnings_share_for_one_month() {
        let response = call_operation(
            &store(),
            "earnings_share",
            &args(json!({
                "columns": ["Salário Base", "Comissão"],
                "month": "Janeiro",
                "year": 2023
            })),
        );
        let insight = &insights(response)[0];
        assert_eq!(insight.title, "Participação dos vencimentos em Janeiro/2023");
        assert_eq!(insight.total, Some(4550.0));
    }

    #[test]
    fn columns_lists_the_whitelist() {
        let insight = &insights(call_operation(&store(), "columns", &Map::new()))[0];
        assert_eq!(insight.kind, ChartKind::Text);
        assert!(insight.message.as_deref().unwrap_or_default().contains("Líquido a Receber"));
    }

    #[test]
    fn raw_json_arguments() {
        let store = store();
        assert!(!call_operation_json(&store, "columns", "").is_error());
        assert!(!call_operation_json(&store, "mean", r#"{"column": "Comissão"}"#).is_error());
        assert!(error(call_operation_json(&store, "mean", "{not json")).starts_with("Argumentos inválidos"));
        assert!(call_operation_json(&store, "mean", "[1, 2]").is_error());
    }

    #[test]
    fn tool_definitions_mirror_the_registry() {
        let tools = tool_definitions();
        assert_eq!(tools.len(), OPERATIONS.len());

        let mean_period = tools
            .iter()
            .find(|t| t["function"]["name"] == "mean_period")
            .unwrap();
        let parameters = &mean_period["function"]["parameters"];
        assert_eq!(
            parameters["required"],
            json!(["column", "start_month", "start_year", "end_month", "end_year"])
        );
        assert_eq!(parameters["properties"]["start_year"]["type"], "integer");
        assert_eq!(parameters["properties"]["start_month"]["enum"][2], "Março");

        let payslip = tools
            .iter()
            .find(|t| t["function"]["name"] == "payslip_summary")
            .unwrap();
        assert!(!payslip["function"]["parameters"]["required"]
            .as_array()
            .unwrap()
            .iter()
            .any(|v| v == "detail"));
    }
}
