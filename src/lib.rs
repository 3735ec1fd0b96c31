//! Payroll analytics engine: answers questions about one employee's monthly
//! pay history with deterministic statistics, packaged as chart-ready insights.
//!
//! Everything goes through [`call_operation`], which always returns a
//! serializable [`Response`].

pub mod aggregate;
pub mod dispatch;
pub mod error;
pub mod insight;
pub mod models;
pub mod period;
pub mod store;

pub use dispatch::{call_operation, call_operation_json, tool_definitions, Response};
pub use error::{QueryError, StoreError};
pub use insight::{ChartKind, Insight, InsightBatch};
pub use models::{Column, MonthRef, PayRecord};
pub use store::TimeSeriesStore;
