use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateResult, Breakdown, Point, Scalar, Series};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Text,
    Bar,
    Line,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    pub label: String,
    pub value: f64,
}

/// Parallel values for bar/line, labelled slices for pie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsightData {
    Values(Vec<f64>),
    Slices(Vec<Slice>),
}

/// Visualization-ready envelope. `kind` decides the shape of `data`: text
/// insights carry `message` and no data; pie insights leave both axes empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: ChartKind,
    pub title: String,
    pub x_axis: Vec<String>,
    pub y_axis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<InsightData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Insight {
    pub fn text(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ChartKind::Text,
            title: title.into(),
            x_axis: Vec::new(),
            y_axis: String::new(),
            data: None,
            total: None,
            message: Some(message.into()),
        }
    }
}

/// The uniform return shape: always a batch, even for a single insight.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InsightBatch {
    pub insights: Vec<Insight>,
}

impl From<Insight> for InsightBatch {
    fn from(insight: Insight) -> Self {
        Self {
            insights: vec![insight],
        }
    }
}

impl From<Vec<Insight>> for InsightBatch {
    fn from(insights: Vec<Insight>) -> Self {
        Self { insights }
    }
}

/// How a result should be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub kind: ChartKind,
    pub title: String,
    /// Series name for bar/line charts, slice label for a single-value pie.
    pub y_axis: Option<String>,
    /// Appended to the title as `: value [em m/yyyy]`.
    pub headline: Option<Scalar>,
    pub total: Option<f64>,
}

impl Presentation {
    pub fn new(kind: ChartKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            y_axis: None,
            headline: None,
            total: None,
        }
    }

    pub fn with_y_axis(mut self, y_axis: impl Into<String>) -> Self {
        self.y_axis = Some(y_axis.into());
        self
    }

    pub fn with_headline(mut self, headline: Scalar) -> Self {
        self.headline = Some(headline);
        self
    }

    pub fn with_total(mut self, total: f64) -> Self {
        self.total = Some(total);
        self
    }

    fn full_title(&self) -> String {
        let mut title = self.title.clone();
        if let Some(headline) = &self.headline {
            let _ = write!(title, ": {:.2}", headline.value);
            if let Some(at) = headline.at {
                let _ = write!(title, " em {at}");
            }
        }
        title
    }
}

fn slices(points: &[Point]) -> Vec<Slice> {
    points
        .iter()
        .map(|p| Slice {
            label: p.label.clone(),
            value: p.value,
        })
        .collect()
}

fn describe(points: &[Point]) -> String {
    let mut output = String::new();
    for point in points {
        let _ = writeln!(output, "- {}: {:.2}", point.label, point.value);
    }
    output
}

/// Maps one aggregate result onto one insight.
pub fn render(result: &AggregateResult, presentation: &Presentation) -> Insight {
    let title = presentation.full_title();

    if let AggregateResult::NotComputable { reason } = result {
        return Insight::text(title, reason.clone());
    }

    match presentation.kind {
        ChartKind::Text => Insight::text(title.clone(), text_message(&title, result)),
        ChartKind::Pie => render_pie(title, result, presentation),
        ChartKind::Bar | ChartKind::Line => render_axes(title, result, presentation),
    }
}

fn text_message(title: &str, result: &AggregateResult) -> String {
    match result {
        AggregateResult::Scalar(scalar) => match scalar.at {
            Some(at) => format!("{title}: {:.2} em {at}", scalar.value),
            None => format!("{title}: {:.2}", scalar.value),
        },
        AggregateResult::Series(series) => describe(&series.points),
        AggregateResult::Breakdown(Breakdown { items, total }) => {
            let mut output = describe(items);
            let _ = writeln!(output, "Total: {total:.2}");
            output
        }
        AggregateResult::NotComputable { reason } => reason.clone(),
    }
}

fn render_pie(title: String, result: &AggregateResult, presentation: &Presentation) -> Insight {
    let (data, total) = match result {
        AggregateResult::Scalar(scalar) => {
            let label = presentation.y_axis.clone().unwrap_or_else(|| title.clone());
            let slice = Slice {
                label,
                value: scalar.value,
            };
            (vec![slice], presentation.total)
        }
        AggregateResult::Series(series) => (slices(&series.points), presentation.total),
        AggregateResult::Breakdown(breakdown) => (
            slices(&breakdown.items),
            presentation.total.or(Some(breakdown.total)),
        ),
        AggregateResult::NotComputable { reason } => return Insight::text(title, reason.clone()),
    };

    Insight {
        kind: ChartKind::Pie,
        title,
        x_axis: Vec::new(),
        y_axis: String::new(),
        data: Some(InsightData::Slices(data)),
        total,
        message: None,
    }
}

fn render_axes(title: String, result: &AggregateResult, presentation: &Presentation) -> Insight {
    let (x_axis, series_name, values, total) = match result {
        AggregateResult::Scalar(scalar) => {
            let label = scalar.at.map(|at| at.to_string()).unwrap_or_else(|| title.clone());
            (vec![label], String::new(), vec![scalar.value], presentation.total)
        }
        AggregateResult::Series(Series { name, points }) => (
            points.iter().map(|p| p.label.clone()).collect(),
            name.clone(),
            points.iter().map(|p| p.value).collect(),
            presentation.total,
        ),
        AggregateResult::Breakdown(breakdown) => (
            breakdown.items.iter().map(|p| p.label.clone()).collect(),
            String::new(),
            breakdown.items.iter().map(|p| p.value).collect(),
            presentation.total.or(Some(breakdown.total)),
        ),
        AggregateResult::NotComputable { reason } => return Insight::text(title, reason.clone()),
    };

    Insight {
        kind: presentation.kind,
        title,
        x_axis,
        y_axis: presentation.y_axis.clone().unwrap_or(series_name),
        data: Some(InsightData::Values(values)),
        total,
        message: None,
    }
}

/// Renders several results into one batch, in order.
pub fn render_batch<'a, I>(results: I) -> InsightBatch
where
    I: IntoIterator<Item = (&'a AggregateResult, &'a Presentation)>,
{
    results
        .into_iter()
        .map(|(result, presentation)| render(result, presentation))
        .collect::<Vec<_>>()
        .into()
}
