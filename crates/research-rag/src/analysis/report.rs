//! Tabular and chart views of extracted metrics

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::types::ResearchMetric;

use super::extractor::{ExtractionRun, PageFailure, PageMetrics};

pub const TREND_TITLE: &str = "Performance Metrics Over Time";
pub const COMPARISON_TITLE: &str = "Metric Comparison";
pub const NO_DATA_WARNING: &str =
    "No structured data found. Check the extracted pages to see if the model read anything.";

/// One table row with the fallback year already applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricRow {
    pub year: i32,
    pub metric: String,
    pub value: f64,
    pub unit: Option<String>,
    pub paper: String,
}

impl MetricRow {
    pub fn from_metric(metric: &ResearchMetric, fallback_year: i32) -> Self {
        Self {
            year: metric.year.unwrap_or(fallback_year),
            metric: metric.metric_name.clone(),
            value: metric.metric_value,
            unit: metric.unit.clone(),
            paper: metric.paper_title.clone(),
        }
    }
}

/// Give every metric without a year the fallback year
pub fn apply_fallback_year<'a, I>(metrics: I, fallback_year: i32) -> Vec<MetricRow>
where
    I: IntoIterator<Item = &'a ResearchMetric>,
{
    metrics
        .into_iter()
        .map(|m| MetricRow::from_metric(m, fallback_year))
        .collect()
}

/// One line of the trend chart: a (metric, paper) pair over years
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub metric: String,
    pub paper: String,
    /// `(year, value)` sorted by year
    pub points: Vec<(i32, f64)>,
}

/// Line chart of values over years
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendChart {
    pub title: String,
    pub series: Vec<TrendSeries>,
}

impl TrendChart {
    pub fn from_rows(rows: &[MetricRow]) -> Self {
        let mut series: BTreeMap<(String, String), Vec<(i32, f64)>> = BTreeMap::new();
        for row in rows {
            series
                .entry((row.metric.clone(), row.paper.clone()))
                .or_default()
                .push((row.year, row.value));
        }

        let series = series
            .into_iter()
            .map(|((metric, paper), mut points)| {
                points.sort_by_key(|(year, _)| *year);
                TrendSeries {
                    metric,
                    paper,
                    points,
                }
            })
            .collect();

        Self {
            title: TREND_TITLE.to_string(),
            series,
        }
    }

    /// Vega-Lite spec: x = Year, y = Value, colour by Metric, point shape by Paper
    pub fn to_vega_lite(&self) -> Value {
        let values: Vec<Value> = self
            .series
            .iter()
            .flat_map(|s| {
                s.points.iter().map(move |(year, value)| {
                    json!({"Year": year, "Value": value, "Metric": s.metric, "Paper": s.paper})
                })
            })
            .collect();

        json!({
            "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
            "title": self.title,
            "data": {"values": values},
            "mark": {"type": "line", "point": true},
            "encoding": {
                "x": {"field": "Year", "type": "ordinal", "sort": "ascending"},
                "y": {"field": "Value", "type": "quantitative"},
                "color": {"field": "Metric", "type": "nominal"},
                "shape": {"field": "Paper", "type": "nominal"},
                "detail": {"field": "Paper", "type": "nominal"}
            }
        })
    }
}

/// One bar of the comparison chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub paper: String,
    pub value: f64,
}

/// Bars sharing one metric on the x axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarGroup {
    pub metric: String,
    pub bars: Vec<Bar>,
}

/// Grouped bar chart of values per metric, one bar per paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonChart {
    pub title: String,
    pub groups: Vec<BarGroup>,
}

impl ComparisonChart {
    pub fn from_rows(rows: &[MetricRow]) -> Self {
        let mut groups: Vec<BarGroup> = Vec::new();
        for row in rows {
            let bar = Bar {
                paper: row.paper.clone(),
                value: row.value,
            };
            match groups.iter_mut().find(|g| g.metric == row.metric) {
                Some(group) => group.bars.push(bar),
                None => groups.push(BarGroup {
                    metric: row.metric.clone(),
                    bars: vec![bar],
                }),
            }
        }

        Self {
            title: COMPARISON_TITLE.to_string(),
            groups,
        }
    }

    /// Vega-Lite spec: x = Metric, y = Value, bars grouped by Paper
    pub fn to_vega_lite(&self) -> Value {
        let values: Vec<Value> = self
            .groups
            .iter()
            .flat_map(|g| {
                g.bars.iter().map(move |b| {
                    json!({"Metric": g.metric, "Value": b.value, "Paper": b.paper})
                })
            })
            .collect();

        json!({
            "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
            "title": self.title,
            "data": {"values": values},
            "mark": "bar",
            "encoding": {
                "x": {"field": "Metric", "type": "nominal"},
                "y": {"field": "Value", "type": "quantitative"},
                "color": {"field": "Paper", "type": "nominal"},
                "xOffset": {"field": "Paper", "type": "nominal"}
            }
        })
    }
}

/// Everything shown after an extraction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub rows: Vec<MetricRow>,
    pub pages_processed: usize,
    pub pages_failed: Vec<PageFailure>,
    /// Raw per-page findings, for inspecting what the model returned
    pub pages: Vec<PageMetrics>,
    pub trend_chart: TrendChart,
    pub comparison_chart: ComparisonChart,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl MetricsReport {
    pub fn build(run: ExtractionRun, fallback_year: i32) -> Self {
        let rows = apply_fallback_year(run.metrics(), fallback_year);
        let warning = rows.is_empty().then(|| NO_DATA_WARNING.to_string());

        Self {
            trend_chart: TrendChart::from_rows(&rows),
            comparison_chart: ComparisonChart::from_rows(&rows),
            rows,
            pages_processed: run.pages_processed,
            pages_failed: run.failures,
            pages: run.pages,
            warning,
        }
    }

    /// Both charts as Vega-Lite specs
    pub fn charts_vega_lite(&self) -> Value {
        json!({
            "trend": self.trend_chart.to_vega_lite(),
            "comparison": self.comparison_chart.to_vega_lite(),
        })
    }

    /// The report with its charts rendered, as served and written to disk
    pub fn with_vega_lite(self) -> RenderedReport {
        RenderedReport {
            vega_lite: self.charts_vega_lite(),
            report: self,
        }
    }
}

/// A [`MetricsReport`] plus ready-to-render Vega-Lite chart specs
#[derive(Debug, Clone, Serialize)]
pub struct RenderedReport {
    #[serde(flatten)]
    pub report: MetricsReport,
    /// `{"trend": ..., "comparison": ...}`
    pub vega_lite: Value,
}
