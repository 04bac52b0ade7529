//! Metric extraction and reporting

pub mod extractor;
pub mod report;

pub use extractor::{
    parse_extraction_reply, ExtractionRun, MetricExtractor, PageFailure, PageMetrics,
};
pub use report::{
    apply_fallback_year, ComparisonChart, MetricRow, MetricsReport, RenderedReport, TrendChart,
};
