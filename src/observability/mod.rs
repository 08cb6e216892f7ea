// Observability: metric names and recording helpers per pipeline phase

pub mod metrics;

pub use metrics::{init as init_metrics, render as render_metrics, MetricName};
