pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod sink;
pub mod words;

pub use config::AppConfig;
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pipeline::{WordOutcome, WordPipeline, WordState};
pub use sink::CsvSink;
pub use words::{load_words, parse_words};
