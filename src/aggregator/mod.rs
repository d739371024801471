pub mod daily_series;
pub mod ideal_line;
pub mod milestone_fetcher;
pub mod chart_generator;

pub use milestone_fetcher::{BurndownCollector, CollectorConfig};
pub use chart_generator::{ChartGenerator, ChartOptions, OutputFormat};
