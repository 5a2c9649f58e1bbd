pub mod audio;
mod app;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod stt;
mod telemetry;

pub use app::logging::{
    crash_log_path, init_logging, log_debug, log_debug_content, log_file_path, log_panic,
};
pub use pipeline::{run_pipeline, PipelineConfig, PipelineMetrics, StopCause};
pub use telemetry::init_tracing;
