//! 工具模块

pub mod clock;
pub mod run_tracer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use run_tracer::RunTracer;
