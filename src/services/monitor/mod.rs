pub mod detector;
pub mod engine;
pub mod shutdown;

pub use detector::{detect, BalanceChange};
pub use engine::{CycleResult, MonitorEngine, SchedulerState};
pub use shutdown::ShutdownSignal;
