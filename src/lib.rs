pub mod config;
pub mod edit;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod registry;
pub mod session;
pub mod storage;
pub mod table;

// Debug-only printing helper: eprintln! in test and debug builds, compiled out otherwise.
// Usage: tprintln!("debug: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In release builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        // Preserve formatting checks in release without producing code
        if false { let _ = format!($($arg)*); }
    });
}

pub use config::{DashboardConfig, SheetCategory};
pub use engine::{MetricOutcome, MetricResult};
pub use error::{AppError, AppResult};
pub use session::{DashboardReport, DashboardSession};
pub use table::{Cell, Table};
