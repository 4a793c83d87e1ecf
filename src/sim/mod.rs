/// Hourly simulation clock.
pub mod clock;
pub mod dispatch;
pub mod engine;
pub mod kpi;
pub mod power_balance;
/// Day-ahead appliance scheduling.
pub mod scheduler;
pub mod types;
