/// Measured daily generation input and comparison output.
pub mod actuals;
/// CSV log sink.
pub mod export;
pub mod forecast;
