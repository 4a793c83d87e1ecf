//! Physical models for the household: array, battery and appliances.

/// Appliance power model.
pub mod appliance;
/// Stationary battery storage model.
pub mod battery;
/// Photovoltaic generation model.
pub mod pv_array;
pub mod shading;

// Re-export the main types for convenience
pub use appliance::{Appliance, Mode, RunRule};
pub use battery::BatteryStore;
pub use pv_array::{ArraySpec, PvArray};
pub use shading::{HourlyShade, Shade, ShadingProfile};
