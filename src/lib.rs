//! Household photovoltaic, battery and appliance dispatch simulator.

pub mod cli;
pub mod config;
/// PV array, battery, appliance and shading models.
pub mod devices;
pub mod error;
pub mod forecast;
/// Forecast loaders, log export and measured-generation input.
pub mod io;
pub mod runner;
/// Simulation engine, dispatch and scheduling modules.
pub mod sim;
pub mod validation;
