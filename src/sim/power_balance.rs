//! Household energy balance for one hour.

/// Computes the energy balance residual for one hour.
///
/// Sources on the left, sinks on the right:
/// `generation + discharged + imported = load + charged + exported`.
/// A correct dispatch returns a residual of zero within float tolerance.
///
/// # Arguments
///
/// * `generation_wh` - PV energy produced
/// * `discharged_wh` - Energy supplied by the battery
/// * `imported_wh` - Energy bought from the grid
/// * `load_wh` - Appliance consumption
/// * `charged_wh` - Energy absorbed by the battery
/// * `exported_wh` - Energy sent to the grid
///
/// # Returns
///
/// `sources - sinks` in Wh
pub fn balance_residual_wh(
    generation_wh: f64,
    discharged_wh: f64,
    imported_wh: f64,
    load_wh: f64,
    charged_wh: f64,
    exported_wh: f64,
) -> f64 {
    (generation_wh + discharged_wh + imported_wh) - (load_wh + charged_wh + exported_wh)
}
