//! Fixed-priority hourly dispatch between PV, load, battery and grid.

use std::fmt;

use crate::devices::BatteryStore;

use super::power_balance::balance_residual_wh;

/// Categorical outcome of one hour's reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Surplus routed into the battery.
    Charge,
    /// Battery full, surplus sent to the grid.
    Export,
    /// Deficit covered (at least partly) by the battery.
    Discharge,
    /// Neither charging nor discharging.
    Idle,
    /// Load met from the grid.
    GridImport,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Charge => "charge",
            Self::Export => "export",
            Self::Discharge => "discharge",
            Self::Idle => "idle",
            Self::GridImport => "grid_import",
        };
        f.write_str(s)
    }
}

/// Energy flows decided for one hour. All quantities are non-negative Wh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchOutcome {
    /// Primary decision taken.
    pub decision: Decision,
    /// Energy absorbed by the battery.
    pub charged_wh: f64,
    /// Energy supplied by the battery.
    pub discharged_wh: f64,
    /// Residual energy bought from the grid.
    pub imported_wh: f64,
    /// Surplus sent to the grid.
    pub exported_wh: f64,
}

impl DispatchOutcome {
    fn new(decision: Decision) -> Self {
        Self {
            decision,
            charged_wh: 0.0,
            discharged_wh: 0.0,
            imported_wh: 0.0,
            exported_wh: 0.0,
        }
    }

    /// Returns `true` when any energy was imported this hour.
    pub fn imports_from_grid(&self) -> bool {
        self.imported_wh > 0.0
    }

    /// Decision label with a `+grid_import` flag when a discharge or idle
    /// hour still needed grid energy.
    pub fn label(&self) -> String {
        if self.imports_from_grid() && self.decision != Decision::GridImport {
            format!("{}+{}", self.decision, Decision::GridImport)
        } else {
            self.decision.to_string()
        }
    }

    /// Balance residual for this outcome; zero for a conserving dispatch.
    pub fn balance_residual_wh(&self, generation_wh: f64, load_wh: f64) -> f64 {
        balance_residual_wh(
            generation_wh,
            self.discharged_wh,
            self.imported_wh,
            load_wh,
            self.charged_wh,
            self.exported_wh,
        )
    }
}

/// Hourly dispatch policy.
///
/// Priority order: serve load from PV, put any surplus into the battery
/// while it has headroom, export only once it is full. Deficits are drawn
/// from the battery first and the grid covers whatever remains. Nothing in
/// here fails; negative inputs are treated as zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct DispatchEngine {
    enforce_rated_power: bool,
}

impl DispatchEngine {
    /// Creates a policy.
    ///
    /// With `enforce_rated_power` the battery's rated power caps the energy
    /// moved in or out per hour; the excess goes to or comes from the grid.
    pub fn new(enforce_rated_power: bool) -> Self {
        Self {
            enforce_rated_power,
        }
    }

    /// Returns `true` if rated-power caps are applied.
    pub fn enforces_rated_power(&self) -> bool {
        self.enforce_rated_power
    }

    fn hourly_cap_wh(&self, battery: &BatteryStore) -> f64 {
        if self.enforce_rated_power {
            battery.rated_power_w()
        } else {
            f64::INFINITY
        }
    }

    /// Reconciles one hour and mutates the battery accordingly.
    ///
    /// # Arguments
    ///
    /// * `generation_wh` - PV output for the hour
    /// * `load_wh` - Appliance consumption for the hour
    /// * `battery` - Battery state carried between hours
    pub fn dispatch(
        &self,
        generation_wh: f64,
        load_wh: f64,
        battery: &mut BatteryStore,
    ) -> DispatchOutcome {
        let generation_wh = generation_wh.max(0.0);
        let load_wh = load_wh.max(0.0);
        let cap_wh = self.hourly_cap_wh(battery);

        if generation_wh > 0.0 {
            if generation_wh >= load_wh {
                let surplus = generation_wh - load_wh;
                if battery.state_of_charge_percent() < 100.0 {
                    let before = battery.stored_wh();
                    battery.charge(surplus.min(cap_wh));
                    let mut out = DispatchOutcome::new(Decision::Charge);
                    out.charged_wh = battery.stored_wh() - before;
                    out.exported_wh = (surplus - out.charged_wh).max(0.0);
                    if out.exported_wh > 0.0 {
                        tracing::debug!(
                            overflow_wh = out.exported_wh,
                            "surplus beyond battery intake exported"
                        );
                    }
                    out
                } else {
                    let mut out = DispatchOutcome::new(Decision::Export);
                    out.exported_wh = surplus;
                    out
                }
            } else {
                let deficit = load_wh - generation_wh;
                let supplied = battery.discharge(deficit.min(cap_wh));
                let decision = if supplied > 0.0 {
                    Decision::Discharge
                } else {
                    Decision::Idle
                };
                let mut out = DispatchOutcome::new(decision);
                out.discharged_wh = supplied;
                out.imported_wh = (deficit - supplied).max(0.0);
                out
            }
        } else if battery.state_of_charge_percent() > 0.0 {
            let supplied = battery.discharge(load_wh.min(cap_wh));
            if supplied < load_wh {
                let mut out = DispatchOutcome::new(Decision::GridImport);
                out.discharged_wh = supplied;
                out.imported_wh = load_wh - supplied;
                out
            } else {
                let mut out = DispatchOutcome::new(Decision::Discharge);
                out.discharged_wh = supplied;
                out
            }
        } else {
            let mut out = DispatchOutcome::new(Decision::GridImport);
            out.imported_wh = load_wh;
            out
        }
    }
}
