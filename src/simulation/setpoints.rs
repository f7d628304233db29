//! Setpoint validation.
//!
//! A thermostat needs the cooling setpoint to sit at least one deadband above
//! the heating setpoint. Violations are repaired in the direction that keeps
//! the season's active side where the occupant put it.

use tracing::warn;

use crate::domain::{ConditioningMode, Season, SetpointDiagnostic, SetpointPair, TemperatureUnit};

/// Validated pair plus the repairs applied to reach it
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSetpoints {
    pub pair: SetpointPair,
    pub diagnostics: Vec<SetpointDiagnostic>,
}

/// Repair `candidate` so that `cooling - deadband >= heating` and neither value
/// is negative. All values are in `unit`.
///
/// Deadband violations are repaired first: in cooling seasons the heating
/// setpoint drops to `floor(cooling - (deadband + 0.5))`, in heating seasons
/// the cooling setpoint rises to `ceil(heating + deadband + 0.5)`. A negative
/// result then falls back to the unit's floor pair.
pub fn validate_setpoints(
    candidate: SetpointPair,
    deadband: f64,
    season: Season,
    unit: TemperatureUnit,
) -> ValidatedSetpoints {
    let mut pair = candidate;
    let mut diagnostics = Vec::new();

    if !pair.satisfies_deadband(deadband) {
        let repaired = match season.conditioning_mode() {
            ConditioningMode::Cooling => {
                SetpointPair::new(pair.cooling, (pair.cooling - (deadband + 0.5)).floor())
            }
            ConditioningMode::Heating => {
                SetpointPair::new((pair.heating + deadband + 0.5).ceil(), pair.heating)
            }
        };
        warn!(
            original = %pair,
            repaired = %repaired,
            deadband,
            %season,
            "setpoints violate deadband, repairing"
        );
        diagnostics.push(SetpointDiagnostic::Repaired {
            original: pair,
            repaired,
        });
        pair = repaired;
    }

    if pair.cooling < 0.0 || pair.heating < 0.0 {
        let floor = unit.setpoint_floor();
        warn!(original = %pair, floor = %floor, "negative setpoint, clamping to floor");
        diagnostics.push(SetpointDiagnostic::FloorClamped {
            original: pair,
            floor,
        });
        pair = floor;
    }

    ValidatedSetpoints { pair, diagnostics }
}
