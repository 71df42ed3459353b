/*
 * Interaction Module
 *
 * Distance-dependent force law between a boid and one of its neighbors.
 * With d the minimum-image distance and r the displacement toward the
 * neighbor, four bands apply:
 *
 *   d < R_B          hard-core repulsion, huge push away from the neighbor
 *   R_B <= d < R_A   linear attraction-repulsion, zero at the preferred
 *                    distance R_E, repulsive below it and attractive above
 *   R_A <= d < R_0   constant unit attraction
 *   d >= R_0         no interaction
 *
 * Every band below R_0 also contributes the neighbor's velocity to the
 * alignment term. The classifier itself only sees geometry, the stepper adds
 * the velocity.
 */

use nannou::prelude::{rgb, Rgb, Vec3};
use serde::Deserialize;

use crate::error::FlockError;

// Magnitude of the hard-core push (2^16)
pub const HARD_CORE_MAGNITUDE: f32 = 65536.0;

// Slope of the linear band, reached at R_A
const LINEAR_BAND_SCALE: f32 = 0.25;

// The four interaction radii, R_B < R_E < R_A < R_0
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct InteractionRadii {
    pub hard_core: f32,
    pub equilibrium: f32,
    pub attraction: f32,
    pub range: f32,
}

impl Default for InteractionRadii {
    fn default() -> Self {
        Self {
            hard_core: 0.2,
            equilibrium: 0.5,
            attraction: 0.8,
            range: 1.0,
        }
    }
}

impl InteractionRadii {
    pub fn validate(&self) -> Result<(), FlockError> {
        let ordered = [self.hard_core, self.equilibrium, self.attraction, self.range];
        let finite = ordered.iter().all(|r| r.is_finite());
        let ascending = ordered.windows(2).all(|w| w[0] < w[1]);

        if !finite || !ascending || self.hard_core < 0.0 {
            return Err(FlockError::InvalidRadii {
                hard_core: self.hard_core,
                equilibrium: self.equilibrium,
                attraction: self.attraction,
                range: self.range,
            });
        }
        Ok(())
    }
}

// Which band a neighbor falls into. Doubles as the render color tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Regime {
    HardCore,
    SoftRepulsion,
    SoftAttraction,
    ConstantForce,
    OutOfRange,
}

impl Regime {
    pub const ALL: [Regime; 5] = [
        Regime::HardCore,
        Regime::SoftRepulsion,
        Regime::SoftAttraction,
        Regime::ConstantForce,
        Regime::OutOfRange,
    ];

    // Whether the neighbor takes part in alignment and cohesion at all
    pub fn interacts(self) -> bool {
        self != Regime::OutOfRange
    }

    // Line color for renderers: red for hard core, blue shades around the
    // preferred distance, green for constant force
    pub fn color(self) -> Rgb<u8> {
        match self {
            Regime::HardCore => rgb(255, 0, 0),
            Regime::SoftRepulsion => rgb(0, 0, 255),
            Regime::SoftAttraction => rgb(0, 160, 255),
            Regime::ConstantForce => rgb(0, 255, 0),
            Regime::OutOfRange => rgb(0, 0, 0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Regime::HardCore => "hard-core",
            Regime::SoftRepulsion => "soft-repulsion",
            Regime::SoftAttraction => "soft-attraction",
            Regime::ConstantForce => "constant-force",
            Regime::OutOfRange => "out-of-range",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub regime: Regime,
    pub cohesion: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionClassifier {
    radii: InteractionRadii,
    hard_core_magnitude: f32,
}

impl InteractionClassifier {
    pub fn new(radii: InteractionRadii, hard_core_magnitude: f32) -> Result<Self, FlockError> {
        radii.validate()?;
        if !hard_core_magnitude.is_finite() || hard_core_magnitude < 0.0 {
            return Err(FlockError::InvalidParameter {
                name: "hard_core_magnitude",
                value: hard_core_magnitude,
            });
        }
        Ok(Self {
            radii,
            hard_core_magnitude,
        })
    }

    pub fn radii(&self) -> &InteractionRadii {
        &self.radii
    }

    pub fn regime(&self, distance: f32) -> Regime {
        let radii = &self.radii;
        if distance < radii.hard_core {
            Regime::HardCore
        } else if distance < radii.equilibrium {
            Regime::SoftRepulsion
        } else if distance < radii.attraction {
            Regime::SoftAttraction
        } else if distance < radii.range {
            Regime::ConstantForce
        } else {
            Regime::OutOfRange
        }
    }

    // Signed magnitude of the linear band: negative below R_E, zero at R_E
    #[inline]
    pub fn linear_scale(&self, distance: f32) -> f32 {
        let radii = &self.radii;
        LINEAR_BAND_SCALE * (distance - radii.equilibrium) / (radii.attraction - radii.equilibrium)
    }

    /// Classify a neighbor at displacement `r` (observer to neighbor) and
    /// distance `distance`, returning its cohesion contribution.
    pub fn classify(&self, r: Vec3, distance: f32) -> Interaction {
        let regime = self.regime(distance);
        let direction = r.normalize_or_zero();

        let cohesion = match regime {
            Regime::HardCore => direction * -self.hard_core_magnitude,
            Regime::SoftRepulsion | Regime::SoftAttraction => {
                direction * self.linear_scale(distance)
            }
            Regime::ConstantForce => direction,
            Regime::OutOfRange => Vec3::ZERO,
        };

        Interaction { regime, cohesion }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nannou::prelude::vec3;

    fn classifier() -> InteractionClassifier {
        InteractionClassifier::new(InteractionRadii::default(), HARD_CORE_MAGNITUDE).unwrap()
    }

    fn along_x(d: f32) -> Interaction {
        classifier().classify(vec3(d, 0.0, 0.0), d)
    }

    #[test]
    fn radii_must_ascend() {
        let mut radii = InteractionRadii::default();
        assert!(radii.validate().is_ok());

        radii.equilibrium = 0.9;
        assert!(radii.validate().is_err());

        let radii = InteractionRadii {
            hard_core: -0.1,
            ..InteractionRadii::default()
        };
        assert!(radii.validate().is_err());

        let radii = InteractionRadii {
            range: f32::NAN,
            ..InteractionRadii::default()
        };
        assert!(InteractionClassifier::new(radii, HARD_CORE_MAGNITUDE).is_err());
    }

    #[test]
    fn hard_core_pushes_away_hard() {
        let interaction = along_x(0.1);
        assert_eq!(interaction.regime, Regime::HardCore);
        assert_eq!(interaction.cohesion, vec3(-HARD_CORE_MAGNITUDE, 0.0, 0.0));
    }

    #[test]
    fn equilibrium_distance_has_no_cohesion() {
        let interaction = along_x(0.5);
        assert_eq!(interaction.regime, Regime::SoftAttraction);
        assert_eq!(interaction.cohesion, Vec3::ZERO);
        assert_eq!(classifier().linear_scale(0.5), 0.0);
    }

    #[test]
    fn linear_band_changes_sign_at_equilibrium() {
        let inner = along_x(0.35);
        assert_eq!(inner.regime, Regime::SoftRepulsion);
        assert!(inner.cohesion.x < 0.0);
        assert!((inner.cohesion.x - (-0.125)).abs() < 1e-5);

        let outer = along_x(0.65);
        assert_eq!(outer.regime, Regime::SoftAttraction);
        assert!((outer.cohesion.x - 0.125).abs() < 1e-5);

        // R_B itself belongs to the linear band
        assert_eq!(along_x(0.2).regime, Regime::SoftRepulsion);
    }

    #[test]
    fn constant_band_is_unit_attraction() {
        let interaction = classifier().classify(vec3(0.0, 0.9, 0.0), 0.9);
        assert_eq!(interaction.regime, Regime::ConstantForce);
        assert!((interaction.cohesion - vec3(0.0, 1.0, 0.0)).length() < 1e-6);

        assert_eq!(along_x(0.8).regime, Regime::ConstantForce);
    }

    #[test]
    fn range_boundary() {
        let eps = 1e-4;
        let inside = along_x(1.0 - eps);
        assert_eq!(inside.regime, Regime::ConstantForce);
        assert!((inside.cohesion.length() - 1.0).abs() < 1e-5);

        let outside = along_x(1.0 + eps);
        assert_eq!(outside.regime, Regime::OutOfRange);
        assert_eq!(outside.cohesion, Vec3::ZERO);
        assert!(!outside.regime.interacts());

        assert_eq!(along_x(1.0).regime, Regime::OutOfRange);
    }

    #[test]
    fn coincident_neighbor_gives_no_direction() {
        let interaction = classifier().classify(Vec3::ZERO, 0.0);
        assert_eq!(interaction.regime, Regime::HardCore);
        assert_eq!(interaction.cohesion, Vec3::ZERO);
    }

    #[test]
    fn every_regime_has_a_distinct_color() {
        for (i, a) in Regime::ALL.iter().enumerate() {
            for b in &Regime::ALL[i + 1..] {
                let (ca, cb) = (a.color(), b.color());
                assert!(
                    (ca.red, ca.green, ca.blue) != (cb.red, cb.green, cb.blue),
                    "{} and {} share a color",
                    a.label(),
                    b.label()
                );
            }
        }
    }
}
