//! Six-component force/moment vectors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{LoadError, LoadResult};
use super::units::{UnitKind, Units};

/// One of the six force/moment components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// Force along X.
    Fx,
    /// Force along Y.
    Fy,
    /// Force along Z.
    Fz,
    /// Moment about X.
    Mx,
    /// Moment about Y.
    My,
    /// Moment about Z.
    Mz,
}

impl Component {
    /// Canonical order: fx, fy, fz, mx, my, mz.
    pub const ALL: [Self; 6] = [Self::Fx, Self::Fy, Self::Fz, Self::Mx, Self::My, Self::Mz];

    /// Lowercase identifier used in JSON and export decks.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fx => "fx",
            Self::Fy => "fy",
            Self::Fz => "fz",
            Self::Mx => "mx",
            Self::My => "my",
            Self::Mz => "mz",
        }
    }

    /// Whether this component is a force (as opposed to a moment).
    #[must_use]
    pub const fn is_force(self) -> bool {
        matches!(self, Self::Fx | Self::Fy | Self::Fz)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = LoadError;

    /// Case-insensitive: `Fx`, `fx` and `FX` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fx" => Ok(Self::Fx),
            "fy" => Ok(Self::Fy),
            "fz" => Ok(Self::Fz),
            "mx" => Ok(Self::Mx),
            "my" => Ok(Self::My),
            "mz" => Ok(Self::Mz),
            other => Err(LoadError::malformed(format!("unknown component '{other}'"))),
        }
    }
}

/// Force and moment acting at a point.
///
/// Forces share one unit and moments another; the unit pair is owned by the
/// enclosing LoadSet. Values are never mutated piecemeal: transformations
/// return a new vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForceMoment {
    /// Force along X.
    #[serde(default)]
    pub fx: f64,
    /// Force along Y.
    #[serde(default)]
    pub fy: f64,
    /// Force along Z.
    #[serde(default)]
    pub fz: f64,
    /// Moment about X.
    #[serde(default)]
    pub mx: f64,
    /// Moment about Y.
    #[serde(default)]
    pub my: f64,
    /// Moment about Z.
    #[serde(default)]
    pub mz: f64,
}

impl ForceMoment {
    /// Creates a vector from its six components.
    #[must_use]
    pub const fn new(fx: f64, fy: f64, fz: f64, mx: f64, my: f64, mz: f64) -> Self {
        Self {
            fx,
            fy,
            fz,
            mx,
            my,
            mz,
        }
    }

    /// Returns a single component.
    #[must_use]
    pub const fn get(&self, component: Component) -> f64 {
        match component {
            Component::Fx => self.fx,
            Component::Fy => self.fy,
            Component::Fz => self.fz,
            Component::Mx => self.mx,
            Component::My => self.my,
            Component::Mz => self.mz,
        }
    }

    /// Iterates `(component, value)` pairs in canonical order.
    pub fn components(&self) -> impl Iterator<Item = (Component, f64)> + '_ {
        Component::ALL.iter().map(move |&c| (c, self.get(c)))
    }

    /// Applies `f` to every component.
    #[must_use]
    pub fn map(&self, f: impl Fn(Component, f64) -> f64) -> Self {
        Self {
            fx: f(Component::Fx, self.fx),
            fy: f(Component::Fy, self.fy),
            fz: f(Component::Fz, self.fz),
            mx: f(Component::Mx, self.mx),
            my: f(Component::My, self.my),
            mz: f(Component::Mz, self.mz),
        }
    }

    /// Multiplies every component by `factor`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidScaleFactor`] if `factor` is NaN or
    /// infinite, or if a scaled component overflows to infinity.
    pub fn scale(&self, factor: f64) -> LoadResult<Self> {
        validate_factor(factor)?;
        let scaled = self.map(|_, v| v * factor);
        if scaled.components().all(|(_, v)| v.is_finite()) {
            Ok(scaled)
        } else {
            Err(LoadError::InvalidScaleFactor { factor })
        }
    }

    /// Converts from one unit pair to another.
    ///
    /// Forces and moments use their own factors.
    #[must_use]
    pub fn convert(&self, from: Units, to: Units) -> Self {
        self.map(|c, v| {
            if c.is_force() {
                from.forces.convert(v, to.forces)
            } else {
                from.moments.convert(v, to.moments)
            }
        })
    }

    /// Whether every component is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.components().all(|(_, v)| v == 0.0)
    }
}

/// Rejects non-finite scale factors.
pub(crate) fn validate_factor(factor: f64) -> LoadResult<()> {
    if factor.is_finite() {
        Ok(())
    } else {
        Err(LoadError::InvalidScaleFactor { factor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::units::{ForceUnit, MomentUnit};

    #[test]
    fn scale_multiplies_every_component() {
        let fm = ForceMoment::new(1.0, -2.0, 3.0, 4.0, -5.0, 6.0);
        let scaled = fm.scale(2.0).unwrap();
        assert_eq!(scaled, ForceMoment::new(2.0, -4.0, 6.0, 8.0, -10.0, 12.0));
    }

    #[test]
    fn scale_rejects_non_finite() {
        let fm = ForceMoment::default();
        assert!(matches!(
            fm.scale(f64::NAN),
            Err(LoadError::InvalidScaleFactor { .. })
        ));
        assert!(fm.scale(f64::INFINITY).is_err());
        assert!(fm.scale(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn convert_keeps_forces_and_moments_apart() {
        let fm = ForceMoment::new(1000.0, 0.0, 0.0, 1000.0, 0.0, 0.0);
        let from = Units::new(ForceUnit::Newton, MomentUnit::NewtonMetre);
        let to = Units::new(ForceUnit::Kilonewton, MomentUnit::NewtonMillimetre);
        let out = fm.convert(from, to);
        assert!((out.fx - 1.0).abs() < 1e-12);
        assert!((out.mx - 1_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn component_order_and_parsing() {
        let names: Vec<_> = Component::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, ["fx", "fy", "fz", "mx", "my", "mz"]);
        assert_eq!("FX".parse::<Component>().unwrap(), Component::Fx);
        assert_eq!("Mz".parse::<Component>().unwrap(), Component::Mz);
        assert!("fw".parse::<Component>().is_err());
    }

    #[test]
    fn scale_rejects_overflow() {
        let fm = ForceMoment::new(1e300, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert!(matches!(
            fm.scale(1e10),
            Err(LoadError::InvalidScaleFactor { .. })
        ));
        assert!(fm.scale(-1e10).is_err());
        assert!(fm.scale(1e5).is_ok());
    }

    #[test]
    fn missing_components_default_to_zero() {
        let fm: ForceMoment = serde_json::from_str(r#"{"fx": 5.0}"#).unwrap();
        assert!((fm.fx - 5.0).abs() < f64::EPSILON);
        assert!(fm.map(|c, v| if c == Component::Fx { 0.0 } else { v }).is_zero());
    }
}
