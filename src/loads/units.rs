//! Force and moment units.
//!
//! Every unit carries one fixed factor to its canonical base unit: newtons
//! for forces, newton-metres for moments. Conversions go through the base
//! unit, and converting a unit to itself returns the input untouched.
//!
//! | Force  | in N     | Moment    | in N·m   |
//! |--------|----------|-----------|----------|
//! | `N`    | 1        | `Nm`      | 1        |
//! | `kN`   | 1000     | `Nmm`     | 0.001    |
//! | `lbf`  | 4.448222 | `kNm`     | 1000     |
//! | `klbf` | 4448.222 | `lbf-ft`  | 1.355818 |
//! |        |          | `klbf-ft` | 1355.818 |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{LoadError, LoadResult};

/// Newtons per pound-force.
pub const NEWTONS_PER_LBF: f64 = 4.448_222;

/// Newton-metres per pound-force foot.
pub const NEWTON_METRES_PER_LBF_FT: f64 = 1.355_818;

/// Behaviour shared by force and moment units.
pub trait UnitKind: Copy + PartialEq + fmt::Display {
    /// Factor that takes a value in this unit to the base unit.
    fn to_base(self) -> f64;

    /// Canonical identifier, e.g. `"kN"`.
    fn symbol(self) -> &'static str;

    /// Converts `value` from `self` to `to`.
    ///
    /// Identity conversions return `value` unchanged.
    #[must_use]
    fn convert(self, value: f64, to: Self) -> f64 {
        if self == to {
            value
        } else {
            value * self.to_base() / to.to_base()
        }
    }
}

/// Force units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ForceUnit {
    /// Newton.
    #[default]
    Newton,
    /// Kilonewton.
    Kilonewton,
    /// Pound-force.
    PoundForce,
    /// Kilo pound-force (kip).
    KiloPoundForce,
}

impl ForceUnit {
    /// All force units.
    pub const ALL: [Self; 4] = [
        Self::Newton,
        Self::Kilonewton,
        Self::PoundForce,
        Self::KiloPoundForce,
    ];

    /// Moment unit conventionally paired with this force unit.
    #[must_use]
    pub const fn companion_moment(self) -> MomentUnit {
        match self {
            Self::Newton => MomentUnit::NewtonMetre,
            Self::Kilonewton => MomentUnit::KilonewtonMetre,
            Self::PoundForce | Self::KiloPoundForce => MomentUnit::PoundForceFoot,
        }
    }
}

impl UnitKind for ForceUnit {
    fn to_base(self) -> f64 {
        match self {
            Self::Newton => 1.0,
            Self::Kilonewton => 1000.0,
            Self::PoundForce => NEWTONS_PER_LBF,
            Self::KiloPoundForce => NEWTONS_PER_LBF * 1000.0,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Newton => "N",
            Self::Kilonewton => "kN",
            Self::PoundForce => "lbf",
            Self::KiloPoundForce => "klbf",
        }
    }
}

impl FromStr for ForceUnit {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "n" | "newton" | "newtons" => Ok(Self::Newton),
            "kn" | "kilonewton" | "kilonewtons" => Ok(Self::Kilonewton),
            "lbf" | "lb" | "lbs" => Ok(Self::PoundForce),
            "klbf" | "klb" | "klbs" | "kip" | "kips" => Ok(Self::KiloPoundForce),
            _ => Err(LoadError::unrecognized_unit(s)),
        }
    }
}

/// Moment units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MomentUnit {
    /// Newton-metre.
    #[default]
    NewtonMetre,
    /// Newton-millimetre.
    NewtonMillimetre,
    /// Kilonewton-metre.
    KilonewtonMetre,
    /// Pound-force foot.
    PoundForceFoot,
    /// Kilo pound-force foot.
    KiloPoundForceFoot,
}

impl MomentUnit {
    /// All moment units.
    pub const ALL: [Self; 5] = [
        Self::NewtonMetre,
        Self::NewtonMillimetre,
        Self::KilonewtonMetre,
        Self::PoundForceFoot,
        Self::KiloPoundForceFoot,
    ];
}

impl UnitKind for MomentUnit {
    fn to_base(self) -> f64 {
        match self {
            Self::NewtonMetre => 1.0,
            Self::NewtonMillimetre => 0.001,
            Self::KilonewtonMetre => 1000.0,
            Self::PoundForceFoot => NEWTON_METRES_PER_LBF_FT,
            Self::KiloPoundForceFoot => NEWTON_METRES_PER_LBF_FT * 1000.0,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::NewtonMetre => "Nm",
            Self::NewtonMillimetre => "Nmm",
            Self::KilonewtonMetre => "kNm",
            Self::PoundForceFoot => "lbf-ft",
            Self::KiloPoundForceFoot => "klbf-ft",
        }
    }
}

impl FromStr for MomentUnit {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nm" | "n·m" | "n-m" | "n.m" => Ok(Self::NewtonMetre),
            "nmm" | "n·mm" | "n-mm" | "n.mm" => Ok(Self::NewtonMillimetre),
            "knm" | "kn·m" | "kn-m" | "kn.m" => Ok(Self::KilonewtonMetre),
            "lbf-ft" | "lbf·ft" | "lbf.ft" | "ft-lbf" | "ft-lb" | "lb-ft" => {
                Ok(Self::PoundForceFoot)
            }
            "klbf-ft" | "klbf·ft" | "kip-ft" | "k-ft" => Ok(Self::KiloPoundForceFoot),
            _ => Err(LoadError::unrecognized_unit(s)),
        }
    }
}

macro_rules! unit_string_impls {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.symbol())
            }
        }

        impl TryFrom<String> for $ty {
            type Error = LoadError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$ty> for String {
            fn from(unit: $ty) -> Self {
                unit.symbol().to_string()
            }
        }
    };
}

unit_string_impls!(ForceUnit);
unit_string_impls!(MomentUnit);

/// Either kind of unit, for string-level conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// A force unit.
    Force(ForceUnit),
    /// A moment unit.
    Moment(MomentUnit),
}

impl FromStr for Unit {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<ForceUnit>()
            .map(Self::Force)
            .or_else(|_| s.parse::<MomentUnit>().map(Self::Moment))
            .map_err(|_| LoadError::unrecognized_unit(s))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Force(u) => u.fmt(f),
            Self::Moment(u) => u.fmt(f),
        }
    }
}

/// Converts `value` between two unit identifiers.
///
/// # Errors
///
/// Returns [`LoadError::UnrecognizedUnit`] if either identifier is unknown and
/// [`LoadError::DimensionMismatch`] if one is a force and the other a moment.
pub fn convert(value: f64, from: &str, to: &str) -> LoadResult<f64> {
    let from_unit: Unit = from.parse()?;
    let to_unit: Unit = to.parse()?;
    match (from_unit, to_unit) {
        (Unit::Force(a), Unit::Force(b)) => Ok(a.convert(value, b)),
        (Unit::Moment(a), Unit::Moment(b)) => Ok(a.convert(value, b)),
        _ => Err(LoadError::DimensionMismatch {
            from: from_unit.to_string(),
            to: to_unit.to_string(),
        }),
    }
}

/// Unit pair declared by a LoadSet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Units {
    /// Unit of fx, fy, fz.
    pub forces: ForceUnit,
    /// Unit of mx, my, mz.
    pub moments: MomentUnit,
}

impl Units {
    /// Creates a unit pair.
    #[must_use]
    pub const fn new(forces: ForceUnit, moments: MomentUnit) -> Self {
        Self { forces, moments }
    }

    /// A force unit with its conventional moment unit.
    #[must_use]
    pub const fn with_companion(forces: ForceUnit) -> Self {
        Self::new(forces, forces.companion_moment())
    }

    /// Parses a unit pair. When `moments` is `None` the companion moment unit
    /// of the force unit is used.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnrecognizedUnit`] if either identifier is unknown.
    pub fn parse(forces: &str, moments: Option<&str>) -> LoadResult<Self> {
        let forces: ForceUnit = forces.parse()?;
        let moments = match moments {
            Some(m) => m.parse()?,
            None => forces.companion_moment(),
        };
        Ok(Self::new(forces, moments))
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.forces, self.moments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_conversion_is_exact() {
        let x = 0.1 + 0.2;
        for unit in ForceUnit::ALL {
            assert_eq!(unit.convert(x, unit).to_bits(), x.to_bits());
        }
        for unit in MomentUnit::ALL {
            assert_eq!(unit.convert(x, unit).to_bits(), x.to_bits());
        }
    }

    #[test]
    fn round_trip_all_pairs() {
        let x = 1234.567_89;
        for a in ForceUnit::ALL {
            for b in ForceUnit::ALL {
                let back = b.convert(a.convert(x, b), a);
                assert!((back - x).abs() < 1e-9, "{a} -> {b}");
            }
        }
        for a in MomentUnit::ALL {
            for b in MomentUnit::ALL {
                let back = b.convert(a.convert(x, b), a);
                assert!((back - x).abs() < 1e-9, "{a} -> {b}");
            }
        }
    }

    #[test]
    fn conversion_is_symmetric() {
        let x = 42.0;
        let forward = convert(x, "kN", "lbf").unwrap();
        let reverse_unit = convert(1.0, "lbf", "kN").unwrap();
        assert!((forward - x / reverse_unit).abs() < 1e-9);
    }

    #[test]
    fn known_constants() {
        assert!((convert(1.0, "lbf", "N").unwrap() - 4.448_222).abs() < 1e-12);
        assert!((convert(1.0, "lbf-ft", "Nm").unwrap() - 1.355_818).abs() < 1e-12);
        assert!((convert(1000.0, "N", "kN").unwrap() - 1.0).abs() < 1e-12);
        assert!((convert(100.0, "Nm", "lbf-ft").unwrap() - 73.756).abs() < 1e-3);
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("N·m".parse::<MomentUnit>().unwrap(), MomentUnit::NewtonMetre);
        assert_eq!("kips".parse::<ForceUnit>().unwrap(), ForceUnit::KiloPoundForce);
        assert_eq!(" kN ".parse::<ForceUnit>().unwrap(), ForceUnit::Kilonewton);
    }

    #[test]
    fn unknown_unit_is_an_error() {
        let err = convert(1.0, "furlong", "N").unwrap_err();
        assert!(matches!(err, LoadError::UnrecognizedUnit { .. }));
    }

    #[test]
    fn kilopound_aliases() {
        for alias in ["klbf", "klbs", "klb", "KLBS", "kips"] {
            assert_eq!(alias.parse::<ForceUnit>().unwrap(), ForceUnit::KiloPoundForce, "{alias}");
        }
        assert_eq!(Units::parse("klbs", None).unwrap().moments, MomentUnit::PoundForceFoot);
        assert!((convert(1.0, "klbs", "lbf").unwrap() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn force_to_moment_is_rejected() {
        let err = convert(1.0, "N", "Nm").unwrap_err();
        assert!(matches!(err, LoadError::DimensionMismatch { .. }));
    }

    #[test]
    fn companion_moment_units() {
        assert_eq!(
            Units::with_companion(ForceUnit::KiloPoundForce).moments,
            MomentUnit::PoundForceFoot
        );
        assert_eq!(Units::parse("kN", None).unwrap().moments, MomentUnit::KilonewtonMetre);
        assert_eq!(
            Units::parse("kN", Some("Nmm")).unwrap().moments,
            MomentUnit::NewtonMillimetre
        );
    }

    #[test]
    fn units_serialise_as_symbols() {
        let units = Units::new(ForceUnit::PoundForce, MomentUnit::PoundForceFoot);
        let json = serde_json::to_string(&units).unwrap();
        assert_eq!(json, r#"{"forces":"lbf","moments":"lbf-ft"}"#);
        let back: Units = serde_json::from_str(r#"{"forces":"lbf","moments":"ft-lbf"}"#).unwrap();
        assert_eq!(back, units);
    }
}
