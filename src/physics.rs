//! Breathing-gas mixes and the pressure/depth relation.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::quantity::{Kind, Quantity};

/// Density of water.
pub const WATER_DENSITY: Quantity = Quantity::named(Kind::Density, 1e3);

/// Gravitational acceleration.
pub const GRAVITY: Quantity = Quantity::named(Kind::Acceleration, 9.81);

/// Atmospheric pressure at the surface.
pub const ATMOSPHERIC_PRESSURE: Quantity = Quantity::named(Kind::Pressure, 1013e2);

/// Alveolar water-vapor pressure at body temperature; subtracted from the
/// ambient pressure when deriving inspired partial pressures.
pub const ALVEOLAR_WATER_VAPOR_PRESSURE: Quantity = Quantity::named(Kind::Pressure, 6270.0);

/// A breathing-gas mixture given by its oxygen and helium fractions;
/// the balance is nitrogen.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gas {
    o2: f64,
    he: f64,
}

impl Gas {
    pub const AIR: Gas = Gas { o2: 0.21, he: 0.0 };

    pub fn new(o2: f64, he: f64) -> Result<Self, ComputeError> {
        if !(0.0..=1.0).contains(&o2) || !(0.0..=1.0).contains(&he) || o2 + he > 1.0 {
            return Err(ComputeError::InvalidGasMix { o2, he });
        }
        Ok(Gas { o2, he })
    }

    pub fn air() -> Self {
        Gas::AIR
    }

    pub fn o2(&self) -> f64 {
        self.o2
    }

    pub fn he(&self) -> f64 {
        self.he
    }

    pub fn n2(&self) -> f64 {
        1.0 - self.o2 - self.he
    }

    pub fn ppo2(&self, ambient_pressure: Quantity) -> Quantity {
        ambient_pressure * self.o2
    }

    pub fn ppn2(&self, ambient_pressure: Quantity) -> Quantity {
        ambient_pressure * self.n2()
    }

    pub fn pphe(&self, ambient_pressure: Quantity) -> Quantity {
        ambient_pressure * self.he
    }

    /// Equivalent air depth: the depth at which air would carry the same
    /// nitrogen partial pressure as this mix does at `depth`.
    pub fn ead(&self, depth: Quantity) -> Result<Quantity, ComputeError> {
        depth_from_pressure(pressure_from_depth(depth)? * (self.n2() / Gas::AIR.n2()))
    }
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.he == 0.0 {
            if (self.o2 - Gas::AIR.o2).abs() < f64::EPSILON {
                write!(f, "AIR")
            } else {
                write!(f, "EAN{}", (100.0 * self.o2).round() as i64)
            }
        } else {
            write!(
                f,
                "TM{}/{}",
                (100.0 * self.o2).round() as i64,
                (100.0 * self.he).round() as i64
            )
        }
    }
}

/// Ambient pressure at `depth`: atmospheric plus the water column.
///
/// The addition is unit-checked, so anything but a depth is rejected by the
/// quantity algebra itself.
pub fn pressure_from_depth(depth: Quantity) -> Result<Quantity, ComputeError> {
    ATMOSPHERIC_PRESSURE.try_add(depth * (WATER_DENSITY * GRAVITY))
}

/// Depth of the water column exerting `pressure` above atmospheric.
pub fn depth_from_pressure(pressure: Quantity) -> Result<Quantity, ComputeError> {
    Ok(pressure.try_sub(ATMOSPHERIC_PRESSURE)? / (WATER_DENSITY * GRAVITY))
}
