//! Unit-checked physical quantities.
//!
//! A [`Unit`] is a vector of integer exponents over the base dimensions
//! {length, mass, time}. A [`Quantity`] is a scalar tagged with a unit.
//! Addition, subtraction and comparison are only defined between quantities
//! of the same unit and fail otherwise; multiplication and division always
//! succeed and re-dispatch the resulting dimension vector through a static
//! registry of named kinds, so e.g. a flow rate times a time comes back as a
//! volume without any hand-written derived-unit code.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Div, Mul, Neg};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ComputeError;

/// Relative tolerance for quantity comparison. Comparison is never bit-exact.
pub const REL_TOLERANCE: f64 = 1e-9;

fn values_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= REL_TOLERANCE * a.abs().max(b.abs())
}

// ============================================================================
// Unit
// ============================================================================

/// Dimension vector over the base dimensions {length, mass, time}.
///
/// Equality is component-wise. Inversion negates every exponent,
/// multiplication adds exponents, division multiplies by the inverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Unit {
    pub length: i8,
    pub mass: i8,
    pub time: i8,
}

impl Unit {
    /// The zero vector: a dimensionless value.
    pub const SCALAR: Unit = Unit::new(0, 0, 0);

    pub const fn new(length: i8, mass: i8, time: i8) -> Self {
        Unit { length, mass, time }
    }

    pub const fn is_scalar(self) -> bool {
        self.length == 0 && self.mass == 0 && self.time == 0
    }

    pub const fn inverse(self) -> Self {
        Unit::new(-self.length, -self.mass, -self.time)
    }

    pub const fn compose(self, other: Self) -> Self {
        Unit::new(
            self.length + other.length,
            self.mass + other.mass,
            self.time + other.time,
        )
    }
}

impl Mul for Unit {
    type Output = Unit;

    fn mul(self, other: Unit) -> Unit {
        self.compose(other)
    }
}

impl Div for Unit {
    type Output = Unit;

    fn div(self, other: Unit) -> Unit {
        self.compose(other.inverse())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_scalar() {
            return write!(f, "dimensionless");
        }
        let mut first = true;
        for (symbol, power) in [("m", self.length), ("kg", self.mass), ("s", self.time)] {
            if power == 0 {
                continue;
            }
            if !first {
                write!(f, "*")?;
            }
            if power == 1 {
                write!(f, "{symbol}")?;
            } else {
                write!(f, "{symbol}^{power}")?;
            }
            first = false;
        }
        Ok(())
    }
}

// ============================================================================
// Named kinds
// ============================================================================

/// The named quantity kinds the crate works with.
///
/// Each kind owns one exact dimension vector; [`Kind::for_unit`] is the
/// registry that maps an arithmetic result back to its kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Kind {
    Time,
    Depth,
    Volume,
    /// Volumetric flow rate; the unit of a surface consumption (SAC) rate.
    FlowRate,
    Pressure,
    Density,
    Acceleration,
}

impl Kind {
    pub const ALL: [Kind; 7] = [
        Kind::Time,
        Kind::Depth,
        Kind::Volume,
        Kind::FlowRate,
        Kind::Pressure,
        Kind::Density,
        Kind::Acceleration,
    ];

    pub const fn unit(self) -> Unit {
        match self {
            Kind::Time => Unit::new(0, 0, 1),
            Kind::Depth => Unit::new(1, 0, 0),
            Kind::Volume => Unit::new(3, 0, 0),
            Kind::FlowRate => Unit::new(3, 0, -1),
            Kind::Pressure => Unit::new(-1, 1, -2),
            Kind::Density => Unit::new(-3, 1, 0),
            Kind::Acceleration => Unit::new(1, 0, -2),
        }
    }

    /// Exact-match registry from dimension vector to named kind.
    pub fn for_unit(unit: Unit) -> Option<Kind> {
        Kind::ALL.into_iter().find(|kind| kind.unit() == unit)
    }

    /// Presentation symbol, paired with [`Kind::display_scale`].
    fn symbol(self) -> &'static str {
        match self {
            Kind::Time => "s",
            Kind::Depth => "m",
            Kind::Volume => "l",
            Kind::FlowRate => "l/min",
            Kind::Pressure => "bar",
            Kind::Density => "kg/m³",
            Kind::Acceleration => "m/s²",
        }
    }

    /// Factor from the SI base value to the presentation unit.
    fn display_scale(self) -> f64 {
        match self {
            Kind::Time => 1.0,
            Kind::Depth => 1.0,
            Kind::Volume => 1e3,
            Kind::FlowRate => 60e3,
            Kind::Pressure => 1e-5,
            Kind::Density => 1.0,
            Kind::Acceleration => 1.0,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Time => "time",
            Kind::Depth => "depth",
            Kind::Volume => "volume",
            Kind::FlowRate => "flow rate",
            Kind::Pressure => "pressure",
            Kind::Density => "density",
            Kind::Acceleration => "acceleration",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Quantity
// ============================================================================

/// A scalar tagged with a unit, in SI base values.
///
/// `Named` carries a registered kind; `Raw` carries any other dimension
/// vector (including the zero vector, a bare scalar) and still supports all
/// quantity operations, rendering its unit symbolically.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Quantity {
    Named { kind: Kind, value: f64 },
    Raw { unit: Unit, value: f64 },
}

impl Quantity {
    pub const fn named(kind: Kind, value: f64) -> Self {
        Quantity::Named { kind, value }
    }

    /// Tag `value` with `unit`, dispatching through the kind registry.
    pub fn of(value: f64, unit: Unit) -> Self {
        match Kind::for_unit(unit) {
            Some(kind) => Quantity::Named { kind, value },
            None => Quantity::Raw { unit, value },
        }
    }

    pub fn seconds(value: f64) -> Self {
        Quantity::named(Kind::Time, value)
    }

    pub fn minutes(value: f64) -> Self {
        Quantity::named(Kind::Time, value * 60.0)
    }

    pub fn metres(value: f64) -> Self {
        Quantity::named(Kind::Depth, value)
    }

    pub fn cubic_metres(value: f64) -> Self {
        Quantity::named(Kind::Volume, value)
    }

    pub fn litres(value: f64) -> Self {
        Quantity::named(Kind::Volume, value * 1e-3)
    }

    pub fn litres_per_minute(value: f64) -> Self {
        Quantity::named(Kind::FlowRate, value / 60e3)
    }

    pub fn pascals(value: f64) -> Self {
        Quantity::named(Kind::Pressure, value)
    }

    pub fn bar(value: f64) -> Self {
        Quantity::named(Kind::Pressure, value * 1e5)
    }

    /// The value in SI base units.
    pub fn value(self) -> f64 {
        match self {
            Quantity::Named { value, .. } | Quantity::Raw { value, .. } => value,
        }
    }

    pub fn unit(self) -> Unit {
        match self {
            Quantity::Named { kind, .. } => kind.unit(),
            Quantity::Raw { unit, .. } => unit,
        }
    }

    pub fn kind(self) -> Option<Kind> {
        match self {
            Quantity::Named { kind, .. } => Some(kind),
            Quantity::Raw { .. } => None,
        }
    }

    pub fn is_scalar(self) -> bool {
        self.unit().is_scalar()
    }

    /// The bare value, if this quantity is dimensionless.
    pub fn as_scalar(self) -> Option<f64> {
        self.is_scalar().then(|| self.value())
    }

    /// Pass the quantity through unchanged if it has the expected kind.
    pub fn expect_kind(self, expected: Kind) -> Result<Quantity, ComputeError> {
        if self.kind() == Some(expected) {
            Ok(self)
        } else {
            Err(ComputeError::KindMismatch {
                expected,
                found: self.unit(),
            })
        }
    }

    fn check_same_unit(self, other: Quantity) -> Result<(), ComputeError> {
        if self.unit() == other.unit() {
            Ok(())
        } else {
            Err(ComputeError::UnitMismatch {
                left: self.unit(),
                right: other.unit(),
            })
        }
    }

    pub fn try_add(self, other: Quantity) -> Result<Quantity, ComputeError> {
        self.check_same_unit(other)?;
        Ok(Quantity::of(self.value() + other.value(), self.unit()))
    }

    pub fn try_sub(self, other: Quantity) -> Result<Quantity, ComputeError> {
        self.try_add(-other)
    }

    /// Tolerance-based equality; fails across different units.
    pub fn approx_eq(self, other: Quantity) -> Result<bool, ComputeError> {
        self.check_same_unit(other)?;
        Ok(values_close(self.value(), other.value()))
    }

    /// Tolerance-based ordering; values within tolerance compare equal.
    pub fn try_cmp(self, other: Quantity) -> Result<Ordering, ComputeError> {
        if self.approx_eq(other)? {
            Ok(Ordering::Equal)
        } else if self.value() < other.value() {
            Ok(Ordering::Less)
        } else {
            Ok(Ordering::Greater)
        }
    }

    /// Divide by `other` and require the result to be dimensionless.
    pub fn try_ratio(self, other: Quantity) -> Result<f64, ComputeError> {
        (self / other)
            .as_scalar()
            .ok_or(ComputeError::UnitMismatch {
                left: self.unit(),
                right: other.unit(),
            })
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        Quantity::of(-self.value(), self.unit())
    }
}

impl Mul for Quantity {
    type Output = Quantity;

    fn mul(self, other: Quantity) -> Quantity {
        Quantity::of(self.value() * other.value(), self.unit() * other.unit())
    }
}

impl Div for Quantity {
    type Output = Quantity;

    fn div(self, other: Quantity) -> Quantity {
        Quantity::of(self.value() / other.value(), self.unit() / other.unit())
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(self, factor: f64) -> Quantity {
        Quantity::of(self.value() * factor, self.unit())
    }
}

impl Mul<Quantity> for f64 {
    type Output = Quantity;

    fn mul(self, quantity: Quantity) -> Quantity {
        quantity * self
    }
}

impl Div<f64> for Quantity {
    type Output = Quantity;

    fn div(self, divisor: f64) -> Quantity {
        Quantity::of(self.value() / divisor, self.unit())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(Kind::Time) => {
                let total = self.value().round() as i64;
                if total < 0 {
                    return write!(f, "-{}", Quantity::seconds(-self.value()));
                }
                let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);
                write!(f, "{hours}:{minutes:02}:{seconds:02}")
            }
            Some(kind) => {
                let scaled = (self.value() * kind.display_scale()).round() as i64;
                write!(f, "{scaled}{}", kind.symbol())
            }
            None if self.is_scalar() => write!(f, "{}", self.value()),
            None => write!(f, "{}{}", self.value(), self.unit()),
        }
    }
}
