use std::fmt;
use ordered_float::OrderedFloat;

use crate::descriptor::PrimitiveKind;

const FLOAT16_MAX: f64 = 65504.0;

/// One end of a value range, keeping the integer/float distinction so that
/// `uint64` and `int64` extremes survive serialization exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(untagged)]
pub enum Limit {
    Signed(i64),
    Unsigned(u64),
    Float(OrderedFloat<f64>),
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Signed(x) => write!(f, "{x}"),
            Limit::Unsigned(x) => write!(f, "{x}"),
            Limit::Float(x) => write!(f, "{}", x.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Range {
    Unsigned { min: u64, max: u64 },
    Signed { min: i64, max: i64 },
    Float { min: OrderedFloat<f64>, max: OrderedFloat<f64> },
}

impl Range {
    /// `[0, 2^bits - 1]`, `bits` in 1..=64.
    pub fn unsigned(bits: u32) -> Self {
        Range::Unsigned { min: 0, max: u64::MAX >> (64 - bits) }
    }

    /// `[-2^(bits-1), 2^(bits-1) - 1]`, `bits` in 1..=64.
    pub fn signed(bits: u32) -> Self {
        let shift = 64 - bits;
        Range::Signed { min: i64::MIN >> shift, max: i64::MAX >> shift }
    }

    /// Finite IEEE-754 range of a binary16/32/64 float.
    pub fn float(bits: u32) -> Option<Self> {
        let max = match bits {
            16 => FLOAT16_MAX,
            32 => f32::MAX as f64,
            64 => f64::MAX,
            _ => return None,
        };
        Some(Range::Float { min: OrderedFloat(-max), max: OrderedFloat(max) })
    }

    /// Bounds for a validated kind/width pair; `bool` has none.
    pub fn for_kind(kind: PrimitiveKind, bits: u32) -> Option<Self> {
        match kind {
            PrimitiveKind::Bool => None,
            PrimitiveKind::Uint => Some(Range::unsigned(bits)),
            PrimitiveKind::Int => Some(Range::signed(bits)),
            PrimitiveKind::Float => Range::float(bits),
        }
    }

    pub fn min(&self) -> Limit {
        match *self {
            Range::Unsigned { min, .. } => Limit::Unsigned(min),
            Range::Signed { min, .. } => Limit::Signed(min),
            Range::Float { min, .. } => Limit::Float(min),
        }
    }

    pub fn max(&self) -> Limit {
        match *self {
            Range::Unsigned { max, .. } => Limit::Unsigned(max),
            Range::Signed { max, .. } => Limit::Signed(max),
            Range::Float { max, .. } => Limit::Float(max),
        }
    }

    pub fn is_consistent(&self) -> bool {
        match *self {
            Range::Unsigned { min, max } => min <= max,
            Range::Signed { min, max } => min <= max,
            Range::Float { min, max } => min <= max,
        }
    }

    /// Integer bounds widened to `i128` so both signed and unsigned ranges compare.
    pub fn integer_bounds(&self) -> Option<(i128, i128)> {
        match *self {
            Range::Unsigned { min, max } => Some((min as i128, max as i128)),
            Range::Signed { min, max } => Some((min as i128, max as i128)),
            Range::Float { .. } => None,
        }
    }

    pub fn float_bounds(&self) -> (f64, f64) {
        match *self {
            Range::Unsigned { min, max } => (min as f64, max as f64),
            Range::Signed { min, max } => (min as f64, max as f64),
            Range::Float { min, max } => (min.0, max.0),
        }
    }

    /// Intersect with caller-supplied limits, e.g. a register's `min`/`max`.
    /// Limits of the wrong numeric kind are ignored; limits outside the type's
    /// range are pulled back into it. Returns `None` if the result is empty.
    pub fn narrow(&self, lo: Option<Limit>, hi: Option<Limit>) -> Option<Range> {
        let narrowed = match *self {
            Range::Unsigned { min, max } => Range::Unsigned {
                min: lo.and_then(Limit::as_u64).map_or(min, |v| v.clamp(min, max)),
                max: hi.and_then(Limit::as_u64).map_or(max, |v| v.clamp(min, max)),
            },
            Range::Signed { min, max } => Range::Signed {
                min: lo.and_then(Limit::as_i64).map_or(min, |v| v.clamp(min, max)),
                max: hi.and_then(Limit::as_i64).map_or(max, |v| v.clamp(min, max)),
            },
            Range::Float { min, max } => Range::Float {
                min: lo.map_or(min, |v| OrderedFloat(v.as_f64()).clamp(min, max)),
                max: hi.map_or(max, |v| OrderedFloat(v.as_f64()).clamp(min, max)),
            },
        };
        narrowed.is_consistent().then_some(narrowed)
    }
}

impl Limit {
    pub fn as_u64(self) -> Option<u64> {
        match self {
            Limit::Unsigned(x) => Some(x),
            Limit::Signed(x) => u64::try_from(x).ok(),
            Limit::Float(_) => None,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Limit::Signed(x) => Some(x),
            Limit::Unsigned(x) => i64::try_from(x).ok(),
            Limit::Float(_) => None,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Limit::Signed(x) => x as f64,
            Limit::Unsigned(x) => x as f64,
            Limit::Float(x) => x.0,
        }
    }

    /// Read a JSON number, keeping integers integral.
    pub fn from_json(value: &serde_json::Value) -> Option<Limit> {
        let n = value.as_number()?;
        if let Some(u) = n.as_u64() {
            Some(Limit::Unsigned(u))
        } else if let Some(i) = n.as_i64() {
            Some(Limit::Signed(i))
        } else {
            n.as_f64().filter(|f| f.is_finite()).map(|f| Limit::Float(OrderedFloat(f)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_widths() {
        assert_eq!(Range::unsigned(1).max(), Limit::Unsigned(1));
        assert_eq!(Range::unsigned(4).max(), Limit::Unsigned(15));
        assert_eq!(Range::unsigned(8).max(), Limit::Unsigned(255));
        assert_eq!(Range::unsigned(64).max(), Limit::Unsigned(u64::MAX));
    }

    #[test]
    fn signed_widths() {
        let r = Range::signed(16);
        assert_eq!(r.min(), Limit::Signed(-32768));
        assert_eq!(r.max(), Limit::Signed(32767));
        let r = Range::signed(1);
        assert_eq!((r.min(), r.max()), (Limit::Signed(-1), Limit::Signed(0)));
        let r = Range::signed(64);
        assert_eq!((r.min(), r.max()), (Limit::Signed(i64::MIN), Limit::Signed(i64::MAX)));
    }

    #[test]
    fn float_widths() {
        assert_eq!(Range::float(16).unwrap().max(), Limit::Float(OrderedFloat(65504.0)));
        assert_eq!(Range::float(32).unwrap().min(), Limit::Float(OrderedFloat(-(f32::MAX as f64))));
        assert!(Range::float(24).is_none());
    }

    #[test]
    fn every_supported_width_is_consistent() {
        for bits in 1..=64 {
            assert!(Range::unsigned(bits).is_consistent());
            assert!(Range::signed(bits).is_consistent());
        }
        for bits in [16, 32, 64] {
            assert!(Range::float(bits).unwrap().is_consistent());
        }
    }

    #[test]
    fn narrow_to_register_limits() {
        let r = Range::unsigned(16).narrow(Some(Limit::Unsigned(10)), Some(Limit::Unsigned(10000)));
        assert_eq!(r, Some(Range::Unsigned { min: 10, max: 10000 }));
        let r = Range::signed(8).narrow(Some(Limit::Signed(-1000)), None).unwrap();
        assert_eq!((r.min(), r.max()), (Limit::Signed(-128), Limit::Signed(127)));
        let r = Range::float(32).unwrap().narrow(Some(Limit::Float(OrderedFloat(1.0))), Some(Limit::Unsigned(4000))).unwrap();
        assert_eq!(r.float_bounds(), (1.0, 4000.0));
        // fractional limits do not apply to integer ranges
        let r = Range::unsigned(8).narrow(Some(Limit::Float(OrderedFloat(0.5))), None).unwrap();
        assert_eq!(r.min(), Limit::Unsigned(0));
        assert_eq!(Range::unsigned(8).narrow(Some(Limit::Unsigned(9)), Some(Limit::Unsigned(3))), None);
    }

    #[test]
    fn limits_from_json() {
        assert_eq!(Limit::from_json(&serde_json::json!(5)), Some(Limit::Unsigned(5)));
        assert_eq!(Limit::from_json(&serde_json::json!(-5)), Some(Limit::Signed(-5)));
        assert_eq!(Limit::from_json(&serde_json::json!(1.5)), Some(Limit::Float(OrderedFloat(1.5))));
        assert_eq!(Limit::from_json(&serde_json::json!("5")), None);
    }

    #[test]
    fn limits_serialize_as_plain_numbers() {
        let r = Range::unsigned(64);
        assert_eq!(serde_json::to_string(&r.max()).unwrap(), u64::MAX.to_string());
        assert_eq!(serde_json::to_string(&Range::signed(8).min()).unwrap(), "-128");
    }
}
