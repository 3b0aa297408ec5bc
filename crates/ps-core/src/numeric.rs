use crate::PsError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, PsError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(PsError::NonFinite { what, value: v })
    }
}

/// Finite and >= 0, as required for populations, counts and network weights.
pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, PsError> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(PsError::Negative { what, value: v });
    }
    Ok(v)
}

/// Floor a value at zero. NaN passes through unchanged so that callers can
/// still detect it with [`ensure_finite`].
pub fn floor_at_zero(v: Real) -> Real {
    if v < 0.0 { 0.0 } else { v }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_non_negative_rejects_negative() {
        assert_eq!(ensure_non_negative(2.5, "weight"), Ok(2.5));
        assert!(matches!(
            ensure_non_negative(-0.1, "weight"),
            Err(PsError::Negative { .. })
        ));
        assert!(matches!(
            ensure_non_negative(Real::INFINITY, "weight"),
            Err(PsError::NonFinite { .. })
        ));
    }

    #[test]
    fn floor_at_zero_keeps_nan() {
        assert_eq!(floor_at_zero(-3.0), 0.0);
        assert_eq!(floor_at_zero(4.0), 4.0);
        assert!(floor_at_zero(Real::NAN).is_nan());
    }

    proptest! {
        #[test]
        fn nearly_equal_is_symmetric(a in -1e9f64..1e9, b in -1e9f64..1e9) {
            let tol = Tolerances::default();
            prop_assert!(nearly_equal(a, a, tol));
            prop_assert_eq!(nearly_equal(a, b, tol), nearly_equal(b, a, tol));
        }

        #[test]
        fn floored_values_are_non_negative(v in -1e9f64..1e9) {
            let floored = floor_at_zero(v);
            prop_assert!(floored >= 0.0);
            prop_assert_eq!(floored, v.max(0.0));
            prop_assert!(ensure_non_negative(floored, "value").is_ok());
        }
    }
}
