//! Pure mathematical functions - no I/O, no async
//! All functions here must be deterministic and side-effect free

use candid::Nat;
use num_bigint::BigUint;
use num_traits::Zero;
use crate::infrastructure::constants::MAX_ONCHAIN_BITS;
use crate::infrastructure::errors::{Result, IntentError, CalculationError};

/// Multiply two Nats and divide by a third with arbitrary precision
/// Formula: floor((a × b) ÷ c)
pub fn multiply_and_divide(a: &Nat, b: &Nat, c: &Nat) -> Result<Nat> {
    if c.0.is_zero() {
        return Err(IntentError::Calculation(CalculationError::DivisionByZero {
            operation: format!("({} × {}) ÷ {}", a.0, b.0, c.0),
        }));
    }

    Ok(Nat::from((&a.0 * &b.0) / &c.0))
}

/// 10^exp as an arbitrary precision integer
pub fn pow10(exp: u32) -> BigUint {
    BigUint::from(10u32).pow(exp)
}

/// Parse a human decimal string into base units at `precision` decimals
///
/// ## Accepted input
/// - Digits with at most one `.` (`"10.5"`, `"10."`, `".5"`, `"007"`)
/// - Surrounding whitespace is ignored
///
/// ## Rejected input
/// - Signs, exponents, separators, empty strings, a lone `"."`
/// - More significant fractional digits than `precision` (never truncated)
/// - Values that do not fit in a uint256
pub fn to_base_units(input: &str, precision: u8) -> Result<Nat> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(IntentError::malformed_amount(input, "amount is empty"));
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(IntentError::malformed_amount(input, "amount has no digits"));
    }

    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IntentError::malformed_amount(
            input,
            "only digits and a single decimal point are allowed",
        ));
    }

    // Zeros past the token's precision carry no value, anything else would be lost
    let significant_fraction = fraction.trim_end_matches('0');
    if significant_fraction.len() > precision as usize {
        return Err(IntentError::malformed_amount(
            input,
            format!(
                "{} fractional digits exceed token precision of {}",
                significant_fraction.len(),
                precision
            ),
        ));
    }

    let mut digits = String::with_capacity(whole.len() + precision as usize);
    digits.push_str(whole);
    digits.push_str(significant_fraction);
    for _ in significant_fraction.len()..precision as usize {
        digits.push('0');
    }

    let magnitude = if digits.is_empty() {
        BigUint::zero()
    } else {
        digits.parse::<BigUint>()
            .map_err(|e| IntentError::malformed_amount(input, e.to_string()))?
    };

    if magnitude.bits() > MAX_ONCHAIN_BITS {
        return Err(IntentError::malformed_amount(input, "amount exceeds uint256 range"));
    }

    Ok(Nat::from(magnitude))
}

/// Render base units as a canonical decimal string
///
/// Exact inverse of `to_base_units`: no rounding, trailing fractional zeros
/// and a dangling decimal point are dropped.
pub fn to_display_string(magnitude: &Nat, precision: u8) -> String {
    let divisor = pow10(precision as u32);
    let whole = &magnitude.0 / &divisor;
    let fraction = &magnitude.0 % &divisor;

    if fraction.is_zero() {
        return whole.to_string();
    }

    let padded = format!("{:0>width$}", fraction.to_string(), width = precision as usize);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}

/// Canonical form of a decimal string accepted by `to_base_units`
///
/// Leading integer zeros and trailing fractional zeros are removed,
/// `".5"` becomes `"0.5"`, `"10."` becomes `"10"`.
pub fn canonicalize(input: &str) -> String {
    let trimmed = input.trim();
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    let whole = whole.trim_start_matches('0');
    let fraction = fraction.trim_end_matches('0');
    let whole = if whole.is_empty() { "0" } else { whole };

    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

// ===== Tests =====

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_multiply_and_divide() {
        let a = Nat::from(100u64);
        let b = Nat::from(200u64);
        let c = Nat::from(50u64);

        let result = multiply_and_divide(&a, &b, &c).unwrap();
        assert_eq!(result, Nat::from(400u64));
    }

    #[test]
    fn test_multiply_and_divide_floors() {
        let result = multiply_and_divide(&Nat::from(999u64), &Nat::from(9_800u64), &Nat::from(10_000u64)).unwrap();
        assert_eq!(result, Nat::from(979u64)); // 979.02 floors
    }

    #[test]
    fn test_division_by_zero() {
        let result = multiply_and_divide(&Nat::from(1u64), &Nat::from(2u64), &Nat::from(0u64));
        assert!(matches!(result, Err(IntentError::Calculation(CalculationError::DivisionByZero { .. }))));
    }

    #[test]
    fn test_to_base_units_scenario_a() {
        // 10.5 USDT at 18 decimals
        let result = to_base_units("10.5", 18).unwrap();
        assert_eq!(result, Nat::from(10_500_000_000_000_000_000u128));
        assert_eq!(to_display_string(&result, 18), "10.5");
    }

    #[test]
    fn test_to_base_units_accepts_loose_forms() {
        assert_eq!(to_base_units(".5", 6).unwrap(), Nat::from(500_000u64));
        assert_eq!(to_base_units("10.", 6).unwrap(), Nat::from(10_000_000u64));
        assert_eq!(to_base_units(" 007 ", 0).unwrap(), Nat::from(7u64));
        assert_eq!(to_base_units("0", 18).unwrap(), Nat::from(0u64));
        // Zeros beyond precision lose nothing
        assert_eq!(to_base_units("1.2300", 2).unwrap(), Nat::from(123u64));
    }

    #[test]
    fn test_to_base_units_rejects_malformed() {
        for bad in ["", ".", "-1", "+1", "1e18", "1,000", "1.2.3", "abc", "0x10", "1 000"] {
            let result = to_base_units(bad, 18);
            assert!(
                matches!(result, Err(IntentError::Validation(crate::infrastructure::ValidationError::MalformedAmount { .. }))),
                "expected MalformedAmount for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_to_base_units_rejects_excess_precision() {
        // 7 significant fractional digits at 6 decimals would silently lose value
        assert!(to_base_units("1.0000001", 6).is_err());
        assert!(to_base_units("0.5", 0).is_err());
    }

    #[test]
    fn test_to_base_units_rejects_uint256_overflow() {
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert!(to_base_units(max, 0).is_ok());
        let over = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert!(to_base_units(over, 0).is_err());
    }

    #[test]
    fn test_to_display_string_small_values() {
        assert_eq!(to_display_string(&Nat::from(1u64), 6), "0.000001");
        assert_eq!(to_display_string(&Nat::from(1_000_000u64), 6), "1");
        assert_eq!(to_display_string(&Nat::from(0u64), 18), "0");
        assert_eq!(to_display_string(&Nat::from(42u64), 0), "42");
    }

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("010.500"), "10.5");
        assert_eq!(canonicalize(".5"), "0.5");
        assert_eq!(canonicalize("10."), "10");
        assert_eq!(canonicalize("000"), "0");
    }

    proptest! {
        #[test]
        fn prop_display_of_parse_is_canonical(
            whole in "[0-9]{1,30}",
            fraction in "[0-9]{0,18}",
            precision in 18u8..=24,
        ) {
            let input = if fraction.is_empty() { whole.clone() } else { format!("{}.{}", whole, fraction) };
            let parsed = to_base_units(&input, precision).unwrap();
            prop_assert_eq!(to_display_string(&parsed, precision), canonicalize(&input));
        }

        #[test]
        fn prop_parse_of_display_is_identity(raw in any::<u128>(), precision in 0u8..=30) {
            let magnitude = Nat::from(raw);
            let shown = to_display_string(&magnitude, precision);
            prop_assert_eq!(to_base_units(&shown, precision).unwrap(), magnitude);
        }
    }
}
