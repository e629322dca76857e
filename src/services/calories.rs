use crate::error::{AppError, AppResult};
use crate::i18n;

/// Calories for `amount_grams` of a food with the given density,
/// rounded to one decimal place.
pub fn compute(calories_per_100g: f64, amount_grams: f64) -> AppResult<f64> {
    check_non_negative("calories_per_100g", calories_per_100g)?;
    check_non_negative("amount_grams", amount_grams)?;

    Ok((calories_per_100g * amount_grams / 100.0 * 10.0).round() / 10.0)
}

pub fn check_non_negative(field: &str, value: f64) -> AppResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AppError::Validation(i18n::t_with(
            "validation.non_negative",
            &[("field", field)],
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values() {
        assert_eq!(compute(389.0, 100.0).unwrap(), 389.0);
        assert_eq!(compute(250.0, 30.0).unwrap(), 75.0);
        assert_eq!(compute(0.0, 500.0).unwrap(), 0.0);
        assert_eq!(compute(123.0, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(compute(333.0, 33.0).unwrap(), 109.9);
        assert_eq!(compute(100.0, 12.345).unwrap(), 12.3);
        assert_eq!(compute(100.0, 12.36).unwrap(), 12.4);
    }

    #[test]
    fn matches_formula_over_a_grid() {
        for c in [0.0, 1.5, 97.3, 250.0, 389.0, 612.25] {
            for g in [0.0, 0.4, 7.0, 55.5, 100.0, 1234.0] {
                let expected = (c * g / 100.0 * 10.0_f64).round() / 10.0;
                assert_eq!(compute(c, g).unwrap(), expected);
            }
        }
    }

    #[test]
    fn rejects_negative_and_non_finite_inputs() {
        assert!(matches!(compute(-1.0, 10.0), Err(AppError::Validation(_))));
        assert!(matches!(compute(10.0, -0.5), Err(AppError::Validation(_))));
        assert!(compute(f64::NAN, 10.0).is_err());
        assert!(compute(10.0, f64::INFINITY).is_err());
    }
}
