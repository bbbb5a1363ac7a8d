use log::debug;
use snafu::prelude::*;

use crate::config::*;
use crate::weights::Weights;

/// z-score for a 95% confidence level.
pub const DEFAULT_CRITICAL_VALUE: f64 = 1.96;

/// Variance inflation due to unequal weights: `N * Σw² / (Σw)²`.
///
/// Equals 1 for uniform weights. Returns NaN for empty or all-zero weights.
pub fn design_effect(weights: &Weights) -> f64 {
    let w = weights.as_slice();
    let n = w.len() as f64;
    let sum: f64 = w.iter().sum();
    let sum_squares: f64 = w.iter().map(|x| x * x).sum();
    (n * sum_squares) / (sum * sum)
}

/// Margin of error of a proportion at maximum variance (p = 0.5), inflated
/// by the design effect of the weights.
pub fn margin_of_error(
    weights: &Weights,
    respondents: usize,
    critical_value: f64,
) -> SurveyResult<f64> {
    ensure!(!weights.is_empty(), MissingWeightsSnafu {});
    ensure!(respondents > 0, NotRecodedSnafu {});
    weights.check_len(respondents)?;

    let n = respondents as f64;
    let deff = design_effect(weights);
    let moe = deff.sqrt() * critical_value * (0.25 / n).sqrt();
    debug!(
        "margin_of_error: n: {} design effect: {:.4} moe: {:.4}",
        respondents, deff, moe
    );
    Ok(moe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_weights_have_no_design_effect() {
        let w = Weights::uniform(4);
        assert_eq!(design_effect(&w), 1.0);
        let moe = margin_of_error(&w, 4, DEFAULT_CRITICAL_VALUE).unwrap();
        assert!((moe - 0.49).abs() < 1e-12);
    }

    #[test]
    fn unequal_weights_inflate_the_margin() {
        let w = Weights::new(vec![2.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0, 1.0, 1.0, 2.0]);
        assert!((design_effect(&w) - 11.0 / 9.0).abs() < 1e-12);
        let moe = margin_of_error(&w, 6, DEFAULT_CRITICAL_VALUE).unwrap();
        assert!((moe - 0.442_308_757_585_735_7).abs() < 1e-12);
    }

    #[test]
    fn preconditions() {
        let err = margin_of_error(&Weights::default(), 4, DEFAULT_CRITICAL_VALUE).unwrap_err();
        assert!(matches!(err, SurveyError::MissingWeights {}));
        assert_eq!(err.kind(), ErrorKind::Precondition);
        let err = margin_of_error(&Weights::uniform(2), 0, DEFAULT_CRITICAL_VALUE).unwrap_err();
        assert!(matches!(err, SurveyError::NotRecoded {}));
        let err = margin_of_error(&Weights::uniform(2), 3, DEFAULT_CRITICAL_VALUE).unwrap_err();
        assert!(matches!(err, SurveyError::WeightCountMismatch { .. }));
    }
}
