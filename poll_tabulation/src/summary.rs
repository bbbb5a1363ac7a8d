use std::cmp::Ordering;

use crate::config::*;
use crate::crosstab::{round2, weighted_distribution, weighted_shares};
use crate::question::RecodedQuestion;
use crate::weights::Weights;

/// The bar heights of one question chart, in percent.
#[derive(PartialEq, Debug, Clone)]
pub struct ResponseDistribution {
    pub question: String,
    pub weighted: bool,
    /// (category, percent), largest first.
    pub entries: Vec<(String, f64)>,
}

impl ResponseDistribution {
    pub fn get(&self, category: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, p)| *p)
    }
}

/// Distribution of the answers to one question.
///
/// Categorical questions report the share of each answer; multi-select
/// questions the share of respondents selecting each category (these do not
/// sum to 100). Without weights every respondent counts once.
pub fn summarize(
    question: &RecodedQuestion,
    weights: Option<&Weights>,
) -> SurveyResult<ResponseDistribution> {
    let n = question.num_respondents();
    let uniform;
    let w = match weights {
        Some(w) => {
            w.check_len(n)?;
            w
        }
        None => {
            uniform = Weights::uniform(n);
            &uniform
        }
    };

    let (categories, shares) = match question {
        RecodedQuestion::Categorical(c) => {
            let categories = c.categories();
            let shares = weighted_distribution(&c.values, &categories, w.as_slice(), |_| true);
            (categories, shares)
        }
        RecodedQuestion::MultiSelect(m) => {
            let categories: Vec<String> = m.indicators.iter().map(|i| i.category.clone()).collect();
            let shares = weighted_shares(&m.indicators, w.as_slice(), |_| true);
            (categories, shares)
        }
    };

    let mut entries: Vec<(String, f64)> = categories
        .into_iter()
        .zip(shares)
        .map(|(c, s)| (c, round2(100.0 * s)))
        .collect();
    entries.sort_by(|(c1, p1), (c2, p2)| {
        p2.partial_cmp(p1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| c1.cmp(c2))
    });

    Ok(ResponseDistribution {
        question: question.name().to_string(),
        weighted: weights.is_some(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;
    use crate::question::*;

    fn recode<R: Recoder>(r: R, name: &str, values: &[&str]) -> RecodedQuestion {
        let col = Column::new(name, values.iter().map(|s| CellValue::from(*s)).collect());
        r.recode(&col, None).unwrap()
    }

    #[test]
    fn categorical_unweighted() {
        let q = recode(CategoricalQuestion, "Hall", &["Ratty", "Ratty", "Andrews", "Jo's"]);
        let d = summarize(&q, None).unwrap();
        assert!(!d.weighted);
        assert_eq!(
            d.entries,
            vec![
                ("Ratty".to_string(), 50.0),
                ("Andrews".to_string(), 25.0),
                ("Jo's".to_string(), 25.0)
            ]
        );
    }

    #[test]
    fn categorical_weighted() {
        let q = recode(CategoricalQuestion, "Hall", &["Ratty", "Andrews", "Andrews"]);
        let w = Weights::new(vec![2.0, 0.5, 0.5]);
        let d = summarize(&q, Some(&w)).unwrap();
        assert_eq!(d.get("Ratty"), Some(66.67));
        assert_eq!(d.get("Andrews"), Some(33.33));
        assert_eq!(d.entries[0].0, "Ratty");
    }

    #[test]
    fn multi_select_shares() {
        let q = recode(MultiSelectQuestion::default(), "Sports", &["Tennis;Golf", "Tennis", ""]);
        let d = summarize(&q, None).unwrap();
        assert_eq!(d.get("Tennis"), Some(66.67));
        assert_eq!(d.get("Golf"), Some(33.33));

        let w = Weights::new(vec![1.0, 2.0, 1.0]);
        let d = summarize(&q, Some(&w)).unwrap();
        assert_eq!(d.get("Tennis"), Some(75.0));
        assert_eq!(d.get("Golf"), Some(25.0));
    }

    #[test]
    fn weights_must_align() {
        let q = recode(CategoricalQuestion, "Hall", &["Ratty"]);
        assert!(summarize(&q, Some(&Weights::uniform(2))).is_err());
    }
}
