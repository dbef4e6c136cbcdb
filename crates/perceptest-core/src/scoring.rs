//! Per-category accuracy aggregation over a completed session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Category;
use crate::results::ResultRecord;

/// Attempted and correct counts for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub attempted: u32,
    pub correct: u32,
}

impl CategoryTally {
    fn record(&mut self, is_correct: bool) {
        self.attempted = self.attempted.saturating_add(1);
        if is_correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    /// correct / attempted, or exactly 0.0 with no attempts.
    pub fn accuracy(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(self.attempted)
        }
    }
}

/// The categories a single result counts toward.
///
/// Always `overall` and the relational group; plus the subtype when defined.
pub fn categories_for(record: &ResultRecord) -> Vec<Category> {
    let mut categories = vec![Category::Overall, Category::group(record.is_relational())];
    if let Some(subtype) = record.subtype {
        categories.push(Category::from(subtype));
    }
    categories
}

/// Tally every category. All nine categories are present in the output.
pub fn tally_results(results: &[ResultRecord]) -> BTreeMap<Category, CategoryTally> {
    let mut tallies: BTreeMap<Category, CategoryTally> = Category::ALL
        .iter()
        .map(|&c| (c, CategoryTally::default()))
        .collect();

    for record in results {
        for category in categories_for(record) {
            tallies
                .entry(category)
                .or_default()
                .record(record.is_correct);
        }
    }

    tallies
}

/// Accuracy ratio per category, in fixed category order.
pub fn accuracy_by_category(
    tallies: &BTreeMap<Category, CategoryTally>,
) -> BTreeMap<Category, f64> {
    Category::ALL
        .iter()
        .map(|&c| (c, tallies.get(&c).map(CategoryTally::accuracy).unwrap_or(0.0)))
        .collect()
}
