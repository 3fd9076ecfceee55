//! Aggregates over a filtered view.
//!
//! Every function here is pure: it reads the view, produces a value, and
//! touches nothing else. All aggregates degrade gracefully on an empty view
//! (sums become zero, the mean becomes `None`, groupings become empty).

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::dashboard::dataset::Dataset;
use crate::dashboard::filter::FilteredView;
use crate::dashboard::MonthKey;
use crate::helpers::simd_helpers::sum_f64;

/// How many categories the "top sellers" panel shows.
pub const TOP_CATEGORY_COUNT: usize = 10;

/// Sum of price over the view.
pub fn total_sales(view: &FilteredView<'_>) -> f64 {
    let prices = view.dataset().prices();
    let values: Vec<f64> = view.rows().iter().map(|&i| prices[i]).collect();
    sum_f64(&values)
}

/// Count of distinct order identifiers in the view.
pub fn total_orders(view: &FilteredView<'_>) -> usize {
    let dataset = view.dataset();
    let ids: HashSet<&str> = view.rows().iter().map(|&i| dataset.order_id(i)).collect();
    ids.len()
}

/// Count of distinct seller identifiers in the view.
///
/// The original surface labeled this "total customers" while counting
/// sellers; the computation is kept, the label is not.
pub fn total_sellers(view: &FilteredView<'_>) -> usize {
    let dataset = view.dataset();
    let ids: HashSet<&str> = view.rows().iter().map(|&i| dataset.seller_id(i)).collect();
    ids.len()
}

/// Price summed per calendar month of the shipping-limit date, in
/// chronological order. Rows with a missing shipping date belong to no month.
pub fn monthly_sales_trend(view: &FilteredView<'_>) -> Vec<(MonthKey, f64)> {
    let dataset = view.dataset();
    let dates = dataset.shipping_limit_dates();
    let prices = dataset.prices();

    let mut months: BTreeMap<MonthKey, f64> = BTreeMap::new();
    for &i in view.rows() {
        if let Some(dt) = &dates[i] {
            *months.entry(MonthKey::from_datetime(dt)).or_insert(0.0) += prices[i];
        }
    }

    months.into_iter().collect()
}

/// The `n` categories with the largest summed price, descending.
/// Ties keep first-appearance order.
pub fn top_categories_by_sales(view: &FilteredView<'_>, n: usize) -> Vec<(String, f64)> {
    let mut totals = grouped(view, Dataset::category, |prices, i| prices[i]);
    // stable sort keeps first-seen order within equal sums
    totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    totals.truncate(n);
    totals
}

/// Row count per payment type, descending by count.
/// Ties keep first-appearance order.
pub fn payment_type_distribution(view: &FilteredView<'_>) -> Vec<(String, u64)> {
    let mut counts = grouped(view, Dataset::payment_type, |_, _| 1.0);
    counts.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    counts.into_iter().map(|(k, v)| (k, v as u64)).collect()
}

/// Arithmetic mean of the review score; `None` on an empty view.
pub fn average_review_score(view: &FilteredView<'_>) -> Option<f64> {
    if view.is_empty() {
        return None;
    }
    let scores = view.dataset().review_scores();
    let sum: i64 = view.rows().iter().map(|&i| scores[i]).sum();
    Some(sum as f64 / view.len() as f64)
}

/// Row count per discrete review score, ascending by score.
pub fn review_score_distribution(view: &FilteredView<'_>) -> Vec<(i64, u64)> {
    let scores = view.dataset().review_scores();
    let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
    for &i in view.rows() {
        *counts.entry(scores[i]).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}

/// Group rows by a string key and sum a per-row measure, keeping groups in
/// first-appearance order.
fn grouped<M>(
    view: &FilteredView<'_>,
    key: fn(&Dataset, usize) -> &str,
    measure: M,
) -> Vec<(String, f64)>
where
    M: Fn(&[f64], usize) -> f64,
{
    let dataset = view.dataset();
    let prices = dataset.prices();

    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, f64)> = Vec::new();

    for &i in view.rows() {
        let k = key(dataset, i);
        let v = measure(prices, i);
        match positions.get(k) {
            Some(&pos) => groups[pos].1 += v,
            None => {
                positions.insert(k, groups.len());
                groups.push((k.to_string(), v));
            }
        }
    }

    groups
}

/// Everything the dashboard panel renders, computed in one pass over the
/// current view.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardMetrics {
    pub total_sales: f64,
    pub total_orders: usize,
    pub total_sellers: usize,
    pub monthly_trend: Vec<(MonthKey, f64)>,
    pub top_categories: Vec<(String, f64)>,
    pub payment_distribution: Vec<(String, u64)>,
    pub average_review_score: Option<f64>,
    pub review_score_distribution: Vec<(i64, u64)>,
}

impl DashboardMetrics {
    pub fn compute(view: &FilteredView<'_>) -> Self {
        DashboardMetrics {
            total_sales: total_sales(view),
            total_orders: total_orders(view),
            total_sellers: total_sellers(view),
            monthly_trend: monthly_sales_trend(view),
            top_categories: top_categories_by_sales(view, TOP_CATEGORY_COUNT),
            payment_distribution: payment_type_distribution(view),
            average_review_score: average_review_score(view),
            review_score_distribution: review_score_distribution(view),
        }
    }
}
