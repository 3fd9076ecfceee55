use lru::LruCache;
use std::cell::RefCell;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use tracing::debug;

use crate::dashboard::dataset::Dataset;
use crate::dashboard::FilterParams;
use crate::helpers::simd_helpers::{filter_between_f64, filter_ge_i64};

/// A row subset of the dataset: the projection satisfying every active
/// filter predicate. Never a copy of the underlying table.
#[derive(Debug)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    rows: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Ascending row indices into the dataset.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Applies the conjunction of all filter dimensions and returns the
/// resulting view.
///
/// Category and payment multiselects are skipped entirely when empty; the
/// score and price predicates always apply. Each dimension produces an
/// ascending index vector and the vectors are intersected.
pub fn filter<'a>(dataset: &'a Dataset, params: &FilterParams) -> FilteredView<'a> {
    let mut matched: Option<Vec<usize>> = None;

    if !params.categories.is_empty() {
        let rows = filter_by_value(dataset, &params.categories, Dataset::category);
        matched = Some(intersect(matched, rows));
    }

    if !params.payment_types.is_empty() {
        let rows = filter_by_value(dataset, &params.payment_types, Dataset::payment_type);
        matched = Some(intersect(matched, rows));
    }

    let rows = filter_ge_i64(dataset.review_scores(), params.min_review_score);
    matched = Some(intersect(matched, rows));

    let (lo, hi) = params.price_range;
    let rows = filter_between_f64(dataset.prices(), lo, hi);
    let rows = intersect(matched, rows);

    debug!(rows_matched = rows.len(), "filters applied");
    FilteredView { dataset, rows }
}

/// Matches rows whose string value for one dimension is in the selection.
fn filter_by_value(
    dataset: &Dataset,
    selection: &[String],
    value: fn(&Dataset, usize) -> &str,
) -> Vec<usize> {
    let wanted: HashSet<&str> = selection.iter().map(String::as_str).collect();
    (0..dataset.row_count())
        .filter(|&i| wanted.contains(value(dataset, i)))
        .collect()
}

fn intersect(acc: Option<Vec<usize>>, next: Vec<usize>) -> Vec<usize> {
    match acc {
        None => next,
        Some(existing) => intersect_sorted_vecs(existing, next),
    }
}

/// Intersection of two ascending index vectors.
fn intersect_sorted_vecs(a: Vec<usize>, b: Vec<usize>) -> Vec<usize> {
    let mut result = Vec::with_capacity(a.len().min(b.len()));
    let mut i = 0;
    let mut j = 0;

    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => {
                result.push(a[i]);
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }

    result
}

/// LRU cache over filter results, keyed by the full parameter set.
///
/// Re-running the dashboard with unchanged parameters is the common case in
/// an interactive session, so the row scan is worth remembering.
#[derive(Debug)]
pub struct FilterCache {
    cache: RefCell<LruCache<FilterParams, Vec<usize>>>,
}

impl FilterCache {
    pub fn new() -> Self {
        Self {
            cache: RefCell::new(LruCache::new(NonZeroUsize::new(128).unwrap())),
        }
    }

    fn get(&self, key: &FilterParams) -> Option<Vec<usize>> {
        self.cache.borrow().peek(key).cloned()
    }

    fn put(&self, key: FilterParams, rows: Vec<usize>) {
        self.cache.borrow_mut().put(key, rows);
    }
}

impl Default for FilterCache {
    fn default() -> Self {
        Self::new()
    }
}

/// [`filter`] with memoized row indices.
pub fn filter_cached<'a>(
    dataset: &'a Dataset,
    params: &FilterParams,
    cache: &FilterCache,
) -> FilteredView<'a> {
    if let Some(rows) = cache.get(params) {
        debug!(rows_matched = rows.len(), "filter cache hit");
        return FilteredView { dataset, rows };
    }
    let view = filter(dataset, params);
    cache.put(params.clone(), view.rows.clone());
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::dataset::tests::{make_dataset, HEADER};

    fn orders_csv() -> String {
        format!(
            "{HEADER}\n\
o1,s1,toys,credit_card,5,2017-10-02 10:56:33,10.0,2017-10-06 11:07:15\n\
o2,s2,furniture,boleto,3,2017-11-18 19:28:06,20.0,2017-11-22 13:39:59\n\
o3,s1,toys,credit_card,1,2018-02-13 21:18:39,5.0,2018-02-19 20:31:37\n\
o4,s3,electronics,voucher,4,2018-03-01 10:00:00,50.0,2018-03-04 09:00:00\n"
        )
    }

    #[test]
    fn test_unfiltered_params_keep_every_row() {
        let dataset = make_dataset(&orders_csv());
        let params = FilterParams::unfiltered(&dataset.bounds());
        let view = filter(&dataset, &params);
        assert_eq!(view.rows(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_category_selection() {
        let dataset = make_dataset(&orders_csv());
        let mut params = FilterParams::unfiltered(&dataset.bounds());
        params.categories = vec!["toys".to_string()];
        let view = filter(&dataset, &params);
        assert_eq!(view.rows(), &[0, 2]);
    }

    #[test]
    fn test_multi_category_selection() {
        let dataset = make_dataset(&orders_csv());
        let mut params = FilterParams::unfiltered(&dataset.bounds());
        params.categories = vec!["electronics".to_string(), "furniture".to_string()];
        let view = filter(&dataset, &params);
        assert_eq!(view.rows(), &[1, 3]);
    }

    #[test]
    fn test_payment_selection() {
        let dataset = make_dataset(&orders_csv());
        let mut params = FilterParams::unfiltered(&dataset.bounds());
        params.payment_types = vec!["boleto".to_string()];
        let view = filter(&dataset, &params);
        assert_eq!(view.rows(), &[1]);
    }

    #[test]
    fn test_min_review_score() {
        let dataset = make_dataset(&orders_csv());
        let mut params = FilterParams::unfiltered(&dataset.bounds());
        params.min_review_score = 4;
        let view = filter(&dataset, &params);
        assert_eq!(view.rows(), &[0, 3]);
    }

    #[test]
    fn test_price_range_inclusive() {
        let dataset = make_dataset(&orders_csv());
        let mut params = FilterParams::unfiltered(&dataset.bounds());
        params.price_range = (10.0, 20.0);
        let view = filter(&dataset, &params);
        assert_eq!(view.rows(), &[0, 1]);
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let dataset = make_dataset(&orders_csv());
        let mut params = FilterParams::unfiltered(&dataset.bounds());
        params.categories = vec!["toys".to_string()];
        params.min_review_score = 2;
        let view = filter(&dataset, &params);
        assert_eq!(view.rows(), &[0]);
    }

    #[test]
    fn test_empty_selection_equals_no_predicate() {
        let dataset = make_dataset(&orders_csv());
        let mut selected_all = FilterParams::unfiltered(&dataset.bounds());
        selected_all.categories = dataset.distinct_categories();
        selected_all.payment_types = dataset.distinct_payment_types();

        let none_selected = FilterParams::unfiltered(&dataset.bounds());

        let a = filter(&dataset, &selected_all);
        let b = filter(&dataset, &none_selected);
        assert_eq!(a.rows(), b.rows());
    }

    #[test]
    fn test_filters_can_empty_the_view() {
        let dataset = make_dataset(&orders_csv());
        let mut params = FilterParams::unfiltered(&dataset.bounds());
        params.categories = vec!["furniture".to_string()];
        params.payment_types = vec!["credit_card".to_string()];
        let view = filter(&dataset, &params);
        assert!(view.is_empty());
    }

    #[test]
    fn test_view_is_subset_of_dataset() {
        let dataset = make_dataset(&orders_csv());
        let mut params = FilterParams::unfiltered(&dataset.bounds());
        params.min_review_score = 3;
        params.price_range = (6.0, 25.0);
        let view = filter(&dataset, &params);
        assert!(view.rows().iter().all(|&i| i < dataset.row_count()));
        assert!(view.rows().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_cached_filter_matches_uncached() {
        let dataset = make_dataset(&orders_csv());
        let cache = FilterCache::new();
        let mut params = FilterParams::unfiltered(&dataset.bounds());
        params.categories = vec!["toys".to_string()];

        let fresh = filter_cached(&dataset, &params, &cache);
        let cached = filter_cached(&dataset, &params, &cache);
        assert_eq!(fresh.rows(), cached.rows());
        assert_eq!(fresh.rows(), filter(&dataset, &params).rows());
    }

    #[test]
    fn test_intersect_sorted_vecs() {
        assert_eq!(
            intersect_sorted_vecs(vec![0, 1, 2, 5, 9], vec![1, 2, 3, 9]),
            vec![1, 2, 9]
        );
        assert_eq!(
            intersect_sorted_vecs(vec![0, 1], vec![2, 3]),
            Vec::<usize>::new()
        );
    }
}
