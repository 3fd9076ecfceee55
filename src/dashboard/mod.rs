use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use thiserror::Error;

pub mod dataset;
pub mod filter;
pub mod metrics;
pub mod render;

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("CSV structure error: {0}")]
    Csv(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Dataset contains no data rows")]
    EmptyDataset,
}

/// Outcome of a load: how many rows made it in, and which ones did not.
#[derive(Debug)]
pub struct LoadSummary {
    pub rows_loaded: usize,
    pub errors: Vec<ParseError>,
}

/// A row that was skipped during load.
///
/// `offset` is the byte offset of the start of the line in the file, which
/// stays meaningful even though rows are parsed in parallel chunks.
#[derive(Debug)]
pub struct ParseError {
    pub offset: usize,
    pub column: String,
    pub value: String,
    pub error: Option<String>,
}

/// Slider bounds derived from the full, unfiltered dataset at load time.
///
/// Bounds never shrink as filters narrow the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderBounds {
    pub review_score: (i64, i64),
    pub price: (f64, f64),
}

/// The sidebar state: one value per filter dimension.
///
/// An empty `categories` or `payment_types` selection disables that dimension
/// ("no selection" means "no filtering", not "exclude everything"). Selections
/// are kept sorted so structurally equal parameter sets compare and hash
/// equal, which lets `FilterParams` key the filter cache.
#[derive(Debug, Clone)]
pub struct FilterParams {
    pub categories: Vec<String>,
    pub payment_types: Vec<String>,
    pub min_review_score: i64,
    pub price_range: (f64, f64),
}

impl FilterParams {
    /// Parameters that let every row through: no selections, score and price
    /// at the dataset-wide bounds.
    pub fn unfiltered(bounds: &SliderBounds) -> Self {
        FilterParams {
            categories: Vec::new(),
            payment_types: Vec::new(),
            min_review_score: bounds.review_score.0,
            price_range: bounds.price,
        }
    }
}

impl PartialEq for FilterParams {
    fn eq(&self, other: &Self) -> bool {
        self.categories == other.categories
            && self.payment_types == other.payment_types
            && self.min_review_score == other.min_review_score
            && self.price_range.0.to_bits() == other.price_range.0.to_bits()
            && self.price_range.1.to_bits() == other.price_range.1.to_bits()
    }
}

impl Eq for FilterParams {}

impl Hash for FilterParams {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.categories.hash(state);
        self.payment_types.hash(state);
        self.min_review_score.hash(state);
        self.price_range.0.to_bits().hash(state);
        self.price_range.1.to_bits().hash(state);
    }
}

/// A calendar month used as the monthly-trend group key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn from_datetime(dt: &chrono::NaiveDateTime) -> Self {
        use chrono::Datelike;
        MonthKey {
            year: dt.year(),
            month: dt.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(params: &FilterParams) -> u64 {
        let mut h = DefaultHasher::new();
        params.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_unfiltered_params_span_bounds() {
        let bounds = SliderBounds {
            review_score: (1, 5),
            price: (0.99, 450.0),
        };
        let params = FilterParams::unfiltered(&bounds);
        assert!(params.categories.is_empty());
        assert!(params.payment_types.is_empty());
        assert_eq!(params.min_review_score, 1);
        assert_eq!(params.price_range, (0.99, 450.0));
    }

    #[test]
    fn test_params_equality_and_hash_follow_structure() {
        let bounds = SliderBounds {
            review_score: (1, 5),
            price: (0.0, 100.0),
        };
        let a = FilterParams::unfiltered(&bounds);
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let mut c = a.clone();
        c.min_review_score = 3;
        assert_ne!(a, c);
    }

    #[test]
    fn test_month_key_ordering_and_display() {
        let jan = MonthKey {
            year: 2018,
            month: 1,
        };
        let dec = MonthKey {
            year: 2017,
            month: 12,
        };
        assert!(dec < jan);
        assert_eq!(jan.to_string(), "2018-01");
    }
}
