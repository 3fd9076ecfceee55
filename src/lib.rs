//! # commerce-dashboard
//!
//! A columnar analytics pipeline over a pre-joined e-commerce orders CSV.
//! The dataset is loaded once (memory-mapped, zero-copy for identifier and
//! categorical columns); every user interaction then re-runs the same pure
//! pipeline: filter the rows, aggregate the filtered view, render the result.
//!
//! - **Loading**: memory-mapped CSV, parallel chunked parsing, lenient
//!   multi-format datetime parsing (unparseable dates become missing values)
//! - **Filtering**: category / payment-type multiselects (an empty selection
//!   means "no filtering by that dimension"), minimum review score,
//!   inclusive price range, all combined with AND
//! - **Aggregation**: total sales, distinct order/seller counts, monthly
//!   sales trend, top-N categories by sales, payment-type distribution,
//!   review-score mean and distribution
//! - **Rendering**: stateless text dashboard over any `io::Write`
//!
//! # Example
//!
//! ```no_run
//! use commerce_dashboard::dashboard::{
//!     FilterParams, dataset::Dataset, filter::filter, metrics::DashboardMetrics,
//! };
//!
//! fn main() -> Result<(), commerce_dashboard::dashboard::DashboardError> {
//!     let dataset = Dataset::load("data/all_data.csv".as_ref())?;
//!     let bounds = dataset.bounds();
//!
//!     let mut params = FilterParams::unfiltered(&bounds);
//!     params.categories = vec!["toys".to_string()];
//!     params.min_review_score = 3;
//!
//!     let view = filter(&dataset, &params);
//!     let metrics = DashboardMetrics::compute(&view);
//!     println!("total sales: {:.2}", metrics.total_sales);
//!     Ok(())
//! }
//! ```

mod helpers;
pub mod dashboard;
