//! Text rendering of the dashboard.
//!
//! A stateless sink: it consumes the filter parameters, the dataset-derived
//! bounds, and the computed metrics, and writes the panel to any
//! [`io::Write`]. No aggregation happens here, only scaling and formatting.

use std::io::{self, Write};

use crate::dashboard::metrics::DashboardMetrics;
use crate::dashboard::{FilterParams, SliderBounds};

const BAR_WIDTH: usize = 40;

/// Render the full dashboard: filter summary, metric cards, and the four
/// chart panels.
pub fn render_dashboard<W: Write>(
    w: &mut W,
    bounds: &SliderBounds,
    params: &FilterParams,
    metrics: &DashboardMetrics,
) -> io::Result<()> {
    writeln!(w, "================ E-Commerce Dashboard ================")?;
    render_filters(w, bounds, params)?;

    writeln!(w)?;
    writeln!(
        w,
        "Total sales: ${}   Total orders: {}   Total sellers: {}",
        format_money(metrics.total_sales),
        metrics.total_orders,
        metrics.total_sellers
    )?;

    writeln!(w)?;
    writeln!(w, "--- Monthly sales trend ---")?;
    if metrics.monthly_trend.is_empty() {
        writeln!(w, "(no data)")?;
    } else {
        let max = metrics
            .monthly_trend
            .iter()
            .map(|&(_, v)| v)
            .fold(0.0_f64, f64::max);
        for (month, sales) in &metrics.monthly_trend {
            writeln!(
                w,
                "{}  {:<width$} {:>12}",
                month,
                bar(*sales, max),
                format_money(*sales),
                width = BAR_WIDTH
            )?;
        }
    }

    writeln!(w)?;
    writeln!(w, "--- Top categories by sales ---")?;
    if metrics.top_categories.is_empty() {
        writeln!(w, "(no data)")?;
    } else {
        let max = metrics
            .top_categories
            .iter()
            .map(|&(_, v)| v)
            .fold(0.0_f64, f64::max);
        for (category, sales) in &metrics.top_categories {
            writeln!(
                w,
                "{:<30}  {:<width$} {:>12}",
                category,
                bar(*sales, max),
                format_money(*sales),
                width = BAR_WIDTH
            )?;
        }
    }

    writeln!(w)?;
    writeln!(w, "--- Payment methods ---")?;
    if metrics.payment_distribution.is_empty() {
        writeln!(w, "(no data)")?;
    } else {
        let max = metrics
            .payment_distribution
            .iter()
            .map(|&(_, v)| v)
            .max()
            .unwrap_or(0) as f64;
        for (payment, count) in &metrics.payment_distribution {
            writeln!(
                w,
                "{:<30}  {:<width$} {:>8}",
                payment,
                bar(*count as f64, max),
                count,
                width = BAR_WIDTH
            )?;
        }
    }

    writeln!(w)?;
    writeln!(w, "--- Customer reviews ---")?;
    match metrics.average_review_score {
        Some(avg) => writeln!(w, "Average review score: {:.2}", avg)?,
        None => writeln!(w, "Average review score: no data")?,
    }
    if !metrics.review_score_distribution.is_empty() {
        let max = metrics
            .review_score_distribution
            .iter()
            .map(|&(_, v)| v)
            .max()
            .unwrap_or(0) as f64;
        for (score, count) in &metrics.review_score_distribution {
            writeln!(
                w,
                "score {}  {:<width$} {:>8}",
                score,
                bar(*count as f64, max),
                count,
                width = BAR_WIDTH
            )?;
        }
    }

    Ok(())
}

fn render_filters<W: Write>(
    w: &mut W,
    bounds: &SliderBounds,
    params: &FilterParams,
) -> io::Result<()> {
    let categories = if params.categories.is_empty() {
        "all".to_string()
    } else {
        params.categories.join(", ")
    };
    let payments = if params.payment_types.is_empty() {
        "all".to_string()
    } else {
        params.payment_types.join(", ")
    };
    writeln!(w, "Categories: {}", categories)?;
    writeln!(w, "Payment types: {}", payments)?;
    writeln!(
        w,
        "Review score: >= {} (range {}..{})",
        params.min_review_score, bounds.review_score.0, bounds.review_score.1
    )?;
    writeln!(
        w,
        "Price: {} .. {} (range {} .. {})",
        format_money(params.price_range.0),
        format_money(params.price_range.1),
        format_money(bounds.price.0),
        format_money(bounds.price.1)
    )
}

/// A horizontal bar scaled against the panel's largest value.
fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(len.clamp(1, BAR_WIDTH))
}

/// `1234567.5` -> `"1,234,567.50"`.
fn format_money(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{}{}.{:02}", sign, grouped, frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::MonthKey;

    fn sample_metrics() -> DashboardMetrics {
        DashboardMetrics {
            total_sales: 1234567.5,
            total_orders: 42,
            total_sellers: 7,
            monthly_trend: vec![
                (MonthKey { year: 2017, month: 10 }, 1000.0),
                (MonthKey { year: 2017, month: 11 }, 500.0),
            ],
            top_categories: vec![("toys".to_string(), 800.0), ("auto".to_string(), 200.0)],
            payment_distribution: vec![("credit_card".to_string(), 30), ("boleto".to_string(), 12)],
            average_review_score: Some(4.25),
            review_score_distribution: vec![(4, 20), (5, 22)],
        }
    }

    fn sample_bounds() -> SliderBounds {
        SliderBounds {
            review_score: (1, 5),
            price: (0.85, 6735.0),
        }
    }

    #[test]
    fn test_render_full_dashboard() {
        let bounds = sample_bounds();
        let params = FilterParams::unfiltered(&bounds);
        let mut out = Vec::new();
        render_dashboard(&mut out, &bounds, &params, &sample_metrics()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Total sales: $1,234,567.50"));
        assert!(text.contains("Total orders: 42"));
        assert!(text.contains("Total sellers: 7"));
        assert!(text.contains("2017-10"));
        assert!(text.contains("toys"));
        assert!(text.contains("credit_card"));
        assert!(text.contains("Average review score: 4.25"));
        assert!(text.contains("Categories: all"));
    }

    #[test]
    fn test_render_empty_view_says_no_data() {
        let bounds = sample_bounds();
        let params = FilterParams::unfiltered(&bounds);
        let metrics = DashboardMetrics {
            total_sales: 0.0,
            total_orders: 0,
            total_sellers: 0,
            monthly_trend: vec![],
            top_categories: vec![],
            payment_distribution: vec![],
            average_review_score: None,
            review_score_distribution: vec![],
        };
        let mut out = Vec::new();
        render_dashboard(&mut out, &bounds, &params, &metrics).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Average review score: no data"));
        assert!(text.contains("(no data)"));
        assert!(text.contains("Total sales: $0.00"));
    }

    #[test]
    fn test_active_selections_listed() {
        let bounds = sample_bounds();
        let mut params = FilterParams::unfiltered(&bounds);
        params.categories = vec!["auto".to_string(), "toys".to_string()];
        let mut out = Vec::new();
        render_dashboard(&mut out, &bounds, &params, &sample_metrics()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Categories: auto, toys"));
    }

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(100.0, 100.0).len(), BAR_WIDTH);
        assert_eq!(bar(50.0, 100.0).len(), BAR_WIDTH / 2);
        assert_eq!(bar(0.0, 100.0), "");
        // tiny but non-zero values still show up
        assert_eq!(bar(0.0001, 100.0), "#");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0.0), "0.00");
        assert_eq!(format_money(5.0), "5.00");
        assert_eq!(format_money(1234.5), "1,234.50");
        assert_eq!(format_money(1234567.891), "1,234,567.89");
        assert_eq!(format_money(-42.0), "-42.00");
    }
}
