use chrono::{NaiveDate, NaiveDateTime};
use memchr::{memchr, memchr_iter};
use memmap2::Mmap;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::{collections::BTreeSet, fs::File, path::Path};
use tracing::info;

use crate::dashboard::{DashboardError, LoadSummary, ParseError, SliderBounds};
use crate::helpers::simd_helpers::{min_max_f64, min_max_i64};

/// Byte range of a field inside the memory-mapped file.
type Span = (usize, usize);

pub const COL_ORDER_ID: &str = "order_id";
pub const COL_SELLER_ID: &str = "seller_id";
pub const COL_CATEGORY: &str = "product_category_name_english";
pub const COL_PAYMENT_TYPE: &str = "payment_type";
pub const COL_REVIEW_SCORE: &str = "review_score";
pub const COL_REVIEW_DATE: &str = "review_creation_date";
pub const COL_PRICE: &str = "price";
pub const COL_SHIPPING_DATE: &str = "shipping_limit_date";

/// Datetime formats tried in order; the file mixes locales, so both
/// day-first and month-first variants are recognized.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];

/// Parse a datetime leniently: date-only values are anchored to midnight,
/// anything unrecognized (including empty) becomes `None`.
pub fn parse_datetime_lenient(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Positions of the required columns within the file's header.
///
/// The pre-joined export carries more columns than the dashboard uses; only
/// the ones named here are parsed, the rest are skipped field-by-field.
#[derive(Debug, Clone, Copy)]
struct ColumnLayout {
    width: usize,
    order_id: usize,
    seller_id: usize,
    category: usize,
    payment_type: usize,
    review_score: usize,
    review_date: usize,
    price: usize,
    shipping_date: usize,
}

impl ColumnLayout {
    fn from_headers(headers: &[String]) -> Result<Self, DashboardError> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DashboardError::MissingColumn(name.to_string()))
        };

        Ok(ColumnLayout {
            width: headers.len(),
            order_id: position(COL_ORDER_ID)?,
            seller_id: position(COL_SELLER_ID)?,
            category: position(COL_CATEGORY)?,
            payment_type: position(COL_PAYMENT_TYPE)?,
            review_score: position(COL_REVIEW_SCORE)?,
            review_date: position(COL_REVIEW_DATE)?,
            price: position(COL_PRICE)?,
            shipping_date: position(COL_SHIPPING_DATE)?,
        })
    }
}

/// Per-chunk parse output, merged into the dataset columns afterwards.
#[derive(Debug, Default)]
struct RowBatch {
    order_id: Vec<Span>,
    seller_id: Vec<Span>,
    category: Vec<Span>,
    payment_type: Vec<Span>,
    review_score: Vec<i64>,
    review_date: Vec<Option<NaiveDateTime>>,
    price: Vec<f64>,
    shipping_date: Vec<Option<NaiveDateTime>>,
    errors: Vec<ParseError>,
}

/// The loaded, immutable orders table.
///
/// Identifier and categorical columns are byte offsets into the mmap (the
/// CSV bytes are never copied); numeric and datetime columns are typed
/// vectors. The dataset never changes after load; filtering produces row
/// index subsets, not new tables.
#[derive(Debug)]
pub struct Dataset {
    mmap: Mmap, // owns the CSV bytes
    order_id: Vec<Span>,
    seller_id: Vec<Span>,
    category: Vec<Span>,
    payment_type: Vec<Span>,
    review_score: Vec<i64>,
    review_date: Vec<Option<NaiveDateTime>>,
    price: Vec<f64>,
    shipping_date: Vec<Option<NaiveDateTime>>,
    bounds: SliderBounds,
    summary: LoadSummary,
}

impl Dataset {
    /// Loads the orders CSV using memory mapping.
    ///
    /// Rows with a wrong field count or unparseable numeric fields are
    /// skipped and reported in the [`LoadSummary`]; unparseable dates become
    /// missing values and keep their row.
    ///
    /// # Errors
    /// Returns a [`DashboardError`] if the file cannot be opened or mapped,
    /// a required column is absent, or no data rows survive parsing.
    pub fn load(path: &Path) -> Result<Self, DashboardError> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(DashboardError::EmptyDataset);
        }
        let mmap = unsafe { Mmap::map(&file)? };
        let buf: &[u8] = &mmap[..];

        // Parse header
        let header_end = memchr(b'\n', buf)
            .ok_or_else(|| DashboardError::Csv("missing header line".to_string()))?;
        let mut header_line = &buf[..header_end];
        if header_line.last() == Some(&b'\r') {
            header_line = &header_line[..header_line.len() - 1];
        }
        let headers: Vec<String> = header_line
            .split(|&b| b == b',')
            .map(|s| String::from_utf8_lossy(s).to_string())
            .collect();
        let layout = ColumnLayout::from_headers(&headers)?;

        let data_start = header_end + 1;
        let data = &buf[data_start..];

        // Split into chunks on line boundaries and parse them in parallel
        let chunks = find_chunk_boundaries(data, rayon::current_num_threads());
        let batches: Vec<RowBatch> = chunks
            .par_iter()
            .map(|&(start, end)| parse_chunk(&data[start..end], &layout, data_start + start))
            .collect();

        let mut merged = RowBatch::default();
        for mut batch in batches {
            merged.order_id.append(&mut batch.order_id);
            merged.seller_id.append(&mut batch.seller_id);
            merged.category.append(&mut batch.category);
            merged.payment_type.append(&mut batch.payment_type);
            merged.review_score.append(&mut batch.review_score);
            merged.review_date.append(&mut batch.review_date);
            merged.price.append(&mut batch.price);
            merged.shipping_date.append(&mut batch.shipping_date);
            merged.errors.append(&mut batch.errors);
        }

        let rows_loaded = merged.price.len();
        let (score_min, score_max) =
            min_max_i64(&merged.review_score).ok_or(DashboardError::EmptyDataset)?;
        let (price_min, price_max) =
            min_max_f64(&merged.price).ok_or(DashboardError::EmptyDataset)?;

        info!(
            rows_loaded,
            rows_skipped = merged.errors.len(),
            "dataset loaded"
        );

        Ok(Dataset {
            mmap,
            order_id: merged.order_id,
            seller_id: merged.seller_id,
            category: merged.category,
            payment_type: merged.payment_type,
            review_score: merged.review_score,
            review_date: merged.review_date,
            price: merged.price,
            shipping_date: merged.shipping_date,
            bounds: SliderBounds {
                review_score: (score_min, score_max),
                price: (price_min, price_max),
            },
            summary: LoadSummary {
                rows_loaded,
                errors: merged.errors,
            },
        })
    }

    pub fn row_count(&self) -> usize {
        self.summary.rows_loaded
    }

    /// Slider bounds over the full dataset; filtering never changes them.
    pub fn bounds(&self) -> SliderBounds {
        self.bounds
    }

    pub fn summary(&self) -> &LoadSummary {
        &self.summary
    }

    pub fn prices(&self) -> &[f64] {
        &self.price
    }

    pub fn review_scores(&self) -> &[i64] {
        &self.review_score
    }

    pub fn review_creation_dates(&self) -> &[Option<NaiveDateTime>] {
        &self.review_date
    }

    pub fn shipping_limit_dates(&self) -> &[Option<NaiveDateTime>] {
        &self.shipping_date
    }

    pub fn order_id(&self, row: usize) -> &str {
        self.str_at(self.order_id[row])
    }

    pub fn seller_id(&self, row: usize) -> &str {
        self.str_at(self.seller_id[row])
    }

    pub fn category(&self, row: usize) -> &str {
        self.str_at(self.category[row])
    }

    pub fn payment_type(&self, row: usize) -> &str {
        self.str_at(self.payment_type[row])
    }

    /// Distinct category values, sorted; populates the multiselect.
    pub fn distinct_categories(&self) -> Vec<String> {
        self.distinct_of(&self.category)
    }

    /// Distinct payment-type values, sorted; populates the multiselect.
    pub fn distinct_payment_types(&self) -> Vec<String> {
        self.distinct_of(&self.payment_type)
    }

    fn distinct_of(&self, spans: &[Span]) -> Vec<String> {
        let set: BTreeSet<&str> = spans
            .iter()
            .map(|&span| self.str_at(span))
            .filter(|s| !s.is_empty())
            .collect();
        set.into_iter().map(String::from).collect()
    }

    fn str_at(&self, (start, end): Span) -> &str {
        std::str::from_utf8(&self.mmap[start..end]).unwrap_or("")
    }
}

fn find_chunk_boundaries(data: &[u8], num_chunks: usize) -> Vec<(usize, usize)> {
    if data.is_empty() {
        return vec![];
    }

    let chunk_size = data.len() / num_chunks;
    let mut boundaries = Vec::with_capacity(num_chunks);
    let mut start = 0;

    for i in 0..num_chunks.saturating_sub(1) {
        let mut end = (i + 1) * chunk_size;

        // Advance to the next newline so no line straddles two chunks
        while end < data.len() && data[end] != b'\n' {
            end += 1;
        }

        if end < data.len() {
            end += 1; // include the newline
        }

        if start < end {
            boundaries.push((start, end));
        }
        start = end;
    }

    if start < data.len() {
        boundaries.push((start, data.len()));
    }

    boundaries
}

fn parse_chunk(chunk: &[u8], layout: &ColumnLayout, chunk_offset: usize) -> RowBatch {
    let mut batch = RowBatch::default();
    let mut fields: Vec<Span> = Vec::with_capacity(layout.width);

    let mut start = 0;
    while start < chunk.len() {
        let line_end = memchr(b'\n', &chunk[start..])
            .map(|p| start + p)
            .unwrap_or(chunk.len());
        let mut line = &chunk[start..line_end];
        let line_offset = chunk_offset + start;
        start = line_end + 1;

        if line.last() == Some(&b'\r') {
            line = &line[..line.len() - 1];
        }
        if line.is_empty() {
            continue;
        }

        // Split into field spans relative to the line
        fields.clear();
        let mut field_start = 0;
        for comma in memchr_iter(b',', line) {
            fields.push((field_start, comma));
            field_start = comma + 1;
        }
        fields.push((field_start, line.len()));

        if fields.len() != layout.width {
            batch.errors.push(ParseError {
                offset: line_offset,
                column: String::new(),
                value: format!("expected {} fields, got {}", layout.width, fields.len()),
                error: None,
            });
            continue;
        }

        let field = |idx: usize| {
            let (s, e) = fields[idx];
            &line[s..e]
        };

        let review_score = match atoi_simd::parse::<i64>(field(layout.review_score)) {
            Ok(v) => v,
            Err(e) => {
                batch.errors.push(ParseError {
                    offset: line_offset,
                    column: COL_REVIEW_SCORE.to_string(),
                    value: String::from_utf8_lossy(field(layout.review_score)).to_string(),
                    error: Some(e.to_string()),
                });
                continue;
            }
        };

        let price = match fast_float::parse::<f64, _>(field(layout.price)) {
            Ok(v) => v,
            Err(e) => {
                batch.errors.push(ParseError {
                    offset: line_offset,
                    column: COL_PRICE.to_string(),
                    value: String::from_utf8_lossy(field(layout.price)).to_string(),
                    error: Some(e.to_string()),
                });
                continue;
            }
        };

        // Date failures coerce to missing; the row stays
        let review_date =
            parse_datetime_lenient(&String::from_utf8_lossy(field(layout.review_date)));
        let shipping_date =
            parse_datetime_lenient(&String::from_utf8_lossy(field(layout.shipping_date)));

        let absolute = |idx: usize| {
            let (s, e) = fields[idx];
            (line_offset + s, line_offset + e)
        };

        batch.order_id.push(absolute(layout.order_id));
        batch.seller_id.push(absolute(layout.seller_id));
        batch.category.push(absolute(layout.category));
        batch.payment_type.push(absolute(layout.payment_type));
        batch.review_score.push(review_score);
        batch.review_date.push(review_date);
        batch.price.push(price);
        batch.shipping_date.push(shipping_date);
    }

    batch
}
