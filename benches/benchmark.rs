use commerce_dashboard::dashboard::{
    dataset::Dataset,
    filter::{filter, filter_cached, FilterCache},
    metrics::DashboardMetrics,
    FilterParams,
};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use jemallocator::Jemalloc;
use std::io::Write;
use tempfile::NamedTempFile;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

const ROWS: usize = 200_000;

fn synthetic_orders() -> NamedTempFile {
    let categories = ["toys", "auto", "housewares", "telephony", "garden_tools"];
    let payments = ["credit_card", "boleto", "voucher", "debit_card"];

    let mut tmp = NamedTempFile::new().unwrap();
    writeln!(
        tmp,
        "order_id,seller_id,product_category_name_english,payment_type,\
review_score,review_creation_date,price,shipping_limit_date"
    )
    .unwrap();
    for i in 0..ROWS {
        writeln!(
            tmp,
            "o{i},s{},{},{},{},2017-{:02}-15 10:00:00,{}.50,2017-{:02}-18 10:00:00",
            i % 500,
            categories[i % categories.len()],
            payments[i % payments.len()],
            i % 5 + 1,
            i % 12 + 1,
            i % 400 + 1,
            i % 12 + 1,
        )
        .unwrap();
    }
    tmp.flush().unwrap();
    tmp
}

fn pipeline(c: &mut Criterion) {
    let tmp = synthetic_orders();

    let mut group = c.benchmark_group("dashboard");
    group.sample_size(10);
    group.throughput(Throughput::Elements(ROWS as u64));

    group.bench_function("load_csv", |b| {
        b.iter(|| Dataset::load(tmp.path()).unwrap())
    });

    let dataset = Dataset::load(tmp.path()).unwrap();
    let mut params = FilterParams::unfiltered(&dataset.bounds());
    params.categories = vec!["auto".to_string(), "toys".to_string()];
    params.min_review_score = 3;

    group.bench_function("filter", |b| b.iter(|| filter(&dataset, &params)));

    group.bench_function("filter_cached", |b| {
        let cache = FilterCache::new();
        b.iter(|| filter_cached(&dataset, &params, &cache))
    });

    let view = filter(&dataset, &params);
    group.bench_function("aggregate", |b| b.iter(|| DashboardMetrics::compute(&view)));

    group.bench_function("filter + aggregate", |b| {
        b.iter(|| {
            let view = filter(&dataset, &params);
            DashboardMetrics::compute(&view)
        })
    });

    group.finish();
}

criterion_group!(benches, pipeline);
criterion_main!(benches);
