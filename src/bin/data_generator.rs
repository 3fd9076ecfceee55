use rand::Rng;
use std::fs::{self, File};
use std::io::{BufWriter, Write};

const CATEGORIES: &[&str] = &[
    "bed_bath_table",
    "health_beauty",
    "sports_leisure",
    "furniture_decor",
    "computers_accessories",
    "housewares",
    "watches_gifts",
    "telephony",
    "garden_tools",
    "auto",
    "toys",
    "cool_stuff",
];

const PAYMENT_TYPES: &[&str] = &["credit_card", "boleto", "voucher", "debit_card"];

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/all_data.csv".to_string());
    let rows: usize = std::env::args()
        .nth(2)
        .and_then(|n| n.parse().ok())
        .unwrap_or(100_000);

    if let Some(dir) = std::path::Path::new(&path).parent() {
        fs::create_dir_all(dir).unwrap();
    }
    let file = File::create(&path).unwrap();
    let mut writer = BufWriter::new(file);

    writeln!(
        writer,
        "order_id,seller_id,product_category_name_english,payment_type,\
review_score,review_creation_date,price,shipping_limit_date"
    )
    .unwrap();

    let mut rng = rand::rng();
    for i in 0..rows {
        let category = CATEGORIES[rng.random_range(0..CATEGORIES.len())];
        let payment = PAYMENT_TYPES[rng.random_range(0..PAYMENT_TYPES.len())];
        let score = rng.random_range(1..=5);
        let price = rng.random_range(1.0..450.0_f64);
        let seller = rng.random_range(0..rows / 20 + 1);

        let year = 2017 + rng.random_range(0..2);
        let month = rng.random_range(1..=12);
        let day = rng.random_range(1..=28);
        let hour = rng.random_range(0..24);

        // a few malformed shipping dates, to be coerced to missing on load
        let shipping_date = if rng.random_range(0..100) < 2 {
            "pending".to_string()
        } else {
            format!("{year:04}-{month:02}-{day:02} {hour:02}:00:00")
        };

        writeln!(
            writer,
            "order_{i:08x},seller_{seller:06},{category},{payment},{score},\
{year:04}-{month:02}-{day:02},{price:.2},{shipping_date}"
        )
        .unwrap();
    }

    println!("Sample orders CSV generated: {} ({} rows)", path, rows);
}
