use chrono::{Datelike, Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use youtube_stat_rust::{CanonicalRecord, Config, FeatureEncoder, VocabularyBuilder};

const WORDS: [&str; 12] = [
    "猫", "犬", "動画", "料理", "旅行", "vlog", "実況", "ゲーム", "解説", "朝", "夜", "東京",
];

fn records(count: usize) -> Vec<CanonicalRecord> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();
    (0..count)
        .map(|i| {
            let date = start + Duration::days(i as i64);
            CanonicalRecord {
                id: format!("video{:05}", i),
                date,
                weekday: date.weekday().num_days_from_monday(),
                title: format!("title {}", i),
                view: 1000 + i as u64,
                like: (i % 50) as u64,
                dislike: (i % 7) as u64,
                comment: (i % 13) as u64,
                words: (0..4)
                    .map(|j| WORDS[(i * 7 + j * 3) % WORDS.len()].to_string())
                    .collect(),
            }
        })
        .collect()
}

/// Benchmark vocabulary construction over canonical word sets
fn bench_vocabulary(c: &mut Criterion) {
    let records = records(2_000);
    let builder = VocabularyBuilder::new(5);

    c.bench_function("vocabulary_from_records", |b| {
        b.iter(|| {
            builder.build_from_words(
                black_box(&records)
                    .iter()
                    .map(|r| r.words.iter().map(String::as_str)),
            )
        })
    });
}

/// Benchmark full matrix encoding with and without a cutoff
fn bench_feature_encoding(c: &mut Criterion) {
    let records = records(2_000);

    c.bench_function("feature_encoding_all", |b| {
        let encoder = FeatureEncoder::new(5, None);
        b.iter(|| encoder.encode(black_box(&records)))
    });

    c.bench_function("feature_encoding_cutoff", |b| {
        let encoder = FeatureEncoder::new(5, NaiveDate::from_ymd_opt(2022, 6, 30));
        b.iter(|| encoder.encode(black_box(&records)).to_csv())
    });
}

/// Benchmark configuration validation
fn bench_config_operations(c: &mut Criterion) {
    c.bench_function("config_validation", |b| {
        let config = Config::default();
        b.iter(|| config.validate())
    });
}

criterion_group!(
    benches,
    bench_vocabulary,
    bench_feature_encoding,
    bench_config_operations
);
criterion_main!(benches);
