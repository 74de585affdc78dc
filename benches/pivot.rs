use std::collections::HashMap;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode, Throughput};
use pivots::{get_chart, pivot_data, pivot_table, Connection, PivotOptions};
use polars::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

const TOWNS: [&str; 8] = ["BA", "KE", "LON", "PAR", "NYC", "SF", "TOK", "BER"];

fn gen_sales(n: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut month: Vec<String> = Vec::with_capacity(n);
    let mut town: Vec<&str> = Vec::with_capacity(n);
    let mut gender: Vec<&str> = Vec::with_capacity(n);
    let mut price: Vec<f64> = Vec::with_capacity(n);
    for _ in 0..n {
        month.push(format!("2010{:02}", rng.gen_range(1..=12)));
        town.push(TOWNS[rng.gen_range(0..TOWNS.len())]);
        gender.push(if rng.gen::<bool>() { "male" } else { "female" });
        price.push(rng.gen::<f64>() * 1000.0);
    }
    DataFrame::new(vec![
        Series::new("yearmonth".into(), month).into(),
        Series::new("town".into(), town).into(),
        Series::new("gender".into(), gender).into(),
        Series::new("price".into(), price).into(),
    ]).expect("df build")
}

fn bench_pivot(c: &mut Criterion) {
    let ns = [10_000usize, 100_000usize];
    let mut group = c.benchmark_group("pivot");
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(20);
    let opts = PivotOptions::default();
    let values = vec![("sum", "price"), ("len", "price")];

    for &n in &ns {
        let conn = Connection::new();
        conn.register("sales", gen_sales(n, 0xABCD_1234));
        let q = conn.table("sales").expect("table");
        group.throughput(Throughput::Elements(n as u64));

        // Grouped query only
        group.bench_with_input(BenchmarkId::new("group_by_month_town_gender", n.to_string()), &n, |b, _| {
            b.iter(|| {
                let _rows = pivot_data(&q, "yearmonth", ["town", "gender"], values.clone()).unwrap();
            });
        });

        // Reshape + chart over pre-aggregated rows
        let rows = pivot_data(&q, "yearmonth", ["town", "gender"], values.clone()).unwrap();
        group.bench_with_input(BenchmarkId::new("reshape_and_chart", n.to_string()), &n, |b, _| {
            b.iter(|| {
                let table = pivot_table(&rows, "yearmonth", ["town", "gender"], values.clone(), &opts).unwrap().unwrap();
                let _chart = get_chart(&table, "yearmonth", values.clone(), &HashMap::new(), &opts);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pivot);
criterion_main!(benches);
