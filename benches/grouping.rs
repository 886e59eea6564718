use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tabnest::{group_rows, value, CsvSource, GroupingEngine, Record, Rule, Value};

fn sales_rule() -> Rule {
    Rule::from_raw(&value!({
        "select": ["region", "store", {"Store Manager": {"as": "manager"}}, "day", "amount"],
        "groups": {
            "region": {},
            "store": {"similar_items": ["manager"], "aggregated_property": "days"},
            "day": {}
        }
    }))
    .unwrap()
}

fn sales_rows(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let store = i % 50;
            let mut row = Record::new();
            row.insert("region".to_string(), Value::from(format!("r{}", store % 5)));
            row.insert("store".to_string(), Value::from(format!("s{}", store)));
            row.insert(
                "Store Manager".to_string(),
                Value::from(format!("manager-{}", store)),
            );
            row.insert("day".to_string(), Value::from(format!("d{}", i % 7)));
            row.insert("amount".to_string(), Value::from(i as i64));
            row
        })
        .collect()
}

fn sales_csv(count: usize) -> String {
    let mut csv = String::from("region,store,Store Manager,day,amount\n");
    for i in 0..count {
        let store = i % 50;
        csv.push_str(&format!(
            "r{},s{},manager-{},d{},{}\n",
            store % 5,
            store,
            store,
            i % 7,
            i
        ));
    }
    csv
}

fn benchmark_rule_parsing(c: &mut Criterion) {
    let raw = sales_rule().to_value();

    c.bench_function("parse_rule", |b| b.iter(|| Rule::from_raw(black_box(&raw))));
}

fn benchmark_group_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_rows");
    let rule = sales_rule();

    for size in [100, 1_000, 10_000].iter() {
        let rows = sales_rows(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| group_rows(&rule, black_box(rows.clone())))
        });
    }

    group.finish();
}

fn benchmark_group_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_csv");
    let engine = GroupingEngine::new(sales_rule());

    for size in [100, 1_000, 10_000].iter() {
        let data = sales_csv(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                let mut source = CsvSource::from_reader(std::io::Cursor::new(data.clone()));
                engine.run(&mut source)
            })
        });
    }

    group.finish();
}

fn benchmark_serialize_document(c: &mut Criterion) {
    let doc = group_rows(&sales_rule(), sales_rows(1_000)).unwrap();

    c.bench_function("serialize_document", |b| {
        b.iter(|| tabnest::to_json_string(black_box(&doc)))
    });
}

criterion_group!(
    benches,
    benchmark_rule_parsing,
    benchmark_group_rows,
    benchmark_group_csv,
    benchmark_serialize_document
);
criterion_main!(benches);
