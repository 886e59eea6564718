use std::io::Write;
use tabnest::{
    group_csv, group_rows, record, to_json_string, to_json_string_pretty, value, CsvSource,
    Delimiter, Error, GroupOptions, GroupingEngine, MemorySource, Record, Rule, Value,
};

fn write_csv(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

fn people_rule() -> Value {
    value!({
        "select": ["Country", {"Full Name": {"as": "name"}}, "City", "Currency"],
        "groups": {
            "Country": {"similar_items": ["Currency"], "aggregated_property": "cities"},
            "City": {}
        },
        "where": null
    })
}

#[test]
fn test_end_to_end_single_level() {
    let rule = Rule::from_raw(&value!({"select": ["a", "b", "c"], "groups": {"a": {}}})).unwrap();
    let doc = group_rows(
        &rule,
        vec![
            record! { "a": "1", "b": "x", "c": "p" },
            record! { "a": "1", "b": "x", "c": "q" },
        ],
    )
    .unwrap();

    assert_eq!(
        to_json_string(&doc).unwrap(),
        r#"{"1":[{"b":"x","c":"p"},{"b":"x","c":"q"}]}"#
    );
}

#[test]
fn test_csv_file_end_to_end() {
    let file = write_csv(&[
        "Country,Full Name,City,Currency",
        "France,Ada Lovelace,Paris,EUR",
        "Japan,Grace Hopper,Tokyo,JPY",
        "France,Alan Turing,Lyon,EUR",
        "France,Edsger Dijkstra,Paris,EUR",
    ]);

    let doc = group_csv(file.path(), &people_rule()).unwrap();
    println!("{}", to_json_string_pretty(&doc).unwrap());

    assert_eq!(
        doc.to_value(),
        value!({
            "France": {
                "Currency": "EUR",
                "cities": {
                    "Paris": [{"name": "Ada Lovelace"}, {"name": "Edsger Dijkstra"}],
                    "Lyon": [{"name": "Alan Turing"}]
                }
            },
            "Japan": {
                "Currency": "JPY",
                "cities": {"Tokyo": [{"name": "Grace Hopper"}]}
            }
        })
    );
    assert_eq!(doc.record_count(), 4);
}

#[test]
fn test_csv_conflict_aborts_run() {
    let file = write_csv(&[
        "Country,Full Name,City,Currency",
        "France,Ada Lovelace,Paris,EUR",
        "France,Alan Turing,Lyon,FRF",
    ]);

    let err = group_csv(file.path(), &people_rule()).unwrap_err();
    assert_eq!(err, Error::consolidation_conflict("Currency", "EUR", "FRF"));
    assert_eq!(
        err.to_string(),
        "Cannot combine similar items for column alias 'Currency': found different values 'EUR' and 'FRF'"
    );
}

#[test]
fn test_csv_header_only_is_empty_input() {
    let file = write_csv(&["Country,Full Name,City,Currency"]);
    assert_eq!(
        group_csv(file.path(), &people_rule()).unwrap_err(),
        Error::EmptyInput
    );
}

#[test]
fn test_csv_missing_file_is_io_error() {
    let err = group_csv("/definitely/missing/people.csv", &people_rule()).unwrap_err();
    assert!(matches!(err, Error::Io(_)), "{err}");
}

#[test]
fn test_csv_source_with_tab_delimiter() {
    let rule = Rule::from_raw(&value!({"select": ["team", "member"], "groups": {"team": {}}})).unwrap();
    let data = "team\tmember\nred\tann\nblue\tbo\nred\tcy\n";
    let mut source = CsvSource::from_reader(data.as_bytes()).with_delimiter(Delimiter::Tab);

    let doc = GroupingEngine::new(rule).run(&mut source).unwrap();
    assert_eq!(
        doc.to_value(),
        value!({
            "red": [{"member": "ann"}, {"member": "cy"}],
            "blue": [{"member": "bo"}]
        })
    );
}

#[test]
fn test_engine_is_reusable() {
    let rule = Rule::from_raw(&value!({"select": ["k", "v"], "groups": {"k": {}}})).unwrap();
    let engine = GroupingEngine::new(rule);
    let mut source = MemorySource::new(vec![record! { "k": "a", "v": "1" }]);

    let first = engine.run(&mut source).unwrap();
    let second = engine.run(&mut source).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_strict_options_report_row_index() {
    let rule = Rule::from_raw(&value!({"select": ["k", "v"], "groups": {"k": {}}})).unwrap();
    let engine = GroupingEngine::with_options(rule, GroupOptions::strict());
    let err = engine
        .group_records(vec![
            record! { "k": "a", "v": "1" },
            record! { "k": "a", "v": "2" },
            record! { "k": "b" },
        ])
        .unwrap_err();

    assert!(matches!(err, Error::RowCorrelation { row: 2, .. }), "{err}");
}

#[test]
fn test_typed_values_serialize_as_json() {
    let rule = Rule::from_raw(&value!({"select": ["id", "score", "ok"], "groups": {"id": {}}})).unwrap();
    let doc = group_rows(
        &rule,
        vec![
            record! { "id": 1, "score": 2.5, "ok": true },
            record! { "id": 1, "score": null, "ok": false },
        ],
    )
    .unwrap();

    assert_eq!(
        to_json_string(&doc).unwrap(),
        r#"{"1":[{"score":2.5,"ok":true},{"score":null,"ok":false}]}"#
    );
}

#[test]
fn test_deep_navigation() {
    let rule = Rule::from_raw(&value!({
        "select": ["continent", "country", "city", "pop"],
        "groups": {"continent": {}, "country": {}, "city": {}}
    }))
    .unwrap();

    let rows: Vec<Record> = vec![
        record! { "continent": "EU", "country": "FR", "city": "Paris", "pop": "2.1M" },
        record! { "continent": "EU", "country": "IT", "city": "Rome", "pop": "2.8M" },
        record! { "continent": "AS", "country": "JP", "city": "Tokyo", "pop": "14M" },
    ];
    let doc = group_rows(&rule, rows).unwrap();

    let leaf = doc.at(&["EU", "IT", "Rome"]).unwrap();
    assert_eq!(leaf.as_records().unwrap(), &[record! { "pop": "2.8M" }]);
    assert!(doc.at(&["EU", "JP"]).is_none());
    assert_eq!(doc.get("EU").unwrap().record_count(), 2);
}

#[test]
fn test_single_consolidating_level_yields_plain_lists() {
    let rule = Rule::from_raw(&value!({
        "select": ["order", "customer", "sku"],
        "groups": {"order": {"similar_items": ["customer"], "aggregated_property": "lines"}}
    }))
    .unwrap();
    let doc = group_rows(
        &rule,
        vec![
            record! { "order": "o1", "customer": "c1", "sku": "s1" },
            record! { "order": "o1", "customer": "c2", "sku": "s2" },
        ],
    )
    .unwrap();

    assert_eq!(
        to_json_string(&doc).unwrap(),
        r#"{"o1":[{"customer":"c1","sku":"s1"},{"customer":"c2","sku":"s2"}]}"#
    );
}
