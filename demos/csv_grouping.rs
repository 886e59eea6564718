//! Grouping a CSV file with a JSON rule.
//!
//! Run with: cargo run --example csv_grouping [path/to/file.csv]
//!
//! Without an argument a small built-in table is used.

use std::error::Error;
use tabnest::{to_json_string_pretty, CsvSource, GroupingEngine, Rule};

const RULE: &str = r#"{
    "select": [
        "Country",
        {"Full Name": {"as": "name"}},
        "City",
        "Currency"
    ],
    "groups": {
        "Country": {"similar_items": ["Currency"], "aggregated_property": "cities"},
        "City": {}
    }
}"#;

const PEOPLE: &str = "\
Country,Full Name,City,Currency
France,Ada Lovelace,Paris,EUR
Japan,Grace Hopper,Tokyo,JPY
France,Alan Turing,Lyon,EUR
France,Edsger Dijkstra,Paris,EUR
";

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let rule = Rule::from_json(RULE)?;
    let engine = GroupingEngine::new(rule);

    let mut source = match std::env::args().nth(1) {
        Some(path) => CsvSource::from_path(path),
        None => CsvSource::from_reader(PEOPLE.as_bytes()),
    };

    let doc = engine.run(&mut source)?;
    println!("{}", to_json_string_pretty(&doc)?);
    println!("\n{} buckets, {} records", doc.len(), doc.record_count());

    Ok(())
}
