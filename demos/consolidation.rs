//! Promoting shared fields onto buckets, and what happens when they differ.
//!
//! Run with: cargo run --example consolidation

use std::error::Error;
use tabnest::{record, to_json_string_pretty, value, GroupOptions, GroupingEngine, Rule};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let rule = Rule::from_raw(&value!({
        "select": ["order_id", {"cust": {"as": "customer"}}, "sku", "qty"],
        "groups": {
            "order_id": {"similar_items": ["customer"], "aggregated_property": "lines"},
            "sku": {}
        }
    }))?;

    let rows = vec![
        record! { "order_id": "o1", "cust": "Ada", "sku": "pen", "qty": 2, "note": "gift" },
        record! { "order_id": "o1", "cust": "Ada", "sku": "ink", "qty": 1 },
        record! { "order_id": "o2", "cust": "Bob", "sku": "pen", "qty": 5 },
    ];

    // Unselected fields such as "note" are kept by default
    let engine = GroupingEngine::new(rule.clone());
    println!("Default options:");
    println!("{}\n", to_json_string_pretty(&engine.group_records(rows.clone())?)?);

    let strict = GroupingEngine::with_options(
        rule.clone(),
        GroupOptions::new().with_keep_unselected_fields(false),
    );
    println!("Selected fields only:");
    println!("{}\n", to_json_string_pretty(&strict.group_records(rows.clone())?)?);

    // A bucket whose records disagree on a similar item cannot be consolidated
    let mut conflicting = rows;
    conflicting.push(record! { "order_id": "o2", "cust": "Eve", "sku": "pad", "qty": 1 });
    match engine.group_records(conflicting) {
        Ok(_) => println!("unexpectedly grouped"),
        Err(e) => println!("Conflict: {}", e),
    }

    Ok(())
}
