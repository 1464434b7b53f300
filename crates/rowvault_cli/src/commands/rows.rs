//! Row operation commands.
//!
//! Each command connects, waits for admission, performs the operation,
//! and disconnects, printing affected rows as compact JSON lines.

use rowvault_core::{Connection, DatabaseEngine, Row, StoreError};
use serde_json::Value;

/// Runs the insert command.
pub fn insert(
    engine: &DatabaseEngine,
    database: &str,
    table: &str,
    row_json: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let row = parse_object(row_json, "row")?;
    with_connection(engine, database, |conn| conn.table(table)?.insert(&row))?;
    println!("Inserted 1 row into '{table}'");
    Ok(())
}

/// Runs the search command.
pub fn search(
    engine: &DatabaseEngine,
    database: &str,
    table: &str,
    filter_json: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = parse_object(filter_json, "filter")?;
    let found = with_connection(engine, database, |conn| {
        conn.table(table)?.search(&filter)
    })?;
    print_rows(&found);
    Ok(())
}

/// Runs the update command.
pub fn update(
    engine: &DatabaseEngine,
    database: &str,
    table: &str,
    filter_json: &str,
    set_json: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = parse_object(filter_json, "filter")?;
    let updates = parse_object(set_json, "set")?;
    let changed = with_connection(engine, database, |conn| {
        conn.table(table)?.update(&filter, &updates)
    })?;
    print_rows(&changed);
    eprintln!("Updated {} row(s)", changed.len());
    Ok(())
}

/// Runs the delete command.
pub fn delete(
    engine: &DatabaseEngine,
    database: &str,
    table: &str,
    filter_json: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = parse_object(filter_json, "filter")?;
    let removed = with_connection(engine, database, |conn| {
        conn.table(table)?.delete(&filter)
    })?;
    print_rows(&removed);
    eprintln!("Deleted {} row(s)", removed.len());
    Ok(())
}

/// Connects, runs the operation, and disconnects even when it fails.
fn with_connection<T>(
    engine: &DatabaseEngine,
    database: &str,
    operation: impl FnOnce(&Connection) -> Result<T, StoreError>,
) -> Result<T, Box<dyn std::error::Error>> {
    let conn = engine.connect(database)?;
    let result = operation(&conn);
    conn.disconnect()?;
    Ok(result?)
}

fn parse_object(json: &str, what: &str) -> Result<Row, Box<dyn std::error::Error>> {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(format!("{what} must be a JSON object").into()),
        Err(err) => Err(format!("{what} is not valid JSON: {err}").into()),
    }
}

fn print_rows(rows: &[Row]) {
    for row in rows {
        println!("{}", Value::Object(row.clone()));
    }
}
