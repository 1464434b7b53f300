//! Database lifecycle commands.

use rowvault_core::DatabaseEngine;

/// Runs the create-db command.
pub fn create(engine: &DatabaseEngine, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    engine.create_database(name)?;
    println!("Database '{name}' created");
    Ok(())
}

/// Runs the delete-db command.
pub fn delete(engine: &DatabaseEngine, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    engine.delete_database(name)?;
    println!("Database '{name}' deleted");
    Ok(())
}

/// Runs the list command.
pub fn list(engine: &DatabaseEngine) -> Result<(), Box<dyn std::error::Error>> {
    for name in engine.databases()? {
        println!("{name}");
    }
    Ok(())
}
