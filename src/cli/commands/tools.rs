//! tools command - print the tool catalog.

use anyhow::Result;

use crate::tools::list_tools;

/// Print every tool descriptor as a JSON array.
pub fn tools() -> Result<()> {
    let catalog = serde_json::to_string_pretty(&list_tools())?;
    println!("{}", catalog);
    Ok(())
}
