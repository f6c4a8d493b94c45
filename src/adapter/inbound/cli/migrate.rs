//! Handler for the `migrate` command.

use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::port::inbound::operator::port::OperatorPort;

/// Execute `migrate`.
pub fn execute(operator: &dyn OperatorPort, config_path: &Path) -> Result<()> {
    let database = operator.migrate(config_path)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "migrate",
            "database": database,
            "status": "ok",
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::success("Database schema is current");
    output::field("Database", database);
    Ok(())
}
