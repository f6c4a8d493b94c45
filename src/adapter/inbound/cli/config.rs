//! Handler for the `check-config` command.

use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::port::inbound::operator::port::OperatorPort;

/// Execute `check-config`: load, validate and summarize a config file.
pub fn execute_check(operator: &dyn OperatorPort, path: &Path) -> Result<()> {
    let config = operator.check_config(path)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "check-config",
            "path": path.display().to_string(),
            "valid": true,
            "database": config.database_url,
            "platform_fee": config.platform_fee.to_string(),
            "top_n": config.top_n,
            "minimum_fund": config.minimum_fund.to_string(),
            "interval_secs": config.interval_secs,
            "max_concurrent_campaigns": config.max_concurrent_campaigns,
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::success(&format!("{} is valid", path.display()));

    output::section("Database");
    output::field("URL", &config.database_url);
    output::field("Pool size", config.pool_size);

    output::section("Ledger");
    output::field("Platform fee", config.platform_fee);
    output::field("Ref attempts", config.reference_attempts);

    output::section("Matching");
    output::field("Top N", config.top_n);
    output::field("Minimum fund", config.minimum_fund);

    output::section("Metering");
    output::field("Interval", format!("{}s", config.interval_secs));
    output::field("Concurrency", config.max_concurrent_campaigns);
    Ok(())
}
