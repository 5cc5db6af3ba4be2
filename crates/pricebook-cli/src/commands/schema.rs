use std::process::ExitCode;

use pricebook_core::{Warehouse, RECORDS_TABLE};
use serde_json::json;

use crate::commands::print_json;
use crate::config::ServiceConfig;
use crate::error::CliError;

pub fn run(config: &ServiceConfig) -> Result<ExitCode, CliError> {
    let warehouse = Warehouse::open(config.warehouse.clone())?;
    let columns = warehouse.describe_records_table();
    warehouse.close();
    let columns = columns?;

    print_json(
        &json!({
            "table": RECORDS_TABLE,
            "db_path": config.warehouse.db_path,
            "columns": columns,
        }),
        true,
    )?;
    Ok(ExitCode::SUCCESS)
}
