//! Command implementations.

pub mod config;
pub mod decode;
pub mod encode;
pub mod filter;
pub mod run;

pub use config::run_config;
pub use decode::run_decode;
pub use encode::run_encode;
pub use filter::run_filter;
pub use run::run_query;

use std::path::Path;

use ldq_query::{ProcessData, QuerySpec};

use crate::cli::VarArgs;

/// Reads and decodes a query configuration file.
pub fn load_spec(path: &Path) -> crate::CliResult<QuerySpec> {
    let text = std::fs::read_to_string(path)?;
    Ok(QuerySpec::decode(&text)?)
}

/// Builds process data from a JSON file and `--var` assignments.
///
/// Assignments create missing parent records along their path.
pub fn load_process_data(args: &VarArgs) -> crate::CliResult<ProcessData> {
    let mut root = match &args.vars {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => serde_json::Value::Object(serde_json::Map::new()),
    };

    for assignment in &args.var {
        let (path, value) = assignment.split_once('=').ok_or_else(|| {
            crate::CliError::InvalidArgument(format!(
                "expected PATH=VALUE, got '{assignment}'"
            ))
        })?;
        assign(&mut root, path.trim(), value)?;
    }

    Ok(serde_json::from_value(root)?)
}

fn assign(root: &mut serde_json::Value, path: &str, value: &str) -> crate::CliResult<()> {
    let path = path.strip_prefix("in.").unwrap_or(path);
    let mut segments: Vec<&str> = path.split('.').collect();
    let field = segments.pop().unwrap_or_default();
    if field.is_empty() {
        return Err(crate::CliError::InvalidArgument(format!(
            "empty variable name in '{path}'"
        )));
    }

    let mut current = root;
    for segment in segments {
        let serde_json::Value::Object(map) = current else {
            return Err(crate::CliError::InvalidArgument(format!(
                "'{path}' runs through a non-record value"
            )));
        };
        current = map
            .entry(segment)
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
    }

    match current {
        serde_json::Value::Object(map) => {
            map.insert(field.to_string(), serde_json::Value::String(value.to_string()));
            Ok(())
        }
        _ => Err(crate::CliError::InvalidArgument(format!(
            "'{path}' runs through a non-record value"
        ))),
    }
}
