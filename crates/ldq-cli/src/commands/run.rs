//! `ldq run`: run a query and print the resulting process data.

use ldq_query::{
    DirectoryConnector, LdapQueryElement, ProcessData, QuerySpec, ReplayDirectory, ResultSpec,
    Value,
};

use crate::cli::RunArgs;
use crate::config::OutputFormat;
use crate::output::{info, output, output_single, render_grid, warning, Setting};
use crate::CliConfig;

/// Runs a query against the configured server, or against a fixture.
pub async fn run_query(
    args: &RunArgs,
    config: &CliConfig,
    server_override: Option<&str>,
    format: OutputFormat,
) -> crate::CliResult<()> {
    let mut spec = super::load_spec(&args.config)?;
    config.apply_overrides(&mut spec.server, server_override);
    let mut data = super::load_process_data(&args.vars)?;

    match &args.entries {
        Some(path) => {
            let directory = ReplayDirectory::from_json(&std::fs::read_to_string(path)?)?;
            tracing::debug!(entries = directory.entries().len(), "serving entries from fixture");
            perform(LdapQueryElement::with_connector(directory), &spec, &mut data).await?;
        }
        None => {
            if matches!(spec.server.effective_url().as_str(), "ldap://" | "ldaps://") {
                warning("No directory host configured; pass --server or set server_url.");
            }
            perform(LdapQueryElement::new(), &spec, &mut data).await?;
        }
    }

    show(&spec, &data, format)
}

async fn perform<C: DirectoryConnector>(
    element: LdapQueryElement<C>,
    spec: &QuerySpec,
    data: &mut ProcessData,
) -> crate::CliResult<()> {
    element.with_spec(spec.clone()).perform(data).await?;
    Ok(())
}

fn show(spec: &QuerySpec, data: &ProcessData, format: OutputFormat) -> crate::CliResult<()> {
    if !matches!(format, OutputFormat::Table) {
        return output_single(data, format);
    }

    match &spec.result {
        ResultSpec::MultiRow { output: slot, .. } => match data.get(slot) {
            Some(Value::Recordset(rs)) => {
                let rows: Vec<Vec<String>> = rs
                    .rows
                    .iter()
                    .map(|row| row.iter().map(ToString::to_string).collect())
                    .collect();
                println!("{}", render_grid(&rs.columns, &rows));
            }
            Some(Value::List(rows)) if !rows.is_empty() => {
                let rows: Vec<Vec<String>> = rows.iter().map(row_cells).collect();
                println!("{}", render_grid(&spec.column_names(), &rows));
            }
            _ => info("No results found."),
        },
        ResultSpec::SingleRow { bindings } => {
            let mut lines: Vec<Setting> = bindings
                .iter()
                .map(|b| Setting::new(b.output.as_str(), display(data.get(&b.output))))
                .collect();
            if spec.include_entry_name {
                lines.push(Setting::new(
                    spec.entry_name_output.as_str(),
                    display(data.get(&spec.entry_name_output)),
                ));
            }
            output(&lines, format)?;
        }
    }
    Ok(())
}

fn row_cells(row: &Value) -> Vec<String> {
    match row {
        Value::List(cells) => cells.iter().map(ToString::to_string).collect(),
        other => vec![other.to_string()],
    }
}

fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "(no value)".to_string(),
        Some(v) => v.to_string(),
    }
}
