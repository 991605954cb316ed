//! `ldq decode`: show a decoded query configuration.

use ldq_query::{FilterSpec, QuerySpec, ResultSpec};

use crate::cli::DecodeArgs;
use crate::config::OutputFormat;
use crate::output::{output, output_single, Setting};

/// Runs the decode command.
pub fn run_decode(args: &DecodeArgs, format: OutputFormat) -> crate::CliResult<()> {
    let spec = super::load_spec(&args.config)?;
    match format {
        OutputFormat::Table => output(&settings(&spec), format),
        _ => output_single(&spec, format),
    }
}

/// Flattens a specification into display lines. The password is masked.
pub fn settings(spec: &QuerySpec) -> Vec<Setting> {
    let server = &spec.server;
    let mut lines = vec![
        Setting::new("provider", server.vendor.provider_name()),
        Setting::new("url", server.url.as_str()),
        Setting::new("auth", server.auth_kind.as_str()),
        Setting::new("user", server.user_name.as_str()),
        Setting::new(
            "password",
            if server.password.is_empty() { "" } else { "********" },
        ),
        Setting::new("ssl", server.use_ssl.to_string()),
        Setting::new("context", server.default_context.as_str()),
        Setting::new("base object", spec.base_object.as_str()),
        Setting::new("scope", spec.scope.config_value()),
    ];

    match &spec.filter {
        FilterSpec::FreeText { template } => {
            lines.push(Setting::new("filter (text)", template.as_str()));
        }
        FilterSpec::AttributeTable { terms } => {
            for term in terms {
                lines.push(Setting::new(
                    format!("filter {}", term.attribute),
                    term.value.as_str(),
                ));
            }
        }
    }

    match &spec.result {
        ResultSpec::SingleRow { bindings } => {
            for binding in bindings {
                lines.push(Setting::new(
                    format!("result {}", binding.attribute),
                    binding.output.as_str(),
                ));
            }
            if spec.include_entry_name {
                lines.push(Setting::new("result entry name", spec.entry_name_output.as_str()));
            }
        }
        ResultSpec::MultiRow { attributes, output } => {
            lines.push(Setting::new("table output", output.as_str()));
            lines.push(Setting::new("table columns", spec.column_names().join(", ")));
            if let Some(sort) = &spec.sort_attribute {
                let order = if spec.sort_descending { "descending" } else { "ascending" };
                lines.push(Setting::new("sort", format!("{sort} ({order})")));
            }
            if attributes.is_empty() {
                lines.push(Setting::new("table attributes", "(none)"));
            }
        }
    }
    lines
}
