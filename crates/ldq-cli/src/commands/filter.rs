//! `ldq filter`: show the search a configuration would run.

use ldq_query::LdapQueryElement;

use crate::cli::FilterArgs;
use crate::config::OutputFormat;
use crate::output::{output, Setting};

/// Runs the filter command.
pub fn run_filter(args: &FilterArgs, format: OutputFormat) -> crate::CliResult<()> {
    let spec = super::load_spec(&args.config)?;
    let data = super::load_process_data(&args.vars)?;
    let element = LdapQueryElement::new().with_spec(spec);
    let prepared = element.prepare(&data);

    if matches!(format, OutputFormat::Quiet) {
        println!("{}", prepared.request.filter);
        return Ok(());
    }

    let lines = vec![
        Setting::new("url", prepared.server.effective_url()),
        Setting::new("base", prepared.request.base.as_str()),
        Setting::new("scope", prepared.request.scope.config_value()),
        Setting::new("filter", prepared.request.filter.as_str()),
        Setting::new("attributes", prepared.request.attributes.join(", ")),
    ];
    output(&lines, format)
}
