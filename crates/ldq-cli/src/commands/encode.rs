//! `ldq encode`: write a JSON specification as configuration text.

use ldq_query::QuerySpec;

use crate::cli::EncodeArgs;
use crate::output::success;

/// Runs the encode command.
pub fn run_encode(args: &EncodeArgs) -> crate::CliResult<()> {
    let json = std::fs::read_to_string(&args.spec)?;
    let spec: QuerySpec = serde_json::from_str(&json)?;
    let text = spec.encode();

    match &args.out {
        Some(path) => {
            std::fs::write(path, text)?;
            success(&format!("Configuration written to {}", path.display()));
        }
        None => print!("{text}"),
    }
    Ok(())
}
