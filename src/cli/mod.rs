//! Command-line interface: argument types, commands and output formatting.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands, ListArgs, RunArgs};

/// Print an error the way the selected output mode expects and exit.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", console::style("error:").red().bold());
    }
    std::process::exit(2);
}
