//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; a single route table dispatches to the library.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{format_replay_json, format_replay_text};
pub use route::RunContext;
