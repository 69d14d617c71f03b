//! Print the OpenAPI document as JSON.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use gratitude_backend::doc::ApiDoc;
use utoipa::OpenApi;

/// `openapi-dump` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "openapi-dump",
    about = "Render the journal API's OpenAPI document",
    version
)]
struct CliArgs {
    /// Write the document here instead of standard output.
    #[arg(long, short, value_name = "path")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .wrap_err("failed to serialise OpenAPI document")?;
    match args.output {
        Some(path) => fs::write(&path, json)
            .wrap_err_with(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
