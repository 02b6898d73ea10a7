use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use http_collection_tester::{
    execute_summary, parse_http_file, render_table, Collection, HyperTransport, Message,
};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "http-collection-tester")]
#[command(about = "Run a collection of HTTP requests and summarize the outcome", long_about = None)]
#[command(version)]
struct Cli {
    /// Collection file, e.g. `http-api/test.http`
    file: PathBuf,

    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

fn main() -> Result<ExitCode> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let transport = Arc::new(HyperTransport::new()?);
    let mut root: Collection<()> = parse_http_file(&cli.file, transport)?;

    let run = root.execute(&mut ());

    let summary = execute_summary(&root);
    match cli.format {
        Format::Table => print!("{}", render_table(&summary)),
        Format::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    run?;

    if root.success().is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        log::error!("{}: {}", root.name(), root.success());
        Ok(ExitCode::FAILURE)
    }
}
