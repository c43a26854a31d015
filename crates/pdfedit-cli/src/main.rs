mod cli;
mod extract_cmd;
mod reconstruct_cmd;
mod resolve_font_cmd;
mod roundtrip_cmd;
mod shared;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        cli::Commands::Extract {
            ref file,
            ref output,
            pretty,
            no_images,
            max_pages,
        } => extract_cmd::run(file, output.as_deref(), pretty, no_images, max_pages),
        cli::Commands::Reconstruct {
            ref record,
            ref output,
            no_compress,
        } => reconstruct_cmd::run(record, output, no_compress),
        cli::Commands::Roundtrip {
            ref file,
            ref output,
        } => roundtrip_cmd::run(file, output),
        cli::Commands::ResolveFont {
            ref name,
            bold,
            italic,
        } => resolve_font_cmd::run(name, bold, italic),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
