//! # slack2mm CLI
//!
//! Command-line interface for the slack2mm library.

use std::process;
use std::time::Instant;

use clap::Parser as ClapParser;
use log::info;

use slack2mm::MigrateError;
use slack2mm::cli::Args;
use slack2mm::core::{Transformer, write_bulk_import};
use slack2mm::parsing::ExportReader;

fn main() {
    let args = <Args as ClapParser>::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), MigrateError> {
    let total_start = Instant::now();
    args.prepare_paths()?;
    let config = args.to_config();

    println!("slack2mm v{}", env!("CARGO_PKG_VERSION"));
    println!("Team:    {}", args.team);
    println!("Export:  {}", args.file.display());
    println!("Output:  {}", args.output.display());
    if !config.skip_attachments {
        println!("Files:   {}", config.attachments_dir.display());
    }
    println!();

    let parse_start = Instant::now();
    let export = ExportReader::read(&args.file)?;
    info!("Export read in {:.2}s", parse_start.elapsed().as_secs_f64());

    let mut transformer = Transformer::new(&args.team);
    transformer.transform(&config, &export)?;

    write_bulk_import(&transformer.intermediate, &args.team, &args.output)?;

    let intermediate = &transformer.intermediate;
    let stats = &transformer.stats;
    println!("Done! Output saved to {}", args.output.display());
    println!();
    println!("Summary:");
    println!("   Users:     {}", intermediate.users_by_id.len());
    println!("   Channels:  {}", intermediate.channels().count());
    println!("   Threads:   {}", intermediate.posts.len());
    println!("   Posts:     {} ({} replies)", intermediate.post_count(), stats.replies);
    if stats.orphan_replies > 0 || stats.skipped > 0 {
        println!(
            "   Dropped:   {} orphan replies, {} skipped messages",
            stats.orphan_replies, stats.skipped
        );
    }
    println!("   Time:      {:.2}s", total_start.elapsed().as_secs_f64());

    Ok(())
}
