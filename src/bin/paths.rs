use clap::Parser;
use chemkg::services::{find_paths, get_multi_set_paths, FindPathsOptions};
use chemkg::{build_multi_set_path_query, Config, Repository};
use std::time::Instant;
use anyhow::Result;

#[derive(Parser, Debug)]
#[command(name = "paths")]
#[command(about = "Find reaction pathways from start compounds to target compounds")]
struct Args {
    /// Start compound identifier (repeatable)
    #[arg(short, long = "start", required = true)]
    starts: Vec<String>,

    /// Target compound identifier (repeatable)
    #[arg(short, long = "target", required = true)]
    targets: Vec<String>,

    /// Maximum reaction steps (defaults to paths.default_max_steps)
    #[arg(short, long)]
    max_steps: Option<usize>,

    /// Keep only the shortest path per start/target pair
    #[arg(long)]
    shortest_only: bool,

    /// Return full chains where every start feeds the first reaction
    #[arg(short, long)]
    detailed: bool,

    /// Print the detailed path query instead of running it
    #[arg(long)]
    print_query: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args = Args::parse();

    let config = Config::load()?;
    let max_steps = args.max_steps.unwrap_or(config.paths.default_max_steps);

    if args.print_query {
        println!("{}", build_multi_set_path_query(&args.starts, &args.targets, max_steps)?);
        return Ok(());
    }

    let repo = Repository::from_config(&config)?;
    let start = Instant::now();

    if args.detailed {
        let paths = get_multi_set_paths(&repo, &args.starts, &args.targets, max_steps).await?;
        log::info!("Found {} detailed path(s) in {:.2?}", paths.len(), start.elapsed());

        if paths.is_empty() {
            println!("No paths found within {} step(s).", max_steps);
            return Ok(());
        }

        for (i, path) in paths.iter().enumerate() {
            println!("\nPath {} ({} step(s)) -> {}", i + 1, path.step_count, path.target_identifier);
            for (step, (reaction, produced)) in path.reactions.iter().zip(&path.hop_products).enumerate() {
                let label = reaction
                    .id
                    .as_deref()
                    .or(reaction.iri.as_deref())
                    .unwrap_or("?");
                println!("  {}. {} => {}", step + 1, label, produced.as_deref().unwrap_or("?"));
            }
        }
        return Ok(());
    }

    let options = FindPathsOptions {
        starts: args.starts,
        targets: args.targets,
        max_steps,
        shortest_only: args.shortest_only,
    };
    let summaries = find_paths(&repo, &options).await?;
    log::info!("Found {} path(s) in {:.2?}", summaries.len(), start.elapsed());

    if summaries.is_empty() {
        println!("No paths found within {} step(s).", max_steps);
        return Ok(());
    }

    println!("{:-<80}", "");
    println!("{:<35} {:<35} {:>8}", "Start", "Target", "Steps");
    println!("{:-<80}", "");
    for s in &summaries {
        println!("{:<35} {:<35} {:>8}", s.start_identifier, s.target_identifier, s.steps);
    }
    println!("{:-<80}", "");

    Ok(())
}
