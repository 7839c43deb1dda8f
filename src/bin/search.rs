use clap::{Parser, Subcommand};
use chemkg::services::compound::DEFAULT_SEARCH_LIMIT;
use chemkg::services::{search_compounds, search_reactions, ReactionSearchFilters};
use chemkg::{Config, Repository};
use anyhow::Result;

#[derive(Parser, Debug)]
#[command(name = "search")]
#[command(about = "Search compounds and reactions in the knowledge graph")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scored compound search by identifier, label, reaction or patent text
    Compounds {
        term: String,

        #[arg(short, long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Reaction search with structural filters
    Reactions {
        /// Free text matched against ids, SMILES, patents and labels
        #[arg(long)]
        text: Option<String>,

        /// Only reactions consuming this identifier
        #[arg(long)]
        reactant: Option<String>,

        /// Only reactions yielding this identifier
        #[arg(long)]
        product: Option<String>,

        /// Require (true) or exclude (false) a catalyst
        #[arg(long)]
        catalyst: Option<bool>,

        /// Require (true) or exclude (false) a solvent
        #[arg(long)]
        solvent: Option<bool>,

        #[arg(short, long, default_value_t = 50)]
        limit: usize,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args = Args::parse();
    let config = Config::load()?;
    let repo = Repository::from_config(&config)?;

    match args.command {
        Command::Compounds { term, limit } => {
            let results = search_compounds(&repo, &term, limit).await?;
            if results.is_empty() {
                println!("No compounds found for '{}'.", term.trim());
                return Ok(());
            }

            println!("{:-<100}", "");
            println!("{:>6} {:>8}  {:<40} {}", "Score", "Rxns", "Identifier", "Label");
            println!("{:-<100}", "");
            for r in &results {
                println!(
                    "{:>6.0} {:>8}  {:<40} {}",
                    r.score,
                    r.reaction_count,
                    r.identifier.as_deref().unwrap_or("-"),
                    r.label.as_deref().unwrap_or("")
                );
            }
        }
        Command::Reactions {
            text,
            reactant,
            product,
            catalyst,
            solvent,
            limit,
            offset,
        } => {
            let filters = ReactionSearchFilters {
                text,
                reactant,
                product,
                require_catalyst: catalyst,
                require_solvent: solvent,
                limit,
                offset,
            };
            let results = search_reactions(&repo, &filters).await?;
            if results.is_empty() {
                println!("No reactions matched.");
                return Ok(());
            }

            for r in &results {
                println!(
                    "{} [{}]",
                    r.reaction_id.as_deref().unwrap_or(&r.reaction_iri),
                    r.patent_id.as_deref().unwrap_or("no patent")
                );
                println!(
                    "  {} >> {}",
                    r.reactant_identifiers.join(" + "),
                    r.product_identifiers.join(" + ")
                );
            }
        }
    }

    Ok(())
}
