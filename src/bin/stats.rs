use chemkg::services::{get_dashboard_stats, get_popular_compounds, get_recent_reactions, get_top_solvents};
use chemkg::{Config, Repository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    let repo = Repository::from_config(&config)?;

    println!("\n=== ChemKG Repository Statistics ===\n");

    let (stats, solvents, recent, popular) = tokio::try_join!(
        get_dashboard_stats(&repo),
        get_top_solvents(&repo),
        get_recent_reactions(&repo),
        get_popular_compounds(&repo),
    )?;

    println!("Repository: {} @ {}\n", config.graphdb.repository, config.graphdb.base_url);
    println!("  Reactions:  {:>10}", stats.total_reactions);
    println!("  Compounds:  {:>10}", stats.total_compounds);
    println!("  Patents:    {:>10}", stats.patents_covered);

    println!("\nTop Solvents:\n");
    println!("{:-<80}", "");
    println!("{:<30} {:<35} {:>12}", "Identifier", "Label", "Reactions");
    println!("{:-<80}", "");
    for s in &solvents {
        println!(
            "{:<30} {:<35} {:>12}",
            s.identifier.as_deref().unwrap_or("-"),
            s.label.as_deref().unwrap_or(""),
            s.times_used
        );
    }

    println!("\nRecent Reactions:\n");
    println!("{:-<80}", "");
    println!("{:<25} {:>6}  {}", "Reaction", "Year", "SMILES");
    println!("{:-<80}", "");
    for r in &recent {
        let year = r.year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<25} {:>6}  {}",
            r.reaction_id.as_deref().unwrap_or(&r.reaction_iri),
            year,
            r.reaction_smiles.as_deref().unwrap_or("")
        );
    }

    println!("\nPopular Compounds:\n");
    println!("{:-<80}", "");
    println!("{:<30} {:<35} {:>12}", "Identifier", "Label", "Reactions");
    println!("{:-<80}", "");
    for c in &popular {
        println!(
            "{:<30} {:<35} {:>12}",
            c.identifier.as_deref().unwrap_or("-"),
            c.label.as_deref().unwrap_or(""),
            c.reactions_involved
        );
    }
    println!();

    Ok(())
}
