//! Dashboard overviews: graph totals and the short ranked lists.

use serde::{Deserialize, Serialize};

use crate::error::{ChemkgError, Result};
use crate::graphdb::Repository;
use crate::sparql::CK_PREFIX;

pub const TOP_SOLVENTS_LIMIT: usize = 20;
pub const RECENT_REACTIONS_LIMIT: usize = 20;
pub const POPULAR_COMPOUNDS_LIMIT: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_reactions: u64,
    pub total_compounds: u64,
    pub patents_covered: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopSolvent {
    pub solvent_iri: String,
    pub identifier: Option<String>,
    pub label: Option<String>,
    pub times_used: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentReaction {
    pub reaction_iri: String,
    pub reaction_id: Option<String>,
    pub year: Option<i32>,
    pub reaction_smiles: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularCompound {
    pub compound_iri: String,
    pub identifier: Option<String>,
    pub label: Option<String>,
    pub reactions_involved: u64,
}

fn dashboard_stats_query() -> String {
    format!(
        r#"{prefix}

SELECT
  (COUNT(DISTINCT ?rxn) AS ?totalReactions)
  (COUNT(DISTINCT ?cmp) AS ?totalCompounds)
  (COUNT(DISTINCT ?pat) AS ?totalPatents)
WHERE {{
  {{ ?rxn a ck:Reaction . }}
  UNION
  {{ ?cmp a ck:Compound . }}
  UNION
  {{ ?pat a ck:Patent . }}
}}
"#,
        prefix = CK_PREFIX
    )
}

fn top_solvents_query() -> String {
    format!(
        r#"{prefix}

SELECT
  ?solvent
  ?smiles
  ?label
  (COUNT(DISTINCT ?rxn) AS ?timesUsed)
WHERE {{
  ?rxn ck:hasSolvent ?solvent .

  OPTIONAL {{ ?solvent ck:smiles ?smiles }}
  OPTIONAL {{ ?solvent ck:label  ?label  }}
}}
GROUP BY ?solvent ?smiles ?label
ORDER BY DESC(?timesUsed)
LIMIT {limit}
"#,
        prefix = CK_PREFIX,
        limit = TOP_SOLVENTS_LIMIT,
    )
}

fn recent_reactions_query() -> String {
    format!(
        r#"{prefix}

SELECT
  ?rxn
  ?reactionId
  ?year
  ?reactionSmiles
WHERE {{
  ?rxn a ck:Reaction .

  OPTIONAL {{ ?rxn ck:reactionId     ?reactionId }}
  OPTIONAL {{ ?rxn ck:year           ?year }}
  OPTIONAL {{ ?rxn ck:reactionSmiles ?reactionSmiles }}
}}
ORDER BY DESC(?year) DESC(?reactionId)
LIMIT {limit}
"#,
        prefix = CK_PREFIX,
        limit = RECENT_REACTIONS_LIMIT,
    )
}

fn popular_compounds_query() -> String {
    format!(
        r#"{prefix}

SELECT
  ?compound
  ?smiles
  ?label
  (COUNT(DISTINCT ?rxn) AS ?reactionsInvolved)
WHERE {{
  ?rxn a ck:Reaction ;
       ?roleProp ?compound .

  FILTER(?roleProp IN (
    ck:hasReactant,
    ck:hasProduct,
    ck:hasSolvent,
    ck:hasCatalyst
  ))

  OPTIONAL {{ ?compound ck:smiles ?smiles }}
  OPTIONAL {{ ?compound ck:label  ?label  }}
}}
GROUP BY ?compound ?smiles ?label
ORDER BY DESC(?reactionsInvolved)
LIMIT {limit}
"#,
        prefix = CK_PREFIX,
        limit = POPULAR_COMPOUNDS_LIMIT,
    )
}

/// Distinct reactions, compounds and patents in the graph.
pub async fn get_dashboard_stats(repo: &Repository) -> Result<DashboardStats> {
    let result = repo.select(&dashboard_stats_query()).await?;

    let b = result
        .rows()
        .first()
        .ok_or_else(|| ChemkgError::Parse("no dashboard stats returned".to_string()))?;

    Ok(DashboardStats {
        total_reactions: b.count("totalReactions"),
        total_compounds: b.count("totalCompounds"),
        patents_covered: b.count("totalPatents"),
    })
}

pub async fn get_top_solvents(repo: &Repository) -> Result<Vec<TopSolvent>> {
    let result = repo.select(&top_solvents_query()).await?;

    Ok(result
        .rows()
        .iter()
        .map(|b| TopSolvent {
            solvent_iri: b.string("solvent").unwrap_or_default(),
            identifier: b.string("smiles"),
            label: b.string("label"),
            times_used: b.count("timesUsed"),
        })
        .collect())
}

pub async fn get_recent_reactions(repo: &Repository) -> Result<Vec<RecentReaction>> {
    let result = repo.select(&recent_reactions_query()).await?;

    Ok(result
        .rows()
        .iter()
        .map(|b| RecentReaction {
            reaction_iri: b.string("rxn").unwrap_or_default(),
            reaction_id: b.string("reactionId"),
            year: b.parse::<i32>("year"),
            reaction_smiles: b.string("reactionSmiles"),
        })
        .collect())
}

pub async fn get_popular_compounds(repo: &Repository) -> Result<Vec<PopularCompound>> {
    let result = repo.select(&popular_compounds_query()).await?;

    Ok(result
        .rows()
        .iter()
        .map(|b| PopularCompound {
            compound_iri: b.string("compound").unwrap_or_default(),
            identifier: b.string("smiles"),
            label: b.string("label"),
            reactions_involved: b.count("reactionsInvolved"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphdb::testing::{repository, row, rows, MockExecutor};

    #[tokio::test]
    async fn test_dashboard_stats() {
        let mock = MockExecutor::with_results(vec![rows(vec![row(&[
            ("totalReactions", "1200"),
            ("totalCompounds", "3400"),
            ("totalPatents", "56"),
        ])])]);
        let repo = repository(mock.clone());

        let stats = get_dashboard_stats(&repo).await.unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                total_reactions: 1200,
                total_compounds: 3400,
                patents_covered: 56,
            }
        );
        assert!(mock.last_query().unwrap().contains("{ ?pat a ck:Patent . }"));
    }

    #[tokio::test]
    async fn test_dashboard_stats_empty_is_parse_error() {
        let mock = MockExecutor::with_results(vec![rows(vec![])]);
        let repo = repository(mock);

        let err = get_dashboard_stats(&repo).await.unwrap_err();
        assert!(matches!(err, ChemkgError::Parse(ref m) if m == "no dashboard stats returned"));
    }

    #[tokio::test]
    async fn test_top_solvents() {
        let mock = MockExecutor::with_results(vec![rows(vec![
            row(&[("solvent", "urn:water"), ("smiles", "O"), ("timesUsed", "41")]),
            row(&[("solvent", "urn:thf"), ("label", "THF"), ("timesUsed", "7")]),
        ])]);
        let repo = repository(mock.clone());

        let solvents = get_top_solvents(&repo).await.unwrap();
        assert_eq!(solvents.len(), 2);
        assert_eq!(solvents[0].identifier.as_deref(), Some("O"));
        assert_eq!(solvents[0].times_used, 41);
        assert_eq!(solvents[1].identifier, None);
        assert!(mock.last_query().unwrap().contains("LIMIT 20"));
    }

    #[tokio::test]
    async fn test_recent_reactions_year_is_optional() {
        let mock = MockExecutor::with_results(vec![rows(vec![
            row(&[("rxn", "urn:r1"), ("reactionId", "R1"), ("year", "1976")]),
            row(&[("rxn", "urn:r2")]),
        ])]);
        let repo = repository(mock);

        let recent = get_recent_reactions(&repo).await.unwrap();
        assert_eq!(recent[0].year, Some(1976));
        assert_eq!(recent[1].year, None);
        assert_eq!(recent[1].reaction_id, None);
    }

    #[tokio::test]
    async fn test_popular_compounds() {
        let mock = MockExecutor::with_results(vec![rows(vec![row(&[
            ("compound", "urn:c1"),
            ("smiles", "CCO"),
            ("reactionsInvolved", "9"),
        ])])]);
        let repo = repository(mock.clone());

        let popular = get_popular_compounds(&repo).await.unwrap();
        assert_eq!(popular[0].reactions_involved, 9);
        let query = mock.last_query().unwrap();
        assert!(query.contains("LIMIT 30"));
        assert!(!query.contains("ck:hasAgent"));
    }
}
