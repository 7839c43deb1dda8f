//! Compound lookups: how often a compound plays each role, the reactions it
//! appears in, and scored free-text search.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graphdb::{BindingRow, Repository};
use crate::sparql::{all_roles_values_block, checked_iri, literal, CK_NAMESPACE, CK_PREFIX};

/// Row cap for role reaction lists.
pub const ROLE_REACTIONS_LIMIT: usize = 200;

/// Default result count for [`search_compounds`].
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// How a compound is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompoundSelector {
    /// By IRI (preferred)
    Iri(String),
    /// By structure identifier
    Identifier(String),
}

impl CompoundSelector {
    /// Pattern binding `?compound`; also validates IRIs.
    fn pattern(&self) -> Result<String> {
        match self {
            CompoundSelector::Iri(iri) => Ok(format!("BIND(<{}> AS ?compound)", checked_iri(iri)?)),
            CompoundSelector::Identifier(id) => Ok(format!("?compound ck:smiles {} .", literal(id))),
        }
    }
}

/// Role counts for one compound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundRoleStats {
    pub compound_iri: String,
    pub identifier: Option<String>,
    pub label: Option<String>,
    /// Distinct reactions where it appears in any of the five roles
    pub total_roles: u64,
    pub as_reactant: u64,
    pub as_product: u64,
    pub as_solvent: u64,
    pub as_catalyst: u64,
    pub as_agent: u64,
}

/// One reaction a compound appears in, and in which role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundRoleReaction {
    /// `hasReactant`, `hasProduct`, `hasSolvent`, `hasCatalyst` or `hasAgent`
    pub role: String,
    pub reaction_iri: String,
    pub reaction_id: Option<String>,
}

pub fn build_role_stats_query(selector: &CompoundSelector) -> Result<String> {
    Ok(format!(
        r#"{prefix}

SELECT
  ?compound
  ?smiles
  ?label
  (COUNT(DISTINCT ?rxn) AS ?totalRoles)
  (SUM(?isReactant) AS ?asReactant)
  (SUM(?isProduct)  AS ?asProduct)
  (SUM(?isSolvent)  AS ?asSolvent)
  (SUM(?isCatalyst) AS ?asCatalyst)
  (SUM(?isAgent)    AS ?asAgent)
WHERE {{
  {select}

  OPTIONAL {{ ?compound ck:smiles ?smiles . }}
  OPTIONAL {{ ?compound ck:label  ?label  . }}

  ?rxn ?prop ?compound .

{roles}

  BIND(IF(?prop = ck:hasReactant, 1, 0) AS ?isReactant)
  BIND(IF(?prop = ck:hasProduct,  1, 0) AS ?isProduct)
  BIND(IF(?prop = ck:hasSolvent,  1, 0) AS ?isSolvent)
  BIND(IF(?prop = ck:hasCatalyst, 1, 0) AS ?isCatalyst)
  BIND(IF(?prop = ck:hasAgent,    1, 0) AS ?isAgent)
}}
GROUP BY ?compound ?smiles ?label
"#,
        prefix = CK_PREFIX,
        select = selector.pattern()?,
        roles = all_roles_values_block("  "),
    ))
}

pub fn build_role_reactions_query(selector: &CompoundSelector) -> Result<String> {
    Ok(format!(
        r#"{prefix}

SELECT DISTINCT
  ?role
  ?rxn
  ?reactionId
WHERE {{
  {select}

  ?rxn ?prop ?compound .

{roles}

  OPTIONAL {{ ?rxn ck:reactionId ?reactionId . }}

  BIND(REPLACE(STR(?prop), "{ns}", "") AS ?role)
}}
ORDER BY ?role ?reactionId
LIMIT {limit}
"#,
        prefix = CK_PREFIX,
        select = selector.pattern()?,
        roles = all_roles_values_block("  "),
        ns = CK_NAMESPACE,
        limit = ROLE_REACTIONS_LIMIT,
    ))
}

fn role_stats_from_row(b: &BindingRow, selector: &CompoundSelector) -> CompoundRoleStats {
    let (fallback_iri, fallback_identifier) = match selector {
        CompoundSelector::Iri(iri) => (iri.trim().to_string(), None),
        CompoundSelector::Identifier(id) => (String::new(), Some(id.clone())),
    };

    CompoundRoleStats {
        compound_iri: b.string("compound").unwrap_or(fallback_iri),
        identifier: b.string("smiles").or(fallback_identifier),
        label: b.string("label"),
        total_roles: b.count("totalRoles"),
        as_reactant: b.count("asReactant"),
        as_product: b.count("asProduct"),
        as_solvent: b.count("asSolvent"),
        as_catalyst: b.count("asCatalyst"),
        as_agent: b.count("asAgent"),
    }
}

/// Role counts for the selected compound; `None` when it takes part in no reaction.
pub async fn get_compound_role_stats(
    repo: &Repository,
    selector: &CompoundSelector,
) -> Result<Option<CompoundRoleStats>> {
    let result = repo.select(&build_role_stats_query(selector)?).await?;

    Ok(result.rows().first().map(|b| role_stats_from_row(b, selector)))
}

/// Reactions the selected compound appears in, by role.
pub async fn get_compound_role_reactions(
    repo: &Repository,
    selector: &CompoundSelector,
) -> Result<Vec<CompoundRoleReaction>> {
    let result = repo.select(&build_role_reactions_query(selector)?).await?;

    Ok(result
        .rows()
        .iter()
        .map(|b| CompoundRoleReaction {
            role: b.string("role").unwrap_or_default(),
            reaction_iri: b.string("rxn").unwrap_or_default(),
            reaction_id: b.string("reactionId"),
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundSearchResult {
    pub compound_iri: String,
    pub identifier: Option<String>,
    pub label: Option<String>,
    pub score: f64,
    pub reaction_count: u64,
}

/// Scored search. Per (compound, reaction) row: exact identifier 20, identifier
/// substring 10, label 8, reaction SMILES 4, reaction id 2, patent id 1.
pub fn build_compound_search_query(term: &str, limit: usize) -> String {
    format!(
        r#"{prefix}

SELECT
  ?compound
  ?smiles
  ?label
  (SUM(?matchScore) AS ?score)
  (COUNT(DISTINCT ?rxn) AS ?reactionCount)
WHERE {{
  BIND(LCASE({term}) AS ?q)

  ?compound a ck:Compound .
  OPTIONAL {{ ?compound ck:smiles ?smiles . }}
  OPTIONAL {{ ?compound ck:label  ?label  . }}

  OPTIONAL {{
    ?rxn (ck:hasReactant|ck:hasProduct|ck:hasAgent) ?compound .

    OPTIONAL {{ ?rxn ck:reactionSmiles ?rxnSmiles . }}
    OPTIONAL {{ ?rxn ck:reactionId     ?rxnId      . }}

    OPTIONAL {{
      ?rxn ck:documentedIn ?patent .
      OPTIONAL {{ ?patent ck:hasPatentId ?patentId }}
    }}
  }}

  BIND(
    IF(BOUND(?smiles) && LCASE(?smiles) = ?q,
       20,
       IF(BOUND(?smiles) && CONTAINS(LCASE(?smiles), ?q), 10, 0)
    )
    AS ?scoreSmiles
  )
  BIND(IF(BOUND(?label)     && CONTAINS(LCASE(?label), ?q),     8, 0) AS ?scoreLabel)
  BIND(IF(BOUND(?rxnSmiles) && CONTAINS(LCASE(?rxnSmiles), ?q), 4, 0) AS ?scoreRxnSmiles)
  BIND(IF(BOUND(?rxnId)     && CONTAINS(LCASE(?rxnId), ?q),     2, 0) AS ?scoreRxnId)
  BIND(IF(BOUND(?patentId)  && CONTAINS(LCASE(?patentId), ?q),  1, 0) AS ?scorePatent)

  BIND(
    (?scoreSmiles + ?scoreLabel + ?scoreRxnSmiles + ?scoreRxnId + ?scorePatent)
    AS ?matchScore
  )

  FILTER(?matchScore > 0)
}}
GROUP BY ?compound ?smiles ?label
HAVING (SUM(?matchScore) > 0)
ORDER BY DESC(?score) DESC(?reactionCount)
LIMIT {limit}
"#,
        prefix = CK_PREFIX,
        term = literal(term),
        limit = limit,
    )
}

/// Search compounds by a free-text or structure-like term.
///
/// A blank term returns no results without contacting the endpoint.
pub async fn search_compounds(repo: &Repository, term: &str, limit: usize) -> Result<Vec<CompoundSearchResult>> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let result = repo.select(&build_compound_search_query(trimmed, limit)).await?;

    let results: Vec<CompoundSearchResult> = result
        .rows()
        .iter()
        .map(|b| CompoundSearchResult {
            compound_iri: b.string("compound").unwrap_or_default(),
            identifier: b.string("smiles"),
            label: b.string("label"),
            score: b.parse::<f64>("score").unwrap_or(0.0),
            reaction_count: b.count("reactionCount"),
        })
        .collect();

    log::debug!("search_compounds '{}': {} results", trimmed, results.len());
    Ok(results)
}
