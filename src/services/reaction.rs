//! Reaction lookups: participants of one reaction, and filtered search.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::Result;
use crate::graphdb::Repository;
use crate::sparql::{all_roles_values_block, literal, CK_NAMESPACE, CK_PREFIX};

/// A compound taking part in a reaction, with the reaction's patent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionParticipant {
    /// Property local name: `hasReactant`, `hasProduct`, `hasCatalyst`, `hasSolvent`, `hasAgent`
    pub role: String,
    pub identifier: Option<String>,
    pub label: Option<String>,
    /// e.g. `http://example.org/chemkg/patent/US03930839`
    pub patent_iri: Option<String>,
    /// e.g. `US03930839`
    pub patent_id: Option<String>,
}

fn reaction_participants_query(reaction_id: &str) -> String {
    format!(
        r#"{prefix}

SELECT
  ?role ?cmpIdentifier ?cmpLabel
  ?patent ?patentId
WHERE {{
  ?rxn ck:reactionId {reaction_id} .

  ?rxn ck:documentedIn ?patent .
  OPTIONAL {{ ?patent ck:hasPatentId ?patentId }}

  ?rxn ?prop ?cmp .

{roles}

  BIND(REPLACE(STR(?prop), "{ns}", "") AS ?role)

  OPTIONAL {{ ?cmp ck:smiles ?cmpIdentifier }}
  OPTIONAL {{ ?cmp ck:label  ?cmpLabel }}
}}
ORDER BY ?role ?cmpIdentifier
"#,
        prefix = CK_PREFIX,
        reaction_id = literal(reaction_id),
        roles = all_roles_values_block("  "),
        ns = CK_NAMESPACE,
    )
}

/// Participants of the reaction with `ck:reactionId` equal to `reaction_id`.
pub async fn get_reaction_participants(repo: &Repository, reaction_id: &str) -> Result<Vec<ReactionParticipant>> {
    let result = repo.select(&reaction_participants_query(reaction_id)).await?;

    let participants: Vec<ReactionParticipant> = result
        .rows()
        .iter()
        .map(|b| ReactionParticipant {
            role: b.string("role").unwrap_or_default(),
            identifier: b.string("cmpIdentifier"),
            label: b.string("cmpLabel"),
            patent_iri: b.string("patent"),
            patent_id: b.string("patentId"),
        })
        .collect();

    log::debug!("Reaction {}: {} participants", reaction_id, participants.len());
    Ok(participants)
}

/// Filters for [`search_reactions`]. Unset fields do not constrain the search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionSearchFilters {
    /// Free text matched against reaction id, SMILES, patent id, participant identifiers and labels
    #[serde(default)]
    pub text: Option<String>,
    /// Only reactions consuming this identifier
    #[serde(default)]
    pub reactant: Option<String>,
    /// Only reactions yielding this identifier
    #[serde(default)]
    pub product: Option<String>,
    /// `Some(true)` must have a catalyst, `Some(false)` must not
    #[serde(default)]
    pub require_catalyst: Option<bool>,
    #[serde(default)]
    pub require_solvent: Option<bool>,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_search_limit() -> usize {
    50
}

impl Default for ReactionSearchFilters {
    fn default() -> Self {
        Self {
            text: None,
            reactant: None,
            product: None,
            require_catalyst: None,
            require_solvent: None,
            limit: default_search_limit(),
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSearchResult {
    pub reaction_iri: String,
    pub reaction_id: Option<String>,
    pub reaction_smiles: Option<String>,
    pub patent_id: Option<String>,
    pub reactant_identifiers: Vec<String>,
    pub product_identifiers: Vec<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn exists_filter(var: &str, property: &str, identifier: &str) -> String {
    format!(
        "  FILTER EXISTS {{\n    ?rxn {property} ?{var} .\n    ?{var} ck:smiles {lit} .\n  }}",
        property = property,
        var = var,
        lit = literal(identifier),
    )
}

fn toggle_filter(require: Option<bool>, property: &str, var: &str) -> String {
    match require {
        Some(true) => format!("  FILTER EXISTS {{ ?rxn {} ?{} . }}", property, var),
        Some(false) => format!("  FILTER NOT EXISTS {{ ?rxn {} ?{} . }}", property, var),
        None => String::new(),
    }
}

/// Build the reaction search query.
pub fn build_reaction_search_query(filters: &ReactionSearchFilters) -> String {
    // empty string disables the text filter
    let term = non_blank(&filters.text)
        .map(|t| literal(&t.to_lowercase()))
        .unwrap_or_else(|| "\"\"".to_string());

    let constraints = [
        non_blank(&filters.reactant)
            .map(|r| exists_filter("r2", "ck:hasReactant", r))
            .unwrap_or_default(),
        non_blank(&filters.product)
            .map(|p| exists_filter("p2", "ck:hasProduct", p))
            .unwrap_or_default(),
        toggle_filter(filters.require_catalyst, "ck:hasCatalyst", "cat"),
        toggle_filter(filters.require_solvent, "ck:hasSolvent", "solv"),
    ]
    .into_iter()
    .filter(|c| !c.is_empty())
    .collect::<Vec<_>>()
    .join("\n");

    format!(
        r#"{prefix}

SELECT DISTINCT
  ?rxn
  ?reactionId
  ?reactionSmiles
  ?patentId
  (GROUP_CONCAT(DISTINCT ?rSmiles; separator=", ") AS ?reactantIdentifiers)
  (GROUP_CONCAT(DISTINCT ?pSmiles; separator=", ") AS ?productIdentifiers)
WHERE {{
  ?rxn a ck:Reaction .

  OPTIONAL {{ ?rxn ck:reactionId     ?reactionId . }}
  OPTIONAL {{ ?rxn ck:reactionSmiles ?reactionSmiles . }}
  OPTIONAL {{
    ?rxn ck:documentedIn ?patent .
    OPTIONAL {{ ?patent ck:hasPatentId ?patentId . }}
  }}

  OPTIONAL {{
    ?rxn ck:hasReactant ?r .
    OPTIONAL {{ ?r ck:smiles ?rSmiles . }}
    OPTIONAL {{ ?r ck:label  ?rLabel  . }}
  }}

  OPTIONAL {{
    ?rxn ck:hasProduct ?p .
    OPTIONAL {{ ?p ck:smiles ?pSmiles . }}
    OPTIONAL {{ ?p ck:label  ?pLabel  . }}
  }}

  BIND({term} AS ?q)

  FILTER(
      ?q = "" ||
      (BOUND(?reactionId)     && CONTAINS(LCASE(?reactionId),     ?q)) ||
      (BOUND(?reactionSmiles) && CONTAINS(LCASE(?reactionSmiles), ?q)) ||
      (BOUND(?patentId)       && CONTAINS(LCASE(?patentId),       ?q)) ||
      (BOUND(?rSmiles)        && CONTAINS(LCASE(?rSmiles),        ?q)) ||
      (BOUND(?pSmiles)        && CONTAINS(LCASE(?pSmiles),        ?q)) ||
      (BOUND(?rLabel)         && CONTAINS(LCASE(?rLabel),         ?q)) ||
      (BOUND(?pLabel)         && CONTAINS(LCASE(?pLabel),         ?q))
  )

{constraints}
}}
GROUP BY
  ?rxn ?reactionId ?reactionSmiles ?patentId
ORDER BY COALESCE(?reactionId, ?reactionSmiles)
LIMIT {limit}
OFFSET {offset}
"#,
        prefix = CK_PREFIX,
        term = term,
        constraints = constraints,
        limit = filters.limit,
        offset = filters.offset,
    )
}

fn group_concat_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*,\s*").expect("separator pattern is valid"))
}

/// Split a `GROUP_CONCAT(...; separator=", ")` value, dropping empty pieces.
pub fn split_concat(value: Option<&str>) -> Vec<String> {
    match value {
        Some(v) if !v.trim().is_empty() => group_concat_separator()
            .split(v.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Search reactions by text and structural filters.
pub async fn search_reactions(repo: &Repository, filters: &ReactionSearchFilters) -> Result<Vec<ReactionSearchResult>> {
    let result = repo.select(&build_reaction_search_query(filters)).await?;

    Ok(result
        .rows()
        .iter()
        .map(|b| ReactionSearchResult {
            reaction_iri: b.string("rxn").unwrap_or_default(),
            reaction_id: b.string("reactionId"),
            reaction_smiles: b.string("reactionSmiles"),
            patent_id: b.string("patentId"),
            reactant_identifiers: split_concat(b.value("reactantIdentifiers")),
            product_identifiers: split_concat(b.value("productIdentifiers")),
        })
        .collect())
}
