//! SPARQL text generation for the chemkg vocabulary.
//!
//! Builders in this module are pure: they validate their inputs, escape every
//! interpolated literal and return query text. Nothing here talks to the
//! endpoint; see [`crate::graphdb`] for execution.

pub mod path;
pub mod path_find;

pub use path::{build_multi_set_path_query, ChainNode, Hop};
pub use path_find::build_path_summary_query;

use serde::{Deserialize, Serialize};

use crate::error::{ChemkgError, Result};

/// Namespace of the chemkg vocabulary.
pub const CK_NAMESPACE: &str = "http://example.org/chemkg#";

/// Prefix declaration placed at the top of every generated query.
pub const CK_PREFIX: &str = "PREFIX ck: <http://example.org/chemkg#>";

/// reaction -> compound it consumes
pub const CONSUMES: &str = "ck:hasReactant";
/// reaction -> compound it yields
pub const YIELDS: &str = "ck:hasProduct";
/// compound -> structure identifier string
pub const HAS_IDENTIFIER: &str = "ck:smiles";
/// reaction -> reaction id string
pub const REACTION_ID: &str = "ck:reactionId";

/// Escape backslash and double quote so `value` can sit inside a `"..."` literal.
pub fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Quoted, escaped string literal.
pub fn literal(value: &str) -> String {
    format!("\"{}\"", escape_literal(value))
}

/// Join escaped literals with `separator` (`" "` for VALUES, `", "` for IN).
pub fn literal_list(values: &[String], separator: &str) -> String {
    values
        .iter()
        .map(|v| literal(v))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Validate an IRI before it is interpolated as `<iri>`.
///
/// Rejects the characters that IRIREF excludes, so a caller-supplied IRI
/// cannot close the angle brackets early.
pub fn checked_iri(iri: &str) -> Result<&str> {
    let iri = iri.trim();
    if iri.is_empty() {
        return Err(ChemkgError::InvalidArgument("IRI must not be empty".to_string()));
    }
    if let Some(bad) = iri
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\'))
    {
        return Err(ChemkgError::InvalidArgument(format!(
            "IRI contains forbidden character {:?}: {}",
            bad, iri
        )));
    }
    Ok(iri)
}

/// Reaction participant roles, one per `ck:has*` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Reactant,
    Product,
    Catalyst,
    Solvent,
    Agent,
}

impl ParticipantRole {
    pub const ALL: [ParticipantRole; 5] = [
        ParticipantRole::Reactant,
        ParticipantRole::Product,
        ParticipantRole::Catalyst,
        ParticipantRole::Solvent,
        ParticipantRole::Agent,
    ];

    /// Local name of the property, e.g. `hasReactant`.
    pub fn local_name(&self) -> &'static str {
        match self {
            ParticipantRole::Reactant => "hasReactant",
            ParticipantRole::Product => "hasProduct",
            ParticipantRole::Catalyst => "hasCatalyst",
            ParticipantRole::Solvent => "hasSolvent",
            ParticipantRole::Agent => "hasAgent",
        }
    }

    /// Prefixed property name, e.g. `ck:hasReactant`.
    pub fn property(&self) -> String {
        format!("ck:{}", self.local_name())
    }

    /// Inverse of [`local_name`](Self::local_name); also accepts the full IRI.
    pub fn from_local_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix(CK_NAMESPACE).unwrap_or(name);
        Self::ALL.into_iter().find(|r| r.local_name() == name)
    }
}

/// `VALUES ?prop { ck:hasReactant ... }` over every role.
pub(crate) fn all_roles_values_block(indent: &str) -> String {
    let props = ParticipantRole::ALL
        .iter()
        .map(|r| format!("{}  {}", indent, r.property()))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}VALUES ?prop {{\n{}\n{}}}", indent, props, indent)
}
