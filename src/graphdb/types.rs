//! SPARQL 1.1 Query Results JSON Format.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{ChemkgError, Result};

/// Full result document: `{"head": {"vars": [...]}, "results": {"bindings": [...]}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparqlJsonResult {
    #[serde(default)]
    pub head: ResultHead,
    #[serde(default)]
    pub results: ResultBindings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultHead {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBindings {
    #[serde(default)]
    pub bindings: Vec<BindingRow>,
}

/// A single RDF term in a binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RdfTerm {
    /// `uri`, `literal`, `bnode` (or `typed-literal` from older endpoints)
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

impl RdfTerm {
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: "literal".to_string(),
            value: value.into(),
            lang: None,
            datatype: None,
        }
    }

    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: "uri".to_string(),
            value: value.into(),
            lang: None,
            datatype: None,
        }
    }
}

/// One solution: variable name -> bound term. Unbound variables are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingRow(pub HashMap<String, RdfTerm>);

impl BindingRow {
    pub fn get(&self, name: &str) -> Option<&RdfTerm> {
        self.0.get(name)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|t| t.value.as_str())
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.value(name).map(str::to_string)
    }

    /// Bound value, or a [`ChemkgError::Parse`] naming the missing variable.
    pub fn required(&self, name: &str) -> Result<&str> {
        self.value(name)
            .ok_or_else(|| ChemkgError::Parse(format!("missing '{}' binding in result row", name)))
    }

    /// Parse a bound value; `None` when unbound or unparsable.
    pub fn parse<T: FromStr>(&self, name: &str) -> Option<T> {
        self.value(name).and_then(|v| v.trim().parse().ok())
    }

    /// Lenient count: missing or unparsable values count as 0.
    /// Decimal values (e.g. `3.0` from SUM over decimals) are truncated.
    pub fn count(&self, name: &str) -> u64 {
        self.parse::<u64>(name)
            .or_else(|| self.parse::<f64>(name).filter(|v| v.is_finite() && *v >= 0.0).map(|v| v as u64))
            .unwrap_or(0)
    }

    /// Strict count: the variable must be bound to a non-negative number.
    pub fn required_count(&self, name: &str) -> Result<u64> {
        let raw = self.required(name)?;
        raw.trim()
            .parse::<u64>()
            .map_err(|_| ChemkgError::Parse(format!("'{}' is not a count: {}", name, raw)))
    }
}

impl<K: Into<String>> FromIterator<(K, RdfTerm)> for BindingRow {
    fn from_iter<I: IntoIterator<Item = (K, RdfTerm)>>(iter: I) -> Self {
        BindingRow(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl SparqlJsonResult {
    /// Build a result from rows; `vars` is the SELECT projection.
    pub fn from_rows(vars: &[&str], rows: Vec<BindingRow>) -> Self {
        Self {
            head: ResultHead {
                vars: vars.iter().map(|v| v.to_string()).collect(),
            },
            results: ResultBindings { bindings: rows },
        }
    }

    pub fn rows(&self) -> &[BindingRow] {
        &self.results.bindings
    }
}
