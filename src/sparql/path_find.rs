//! Summary path query: which (start, target) pairs are connected, and in how
//! many reaction steps. Uses property paths instead of named intermediates.

use crate::error::Result;
use crate::sparql::path::validate_path_inputs;
use crate::sparql::{literal_list, CK_PREFIX, CONSUMES, HAS_IDENTIFIER, YIELDS};

/// Row cap applied by the summary query.
pub const PATH_SUMMARY_LIMIT: usize = 200;

/// Build the summary query returning `?start_identifier ?target_identifier ?steps`.
///
/// Same validation as [`build_multi_set_path_query`](super::build_multi_set_path_query).
pub fn build_path_summary_query(starts: &[String], targets: &[String], max_steps: usize) -> Result<String> {
    validate_path_inputs(starts, targets, max_steps)?;

    let hop = format!("(^{}/{})", CONSUMES, YIELDS);
    let branches = (1..=max_steps)
        .map(|steps| {
            let path = vec![hop.as_str(); steps].join("/");
            format!(
                "  {{\n    ?start {} ?target .\n    BIND({} AS ?steps)\n  }}",
                path, steps
            )
        })
        .collect::<Vec<_>>()
        .join("\n  UNION\n");

    Ok(format!(
        r#"{prefix}

SELECT DISTINCT
  ?start_identifier
  ?target_identifier
  ?steps
WHERE {{
  VALUES ?start_identifier {{ {starts} }}
  VALUES ?target_identifier {{ {targets} }}

  ?start  {has_id} ?start_identifier .
  ?target {has_id} ?target_identifier .

{branches}
}}
ORDER BY ?steps
LIMIT {limit}
"#,
        prefix = CK_PREFIX,
        starts = literal_list(starts, " "),
        targets = literal_list(targets, " "),
        has_id = HAS_IDENTIFIER,
        branches = branches,
        limit = PATH_SUMMARY_LIMIT,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChemkgError;

    fn s(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_summary_validation() {
        assert!(matches!(
            build_path_summary_query(&[], &s(&["B"]), 1),
            Err(ChemkgError::InvalidArgument(_))
        ));
        assert!(matches!(
            build_path_summary_query(&s(&["A"]), &s(&["B"]), 0),
            Err(ChemkgError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_summary_property_path_lengths() {
        let query = build_path_summary_query(&s(&["A", "B"]), &s(&["C"]), 2).unwrap();
        assert!(query.contains("?start (^ck:hasReactant/ck:hasProduct) ?target ."));
        assert!(query.contains(
            "?start (^ck:hasReactant/ck:hasProduct)/(^ck:hasReactant/ck:hasProduct) ?target ."
        ));
        assert!(query.contains("BIND(2 AS ?steps)"));
        assert_eq!(query.matches("UNION").count(), 1);
        assert!(query.contains("VALUES ?start_identifier { \"A\" \"B\" }"));
        assert!(query.contains("ORDER BY ?steps\nLIMIT 200"));
    }
}
