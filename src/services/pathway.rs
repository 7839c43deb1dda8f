//! Pathway search: summary reachability and detailed multi-set chains.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;
use crate::graphdb::{BindingRow, Repository};
use crate::sparql::path::{mid_identifier_column, reaction_column, reaction_id_column, TARGET_IDENTIFIER_COLUMN};
use crate::sparql::{build_multi_set_path_query, build_path_summary_query};

/// One reachable (start, target) pair and the number of reaction steps between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSummary {
    pub start_identifier: String,
    pub target_identifier: String,
    pub steps: usize,
}

/// Request for [`find_paths`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindPathsOptions {
    pub starts: Vec<String>,
    pub targets: Vec<String>,
    pub max_steps: usize,
    /// Keep only the fewest-steps row per (start, target) pair
    #[serde(default)]
    pub shortest_only: bool,
}

/// A reaction at one hop of a detailed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRef {
    pub iri: Option<String>,
    pub id: Option<String>,
}

/// One concrete chain returned by the multi-set path query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedPath {
    /// The input start set (not per row)
    pub starts: Vec<String>,
    pub target_identifier: String,
    /// Intermediate identifiers in chain order, `step_count - 1` at most
    pub intermediates: Vec<String>,
    pub reactions: Vec<ReactionRef>,
    /// What each hop yields, by position: `mid_i` for hop `i`, the target for
    /// the last hop. `None` where the row left a middle compound unbound.
    pub hop_products: Vec<Option<String>>,
    pub step_count: usize,
}

/// Find which starts reach which targets within `max_steps` reactions.
///
/// Without `shortest_only` rows come back in endpoint order (the query asks
/// for ascending steps). With it, one row per pair is kept and the result is
/// sorted by steps, then start, then target.
pub async fn find_paths(repo: &Repository, options: &FindPathsOptions) -> Result<Vec<PathSummary>> {
    let query = build_path_summary_query(&options.starts, &options.targets, options.max_steps)?;
    let result = repo.select(&query).await?;

    let rows = result
        .rows()
        .iter()
        .map(summary_from_row)
        .collect::<Result<Vec<_>>>()?;

    log::debug!("find_paths: {} rows (shortest_only={})", rows.len(), options.shortest_only);

    if options.shortest_only {
        Ok(shortest_per_pair(rows))
    } else {
        Ok(rows)
    }
}

fn summary_from_row(row: &BindingRow) -> Result<PathSummary> {
    Ok(PathSummary {
        start_identifier: row.required("start_identifier")?.to_string(),
        target_identifier: row.required("target_identifier")?.to_string(),
        steps: row.required_count("steps")? as usize,
    })
}

/// Minimum-steps row for each (start, target) pair.
pub fn shortest_per_pair(rows: Vec<PathSummary>) -> Vec<PathSummary> {
    let mut best: HashMap<(String, String), PathSummary> = HashMap::new();

    for row in rows {
        let key = (row.start_identifier.clone(), row.target_identifier.clone());
        match best.get(&key) {
            Some(existing) if existing.steps <= row.steps => {}
            _ => {
                best.insert(key, row);
            }
        }
    }

    let mut out: Vec<PathSummary> = best.into_values().collect();
    out.sort_by(|a, b| {
        a.steps
            .cmp(&b.steps)
            .then_with(|| a.start_identifier.cmp(&b.start_identifier))
            .then_with(|| a.target_identifier.cmp(&b.target_identifier))
    });
    out
}

/// Run the multi-set path query and reshape each row into a [`DetailedPath`].
pub async fn get_multi_set_paths(
    repo: &Repository,
    starts: &[String],
    targets: &[String],
    max_steps: usize,
) -> Result<Vec<DetailedPath>> {
    let query = build_multi_set_path_query(starts, targets, max_steps)?;
    let result = repo.select(&query).await?;

    let paths: Vec<DetailedPath> = result
        .rows()
        .iter()
        .filter_map(|row| detailed_path_from_row(row, starts, targets, max_steps))
        .collect();

    log::debug!(
        "get_multi_set_paths: {} of {} rows kept",
        paths.len(),
        result.rows().len()
    );
    Ok(paths)
}

/// `None` when the row binds no reaction at all.
pub fn detailed_path_from_row(
    row: &BindingRow,
    starts: &[String],
    targets: &[String],
    max_steps: usize,
) -> Option<DetailedPath> {
    let step_count = (1..=max_steps)
        .rev()
        .find(|&step| row.is_bound(&reaction_column(step)) || row.is_bound(&reaction_id_column(step)))?;

    let mids: Vec<Option<String>> = (1..step_count)
        .map(|i| row.string(&mid_identifier_column(i)).filter(|v| !v.is_empty()))
        .collect();
    let intermediates = mids.iter().flatten().cloned().collect();

    let reactions = (1..=step_count)
        .map(|step| ReactionRef {
            iri: row.string(&reaction_column(step)),
            id: row.string(&reaction_id_column(step)),
        })
        .collect();

    let target_identifier = row.string(TARGET_IDENTIFIER_COLUMN).unwrap_or_else(|| {
        if targets.len() == 1 {
            targets[0].clone()
        } else {
            String::new()
        }
    });

    let target = Some(target_identifier.clone()).filter(|t| !t.is_empty());
    let hop_products = mids.into_iter().chain(std::iter::once(target)).collect();

    Some(DetailedPath {
        starts: starts.to_vec(),
        target_identifier,
        intermediates,
        reactions,
        hop_products,
        step_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChemkgError;
    use crate::graphdb::testing::{repository, row, rows, MockExecutor};

    fn s(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn summary(start: &str, target: &str, steps: usize) -> PathSummary {
        PathSummary {
            start_identifier: start.to_string(),
            target_identifier: target.to_string(),
            steps,
        }
    }

    #[test]
    fn test_shortest_per_pair() {
        let rows = vec![
            summary("A", "C", 3),
            summary("A", "C", 1),
            summary("B", "C", 2),
            summary("A", "C", 2),
            summary("A", "D", 2),
        ];
        let best = shortest_per_pair(rows);
        assert_eq!(
            best,
            vec![summary("A", "C", 1), summary("A", "D", 2), summary("B", "C", 2)]
        );
    }

    #[tokio::test]
    async fn test_find_paths_all_rows() {
        let mock = MockExecutor::with_results(vec![rows(vec![
            row(&[("start_identifier", "CCO"), ("target_identifier", "CC=O"), ("steps", "1")]),
            row(&[("start_identifier", "CCO"), ("target_identifier", "CC=O"), ("steps", "2")]),
        ])]);
        let repo = repository(mock.clone());

        let options = FindPathsOptions {
            starts: s(&["CCO"]),
            targets: s(&["CC=O"]),
            max_steps: 2,
            shortest_only: false,
        };
        let all = find_paths(&repo, &options).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(mock.last_query().unwrap().contains("BIND(2 AS ?steps)"));

        let shortest = find_paths(&repo, &FindPathsOptions { shortest_only: true, ..options })
            .await
            .unwrap();
        assert_eq!(shortest, vec![summary("CCO", "CC=O", 1)]);
    }

    #[tokio::test]
    async fn test_find_paths_rejects_bad_input_without_querying() {
        let mock = MockExecutor::with_results(vec![]);
        let repo = repository(mock.clone());
        let options = FindPathsOptions {
            starts: vec![],
            targets: s(&["B"]),
            max_steps: 2,
            shortest_only: false,
        };
        let err = find_paths(&repo, &options).await.unwrap_err();
        assert!(matches!(err, ChemkgError::InvalidArgument(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_find_paths_surfaces_engine_failure() {
        let mock = MockExecutor::failing("GraphDB error 500: boom");
        let repo = repository(mock);
        let options = FindPathsOptions {
            starts: s(&["A"]),
            targets: s(&["B"]),
            max_steps: 1,
            shortest_only: true,
        };
        let err = find_paths(&repo, &options).await.unwrap_err();
        assert!(matches!(err, ChemkgError::EngineQueryFailed(_)));
    }

    #[test]
    fn test_detailed_path_step_count_from_highest_reaction() {
        let r = row(&[
            ("reaction_1", "http://example.org/chemkg/rxn/1"),
            ("reaction_1_id", "R1"),
            ("reaction_2", "http://example.org/chemkg/rxn/2"),
            ("mid_1_identifier", "CC=O"),
            ("target_identifier", "CC(=O)O"),
        ]);
        let path = detailed_path_from_row(&r, &s(&["CCO"]), &s(&["CC(=O)O"]), 3).unwrap();
        assert_eq!(path.step_count, 2);
        assert_eq!(path.intermediates, vec!["CC=O"]);
        assert_eq!(path.reactions.len(), 2);
        assert_eq!(path.reactions[0].id.as_deref(), Some("R1"));
        assert_eq!(path.reactions[1].id, None);
        assert_eq!(path.reactions[1].iri.as_deref(), Some("http://example.org/chemkg/rxn/2"));
        assert_eq!(path.target_identifier, "CC(=O)O");
        assert_eq!(path.starts, vec!["CCO"]);
        assert_eq!(
            path.hop_products,
            vec![Some("CC=O".to_string()), Some("CC(=O)O".to_string())]
        );
    }

    #[test]
    fn test_hop_products_keep_position_when_middle_is_unbound() {
        let r = row(&[
            ("reaction_3", "urn:r3"),
            ("mid_2_identifier", "Y"),
            ("target_identifier", "Z"),
        ]);
        let path = detailed_path_from_row(&r, &s(&["A"]), &s(&["Z"]), 3).unwrap();
        assert_eq!(path.intermediates, vec!["Y"]);
        assert_eq!(
            path.hop_products,
            vec![None, Some("Y".to_string()), Some("Z".to_string())]
        );
        assert_eq!(path.hop_products.len(), path.reactions.len());
    }

    #[test]
    fn test_detailed_path_ignores_mid_beyond_step_count() {
        // a stale mid_2 must not leak into a 2-step chain
        let r = row(&[
            ("reaction_2_id", "R2"),
            ("mid_1_identifier", "X"),
            ("mid_2_identifier", "Y"),
        ]);
        let path = detailed_path_from_row(&r, &s(&["A"]), &s(&["B"]), 3).unwrap();
        assert_eq!(path.step_count, 2);
        assert_eq!(path.intermediates, vec!["X"]);
        assert_eq!(path.target_identifier, "B");
    }

    #[test]
    fn test_detailed_path_target_fallback_with_many_targets() {
        let r = row(&[("reaction_1", "urn:r1")]);
        let path = detailed_path_from_row(&r, &s(&["A"]), &s(&["B", "C"]), 1).unwrap();
        assert_eq!(path.target_identifier, "");
        assert_eq!(path.hop_products, vec![None]);
    }

    #[test]
    fn test_detailed_path_drops_rows_without_reactions() {
        let r = row(&[("target_identifier", "B")]);
        assert!(detailed_path_from_row(&r, &s(&["A"]), &s(&["B"]), 2).is_none());
    }

    #[tokio::test]
    async fn test_get_multi_set_paths() {
        let mock = MockExecutor::with_results(vec![rows(vec![
            row(&[("reaction_1", "urn:r1"), ("target_identifier", "C")]),
            row(&[("target_identifier", "C")]),
        ])]);
        let repo = repository(mock.clone());

        let paths = get_multi_set_paths(&repo, &s(&["A", "B"]), &s(&["C"]), 2).await.unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].step_count, 1);
        assert_eq!(paths[0].starts, vec!["A", "B"]);
        assert!(mock
            .last_query()
            .unwrap()
            .contains("HAVING (COUNT(DISTINCT ?start_member_identifier) = 2)"));
    }
}
