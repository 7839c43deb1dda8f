//! Multi-set path query builder.
//!
//! Produces one SPARQL `SELECT DISTINCT` that returns every reaction chain of
//! length `1..=max_steps` from a start compound to a target compound, where the
//! first reaction consumes *all* starts and the last reaction yields *all*
//! targets.
//!
//! Each chain length is described as a list of [`Hop`]s over explicit
//! [`ChainNode`] positions, then rendered. Column names are derived from those
//! descriptors, never from ad hoc string suffixes.

use crate::error::{ChemkgError, Result};
use crate::sparql::{literal_list, CK_PREFIX, CONSUMES, HAS_IDENTIFIER, REACTION_ID, YIELDS};

/// Column holding the concrete target identifier of a row.
pub const TARGET_IDENTIFIER_COLUMN: &str = "target_identifier";

/// Variable the last reaction of every branch is bound to.
const LAST_REACTION_VAR: &str = "?last_reaction";

/// Column for the reaction at hop `step` (1-based).
pub fn reaction_column(step: usize) -> String {
    format!("reaction_{}", step)
}

/// Column for the optional `ck:reactionId` of the reaction at hop `step`.
pub fn reaction_id_column(step: usize) -> String {
    format!("reaction_{}_id", step)
}

/// Column for the identifier of intermediate compound `index` (1-based).
pub fn mid_identifier_column(index: usize) -> String {
    format!("mid_{}_identifier", index)
}

/// A position in a chain of compounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainNode {
    /// Position 0; identifier is constrained to the start set.
    Start,
    /// Positions `1..L`; unnamed compounds between reactions.
    Intermediate(usize),
    /// Position `L`; joined with the allowed target endpoints.
    Target,
}

impl ChainNode {
    /// Node at `position` in a chain with `length` hops.
    pub fn at(position: usize, length: usize) -> Self {
        if position == 0 {
            ChainNode::Start
        } else if position >= length {
            ChainNode::Target
        } else {
            ChainNode::Intermediate(position)
        }
    }

    /// Graph node variable.
    pub fn variable(&self) -> String {
        match self {
            ChainNode::Start => "?start_node".to_string(),
            ChainNode::Intermediate(i) => format!("?mid_{}", i),
            ChainNode::Target => "?target".to_string(),
        }
    }

    /// Identifier column bound to this node.
    pub fn identifier_column(&self) -> String {
        match self {
            ChainNode::Start => "start_identifier".to_string(),
            ChainNode::Intermediate(i) => mid_identifier_column(*i),
            ChainNode::Target => TARGET_IDENTIFIER_COLUMN.to_string(),
        }
    }
}

/// One reaction step: reaction `step` consumes `consumes` and yields `yields`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub step: usize,
    pub consumes: ChainNode,
    pub yields: ChainNode,
}

impl Hop {
    pub fn reaction_variable(&self) -> String {
        format!("?{}", reaction_column(self.step))
    }

    pub fn reaction_id_variable(&self) -> String {
        format!("?{}", reaction_id_column(self.step))
    }
}

/// Hop descriptors for a chain of `length` reactions (`length >= 1`).
pub fn chain(length: usize) -> Vec<Hop> {
    (1..=length)
        .map(|step| Hop {
            step,
            consumes: ChainNode::at(step - 1, length),
            yields: ChainNode::at(step, length),
        })
        .collect()
}

/// Build the multi-set path query.
///
/// Fails with [`ChemkgError::InvalidArgument`] when `starts` or `targets` is
/// empty or `max_steps` is zero. No upper bound is applied here.
pub fn build_multi_set_path_query(
    starts: &[String],
    targets: &[String],
    max_steps: usize,
) -> Result<String> {
    validate_path_inputs(starts, targets, max_steps)?;

    let starts_in = literal_list(starts, ", ");
    let targets_in = literal_list(targets, ", ");
    let targets_values = literal_list(targets, " ");

    let branches = (1..=max_steps)
        .map(|length| render_branch(&chain(length), &starts_in))
        .collect::<Vec<_>>()
        .join("\n  UNION\n");

    Ok(format!(
        r#"{prefix}

SELECT DISTINCT
  {projection}
WHERE {{
  # Allowed target endpoints
  VALUES ?{target_col} {{ {targets_values} }}
  ?target {has_id} ?{target_col} .

  # Chains of length 1..{max_steps}
{branches}

  # First reaction consumes every start compound
  {{
    SELECT ?reaction_1
    WHERE {{
      ?reaction_1 {consumes} ?start_member .
      ?start_member {has_id} ?start_member_identifier .
      FILTER(?start_member_identifier IN ({starts_in}))
    }}
    GROUP BY ?reaction_1
    HAVING (COUNT(DISTINCT ?start_member_identifier) = {start_count})
  }}

  # Last reaction yields every target compound
  {{
    SELECT {last}
    WHERE {{
      {last} {yields} ?target_member .
      ?target_member {has_id} ?target_member_identifier .
      FILTER(?target_member_identifier IN ({targets_in}))
    }}
    GROUP BY {last}
    HAVING (COUNT(DISTINCT ?target_member_identifier) = {target_count})
  }}
}}
"#,
        prefix = CK_PREFIX,
        projection = projection(max_steps),
        target_col = TARGET_IDENTIFIER_COLUMN,
        targets_values = targets_values,
        has_id = HAS_IDENTIFIER,
        max_steps = max_steps,
        branches = branches,
        consumes = CONSUMES,
        yields = YIELDS,
        starts_in = starts_in,
        targets_in = targets_in,
        start_count = starts.len(),
        target_count = targets.len(),
        last = LAST_REACTION_VAR,
    ))
}

pub(crate) fn validate_path_inputs(starts: &[String], targets: &[String], max_steps: usize) -> Result<()> {
    if starts.is_empty() {
        return Err(ChemkgError::InvalidArgument("starts must not be empty".to_string()));
    }
    if targets.is_empty() {
        return Err(ChemkgError::InvalidArgument("targets must not be empty".to_string()));
    }
    if max_steps < 1 {
        return Err(ChemkgError::InvalidArgument("max_steps must be >= 1".to_string()));
    }
    Ok(())
}

/// SELECT list: every reaction/id pair up to `max_steps`, every intermediate
/// identifier up to `max_steps - 1`, then the target.
fn projection(max_steps: usize) -> String {
    let mut lines = vec![(1..=max_steps)
        .map(|step| format!("?{} ?{}", reaction_column(step), reaction_id_column(step)))
        .collect::<Vec<_>>()
        .join(" ")];
    if max_steps > 1 {
        lines.push(
            (1..max_steps)
                .map(|i| format!("?{}", mid_identifier_column(i)))
                .collect::<Vec<_>>()
                .join(" "),
        );
    }
    lines.push(format!("?{}", TARGET_IDENTIFIER_COLUMN));
    lines.join("\n  ")
}

fn render_branch(hops: &[Hop], starts_in: &str) -> String {
    let mut body = Vec::new();

    for hop in hops {
        body.push(format!(
            "    {rxn} {consumes} {input} ;\n        {yields} {output} .",
            rxn = hop.reaction_variable(),
            consumes = CONSUMES,
            input = hop.consumes.variable(),
            yields = YIELDS,
            output = hop.yields.variable(),
        ));
        if hop.consumes == ChainNode::Start {
            let start = ChainNode::Start;
            body.push(format!(
                "    {node} {has_id} ?{col} .\n    FILTER(?{col} IN ({starts_in}))",
                node = start.variable(),
                has_id = HAS_IDENTIFIER,
                col = start.identifier_column(),
                starts_in = starts_in,
            ));
        }
        if let ChainNode::Intermediate(_) = hop.yields {
            body.push(format!(
                "    {node} {has_id} ?{col} .",
                node = hop.yields.variable(),
                has_id = HAS_IDENTIFIER,
                col = hop.yields.identifier_column(),
            ));
        }
    }

    for hop in hops {
        body.push(format!(
            "    OPTIONAL {{ {} {} {} }}",
            hop.reaction_variable(),
            REACTION_ID,
            hop.reaction_id_variable()
        ));
    }

    if let Some(last) = hops.last() {
        body.push(format!("    BIND({} AS {})", last.reaction_variable(), LAST_REACTION_VAR));
    }

    format!("  {{\n{}\n  }}", body.join("\n"))
}
