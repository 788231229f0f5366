//! Maximum bipartite matching between constraints and variables.
//!
//! Augmenting-path (Kuhn) search, O(V*E) worst case. Tie-breaking follows
//! the graph's node numbering, so the returned matching is the same on
//! every run over the same graph. The matching *size* is a global maximum
//! whatever the tie-breaking, by Koenig/Dulmage-Mendelsohn theory.

use super::incidence::IncidenceGraph;
use log::info;
use serde::{Deserialize, Serialize};

/// Partial one-to-one constraint/variable assignment, a subset of the
/// incidence edges. No node appears in more than one pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matching {
    pub con_to_var: Vec<Option<usize>>,
    pub var_to_con: Vec<Option<usize>>,
}

impl Matching {
    pub fn size(&self) -> usize {
        self.con_to_var.iter().filter(|m| m.is_some()).count()
    }

    pub fn unmatched_constraints(&self) -> Vec<usize> {
        self.con_to_var
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn unmatched_variables(&self) -> Vec<usize> {
        self.var_to_con
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_none())
            .map(|(j, _)| j)
            .collect()
    }

    /// Matched (constraint, variable) index pairs in constraint order.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.con_to_var
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.map(|j| (i, j)))
            .collect()
    }
}

/// Compute a maximum-cardinality matching over the incidence graph.
/// Pure function of the graph; no shared state.
pub fn maximum_matching(graph: &IncidenceGraph) -> Matching {
    let nc = graph.n_constraints();
    let nv = graph.n_variables();
    let mut con_to_var: Vec<Option<usize>> = vec![None; nc];
    let mut var_to_con: Vec<Option<usize>> = vec![None; nv];

    for c in 0..nc {
        let mut visited = vec![false; nv];
        try_augment(graph, c, &mut visited, &mut con_to_var, &mut var_to_con);
    }
    let matching = Matching {
        con_to_var,
        var_to_con,
    };
    info!(
        "maximum matching of size {} over {} constraints / {} variables",
        matching.size(),
        nc,
        nv
    );
    matching
}

/// Grow an alternating path from unmatched constraint `c`; flip the
/// matched/unmatched edges along it when a free variable is reached.
fn try_augment(
    graph: &IncidenceGraph,
    c: usize,
    visited: &mut Vec<bool>,
    con_to_var: &mut Vec<Option<usize>>,
    var_to_con: &mut Vec<Option<usize>>,
) -> bool {
    for &v in &graph.con_adjacency[c] {
        if visited[v] {
            continue;
        }
        visited[v] = true;
        let displaced = var_to_con[v];
        let free = match displaced {
            None => true,
            Some(owner) => try_augment(graph, owner, visited, con_to_var, var_to_con),
        };
        if free {
            con_to_var[c] = Some(v);
            var_to_con[v] = Some(c);
            return true;
        }
    }
    false
}
