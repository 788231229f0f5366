//! Dulmage-Mendelsohn style decomposition.
//!
//! Given the incidence graph and a maximum matching, nodes are classified
//! by alternating-path reachability:
//! - everything reachable from an unmatched constraint is the
//!   over-constrained part (the potentially redundant constraints);
//! - everything reachable from an unmatched variable is the
//!   under-constrained part (variables the constraints do not pin down);
//! - the remaining matched pairs are the well-constrained core.
//!
//! Each defective part is split into minimal independent blocks, and the
//! well-constrained core into a block-triangular sequence of strongly
//! connected subsystems.

use super::incidence::IncidenceGraph;
use super::matching::Matching;
use log::info;
use serde::{Deserialize, Serialize};

/// A minimal, independently analyzable group of constraints and variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DMBlock {
    pub constraints: Vec<String>,
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DMPartition {
    /// matched (constraint, variable) pairs outside the defective parts
    pub well_constrained: Vec<(String, String)>,
    /// well-constrained core split into strongly connected subsystems,
    /// listed in solve order (block-triangular form)
    pub well_constrained_blocks: Vec<DMBlock>,
    pub overconstrained_constraints: Vec<String>,
    pub overconstrained_variables: Vec<String>,
    pub overconstrained_blocks: Vec<DMBlock>,
    pub underconstrained_variables: Vec<String>,
    pub underconstrained_constraints: Vec<String>,
    pub underconstrained_blocks: Vec<DMBlock>,
    /// zero constraints or zero variables in the graph
    pub degenerate: bool,
}

impl DMPartition {
    pub fn structurally_singular(&self) -> bool {
        !self.overconstrained_constraints.is_empty()
            || !self.underconstrained_variables.is_empty()
    }
}

/// Classify all graph nodes and split the defective parts into blocks.
/// Pure function of (graph, matching); a degenerate graph (no constraints
/// or no variables) yields an explicit empty decomposition, never an error.
pub fn decompose(graph: &IncidenceGraph, matching: &Matching) -> DMPartition {
    let nc = graph.n_constraints();
    let nv = graph.n_variables();

    // over-constrained part: alternating reachability from unmatched
    // constraints; edges away from a constraint are its non-matching ones,
    // edges back to a constraint are matching ones
    let mut over_con = vec![false; nc];
    let mut over_var = vec![false; nv];
    let mut stack = matching.unmatched_constraints();
    for &c in &stack {
        over_con[c] = true;
    }
    while let Some(c) = stack.pop() {
        for &v in &graph.con_adjacency[c] {
            if matching.con_to_var[c] == Some(v) || over_var[v] {
                continue;
            }
            over_var[v] = true;
            if let Some(c2) = matching.var_to_con[v] {
                if !over_con[c2] {
                    over_con[c2] = true;
                    stack.push(c2);
                }
            }
        }
    }

    // under-constrained part, symmetric from unmatched variables
    let mut under_con = vec![false; nc];
    let mut under_var = vec![false; nv];
    let mut stack = matching.unmatched_variables();
    for &v in &stack {
        under_var[v] = true;
    }
    while let Some(v) = stack.pop() {
        for &c in &graph.var_adjacency[v] {
            if matching.var_to_con[v] == Some(c) || under_con[c] {
                continue;
            }
            under_con[c] = true;
            if let Some(v2) = matching.con_to_var[c] {
                if !under_var[v2] {
                    under_var[v2] = true;
                    stack.push(v2);
                }
            }
        }
    }

    let mut well_constrained = Vec::new();
    for (c, v) in matching.pairs() {
        if !over_con[c] && !under_con[c] {
            well_constrained.push((
                graph.constraint_names[c].clone(),
                graph.variable_names[v].clone(),
            ));
        }
    }

    let partition = DMPartition {
        well_constrained,
        well_constrained_blocks: well_core_blocks(graph, matching, &over_con, &under_con),
        overconstrained_constraints: names(&graph.constraint_names, &over_con),
        overconstrained_variables: names(&graph.variable_names, &over_var),
        overconstrained_blocks: part_blocks(graph, &over_con, &over_var),
        underconstrained_variables: names(&graph.variable_names, &under_var),
        underconstrained_constraints: names(&graph.constraint_names, &under_con),
        underconstrained_blocks: part_blocks(graph, &under_con, &under_var),
        degenerate: nc == 0 || nv == 0,
    };
    info!(
        "DM decomposition: {} well-constrained pairs, {} over-constrained constraints, {} under-constrained variables",
        partition.well_constrained.len(),
        partition.overconstrained_constraints.len(),
        partition.underconstrained_variables.len()
    );
    partition
}

fn names(all: &[String], mask: &[bool]) -> Vec<String> {
    all.iter()
        .zip(mask)
        .filter(|&(_, &m)| m)
        .map(|(n, _)| n.clone())
        .collect()
}

/// Minimal independent blocks of a defective part: connected components of
/// the induced sub-bipartite-graph, each emitted with its members in graph
/// order, blocks ordered by their first constraint (then first variable).
fn part_blocks(graph: &IncidenceGraph, con_mask: &[bool], var_mask: &[bool]) -> Vec<DMBlock> {
    let nc = graph.n_constraints();
    let nv = graph.n_variables();
    let mut con_seen = vec![false; nc];
    let mut var_seen = vec![false; nv];
    let mut blocks = Vec::new();

    // constraint seeds first, then isolated variables, ascending
    let con_seeds = (0..nc).filter(|&c| con_mask[c]);
    let var_seeds = (0..nv).filter(|&v| var_mask[v]);
    for seed in con_seeds
        .map(Seed::Constraint)
        .chain(var_seeds.map(Seed::Variable))
    {
        let (mut cons, mut vars) = (Vec::new(), Vec::new());
        let mut stack = Vec::new();
        match seed {
            Seed::Constraint(c) if !con_seen[c] => {
                con_seen[c] = true;
                stack.push(Seed::Constraint(c));
            }
            Seed::Variable(v) if !var_seen[v] => {
                var_seen[v] = true;
                stack.push(Seed::Variable(v));
            }
            _ => continue,
        }
        while let Some(node) = stack.pop() {
            match node {
                Seed::Constraint(c) => {
                    cons.push(c);
                    for &v in &graph.con_adjacency[c] {
                        if var_mask[v] && !var_seen[v] {
                            var_seen[v] = true;
                            stack.push(Seed::Variable(v));
                        }
                    }
                }
                Seed::Variable(v) => {
                    vars.push(v);
                    for &c in &graph.var_adjacency[v] {
                        if con_mask[c] && !con_seen[c] {
                            con_seen[c] = true;
                            stack.push(Seed::Constraint(c));
                        }
                    }
                }
            }
        }
        cons.sort();
        vars.sort();
        blocks.push(DMBlock {
            constraints: cons
                .iter()
                .map(|&c| graph.constraint_names[c].clone())
                .collect(),
            variables: vars
                .iter()
                .map(|&v| graph.variable_names[v].clone())
                .collect(),
        });
    }
    blocks
}

#[derive(Clone, Copy)]
enum Seed {
    Constraint(usize),
    Variable(usize),
}

/// Block-triangular split of the well-constrained core: contract each
/// matched pair to one node, draw a dependency edge pair -> pair when one
/// constraint references the other pair's variable, and emit strongly
/// connected components in solve order (dependencies first).
fn well_core_blocks(
    graph: &IncidenceGraph,
    matching: &Matching,
    over_con: &[bool],
    under_con: &[bool],
) -> Vec<DMBlock> {
    let mut pairs = Vec::new();
    let mut pair_of_var = vec![None; graph.n_variables()];
    for (c, v) in matching.pairs() {
        if !over_con[c] && !under_con[c] {
            pair_of_var[v] = Some(pairs.len());
            pairs.push((c, v));
        }
    }
    let n = pairs.len();
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (p, &(c, _v)) in pairs.iter().enumerate() {
        for &w in &graph.con_adjacency[c] {
            if let Some(q) = pair_of_var[w] {
                if q != p {
                    edges[p].push(q);
                }
            }
        }
    }

    let sccs = tarjan_scc(&edges);
    // Tarjan emits sinks of the condensation first, which with
    // "p depends on q" edges is exactly the solve order
    sccs.into_iter()
        .map(|mut component| {
            component.sort();
            DMBlock {
                constraints: component
                    .iter()
                    .map(|&p| graph.constraint_names[pairs[p].0].clone())
                    .collect(),
                variables: component
                    .iter()
                    .map(|&p| graph.variable_names[pairs[p].1].clone())
                    .collect(),
            }
        })
        .collect()
}

fn tarjan_scc(edges: &[Vec<usize>]) -> Vec<Vec<usize>> {
    struct State<'a> {
        edges: &'a [Vec<usize>],
        index: Vec<Option<usize>>,
        lowlink: Vec<usize>,
        on_stack: Vec<bool>,
        stack: Vec<usize>,
        counter: usize,
        components: Vec<Vec<usize>>,
    }
    fn strongconnect(s: &mut State<'_>, v: usize) {
        s.index[v] = Some(s.counter);
        s.lowlink[v] = s.counter;
        s.counter += 1;
        s.stack.push(v);
        s.on_stack[v] = true;
        for i in 0..s.edges[v].len() {
            let w = s.edges[v][i];
            if s.index[w].is_none() {
                strongconnect(s, w);
                s.lowlink[v] = s.lowlink[v].min(s.lowlink[w]);
            } else if s.on_stack[w] {
                s.lowlink[v] = s.lowlink[v].min(s.index[w].unwrap());
            }
        }
        if s.lowlink[v] == s.index[v].unwrap() {
            let mut component = Vec::new();
            loop {
                let w = s.stack.pop().unwrap();
                s.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            s.components.push(component);
        }
    }

    let n = edges.len();
    let mut state = State {
        edges,
        index: vec![None; n],
        lowlink: vec![0; n],
        on_stack: vec![false; n],
        stack: Vec::new(),
        counter: 0,
        components: Vec::new(),
    };
    for v in 0..n {
        if state.index[v].is_none() {
            strongconnect(&mut state, v);
        }
    }
    state.components
}
