/////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// TESTS
//////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use crate::Diagnostics::incidence::IncidenceGraph;
    use crate::Diagnostics::matching::{Matching, maximum_matching};

    /// Hand-built graph, bypassing the model layer.
    fn graph_from_adjacency(nv: usize, con_adjacency: Vec<Vec<usize>>) -> IncidenceGraph {
        let mut var_adjacency = vec![Vec::new(); nv];
        for (i, adjacent) in con_adjacency.iter().enumerate() {
            for &j in adjacent {
                var_adjacency[j].push(i);
            }
        }
        IncidenceGraph {
            constraint_names: (0..con_adjacency.len()).map(|i| format!("c{}", i)).collect(),
            variable_names: (0..nv).map(|j| format!("v{}", j)).collect(),
            con_adjacency,
            var_adjacency,
        }
    }

    /// Exponential reference matcher: every constraint either stays
    /// unmatched or takes any free adjacent variable.
    fn brute_force_size(graph: &IncidenceGraph, c: usize, used: &mut Vec<bool>) -> usize {
        if c == graph.n_constraints() {
            return 0;
        }
        let mut best = brute_force_size(graph, c + 1, used);
        for &v in &graph.con_adjacency[c] {
            if !used[v] {
                used[v] = true;
                best = best.max(1 + brute_force_size(graph, c + 1, used));
                used[v] = false;
            }
        }
        best
    }

    fn assert_valid(graph: &IncidenceGraph, matching: &Matching) {
        // one-to-one, and every pair is an incidence edge
        for (c, v) in matching.pairs() {
            assert_eq!(matching.var_to_con[v], Some(c));
            assert!(graph.con_adjacency[c].contains(&v));
        }
        let matched_vars: Vec<usize> = matching.var_to_con.iter().flatten().cloned().collect();
        let mut dedup = matched_vars.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(matched_vars.len(), dedup.len());
    }

    #[test]
    fn test_matches_brute_force_on_small_graphs() {
        let cases = vec![
            graph_from_adjacency(2, vec![vec![0, 1], vec![0, 1]]),
            graph_from_adjacency(3, vec![vec![0], vec![0, 1], vec![1, 2]]),
            // star: all constraints fight over one variable
            graph_from_adjacency(1, vec![vec![0], vec![0], vec![0]]),
            // chain forcing augmenting-path flips
            graph_from_adjacency(4, vec![vec![0, 1], vec![1, 2], vec![2, 3], vec![3]]),
            // one isolated constraint, one isolated variable
            graph_from_adjacency(3, vec![vec![], vec![0, 1], vec![1]]),
            graph_from_adjacency(
                5,
                vec![vec![0, 2, 4], vec![1, 2], vec![2, 3], vec![0, 4], vec![1]],
            ),
        ];
        for graph in &cases {
            let matching = maximum_matching(graph);
            assert_valid(graph, &matching);
            let mut used = vec![false; graph.n_variables()];
            let reference = brute_force_size(graph, 0, &mut used);
            assert_eq!(matching.size(), reference);
        }
    }

    #[test]
    fn test_perfect_matching_on_square_diagonal() {
        let graph = graph_from_adjacency(4, vec![vec![0], vec![0, 1], vec![1, 2], vec![2, 3]]);
        let matching = maximum_matching(&graph);
        assert_eq!(matching.size(), 4);
        assert!(matching.unmatched_constraints().is_empty());
        assert!(matching.unmatched_variables().is_empty());
    }

    #[test]
    fn test_augmenting_path_displaces_greedy_choice() {
        // greedy would match c0-v0 and leave c1 unmatched
        let graph = graph_from_adjacency(2, vec![vec![0, 1], vec![0]]);
        let matching = maximum_matching(&graph);
        assert_eq!(matching.size(), 2);
        assert_eq!(matching.con_to_var[1], Some(0));
        assert_eq!(matching.con_to_var[0], Some(1));
    }

    #[test]
    fn test_deterministic_tie_breaking() {
        let graph = graph_from_adjacency(3, vec![vec![0, 1, 2], vec![0, 1, 2], vec![0, 1, 2]]);
        let first = serde_json::to_string(&maximum_matching(&graph)).unwrap();
        for _ in 0..5 {
            let again = serde_json::to_string(&maximum_matching(&graph)).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_empty_graph() {
        let graph = graph_from_adjacency(0, vec![]);
        let matching = maximum_matching(&graph);
        assert_eq!(matching.size(), 0);
    }
}
