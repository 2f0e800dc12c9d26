use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{Database, TableExt};

/// Summary of FK graph structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Report for FK dependency ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphReport {
    pub summary: FkGraphSummary,
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Build a deterministic FK dependency report for a discovered database.
pub fn build_fk_graph_report(database: &Database) -> FkGraphReport {
    let graph = fk_adjacency(database);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();
    let summary = FkGraphSummary { nodes, edges };

    match toposort(&graph) {
        Ok(order) => FkGraphReport {
            summary,
            topo_order: Some(order),
            cycle: None,
        },
        Err(cycle) => FkGraphReport {
            summary,
            topo_order: None,
            cycle: Some(cycle),
        },
    }
}

/// Table positions in creation order.
///
/// Inheriting tables follow their parents; everything else is ordered by
/// qualified name. Tables caught in an inheritance cycle are appended last.
pub fn table_creation_order(database: &Database) -> Vec<usize> {
    let mut positions: BTreeMap<String, usize> = BTreeMap::new();
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (idx, table) in database.tables.iter().enumerate() {
        let key = table.full_name();
        positions.insert(key.clone(), idx);
        graph.entry(key).or_default();
    }

    for table in &database.tables {
        let TableExt::Postgres(ext) = &table.ext else {
            continue;
        };
        for (schema, name) in &ext.inherits {
            let parent = qualified(schema, name);
            if positions.contains_key(&parent) {
                graph.entry(parent).or_default().insert(table.full_name());
            }
        }
    }

    let order = match toposort(&graph) {
        Ok(order) => order,
        Err(cycle) => {
            tracing::warn!(
                event = "table_order_cycle",
                tables = cycle.len(),
                "inheritance cycle; falling back to name order for the remainder"
            );
            let mut order = partial_order(&graph);
            order.extend(cycle);
            order
        }
    };

    order
        .iter()
        .filter_map(|key| positions.get(key).copied())
        .collect()
}

fn qualified(schema: &str, name: &str) -> String {
    if schema.is_empty() {
        name.to_string()
    } else {
        format!("{schema}.{name}")
    }
}

fn fk_adjacency(database: &Database) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for table in &database.tables {
        let table_key = table.full_name();
        graph.entry(table_key.clone()).or_default();

        for fk in database.foreign_keys_of(table) {
            let referenced = qualified(&fk.referenced_table_schema, &fk.referenced_table_name);
            graph.entry(referenced).or_default().insert(table_key.clone());
        }
    }

    graph
}

fn indegrees(graph: &BTreeMap<String, BTreeSet<String>>) -> BTreeMap<String, usize> {
    let mut indegree: BTreeMap<String, usize> = BTreeMap::new();
    for (node, targets) in graph {
        indegree.entry(node.clone()).or_insert(0);
        for target in targets {
            *indegree.entry(target.clone()).or_insert(0) += 1;
        }
    }
    indegree
}

/// Kahn's algorithm; returns the nodes left with inbound edges on failure.
fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, Vec<String>> {
    let mut indegree = indegrees(graph);
    let order = kahn(graph, &mut indegree);

    if order.len() == indegree.len() {
        Ok(order)
    } else {
        let cycle_nodes: Vec<String> = indegree
            .into_iter()
            .filter_map(|(node, count)| if count > 0 { Some(node) } else { None })
            .collect();
        Err(cycle_nodes)
    }
}

fn partial_order(graph: &BTreeMap<String, BTreeSet<String>>) -> Vec<String> {
    let mut indegree = indegrees(graph);
    kahn(graph, &mut indegree)
}

fn kahn(
    graph: &BTreeMap<String, BTreeSet<String>>,
    indegree: &mut BTreeMap<String, usize>,
) -> Vec<String> {
    let mut ready: BTreeSet<String> = indegree
        .iter()
        .filter_map(|(node, count)| if *count == 0 { Some(node.clone()) } else { None })
        .collect();

    let mut order = Vec::with_capacity(indegree.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.clone());

        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.clone());
                    }
                }
            }
        }
    }

    order
}
