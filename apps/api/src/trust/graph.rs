use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::connection::{ConnectionRow, ConnectionStatus};
use crate::models::evaluation::{EvaluationRow, EvaluationTarget};
use crate::trust::dedup::dedup_latest;
use crate::trust::scoring::recency_weight;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    User,
    Company,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Connection,
    Evaluation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: Option<String>,
    pub is_viewer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    /// Connection strength, or recency weight for evaluation edges.
    pub weight: f64,
    pub rating: Option<i16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Display names for graph nodes, keyed by user id and company slug.
#[derive(Debug, Default)]
pub struct GraphLabels {
    pub users: HashMap<Uuid, String>,
    pub companies: HashMap<String, String>,
}

pub fn user_node_id(id: Uuid) -> String {
    format!("user:{id}")
}

pub fn company_node_id(slug: &str) -> String {
    format!("company:{slug}")
}

/// Builds the viewer's trust graph for visualization.
///
/// Active connections become `connection` edges. Evaluations (latest per
/// evaluator and target) written by the viewer or a connected user become
/// `evaluation` edges from the evaluator to the evaluated node. Blocked and
/// pending connections contribute nothing.
pub fn build_trust_graph(
    viewer: Uuid,
    connections: &[ConnectionRow],
    evaluations: &[EvaluationRow],
    labels: &GraphLabels,
    now: DateTime<Utc>,
) -> TrustGraph {
    let mut nodes: BTreeMap<String, GraphNode> = BTreeMap::new();
    let mut edges = Vec::new();

    let add_user = |nodes: &mut BTreeMap<String, GraphNode>, id: Uuid| {
        let key = user_node_id(id);
        nodes.entry(key.clone()).or_insert_with(|| GraphNode {
            id: key.clone(),
            kind: NodeKind::User,
            label: labels.users.get(&id).cloned(),
            is_viewer: id == viewer,
        });
        key
    };

    add_user(&mut nodes, viewer);

    let mut members: HashSet<Uuid> = HashSet::from([viewer]);
    for connection in connections {
        if connection.status() != Some(ConnectionStatus::Active) {
            continue;
        }
        let source = add_user(&mut nodes, connection.user_a);
        let target = add_user(&mut nodes, connection.user_b);
        members.insert(connection.user_a);
        members.insert(connection.user_b);
        edges.push(GraphEdge {
            source,
            target,
            kind: EdgeKind::Connection,
            weight: connection.strength,
            rating: None,
        });
    }

    for evaluation in dedup_latest(evaluations) {
        if !members.contains(&evaluation.evaluator_id) {
            continue;
        }
        let Some(target) = evaluation.target() else {
            continue;
        };
        let source = add_user(&mut nodes, evaluation.evaluator_id);
        let target = match target {
            EvaluationTarget::Person(id) => add_user(&mut nodes, id),
            EvaluationTarget::Company(slug) => {
                let key = company_node_id(&slug);
                nodes.entry(key.clone()).or_insert_with(|| GraphNode {
                    id: key.clone(),
                    kind: NodeKind::Company,
                    label: labels.companies.get(&slug).cloned(),
                    is_viewer: false,
                });
                key
            }
        };
        edges.push(GraphEdge {
            source,
            target,
            kind: EdgeKind::Evaluation,
            weight: recency_weight(evaluation.created_at, now),
            rating: Some(evaluation.rating),
        });
    }

    TrustGraph {
        nodes: nodes.into_values().collect(),
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::fixtures::{company_eval, connection, person_eval};

    #[test]
    fn test_lone_viewer_graph() {
        let viewer = Uuid::new_v4();
        let graph = build_trust_graph(viewer, &[], &[], &GraphLabels::default(), Utc::now());
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.nodes[0].is_viewer);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_blocked_connections_are_omitted() {
        let viewer = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let foe = Uuid::new_v4();
        let connections = vec![
            connection(viewer, friend, 0.8, "active"),
            connection(viewer, foe, 0.8, "blocked"),
        ];
        let evals = vec![company_eval(foe, "acme", 1, 0)];

        let graph = build_trust_graph(
            viewer,
            &connections,
            &evals,
            &GraphLabels::default(),
            Utc::now(),
        );
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].kind, EdgeKind::Connection);
        assert!(!graph.nodes.iter().any(|n| n.id == user_node_id(foe)));
    }

    #[test]
    fn test_evaluation_edges_point_at_targets() {
        let viewer = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let person = Uuid::new_v4();
        let connections = vec![connection(viewer, friend, 0.4, "active")];
        let evals = vec![
            company_eval(viewer, "acme", 5, 0),
            company_eval(friend, "acme", 3, 0),
            person_eval(friend, person, 4, 0),
        ];
        let labels = GraphLabels {
            users: HashMap::new(),
            companies: HashMap::from([("acme".to_string(), "Acme Inc".to_string())]),
        };

        let graph = build_trust_graph(viewer, &connections, &evals, &labels, Utc::now());

        let acme = graph
            .nodes
            .iter()
            .find(|n| n.id == company_node_id("acme"))
            .unwrap();
        assert_eq!(acme.kind, NodeKind::Company);
        assert_eq!(acme.label.as_deref(), Some("Acme Inc"));
        // viewer, friend, person, acme
        assert_eq!(graph.nodes.len(), 4);

        let eval_edges: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Evaluation)
            .collect();
        assert_eq!(eval_edges.len(), 3);
        assert!(eval_edges
            .iter()
            .any(|e| e.source == user_node_id(friend) && e.target == user_node_id(person)));
    }

    #[test]
    fn test_nodes_are_deduplicated() {
        let viewer = Uuid::new_v4();
        let evals = vec![
            company_eval(viewer, "acme", 5, 10),
            company_eval(viewer, "acme", 4, 0),
        ];
        let graph = build_trust_graph(viewer, &[], &evals, &GraphLabels::default(), Utc::now());
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].rating, Some(4));
    }
}
