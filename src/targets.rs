// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Builds the ordered, deduplicated scrape target lists for the exporter
//! jobs.
//!
//! Lists are ordered by node name regardless of the order nodes appear in the
//! state file, and never contain the same `(address, node)` pair twice.

use std::collections::HashSet;

use tracing::debug;

use crate::state::{ClusterState, NodeInfo};

/// Default port of the node-exporter endpoint on each node.
pub const DEFAULT_NODE_EXPORTER_PORT: u16 = 9102;
/// Default port of the cAdvisor endpoint on each node.
pub const DEFAULT_CADVISOR_PORT: u16 = 9101;

/// Scrape address with the labels attached to it in the rendered config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledTarget {
    /// `ip:port` address polled by Prometheus.
    pub address: String,
    /// Node name taken from the state mapping key.
    pub node:    String,
    /// Cluster label.
    pub cluster: String,
    /// Role label. Empty roles are not rendered.
    pub role:    String
}

impl LabeledTarget {
    fn for_node(node: &str, info: &NodeInfo, port: u16) -> Self {
        Self {
            address: format!("{}:{port}", info.ip),
            node:    node.to_owned(),
            cluster: info.cluster.clone(),
            role:    info.role.clone()
        }
    }

    fn dedup_key(&self) -> String {
        format!("{}|{}", self.address, self.node)
    }
}

/// Ports appended to each node address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExporterPorts {
    /// Port used for the `node-exporter` job.
    pub node_exporter: u16,
    /// Port used for the `cadvisor` job.
    pub cadvisor:      u16
}

impl Default for ExporterPorts {
    fn default() -> Self {
        Self {
            node_exporter: DEFAULT_NODE_EXPORTER_PORT,
            cadvisor:      DEFAULT_CADVISOR_PORT
        }
    }
}

/// Ordered target lists for both exporter jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeTargets {
    /// Targets of the `node-exporter` job.
    pub node_exporter: Vec<LabeledTarget>,
    /// Targets of the `cadvisor` job.
    pub cadvisor:      Vec<LabeledTarget>
}

/// Builds the exporter target lists from a parsed cluster state.
///
/// Nodes are visited in ascending byte-wise order of their names. Nodes with
/// a blank address are skipped, so a state without any usable address yields
/// two empty lists. A repeated `(address, node)` pair keeps only its first
/// occurrence.
///
/// # Examples
///
/// ```
/// use promgen::{ExporterPorts, extract_targets, parse_state};
///
/// let json = br#"{"outputs":{"cluster_ips":{"value":{
///     "b":{"ip":"10.0.0.2","cluster":"c1","role":"worker-node"},
///     "a":{"ip":"10.0.0.1","cluster":"c1","role":"control-node"}
/// }}}}"#;
/// let state = parse_state(json).expect("valid state");
/// let targets = extract_targets(&state, ExporterPorts::default());
/// assert_eq!(targets.node_exporter[0].address, "10.0.0.1:9102");
/// assert_eq!(targets.cadvisor[1].address, "10.0.0.2:9101");
/// ```
pub fn extract_targets(state: &ClusterState, ports: ExporterPorts) -> ScrapeTargets {
    let mut targets = ScrapeTargets {
        node_exporter: Vec::with_capacity(state.len()),
        cadvisor:      Vec::with_capacity(state.len())
    };
    let mut seen_node_exporter = HashSet::with_capacity(state.len());
    let mut seen_cadvisor = HashSet::with_capacity(state.len());

    for (node, info) in state.iter() {
        if !info.has_address() {
            debug!(node, "Skipping node without an address");
            continue;
        }

        push_unique(
            &mut targets.node_exporter,
            &mut seen_node_exporter,
            LabeledTarget::for_node(node, info, ports.node_exporter)
        );
        push_unique(
            &mut targets.cadvisor,
            &mut seen_cadvisor,
            LabeledTarget::for_node(node, info, ports.cadvisor)
        );
    }

    debug!(
        node_exporter = targets.node_exporter.len(),
        cadvisor = targets.cadvisor.len(),
        "Built scrape targets"
    );
    targets
}

fn push_unique(list: &mut Vec<LabeledTarget>, seen: &mut HashSet<String>, target: LabeledTarget) {
    if seen.insert(target.dedup_key()) {
        list.push(target);
    } else {
        debug!(address = %target.address, node = %target.node, "Dropping duplicate scrape target");
    }
}
