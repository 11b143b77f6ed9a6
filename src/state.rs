// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Terraform state document types and the loader that resolves the
//! `outputs.cluster_ips.value` mapping.
//!
//! Only the node mapping is modelled; every other field of the state file is
//! ignored. A node name repeated in the document keeps its last value.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{self, Error};

/// Address details published for a single cluster node.
///
/// Missing fields decode as empty strings, matching how Terraform emits
/// partially populated objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NodeInfo {
    /// Cluster the node belongs to.
    pub cluster: String,
    /// Node address without a port. Empty addresses are skipped.
    pub ip:      String,
    /// Node role such as `control-node` or `worker-node`. May be empty.
    pub role:    String
}

impl NodeInfo {
    /// Returns `true` when the node carries a non-blank address.
    pub fn has_address(&self) -> bool {
        !self.ip.trim().is_empty()
    }
}

/// Node mapping resolved from `outputs.cluster_ips.value`.
///
/// # Examples
///
/// ```
/// use promgen::parse_state;
///
/// let json = br#"{"outputs":{"cluster_ips":{"value":{
///     "n1":{"ip":"10.0.0.1","cluster":"c1","role":"worker-node"}
/// }}}}"#;
/// let state = parse_state(json).expect("valid state");
/// assert_eq!(state.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ClusterState {
    nodes: BTreeMap<String, NodeInfo>
}

impl ClusterState {
    /// Number of distinct node names.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` when the mapping holds no entries.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over `(node, info)` entries in ascending byte-wise order of
    /// node name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeInfo)> {
        self.nodes.iter().map(|(name, info)| (name.as_str(), info))
    }
}

impl FromIterator<(String, NodeInfo)> for ClusterState {
    fn from_iter<I: IntoIterator<Item = (String, NodeInfo)>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect()
        }
    }
}

#[derive(Debug, Deserialize)]
struct TerraformState {
    #[serde(default)]
    outputs: Option<Outputs>
}

#[derive(Debug, Deserialize)]
struct Outputs {
    #[serde(default)]
    cluster_ips: Option<ClusterIpsOutput>
}

#[derive(Debug, Deserialize)]
struct ClusterIpsOutput {
    #[serde(default)]
    value: Option<ClusterState>
}

/// Reads and parses the Terraform state file at `path`.
///
/// # Errors
///
/// Returns [`Error::Read`] when the file cannot be read, plus every error
/// documented on [`parse_state`].
pub fn load_state(path: &Path) -> Result<ClusterState, Error> {
    debug!("Reading terraform state from {}", path.display());
    let contents = fs::read(path).map_err(|source| error::read_error(path, source))?;
    parse_state(&contents)
}

/// Parses Terraform state bytes into a [`ClusterState`].
///
/// # Errors
///
/// Returns [`Error::Parse`] when the bytes are not valid JSON or the node
/// mapping has the wrong shape, and [`Error::EmptyState`] when the
/// `outputs.cluster_ips.value` path is absent or empty.
pub fn parse_state(contents: &[u8]) -> Result<ClusterState, Error> {
    let document: TerraformState = serde_json::from_slice(contents)?;

    let state = document
        .outputs
        .and_then(|outputs| outputs.cluster_ips)
        .and_then(|output| output.value)
        .unwrap_or_default();

    if state.is_empty() {
        return Err(Error::empty_state(
            "no outputs.cluster_ips.value found in terraform state"
        ));
    }

    info!(nodes = state.len(), "Parsed terraform state");
    Ok(state)
}
