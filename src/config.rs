// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Generator options and their defaults.
//!
//! The CLI maps its arguments onto [`GeneratorOptions`]; library callers can
//! start from [`GeneratorOptions::default`] and override individual fields.

use crate::targets::ExporterPorts;

/// ConfigMap name used when none is supplied.
pub const DEFAULT_CONFIGMAP_NAME: &str = "prometheus-config";
/// Terraform state path read when none is supplied.
pub const DEFAULT_STATE_PATH: &str = "./locals/config/terraform/terraform.tfstate";
/// Output path meaning "write to stdout".
pub const STDOUT_MARKER: &str = "-";

/// Options controlling how the ConfigMap is rendered.
///
/// # Examples
///
/// ```
/// use promgen::GeneratorOptions;
///
/// let options = GeneratorOptions::default();
/// assert_eq!(options.configmap_name, "prometheus-config");
/// assert_eq!(options.ports.node_exporter, 9102);
/// assert!(options.prometheus_targets.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions
{
    /// `metadata.namespace` of the ConfigMap. May be empty.
    pub namespace:          String,
    /// `metadata.name` of the ConfigMap.
    pub configmap_name:     String,
    /// Ports appended to each node address.
    pub ports:              ExporterPorts,
    /// Static targets of the optional `prometheus` job, sorted ascending.
    pub prometheus_targets: Vec<String,>,
}

impl Default for GeneratorOptions
{
    fn default() -> Self
    {
        Self {
            namespace:          String::new(),
            configmap_name:     DEFAULT_CONFIGMAP_NAME.to_owned(),
            ports:              ExporterPorts::default(),
            prometheus_targets: Vec::new(),
        }
    }
}

/// Parses a comma-separated list of static `prometheus` job targets.
///
/// Entries are trimmed, blank entries are dropped and the result is sorted
/// ascending. Blank input yields an empty list, which omits the job.
///
/// # Examples
///
/// ```
/// use promgen::parse_prometheus_targets;
///
/// let targets = parse_prometheus_targets("5.6.7.8:9090, 1.2.3.4:9090",);
/// assert_eq!(targets, ["1.2.3.4:9090", "5.6.7.8:9090"]);
/// ```
pub fn parse_prometheus_targets(csv: &str,) -> Vec<String,>
{
    let mut targets: Vec<String,> = csv
        .split(',',)
        .map(str::trim,)
        .filter(|entry| !entry.is_empty(),)
        .map(str::to_owned,)
        .collect();
    targets.sort();
    targets
}
