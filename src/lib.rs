//! Generates a Prometheus scrape ConfigMap from Terraform cluster state.
//!
//! The library reads the `outputs.cluster_ips.value` node mapping from a
//! Terraform state document, builds ordered and deduplicated scrape targets
//! for the `node-exporter` and `cadvisor` jobs, and renders them into a
//! Kubernetes ConfigMap holding `prometheus.yml`. Every step is a pure
//! function of its input, so identical state always yields identical output.

mod config;
mod error;
mod output;
mod render;
mod state;
mod targets;

pub use config::{
    DEFAULT_CONFIGMAP_NAME, DEFAULT_STATE_PATH, GeneratorOptions, STDOUT_MARKER,
    parse_prometheus_targets,
};
pub use error::{Error, read_error, write_error};
pub use output::{OutputTarget, write_output};
pub use render::{generate, render_configmap, render_state, verify_configmap};
pub use state::{ClusterState, NodeInfo, load_state, parse_state};
pub use targets::{
    DEFAULT_CADVISOR_PORT, DEFAULT_NODE_EXPORTER_PORT, ExporterPorts, LabeledTarget,
    ScrapeTargets, extract_targets,
};
