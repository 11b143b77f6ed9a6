// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Renders the Prometheus ConfigMap document.
//!
//! The output is assembled line by line rather than through a YAML serializer
//! so that field order, quoting and indentation are byte-for-byte stable
//! across runs. Every exporter target gets its own `static_configs` entry so
//! its labels stay attached to that single address.

use std::borrow::Cow;

use serde_yaml::Value;
use tracing::debug;

use crate::{
    config::GeneratorOptions,
    error::Error,
    state::{ClusterState, parse_state},
    targets::{LabeledTarget, extract_targets}
};

const NODE_EXPORTER_JOB: &str = "node-exporter";
const CADVISOR_JOB: &str = "cadvisor";
const PROMETHEUS_JOB: &str = "prometheus";

/// Renders the ConfigMap YAML for the provided targets.
///
/// The `prometheus` job is emitted only when `prometheus_targets` is not
/// empty. Callers are expected to pass targets already ordered; the renderer
/// writes them as given.
///
/// # Examples
///
/// ```
/// use promgen::render_configmap;
///
/// let yaml = render_configmap("monitoring", "prometheus-config", &[], &[], &[]);
/// assert!(yaml.starts_with("apiVersion: v1\nkind: ConfigMap\n"));
/// assert!(!yaml.contains("job_name: 'prometheus'"));
/// ```
pub fn render_configmap(
    namespace: &str,
    name: &str,
    prometheus_targets: &[String],
    node_exporter: &[LabeledTarget],
    cadvisor: &[LabeledTarget]
) -> String {
    use std::fmt::Write as _;

    let mut buffer = String::with_capacity(
        512 + 160 * (node_exporter.len() + cadvisor.len()) + 32 * prometheus_targets.len()
    );

    let _ = writeln!(
        buffer,
        "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: {name}\n  namespace: {namespace}"
    );
    buffer.push_str("data:\n  prometheus.yml: |-\n");
    buffer.push_str("    global:\n");
    buffer.push_str("      scrape_interval: 15s\n");
    buffer.push_str("      evaluation_interval: 15s\n\n");
    buffer.push_str("    scrape_configs:\n");

    if !prometheus_targets.is_empty() {
        let _ = writeln!(buffer, "      - job_name: '{PROMETHEUS_JOB}'");
        buffer.push_str("        static_configs:\n");
        buffer.push_str("          - targets:\n");
        for target in prometheus_targets {
            let _ = writeln!(buffer, "            - \"{}\"", escape_double_quoted(target));
        }
    }

    write_labeled_job(&mut buffer, NODE_EXPORTER_JOB, node_exporter);
    write_labeled_job(&mut buffer, CADVISOR_JOB, cadvisor);

    buffer
}

fn write_labeled_job(buffer: &mut String, job: &str, targets: &[LabeledTarget]) {
    use std::fmt::Write as _;

    let _ = writeln!(buffer, "      - job_name: '{job}'");
    buffer.push_str("        static_configs:\n");
    for target in targets {
        buffer.push_str("          - targets:\n");
        let _ = writeln!(
            buffer,
            "              - \"{}\"",
            escape_double_quoted(&target.address)
        );
        buffer.push_str("            labels:\n");
        let _ = writeln!(
            buffer,
            "              node: \"{}\"",
            escape_double_quoted(&target.node)
        );
        let _ = writeln!(
            buffer,
            "              cluster: \"{}\"",
            escape_double_quoted(&target.cluster)
        );
        if !target.role.is_empty() {
            let _ = writeln!(
                buffer,
                "              role: \"{}\"",
                escape_double_quoted(&target.role)
            );
        }
    }
}

fn escape_double_quoted(value: &str) -> Cow<'_, str> {
    if value.contains(['"', '\\']) {
        let mut escaped = String::with_capacity(value.len() + 2);
        for character in value.chars() {
            match character {
                '"' => escaped.push_str("\\\""),
                '\\' => escaped.push_str("\\\\"),
                other => escaped.push(other)
            }
        }
        Cow::Owned(escaped)
    } else {
        Cow::Borrowed(value)
    }
}

/// Runs the full pipeline: parses state bytes, builds the exporter targets
/// and renders the ConfigMap.
///
/// # Errors
///
/// Propagates [`Error::Parse`] and [`Error::EmptyState`] from the state
/// parser. Target extraction and rendering cannot fail.
///
/// # Examples
///
/// ```
/// use promgen::{GeneratorOptions, generate};
///
/// let json = br#"{"outputs":{"cluster_ips":{"value":{
///     "a":{"ip":"10.0.0.1","cluster":"c1","role":""}
/// }}}}"#;
/// let yaml = generate(json, &GeneratorOptions::default()).expect("rendered configmap");
/// assert!(yaml.contains("- \"10.0.0.1:9102\""));
/// assert!(yaml.contains("- \"10.0.0.1:9101\""));
/// ```
pub fn generate(contents: &[u8], options: &GeneratorOptions) -> Result<String, Error> {
    let state = parse_state(contents)?;
    Ok(render_state(&state, options))
}

/// Builds the exporter targets for an already parsed state and renders the
/// ConfigMap.
///
/// Nodes without a usable address are left out; when none has one, both
/// exporter jobs are rendered without `static_configs` entries.
pub fn render_state(state: &ClusterState, options: &GeneratorOptions) -> String {
    let targets = extract_targets(state, options.ports);

    debug!(
        name = %options.configmap_name,
        namespace = %options.namespace,
        prometheus = options.prometheus_targets.len(),
        "Rendering configmap"
    );
    render_configmap(
        &options.namespace,
        &options.configmap_name,
        &options.prometheus_targets,
        &targets.node_exporter,
        &targets.cadvisor
    )
}

/// Checks that a rendered ConfigMap is structurally valid YAML, including the
/// embedded `prometheus.yml` document.
///
/// No Kubernetes or Prometheus schema validation is performed.
///
/// # Errors
///
/// Returns [`Error::RenderCheck`] when either document fails to parse or the
/// `data.prometheus.yml` entry is missing.
pub fn verify_configmap(rendered: &str) -> Result<(), Error> {
    let document: Value = serde_yaml::from_str(rendered)
        .map_err(|error| Error::render_check(format!("configmap: {error}")))?;

    let embedded = document
        .get("data")
        .and_then(|data| data.get("prometheus.yml"))
        .and_then(Value::as_str)
        .ok_or_else(|| Error::render_check("data.prometheus.yml is missing or not a string"))?;

    serde_yaml::from_str::<Value>(embedded)
        .map_err(|error| Error::render_check(format!("prometheus.yml: {error}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_yaml::Value;

    use super::{generate, render_configmap, verify_configmap};
    use crate::{
        Error, GeneratorOptions,
        targets::{ExporterPorts, LabeledTarget}
    };

    const TWO_NODES: &str = r#"{"outputs":{"cluster_ips":{"value":{"b":{"ip":"10.0.0.2","cluster":"c1","role":"worker-node"},"a":{"ip":"10.0.0.1","cluster":"c1","role":"control-node"}}}}}"#;

    const EXPECTED_TWO_NODES: &str = r#"apiVersion: v1
kind: ConfigMap
metadata:
  name: prometheus-config
  namespace: monitoring
data:
  prometheus.yml: |-
    global:
      scrape_interval: 15s
      evaluation_interval: 15s

    scrape_configs:
      - job_name: 'prometheus'
        static_configs:
          - targets:
            - "1.2.3.4:9090"
            - "5.6.7.8:9090"
      - job_name: 'node-exporter'
        static_configs:
          - targets:
              - "10.0.0.1:9102"
            labels:
              node: "a"
              cluster: "c1"
              role: "control-node"
          - targets:
              - "10.0.0.2:9102"
            labels:
              node: "b"
              cluster: "c1"
              role: "worker-node"
      - job_name: 'cadvisor'
        static_configs:
          - targets:
              - "10.0.0.1:9101"
            labels:
              node: "a"
              cluster: "c1"
              role: "control-node"
          - targets:
              - "10.0.0.2:9101"
            labels:
              node: "b"
              cluster: "c1"
              role: "worker-node"
"#;

    fn target(address: &str, node: &str, role: &str) -> LabeledTarget {
        LabeledTarget {
            address: address.to_owned(),
            node:    node.to_owned(),
            cluster: "c1".to_owned(),
            role:    role.to_owned()
        }
    }

    fn options_with_prometheus() -> GeneratorOptions {
        GeneratorOptions {
            namespace: "monitoring".to_owned(),
            prometheus_targets: vec!["1.2.3.4:9090".to_owned(), "5.6.7.8:9090".to_owned()],
            ..GeneratorOptions::default()
        }
    }

    fn scrape_configs(rendered: &str) -> Vec<Value> {
        let document: Value = serde_yaml::from_str(rendered).expect("configmap must parse");
        let embedded = document["data"]["prometheus.yml"]
            .as_str()
            .expect("prometheus.yml must be a string")
            .to_owned();
        let config: Value = serde_yaml::from_str(&embedded).expect("prometheus.yml must parse");
        config["scrape_configs"]
            .as_sequence()
            .expect("scrape_configs must be a list")
            .clone()
    }

    fn job<'a>(jobs: &'a [Value], name: &str) -> Option<&'a Value> {
        jobs.iter().find(|job| job["job_name"].as_str() == Some(name))
    }

    #[test]
    fn renders_exact_document() {
        let rendered =
            generate(TWO_NODES.as_bytes(), &options_with_prometheus()).expect("expected output");
        assert_eq!(rendered, EXPECTED_TWO_NODES);
    }

    #[test]
    fn rendering_is_deterministic() {
        let first =
            generate(TWO_NODES.as_bytes(), &options_with_prometheus()).expect("expected output");
        let second =
            generate(TWO_NODES.as_bytes(), &options_with_prometheus()).expect("expected output");
        assert_eq!(first, second);
    }

    #[test]
    fn empty_namespace_renders_blank_value() {
        let rendered = render_configmap("", "prometheus-config", &[], &[], &[]);
        assert!(rendered.contains("  name: prometheus-config\n  namespace: \ndata:\n"));
    }

    #[test]
    fn omits_prometheus_job_without_targets() {
        let rendered = render_configmap(
            "",
            "prometheus-config",
            &[],
            &[target("10.0.0.1:9102", "a", "")],
            &[target("10.0.0.1:9101", "a", "")]
        );

        assert!(!rendered.contains("job_name: 'prometheus'"));
        let jobs = scrape_configs(&rendered);
        assert_eq!(jobs.len(), 2);
        assert!(job(&jobs, "prometheus").is_none());
    }

    #[test]
    fn empty_role_suppresses_label() {
        let rendered = render_configmap(
            "ns",
            "cm",
            &[],
            &[target("10.0.0.1:9102", "a", ""), target("10.0.0.2:9102", "b", "worker-node")],
            &[]
        );

        assert_eq!(rendered.matches("role: ").count(), 1);
        let jobs = scrape_configs(&rendered);
        let node_exporter = job(&jobs, "node-exporter").expect("node-exporter job");
        let entries = node_exporter["static_configs"]
            .as_sequence()
            .expect("static_configs list");
        assert!(entries[0]["labels"].get("role").is_none());
        assert_eq!(entries[1]["labels"]["role"].as_str(), Some("worker-node"));
    }

    #[test]
    fn emits_one_static_config_per_node() {
        let json = r#"{"outputs":{"cluster_ips":{"value":{
            "w2":{"ip":"10.0.0.12","cluster":"c1","role":"worker-node"},
            "cp":{"ip":"10.0.0.10","cluster":"c1","role":"control-node"},
            "gone":{"ip":"","cluster":"c1","role":"worker-node"},
            "w1":{"ip":"10.0.0.11","cluster":"c1","role":"worker-node"}
        }}}}"#;

        let rendered =
            generate(json.as_bytes(), &GeneratorOptions::default()).expect("expected output");
        let jobs = scrape_configs(&rendered);

        for name in ["node-exporter", "cadvisor"] {
            let entries = job(&jobs, name)
                .and_then(|job| job["static_configs"].as_sequence())
                .expect("static_configs list");
            assert_eq!(entries.len(), 3);

            let nodes: Vec<&str> = entries
                .iter()
                .filter_map(|entry| entry["labels"]["node"].as_str())
                .collect();
            assert_eq!(nodes, ["cp", "w1", "w2"]);
        }
        assert!(!rendered.contains("gone"));
    }

    #[test]
    fn custom_ports_flow_into_addresses() {
        let options = GeneratorOptions {
            ports: ExporterPorts {
                node_exporter: 9100,
                cadvisor:      8080
            },
            ..GeneratorOptions::default()
        };

        let rendered = generate(TWO_NODES.as_bytes(), &options).expect("expected output");
        assert!(rendered.contains("- \"10.0.0.1:9100\""));
        assert!(rendered.contains("- \"10.0.0.2:8080\""));
        assert!(!rendered.contains(":9102"));
    }

    #[test]
    fn quotes_and_backslashes_stay_valid_yaml() {
        let rendered = render_configmap(
            "ns",
            "cm",
            &[],
            &[target("10.0.0.1:9102", "odd\"name\\x", "")],
            &[]
        );

        verify_configmap(&rendered).expect("expected structurally valid output");
        let jobs = scrape_configs(&rendered);
        let node_exporter = job(&jobs, "node-exporter").expect("node-exporter job");
        assert_eq!(
            node_exporter["static_configs"][0]["labels"]["node"].as_str(),
            Some("odd\"name\\x")
        );
    }

    #[test]
    fn generated_output_passes_structural_check() {
        let rendered =
            generate(TWO_NODES.as_bytes(), &options_with_prometheus()).expect("expected output");
        verify_configmap(&rendered).expect("expected structurally valid output");

        let jobs = scrape_configs(&rendered);
        let prometheus = job(&jobs, "prometheus").expect("prometheus job");
        let targets: Vec<&str> = prometheus["static_configs"][0]["targets"]
            .as_sequence()
            .expect("targets list")
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(targets, ["1.2.3.4:9090", "5.6.7.8:9090"]);
    }

    #[test]
    fn structural_check_rejects_broken_documents() {
        let error = verify_configmap("data: [unclosed\n").expect_err("expected failure");
        assert!(matches!(error, Error::RenderCheck { .. }));

        let error = verify_configmap("apiVersion: v1\nkind: ConfigMap\n").expect_err("expected failure");
        match error {
            Error::RenderCheck {
                message
            } => assert!(message.contains("prometheus.yml")),
            other => panic!("unexpected error variant: {other:?}")
        }
    }

    #[test]
    fn renders_both_jobs_without_entries_when_no_node_has_an_address() {
        let json = r#"{"outputs":{"cluster_ips":{"value":{
            "a":{"ip":"","cluster":"c1","role":"worker-node"},
            "b":{"ip":"   ","cluster":"c1","role":"worker-node"}
        }}}}"#;

        let rendered =
            generate(json.as_bytes(), &GeneratorOptions::default()).expect("expected output");
        verify_configmap(&rendered).expect("expected structurally valid output");

        let jobs = scrape_configs(&rendered);
        assert_eq!(jobs.len(), 2);
        for name in ["node-exporter", "cadvisor"] {
            let node_job = job(&jobs, name).expect("exporter job");
            let entries = node_job["static_configs"]
                .as_sequence()
                .map_or(0, Vec::len);
            assert_eq!(entries, 0);
        }
        assert!(!rendered.contains("labels:"));
    }

    #[test]
    fn generate_propagates_state_errors() {
        let error = generate(b"42", &GeneratorOptions::default()).expect_err("expected error");
        assert!(matches!(error, Error::Parse { .. }));

        let error = generate(br#"{"outputs":{}}"#, &GeneratorOptions::default())
            .expect_err("expected error");
        assert!(matches!(error, Error::EmptyState { .. }));
    }
}
