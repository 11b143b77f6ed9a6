//! Command-line interface for the promgen binary.
//!
//! Reads a Terraform state file, renders the Prometheus scrape ConfigMap and
//! writes it to stdout or a file. Every option can also be supplied through a
//! `PROMGEN_*` environment variable.

use std::{
    io::{self, Write},
    path::PathBuf,
    process,
};

use clap::{ArgAction, Parser};
use promgen::{
    DEFAULT_CADVISOR_PORT, DEFAULT_CONFIGMAP_NAME, DEFAULT_NODE_EXPORTER_PORT, DEFAULT_STATE_PATH,
    Error, ExporterPorts, GeneratorOptions, OutputTarget, STDOUT_MARKER, load_state,
    parse_prometheus_targets, render_state, verify_configmap, write_output,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Command line interface for rendering the Prometheus scrape ConfigMap.
#[derive(Debug, Parser,)]
#[command(
    name = "promgen",
    version,
    about = "Render a Prometheus scrape ConfigMap from Terraform cluster state"
)]
struct Cli
{
    /// Path to the Terraform state file (JSON).
    #[arg(
        short = 'i',
        long = "input",
        env = "PROMGEN_INPUT",
        value_name = "PATH",
        default_value = DEFAULT_STATE_PATH
    )]
    input: PathBuf,

    /// Output path for the ConfigMap YAML; `-` prints to stdout.
    #[arg(
        short = 'o',
        long = "output",
        env = "PROMGEN_OUTPUT",
        value_name = "PATH",
        default_value = STDOUT_MARKER
    )]
    output: PathBuf,

    /// ConfigMap namespace.
    #[arg(long = "namespace", env = "PROMGEN_NAMESPACE", default_value = "")]
    namespace: String,

    /// ConfigMap name.
    #[arg(long = "cm-name", env = "PROMGEN_CM_NAME", default_value = DEFAULT_CONFIGMAP_NAME)]
    cm_name: String,

    /// Port of the node-exporter endpoint on each node.
    #[arg(long = "node-port", env = "PROMGEN_NODE_PORT", default_value_t = DEFAULT_NODE_EXPORTER_PORT)]
    node_port: u16,

    /// Port of the cAdvisor endpoint on each node.
    #[arg(
        long = "cadvisor-port",
        env = "PROMGEN_CADVISOR_PORT",
        default_value_t = DEFAULT_CADVISOR_PORT
    )]
    cadvisor_port: u16,

    /// Comma-separated static targets for the 'prometheus' job. The job is
    /// omitted when empty.
    #[arg(
        long = "prom-targets",
        env = "PROMGEN_PROM_TARGETS",
        value_name = "ADDRS",
        default_value = ""
    )]
    prom_targets: String,

    /// Parse the rendered document back as YAML before writing it.
    #[arg(long = "check", action = ArgAction::SetTrue)]
    check: bool,
}

impl Cli
{
    fn generator_options(&self,) -> GeneratorOptions
    {
        GeneratorOptions {
            namespace:          self.namespace.clone(),
            configmap_name:     self.cm_name.clone(),
            ports:              ExporterPorts {
                node_exporter: self.node_port,
                cadvisor:      self.cadvisor_port,
            },
            prometheus_targets: parse_prometheus_targets(&self.prom_targets,),
        }
    }
}

/// Entry point that reports errors and sets the appropriate exit status.
fn main()
{
    init_tracing();

    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if let Err(error,) = run(&cli, &mut handle,) {
        eprintln!("error: {}", error.to_display_string());
        process::exit(1,);
    }
}

/// Installs a stderr subscriber so stdout stays reserved for the document.
fn init_tracing()
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn",),);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr,),)
        .with(filter,)
        .init();
}

/// Executes the CLI using parsed arguments.
///
/// Rendering completes before anything is written, so a failure never leaves
/// partial output behind.
///
/// # Errors
///
/// Propagates read, parse, empty-state, check and write errors.
fn run<W: Write,>(cli: &Cli, stdout: &mut W,) -> Result<(), Error,>
{
    let options = cli.generator_options();
    let state = load_state(&cli.input,)?;
    let rendered = render_state(&state, &options,);

    if cli.check {
        verify_configmap(&rendered,)?;
    }

    let target = OutputTarget::from_arg(&cli.output,);
    info!(destination = %target, "Writing configmap");
    write_output(&target, &rendered, stdout,)
}
