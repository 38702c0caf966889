use std::process::ExitCode;

use anyhow::bail;
use clap::Parser;
use hive_config::{encode_document, Source};
use hive_core::VersionInfo;
use hive_runtime::{RuntimeConfig, Service};
use tracing_subscriber::EnvFilter;

/// Hive component runtime
///
/// Loads a component configuration, resolves references between the
/// declared components and runs them through their lifecycle.
#[derive(Parser, Debug)]
#[clap(name = "hive", about, disable_version_flag = true)]
struct Cli {
    /// Configuration source: a file path, `-` for standard input, or an
    /// http(s) URL
    config: Option<String>,

    /// Expand `{{ }}` template actions against the `Context` section
    #[clap(short = 'T', long)]
    template: bool,

    /// Print the expanded configuration and exit
    #[clap(short, long)]
    print: bool,

    /// Validate the configuration and component references, then exit
    #[clap(short, long)]
    test: bool,

    /// Print version information and exit
    #[clap(short, long)]
    version: bool,

    /// Configuration format (json, toml or yaml); inferred from the file extension
    /// when omitted
    #[clap(short, long)]
    format: Option<String>,

    /// Seconds each component gets to shut down
    #[clap(long, default_value_t = 30)]
    shutdown_timeout: u32,

    /// List registered components and exit
    #[clap(long)]
    list: bool,
}

fn init_tracing() {
    // Runtime notices are opt-in; the logger component installs its own
    // subscriber otherwise.
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.version {
        println!(
            "{}",
            VersionInfo::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        );
        return Ok(());
    }

    let registry = hive_runtime::global();
    hive_components::register_all(registry)?;

    if cli.list {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    let Some(config) = cli.config else {
        bail!("no configuration given (pass a path, a URL or - for standard input)");
    };
    let source = Source::parse(&config);
    let service = Service::new(
        registry,
        RuntimeConfig {
            shutdown_timeout: cli.shutdown_timeout,
            enable_template: cli.template,
            format: cli.format,
        },
    )?;

    if cli.print {
        let document = service.load(&source).await?;
        let codec = service.config().codec_for(&source)?;
        println!("{}", encode_document(&document, codec)?.trim_end());
        return Ok(());
    }

    if cli.test {
        let document = service.load(&source).await?;
        let graph = service.build(&document)?;
        println!("configuration OK: {} component(s)", graph.len());
        return Ok(());
    }

    service.run(&source).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
