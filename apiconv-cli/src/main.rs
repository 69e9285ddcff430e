//! Command-line interface for apiconv
//! Converts API descriptions between RAML 0.8/1.0 and OpenAPI 2.0/3.0.
//!
//! Usage:
//!   apiconv convert `<file>...` [--from `<dialect>`] [--to `<dialect>`] [--validate true|false]
//!                   [--output `<path>`] [--format yaml|json|auto] [--config `<file>`]
//!   apiconv parse `<file>` [--dialect `<dialect>`]     - Print the IR a document imports to
//!   apiconv list                                       - List available dialects
//!
//! Each input file is read and converted by its own task; results are written in the order
//! the files were given. Any failure exits with status 1.

mod files;

use apiconv::DialectKind;
use apiconv_config::{ApiconvConfig, ConfigError, Loader, OutputFormat};
use apiconv_dialects::{convert, ConvertOptions, DialectRegistry, ExportOptions};
use clap::{Arg, ArgAction, ArgMatches, Command};
use files::{parse_tree, render, CliError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

fn build_cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .short('c')
        .help("TOML file layered over the built-in defaults")
        .value_parser(clap::value_parser!(PathBuf));

    Command::new("apiconv")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert API descriptions between RAML and OpenAPI")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .subcommand(
            Command::new("convert")
                .about("Convert one or more documents")
                .arg(
                    Arg::new("files")
                        .help("Input documents (YAML or JSON)")
                        .required(true)
                        .num_args(1..)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .short('f')
                        .help("Source dialect: raml08, raml10, oas20 (default from config)"),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .short('t')
                        .help("Destination dialect: raml10, oas20, oas30 (default from config)"),
                )
                .arg(
                    Arg::new("validate")
                        .long("validate")
                        .help("Re-import the output and fail on errors (true|false)")
                        .num_args(0..=1)
                        .default_missing_value("true")
                        .value_parser(clap::value_parser!(bool)),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Write the result to this file instead of stdout")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .help("Output format: yaml, json or auto (default from config)"),
                )
                .arg(config_arg.clone()),
        )
        .subcommand(
            Command::new("parse")
                .about("Import a document and print its intermediate representation as JSON")
                .arg(
                    Arg::new("file")
                        .help("Input document")
                        .required(true)
                        .index(1)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("dialect")
                        .long("dialect")
                        .short('d')
                        .help("Dialect of the input (default: convert.from from config)"),
                )
                .arg(config_arg),
        )
        .subcommand(
            Command::new("list")
                .about("List available dialects and what they support")
                .arg(
                    Arg::new("names-only")
                        .long("names-only")
                        .help("Print only the dialect names")
                        .action(ArgAction::SetTrue),
                ),
        )
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();
    match matches.subcommand() {
        Some(("convert", sub)) => handle_convert_command(sub).await,
        Some(("parse", sub)) => handle_parse_command(sub).await,
        Some(("list", sub)) => handle_list_command(sub.get_flag("names-only")),
        _ => {}
    }
}

/// Handle the convert command
async fn handle_convert_command(matches: &ArgMatches) {
    let config = load_config(matches).unwrap_or_else(|err| fail(&err));
    init_tracing(&config.logging.filter);

    let inputs: Vec<PathBuf> = matches
        .get_many::<PathBuf>("files")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let output = matches.get_one::<PathBuf>("output").cloned();
    if output.is_some() && inputs.len() > 1 {
        fail(&CliError::Config(
            "--output takes a single input file".to_string(),
        ));
    }
    let json = config.output.format.is_json_for(output.as_deref());
    let options = convert_options(&config);
    debug!(
        from = options.from.name(),
        to = options.to.name(),
        files = inputs.len(),
        "converting"
    );

    let tasks: Vec<_> = inputs
        .into_iter()
        .map(|path| tokio::spawn(convert_file(path, options.clone(), json)))
        .collect();

    let mut failed = false;
    for task in tasks {
        let result = task
            .await
            .unwrap_or_else(|err| Err(CliError::Task(err.to_string())));
        match result {
            Ok(text) => {
                if let Err(err) = emit(output.as_deref(), &text).await {
                    report(&err);
                    failed = true;
                }
            }
            Err(err) => {
                report(&err);
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
}

async fn convert_file(
    path: PathBuf,
    options: ConvertOptions,
    json: bool,
) -> Result<String, CliError> {
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| CliError::Read {
            path: path.clone(),
            source,
        })?;
    tokio::task::spawn_blocking(move || {
        let tree = parse_tree(&path, &text)?;
        let conversion = convert(&tree, &options).map_err(|source| CliError::Convert {
            path: path.clone(),
            source,
        })?;
        for warning in &conversion.warnings {
            warn!(file = %path.display(), "{warning}");
        }
        render(&conversion.tree, options.to, json)
    })
    .await
    .map_err(|err| CliError::Task(err.to_string()))?
}

async fn emit(output: Option<&Path>, text: &str) -> Result<(), CliError> {
    match output {
        Some(path) => tokio::fs::write(path, text)
            .await
            .map_err(|source| CliError::Write {
                path: path.to_path_buf(),
                source,
            }),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

/// Handle the parse command
async fn handle_parse_command(matches: &ArgMatches) {
    let config = load_config(matches).unwrap_or_else(|err| fail(&err));
    init_tracing(&config.logging.filter);

    let dialect = match matches.get_one::<String>("dialect") {
        Some(name) => parse_dialect(name).unwrap_or_else(|err| fail(&err)),
        None => config.convert.from,
    };
    let Some(path) = matches.get_one::<PathBuf>("file").cloned() else {
        return;
    };

    let text = tokio::fs::read_to_string(&path)
        .await
        .unwrap_or_else(|source| {
            fail(&CliError::Read {
                path: path.clone(),
                source,
            })
        });
    let tree = parse_tree(&path, &text).unwrap_or_else(|err| fail(&err));
    let registry = DialectRegistry::with_defaults();
    let imported = registry
        .import(&tree, dialect.name())
        .unwrap_or_else(|source| {
            fail(&CliError::Convert {
                path: path.clone(),
                source,
            })
        });
    for warning in &imported.warnings {
        warn!(file = %path.display(), "{warning}");
    }
    let formatted = serde_json::to_string_pretty(&imported.document)
        .unwrap_or_else(|err| fail(&CliError::Render(err.to_string())));
    println!("{formatted}");
}

/// Handle the list command
fn handle_list_command(names_only: bool) {
    let registry = DialectRegistry::with_defaults();
    if !names_only {
        println!("Available dialects:\n");
    }
    for name in registry.list_dialects() {
        let Ok(dialect) = registry.get(&name) else {
            continue;
        };
        if names_only {
            println!("{name}");
            continue;
        }
        let capabilities = match (dialect.supports_import(), dialect.supports_export()) {
            (true, true) => "import, export",
            (true, false) => "import",
            (false, true) => "export",
            (false, false) => "none",
        };
        println!("  {name}");
        println!("    {} ({capabilities})", dialect.description());
        println!();
    }
}

/// Defaults, then the `--config` file, then command line flags.
fn load_config(matches: &ArgMatches) -> Result<ApiconvConfig, CliError> {
    let config_error = |err: ConfigError| CliError::Config(err.to_string());
    let mut loader = match std::env::current_dir() {
        Ok(dir) => Loader::new().with_project_file(dir),
        Err(_) => Loader::new(),
    };
    if let Some(path) = matches.get_one::<PathBuf>("config") {
        loader = loader.with_file(path);
    }
    let has = |id: &str| matches.try_contains_id(id).unwrap_or(false);
    if has("from") {
        if let Some(name) = matches.get_one::<String>("from") {
            loader = loader
                .source_dialect(parse_dialect(name)?)
                .map_err(config_error)?;
        }
    }
    if has("to") {
        if let Some(name) = matches.get_one::<String>("to") {
            loader = loader
                .target_dialect(parse_dialect(name)?)
                .map_err(config_error)?;
        }
    }
    if has("validate") {
        if let Some(validate) = matches.get_one::<bool>("validate") {
            loader = loader.validate(*validate).map_err(config_error)?;
        }
    }
    if has("format") {
        if let Some(format) = matches.get_one::<String>("format") {
            let format = format.parse::<OutputFormat>().map_err(CliError::Config)?;
            loader = loader.output_format(format).map_err(config_error)?;
        }
    }
    loader.build().map_err(config_error)
}

fn parse_dialect(name: &str) -> Result<DialectKind, CliError> {
    name.parse::<DialectKind>().map_err(CliError::Config)
}

fn convert_options(config: &ApiconvConfig) -> ConvertOptions {
    ConvertOptions {
        from: config.convert.from,
        to: config.convert.to,
        validate: config.convert.validate,
        export: ExportOptions {
            default_media_type: config.export.default_media_type.clone(),
            trait_catalog: config.export.trait_catalog,
            preserve_templates: config.export.preserve_templates,
        },
    }
}

/// Print an error and, for validation failures, every diagnostic behind it.
fn report(err: &CliError) {
    eprintln!("Error: {err}");
    if let CliError::Convert {
        source: apiconv::ConvertError::Validation { diagnostics, .. },
        ..
    } = err
    {
        for diagnostic in diagnostics {
            eprintln!("  {diagnostic}");
        }
    }
}

fn fail(err: &CliError) -> ! {
    report(err);
    std::process::exit(1);
}

/// Log to stderr; `RUST_LOG` wins over `logging.filter`.
fn init_tracing(default_filter: &str) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}
