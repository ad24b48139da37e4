use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};

use hrm_validator::{
    config::ValidatorConfig,
    document::JsonDocumentParser,
    report::ConsoleReporter,
    sequence::{Manifest, SingleDocument},
    validator::validate_documents,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const USAGE: &str = "hrm-validator [--itype document|manifest] [--config <config.json>] <input>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputType {
    Document,
    Manifest,
}

struct Args {
    itype: InputType,
    config: Option<PathBuf>,
    input: PathBuf,
}

fn parse_args() -> Result<Args> {
    let mut itype = InputType::Document;
    let mut config = None;
    let mut input = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--itype" => {
                itype = match args.next().as_deref() {
                    Some("document") => InputType::Document,
                    Some("manifest") => InputType::Manifest,
                    Some(other) => bail!("Unknown input type {other:?}\n\nUsage:\n  {USAGE}"),
                    None => bail!("--itype needs a value\n\nUsage:\n  {USAGE}"),
                };
            }
            "--config" => {
                config = Some(PathBuf::from(args.next().context(USAGE)?));
            }
            "-h" | "--help" => bail!(
                "HRM validator — checks caption streams against the Hypothetical Render Model\n\nUsage:\n  {USAGE}"
            ),
            flag if flag.starts_with("--") => bail!("Unknown option {flag}\n\nUsage:\n  {USAGE}"),
            _ if input.is_some() => bail!("Only one input may be given\n\nUsage:\n  {USAGE}"),
            _ => input = Some(PathBuf::from(arg)),
        }
    }

    Ok(Args {
        itype,
        config,
        input: input.context(USAGE)?,
    })
}

fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => ValidatorConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ValidatorConfig::default(),
    };

    let mut reporter = ConsoleReporter::new();
    let outcome = match args.itype {
        InputType::Document => validate_documents(
            SingleDocument::open(&args.input),
            JsonDocumentParser,
            &mut reporter,
            &config,
        ),
        InputType::Manifest => {
            let manifest = Manifest::load(&args.input)?;
            validate_documents(manifest, JsonDocumentParser, &mut reporter, &config)
        }
    }
    .with_context(|| format!("Validation of {} aborted", args.input.display()))?;

    reporter.print_summary(&mut std::io::stdout(), &outcome)?;

    if reporter.failed() {
        process::exit(1);
    }

    Ok(())
}
