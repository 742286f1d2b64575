use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use validate_records::{
    Cli, Config, ConfigError, ConfigManager, ErrorReporter, FileDiscovery, Output,
    ProgressCallback, SchemaLoader, ValidationConfig, ValidationEngine, ValidationError,
    ValidationProgress, VerbosityLevel,
};

const EXIT_VALIDATION_FAILED: u8 = 1;
const EXIT_OPERATIONAL_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        return ExitCode::from(EXIT_OPERATIONAL_ERROR);
    }

    let config = match ConfigManager::load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            ErrorReporter::new(cli.verbosity()).report_config_error(&e);
            return ExitCode::from(EXIT_OPERATIONAL_ERROR);
        }
    };

    let verbosity = config.verbosity();
    init_tracing(verbosity);
    tracing::debug!(?config, "resolved configuration");

    let reporter = ErrorReporter::new(verbosity);
    match run(&cli, &config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_VALIDATION_FAILED),
        Err(e) => {
            if let Some(error) = e.downcast_ref::<ValidationError>() {
                reporter.report_validation_error(error);
            } else if let Some(error) = e.downcast_ref::<ConfigError>() {
                reporter.report_config_error(error);
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::from(EXIT_OPERATIONAL_ERROR)
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the verbosity-derived filter.
fn init_tracing(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Validate every document under the CLI path; `Ok(true)` iff all of them passed.
async fn run(cli: &Cli, config: &Config) -> Result<bool> {
    let schema = SchemaLoader::load(config.schema_path()?).await?;

    let discovery = FileDiscovery::new()
        .with_extensions(config.files.extensions.clone())
        .with_include_patterns(config.files.include_patterns.clone())?
        .with_exclude_patterns(config.files.exclude_patterns.clone())?
        .with_max_depth(config.files.max_depth)
        .with_follow_symlinks(config.files.follow_symlinks);

    let engine = ValidationEngine::new(
        schema,
        config.records.clone(),
        ValidationConfig {
            max_concurrent_validations: ConfigManager::get_thread_count(config),
            validation_timeout: ConfigManager::get_timeout_duration(config),
            fail_fast: config.validation.fail_fast,
            collect_metrics: config.verbosity() >= VerbosityLevel::Verbose,
        },
    );

    let verbosity = config.verbosity();
    let progress: Option<ProgressCallback> =
        if config.validation.show_progress && verbosity != VerbosityLevel::Quiet {
            let progress_reporter = ErrorReporter::new(verbosity);
            Some(Arc::new(move |update: ValidationProgress| {
                progress_reporter.report_progress(&update)
            }))
        } else {
            None
        };

    let results = engine
        .validate_path_with_progress(&cli.path, &discovery, progress)
        .await?;

    if results.total_files == 0 {
        tracing::warn!(path = %cli.path.display(), "no documents found");
    }

    let rendered = Output::new(verbosity, config.output.format.into()).render(&results)?;
    print!("{}", rendered);

    Ok(results.all_valid())
}
