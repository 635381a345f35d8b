use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use error_stack::ResultExt;
use lab_grading::{
    adapters::sheets::spreadsheet_manager::SpreadsheetManager,
    application::{
        grade_computer::GradeComputer,
        orchestrator::{Orchestrator, RunStage},
    },
    cli::{exit_code, Args},
    config::{app_config::AppConfig, course_registry::CourseRegistry},
    domain::grading::RunReport,
    error::{GradingError, Result},
    prettyprint::PrettyFormatter,
};
use tracing::{instrument, Instrument};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Registry};

const LOG_FILE: &str = "lab_grading.log";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = setup_tracing(args.log_level()) {
        eprintln!("Failed to set up logging: {err}");
        return ExitCode::from(2);
    }
    setup_panic_hook();

    let result = run(&args).await;
    match &result {
        Ok(report) => println!("{}", report),
        Err(report) => tracing::error!("❌ Grading failed: {:?}", report),
    }
    ExitCode::from(exit_code(&result))
}

#[instrument(skip_all, fields(lab = args.lab, course = %args.course))]
async fn run(args: &Args) -> Result<RunReport> {
    let config = AppConfig::load(args.config.as_deref())?.with_registers(args.registers.clone());
    let registry = CourseRegistry::load(&config.registers)?;
    let request = args.request();

    // Input errors surface before authenticating.
    GradeComputer::new(&config.grading)?.validate_lab(request.lab)?;
    registry.resolve(&request.course)?;

    let gateway = SpreadsheetManager::new(config.auth.clone())
        .instrument(tracing::info_span!("stage", name = %RunStage::Authenticating))
        .await
        .change_context(GradingError::RemoteRead)
        .attach_printable_lazy(|| format!("Credentials: {}", config.auth.credentials.display()))?;

    if args.dry_run {
        tracing::warn!("Dry run: nothing will be written");
    }

    let orchestrator =
        Orchestrator::from_config(&config, registry, Arc::new(gateway), args.write_options())?;
    orchestrator.run(&request).await
}

fn setup_tracing(level: tracing::Level) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let indicatif_layer = IndicatifLayer::new();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(PrettyFormatter::new(true))
        .with_writer(indicatif_layer.get_stderr_writer());

    let log_file_layer = tracing_subscriber::fmt::layer()
        .event_format(PrettyFormatter::new(false))
        .with_writer(std::fs::File::create(LOG_FILE)?)
        .with_ansi(false);

    Registry::default()
        .with(tracing_subscriber::filter::Targets::new().with_target("lab_grading", level))
        .with(indicatif_layer)
        .with(log_file_layer)
        .with(stderr_layer)
        .try_init()?;

    Ok(())
}

fn setup_panic_hook() {
    tracing::trace!("Setting panic hook");
    std::panic::set_hook(Box::new(|info| {
        tracing::error!("panic: {info}");
    }));
}
