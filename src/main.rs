use anyhow::{Context, Result};
use clap::Parser;
use pairbench::{
    cli::Cli,
    config::parse_comparisons,
    placement::CpuSetPair,
    report::{ConsoleReporter, CpuSummary, ResultLog},
    runner::TrialRunner,
    session::SessionController,
    topology::{processor_model, CpuTopology},
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; warnings are always shown
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let harness = args.harness_config()?;
    harness.validate()?;

    // Reject the whole invocation before any process is launched
    let comparisons = match parse_comparisons(&args.comparisons) {
        Ok(comparisons) => comparisons,
        Err(e) => anyhow::bail!("Bad input: {}", e),
    };

    let topology = CpuTopology::discover();
    let placement = CpuSetPair::plan(&topology);
    if placement.is_degenerate() {
        tracing::warn!("Single logical CPU: baseline and candidate will share it");
    }
    tracing::debug!(?topology, ?placement, "CPU placement planned");

    let cpu = CpuSummary::new(&topology, processor_model());
    let mut failed = 0;

    for (i, config) in comparisons.iter().enumerate() {
        let runner = TrialRunner::new(config, &harness, placement.clone())
            .context("Failed to compile metric pattern")?;
        let mut reporter = ConsoleReporter::new(
            harness.output_format,
            Some(ResultLog::for_today(&harness.results_dir)),
            cpu.clone(),
        );

        if let Err(e) = SessionController::new(config.clone(), runner).run(&mut reporter) {
            eprintln!(
                "Comparison {} ({} vs {}) aborted: {}",
                i + 1,
                config.baseline(),
                config.candidate(),
                e
            );
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} comparison(s) failed", failed, comparisons.len());
    }

    Ok(())
}
