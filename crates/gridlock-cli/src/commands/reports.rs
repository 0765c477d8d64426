use std::error::Error;
use std::path::Path;

use clap::Args;
use gridlock_core::ExperimentId;

#[derive(Args, Debug)]
pub struct ReportsArgs {
    /// Experiment id to inspect.
    #[arg(long)]
    pub id: u64,
}

pub fn run(directory: &Path, args: &ReportsArgs) -> Result<(), Box<dyn Error>> {
    let pool = super::load_pool(directory)?;
    let id = ExperimentId::from_raw(args.id);
    let experiment = pool
        .experiment(id)
        .ok_or_else(|| format!("experiment #{id} not found in {}", directory.display()))?;
    println!(
        "experiment #{} [{}] config {}",
        experiment.id,
        experiment.status,
        serde_json::to_string(&experiment.config)?
    );
    if experiment.reports.is_empty() {
        println!("no reports");
        return Ok(());
    }
    for report in &experiment.reports {
        println!(
            "epoch={:<5} time={} metrics={}",
            report.epoch,
            report.report_time,
            serde_json::to_string(&report.metrics)?
        );
    }
    Ok(())
}
