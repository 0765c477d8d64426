use std::error::Error;
use std::path::Path;

pub fn run(directory: &Path) -> Result<(), Box<dyn Error>> {
    let pool = super::load_pool(directory)?;
    if pool.experiments.is_empty() {
        println!("no experiments");
        return Ok(());
    }
    println!(
        "{:>4} {:<10} {:>7} {:<25} config",
        "id", "status", "reports", "last report"
    );
    for experiment in &pool.experiments {
        let last_report = experiment
            .reports
            .last()
            .map(|report| report.report_time.clone())
            .unwrap_or_else(|| "-".to_string());
        let config = serde_json::to_string(&experiment.config)?;
        println!(
            "{:>4} {:<10} {:>7} {:<25} {}",
            experiment.id,
            experiment.status.to_string(),
            experiment.reports.len(),
            last_report,
            config
        );
    }
    Ok(())
}
