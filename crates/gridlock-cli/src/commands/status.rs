use std::error::Error;
use std::path::Path;

use gridlock_core::ExperimentStatus;

pub fn run(directory: &Path) -> Result<(), Box<dyn Error>> {
    let pool = super::load_pool(directory)?;
    println!("pool:     {}", directory.display());
    println!("created:  {}", pool.creation_time);
    println!("modified: {}", pool.modification_time);
    println!("experiments: {}", pool.experiments.len());
    for status in [
        ExperimentStatus::Unassigned,
        ExperimentStatus::Assigned,
        ExperimentStatus::Preempted,
    ] {
        println!("  {:<10} {}", status.to_string(), pool.count_with_status(status));
    }
    Ok(())
}
