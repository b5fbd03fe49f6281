use anyhow::{Context, Result};
use log::info;

use crate::ledm_client::client::LedmClient;
use crate::ledm_client::models::{JobState, JobType};

/// Submits one internal print job and waits for its terminal state.
pub trait RunPrintJob {
    fn run_job(&self, job_type: JobType) -> Result<JobState>;
}

impl RunPrintJob for LedmClient {
    fn run_job(&self, job_type: JobType) -> Result<JobState> {
        let job_url = self.submit_job(job_type)?;
        self.poll_to_completion(&job_url)
    }
}

/// Runs cleaning cycles 1..=cycles in order, each optionally followed by a
/// verification sheet. A cycle never starts before the previous job (and its
/// verification sheet, if requested) reached a terminal state.
pub fn run_cycles(printer: &impl RunPrintJob, cycles: u8, verify: bool) -> Result<()> {
    for level in 1..=cycles {
        let job_type =
            JobType::for_level(level).with_context(|| format!("no cleaning job for level {level}"))?;
        info!("Cleaning cycle {level}: {job_type}");
        let state = printer.run_job(job_type)?;
        info!("Cleaning cycle {level} finished: {state}");
        if verify {
            info!("Printing verification page");
            printer.run_job(JobType::CleaningVerificationPage)?;
        }
    }
    Ok(())
}
