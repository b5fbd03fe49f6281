use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use url::Url;

use super::models::{job_state_from_xml, InternalPrintDyn, JobState, JobType, StateTracker};

/// Management endpoint that accepts internal print job submissions.
const SUBMIT_PATH: &str = "DevMgmt/InternalPrintDyn.xml";

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_TIMEOUT: Duration = Duration::from_secs(6);

pub fn build_printer_url(printer: &str) -> Result<Url> {
    Url::parse(&format!("http://{printer}/"))
        .with_context(|| format!("invalid printer address '{printer}'"))
}

/// The Location header may be relative, so it is resolved against the
/// printer's base URL.
fn resolve_job_location(base_url: &Url, location: &str) -> Result<Url> {
    base_url
        .join(location)
        .with_context(|| format!("invalid job location '{location}'"))
}

/// Blocking client for the printer's embedded LEDM web server. One instance
/// serves a whole run so the underlying connection is reused.
pub struct LedmClient {
    http: Client,
    base_url: Url,
    poll_interval: Duration,
}

impl LedmClient {
    pub fn new(printer: &str, poll_interval: Duration) -> Result<Self> {
        let base_url = build_printer_url(printer)?;
        let http = Client::builder()
            .timeout(SUBMIT_TIMEOUT)
            .build()
            .context("could not build HTTP client")?;
        Ok(LedmClient {
            http,
            base_url,
            poll_interval,
        })
    }

    /// Asks the firmware to start an internal print job. Returns the URL of
    /// the job resource named by the response's Location header. A rejected
    /// submission is fatal; there are no retries.
    pub fn submit_job(&self, job_type: JobType) -> Result<Url> {
        let url = self.base_url.join(SUBMIT_PATH)?;
        let body = InternalPrintDyn::new(job_type).to_xml()?;
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()?
            .error_for_status()?;
        let location = response
            .headers()
            .get(LOCATION)
            .context("printer accepted the job but returned no Location header")?
            .to_str()
            .context("job Location header is not valid text")?;
        resolve_job_location(&self.base_url, location)
    }

    /// One status observation. A response that does not parse as a jobs
    /// document counts as no observation.
    pub fn fetch_job_state(&self, job_url: &Url) -> Result<Option<JobState>> {
        let response = self
            .http
            .get(job_url.clone())
            .header(ACCEPT, "application/xml")
            .timeout(POLL_TIMEOUT)
            .send()?;
        let body = response.text()?;
        Ok(job_state_from_xml(&body))
    }

    /// Re-fetches the job until it reaches a terminal state, logging each
    /// state change once. Runs for as long as the job does: only the
    /// per-request timeouts bound this loop, not an overall deadline.
    pub fn poll_to_completion(&self, job_url: &Url) -> Result<JobState> {
        let mut tracker = StateTracker::default();
        loop {
            if let Some(state) = self.fetch_job_state(job_url)? {
                if let Some(changed) = tracker.observe(state.clone()) {
                    info!("Job state: {changed}");
                }
                if state.is_terminal() {
                    return Ok(state);
                }
            }
            thread::sleep(self.poll_interval);
        }
    }
}
