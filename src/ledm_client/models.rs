use std::fmt;

use anyhow::Result;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use serde_derive::Serialize;

/// Namespace of the job status documents served under /DevMgmt/JobDyn.
pub const JOBS_NS: &str = "http://www.hp.com/schemas/imaging/con/ledm/jobs/2009/04/30";

// The firmware rejects submissions that do not declare this exact set.
const INTERNAL_PRINT_DYN_NS: &str =
    "http://www.hp.com/schemas/imaging/con/ledm/internalprintdyn/2008/03/21";
const COPY_NS: &str = "http://www.hp.com/schemas/imaging/con/copy/2008/07/07";
const DD_NS: &str = "http://www.hp.com/schemas/imaging/con/dictionaries/1.0/";
const DD3_NS: &str = "http://www.hp.com/schemas/imaging/con/dictionaries/2009/04/06";
const FW_NS: &str = "http://www.hp.com/schemas/imaging/con/firewall/2011/01/05";

// ////////////// //
// Job vocabulary //
// ////////////// //

/// Internal print jobs the firmware can run through InternalPrintDyn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    CleaningPage,
    CleaningPageLevel2,
    CleaningPageLevel3,
    CleaningVerificationPage,
}

impl JobType {
    /// Cleaning job for an escalation level between 1 and 3.
    pub fn for_level(level: u8) -> Option<JobType> {
        match level {
            1 => Some(JobType::CleaningPage),
            2 => Some(JobType::CleaningPageLevel2),
            3 => Some(JobType::CleaningPageLevel3),
            _ => None,
        }
    }

    /// Identifier as it appears in the ipdyn:JobType element.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::CleaningPage => "cleaningPage",
            JobType::CleaningPageLevel2 => "cleaningPageLevel2",
            JobType::CleaningPageLevel3 => "cleaningPageLevel3",
            JobType::CleaningVerificationPage => "cleaningVerificationPage",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submission payload posted to /DevMgmt/InternalPrintDyn.xml. Everything is
/// fixed except the job type.
#[derive(Debug, Serialize)]
#[serde(rename = "ipdyn:InternalPrintDyn")]
pub struct InternalPrintDyn {
    #[serde(rename = "@xmlns:ipdyn")]
    xmlns_ipdyn: &'static str,
    #[serde(rename = "@xmlns:copy")]
    xmlns_copy: &'static str,
    #[serde(rename = "@xmlns:dd")]
    xmlns_dd: &'static str,
    #[serde(rename = "@xmlns:dd3")]
    xmlns_dd3: &'static str,
    #[serde(rename = "@xmlns:fw")]
    xmlns_fw: &'static str,
    #[serde(rename = "ipdyn:JobType")]
    job_type: &'static str,
}

impl InternalPrintDyn {
    pub fn new(job_type: JobType) -> Self {
        InternalPrintDyn {
            xmlns_ipdyn: INTERNAL_PRINT_DYN_NS,
            xmlns_copy: COPY_NS,
            xmlns_dd: DD_NS,
            xmlns_dd3: DD3_NS,
            xmlns_fw: FW_NS,
            job_type: job_type.as_str(),
        }
    }

    pub fn to_xml(&self) -> Result<String> {
        Ok(quick_xml::se::to_string(self)?)
    }
}

// ////////// //
// Job status //
// ////////// //

/// Job lifecycle states reported by the jobs endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Processing,
    Completed,
    Aborted,
    Canceled,
    /// Firmware state this tool does not know; carried verbatim.
    Other(String),
}

impl JobState {
    pub fn parse(raw: &str) -> JobState {
        match raw {
            "Processing" => JobState::Processing,
            "Completed" => JobState::Completed,
            "Aborted" => JobState::Aborted,
            "Canceled" => JobState::Canceled,
            other => JobState::Other(other.to_string()),
        }
    }

    /// Whether no further transitions can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Aborted | JobState::Canceled
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Processing => f.write_str("Processing"),
            JobState::Completed => f.write_str("Completed"),
            JobState::Aborted => f.write_str("Aborted"),
            JobState::Canceled => f.write_str("Canceled"),
            JobState::Other(raw) => f.write_str(raw),
        }
    }
}

/// Pulls the job state out of a jobs document.
///
/// Anything that is not well-formed XML carrying a JobState element in the
/// LEDM jobs namespace counts as "no observation" and yields None.
pub fn job_state_from_xml(xml: &str) -> Option<JobState> {
    let mut reader = NsReader::from_str(xml);
    let mut in_job_state = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let (ns, local) = reader.resolve_element(element.name());
                in_job_state = local.as_ref() == b"JobState"
                    && matches!(ns, ResolveResult::Bound(Namespace(uri)) if uri == JOBS_NS.as_bytes());
            }
            Ok(Event::Text(text)) if in_job_state => {
                return match text.unescape() {
                    Ok(value) if !value.trim().is_empty() => Some(JobState::parse(value.trim())),
                    _ => None,
                };
            }
            Ok(Event::End(_)) => in_job_state = false,
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
    }
}

/// Remembers the last reported state so each transition is reported once.
#[derive(Debug, Default)]
pub struct StateTracker {
    last: Option<JobState>,
}

impl StateTracker {
    /// Records an observation. Returns the state only when it differs from
    /// the previous observation.
    pub fn observe(&mut self, state: JobState) -> Option<&JobState> {
        if self.last.as_ref() == Some(&state) {
            return None;
        }
        self.last = Some(state);
        self.last.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleaning_levels_map_to_their_job_types() {
        assert_eq!(JobType::for_level(1), Some(JobType::CleaningPage));
        assert_eq!(JobType::for_level(2), Some(JobType::CleaningPageLevel2));
        assert_eq!(JobType::for_level(3), Some(JobType::CleaningPageLevel3));
        assert_eq!(JobType::for_level(0), None);
        assert_eq!(JobType::for_level(4), None);
    }

    #[test]
    fn payload_carries_job_type_and_namespaces() {
        let xml = InternalPrintDyn::new(JobType::CleaningPageLevel2)
            .to_xml()
            .unwrap();
        assert!(xml.starts_with("<ipdyn:InternalPrintDyn"));
        assert!(xml.contains("<ipdyn:JobType>cleaningPageLevel2</ipdyn:JobType>"));
        assert!(xml.contains(
            r#"xmlns:ipdyn="http://www.hp.com/schemas/imaging/con/ledm/internalprintdyn/2008/03/21""#
        ));
        assert!(xml.contains(r#"xmlns:copy="http://www.hp.com/schemas/imaging/con/copy/2008/07/07""#));
        assert!(xml.contains(r#"xmlns:dd="http://www.hp.com/schemas/imaging/con/dictionaries/1.0/""#));
        assert!(
            xml.contains(r#"xmlns:dd3="http://www.hp.com/schemas/imaging/con/dictionaries/2009/04/06""#)
        );
        assert!(xml.contains(r#"xmlns:fw="http://www.hp.com/schemas/imaging/con/firewall/2011/01/05""#));
    }

    #[test]
    fn only_completed_aborted_and_canceled_are_terminal() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Aborted.is_terminal());
        assert!(JobState::Canceled.is_terminal());
        assert!(!JobState::Processing.is_terminal());
        assert!(!JobState::Other("ReadyToStart".to_string()).is_terminal());
    }

    fn job_xml(state: &str) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<j:Job xmlns:j="http://www.hp.com/schemas/imaging/con/ledm/jobs/2009/04/30" "#,
                r#"xmlns:dd="http://www.hp.com/schemas/imaging/con/dictionaries/1.0/">"#,
                "<j:JobUrl>/DevMgmt/JobDyn/JobList/Jobs/Job_42</j:JobUrl>",
                "<j:JobCategory>CleaningPage</j:JobCategory>",
                "<j:JobState>{}</j:JobState>",
                "</j:Job>"
            ),
            state
        )
    }

    #[test]
    fn state_is_read_from_the_jobs_namespace() {
        assert_eq!(
            job_state_from_xml(&job_xml("Processing")),
            Some(JobState::Processing)
        );
        assert_eq!(
            job_state_from_xml(&job_xml("Completed")),
            Some(JobState::Completed)
        );
    }

    #[test]
    fn unknown_states_are_carried_verbatim() {
        assert_eq!(
            job_state_from_xml(&job_xml("ReadyToStart")),
            Some(JobState::Other("ReadyToStart".to_string()))
        );
    }

    #[test]
    fn job_state_in_another_namespace_is_ignored() {
        let xml = r#"<job xmlns:x="http://example.com/other"><x:JobState>Completed</x:JobState></job>"#;
        assert_eq!(job_state_from_xml(xml), None);
    }

    #[test]
    fn malformed_documents_yield_no_observation() {
        assert_eq!(job_state_from_xml("<j:Job><j:JobSta"), None);
        assert_eq!(job_state_from_xml("definitely not xml <"), None);
        assert_eq!(job_state_from_xml(""), None);
    }

    #[test]
    fn document_without_a_state_yields_no_observation() {
        let xml = r#"<j:Job xmlns:j="http://www.hp.com/schemas/imaging/con/ledm/jobs/2009/04/30"><j:JobCategory>CleaningPage</j:JobCategory></j:Job>"#;
        assert_eq!(job_state_from_xml(xml), None);
    }

    #[test]
    fn tracker_reports_each_distinct_state_once() {
        let mut tracker = StateTracker::default();
        assert_eq!(
            tracker.observe(JobState::Processing),
            Some(&JobState::Processing)
        );
        assert_eq!(tracker.observe(JobState::Processing), None);
        assert_eq!(tracker.observe(JobState::Processing), None);
        assert_eq!(
            tracker.observe(JobState::Completed),
            Some(&JobState::Completed)
        );
    }
}
