//! Where to report a fake, keyed by scam category.

use satya_config::RemedyOverride;
use satya_llm::analysis::ScamCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Safety tips attached to every remedy entry.
pub const GENERIC_REMEDIES: [&str; 3] = [
    "Always verify information with trusted sources before sharing or acting on it.",
    "Be skeptical of offers that seem too good to be true.",
    "Never share personal or financial information based on an unsolicited message.",
];

const FALLBACK: &str = "General Fake News";

/// Reporting guidance for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemedyInfo {
    pub title: String,
    pub reporting_link: String,
    pub reporting_description: String,
    pub remedies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReportingEntry {
    link: String,
    description: String,
}

impl ReportingEntry {
    fn new(link: &str, description: &str) -> Self {
        Self {
            link: link.to_string(),
            description: description.to_string(),
        }
    }
}

/// Category label → reporting channel.
///
/// Starts from the built-in table of Indian authorities; individual entries
/// can be replaced with [`RemedyTable::with_overrides`].
#[derive(Debug, Clone)]
pub struct RemedyTable {
    // Keys are lowercased labels.
    entries: BTreeMap<String, ReportingEntry>,
    fallback: ReportingEntry,
}

impl Default for RemedyTable {
    fn default() -> Self {
        let entries = [
            (
                "Financial Fraud",
                ReportingEntry::new(
                    "https://sachet.rbi.org.in/",
                    "For financial fraud, report to the RBI's Sachet portal and the National Cyber Crime Portal.",
                ),
            ),
            (
                "Health Misinformation",
                ReportingEntry::new(
                    "https://factcheck.pib.gov.in/",
                    "Report health-related fake news to the Press Information Bureau (PIB) Fact Check unit.",
                ),
            ),
            (
                "Job Scam",
                ReportingEntry::new(
                    "https://cybercrime.gov.in/",
                    "Job scams are a serious crime. Report them immediately to the National Cyber Crime Portal.",
                ),
            ),
            (
                "Impersonation",
                ReportingEntry::new(
                    "https://cybercrime.gov.in/",
                    "Report impersonation on the social media platform itself and also to the National Cyber Crime Portal.",
                ),
            ),
        ]
        .into_iter()
        .map(|(label, entry)| (label.to_lowercase(), entry))
        .collect();
        let fallback = ReportingEntry::new(
            "https://factcheck.pib.gov.in/",
            "For general fake news, report to the Press Information Bureau (PIB) Fact Check unit.",
        );
        Self { entries, fallback }
    }
}

impl RemedyTable {
    /// Replace (or add) entries by category label, case-insensitively.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, RemedyOverride>) -> Self {
        for (label, o) in overrides {
            let key = label.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            tracing::debug!(category = %label, link = %o.link, "remedies.override");
            let entry = ReportingEntry::new(&o.link, &o.description);
            if key == FALLBACK.to_lowercase() {
                self.fallback = entry;
            } else {
                self.entries.insert(key, entry);
            }
        }
        self
    }

    /// Reporting guidance for `category`. Unknown categories and `N/A` get
    /// the general fake-news entry; the title always names the category.
    pub fn lookup(&self, category: &ScamCategory) -> RemedyInfo {
        let label = category.label();
        let entry = self
            .entries
            .get(&label.to_lowercase())
            .unwrap_or(&self.fallback);

        RemedyInfo {
            title: format!("Actions & Remedies for: {label}"),
            reporting_link: entry.link.clone(),
            reporting_description: entry.description.clone(),
            remedies: GENERIC_REMEDIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}
