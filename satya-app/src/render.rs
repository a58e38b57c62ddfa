//! Plain-text rendering of a [`CombinedReport`] for the terminal.

use satya_analyzer::CombinedReport;
use satya_llm::analysis::Verdict;
use std::fmt::Write;

const RULE: &str = "------------------------------------------------------------";

pub fn render_report(report: &CombinedReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &CombinedReport) -> std::fmt::Result {
    let a = &report.analysis;
    let headline = match a.verdict {
        Verdict::Real => "REAL: the content appears to be genuine",
        Verdict::Fake => "FAKE: the content appears to be misinformation",
    };

    writeln!(out, "{RULE}")?;
    writeln!(out, "Verdict:         {headline}")?;
    writeln!(out, "Truthfulness:    {}/100 {}", a.truthfulness_score, meter(a.truthfulness_score))?;
    writeln!(out, "Sentiment:       {}", a.sentiment)?;
    writeln!(out, "Scam category:   {}", a.scam_category)?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "Main claim:\n  {}", a.main_claim)?;
    writeln!(out, "\nSummary:\n  {}", a.summary)?;

    let entities: Vec<_> = a
        .named_entities
        .iter()
        .filter(|(_, mentions)| !mentions.is_empty())
        .collect();
    if !entities.is_empty() {
        writeln!(out, "\nNamed entities:")?;
        for (kind, mentions) in entities {
            let joined = mentions.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
            writeln!(out, "  {kind}: {joined}")?;
        }
    }

    if let Some(remedies) = &report.remedies {
        writeln!(out, "\n{RULE}\n{}", remedies.title)?;
        writeln!(out, "Report at: {}", remedies.reporting_link)?;
        writeln!(out, "  {}", remedies.reporting_description)?;
        writeln!(out, "What you can do:")?;
        for tip in &remedies.remedies {
            writeln!(out, "  - {tip}")?;
        }
    }

    if report.is_fake() {
        match &report.related_news {
            Some(items) if items.is_empty() => {
                writeln!(out, "\nNo related news articles were found for the main claim.")?;
            }
            Some(items) => {
                writeln!(out, "\nRelated coverage:")?;
                for item in items {
                    writeln!(out, "  - {}\n    {}", item.title, item.link)?;
                }
            }
            None => {}
        }
    }
    writeln!(out, "{RULE}")
}

fn meter(score: u8) -> String {
    let filled = usize::from(score.min(100)) / 10;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(10 - filled))
}
