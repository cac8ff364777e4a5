pub mod json;
pub mod markdown;

pub use json::JsonReport;
pub use markdown::MarkdownReport;

use crate::analyze::{
    team_summary, Analyzer, DeveloperMetrics, MemberActivity, MemberMetric, MetricsEngine,
    QuarterBucket, RawDataAnalyzer, TeamSummary,
};
use crate::error::{FetchFailure, Partial, Result};
use crate::model::{Profile, TeamRoster, Window};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamReport {
    pub team: String,
    pub team_members: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub profiles: IndexMap<String, Profile>,
    pub period: String,
    pub generated_at: DateTime<Utc>,
    pub summary: TeamSummary,
    pub members: Vec<MemberMetric>,
    /// Most recent first.
    pub quarters: Vec<QuarterBucket>,
    pub developers: Vec<DeveloperMetrics>,
    pub attempted_fetches: usize,
    pub failures: Vec<FetchFailure>,
}

impl TeamReport {
    pub fn build(
        roster: &TeamRoster,
        window: &Window,
        collected: Partial<Vec<MemberActivity>>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let activity = collected.data.as_slice();
        let aggregate = activity.aggregate();
        let period = window.period();
        let developers = activity
            .iter()
            .filter_map(|member| {
                let raw = activity.raw_data(&member.username)?;
                Some(MetricsEngine::to_metrics(
                    &member.username,
                    &raw,
                    &period,
                    generated_at,
                ))
            })
            .collect();

        Self {
            team: roster.team().to_string(),
            team_members: roster.members().map(String::from).collect(),
            profiles: roster
                .members()
                .filter_map(|username| {
                    let profile = roster.profile(username)?;
                    Some((username.to_string(), profile.clone()))
                })
                .collect(),
            period,
            generated_at,
            summary: team_summary(&aggregate.members),
            members: aggregate.members,
            quarters: aggregate.quarters,
            developers,
            attempted_fetches: collected.attempted,
            failures: collected.failures,
        }
    }

    pub fn file_stem(&self) -> String {
        let team = self
            .team
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect::<String>();
        format!(
            "{team}_performance_report_{}",
            self.generated_at.format("%Y-%m-%d")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ReportFormat {
    Markdown,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }
}

pub fn write_report(report: &TeamReport, dir: &Path, format: ReportFormat) -> Result<PathBuf> {
    let content = match format {
        ReportFormat::Markdown => report.render_markdown()?,
        ReportFormat::Json => report.render_json()?,
    };
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.{}", report.file_stem(), format.extension()));
    fs::write(&path, content)?;
    tracing::info!(path = %path.display(), "Report written");
    Ok(path)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_is_filesystem_safe() {
        assert_eq!(
            fixtures::report().file_stem(),
            "core_platform_performance_report_2025-06-01"
        );
    }

    #[test]
    fn write_report_creates_file_per_format() {
        let dir = tempfile::tempdir().unwrap();
        let report = fixtures::report();
        let md = write_report(&report, dir.path(), ReportFormat::Markdown).unwrap();
        let json = write_report(&report, dir.path(), ReportFormat::Json).unwrap();
        assert!(md.extension().is_some_and(|e| e == "md"));
        assert!(fs::read_to_string(json).unwrap().contains("\"team\": \"core/platform\""));
    }
}
