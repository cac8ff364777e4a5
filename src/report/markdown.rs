use crate::analyze::{DeveloperMetrics, MemberMetric, QuarterBucket, TeamSummary};
use crate::error::{Error, Result};
use crate::model::Profile;
use crate::report::TeamReport;
use indexmap::IndexMap;
use markdown_builder::Markdown;
use markdown_table::{Heading, HeadingAlignment, MarkdownTable};

pub trait MarkdownReport {
    fn render_markdown(&self) -> Result<String>;
}

impl MarkdownReport for TeamReport {
    fn render_markdown(&self) -> Result<String> {
        let mut doc = Markdown::new();

        doc.header1(format!("{} Performance Report", self.team));
        doc.paragraph(format!(
            "**Report Generated:** {}  \n**Period:** {}  \n**Team Members:** {}",
            self.generated_at.format("%d.%m.%Y"),
            self.period,
            self.team_members.len(),
        ));
        doc.add_summary(&self.summary)?;
        doc.add_members(&self.members, &self.profiles)?;
        doc.add_quarters(&self.quarters)?;
        doc.add_scores(&self.developers)?;

        if !self.failures.is_empty() {
            doc.header2("Incomplete Data");
            doc.paragraph(format!(
                "{} of {} fetches failed; counts below may be under-reported.",
                self.failures.len(),
                self.attempted_fetches
            ));
            let rows = self
                .failures
                .iter()
                .map(|f| vec![f.unit.to_string(), f.reason.clone()])
                .collect::<Vec<_>>();
            doc.add_table(vec![heading("Skipped"), heading("Reason")], rows)?;
        }

        Ok(doc.render())
    }
}

fn heading(title: &str) -> Heading {
    Heading::new(title.to_string(), None)
}

fn centered(title: String) -> Heading {
    Heading::new(title, Some(HeadingAlignment::Center))
}

trait MarkdownExt {
    fn add_table(&mut self, headings: Vec<Heading>, rows: Vec<Vec<String>>) -> Result<()>;
    fn add_summary(&mut self, summary: &TeamSummary) -> Result<()>;
    fn add_members(
        &mut self,
        members: &[MemberMetric],
        profiles: &IndexMap<String, Profile>,
    ) -> Result<()>;
    fn add_quarters(&mut self, quarters: &[QuarterBucket]) -> Result<()>;
    fn add_scores(&mut self, developers: &[DeveloperMetrics]) -> Result<()>;
}

impl MarkdownExt for Markdown {
    fn add_table(&mut self, headings: Vec<Heading>, rows: Vec<Vec<String>>) -> Result<()> {
        let mut md_table = MarkdownTable::new(rows);
        md_table.with_headings(headings);
        let table = md_table
            .as_markdown()
            .map_err(|_| Error::Report("table rows do not match its headings".into()))?;
        self.paragraph(table);
        Ok(())
    }

    fn add_summary(&mut self, summary: &TeamSummary) -> Result<()> {
        self.header2("Team Summary");
        let rows = vec![
            vec!["Total PRs".to_string(), summary.total_prs.to_string()],
            vec!["Merged PRs".to_string(), summary.total_merged_prs.to_string()],
            vec![
                "Average Merge Rate".to_string(),
                format!("{:.1}%", summary.average_merge_rate),
            ],
            vec![
                "Team Comments".to_string(),
                summary.total_team_comments.to_string(),
            ],
            vec![
                "External Comments".to_string(),
                summary.total_external_comments.to_string(),
            ],
            vec![
                "Total Comments".to_string(),
                summary.total_comments().to_string(),
            ],
        ];
        self.add_table(vec![heading("Metric"), heading("Value")], rows)
    }

    fn add_members(
        &mut self,
        members: &[MemberMetric],
        profiles: &IndexMap<String, Profile>,
    ) -> Result<()> {
        self.header2("Individual Performance");
        if members.is_empty() {
            self.paragraph("*No member data.*");
            return Ok(());
        }

        let header = [
            vec![heading("")],
            members
                .iter()
                .map(|m| centered(format!("**{}**", m.member)))
                .collect(),
        ]
        .concat();

        let mut table = vec![];
        let mut push_row = |title: &str, values: Vec<String>| {
            table.push([vec![title.to_string()], values].concat());
        };
        let profile = |m: &MemberMetric| profiles.get(&m.member).cloned().unwrap_or_default();
        if members.iter().any(|m| !profile(m).avatar_url.is_empty()) {
            push_row(
                "",
                members
                    .iter()
                    .map(|m| match profile(m).avatar_url.as_str() {
                        "" => String::new(),
                        url => format!("![]({url} =120x)"),
                    })
                    .collect(),
            );
        }
        if members.iter().any(|m| !profile(m).role.is_empty()) {
            push_row(
                "",
                members
                    .iter()
                    .map(|m| match profile(m).role.as_str() {
                        "" => String::new(),
                        role => format!("*{role}*"),
                    })
                    .collect(),
            );
        }
        push_row(
            "Total PRs",
            members.iter().map(|m| m.pr_count.to_string()).collect(),
        );
        push_row(
            "Merged PRs",
            members.iter().map(|m| m.merged_prs.to_string()).collect(),
        );
        push_row(
            "Rejected PRs",
            members.iter().map(|m| m.rejected_prs.to_string()).collect(),
        );
        push_row(
            "Merge Rate",
            members.iter().map(|m| format!("{}%", m.merge_rate)).collect(),
        );
        push_row(
            "Average Comments",
            members.iter().map(|m| m.average_comments.to_string()).collect(),
        );
        push_row(
            "Team Comments",
            members.iter().map(|m| m.team_comments_count.to_string()).collect(),
        );
        push_row(
            "External Comments",
            members.iter().map(|m| m.other_comments_count.to_string()).collect(),
        );
        push_row(
            "Team Comment Ratio",
            members
                .iter()
                .map(|m| format!("{:.1}%", ratio(m.team_comments_count, m.total_comments())))
                .collect(),
        );

        self.add_table(header, table)
    }

    fn add_quarters(&mut self, quarters: &[QuarterBucket]) -> Result<()> {
        self.header2("Quarterly Comments");
        if quarters.is_empty() {
            self.paragraph("*No pull requests in this period.*");
            return Ok(());
        }
        let rows = quarters
            .iter()
            .map(|q| {
                vec![
                    q.quarter.clone(),
                    q.total_prs.to_string(),
                    q.total_comments.to_string(),
                    format!("{} ({}%)", q.team_member_comments, q.team_member_percent),
                    format!("{} ({}%)", q.external_comments, q.external_percent),
                    q.developer_count.to_string(),
                    format!("{:.2}", q.avg_comments_per_pr),
                    signed_percent(q.pr_trend),
                    signed_percent(q.comment_trend),
                ]
            })
            .collect();
        self.add_table(
            vec![
                heading("Quarter"),
                heading("PRs"),
                heading("Comments"),
                heading("Team"),
                heading("External"),
                heading("Developers"),
                heading("Comments / PR"),
                heading("PR Trend"),
                heading("Comment Trend"),
            ],
            rows,
        )
    }

    fn add_scores(&mut self, developers: &[DeveloperMetrics]) -> Result<()> {
        if developers.is_empty() {
            return Ok(());
        }
        self.header2("Performance Scores");
        let rows = developers
            .iter()
            .map(|d| {
                vec![
                    d.developer_id.clone(),
                    format!("{:.1}", d.productivity_score),
                    format!("{:.1}", d.collaboration_score),
                    format!("{:.1}", d.review_quality_score),
                    format!("{}h", d.pr_review_time),
                ]
            })
            .collect();
        self.add_table(
            vec![
                heading("Member"),
                heading("Productivity"),
                heading("Collaboration"),
                heading("Review Quality"),
                heading("Review Wait"),
            ],
            rows,
        )
    }
}

fn signed_percent(value: f64) -> String {
    format!("{value:+.1}%")
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
