use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use indicatif::{MultiProgress, ProgressBar};
use itertools::Itertools;
use std::path::PathBuf;
use std::process::ExitCode;
use team_pr_metrics::github::client::DEFAULT_API_URL;
use team_pr_metrics::github::{CollectOptions, GitHubClient, Progress, ProgressCallback};
use team_pr_metrics::model::{MemberDirectory, Window};
use team_pr_metrics::report::{write_report, ReportFormat};
use team_pr_metrics::utils::{MultiProgressNew, ProgressStyleTemplate};
use team_pr_metrics::{Error, MetricsService, Result};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(about = "Pull request and review comment reports for GitHub teams")]
struct Args {
    #[arg(long = "members", default_value = "members.json")]
    members_path: String,
    /// Teams to report on; every team in the members file when omitted.
    #[arg(long = "team")]
    teams: Vec<String>,
    #[arg(long = "github_url", env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    github_url: String,
    #[arg(long = "github_token", env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,
    /// Number of calendar quarters to cover, ending with the current one.
    #[arg(long = "quarters", default_value_t = 4)]
    quarters: u32,
    /// First creation date (YYYY-MM-DD); overrides `--quarters`.
    #[arg(long = "since")]
    since: Option<NaiveDate>,
    #[arg(long = "until", requires = "since")]
    until: Option<NaiveDate>,
    #[arg(long = "output", default_value = ".")]
    output: PathBuf,
    #[arg(long = "format", value_enum, default_values_t = [ReportFormat::Markdown])]
    formats: Vec<ReportFormat>,
    #[arg(long = "comment_concurrency", default_value_t = 8)]
    comment_concurrency: usize,
    /// Also read commit and line counts of every pull request.
    #[arg(long = "with_changes")]
    with_changes: bool,
    /// Also count created and closed issues per member.
    #[arg(long = "with_issues")]
    with_issues: bool,
}

impl Args {
    fn window(&self, now: &DateTime<Utc>) -> Result<Window> {
        let Some(since) = self.since else {
            return Window::last_quarters(now, self.quarters);
        };
        let since = start_of_day(since)?;
        match self.until {
            Some(until) => {
                let until = until
                    .and_hms_opt(23, 59, 59)
                    .map(|dt| dt.and_utc())
                    .ok_or_else(|| Error::Config(format!("Invalid date `{until}`")))?;
                Window::between(since, until)
            }
            None => Ok(Window::since(since)),
        }
    }

    fn collect_options(&self) -> CollectOptions {
        CollectOptions {
            comment_concurrency: self.comment_concurrency,
            fetch_changes: self.with_changes,
            fetch_issues: self.with_issues,
        }
    }
}

fn start_of_day(date: NaiveDate) -> Result<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| Error::Config(format!("Invalid date `{date}`")))
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "Report generation failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let window = args.window(&Utc::now())?;
    let directory = MemberDirectory::from_config(&args.members_path)?;
    let teams = if args.teams.is_empty() {
        directory.teams()
    } else {
        args.teams.iter().unique().cloned().collect()
    };
    if teams.is_empty() {
        return Err(Error::MissingTeam);
    }

    let token = args.github_token.clone().unwrap_or_default();
    let client = GitHubClient::new(&args.github_url, &token)?;
    let service = MetricsService::new(client, directory, args.collect_options());
    let formats = args.formats.iter().copied().unique().collect::<Vec<_>>();

    let multi_progress = MultiProgress::default();
    for team in &teams {
        let pb = multi_progress
            .add_with_style(ProgressBar::no_length(), ProgressStyleTemplate::member_bar());
        pb.set_prefix(team.clone());
        let mut cb = progress_callback(pb.clone());

        let report = match service.team_report(team, &window, false, &mut cb).await {
            Ok(report) => report,
            Err(err) => {
                pb.set_style(ProgressStyleTemplate::only_message());
                pb.abandon_with_message(format!("❌ {team}: {err}"));
                return Err(err);
            }
        };
        for format in &formats {
            write_report(&report, &args.output, *format)?;
        }

        pb.set_style(ProgressStyleTemplate::only_message());
        let message = if report.failures.is_empty() {
            format!(
                "✅ {team}: {} pull requests, {} comments",
                report.summary.total_prs,
                report.summary.total_comments()
            )
        } else {
            format!(
                "⚠️ {team}: {} pull requests, {} comments ({} of {} fetches failed)",
                report.summary.total_prs,
                report.summary.total_comments(),
                report.failures.len(),
                report.attempted_fetches
            )
        };
        pb.finish_with_message(message);
    }
    Ok(())
}

fn progress_callback(pb: ProgressBar) -> ProgressCallback<'static> {
    Box::new(move |progress| match progress {
        Progress::Member {
            username,
            index,
            total,
        } => {
            pb.set_length(total as u64);
            pb.set_position(index as u64);
            pb.set_message(format!("{username}: searching pull requests"));
        }
        Progress::Page { username, page } => {
            pb.set_message(format!("{username}: fetch pull requests (#{page} page) ..."));
        }
        Progress::Comments {
            username,
            pull_requests,
        } => {
            pb.set_message(format!(
                "{username}: fetch comments of {pull_requests} pull requests ..."
            ));
        }
    })
}
