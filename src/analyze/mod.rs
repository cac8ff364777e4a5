pub mod analyzer;
pub mod model;
pub mod scorer;

pub use analyzer::{
    member_metric, metric_trend, percentage, quarter_buckets, rounded_average, sort_quarters,
    team_summary, Analyzer, RawDataAnalyzer,
};
pub use model::{
    Aggregate, IssueCounts, MemberActivity, MemberMetric, PullRequestActivity, QuarterBucket,
    QuarterOrder, TeamSummary,
};
pub use scorer::{CompositeScore, DeveloperMetrics, MetricsEngine, RawGitHubData};
