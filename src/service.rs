use crate::cache::{default_ttl, Clock, SystemClock, TtlCache};
use crate::error::{Error, Result};
use crate::github::{collect_team, CollectOptions, ProgressCallback, SourceControl};
use crate::model::{RosterStore, Window};
use crate::report::TeamReport;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

type ReportKey = (String, Window);

#[derive(Debug, Default)]
struct Generation {
    current: u64,
    running: usize,
}

type Generations = Mutex<HashMap<ReportKey, Generation>>;

/// One in-flight refresh; leaving the run, even by cancellation, releases it.
struct Run<'a> {
    generations: &'a Generations,
    key: ReportKey,
    ticket: u64,
}

impl Drop for Run<'_> {
    fn drop(&mut self) {
        let mut generations = self.generations.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(generation) = generations.get_mut(&self.key) {
            generation.running = generation.running.saturating_sub(1);
        }
    }
}

/// Runs the fetch, aggregate and score pipeline per team and keeps recent reports.
///
/// Every refresh of a key takes a new generation. A run that finishes after a
/// newer run of the same key started is returned to its caller but never
/// cached, so the latest refresh always wins. Generations are forgotten once
/// their key has no cached report and no run in flight.
pub struct MetricsService<S, R, C = SystemClock> {
    source: S,
    roster_store: R,
    options: CollectOptions,
    clock: C,
    cache: Mutex<TtlCache<ReportKey, TeamReport, C>>,
    generations: Generations,
}

impl<S, R> MetricsService<S, R, SystemClock>
where
    S: SourceControl,
    R: RosterStore,
{
    pub fn new(source: S, roster_store: R, options: CollectOptions) -> Self {
        Self::with_clock(source, roster_store, options, SystemClock)
    }
}

impl<S, R, C> MetricsService<S, R, C>
where
    S: SourceControl,
    R: RosterStore,
    C: Clock + Clone,
{
    pub fn with_clock(source: S, roster_store: R, options: CollectOptions, clock: C) -> Self {
        Self {
            source,
            roster_store,
            options,
            cache: Mutex::new(TtlCache::new(default_ttl(), clock.clone())),
            clock,
            generations: Mutex::new(HashMap::new()),
        }
    }

    pub async fn team_report(
        &self,
        team: &str,
        window: &Window,
        force_refresh: bool,
        cb: &mut ProgressCallback<'_>,
    ) -> Result<TeamReport> {
        if team.trim().is_empty() {
            return Err(Error::MissingTeam);
        }
        let key = (team.to_string(), *window);
        if !force_refresh {
            if let Some(report) = self.cached(&key) {
                tracing::debug!(team, "Using cached report");
                return Ok(report);
            }
        }

        // The whole roster is known before the first comment is classified.
        let roster = self.roster_store.load_roster(team)?;
        let run = self.begin(key);
        let collected = collect_team(&self.source, &roster, window, &self.options, cb).await;
        let report = TeamReport::build(&roster, window, collected, self.clock.now());
        self.store(&run, report.clone());
        Ok(report)
    }

    /// Drops cached reports of `team`, or every report when `None`.
    pub fn clear_cache(&self, team: Option<&str>) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        match team {
            Some(team) => cache.retain(|(cached, _)| cached != team),
            None => cache.clear(),
        }
        self.prune(&mut cache);
    }

    pub fn cached_report(&self, team: &str, window: &Window) -> Option<TeamReport> {
        self.cached(&(team.to_string(), *window))
    }

    fn cached(&self, key: &ReportKey) -> Option<TeamReport> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(key).cloned()
    }

    fn begin(&self, key: ReportKey) -> Run<'_> {
        let mut generations = self
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let generation = generations.entry(key.clone()).or_default();
        generation.current += 1;
        generation.running += 1;
        Run {
            generations: &self.generations,
            ticket: generation.current,
            key,
        }
    }

    fn store(&self, run: &Run<'_>, report: TeamReport) -> bool {
        let current = self
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&run.key)
            .map(|generation| generation.current);
        if current != Some(run.ticket) {
            tracing::debug!(
                team = %run.key.0,
                ticket = run.ticket,
                ?current,
                "Dropping superseded report"
            );
            return false;
        }
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.insert(run.key.clone(), report);
        self.prune(&mut cache);
        true
    }

    /// Forgets generations of keys with neither a live report nor a run in flight.
    fn prune(&self, cache: &mut TtlCache<ReportKey, TeamReport, C>) {
        cache.purge_expired();
        let mut generations = self
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        generations.retain(|key, generation| generation.running > 0 || cache.get(key).is_some());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::error::Partial;
    use crate::github::{ChangeStats, Comment, PullRequest, RepoCoords};
    use crate::model::{MemberDirectory, TeamRoster};
    use chrono::{Duration, TimeZone, Utc};

    struct NoSource;

    impl SourceControl for NoSource {
        async fn search_pull_requests(&self, _: &str, _: u32, _: u32) -> Result<Vec<PullRequest>> {
            Ok(vec![])
        }
        async fn list_issue_comments(
            &self,
            _: &RepoCoords,
            _: u64,
            _: u32,
            _: u32,
        ) -> Result<Vec<Comment>> {
            Ok(vec![])
        }
        async fn list_review_comments(
            &self,
            _: &RepoCoords,
            _: u64,
            _: u32,
            _: u32,
        ) -> Result<Vec<Comment>> {
            Ok(vec![])
        }
        async fn pull_request_changes(&self, _: &RepoCoords, _: u64) -> Result<ChangeStats> {
            Ok(ChangeStats::default())
        }
        async fn count_issues(&self, _: &str) -> Result<u64> {
            Ok(0)
        }
    }

    fn service() -> TestService {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        MetricsService::with_clock(
            NoSource,
            MemberDirectory::default(),
            CollectOptions::default(),
            clock,
        )
    }

    fn window() -> Window {
        Window::since(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
    }

    fn report(team: &str) -> TeamReport {
        TeamReport::build(
            &TeamRoster::new(team, ["alice"]),
            &window(),
            Partial::new(vec![]),
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        )
    }

    type TestService = MetricsService<NoSource, MemberDirectory, ManualClock>;

    fn tracked(service: &TestService) -> (usize, usize) {
        let cached = service.cache.lock().unwrap().len();
        let generations = service.generations.lock().unwrap().len();
        (cached, generations)
    }

    #[test]
    fn superseded_run_is_not_cached() {
        let service = service();
        let key = ("core".to_string(), window());
        let first = service.begin(key.clone());
        let second = service.begin(key.clone());

        let mut newer = report("core");
        newer.attempted_fetches = 2;
        assert!(service.store(&second, newer));
        assert!(!service.store(&first, report("core")));

        let cached = service.cached(&key).unwrap();
        assert_eq!(cached.attempted_fetches, 2);
    }

    #[test]
    fn clear_cache_only_touches_requested_team() {
        let service = service();
        for team in ["core", "web"] {
            let run = service.begin((team.to_string(), window()));
            service.store(&run, report(team));
        }
        service.clear_cache(Some("core"));
        assert!(service.cached_report("core", &window()).is_none());
        assert!(service.cached_report("web", &window()).is_some());
        assert_eq!(tracked(&service), (1, 1));

        service.clear_cache(None);
        assert!(service.cached_report("web", &window()).is_none());
        assert_eq!(tracked(&service), (0, 0));
    }

    #[tokio::test]
    async fn expired_windows_are_forgotten_on_next_store() {
        let service = service();
        let mut cb = crate::github::silent();
        for day in 1..=50 {
            let window = Window::since(window().since + Duration::hours(day));
            service.team_report("core", &window, false, &mut cb).await.unwrap();
        }
        assert_eq!(tracked(&service), (50, 50));

        service.clock.advance(Duration::minutes(5));
        service.team_report("core", &window(), false, &mut cb).await.unwrap();
        assert_eq!(tracked(&service), (1, 1));
    }

    #[test]
    fn in_flight_run_survives_pruning() {
        let service = service();
        let key = ("core".to_string(), window());
        let pending = service.begin(key.clone());
        service.clear_cache(None);
        assert_eq!(tracked(&service), (0, 1));

        assert!(service.store(&pending, report("core")));
        drop(pending);
        service.clock.advance(Duration::minutes(5));
        service.clear_cache(Some("web"));
        assert_eq!(tracked(&service), (0, 0));
    }

    #[tokio::test]
    async fn empty_team_short_circuits() {
        let err = service()
            .team_report(" ", &window(), false, &mut crate::github::silent())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingTeam));
    }

    #[tokio::test]
    async fn cached_report_expires_with_clock() {
        let service = service();
        let mut cb = crate::github::silent();
        let first = service
            .team_report("core", &window(), false, &mut cb)
            .await
            .unwrap();
        assert!(service.cached_report("core", &window()).is_some());

        service.clock.advance(Duration::minutes(5));
        assert!(service.cached_report("core", &window()).is_none());

        let second = service
            .team_report("core", &window(), false, &mut cb)
            .await
            .unwrap();
        assert!(second.generated_at > first.generated_at);
    }
}
