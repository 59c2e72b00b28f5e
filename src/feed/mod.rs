//! The records feed: period selection, fetch lifecycle and snapshot
//! state for the presentation layer.
//!
//! [`RecordFeed`] is a synchronous state machine; it never performs IO
//! itself. Callers obtain a [`FetchRequest`] from `set_period`/`refresh`,
//! hand it to a transport (normally [`FeedRuntime`]), and feed the
//! eventual [`FetchResponse`] back through [`RecordFeed::apply`]. The
//! sequence number stamped at issue time is what keeps a slow stale
//! response from overwriting a fresh one.

use std::sync::Arc;

use serde::Deserialize;

use crate::records::{Period, RunRecord};

mod runtime;

pub use runtime::FeedRuntime;

const GENERIC_FETCH_ERROR: &str = "record source failed; see logs for details";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("unknown period `{0}`; expected today, yesterday, week, month or all")]
    InvalidPeriod(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// A fetch to issue against the record source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub period: Period,
}

/// The transport's answer to a [`FetchRequest`]. Failures arrive as the
/// source's opaque JSON payload, decoded defensively on apply.
#[derive(Debug)]
pub struct FetchResponse {
    pub seq: u64,
    pub result: Result<Vec<RunRecord>, String>,
}

/// Immutable view of the feed handed to the presentation layer. Records
/// sit behind an `Arc` so snapshots stay cheap and the previous rows
/// remain visible while a fetch is in flight.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub status: FeedStatus,
    pub period: Period,
    pub records: Arc<Vec<RunRecord>>,
    pub error: Option<String>,
    /// Bumped on every state change; lets pollers detect updates cheaply.
    pub revision: u64,
}

#[derive(Debug)]
pub struct RecordFeed {
    status: FeedStatus,
    period: Period,
    records: Arc<Vec<RunRecord>>,
    error: Option<String>,
    revision: u64,
    issued_seq: u64,
    in_flight: Option<u64>,
}

impl RecordFeed {
    pub fn new(period: Period) -> Self {
        Self {
            status: FeedStatus::Idle,
            period,
            records: Arc::new(Vec::new()),
            error: None,
            revision: 0,
            issued_seq: 0,
            in_flight: None,
        }
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            status: self.status,
            period: self.period,
            records: Arc::clone(&self.records),
            error: self.error.clone(),
            revision: self.revision,
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, FeedStatus::Loading)
    }

    /// Switches the feed to `period` and starts a fetch for it. Always
    /// issues, even when the period is unchanged (acts as a refresh).
    pub fn set_period(&mut self, period: Period) -> FetchRequest {
        self.period = period;
        self.begin_fetch()
    }

    /// Textual variant of [`set_period`](Self::set_period) for callers
    /// holding an unvalidated name. An unknown name is rejected without
    /// touching the feed.
    pub fn set_period_named(&mut self, name: &str) -> Result<FetchRequest, FeedError> {
        let period = name
            .parse::<Period>()
            .map_err(|_| FeedError::InvalidPeriod(name.to_string()))?;
        Ok(self.set_period(period))
    }

    /// Re-fetches the current period. Returns `None` while a fetch is
    /// already pending: rapid refreshes coalesce into the in-flight
    /// request instead of duplicating it.
    pub fn refresh(&mut self) -> Option<FetchRequest> {
        if self.in_flight.is_some() {
            return None;
        }
        Some(self.begin_fetch())
    }

    fn begin_fetch(&mut self) -> FetchRequest {
        self.issued_seq += 1;
        self.in_flight = Some(self.issued_seq);
        self.status = FeedStatus::Loading;
        self.revision += 1;
        FetchRequest {
            seq: self.issued_seq,
            period: self.period,
        }
    }

    /// Applies a transport response. Only the newest issued request may
    /// settle the feed; responses to superseded requests are discarded,
    /// which is what makes response application follow request-issue
    /// order rather than arrival order. Returns whether state changed.
    pub fn apply(&mut self, response: FetchResponse) -> bool {
        if self.in_flight != Some(response.seq) {
            tracing::debug!(
                seq = response.seq,
                newest = self.issued_seq,
                "discarding stale fetch response"
            );
            return false;
        }
        self.in_flight = None;
        match response.result {
            Ok(records) => {
                self.status = FeedStatus::Success;
                self.records = Arc::new(records);
                self.error = None;
            }
            Err(payload) => {
                // Records from the last success stay visible.
                self.status = FeedStatus::Error;
                self.error = Some(describe_failure(&payload));
            }
        }
        self.revision += 1;
        true
    }
}

#[derive(Deserialize)]
struct FailurePayload {
    description: String,
}

fn describe_failure(payload: &str) -> String {
    match serde_json::from_str::<FailurePayload>(payload) {
        Ok(decoded) => decoded.description,
        Err(err) => {
            tracing::warn!(%err, "fetch failure payload did not decode, using generic description");
            GENERIC_FETCH_ERROR.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn run(world_name: &str) -> RunRecord {
        RunRecord {
            world_name: world_name.to_string(),
            final_igt: 600_000,
            ..RunRecord::default()
        }
    }

    fn success(seq: u64, names: &[&str]) -> FetchResponse {
        FetchResponse {
            seq,
            result: Ok(names.iter().map(|name| run(name)).collect()),
        }
    }

    fn failure(seq: u64, payload: &str) -> FetchResponse {
        FetchResponse {
            seq,
            result: Err(payload.to_string()),
        }
    }

    fn names(snapshot: &FeedSnapshot) -> Vec<String> {
        snapshot
            .records
            .iter()
            .map(|record| record.world_name.clone())
            .collect()
    }

    #[test]
    fn starts_idle_on_the_given_period() {
        let feed = RecordFeed::new(Period::Today);
        let snapshot = feed.snapshot();
        assert_eq!(snapshot.status, FeedStatus::Idle);
        assert_eq!(snapshot.period, Period::Today);
        assert!(snapshot.records.is_empty());
        assert_eq!(snapshot.error, None);
    }

    #[test]
    fn set_period_enters_loading_and_issues_a_request() {
        let mut feed = RecordFeed::new(Period::Today);
        let request = feed.set_period(Period::Week);
        assert_eq!(request.period, Period::Week);
        assert_eq!(request.seq, 1);
        let snapshot = feed.snapshot();
        assert_eq!(snapshot.status, FeedStatus::Loading);
        assert_eq!(snapshot.period, Period::Week);
    }

    #[test]
    fn unknown_period_name_is_rejected_without_state_change() {
        let mut feed = RecordFeed::new(Period::Today);
        let before = feed.snapshot();
        let err = feed.set_period_named("bogus").unwrap_err();
        assert_matches!(err, FeedError::InvalidPeriod(ref name) if name == "bogus");
        let after = feed.snapshot();
        assert_eq!(after.status, before.status);
        assert_eq!(after.period, before.period);
        assert_eq!(after.revision, before.revision);
    }

    #[test]
    fn valid_period_name_behaves_like_set_period() {
        let mut feed = RecordFeed::new(Period::Today);
        let request = feed.set_period_named("month").expect("valid period");
        assert_eq!(request.period, Period::Month);
        assert_eq!(feed.snapshot().status, FeedStatus::Loading);
    }

    #[test]
    fn success_replaces_records_and_clears_error() {
        let mut feed = RecordFeed::new(Period::Today);
        let request = feed.refresh().expect("first refresh issues");
        assert!(feed.apply(success(request.seq, &["Alpha", "Beta"])));
        let snapshot = feed.snapshot();
        assert_eq!(snapshot.status, FeedStatus::Success);
        assert_eq!(names(&snapshot), vec!["Alpha", "Beta"]);
        assert_eq!(snapshot.error, None);
    }

    #[test]
    fn rapid_refreshes_coalesce_into_one_request() {
        let mut feed = RecordFeed::new(Period::Today);
        let first = feed.refresh();
        let second = feed.refresh();
        assert!(first.is_some());
        assert!(second.is_none());

        // the lone in-flight request settles the feed
        assert!(feed.apply(success(first.unwrap().seq, &["Only"])));
        assert_eq!(feed.snapshot().status, FeedStatus::Success);

        // once settled, refresh issues again
        assert!(feed.refresh().is_some());
    }

    #[test]
    fn stale_response_is_discarded_after_a_newer_request() {
        let mut feed = RecordFeed::new(Period::Today);
        let first = feed.set_period(Period::Today);
        let second = feed.set_period(Period::All);

        // the newer request resolves first and wins
        assert!(feed.apply(success(second.seq, &["Fresh"])));
        assert_eq!(feed.snapshot().status, FeedStatus::Success);

        // the slow response for the superseded request arrives later
        assert!(!feed.apply(success(first.seq, &["Stale"])));
        let snapshot = feed.snapshot();
        assert_eq!(names(&snapshot), vec!["Fresh"]);
        assert_eq!(snapshot.status, FeedStatus::Success);
    }

    #[test]
    fn superseded_response_never_settles_a_pending_fetch() {
        let mut feed = RecordFeed::new(Period::Today);
        let first = feed.set_period(Period::Today);
        let _second = feed.set_period(Period::All);

        // older response arrives while the newer fetch is still pending
        assert!(!feed.apply(success(first.seq, &["Stale"])));
        let snapshot = feed.snapshot();
        assert_eq!(snapshot.status, FeedStatus::Loading);
        assert!(snapshot.records.is_empty());
    }

    #[test]
    fn failure_preserves_records_and_decodes_the_description() {
        let mut feed = RecordFeed::new(Period::Today);
        let request = feed.refresh().expect("issues");
        feed.apply(success(request.seq, &["Kept"]));

        let request = feed.refresh().expect("issues");
        let payload = r#"{"code":"IoError","description":"permission denied"}"#;
        assert!(feed.apply(failure(request.seq, payload)));
        let snapshot = feed.snapshot();
        assert_eq!(snapshot.status, FeedStatus::Error);
        assert_eq!(snapshot.error.as_deref(), Some("permission denied"));
        assert_eq!(names(&snapshot), vec!["Kept"]);
    }

    #[test]
    fn malformed_failure_payload_falls_back_to_generic_description() {
        let mut feed = RecordFeed::new(Period::Today);
        let request = feed.refresh().expect("issues");
        assert!(feed.apply(failure(request.seq, "<not json>")));
        assert_eq!(
            feed.snapshot().error.as_deref(),
            Some(GENERIC_FETCH_ERROR)
        );
    }

    #[test]
    fn feed_is_reenterable_after_an_error() {
        let mut feed = RecordFeed::new(Period::Today);
        let request = feed.refresh().expect("issues");
        feed.apply(failure(request.seq, "{}"));
        assert_eq!(feed.snapshot().status, FeedStatus::Error);

        let request = feed.refresh().expect("error state re-enters loading");
        assert_eq!(feed.snapshot().status, FeedStatus::Loading);
        feed.apply(success(request.seq, &["Back"]));
        assert_eq!(feed.snapshot().status, FeedStatus::Success);
    }

    #[test]
    fn revision_advances_on_every_state_change() {
        let mut feed = RecordFeed::new(Period::Today);
        let r0 = feed.snapshot().revision;
        let request = feed.refresh().expect("issues");
        let r1 = feed.snapshot().revision;
        feed.apply(success(request.seq, &[]));
        let r2 = feed.snapshot().revision;
        assert!(r0 < r1 && r1 < r2);

        // discarded responses leave the revision alone
        feed.apply(success(request.seq, &["Dup"]));
        assert_eq!(feed.snapshot().revision, r2);
    }
}
