use crate::Result;
use crate::store::SessionStore;
use logscope_core::{hash, is_error_line, is_frame_line, normalize, strip_prefix};
use logscope_types::{ErrorFingerprint, RecurringErrorRecord, TimelinePoint};
use std::collections::{BTreeMap, HashMap};

/// Recurring-error index over the whole session corpus.
///
/// Built fresh per query; there is no persisted or incremental state.
#[derive(Debug, Clone, Default)]
pub struct RecurringIndex {
    records: BTreeMap<ErrorFingerprint, RecurringErrorRecord>,
}

impl RecurringIndex {
    /// `None` means the fingerprint has never been seen.
    pub fn get(&self, fingerprint: &ErrorFingerprint) -> Option<&RecurringErrorRecord> {
        self.records.get(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ErrorFingerprint, &RecurringErrorRecord)> {
        self.records.iter()
    }

    /// Records seen in at least `min_sessions` sessions, most widespread first.
    pub fn recurring(&self, min_sessions: usize) -> Vec<&RecurringErrorRecord> {
        let mut records: Vec<_> = self
            .records
            .values()
            .filter(|r| r.session_count >= min_sessions)
            .collect();
        records.sort_by(|a, b| {
            b.session_count
                .cmp(&a.session_count)
                .then_with(|| b.total_occurrences.cmp(&a.total_occurrences))
                .then_with(|| a.hash.cmp(&b.hash))
        });
        records
    }

    pub fn into_records(self) -> BTreeMap<ErrorFingerprint, RecurringErrorRecord> {
        self.records
    }
}

struct RecordBuilder {
    sample: String,
    total: usize,
    timeline: Vec<TimelinePoint>,
}

impl RecordBuilder {
    fn finish(self, hash: ErrorFingerprint) -> RecurringErrorRecord {
        let first_seen = self
            .timeline
            .first()
            .map(|p| p.session.clone())
            .unwrap_or_default();
        let last_seen = self
            .timeline
            .last()
            .map(|p| p.session.clone())
            .unwrap_or_default();
        RecurringErrorRecord {
            hash,
            session_count: self.timeline.len(),
            total_occurrences: self.total,
            first_seen,
            last_seen,
            timeline: self.timeline,
            sample: self.sample,
        }
    }
}

impl SessionStore {
    /// Scan every session and group qualifying error lines by fingerprint.
    ///
    /// Every qualifying line counts toward `total_occurrences`; a session
    /// counts once toward `session_count`. Stack frame lines are not error
    /// occurrences of their own.
    pub fn aggregate(&self) -> Result<RecurringIndex> {
        let records = self.scan(|_| true)?;
        Ok(RecurringIndex { records })
    }

    /// Aggregate a single fingerprint. `None` when it was never seen.
    pub fn record_for(
        &self,
        fingerprint: &ErrorFingerprint,
    ) -> Result<Option<RecurringErrorRecord>> {
        let mut records = self.scan(|fp| fp == fingerprint)?;
        Ok(records.remove(fingerprint))
    }

    fn scan<F>(&self, keep: F) -> Result<BTreeMap<ErrorFingerprint, RecurringErrorRecord>>
    where
        F: Fn(&ErrorFingerprint) -> bool,
    {
        let sessions = self.list_sessions()?;
        let mut builders: HashMap<ErrorFingerprint, RecordBuilder> = HashMap::new();

        // Sessions arrive oldest first, so pushing keeps every timeline chronological
        for session in &sessions {
            let content = match self.read_content(session) {
                Ok(content) => content,
                Err(err) => {
                    tracing::warn!(session = %session.id, error = %err, "skipping unreadable session");
                    continue;
                }
            };

            let mut per_session: BTreeMap<ErrorFingerprint, (usize, String)> = BTreeMap::new();
            for (_, line) in content.numbered() {
                if !is_error_line(line) || is_frame_line(strip_prefix(line)) {
                    continue;
                }
                let canonical = normalize(line);
                let fingerprint = hash(&canonical);
                if !keep(&fingerprint) {
                    continue;
                }
                per_session
                    .entry(fingerprint)
                    .or_insert_with(|| (0, canonical))
                    .0 += 1;
            }

            for (fingerprint, (count, sample)) in per_session {
                let builder = builders
                    .entry(fingerprint)
                    .or_insert_with(|| RecordBuilder {
                        sample,
                        total: 0,
                        timeline: Vec::new(),
                    });
                builder.total += count;
                builder.timeline.push(TimelinePoint {
                    session: session.id.clone(),
                    count,
                });
            }
        }

        tracing::debug!(
            sessions = sessions.len(),
            fingerprints = builders.len(),
            "aggregated session corpus"
        );

        Ok(builders
            .into_iter()
            .map(|(fp, builder)| (fp.clone(), builder.finish(fp)))
            .collect())
    }
}
