// crates/core/src/merge.rs
//! Contiguous focus-session merging.
//!
//! A user who pauses for a moment between two timer runs on the same task
//! produces two rows that really describe one sitting. Rows whose gap is
//! under [`MERGE_GAP_SECS`] are collapsed: the earliest row survives with the
//! group's latest end time and the summed worked duration, the others are
//! deleted.

/// Sessions separated by less than this many seconds are merged.
pub const MERGE_GAP_SECS: i64 = 90;

/// The parts of an ended focus session the merge needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSpan {
    pub id: i64,
    pub started_at: i64,
    pub ended_at: i64,
    pub duration_seconds: i64,
}

/// One collapse: `keep_id` is rewritten, `remove_ids` are deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeGroup {
    pub keep_id: i64,
    pub started_at: i64,
    pub ended_at: i64,
    pub duration_seconds: i64,
    pub remove_ids: Vec<i64>,
}

impl MergeGroup {
    fn from_members(members: &[SessionSpan]) -> Option<Self> {
        let (first, rest) = members.split_first()?;
        if rest.is_empty() {
            return None;
        }
        Some(Self {
            keep_id: first.id,
            started_at: first.started_at,
            ended_at: members.iter().map(|s| s.ended_at).max().unwrap_or(first.ended_at),
            duration_seconds: members.iter().map(|s| s.duration_seconds).sum(),
            remove_ids: rest.iter().map(|s| s.id).collect(),
        })
    }
}

/// Plan the merges for one task's sessions.
///
/// Returns only groups with two or more members, so an already-merged list
/// yields an empty plan.
pub fn plan_contiguous_merge(spans: &[SessionSpan]) -> Vec<MergeGroup> {
    let mut ordered = spans.to_vec();
    ordered.sort_by_key(|s| (s.started_at, s.id));

    let mut groups = Vec::new();
    let mut current: Vec<SessionSpan> = Vec::new();
    let mut current_end = i64::MIN;

    for span in ordered {
        // The gap is measured from the end of the whole group so that a short
        // session nested inside a longer one cannot split the group.
        if !current.is_empty() && span.started_at - current_end >= MERGE_GAP_SECS {
            groups.extend(MergeGroup::from_members(&current));
            current.clear();
        }
        current_end = if current.is_empty() {
            span.ended_at
        } else {
            current_end.max(span.ended_at)
        };
        current.push(span);
    }
    groups.extend(MergeGroup::from_members(&current));
    groups
}

/// Apply a plan to an in-memory list, returning the surviving spans ordered
/// by start time.
pub fn apply_merge(spans: &[SessionSpan], plan: &[MergeGroup]) -> Vec<SessionSpan> {
    let mut out: Vec<SessionSpan> = spans
        .iter()
        .filter(|s| !plan.iter().any(|g| g.remove_ids.contains(&s.id)))
        .map(|s| match plan.iter().find(|g| g.keep_id == s.id) {
            Some(g) => SessionSpan {
                id: s.id,
                started_at: g.started_at,
                ended_at: g.ended_at,
                duration_seconds: g.duration_seconds,
            },
            None => *s,
        })
        .collect();
    out.sort_by_key(|s| (s.started_at, s.id));
    out
}
