//! Dispatch orderings for registry snapshots.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::AutoLoadEntry;

/// Built-in orderings applied before a sweep is enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortType {
    /// Registry iteration order.
    None,
    /// Least recently loaded first.
    #[default]
    OldestFirst,
    /// Most requested first.
    RequestTimesDesc,
    /// Fewest loads first.
    LoadCntAsc,
}

impl SortType {
    pub fn comparator(self) -> Option<fn(&AutoLoadEntry, &AutoLoadEntry) -> Ordering> {
        match self {
            SortType::None => None,
            SortType::OldestFirst => Some(oldest_first),
            SortType::RequestTimesDesc => Some(request_times_desc),
            SortType::LoadCntAsc => Some(load_cnt_asc),
        }
    }
}

fn oldest_first(a: &AutoLoadEntry, b: &AutoLoadEntry) -> Ordering {
    a.last_load_time()
        .cmp(&b.last_load_time())
        .then_with(|| b.request_times().cmp(&a.request_times()))
}

fn request_times_desc(a: &AutoLoadEntry, b: &AutoLoadEntry) -> Ordering {
    b.request_times().cmp(&a.request_times())
}

fn load_cnt_asc(a: &AutoLoadEntry, b: &AutoLoadEntry) -> Ordering {
    a.load_cnt().cmp(&b.load_cnt())
}
