//! Session grouping by folder or relative date
//!
//! Group membership is derived on every call from the current collection and
//! the supplied "now"; nothing is cached against a session, so date buckets
//! roll over naturally as wall-clock time advances.

use crate::models::Session;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Group label for paths without a parent directory segment
pub const ROOT_GROUP: &str = "Root";

pub const TODAY: &str = "Today";
pub const YESTERDAY: &str = "Yesterday";
pub const THIS_WEEK: &str = "This Week";
pub const THIS_MONTH: &str = "This Month";

const SECONDS_PER_DAY: i64 = 86_400;

/// How the session list is organized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    /// Flat list in collection order
    #[default]
    None,
    /// By parent directory of the transcript file
    Folder,
    /// By relative modification date
    Date,
}

impl GroupMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupMode::None => "none",
            GroupMode::Folder => "folder",
            GroupMode::Date => "date",
        }
    }

    /// Whether this mode shows group headers
    pub fn is_grouped(&self) -> bool {
        !matches!(self, GroupMode::None)
    }

    /// Cycle none → folder → date → none
    pub fn next(&self) -> Self {
        match self {
            GroupMode::None => GroupMode::Folder,
            GroupMode::Folder => GroupMode::Date,
            GroupMode::Date => GroupMode::None,
        }
    }
}

impl fmt::Display for GroupMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(GroupMode::None),
            "folder" => Ok(GroupMode::Folder),
            "date" => Ok(GroupMode::Date),
            other => Err(format!(
                "unknown grouping mode '{}' (expected none, folder or date)",
                other
            )),
        }
    }
}

/// One bucket of sessions, borrowed from the collection it was built from
#[derive(Debug, Clone, PartialEq)]
pub struct SessionGroup<'a> {
    pub key: String,
    pub sessions: Vec<&'a Session>,
}

/// Folder group key: the second-to-last `/`-separated segment of the path
///
/// Paths with fewer than two segments, or whose parent segment is empty
/// (`/x.jsonl`), land in [`ROOT_GROUP`].
pub fn folder_of(file_path: &str) -> String {
    let parts: Vec<&str> = file_path.split('/').collect();
    if parts.len() < 2 {
        return ROOT_GROUP.to_string();
    }

    match parts[parts.len() - 2] {
        "" => ROOT_GROUP.to_string(),
        parent => parent.to_string(),
    }
}

/// Date group key for a modification time relative to `now`
///
/// Whole elapsed days decide the bucket: 0 → Today, 1 → Yesterday, 2–6 →
/// This Week, 7–29 → This Month, older → "<Month> <Year>" of the item's own
/// date in `now`'s time zone. Timestamps in the future count as Today.
pub fn date_group_of<Tz>(modified_secs: i64, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let diff_days = (now.timestamp() - modified_secs).div_euclid(SECONDS_PER_DAY);

    match diff_days {
        d if d <= 0 => TODAY.to_string(),
        1 => YESTERDAY.to_string(),
        d if d < 7 => THIS_WEEK.to_string(),
        d if d < 30 => THIS_MONTH.to_string(),
        _ => DateTime::<Utc>::from_timestamp(modified_secs, 0)
            .map(|utc| utc.with_timezone(&now.timezone()).format("%B %Y").to_string())
            .unwrap_or_else(|| "Unknown".to_string()),
    }
}

/// Partition sessions into ordered groups
///
/// - `None`: no groups; callers render the flat slice as-is.
/// - `Folder`: stable partition by [`folder_of`], keys ascending.
/// - `Date`: stable sort by modification time (newest first), then partition
///   by [`date_group_of`] with keys in first-encountered order.
pub fn group_sessions<'a, Tz>(
    sessions: &'a [Session],
    mode: GroupMode,
    now: &DateTime<Tz>,
) -> Vec<SessionGroup<'a>>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match mode {
        GroupMode::None => Vec::new(),
        GroupMode::Folder => {
            let mut buckets: BTreeMap<String, Vec<&'a Session>> = BTreeMap::new();
            for session in sessions {
                buckets
                    .entry(folder_of(&session.file_path))
                    .or_default()
                    .push(session);
            }
            buckets
                .into_iter()
                .map(|(key, sessions)| SessionGroup { key, sessions })
                .collect()
        }
        GroupMode::Date => {
            let mut sorted: Vec<&'a Session> = sessions.iter().collect();
            // sort_by is stable: equal mtimes keep collection order
            sorted.sort_by(|a, b| b.modified_time.cmp(&a.modified_time));

            let mut groups: Vec<SessionGroup<'a>> = Vec::new();
            let mut index: HashMap<String, usize> = HashMap::new();
            for session in sorted {
                let key = date_group_of(session.modified_time, now);
                match index.get(&key).copied() {
                    Some(i) => groups[i].sessions.push(session),
                    None => {
                        index.insert(key.clone(), groups.len());
                        groups.push(SessionGroup {
                            key,
                            sessions: vec![session],
                        });
                    }
                }
            }
            groups
        }
    }
}

/// Group keys only, in display order
pub fn group_keys<Tz>(sessions: &[Session], mode: GroupMode, now: &DateTime<Tz>) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    group_sessions(sessions, mode, now)
        .into_iter()
        .map(|group| group.key)
        .collect()
}
