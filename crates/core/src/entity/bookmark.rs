use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::offset::{round_away_floating_point_nonsense, Timed, ROUNDING_STEPS_PER_BEAT};

/// Colors handed out to new bookmarks, in order.
pub const BOOKMARK_PALETTE: [&str; 6] = [
    "#e8114e", "#ffaa00", "#2dd4bf", "#3b82f6", "#a855f7", "#22c55e",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub beat_num: f64,
    pub name: String,
    pub color: String,
}

impl Timed for Bookmark {
    fn beat(&self) -> f64 {
        self.beat_num
    }

    fn set_beat(&mut self, beat: f64) {
        self.beat_num = beat;
    }
}

/// At most one bookmark per beat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookmarkMap {
    entries: BTreeMap<i64, Bookmark>,
}

fn beat_key(beat_num: f64) -> i64 {
    (round_away_floating_point_nonsense(beat_num) * ROUNDING_STEPS_PER_BEAT).round() as i64
}

impl BookmarkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bookmark with the next palette color, replacing any bookmark
    /// already sitting on that beat.
    pub fn create(&mut self, beat_num: f64, name: impl Into<String>) -> &Bookmark {
        let color = BOOKMARK_PALETTE[self.entries.len() % BOOKMARK_PALETTE.len()].to_string();
        self.insert(Bookmark {
            beat_num,
            name: name.into(),
            color,
        })
    }

    pub fn insert(&mut self, mut bookmark: Bookmark) -> &Bookmark {
        bookmark.beat_num = round_away_floating_point_nonsense(bookmark.beat_num);
        let key = beat_key(bookmark.beat_num);
        self.entries.insert(key, bookmark);
        &self.entries[&key]
    }

    pub fn delete(&mut self, beat_num: f64) -> Option<Bookmark> {
        self.entries.remove(&beat_key(beat_num))
    }

    /// Renames the bookmark at `beat_num`. A miss is a no-op.
    pub fn rename(&mut self, beat_num: f64, name: impl Into<String>) -> bool {
        match self.entries.get_mut(&beat_key(beat_num)) {
            Some(bookmark) => {
                bookmark.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, beat_num: f64) -> Option<&Bookmark> {
        self.entries.get(&beat_key(beat_num))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bookmarks in beat order.
    pub fn iter(&self) -> impl Iterator<Item = &Bookmark> {
        self.entries.values()
    }

    pub fn into_vec(self) -> Vec<Bookmark> {
        self.entries.into_values().collect()
    }
}

impl FromIterator<Bookmark> for BookmarkMap {
    fn from_iter<I: IntoIterator<Item = Bookmark>>(iter: I) -> Self {
        let mut map = Self::new();
        for bookmark in iter {
            map.insert(bookmark);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_bookmark_per_beat() {
        let mut bookmarks = BookmarkMap::new();
        bookmarks.create(4.0, "Verse");
        bookmarks.create(4.0 + 1e-9, "Chorus");

        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks.get(4.0).unwrap().name, "Chorus");
    }

    #[test]
    fn palette_cycles_and_order_is_by_beat() {
        let mut bookmarks = BookmarkMap::new();
        bookmarks.create(16.0, "Drop");
        bookmarks.create(2.0, "Intro");

        let names: Vec<&str> = bookmarks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Intro", "Drop"]);
        assert_eq!(bookmarks.get(2.0).unwrap().color, BOOKMARK_PALETTE[1]);
    }

    #[test]
    fn rename_and_delete_miss_are_no_ops() {
        let mut bookmarks = BookmarkMap::new();
        assert!(!bookmarks.rename(1.0, "Nothing"));
        assert!(bookmarks.delete(1.0).is_none());

        bookmarks.create(1.0, "Start");
        assert!(bookmarks.rename(1.0, "Begin"));
        assert_eq!(bookmarks.delete(1.0).unwrap().name, "Begin");
        assert!(bookmarks.is_empty());
    }
}
