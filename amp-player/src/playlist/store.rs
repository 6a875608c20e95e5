//! Ordered playlist storage
//!
//! Items live in a `Vec`; the item at position `i` always carries track
//! number `i + 1`. Every mutation renumbers the affected range and then
//! publishes a structural change followed by the new count.

use amp_common::events::{AmpEvent, EventBus, PlaylistChange};
use amp_common::TrackDescriptor;
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::broadcast;
use tracing::debug;

/// Ordered, densely numbered collection of track descriptors
pub struct PlaylistStore {
    items: Vec<TrackDescriptor>,
    events: EventBus,
}

impl std::fmt::Debug for PlaylistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaylistStore")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

impl Default for PlaylistStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaylistStore {
    /// Empty store with a private event bus
    pub fn new() -> Self {
        Self::with_events(EventBus::default())
    }

    /// Empty store publishing on a shared bus
    pub fn with_events(events: EventBus) -> Self {
        Self {
            items: Vec::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AmpEvent> {
        self.events.subscribe()
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in ascending track-number order
    pub fn iter(&self) -> impl Iterator<Item = &TrackDescriptor> {
        self.items.iter()
    }

    pub fn items(&self) -> &[TrackDescriptor] {
        &self.items
    }

    pub fn into_items(self) -> Vec<TrackDescriptor> {
        self.items
    }

    /// Track numbers currently in use (always `1..=count`)
    pub fn keys(&self) -> Vec<u32> {
        self.items.iter().map(|item| item.track_number).collect()
    }

    pub fn get_item(&self, track_number: u32) -> Option<&TrackDescriptor> {
        index_of(track_number, self.items.len()).map(|i| &self.items[i])
    }

    /// Append `item`, returning the track number it was given
    pub fn add_item(&mut self, mut item: TrackDescriptor) -> u32 {
        let index = self.items.len();
        item.track_number = number_at(index);
        let track_number = item.track_number;
        self.items.push(item.clone());

        debug!("Playlist: added #{} ({})", track_number, item.title);
        self.publish(PlaylistChange::Added { index, item });
        track_number
    }

    /// Remove an item and close the gap. Returns `false` if absent.
    pub fn remove_item(&mut self, track_number: u32) -> bool {
        let Some(index) = index_of(track_number, self.items.len()) else {
            return false;
        };

        let removed = self.items.remove(index);
        self.renumber_from(index);

        debug!("Playlist: removed #{} ({})", track_number, removed.title);
        self.publish(PlaylistChange::Reset);
        true
    }

    /// Replace an item in place; the new descriptor takes the same number
    pub fn update_item(&mut self, track_number: u32, mut item: TrackDescriptor) -> bool {
        let Some(index) = index_of(track_number, self.items.len()) else {
            return false;
        };

        item.track_number = track_number;
        let old = std::mem::replace(&mut self.items[index], item.clone());
        self.publish(PlaylistChange::Replaced {
            index,
            old,
            new: item,
        });
        true
    }

    /// Exchange two items. Returns `false` with no change if either is absent.
    pub fn swap_items(&mut self, a: u32, b: u32) -> bool {
        let len = self.items.len();
        let (Some(ia), Some(ib)) = (index_of(a, len), index_of(b, len)) else {
            return false;
        };
        if ia == ib {
            return true;
        }

        self.items.swap(ia, ib);
        self.items[ia].track_number = number_at(ia);
        self.items[ib].track_number = number_at(ib);

        let (old_a, new_a) = (self.items[ib].clone(), self.items[ia].clone());
        let (old_b, new_b) = (self.items[ia].clone(), self.items[ib].clone());
        self.emit_change(PlaylistChange::Replaced {
            index: ia,
            old: with_number(old_a, a),
            new: new_a,
        });
        self.publish(PlaylistChange::Replaced {
            index: ib,
            old: with_number(old_b, b),
            new: new_b,
        });
        true
    }

    /// Relocate an item so it ends up at `new_number`
    ///
    /// Items between the two positions shift by one toward the vacated slot:
    /// `[A,B,C,D]` with `move_item(1, 3)` gives `[B,C,A,D]`. Both endpoints
    /// are validated before anything changes.
    pub fn move_item(&mut self, old_number: u32, new_number: u32) -> bool {
        let len = self.items.len();
        let (Some(from), Some(to)) = (index_of(old_number, len), index_of(new_number, len)) else {
            return false;
        };
        if from == to {
            return true;
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.renumber_from(from.min(to));

        debug!("Playlist: moved #{} to #{}", old_number, new_number);
        let item = self.items[to].clone();
        self.publish(PlaylistChange::Moved { from, to, item });
        true
    }

    /// Shuffle with the thread RNG; see [`PlaylistStore::randomize_with`]
    pub fn randomize(&mut self) -> Vec<u32> {
        self.randomize_with(&mut rand::thread_rng())
    }

    /// Uniform Fisher–Yates shuffle followed by renumbering
    ///
    /// Returns the permutation applied: `mapping[old - 1] == new`.
    pub fn randomize_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<u32> {
        self.items.shuffle(rng);

        let mut mapping = vec![0; self.items.len()];
        for (index, item) in self.items.iter_mut().enumerate() {
            let old_number = item.track_number as usize;
            item.track_number = number_at(index);
            mapping[old_number - 1] = item.track_number;
        }

        self.publish(PlaylistChange::Reset);
        mapping
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.items.clear();
        self.publish(PlaylistChange::Reset);
    }

    /// Replace the whole contents, renumbering from 1
    pub fn replace_all(&mut self, items: Vec<TrackDescriptor>) {
        self.items = items;
        self.renumber_from(0);
        self.publish(PlaylistChange::Reset);
    }

    /// First playable track after `after` (or from the top when `None`)
    pub fn next_playable(&self, after: Option<u32>) -> Option<u32> {
        let start = after.map_or(0, |n| n as usize);
        self.items
            .iter()
            .skip(start)
            .find(|item| item.is_playable())
            .map(|item| item.track_number)
    }

    /// Last playable track before `before`
    pub fn previous_playable(&self, before: u32) -> Option<u32> {
        let end = (before.saturating_sub(1) as usize).min(self.items.len());
        self.items[..end]
            .iter()
            .rev()
            .find(|item| item.is_playable())
            .map(|item| item.track_number)
    }

    fn renumber_from(&mut self, start: usize) {
        for (index, item) in self.items.iter_mut().enumerate().skip(start) {
            item.track_number = number_at(index);
        }
    }

    fn emit_change(&self, change: PlaylistChange) {
        self.events.emit_lossy(AmpEvent::PlaylistChanged {
            change,
            timestamp: Utc::now(),
        });
    }

    fn publish(&self, change: PlaylistChange) {
        self.emit_change(change);
        self.events.emit_lossy(AmpEvent::PlaylistCountChanged {
            count: self.items.len(),
            timestamp: Utc::now(),
        });
    }
}

fn index_of(track_number: u32, len: usize) -> Option<usize> {
    let index = (track_number as usize).checked_sub(1)?;
    (index < len).then_some(index)
}

fn number_at(index: usize) -> u32 {
    (index + 1) as u32
}

fn with_number(mut item: TrackDescriptor, track_number: u32) -> TrackDescriptor {
    item.track_number = track_number;
    item
}
