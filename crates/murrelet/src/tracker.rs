use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::nav::NavLink;
use crate::outline::HeadingId;
use crate::viewport::{ObserverHandle, TrackingBand, Viewport};

/// Height of the fixed page header, in layout units.
///
/// Scroll targets land this far below the viewport top, and the tracking
/// band starts here.
pub const HEADER_OFFSET: f64 = 80.0;

/// The bottom boundary of the tracking band, as a fraction of the viewport
/// height.
pub const BAND_BOTTOM_FRACTION: f64 = 0.70;

/// Extra distance past the scroll offset that counts as already read when
/// the initial active section is computed.
pub const INITIAL_SCAN_SLACK: f64 = 100.0;

/// Tuning for a [`TocTracker`].
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Defaults to [`HEADER_OFFSET`].
    pub header_offset: f64,
    /// Defaults to [`BAND_BOTTOM_FRACTION`].
    pub band_bottom_fraction: f64,
    /// Defaults to [`INITIAL_SCAN_SLACK`].
    pub initial_scan_slack: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            header_offset: HEADER_OFFSET,
            band_bottom_fraction: BAND_BOTTOM_FRACTION,
            initial_scan_slack: INITIAL_SCAN_SLACK,
        }
    }
}

impl TrackerConfig {
    pub fn band(&self) -> TrackingBand {
        TrackingBand {
            top_offset: self.header_offset,
            bottom_fraction: self.band_bottom_fraction,
        }
    }
}

#[derive(Debug, Clone)]
struct TrackedAnchor {
    id: HeadingId,
    /// Document offset of the anchor, captured at attach time.
    top: f64,
}

/// Tracks which section of a page the reader is in and keeps the
/// table-of-contents navigation in step with it.
///
/// A tracker owns the active selection for one page's navigation links. It
/// reacts to two inputs from the host: anchors crossing into the tracking
/// band, and clicks on navigation links. Once a section is active, some
/// section stays active for the life of the tracker.
pub struct TocTracker {
    anchors: Vec<TrackedAnchor>,
    active: Option<usize>,
    observer: Option<ObserverHandle>,
    config: TrackerConfig,
}

impl TocTracker {
    /// Resolves `links` against the host document and starts tracking.
    ///
    /// Links that do not target a fragment of the current document, repeat
    /// an earlier link's fragment, or target a fragment with no anchor are
    /// dropped. Returns `None` when nothing is left to track.
    ///
    /// When the host cannot deliver crossing events the tracker still
    /// computes the initial section and serves clicks; the selection just
    /// never follows the reader's scrolling.
    pub fn attach(
        links: &[NavLink],
        viewport: &mut impl Viewport,
        config: TrackerConfig,
    ) -> Option<Self> {
        let scroll = viewport.scroll_offset();

        let mut anchors: Vec<TrackedAnchor> = Vec::with_capacity(links.len());
        for link in links {
            let Some(fragment) = link.fragment() else {
                trace!("dropping link to another document: {}", link.href);
                continue;
            };

            let id = HeadingId::from(fragment);
            if anchors.iter().any(|anchor| anchor.id == id) {
                trace!("dropping link with repeated fragment: {}", link.href);
                continue;
            }

            let Some(top) = viewport.anchor_top(&id) else {
                trace!("dropping link with no anchor: {}", link.href);
                continue;
            };

            anchors.push(TrackedAnchor {
                id,
                top: top + scroll,
            });
        }

        if anchors.is_empty() {
            trace!("no navigation links resolved; not tracking");
            return None;
        }

        let ids = anchors
            .iter()
            .map(|anchor| anchor.id.clone())
            .collect::<Vec<_>>();
        let observer = viewport.observe(&ids, config.band());
        if observer.is_none() {
            debug!("host cannot observe band crossings; tracking initial section only");
        }

        let mut tracker = Self {
            anchors,
            active: None,
            observer,
            config,
        };

        let initial = tracker.initial_index(scroll);
        tracker.activate(initial, viewport);

        debug!(
            "tracking {} section(s), starting at {}",
            tracker.anchors.len(),
            tracker.anchors[initial].id
        );

        Some(tracker)
    }

    /// Applies a batch of band-entry events, in the order the host delivered
    /// them. Each tracked anchor in the batch becomes the active section in
    /// turn; ids the tracker does not know are ignored.
    pub fn on_intersections(&mut self, entered: &[HeadingId], viewport: &mut impl Viewport) {
        for id in entered {
            let Some(index) = self.anchors.iter().position(|anchor| anchor.id == *id) else {
                continue;
            };

            self.activate(index, viewport);
        }
    }

    /// Handles a click on a navigation link.
    ///
    /// Returns `true` when the click was handled: the link targets a tracked
    /// anchor, an animated scroll towards it has been requested, and it is
    /// now the active section. Returns `false` when the host should fall
    /// back to its default navigation.
    pub fn on_link_click(&mut self, href: &str, viewport: &mut impl Viewport) -> bool {
        let Some(fragment) = href.strip_prefix('#').filter(|fragment| !fragment.is_empty())
        else {
            trace!("click on link to another document: {href}");
            return false;
        };

        let Some(index) = self
            .anchors
            .iter()
            .position(|anchor| anchor.id.as_str() == fragment)
        else {
            trace!("click on untracked fragment: #{fragment}");
            return false;
        };

        let id = self.anchors[index].id.clone();
        let Some(top) = viewport.anchor_top(&id) else {
            trace!("anchor no longer resolves: #{fragment}");
            return false;
        };

        let target = top + viewport.scroll_offset() - self.config.header_offset;
        viewport.scroll_to(target);
        self.activate(index, viewport);

        debug!("navigating to #{fragment}, scroll target {target}");

        true
    }

    /// The id of the active section, or `None` before the initial
    /// computation has run.
    pub fn active_id(&self) -> Option<&HeadingId> {
        self.active.map(|index| &self.anchors[index].id)
    }

    /// The tracked anchor ids, in document order.
    pub fn anchor_ids(&self) -> impl Iterator<Item = &HeadingId> {
        self.anchors.iter().map(|anchor| &anchor.id)
    }

    pub fn is_observing(&self) -> bool {
        self.observer.is_some()
    }

    /// Stops tracking and revokes the band registration, if one was made.
    pub fn detach(self, viewport: &mut impl Viewport) {
        if let Some(handle) = self.observer {
            viewport.unobserve(handle);
        }

        debug!("tracker detached");
    }

    /// The last anchor, in document order, whose top sits at or above the
    /// scan cursor. Falls back to the first anchor when none does.
    fn initial_index(&self, scroll: f64) -> usize {
        let cursor = scroll + self.config.initial_scan_slack;
        self.anchors
            .iter()
            .rposition(|anchor| anchor.top <= cursor)
            .unwrap_or(0)
    }

    fn activate(&mut self, index: usize, viewport: &mut impl Viewport) {
        if self.active == Some(index) {
            return;
        }

        self.active = Some(index);
        for (position, anchor) in self.anchors.iter().enumerate() {
            viewport.set_link_active(&anchor.id, position == index);
        }

        trace!("active section: {}", self.anchors[index].id);
    }
}
