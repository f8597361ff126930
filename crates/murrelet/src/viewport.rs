use indexmap::IndexMap;

use crate::outline::HeadingId;

/// The sub-region of the viewport in which a heading anchor counts as the
/// current one, expressed relative to the viewport so that resizes need no
/// re-registration.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct TrackingBand {
    /// Distance of the band's top boundary below the viewport top, in layout
    /// units.
    pub top_offset: f64,
    /// The band's bottom boundary, as a fraction of the viewport height.
    pub bottom_fraction: f64,
}

impl TrackingBand {
    /// Resolves the band against a concrete viewport height, yielding its
    /// boundaries as viewport-relative offsets.
    pub fn resolve(&self, viewport_height: f64) -> (f64, f64) {
        (self.top_offset, self.bottom_fraction * viewport_height)
    }

    /// Whether a viewport-relative offset falls within the band. Both
    /// boundaries are inclusive.
    pub fn contains(&self, offset: f64, viewport_height: f64) -> bool {
        let (top, bottom) = self.resolve(viewport_height);
        offset >= top && offset <= bottom
    }
}

/// A registration receipt from [`Viewport::observe`], redeemed by
/// [`Viewport::unobserve`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct ObserverHandle(pub u64);

/// The embedding host's side of the tracking contract: geometry queries and
/// the commands the tracker issues back to it.
pub trait Viewport {
    /// The current scroll offset of the document, in layout units.
    fn scroll_offset(&self) -> f64;

    /// Returns the top of the anchor's bounding box relative to the viewport
    /// top, or `None` if the document defines no such anchor.
    fn anchor_top(&self, id: &HeadingId) -> Option<f64>;

    /// Reflects whether the navigation link for `id` is the active one.
    fn set_link_active(&mut self, id: &HeadingId, active: bool);

    /// Starts an animated scroll towards `offset`. Callers never wait for
    /// completion.
    fn scroll_to(&mut self, offset: f64);

    /// Registers interest in `ids` crossing into `band`. Hosts that cannot
    /// deliver crossing events return `None`.
    fn observe(&mut self, ids: &[HeadingId], band: TrackingBand) -> Option<ObserverHandle>;

    /// Revokes a registration made by [`Viewport::observe`].
    fn unobserve(&mut self, handle: ObserverHandle);
}

/// A scripted host with a fixed document layout, for tests and demos.
///
/// Anchors sit at absolute document offsets. Moving the scroll position with
/// [`InMemoryViewport::set_scroll`] returns the anchors that entered the
/// registered band, in registration order, ready to hand to the tracker.
/// Animated scrolls complete instantly and synthesize no crossings.
pub struct InMemoryViewport {
    height: f64,
    scroll: f64,
    anchors: IndexMap<HeadingId, f64>,
    markers: IndexMap<HeadingId, bool>,
    marker_writes: usize,
    scroll_requests: Vec<f64>,
    observer: Option<(ObserverHandle, Vec<HeadingId>, TrackingBand)>,
    next_handle: u64,
    observation_supported: bool,
}

impl InMemoryViewport {
    pub fn new(height: f64) -> Self {
        Self {
            height,
            scroll: 0.0,
            anchors: IndexMap::new(),
            markers: IndexMap::new(),
            marker_writes: 0,
            scroll_requests: Vec::new(),
            observer: None,
            next_handle: 0,
            observation_supported: true,
        }
    }

    /// A host that cannot deliver crossing events, as over-restrictive
    /// embedders sometimes are.
    pub fn without_observation(height: f64) -> Self {
        Self {
            observation_supported: false,
            ..Self::new(height)
        }
    }

    pub fn insert_anchor(&mut self, id: HeadingId, document_top: f64) {
        self.anchors.insert(id, document_top);
    }

    /// Moves the scroll position and returns the observed anchors that
    /// entered the band on the way, in registration order.
    pub fn set_scroll(&mut self, offset: f64) -> Vec<HeadingId> {
        let previous = self.scroll;
        self.scroll = offset;

        let Some((_, ids, band)) = &self.observer else {
            return Vec::new();
        };

        let mut entered = Vec::new();
        for id in ids {
            let Some(&top) = self.anchors.get(id) else {
                continue;
            };

            let was_inside = band.contains(top - previous, self.height);
            let is_inside = band.contains(top - offset, self.height);
            if is_inside && !was_inside {
                entered.push(id.clone());
            }
        }

        entered
    }

    /// The ids whose navigation links are currently marked active.
    pub fn active_markers(&self) -> Vec<HeadingId> {
        self.markers
            .iter()
            .filter(|(_, &active)| active)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// How many marker writes the tracker has issued, including writes that
    /// did not change a marker's value.
    pub fn marker_writes(&self) -> usize {
        self.marker_writes
    }

    pub fn scroll_requests(&self) -> Vec<f64> {
        self.scroll_requests.clone()
    }

    pub fn is_observing(&self) -> bool {
        self.observer.is_some()
    }
}

impl Viewport for InMemoryViewport {
    fn scroll_offset(&self) -> f64 {
        self.scroll
    }

    fn anchor_top(&self, id: &HeadingId) -> Option<f64> {
        self.anchors.get(id).map(|top| top - self.scroll)
    }

    fn set_link_active(&mut self, id: &HeadingId, active: bool) {
        self.markers.insert(id.clone(), active);
        self.marker_writes += 1;
    }

    fn scroll_to(&mut self, offset: f64) {
        self.scroll_requests.push(offset);
        self.scroll = offset;
    }

    fn observe(&mut self, ids: &[HeadingId], band: TrackingBand) -> Option<ObserverHandle> {
        if !self.observation_supported {
            return None;
        }

        self.next_handle += 1;
        let handle = ObserverHandle(self.next_handle);
        self.observer = Some((handle, ids.to_vec(), band));

        Some(handle)
    }

    fn unobserve(&mut self, handle: ObserverHandle) {
        if self
            .observer
            .as_ref()
            .map_or(false, |(registered, _, _)| *registered == handle)
        {
            self.observer = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn band() -> TrackingBand {
        TrackingBand {
            top_offset: 80.0,
            bottom_fraction: 0.70,
        }
    }

    #[test]
    fn test_band_boundaries_are_inclusive() {
        let band = band();

        assert_eq!(band.resolve(1000.0), (80.0, 700.0));

        assert!(band.contains(80.0, 1000.0));
        assert!(band.contains(700.0, 1000.0));
        assert!(!band.contains(79.9, 1000.0));
        assert!(!band.contains(700.1, 1000.0));
    }

    #[test]
    fn test_crossings_are_reported_in_registration_order() {
        let mut viewport = InMemoryViewport::new(1000.0);
        viewport.insert_anchor(HeadingId::from("first"), 1000.0);
        viewport.insert_anchor(HeadingId::from("second"), 1100.0);

        let ids = [HeadingId::from("second"), HeadingId::from("first")];
        viewport.observe(&ids, band());

        let entered = viewport.set_scroll(920.0);

        assert_eq!(entered, [HeadingId::from("second"), HeadingId::from("first")]);
    }

    #[test]
    fn test_anchors_already_inside_the_band_do_not_reenter() {
        let mut viewport = InMemoryViewport::new(1000.0);
        viewport.insert_anchor(HeadingId::from("overview"), 100.0);
        viewport.insert_anchor(HeadingId::from("details"), 900.0);

        let ids = [HeadingId::from("overview"), HeadingId::from("details")];
        viewport.observe(&ids, band());

        // At scroll 0 "overview" is already inside the band.
        let entered = viewport.set_scroll(300.0);

        assert_eq!(entered, [HeadingId::from("details")]);
    }

    #[test]
    fn test_unobserve_clears_the_registration() {
        let mut viewport = InMemoryViewport::new(1000.0);
        viewport.insert_anchor(HeadingId::from("overview"), 400.0);

        let handle = viewport
            .observe(&[HeadingId::from("overview")], band())
            .unwrap();

        viewport.unobserve(ObserverHandle(999));
        assert!(viewport.is_observing());

        viewport.unobserve(handle);
        assert!(!viewport.is_observing());
        assert!(viewport.set_scroll(400.0).is_empty());
    }

    #[test]
    fn test_observation_can_be_unsupported() {
        let mut viewport = InMemoryViewport::without_observation(1000.0);
        viewport.insert_anchor(HeadingId::from("overview"), 400.0);

        assert_eq!(viewport.observe(&[HeadingId::from("overview")], band()), None);
        assert!(viewport.set_scroll(400.0).is_empty());
    }
}
