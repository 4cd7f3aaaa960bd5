//! Per-zone presence debouncing.
//!
//! A [`ZoneDetector`] turns a stream of raw distances into a stable
//! present/absent state. A transition is confirmed only after `certainty`
//! consecutive samples land on the same side of the zone boundary.

use std::fmt;

pub type EnterCallback = Box<dyn FnMut(u16) + Send>;
pub type ExitCallback = Box<dyn FnMut() + Send>;

/// Stable identifier of a zone; unlike its index it survives deletions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(pub u32);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneTransition {
    Entered { distance_mm: u16 },
    Exited,
}

pub struct ZoneDetector {
    id: ZoneId,
    min_distance: u16,
    max_distance: u16,
    object_present: bool,
    in_zone_count: usize,
    out_zone_count: usize,
    on_enter: Option<EnterCallback>,
    on_exit: Option<ExitCallback>,
}

impl ZoneDetector {
    /// `min_distance <= max_distance` is expected but not checked; an inverted
    /// zone simply never contains a sample.
    pub fn new(
        id: ZoneId,
        min_distance: u16,
        max_distance: u16,
        on_enter: Option<EnterCallback>,
        on_exit: Option<ExitCallback>,
    ) -> Self {
        Self {
            id,
            min_distance,
            max_distance,
            object_present: false,
            in_zone_count: 0,
            out_zone_count: 0,
            on_enter,
            on_exit,
        }
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn min_distance(&self) -> u16 {
        self.min_distance
    }

    pub fn max_distance(&self) -> u16 {
        self.max_distance
    }

    /// Replace both bounds. Counters and presence are left as they are; the
    /// next sample is judged against the new bounds.
    pub fn set_bounds(&mut self, min_distance: u16, max_distance: u16) {
        self.min_distance = min_distance;
        self.max_distance = max_distance;
    }

    pub fn set_min_distance(&mut self, min_distance: u16) {
        self.min_distance = min_distance;
    }

    pub fn set_max_distance(&mut self, max_distance: u16) {
        self.max_distance = max_distance;
    }

    pub fn set_on_enter(&mut self, on_enter: Option<EnterCallback>) {
        self.on_enter = on_enter;
    }

    pub fn set_on_exit(&mut self, on_exit: Option<ExitCallback>) {
        self.on_exit = on_exit;
    }

    pub fn contains(&self, distance_mm: u16) -> bool {
        (self.min_distance..=self.max_distance).contains(&distance_mm)
    }

    pub fn is_object_present(&self) -> bool {
        self.object_present
    }

    pub fn in_zone_count(&self) -> usize {
        self.in_zone_count
    }

    pub fn out_zone_count(&self) -> usize {
        self.out_zone_count
    }

    /// Feed one sample. Fires `on_enter`/`on_exit` at most once per confirmed
    /// transition and returns that transition.
    ///
    /// A `certainty` of 0 confirms on the first sample, same as 1.
    pub fn evaluate(&mut self, distance_mm: u16, certainty: usize) -> Option<ZoneTransition> {
        if self.contains(distance_mm) {
            self.in_zone_count = self.in_zone_count.saturating_add(1);
            self.out_zone_count = 0;
            if self.in_zone_count >= certainty && !self.object_present {
                self.object_present = true;
                if let Some(on_enter) = self.on_enter.as_mut() {
                    on_enter(distance_mm);
                }
                return Some(ZoneTransition::Entered { distance_mm });
            }
        } else {
            self.out_zone_count = self.out_zone_count.saturating_add(1);
            self.in_zone_count = 0;
            if self.out_zone_count >= certainty && self.object_present {
                self.object_present = false;
                if let Some(on_exit) = self.on_exit.as_mut() {
                    on_exit();
                }
                return Some(ZoneTransition::Exited);
            }
        }
        None
    }
}

impl fmt::Debug for ZoneDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneDetector")
            .field("id", &self.id)
            .field("min_distance", &self.min_distance)
            .field("max_distance", &self.max_distance)
            .field("object_present", &self.object_present)
            .field("in_zone_count", &self.in_zone_count)
            .field("out_zone_count", &self.out_zone_count)
            .field("on_enter", &self.on_enter.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Fired {
        Enter(u16),
        Exit,
    }

    fn recording_zone(min: u16, max: u16) -> (ZoneDetector, Arc<Mutex<Vec<Fired>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let enter_log = Arc::clone(&log);
        let exit_log = Arc::clone(&log);
        let zone = ZoneDetector::new(
            ZoneId(0),
            min,
            max,
            Some(Box::new(move |distance| {
                enter_log.lock().expect("log lock").push(Fired::Enter(distance));
            })),
            Some(Box::new(move || {
                exit_log.lock().expect("log lock").push(Fired::Exit);
            })),
        );
        (zone, log)
    }

    fn fired(log: &Arc<Mutex<Vec<Fired>>>) -> Vec<Fired> {
        log.lock().expect("log lock").clone()
    }

    #[test]
    fn enter_then_exit_with_certainty_three() {
        let (mut zone, log) = recording_zone(100, 200);

        assert_eq!(zone.evaluate(150, 3), None);
        assert_eq!(zone.evaluate(150, 3), None);
        assert!(!zone.is_object_present());
        assert_eq!(
            zone.evaluate(150, 3),
            Some(ZoneTransition::Entered { distance_mm: 150 })
        );
        assert!(zone.is_object_present());
        assert_eq!(fired(&log), vec![Fired::Enter(150)]);

        assert_eq!(zone.evaluate(50, 3), None);
        assert_eq!(zone.evaluate(50, 3), None);
        assert!(zone.is_object_present());
        assert_eq!(zone.evaluate(50, 3), Some(ZoneTransition::Exited));
        assert!(!zone.is_object_present());
        assert_eq!(fired(&log), vec![Fired::Enter(150), Fired::Exit]);
    }

    #[test]
    fn enter_reports_the_confirming_sample() {
        let (mut zone, log) = recording_zone(100, 200);

        for distance in [110, 120, 130, 140] {
            zone.evaluate(distance, 4);
        }

        assert_eq!(fired(&log), vec![Fired::Enter(140)]);
    }

    #[test]
    fn presence_does_not_retrigger_while_in_zone() {
        let (mut zone, log) = recording_zone(100, 200);

        for _ in 0..10 {
            zone.evaluate(150, 2);
        }

        assert_eq!(fired(&log), vec![Fired::Enter(150)]);
        assert_eq!(zone.in_zone_count(), 10);
        assert_eq!(zone.out_zone_count(), 0);
    }

    #[test]
    fn single_outlier_resets_the_run() {
        let (mut zone, log) = recording_zone(100, 200);

        zone.evaluate(150, 3);
        zone.evaluate(150, 3);
        zone.evaluate(500, 3);
        assert_eq!(zone.in_zone_count(), 0);
        assert_eq!(zone.out_zone_count(), 1);
        zone.evaluate(150, 3);
        zone.evaluate(150, 3);

        assert!(!zone.is_object_present());
        assert!(fired(&log).is_empty());

        zone.evaluate(150, 3);
        assert!(zone.is_object_present());
    }

    #[test]
    fn zero_certainty_transitions_immediately() {
        let (mut zone, log) = recording_zone(100, 200);

        assert_eq!(
            zone.evaluate(100, 0),
            Some(ZoneTransition::Entered { distance_mm: 100 })
        );
        assert_eq!(zone.evaluate(201, 0), Some(ZoneTransition::Exited));

        assert_eq!(fired(&log), vec![Fired::Enter(100), Fired::Exit]);
    }

    #[test]
    fn out_of_zone_while_absent_fires_nothing() {
        let (mut zone, log) = recording_zone(100, 200);

        for _ in 0..5 {
            assert_eq!(zone.evaluate(20, 0), None);
        }

        assert!(!zone.is_object_present());
        assert!(fired(&log).is_empty());
    }

    #[test]
    fn bounds_are_inclusive() {
        let zone = ZoneDetector::new(ZoneId(1), 100, 200, None, None);

        assert!(zone.contains(100));
        assert!(zone.contains(200));
        assert!(!zone.contains(99));
        assert!(!zone.contains(201));
    }

    #[test]
    fn missing_callbacks_are_a_no_op() {
        let mut zone = ZoneDetector::new(ZoneId(2), 0, 10, None, None);

        assert!(zone.evaluate(5, 1).is_some());
        assert!(zone.evaluate(50, 1).is_some());
        assert!(!zone.is_object_present());
    }

    #[test]
    fn inverted_bounds_never_contain_a_sample() {
        let mut zone = ZoneDetector::new(ZoneId(3), 300, 100, None, None);

        for distance in [50, 100, 200, 300, 400] {
            zone.evaluate(distance, 1);
        }

        assert!(!zone.is_object_present());
    }
}
