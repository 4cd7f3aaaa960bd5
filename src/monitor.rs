use crate::sensor::{DistanceMode, RangingSensor};
use crate::zone::{EnterCallback, ExitCallback, ZoneDetector, ZoneId, ZoneTransition};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(50);
pub const DEFAULT_CERTAINTY_FACTOR: usize = 1;

/// Fans single sensor samples out to an ordered set of zones.
///
/// Zones are addressed by position; deleting a zone shifts later indices
/// down. [`ZoneId`]s stay stable across deletions for callers that need to
/// hold on to a zone.
#[derive(Debug)]
pub struct ZoneMonitor<S> {
    sensor: S,
    zones: Vec<ZoneDetector>,
    next_zone_id: u32,
    update_interval: Duration,
    last_sample: Option<Instant>,
    certainty_factor: usize,
}

impl<S: RangingSensor> ZoneMonitor<S> {
    pub fn new(sensor: S, update_interval: Duration, certainty_factor: usize) -> Self {
        Self {
            sensor,
            zones: Vec::new(),
            next_zone_id: 0,
            update_interval,
            last_sample: None,
            certainty_factor,
        }
    }

    pub fn with_defaults(sensor: S) -> Self {
        Self::new(sensor, DEFAULT_UPDATE_INTERVAL, DEFAULT_CERTAINTY_FACTOR)
    }

    /// Initialize the sensor and start continuous sampling at the update
    /// interval. Returns false if either step fails.
    pub fn init(&mut self) -> bool {
        if let Err(err) = self.sensor.init() {
            warn!(error = %err, "Sensor initialization failed");
            return false;
        }
        if let Err(err) = self.sensor.start_continuous(self.update_interval) {
            warn!(
                error = %err,
                interval_ms = self.update_interval.as_millis(),
                "Failed to start continuous sampling"
            );
            return false;
        }
        true
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub fn add_zone(
        &mut self,
        min_distance: u16,
        max_distance: u16,
        on_enter: Option<EnterCallback>,
        on_exit: Option<ExitCallback>,
    ) -> ZoneId {
        let id = ZoneId(self.next_zone_id);
        self.next_zone_id = self.next_zone_id.wrapping_add(1);
        self.zones.push(ZoneDetector::new(
            id,
            min_distance,
            max_distance,
            on_enter,
            on_exit,
        ));
        debug!(
            zone = %id,
            index = self.zones.len() - 1,
            min_distance,
            max_distance,
            "Zone added"
        );
        id
    }

    /// Replace the bounds of the zone at `index`. A value of 0 leaves that
    /// bound unchanged, so a bound of exactly 0 cannot be set here; use
    /// [`ZoneDetector::set_bounds`] through [`Self::get_zone`] instead.
    pub fn update_zone(&mut self, index: usize, min_distance: u16, max_distance: u16) {
        let Some(zone) = self.zones.get_mut(index) else {
            return;
        };
        if min_distance != 0 {
            zone.set_min_distance(min_distance);
        }
        if max_distance != 0 {
            zone.set_max_distance(max_distance);
        }
    }

    pub fn delete_zone(&mut self, index: usize) {
        if index < self.zones.len() {
            let zone = self.zones.remove(index);
            debug!(zone = %zone.id(), index, "Zone deleted");
        }
    }

    pub fn get_zone(&mut self, index: usize) -> Option<&mut ZoneDetector> {
        self.zones.get_mut(index)
    }

    pub fn zone(&self, index: usize) -> Option<&ZoneDetector> {
        self.zones.get(index)
    }

    pub fn zones(&self) -> &[ZoneDetector] {
        &self.zones
    }

    pub fn index_of(&self, id: ZoneId) -> Option<usize> {
        self.zones.iter().position(|zone| zone.id() == id)
    }

    pub fn zone_by_id(&mut self, id: ZoneId) -> Option<&mut ZoneDetector> {
        self.zones.iter_mut().find(|zone| zone.id() == id)
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Presence of the zone at `index`, after running any pending sample.
    /// Out-of-range indices report false.
    pub fn is_object_in_zone(&mut self, index: usize) -> bool {
        self.is_object_in_zone_at(index, Instant::now())
    }

    pub fn is_object_in_zone_at(&mut self, index: usize, now: Instant) -> bool {
        self.tick_at(now);
        self.zones
            .get(index)
            .is_some_and(ZoneDetector::is_object_present)
    }

    pub fn set_certainty_factor(&mut self, certainty: usize) {
        self.certainty_factor = certainty;
    }

    pub fn certainty_factor(&self) -> usize {
        self.certainty_factor
    }

    pub fn set_distance_mode(&mut self, mode: DistanceMode) -> bool {
        match self.sensor.set_distance_mode(mode) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, mode = ?mode, "Failed to set distance mode");
                false
            }
        }
    }

    pub fn distance_mode(&mut self) -> Option<DistanceMode> {
        self.sensor
            .distance_mode()
            .inspect_err(|err| warn!(error = %err, "Failed to read distance mode"))
            .ok()
    }

    pub fn set_timing_budget(&mut self, budget_us: u32) -> bool {
        match self.sensor.set_timing_budget_us(budget_us) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, budget_us, "Failed to set timing budget");
                false
            }
        }
    }

    pub fn timing_budget(&mut self) -> Option<u32> {
        self.sensor
            .timing_budget_us()
            .inspect_err(|err| warn!(error = %err, "Failed to read timing budget"))
            .ok()
    }

    pub fn set_timeout(&mut self, timeout_ms: u16) -> bool {
        match self.sensor.set_timeout_ms(timeout_ms) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, timeout_ms, "Failed to set timeout");
                false
            }
        }
    }

    pub fn timeout(&mut self) -> Option<u16> {
        self.sensor
            .timeout_ms()
            .inspect_err(|err| warn!(error = %err, "Failed to read timeout"))
            .ok()
    }

    /// Latest measurement if one is ready, without touching the sample gate
    /// or any zone.
    pub fn distance(&mut self) -> Option<u16> {
        self.poll_distance()
    }

    /// Periodic update. Returns the distance fed to the zones, if any.
    pub fn tick(&mut self) -> Option<u16> {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Option<u16> {
        if let Some(last) = self.last_sample {
            if now.saturating_duration_since(last) < self.update_interval {
                return None;
            }
        }
        // Recorded even when no data is ready so the next attempt waits a
        // full interval.
        self.last_sample = Some(now);

        let distance_mm = self.poll_distance()?;
        let certainty = self.certainty_factor;
        for (index, zone) in self.zones.iter_mut().enumerate() {
            match zone.evaluate(distance_mm, certainty) {
                Some(ZoneTransition::Entered { distance_mm }) => {
                    debug!(zone = %zone.id(), index, distance_mm, "Object entered zone");
                }
                Some(ZoneTransition::Exited) => {
                    debug!(zone = %zone.id(), index, "Object left zone");
                }
                None => {}
            }
        }
        Some(distance_mm)
    }

    fn poll_distance(&mut self) -> Option<u16> {
        match self.sensor.data_ready() {
            Ok(true) => {}
            Ok(false) => return None,
            Err(err) => {
                warn!(error = %err, "Failed to query data ready");
                return None;
            }
        }
        match self.sensor.read_distance() {
            Ok(measurement) => {
                if !measurement.range_status.is_valid() {
                    debug!(
                        distance_mm = measurement.distance_mm,
                        range_status = ?measurement.range_status,
                        "Measurement flagged by sensor"
                    );
                }
                Some(measurement.distance_mm)
            }
            Err(err) => {
                warn!(error = %err, "Failed to read distance");
                None
            }
        }
    }
}
