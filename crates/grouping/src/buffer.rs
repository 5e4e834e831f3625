//! Accumulator for the instances of one series.

use std::fmt;
use std::time::{Duration, Instant};

use contracts::{CompletedSeries, ContractError, Instance, SeriesPayload};

/// Instances of a single series, in arrival order
///
/// The series identifier is fixed by the first instance. Instances carrying another
/// identifier are refused, never merged.
pub struct SeriesBuffer {
    series_instance_uid: String,
    instances: Vec<Instance>,
    last_update_at: Instant,
    dispatch_started: bool,
}

impl fmt::Debug for SeriesBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesBuffer")
            .field("series_instance_uid", &self.series_instance_uid)
            .field("count", &self.instances.len())
            .field("dispatch_started", &self.dispatch_started)
            .finish()
    }
}

impl SeriesBuffer {
    /// Open a buffer with its first instance
    pub fn new(first: Instance, now: Instant) -> Self {
        Self {
            series_instance_uid: first.series_instance_uid.clone(),
            instances: vec![first],
            last_update_at: now,
            dispatch_started: false,
        }
    }

    #[inline]
    pub fn series_instance_uid(&self) -> &str {
        &self.series_instance_uid
    }

    /// Whether `instance` belongs to this series
    #[inline]
    pub fn matches(&self, instance: &Instance) -> bool {
        instance.series_instance_uid == self.series_instance_uid
    }

    /// Append a matching instance and refresh the idle timer
    ///
    /// Returns `false` and leaves the buffer untouched on an identifier mismatch.
    pub fn add_instance(&mut self, instance: Instance, now: Instant) -> bool {
        if !self.matches(&instance) {
            return false;
        }
        self.instances.push(instance);
        self.last_update_at = now;
        true
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.instances.len()
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn last_update_at(&self) -> Instant {
        self.last_update_at
    }

    /// Time since the last accepted instance (zero if `now` is earlier)
    #[inline]
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_update_at)
    }

    /// Idle strictly longer than `timeout`
    #[inline]
    pub fn is_idle_complete(&self, timeout: Duration, now: Instant) -> bool {
        self.idle_for(now) > timeout
    }

    /// Set the dispatch latch
    ///
    /// Returns `false` if dispatch had already begun.
    pub fn try_begin_dispatch(&mut self) -> bool {
        if self.dispatch_started {
            return false;
        }
        self.dispatch_started = true;
        true
    }

    pub fn dispatch_started(&self) -> bool {
        self.dispatch_started
    }

    /// Summary payload: descriptive fields of the first instance plus the count
    pub fn to_payload(&self) -> Result<SeriesPayload, ContractError> {
        let first = self
            .instances
            .first()
            .ok_or_else(|| ContractError::EmptySeries {
                series_instance_uid: self.series_instance_uid.clone(),
            })?;

        Ok(SeriesPayload {
            patient_id: first.patient_id.clone(),
            patient_name: first.patient_name.clone(),
            study_instance_uid: first.study_instance_uid.clone(),
            series_instance_uid: self.series_instance_uid.clone(),
            num_instances: u32::try_from(self.instances.len()).unwrap_or(u32::MAX),
        })
    }
}

impl CompletedSeries for SeriesBuffer {
    fn series_instance_uid(&self) -> &str {
        &self.series_instance_uid
    }

    fn to_payload(&self) -> Result<SeriesPayload, ContractError> {
        SeriesBuffer::to_payload(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(uid: &str) -> Instance {
        Instance::new(uid).with_patient("123", "Doe^John")
    }

    #[test]
    fn test_same_series_instances_are_counted() {
        let t0 = Instant::now();
        let mut buffer = SeriesBuffer::new(instance("1.2.3.4"), t0);

        for i in 1..5u64 {
            assert!(buffer.add_instance(instance("1.2.3.4"), t0 + Duration::from_millis(i)));
        }

        assert_eq!(buffer.count(), 5);
        assert_eq!(buffer.to_payload().unwrap().num_instances, 5);
    }

    #[test]
    fn test_mismatch_is_refused_without_effect() {
        let t0 = Instant::now();
        let mut buffer = SeriesBuffer::new(instance("1.2.3.4"), t0);

        let later = t0 + Duration::from_millis(500);
        assert!(!buffer.add_instance(instance("9.9.9.9"), later));
        assert_eq!(buffer.count(), 1);
        assert_eq!(buffer.series_instance_uid(), "1.2.3.4");
        assert_eq!(buffer.last_update_at(), t0);
    }

    #[test]
    fn test_idle_completion_is_strict_and_monotonic() {
        let t0 = Instant::now();
        let timeout = Duration::from_secs(1);
        let buffer = SeriesBuffer::new(instance("1.2.3.4"), t0);

        assert!(!buffer.is_idle_complete(timeout, t0));
        assert!(!buffer.is_idle_complete(timeout, t0 + timeout));

        let mut seen_complete = false;
        for ms in (0..3000).step_by(50) {
            let complete = buffer.is_idle_complete(timeout, t0 + Duration::from_millis(ms));
            assert!(!(seen_complete && !complete), "completion went back at {ms} ms");
            seen_complete |= complete;
        }
        assert!(seen_complete);
    }

    #[test]
    fn test_append_resets_idle_timer() {
        let t0 = Instant::now();
        let timeout = Duration::from_secs(1);
        let mut buffer = SeriesBuffer::new(instance("1.2.3.4"), t0);

        let t1 = t0 + Duration::from_millis(900);
        buffer.add_instance(instance("1.2.3.4"), t1);

        assert!(!buffer.is_idle_complete(timeout, t0 + Duration::from_millis(1500)));
        assert!(buffer.is_idle_complete(timeout, t1 + Duration::from_millis(1001)));
    }

    #[test]
    fn test_idle_for_saturates_on_earlier_now() {
        let t0 = Instant::now() + Duration::from_secs(10);
        let buffer = SeriesBuffer::new(instance("1.2.3.4"), t0);
        assert_eq!(buffer.idle_for(t0 - Duration::from_secs(5)), Duration::ZERO);
    }

    #[test]
    fn test_payload_uses_first_instance_fields() {
        let t0 = Instant::now();
        let first = Instance::new("1.2.3.4")
            .with_patient("123", "Doe^John")
            .with_study("1.2.3");
        let mut buffer = SeriesBuffer::new(first, t0);
        buffer.add_instance(
            Instance::new("1.2.3.4").with_patient("999", "Other^Name"),
            t0,
        );

        let payload = buffer.to_payload().unwrap();
        assert_eq!(payload.patient_id.as_deref(), Some("123"));
        assert_eq!(payload.patient_name.as_deref(), Some("Doe^John"));
        assert_eq!(payload.study_instance_uid.as_deref(), Some("1.2.3"));
        assert_eq!(payload.series_instance_uid, "1.2.3.4");
        assert_eq!(payload.num_instances, 2);

        // pure projection
        assert_eq!(buffer.to_payload().unwrap(), payload);
    }

    #[test]
    fn test_dispatch_latch_sets_once() {
        let mut buffer = SeriesBuffer::new(instance("1.2.3.4"), Instant::now());

        assert!(!buffer.dispatch_started());
        assert!(buffer.try_begin_dispatch());
        assert!(!buffer.try_begin_dispatch());
        assert!(buffer.dispatch_started());
    }
}
