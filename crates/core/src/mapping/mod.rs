//! Maps a sequence of time points to lighting events.
//!
//! Each [`GenerationPolicy`] has its own entry point so callers and tests can
//! drive one rule set directly. [`EventGenerator::generate`] composes the
//! configured policy with the atmospheric intro.

use rand::{seq::SliceRandom, Rng};

use crate::{
    config::MIN_DRAWN_DURATION, event::sort_by_time, GenerationPolicy, LightingConfig,
    LightingEvent, Result, TimePoints,
};

/// Shortens `duration` so that `time + duration` never passes `max_time`.
pub fn clamp_duration(time: f64, duration: f64, max_time: f64) -> f64 {
    if time + duration > max_time {
        max_time - time
    } else {
        duration
    }
}

/// Stateless generator configured once per run. Randomness is supplied by the
/// caller on every call.
#[derive(Debug, Clone)]
pub struct EventGenerator {
    config: LightingConfig,
}

impl EventGenerator {
    /// Validates the configuration and builds a generator around it.
    pub fn new(config: LightingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    /// Full lighting track for one file: atmospheric intro (when enabled)
    /// followed by the configured policy's events.
    ///
    /// An empty input yields no events at all, intro included.
    pub fn generate<R: Rng>(&self, points: &TimePoints, rng: &mut R) -> Vec<LightingEvent> {
        if points.is_empty() {
            return Vec::new();
        }

        let mut events = Vec::new();
        let atmosphere = &self.config.atmosphere;
        if atmosphere.enabled {
            events.extend(self.atmospheric(atmosphere.start, atmosphere.window, atmosphere.count, rng));
        }
        events.extend(self.generate_for_policy(self.config.policy, points, rng));

        if self.config.sort_output {
            sort_by_time(&mut events);
        }
        events
    }

    /// Dispatches to the entry point of a single policy.
    pub fn generate_for_policy<R: Rng>(
        &self,
        policy: GenerationPolicy,
        points: &TimePoints,
        rng: &mut R,
    ) -> Vec<LightingEvent> {
        match policy {
            GenerationPolicy::Simple => self.simple(points, rng),
            GenerationPolicy::Clamped => self.clamped(points, rng),
            GenerationPolicy::Paired => self.paired(points, rng),
            GenerationPolicy::WithDuration => self.with_duration(points, rng),
        }
    }

    /// One event per time point with a random type and colour.
    pub fn simple<R: Rng>(&self, points: &TimePoints, rng: &mut R) -> Vec<LightingEvent> {
        points
            .iter()
            .map(|time| {
                let (light_type, color) = self.pick_look(rng);
                LightingEvent::on(time, light_type, color)
            })
            .collect()
    }

    /// One event per time point. A duration in `[0.1, max]` is drawn and
    /// clamped to the last time point; it is attached only when
    /// `attach_clamped_duration` is set.
    pub fn clamped<R: Rng>(&self, points: &TimePoints, rng: &mut R) -> Vec<LightingEvent> {
        let Some(max_time) = points.max() else {
            return Vec::new();
        };

        points
            .iter()
            .map(|time| {
                let (light_type, color) = self.pick_look(rng);
                let drawn = rng.gen_range(MIN_DRAWN_DURATION..=self.config.max_effect_duration);
                let duration = clamp_duration(time, drawn, max_time);

                let event = LightingEvent::on(time, light_type, color);
                if self.config.attach_clamped_duration {
                    event.with_duration(duration)
                } else {
                    event
                }
            })
            .collect()
    }

    /// On/off pairs. A point closer than `min_effect_duration` to the last
    /// accepted point is dropped and does not become the new reference.
    pub fn paired<R: Rng>(&self, points: &TimePoints, rng: &mut R) -> Vec<LightingEvent> {
        let min = self.config.min_effect_duration;
        let max = self.config.max_effect_duration;
        let mut events = Vec::with_capacity(points.len() * 2);
        let mut previous: Option<f64> = None;

        for time in points.iter() {
            if previous.is_some_and(|prev| time - prev < min) {
                continue;
            }

            let (light_type, color) = self.pick_look(rng);
            events.push(LightingEvent::on(time, light_type, color));
            let hold = rng.gen_range(min..=max);
            events.push(LightingEvent::off(time + hold, light_type));
            previous = Some(time);
        }

        events
    }

    /// One event per time point carrying an unclamped duration in
    /// `[0.1, max]`.
    pub fn with_duration<R: Rng>(&self, points: &TimePoints, rng: &mut R) -> Vec<LightingEvent> {
        points
            .iter()
            .map(|time| {
                let (light_type, color) = self.pick_look(rng);
                let duration = rng.gen_range(MIN_DRAWN_DURATION..=self.config.max_effect_duration);
                LightingEvent::on(time, light_type, color).with_duration(duration)
            })
            .collect()
    }

    /// `count` events at uniformly random times in `[start, start + window]`,
    /// independent of any time point source.
    pub fn atmospheric<R: Rng>(
        &self,
        start: f64,
        window: f64,
        count: usize,
        rng: &mut R,
    ) -> Vec<LightingEvent> {
        (0..count)
            .map(|_| {
                let time = start + rng.gen_range(0.0..=window);
                let (light_type, color) = self.pick_look(rng);
                LightingEvent::on(time, light_type, color)
            })
            .collect()
    }

    fn pick_look<R: Rng>(&self, rng: &mut R) -> (u8, u8) {
        // Both sets are non-empty after `validate`.
        let light_type = self.config.light_types.choose(rng).copied().unwrap_or_default();
        let color = self.config.colors.choose(rng).copied().unwrap_or(1);
        (light_type, color)
    }
}
