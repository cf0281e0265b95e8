use std::time::{Duration, Instant};

/// Wall-time source for the render loop.
///
/// `tick` is called once per frame and returns the delta since the previous
/// call. Tests drive the clock with [`Clock::advance`] instead.
#[derive(Clone, Debug)]
pub struct Clock {
    start: Instant,
    last_frame: Instant,
    elapsed: f32,
    delta: f32,
}

impl Default for Clock {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed: 0.0,
            delta: 0.0,
        }
    }
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample wall time and return seconds since the previous tick.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        self.delta = now.duration_since(self.last_frame).as_secs_f32();
        self.elapsed = now.duration_since(self.start).as_secs_f32();
        self.last_frame = now;
        self.delta
    }

    /// Advance by a fixed step without touching wall time.
    pub fn advance(&mut self, step: Duration) -> f32 {
        self.delta = step.as_secs_f32();
        self.elapsed += self.delta;
        self.last_frame += step;
        self.delta
    }

    /// Seconds since the clock was created.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seconds covered by the most recent tick.
    pub fn delta(&self) -> f32 {
        self.delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates_elapsed() {
        let mut clock = Clock::new();
        clock.advance(Duration::from_millis(250));
        let dt = clock.advance(Duration::from_millis(500));

        assert_eq!(dt, 0.5);
        assert_eq!(clock.delta(), 0.5);
        assert_eq!(clock.elapsed(), 0.75);
    }
}
