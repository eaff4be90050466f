/// Per-scene clock. Time only accumulates while running, so a paused scene
/// keeps the elapsed value it had when it was paused.
#[derive(Debug, Default, Clone)]
pub struct SceneClock {
    accumulated: f64,
    running_since: Option<f64>,
    started: bool,
}

impl SceneClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the clock on the first frame of a scene. No-op afterwards.
    pub fn start_if_idle(&mut self, now: f64, running: bool) {
        if !self.started {
            self.started = true;
            self.running_since = running.then_some(now);
        }
    }

    pub fn restart(&mut self, now: f64, running: bool) {
        self.accumulated = 0.0;
        self.started = true;
        self.running_since = running.then_some(now);
    }

    pub fn pause(&mut self, now: f64) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += (now - since).max(0.0);
        }
    }

    pub fn resume(&mut self, now: f64) {
        if self.started && self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    /// Seconds elapsed in the current scene.
    pub fn elapsed(&self, now: f64) -> f64 {
        match self.running_since {
            Some(since) => self.accumulated + (now - since).max(0.0),
            None => self.accumulated,
        }
    }
}
