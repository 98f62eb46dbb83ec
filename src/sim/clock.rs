/// In-game clock: minutes since midnight, wrapping at 1440.

pub const MINUTES_PER_DAY: f32 = 1440.0;

#[derive(Clone, Copy, Debug)]
pub struct GameClock {
    minutes: f32,
    /// In-game minutes per real second.
    speed: f32,
}

impl GameClock {
    pub fn new(start_minutes: f32, speed: f32) -> Self {
        GameClock { minutes: start_minutes.rem_euclid(MINUTES_PER_DAY), speed }
    }

    pub fn advance(&mut self, dt: f32) {
        self.minutes = (self.minutes + dt * self.speed).rem_euclid(MINUTES_PER_DAY);
    }

    pub fn set_minutes(&mut self, minutes: f32) {
        self.minutes = minutes.rem_euclid(MINUTES_PER_DAY);
    }

    pub fn minutes(&self) -> f32 {
        self.minutes
    }
}

/// `HH:MM` for a minute count. Out-of-range values are wrapped first.
pub fn format_clock(minutes: f32) -> String {
    let m = (minutes.rem_euclid(MINUTES_PER_DAY).floor() as u32).min(1439);
    format!("{:02}:{:02}", m / 60, m % 60)
}
