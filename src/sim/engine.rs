/// Fixed-timestep engine loop.
///
/// Each frame: clamp the real elapsed time, add it to an accumulator, run
/// `update` once per whole fixed step in the accumulator, then `draw`
/// exactly once. The engine never reads the clock itself; the caller
/// passes `Instant`s, so tests drive it with synthetic times.
///
/// Errors from either callback are logged and handed to `on_error`; the
/// loop keeps going.

use std::fmt::Display;
use std::time::{Duration, Instant};

use tracing::error;

const DEFAULT_TICK_HZ: u32 = 60;

pub trait Simulation {
    type Error: Display;

    fn update(&mut self, dt: f32, now_ms: u64) -> Result<(), Self::Error>;
    fn draw(&mut self, now_ms: u64) -> Result<(), Self::Error>;
    fn on_error(&mut self, error: &Self::Error);
}

/// Log `error` and hand it to the simulation's hook. Used for callback
/// failures inside `Engine::frame` and for failures outside it, such as
/// UI commands applied between frames.
pub fn report_error<S: Simulation>(sim: &mut S, stage: &str, error: &S::Error) {
    error!(error = %error, stage, "simulation error");
    sim.on_error(error);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FrameReport {
    pub ticks: u32,
    pub errors: u32,
}

pub struct Engine {
    fixed_dt: Duration,
    max_frame: Duration,
    accumulator: Duration,
    origin: Instant,
    last: Instant,
}

impl Engine {
    /// `tick_hz` fixed updates per second; a frame never feeds more than
    /// `max_frame` of real time into the accumulator.
    pub fn new(tick_hz: u32, max_frame: Duration, origin: Instant) -> Self {
        let hz = if tick_hz == 0 { DEFAULT_TICK_HZ } else { tick_hz };
        Engine {
            fixed_dt: Duration::from_nanos(1_000_000_000 / hz as u64),
            max_frame,
            accumulator: Duration::ZERO,
            origin,
            last: origin,
        }
    }

    pub fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    /// Milliseconds since the engine's origin.
    pub fn elapsed_ms(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.origin).as_millis() as u64
    }

    pub fn frame<S: Simulation>(&mut self, now: Instant, sim: &mut S) -> FrameReport {
        let elapsed = now.saturating_duration_since(self.last).min(self.max_frame);
        self.last = now;
        self.accumulator += elapsed;

        let now_ms = self.elapsed_ms(now);
        let dt = self.fixed_dt.as_secs_f32();
        let mut report = FrameReport { ticks: 0, errors: 0 };

        while self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            report.ticks += 1;
            if let Err(e) = sim.update(dt, now_ms) {
                report_error(sim, "update", &e);
                report.errors += 1;
            }
        }

        if let Err(e) = sim.draw(now_ms) {
            report_error(sim, "draw", &e);
            report.errors += 1;
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        updates: u32,
        draws: u32,
        errors: Vec<String>,
        fail_update_at: Option<u32>,
        fail_draw: bool,
        last_now_ms: u64,
    }

    impl Simulation for Counting {
        type Error = String;

        fn update(&mut self, _dt: f32, now_ms: u64) -> Result<(), String> {
            self.updates += 1;
            self.last_now_ms = now_ms;
            if self.fail_update_at == Some(self.updates) {
                return Err(format!("tick {} broke", self.updates));
            }
            Ok(())
        }

        fn draw(&mut self, now_ms: u64) -> Result<(), String> {
            self.draws += 1;
            self.last_now_ms = now_ms;
            if self.fail_draw {
                return Err("no screen".to_string());
            }
            Ok(())
        }

        fn on_error(&mut self, error: &String) {
            self.errors.push(error.clone());
        }
    }

    fn engine(t0: Instant) -> Engine {
        Engine::new(60, Duration::from_millis(50), t0)
    }

    #[test]
    fn short_frames_accumulate_into_ticks() {
        let t0 = Instant::now();
        let mut e = engine(t0);
        let mut p = Counting::default();

        let r = e.frame(t0 + Duration::from_millis(10), &mut p);
        assert_eq!(r.ticks, 0);
        assert_eq!(p.draws, 1);

        let r = e.frame(t0 + Duration::from_millis(17), &mut p);
        assert_eq!(r.ticks, 1);
        assert_eq!(p.updates, 1);
        assert_eq!(p.draws, 2);
        assert_eq!(p.last_now_ms, 17);
    }

    #[test]
    fn long_frame_is_clamped() {
        let t0 = Instant::now();
        let mut e = engine(t0);
        let mut p = Counting::default();
        let r = e.frame(t0 + Duration::from_secs(5), &mut p);
        // 50 ms of 16.67 ms steps
        assert_eq!(r.ticks, 3);
        assert_eq!(p.draws, 1);
    }

    #[test]
    fn exactly_one_draw_per_frame() {
        let t0 = Instant::now();
        let mut e = engine(t0);
        let mut p = Counting::default();
        for i in 1..=120u64 {
            e.frame(t0 + Duration::from_millis(i * 16), &mut p);
        }
        assert_eq!(p.draws, 120);
        // 1920 ms of real time at 60 Hz
        assert!((114..=116).contains(&p.updates), "{}", p.updates);
    }

    #[test]
    fn clock_going_backwards_runs_no_ticks() {
        let t0 = Instant::now();
        let mut e = engine(t0 + Duration::from_millis(100));
        let mut p = Counting::default();
        let r = e.frame(t0, &mut p);
        assert_eq!(r.ticks, 0);
        assert_eq!(p.last_now_ms, 0);
    }

    #[test]
    fn update_error_is_reported_and_loop_continues() {
        let t0 = Instant::now();
        let mut e = engine(t0);
        let mut p = Counting { fail_update_at: Some(2), ..Counting::default() };
        let r = e.frame(t0 + Duration::from_millis(50), &mut p);
        assert_eq!(r.ticks, 3);
        assert_eq!(r.errors, 1);
        assert_eq!(p.updates, 3);
        assert_eq!(p.draws, 1);
        assert_eq!(p.errors, vec!["tick 2 broke".to_string()]);
    }

    #[test]
    fn draw_error_is_reported() {
        let t0 = Instant::now();
        let mut e = engine(t0);
        let mut p = Counting { fail_draw: true, ..Counting::default() };
        let r = e.frame(t0 + Duration::from_millis(5), &mut p);
        assert_eq!(r.errors, 1);
        assert_eq!(p.errors, vec!["no screen".to_string()]);
        // next frame still runs
        e.frame(t0 + Duration::from_millis(30), &mut p);
        assert_eq!(p.draws, 2);
        assert_eq!(p.updates, 1);
    }

    #[test]
    fn errors_between_frames_reach_the_hook() {
        let t0 = Instant::now();
        let mut e = engine(t0);
        let mut p = Counting::default();
        report_error(&mut p, "command", &"bad command".to_string());
        assert_eq!(p.errors, vec!["bad command".to_string()]);
        e.frame(t0 + Duration::from_millis(20), &mut p);
        assert_eq!((p.updates, p.draws), (1, 1));
    }

    #[test]
    fn zero_tick_rate_falls_back() {
        let e = Engine::new(0, Duration::from_millis(50), Instant::now());
        assert_eq!(e.fixed_dt(), Duration::from_nanos(16_666_666));
    }
}
