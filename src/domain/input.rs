/// Input contract consumed by the simulation.
///
/// Movement is four held booleans. Interact / inventory / pause are
/// "taps": the collector stamps the press time, the simulation consumes
/// it at most once, and a tap not consumed within its window expires.
///
/// Collectors (keyboard, gamepad) write between frames; the fixed update
/// reads. Single writer, single reader, no locking.

/// A single buffered press with an expiry window.
#[derive(Clone, Copy, Debug)]
pub struct TapBuffer {
    pressed_at: Option<u64>,
    window_ms: u64,
}

impl TapBuffer {
    pub fn new(window_ms: u64) -> Self {
        TapBuffer { pressed_at: None, window_ms }
    }

    pub fn press(&mut self, now_ms: u64) {
        self.pressed_at = Some(now_ms);
    }

    /// True at most once per press, and only within the window.
    pub fn consume(&mut self, now_ms: u64) -> bool {
        match self.pressed_at.take() {
            Some(t) => now_ms.saturating_sub(t) <= self.window_ms,
            None => false,
        }
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pressed_at.is_some()
    }
}

/// Tap window lengths in milliseconds.
#[derive(Clone, Copy, Debug)]
pub struct TapWindows {
    pub interact_ms: u64,
    pub inventory_ms: u64,
    pub pause_ms: u64,
}

impl Default for TapWindows {
    fn default() -> Self {
        TapWindows { interact_ms: 160, inventory_ms: 220, pause_ms: 220 }
    }
}

/// Movement axes as pressed this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveAxes {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl MoveAxes {
    pub fn any(&self) -> bool {
        self.left || self.right || self.up || self.down
    }
}

#[derive(Clone, Debug)]
pub struct Controls {
    pub axes: MoveAxes,
    interact: TapBuffer,
    inventory: TapBuffer,
    pause: TapBuffer,
}

impl Controls {
    pub fn new(windows: TapWindows) -> Self {
        Controls {
            axes: MoveAxes::default(),
            interact: TapBuffer::new(windows.interact_ms),
            inventory: TapBuffer::new(windows.inventory_ms),
            pause: TapBuffer::new(windows.pause_ms),
        }
    }

    pub fn press_interact(&mut self, now_ms: u64) {
        self.interact.press(now_ms);
    }

    pub fn press_inventory(&mut self, now_ms: u64) {
        self.inventory.press(now_ms);
    }

    pub fn press_pause(&mut self, now_ms: u64) {
        self.pause.press(now_ms);
    }

    pub fn consume_interact(&mut self, now_ms: u64) -> bool {
        self.interact.consume(now_ms)
    }

    pub fn consume_inventory(&mut self, now_ms: u64) -> bool {
        self.inventory.consume(now_ms)
    }

    pub fn consume_pause(&mut self, now_ms: u64) -> bool {
        self.pause.consume(now_ms)
    }
}

impl Default for Controls {
    fn default() -> Self {
        Controls::new(TapWindows::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_is_consumed_once() {
        let mut t = TapBuffer::new(160);
        t.press(1000);
        assert!(t.consume(1050));
        assert!(!t.consume(1051));
    }

    #[test]
    fn tap_expires_after_window() {
        let mut t = TapBuffer::new(160);
        t.press(1000);
        assert!(!t.consume(1161));
        // not re-offered
        assert!(!t.consume(1000));
        assert!(!t.is_pending());
    }

    #[test]
    fn tap_window_edge_is_inclusive() {
        let mut t = TapBuffer::new(160);
        t.press(1000);
        assert!(t.consume(1160));
    }

    #[test]
    fn controls_keep_taps_independent() {
        let mut c = Controls::default();
        c.press_pause(10);
        assert!(!c.consume_interact(20));
        assert!(!c.consume_inventory(20));
        assert!(c.consume_pause(20));
    }
}
