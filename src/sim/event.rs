/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound cues and logging.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Started,
    Paused,
    Resumed,
    Restarted,
    ReturnedToMenu,
    ZoneEntered { zone: &'static str, entry: &'static str },
    DialogOpened { object: &'static str },
    DialogAdvanced,
    DialogClosed,
    MemoryAcquired { id: String },
    InventoryOpened,
    InventoryClosed,
    InventoryMoved,
    Saved,
}
