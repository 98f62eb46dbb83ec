pub mod clock;
pub mod dialog;
pub mod engine;
pub mod event;
pub mod game;
pub mod portal;
pub mod save;
pub mod world;
pub mod zone;
