pub mod collision;
pub mod geom;
pub mod input;
pub mod interactable;
pub mod memory;
pub mod player;
pub mod tile;
