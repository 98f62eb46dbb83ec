/// Zone Transition Graph: portal tiles → destination zone + entry key.
///
/// Static star topology around the hub. Each spoke has exactly one
/// portal back, and its entry key names the hub side the player
/// left from, so returning puts them next to the portal they took.

use crate::domain::tile::Direction;

use super::world::ActiveWorld;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Transition {
    pub zone: &'static str,
    pub entry: &'static str,
}

/// Destination for `(zone, direction)`, if that portal is wired.
pub fn route(zone: &str, dir: Direction) -> Option<Transition> {
    let (to, entry) = match (zone, dir) {
        ("alley", Direction::North) => ("rooftops", "from_hub"),
        ("alley", Direction::East) => ("arcade", "from_hub"),
        ("alley", Direction::South) => ("underpass", "from_hub"),
        ("alley", Direction::West) => ("canal", "from_hub"),
        ("rooftops", Direction::South) => ("alley", "from_north"),
        ("arcade", Direction::West) => ("alley", "from_east"),
        ("underpass", Direction::North) => ("alley", "from_south"),
        ("canal", Direction::East) => ("alley", "from_west"),
        _ => return None,
    };
    Some(Transition { zone: to, entry })
}

/// Transition triggered by standing on tile `(tx, ty)` of the active zone.
pub fn check_transition(world: &ActiveWorld, tx: i32, ty: i32) -> Option<Transition> {
    let dir = world.zone.tile_at(tx, ty).portal_direction()?;
    route(world.name(), dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::WorldStore;

    #[test]
    fn non_portal_tiles_do_nothing() {
        let w = WorldStore::standard().unwrap();
        assert_eq!(check_transition(w.active(), 3, 16), None);
        assert_eq!(check_transition(w.active(), -5, -5), None);
    }

    #[test]
    fn hub_portals_lead_to_spokes() {
        let w = WorldStore::standard().unwrap();
        let a = w.active();
        assert_eq!(check_transition(a, 30, 0), Some(Transition { zone: "rooftops", entry: "from_hub" }));
        assert_eq!(check_transition(a, 47, 5), Some(Transition { zone: "arcade", entry: "from_hub" }));
        assert_eq!(check_transition(a, 24, 27), Some(Transition { zone: "underpass", entry: "from_hub" }));
        assert_eq!(check_transition(a, 0, 5), Some(Transition { zone: "canal", entry: "from_hub" }));
    }

    #[test]
    fn transitions_are_deterministic() {
        let w = WorldStore::standard().unwrap();
        let first = check_transition(w.active(), 30, 0);
        for _ in 0..10 {
            assert_eq!(check_transition(w.active(), 30, 0), first);
        }
    }

    #[test]
    fn every_portal_is_wired_and_lands_on_a_known_entry() {
        let mut w = WorldStore::standard().unwrap();
        for name in ["alley", "rooftops", "arcade", "underpass", "canal"] {
            let active = w.set_active_zone(name, "from_hub").unwrap();
            let z = active.zone.clone();
            for ty in 0..z.height {
                for tx in 0..z.width {
                    if !z.tile_at(tx, ty).is_portal() {
                        continue;
                    }
                    let t = check_transition(&active, tx, ty)
                        .unwrap_or_else(|| panic!("unwired portal {name} ({tx},{ty})"));
                    let dest = w.zone(t.zone).unwrap();
                    assert!(dest.spawn(t.entry).is_some(), "{} has no {}", t.zone, t.entry);
                }
            }
        }
    }

    #[test]
    fn unwired_direction_is_none() {
        assert_eq!(route("rooftops", Direction::North), None);
        assert_eq!(route("nowhere", Direction::South), None);
    }
}
