/// Zones: static tile grids with spawn tables, interactables and props.
///
/// Every zone is built once at startup by `catalog()` and never changes.
/// Layout rows use the legend of `Tile::from_legend`; the hub keeps
/// numeric ids, the spokes use glyphs.
///
/// ## Decorations
///
/// Props are scattered over plain `Floor` tiles by a per-zone seeded LCG,
/// skipping spawns and interactables, so the same seed always produces
/// the same layout. They never take part in collision.

use std::collections::HashMap;

use crate::domain::interactable::Interactable;
use crate::domain::memory::Memory;
use crate::domain::tile::Tile;

use super::world::WorldError;

/// Name of the hub zone every spoke connects back to.
pub const HUB: &str = "alley";

/// Entry key used for boot and restart.
pub const START_ENTRY: &str = "start";

/// One prop per this many tiles of zone area.
const DECOR_DENSITY: i32 = 48;
const DECOR_ATTEMPTS_PER_PROP: usize = 8;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DecorKind {
    Lamp,
    Litter,
    Crate,
    Sign,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Decoration {
    pub kind: DecorKind,
    pub tx: i32,
    pub ty: i32,
}

#[derive(Debug)]
pub struct Zone {
    pub name: &'static str,
    /// Display label for the HUD.
    pub label: &'static str,
    pub width: i32,
    pub height: i32,
    tiles: Vec<Tile>,
    spawns: HashMap<&'static str, (i32, i32)>,
    pub interactables: Vec<Interactable>,
    pub decorations: Vec<Decoration>,
}

impl Zone {
    /// Parse a layout into a zone. Ragged rows, unknown glyphs and spawns
    /// outside the grid are data errors.
    pub fn build(
        name: &'static str,
        label: &'static str,
        rows: &[&str],
        spawns: &[(&'static str, i32, i32)],
        interactables: Vec<Interactable>,
        decor_seed: u32,
    ) -> Result<Zone, WorldError> {
        let height = rows.len() as i32;
        let width = rows.first().map_or(0, |r| r.chars().count()) as i32;
        if width == 0 || height == 0 {
            return Err(WorldError::EmptyZone { zone: name.to_string() });
        }

        let mut tiles = Vec::with_capacity((width * height) as usize);
        for (y, row) in rows.iter().enumerate() {
            let len = row.chars().count() as i32;
            if len != width {
                return Err(WorldError::RaggedRow {
                    zone: name.to_string(),
                    row: y,
                    len: len as usize,
                    expected: width as usize,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let tile = Tile::from_legend(glyph).ok_or_else(|| WorldError::BadGlyph {
                    zone: name.to_string(),
                    glyph,
                    x,
                    y,
                })?;
                tiles.push(tile);
            }
        }

        let mut table = HashMap::new();
        for &(key, tx, ty) in spawns {
            if tx < 0 || ty < 0 || tx >= width || ty >= height {
                return Err(WorldError::SpawnOutOfBounds { zone: name.to_string(), entry: key.to_string() });
            }
            table.insert(key, (tx, ty));
        }

        let mut zone = Zone {
            name,
            label,
            width,
            height,
            tiles,
            spawns: table,
            interactables,
            decorations: Vec::new(),
        };
        zone.decorations = zone.scatter_decorations(decor_seed);
        Ok(zone)
    }

    /// Tile at grid coordinates, `Tile::BOUNDARY` outside.
    pub fn tile_at(&self, tx: i32, ty: i32) -> Tile {
        if tx < 0 || ty < 0 || tx >= self.width || ty >= self.height {
            return Tile::BOUNDARY;
        }
        self.tiles[(ty * self.width + tx) as usize]
    }

    pub fn spawn(&self, entry: &str) -> Option<(i32, i32)> {
        self.spawns.get(entry).copied()
    }

    #[cfg(test)]
    pub fn spawn_keys(&self) -> impl Iterator<Item = &&'static str> {
        self.spawns.keys()
    }

    /// Standable tile nearest the grid center: walkable, not a portal, and
    /// with an open tile above for the top of the body. Grid center when
    /// the zone has none.
    pub fn open_center(&self) -> (i32, i32) {
        let (cx, cy) = (self.width / 2, self.height / 2);
        let standable = |tx: i32, ty: i32| {
            let t = self.tile_at(tx, ty);
            t.is_walkable() && !t.is_portal() && self.tile_at(tx, ty - 1).is_walkable()
        };
        (0..self.height)
            .flat_map(|ty| (0..self.width).map(move |tx| (tx, ty)))
            .filter(|&(tx, ty)| standable(tx, ty))
            .min_by_key(|&(tx, ty)| (tx - cx).abs() + (ty - cy).abs())
            .unwrap_or((cx, cy))
    }

    /// First interactable within Manhattan distance 1, in list order.
    pub fn interactable_near(&self, tx: i32, ty: i32) -> Option<&Interactable> {
        self.interactables.iter().find(|o| o.is_near(tx, ty))
    }

    pub fn memories(&self) -> impl Iterator<Item = &Memory> {
        self.interactables.iter().filter_map(|o| o.memory.as_ref())
    }

    fn scatter_decorations(&self, seed: u32) -> Vec<Decoration> {
        let want = ((self.width * self.height) / DECOR_DENSITY) as usize;
        let mut rng = Lcg(seed);
        let mut out: Vec<Decoration> = Vec::with_capacity(want);

        for _ in 0..want * DECOR_ATTEMPTS_PER_PROP {
            if out.len() >= want {
                break;
            }
            let tx = (rng.next() % self.width as u32) as i32;
            let ty = (rng.next() % self.height as u32) as i32;
            let kind = match rng.next() % 4 {
                0 => DecorKind::Lamp,
                1 => DecorKind::Litter,
                2 => DecorKind::Crate,
                _ => DecorKind::Sign,
            };
            if self.tile_at(tx, ty) != Tile::Floor
                || self.spawns.values().any(|&s| s == (tx, ty))
                || self.interactables.iter().any(|o| o.tx == tx && o.ty == ty)
                || out.iter().any(|d| d.tx == tx && d.ty == ty)
            {
                continue;
            }
            out.push(Decoration { kind, tx, ty });
        }
        out
    }
}

/// Numerical Recipes LCG. Only the high bits are used.
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0 >> 8
    }
}

// ═══════════════════════════════════════════════════════════════
// Catalog
// ═══════════════════════════════════════════════════════════════

fn object(
    id: &'static str,
    name: &'static str,
    at: (i32, i32),
    pages: &[&'static str],
    repeat: &[&'static str],
    memory: (&str, &str, &str),
) -> Interactable {
    Interactable {
        id,
        name,
        tx: at.0,
        ty: at.1,
        pages: pages.to_vec(),
        repeat: (!repeat.is_empty()).then(|| repeat.to_vec()),
        memory: Some(Memory::new(memory.0, memory.1, memory.2)),
    }
}

/// Every zone of the world, hub first.
pub fn catalog() -> Result<Vec<Zone>, WorldError> {
    Ok(vec![alley()?, rooftops()?, arcade()?, underpass()?, canal()?])
}

const ALLEY_ROWS: [&str; 28] = [
    "111111111111111111111111111111N11111111111111111",
    "100000110000000000111111100000000000001110000001",
    "100000110000000000111111100000000000001110000001",
    "144100110000000000111111100000022200001110000001",
    "W0000055000000000044444440000022222000555000000E",
    "W0000000000000000000000000000022222000000000000E",
    "100000000000000000000000000000222220000000000001",
    "111410000000000000000000000000022200000000001111",
    "111110000222222222222222222222222222222000001111",
    "100000000222222222222222222222222222222000000001",
    "100000000220000000000000000000000000222000000001",
    "100000000220000000000000000000000000222000000001",
    "111110000220000000000000000000000000222000444441",
    "111110000220000111111100001111111000222000000001",
    "144410000220000111111100001111111000222000000001",
    "100000000220000111000000000000111000222000000001",
    "100000000220000111000000000000111000222000000001",
    "100000000220000555000000000000555000222000000001",
    "111111555220000000000033330000000000222000000001",
    "100000000220000000000033330000000000222222222001",
    "100000000222222000000033330000000000000000000001",
    "100000000000002000000000000000000000000000000001",
    "100000000000002000000000000000000000000000000001",
    "144111110000002222222222222222222200000011444441",
    "111111110000000000000000000000000000000011111111",
    "100000000000000000000000000000000000000000000001",
    "100000000000000000000000000000000000000000000001",
    "111111111111111111111111S11111111111111111111111",
];

fn alley() -> Result<Zone, WorldError> {
    let objects = vec![
        object(
            "streetlight", "streetlight", (10, 8),
            &[
                "the streetlight hums.\nits neon is tired, but it keeps trying.",
                "you notice a tiny sticker:\n\"stay soft. stay sharp.\"",
            ],
            &["it flickers.\nit knows you're here."],
            ("m_sticker", "sticker", "stay soft. stay sharp."),
        ),
        object(
            "puddle", "puddle", (24, 20),
            &["a puddle holds the city upside down.\nfor a second, everything looks simpler."],
            &["a ripple.\nmaybe it was your breath."],
            ("m_reflection", "reflection", "the city upside down."),
        ),
        object(
            "neon_sign", "neon sign", (20, 4),
            &["the sign reads: \"OPEN\".\nbut the door behind it is gone."],
            &["OPEN.\nOPEN.\nOPEN."],
            ("m_open", "open", "an OPEN sign for a ghost shop."),
        ),
        object(
            "payphone", "payphone", (34, 12),
            &["a payphone with no receiver.\njust a dangling wire."],
            &["silence."],
            ("m_call", "wire", "a disconnected line."),
        ),
        object(
            "vending", "vending machine", (4, 4),
            &["it sells 'silence' for $0.00."],
            &["sold out."],
            ("m_silence", "silence", "you bought silence."),
        ),
        object(
            "bench", "bench", (22, 23),
            &["a bench under no tree.\nwarm from a ghost."],
            &["empty."],
            ("m_ghost", "warmth", "someone was just here."),
        ),
        object(
            "graffiti", "graffiti", (42, 12),
            &["scrawled in white:\n\"where the light forgets\""],
            &["the paint looks wet."],
            ("m_graffiti", "graffiti", "where the light forgets."),
        ),
        object(
            "dumpster", "dumpster", (7, 14),
            &["locked tight."],
            &["won't budge."],
            ("m_locked", "locked", "secrets kept."),
        ),
    ];
    Zone::build(
        HUB,
        "the alley",
        &ALLEY_ROWS,
        &[
            (START_ENTRY, 3, 16),
            ("from_north", 30, 1),
            ("from_east", 46, 5),
            ("from_south", 24, 26),
            ("from_west", 1, 5),
        ],
        objects,
        0x00C0_FFEE,
    )
}

const ROOFTOPS_ROWS: [&str; 14] = [
    "########################",
    "#......*****......#....#",
    "#......................#",
    "#..||.........~~.......#",
    "#..||.........~~....*..#",
    "#......................#",
    "#####....######.....####",
    "#...........#..........#",
    "#...........#....||....#",
    "#......~....#..........#",
    "#......................#",
    "#..*...................#",
    "#......................#",
    "###########S############",
];

fn rooftops() -> Result<Zone, WorldError> {
    let objects = vec![
        object(
            "water_tower", "water tower", (5, 2),
            &["a water tower, empty for years.\nit still echoes when the wind hits it."],
            &["hollow."],
            ("m_echo", "echo", "the wind remembers the tank."),
        ),
        object(
            "antenna", "antenna", (20, 9),
            &[
                "a bent antenna pointed at nothing.",
                "it still picks up a station\nno one broadcasts.",
            ],
            &["crackle."],
            ("m_static", "static", "a station no one broadcasts."),
        ),
    ];
    Zone::build("rooftops", "the rooftops", &ROOFTOPS_ROWS, &[(START_ENTRY, 11, 12), ("from_hub", 11, 12)], objects, 0x0000_5EED)
}

const ARCADE_ROWS: [&str; 14] = [
    "########################",
    "#..****....****....****#",
    "#......................#",
    "#..#..#..#..#..#..#....#",
    "#......................#",
    "W......................#",
    "W......================#",
    "#......................#",
    "#..#..#..#..#..#..#....#",
    "#......................#",
    "#....~~................#",
    "#......................#",
    "#..*****.......*****...#",
    "########################",
];

fn arcade() -> Result<Zone, WorldError> {
    let objects = vec![
        object(
            "cabinet", "arcade cabinet", (9, 2),
            &["a cabinet stuck on the attract screen.\nthe high score belongs to ---."],
            &["INSERT COIN."],
            ("m_highscore", "high score", "a name no one remembers."),
        ),
        object(
            "claw", "claw machine", (19, 10),
            &["the claw holds a plush capybara.\nit never lets go.", "it never drops it either."],
            &["the claw twitches."],
            ("m_plush", "plush", "held, never dropped."),
        ),
    ];
    Zone::build("arcade", "the arcade", &ARCADE_ROWS, &[(START_ENTRY, 1, 6), ("from_hub", 1, 6)], objects, 0x0A2C_ADE0)
}

const UNDERPASS_ROWS: [&str; 14] = [
    "############N###########",
    "#...........=..........#",
    "#...........=..........#",
    "#..|||||....=....|||||.#",
    "#...........=..........#",
    "#~~.........=.........~#",
    "#~~~........=........~~#",
    "#======================#",
    "#......................#",
    "#..**....**....**....*.#",
    "#......................#",
    "#...~~~........~~~.....#",
    "#......................#",
    "########################",
];

fn underpass() -> Result<Zone, WorldError> {
    let objects = vec![
        object(
            "mural", "mural", (6, 2),
            &["a mural of a sunrise, half painted over.\nsomeone stopped at dawn."],
            &["the paint is still drying."],
            ("m_sunrise", "sunrise", "a dawn left unfinished."),
        ),
        object(
            "guitar_case", "guitar case", (18, 10),
            &["an open guitar case.\ntwo coins and a setlist with one song."],
            &["nothing new inside."],
            ("m_setlist", "setlist", "one song, played forever."),
        ),
    ];
    Zone::build("underpass", "the underpass", &UNDERPASS_ROWS, &[(START_ENTRY, 12, 1), ("from_hub", 12, 1)], objects, 0x0D0D_FACE)
}

const CANAL_ROWS: [&str; 14] = [
    "########################",
    "#......................#",
    "#..wwwwwwwwwwwwwwwww...#",
    "#..wwwwwwwwwwwwwwwww...#",
    "#......................#",
    "#......................E",
    "#......................E",
    "#==================....#",
    "#......................#",
    "#..wwwwwwww....wwwww...#",
    "#..wwwwwwww....wwwww...#",
    "#......................#",
    "#......................#",
    "########################",
];

fn canal() -> Result<Zone, WorldError> {
    let objects = vec![
        object(
            "rowboat", "rowboat", (21, 4),
            &["a rowboat tied to nothing.\nit drifts only when you look away."],
            &["still here. probably."],
            ("m_drift", "drift", "it moves when you look away."),
        ),
        object(
            "lantern", "paper lantern", (16, 11),
            &["a paper lantern floats above the water line.\nits candle never shortens."],
            &["it glows a little brighter."],
            ("m_lantern", "lantern", "a candle that never shortens."),
        ),
    ];
    Zone::build("canal", "the canal", &CANAL_ROWS, &[(START_ENTRY, 22, 6), ("from_hub", 22, 6)], objects, 0x00CA_4A15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_builds_hub_first() {
        let zones = catalog().unwrap();
        assert_eq!(zones[0].name, HUB);
        assert_eq!((zones[0].width, zones[0].height), (48, 28));
        assert_eq!(zones.len(), 5);
    }

    #[test]
    fn out_of_bounds_is_boundary() {
        let z = alley().unwrap();
        for (x, y) in [(-1, 0), (0, -1), (48, 5), (5, 28), (i32::MIN, i32::MAX)] {
            assert_eq!(z.tile_at(x, y), Tile::BOUNDARY);
        }
        assert_eq!(z.tile_at(1, 1), Tile::Floor);
        assert_eq!(z.tile_at(30, 0), Tile::PortalNorth);
    }

    #[test]
    fn memory_ids_are_unique_across_world() {
        let zones = catalog().unwrap();
        let mut seen = HashSet::new();
        for z in &zones {
            for m in z.memories() {
                assert!(seen.insert(m.id.clone()), "duplicate memory {}", m.id);
            }
        }
        assert_eq!(seen.len(), 16);
    }

    #[test]
    fn spawns_stand_on_walkable_non_portal_tiles() {
        for z in catalog().unwrap() {
            for key in z.spawn_keys() {
                let (tx, ty) = z.spawn(key).unwrap();
                let t = z.tile_at(tx, ty);
                assert!(t.is_walkable() && !t.is_portal(), "{}:{key}", z.name);
                // the body reaches into the row above
                assert!(z.tile_at(tx, ty - 1).is_walkable(), "{}:{key}", z.name);
            }
        }
    }

    #[test]
    fn decorations_are_deterministic_and_on_floor() {
        let a = alley().unwrap();
        let b = alley().unwrap();
        assert_eq!(a.decorations, b.decorations);
        assert!(!a.decorations.is_empty());
        for d in &a.decorations {
            assert_eq!(a.tile_at(d.tx, d.ty), Tile::Floor);
            assert!(a.spawns.values().all(|&s| s != (d.tx, d.ty)));
        }
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Zone::build("bad", "bad", &["###", "##"], &[], vec![], 1).unwrap_err();
        assert!(matches!(err, WorldError::RaggedRow { row: 1, .. }));
    }

    #[test]
    fn unknown_glyph_is_rejected() {
        let err = Zone::build("bad", "bad", &["#?#"], &[], vec![], 1).unwrap_err();
        assert!(matches!(err, WorldError::BadGlyph { glyph: '?', x: 1, y: 0, .. }));
    }

    #[test]
    fn near_lookup_prefers_list_order() {
        let z = alley().unwrap();
        assert_eq!(z.interactable_near(10, 9).map(|o| o.id), Some("streetlight"));
        assert!(z.interactable_near(40, 25).is_none());
    }
}
