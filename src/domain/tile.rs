/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.
///
/// Every tile has a stable numeric id (used by zone data and saves),
/// exactly one walkability class, and portals exactly one direction.

/// Side length of one tile in world pixels (16px art at scale 3).
pub const TILE_SIZE: f32 = 48.0;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Tile {
    Floor,
    Wall,        // Solid, also the out-of-bounds boundary
    Street,      // Floor variant
    Puddle,      // Shallow liquid, walkable
    NeonWall,    // Solid
    Fence,       // Solid
    Canal,       // Deep liquid, solid
    PortalNorth,
    PortalEast,
    PortalSouth,
    PortalWest,
}

/// Cardinal direction of a portal tile.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

/// Render-facing classification. The renderer maps each category to a
/// draw routine with an exhaustive match.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileCategory {
    Ground,
    Road,
    Liquid,
    DeepLiquid,
    Building,
    Neon,
    Barrier,
    Portal(Direction),
}

impl Tile {
    /// Returned by lookups outside the grid: an implicit infinite wall.
    pub const BOUNDARY: Tile = Tile::Wall;

    pub const ALL: [Tile; 11] = [
        Tile::Floor,
        Tile::Wall,
        Tile::Street,
        Tile::Puddle,
        Tile::NeonWall,
        Tile::Fence,
        Tile::Canal,
        Tile::PortalNorth,
        Tile::PortalEast,
        Tile::PortalSouth,
        Tile::PortalWest,
    ];

    pub fn id(self) -> u8 {
        match self {
            Tile::Floor => 0,
            Tile::Wall => 1,
            Tile::Street => 2,
            Tile::Puddle => 3,
            Tile::NeonWall => 4,
            Tile::Fence => 5,
            Tile::Canal => 6,
            Tile::PortalNorth => 7,
            Tile::PortalEast => 8,
            Tile::PortalSouth => 9,
            Tile::PortalWest => 10,
        }
    }

    pub fn from_id(id: u8) -> Option<Tile> {
        Tile::ALL.iter().copied().find(|t| t.id() == id)
    }

    /// Can an entity's body overlap this tile?
    /// The only question the collision resolver asks.
    pub fn is_walkable(self) -> bool {
        match self {
            Tile::Floor | Tile::Street | Tile::Puddle => true,
            Tile::PortalNorth | Tile::PortalEast | Tile::PortalSouth | Tile::PortalWest => true,
            Tile::Wall | Tile::NeonWall | Tile::Fence | Tile::Canal => false,
        }
    }

    /// Direction for portal tiles, None for everything else.
    pub fn portal_direction(self) -> Option<Direction> {
        match self {
            Tile::PortalNorth => Some(Direction::North),
            Tile::PortalEast => Some(Direction::East),
            Tile::PortalSouth => Some(Direction::South),
            Tile::PortalWest => Some(Direction::West),
            _ => None,
        }
    }

    pub fn is_portal(self) -> bool {
        self.portal_direction().is_some()
    }

    pub fn category(self) -> TileCategory {
        match self {
            Tile::Floor => TileCategory::Ground,
            Tile::Street => TileCategory::Road,
            Tile::Puddle => TileCategory::Liquid,
            Tile::Canal => TileCategory::DeepLiquid,
            Tile::Wall => TileCategory::Building,
            Tile::NeonWall => TileCategory::Neon,
            Tile::Fence => TileCategory::Barrier,
            Tile::PortalNorth => TileCategory::Portal(Direction::North),
            Tile::PortalEast => TileCategory::Portal(Direction::East),
            Tile::PortalSouth => TileCategory::Portal(Direction::South),
            Tile::PortalWest => TileCategory::Portal(Direction::West),
        }
    }

    /// Map-legend character used by zone layouts and test maps.
    pub fn from_legend(c: char) -> Option<Tile> {
        match c {
            '.' => Some(Tile::Floor),
            '#' => Some(Tile::Wall),
            '=' => Some(Tile::Street),
            '~' => Some(Tile::Puddle),
            '*' => Some(Tile::NeonWall),
            '|' => Some(Tile::Fence),
            'w' => Some(Tile::Canal),
            'N' => Some(Tile::PortalNorth),
            'E' => Some(Tile::PortalEast),
            'S' => Some(Tile::PortalSouth),
            'W' => Some(Tile::PortalWest),
            // single-digit numeric ids
            d => d.to_digit(10).and_then(|n| Tile::from_id(n as u8)),
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Floor
    }
}
