//! Rooms, tiles and the table that generates them from text descriptions.
//!
//! A description starts with `width height`, followed by `height` rows of
//! `width` whitespace separated tile codes. An optional `rooms` section lists
//! `left: Name` style neighbour declarations until the next blank line.
//! Neighbours are generated recursively the first time they are referenced.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::PathBuf,
};

use glam::IVec2;
use prophecy_core::{MajorIssue, Rect, RoomKey, RoomView, Side, TileKind, TileSnapshot};
use thiserror::Error;
use tracing::{debug, warn};

const ROOM_EXTENSIONS: [&str; 2] = ["yml", "txt"];

/// Supplies raw room descriptions by name.
pub trait RoomSource {
    /// Returns the description of the named room, if one exists.
    fn room_description(&self, name: &str) -> Option<String>;
}

/// Room descriptions held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryRooms {
    rooms: BTreeMap<RoomKey, String>,
}

impl MemoryRooms {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a description under `name`.
    #[must_use]
    pub fn with_room(mut self, name: &str, description: impl Into<String>) -> Self {
        let _ = self.rooms.insert(RoomKey::new(name), description.into());
        self
    }
}

impl RoomSource for MemoryRooms {
    fn room_description(&self, name: &str) -> Option<String> {
        self.rooms.get(&RoomKey::new(name)).cloned()
    }
}

/// Room descriptions stored as `<root>/<name>.yml` or `<root>/<name>.txt`.
///
/// File names are matched without regard to case because neighbour
/// declarations are case-insensitive.
#[derive(Clone, Debug)]
pub struct DirectoryRooms {
    root: PathBuf,
}

impl DirectoryRooms {
    /// Reads descriptions from `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn locate(&self, name: &str) -> Option<PathBuf> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(root = %self.root.display(), %error, "room directory unreadable");
                return None;
            }
        };
        let mut candidates: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                let stem_matches = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(|stem| stem.eq_ignore_ascii_case(name.trim()));
                let extension_matches = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        ROOM_EXTENSIONS
                            .iter()
                            .any(|known| known.eq_ignore_ascii_case(ext))
                    });
                stem_matches && extension_matches
            })
            .collect();
        candidates.sort();
        candidates.into_iter().next()
    }
}

impl RoomSource for DirectoryRooms {
    fn room_description(&self, name: &str) -> Option<String> {
        let path = self.locate(name)?;
        match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(error) => {
                warn!(path = %path.display(), %error, "room description unreadable");
                None
            }
        }
    }
}

/// Syntax errors found while parsing a room description.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RoomConfigError {
    /// The first line is not `width height`.
    #[error("wrong syntax at line {line}: expected `width height`")]
    Dimensions {
        /// One-based line number.
        line: usize,
    },
    /// The description ended before every tile row was read.
    #[error("not enough rows: expected {expected}, description ended at line {line}")]
    MissingRow {
        /// One-based line number where a row was expected.
        line: usize,
        /// Number of rows declared on the first line.
        expected: u32,
    },
    /// A tile row holds fewer codes than the declared width.
    #[error("missing tiles (columns) at line {line}: expected {expected}, found {found}")]
    MissingColumns {
        /// One-based line number of the short row.
        line: usize,
        /// Declared width.
        expected: u32,
        /// Number of codes present.
        found: usize,
    },
}

/// Parsed but not yet placed room description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomLayout {
    /// Width in tiles.
    pub columns: u32,
    /// Height in tiles.
    pub rows: u32,
    /// Tile codes, row by row.
    pub codes: Vec<Vec<char>>,
    /// Declared neighbour names.
    pub neighbours: BTreeMap<Side, String>,
}

/// Parses a room description.
pub fn parse_room_description(text: &str) -> Result<RoomLayout, RoomConfigError> {
    let mut lines = text.lines().enumerate().map(|(index, line)| (index + 1, line));

    let (columns, rows) = match lines.next() {
        Some((line, header)) => parse_dimensions(header).ok_or(RoomConfigError::Dimensions { line })?,
        None => return Err(RoomConfigError::Dimensions { line: 1 }),
    };

    let mut codes = Vec::with_capacity(rows as usize);
    for row in 0..rows {
        let Some((line, content)) = lines.next() else {
            return Err(RoomConfigError::MissingRow {
                line: row as usize + 2,
                expected: rows,
            });
        };
        let tokens: Vec<char> = content
            .split_whitespace()
            .filter_map(|token| token.chars().next())
            .collect();
        if tokens.len() < columns as usize {
            return Err(RoomConfigError::MissingColumns {
                line,
                expected: columns,
                found: tokens.len(),
            });
        }
        codes.push(tokens.into_iter().take(columns as usize).collect());
    }

    let mut neighbours = BTreeMap::new();
    while let Some((_, content)) = lines.next() {
        if !content.trim().to_ascii_lowercase().starts_with("rooms") {
            continue;
        }
        for (line, declaration) in lines.by_ref() {
            if declaration.trim().is_empty() {
                break;
            }
            match parse_neighbour(declaration) {
                Some((side, name)) => {
                    let _ = neighbours.insert(side, name);
                }
                None => warn!(line, declaration, "ignoring malformed neighbour declaration"),
            }
        }
    }

    Ok(RoomLayout {
        columns,
        rows,
        codes,
        neighbours,
    })
}

fn parse_dimensions(header: &str) -> Option<(u32, u32)> {
    let mut parts = header.split_whitespace();
    let columns = parts.next()?.parse().ok()?;
    let rows = parts.next()?.parse().ok()?;
    Some((columns, rows))
}

fn parse_neighbour(declaration: &str) -> Option<(Side, String)> {
    let (side, name) = declaration.split_once(':')?;
    let side = match side.trim().to_ascii_lowercase().as_str() {
        "left" => Side::Left,
        "right" => Side::Right,
        "top" => Side::Top,
        "bottom" => Side::Bottom,
        _ => return None,
    };
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((side, name.to_owned()))
}

/// Fixed-size cell within a room.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    coord: IVec2,
    kind: TileKind,
    bounds: Rect,
    spawns_enemy: bool,
    leads_to: Option<RoomKey>,
}

impl Tile {
    fn from_code(code: char, coord: IVec2, bounds: Rect) -> Self {
        let kind = match code {
            'X' => TileKind::Wall,
            'L' => TileKind::Door(Side::Left),
            'R' => TileKind::Door(Side::Right),
            'T' => TileKind::Door(Side::Top),
            'B' => TileKind::Door(Side::Bottom),
            _ => TileKind::Floor,
        };
        Self {
            coord,
            kind,
            bounds,
            spawns_enemy: code == 'E',
            leads_to: None,
        }
    }

    /// Column and row inside the room.
    #[must_use]
    pub const fn coord(&self) -> IVec2 {
        self.coord
    }

    /// Terrain category.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Area covered in world space.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Whether entities may stand on the tile.
    #[must_use]
    pub const fn passable(&self) -> bool {
        !matches!(self.kind, TileKind::Wall)
    }

    /// Whether an enemy is spawned on the tile when the room is populated.
    #[must_use]
    pub const fn spawns_enemy(&self) -> bool {
        self.spawns_enemy
    }

    /// Room reached through the tile, for connected doors.
    #[must_use]
    pub fn leads_to(&self) -> Option<&RoomKey> {
        self.leads_to.as_ref()
    }
}

/// Rectangular region of the world.
#[derive(Clone, Debug)]
pub struct Room {
    name: String,
    key: RoomKey,
    dimensions: (u32, u32),
    bounds: Rect,
    tiles: HashMap<IVec2, Tile>,
    neighbours: BTreeMap<Side, RoomKey>,
}

impl Room {
    fn from_layout(name: &str, layout: &RoomLayout, tile_size: i32, viewport: IVec2) -> Self {
        let width = layout.columns as i32 * tile_size;
        let height = layout.rows as i32 * tile_size;
        let bounds = Rect::new(
            (viewport.x - width) / 2,
            (viewport.y - height) / 2,
            width,
            height,
        );

        let mut tiles = HashMap::with_capacity((layout.columns * layout.rows) as usize);
        for (y, row) in layout.codes.iter().enumerate() {
            for (x, code) in row.iter().enumerate() {
                let coord = IVec2::new(x as i32, y as i32);
                let area = Rect::from_location(
                    bounds.location() + coord * tile_size,
                    tile_size,
                    tile_size,
                );
                let _ = tiles.insert(coord, Tile::from_code(*code, coord, area));
            }
        }

        Self {
            name: name.trim().to_owned(),
            key: RoomKey::new(name),
            dimensions: (layout.columns, layout.rows),
            bounds,
            tiles,
            neighbours: BTreeMap::new(),
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lookup key.
    #[must_use]
    pub fn key(&self) -> &RoomKey {
        &self.key
    }

    /// Width and height in tiles.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    /// Authoritative bound for every entity registered to the room.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Tile at `coord`.
    #[must_use]
    pub fn tile(&self, coord: IVec2) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    /// Number of tiles.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Tiles ordered row by row.
    #[must_use]
    pub fn tiles(&self) -> Vec<&Tile> {
        let mut tiles: Vec<&Tile> = self.tiles.values().collect();
        tiles.sort_by_key(|tile| (tile.coord.y, tile.coord.x));
        tiles
    }

    /// Neighbour on `side`.
    #[must_use]
    pub fn neighbour(&self, side: Side) -> Option<&RoomKey> {
        self.neighbours.get(&side)
    }

    /// Top-left corners of every enemy spawn marker, row by row.
    #[must_use]
    pub fn spawn_points(&self) -> Vec<IVec2> {
        self.tiles()
            .into_iter()
            .filter(|tile| tile.spawns_enemy)
            .map(|tile| tile.bounds.location())
            .collect()
    }

    /// Connected doors as `(side, tile)` pairs, row by row.
    #[must_use]
    pub fn connected_doors(&self) -> Vec<(Side, &Tile)> {
        self.tiles()
            .into_iter()
            .filter_map(|tile| match tile.kind {
                TileKind::Door(side) if tile.leads_to.is_some() => Some((side, tile)),
                _ => None,
            })
            .collect()
    }

    /// First door on `side`, connected or not.
    #[must_use]
    pub fn door(&self, side: Side) -> Option<&Tile> {
        self.tiles()
            .into_iter()
            .find(|tile| tile.kind == TileKind::Door(side))
    }

    pub(crate) fn view(&self) -> RoomView {
        RoomView {
            name: self.name.clone(),
            key: self.key.clone(),
            bounds: self.bounds,
            dimensions: self.dimensions,
            tiles: self
                .tiles()
                .into_iter()
                .map(|tile| TileSnapshot {
                    coord: tile.coord,
                    kind: tile.kind,
                    bounds: tile.bounds,
                    passable: tile.passable(),
                    leads_to: tile.leads_to.clone(),
                })
                .collect(),
        }
    }

    fn link(&mut self, side: Side, neighbour: RoomKey) {
        for tile in self.tiles.values_mut() {
            if tile.kind == TileKind::Door(side) {
                tile.leads_to = Some(neighbour.clone());
            }
        }
        let _ = self.neighbours.insert(side, neighbour);
    }
}

/// Every generated room, keyed by case-insensitive name.
#[derive(Clone, Debug)]
pub struct RoomTable {
    rooms: BTreeMap<RoomKey, Room>,
    tile_size: i32,
    viewport: IVec2,
}

impl RoomTable {
    /// Creates an empty table placing rooms in the middle of `viewport`.
    #[must_use]
    pub fn new(tile_size: i32, viewport: IVec2) -> Self {
        Self {
            rooms: BTreeMap::new(),
            tile_size,
            viewport,
        }
    }

    /// Generates the named room and, recursively, its declared neighbours.
    ///
    /// Returns `Ok(false)` when the description is missing or malformed; the
    /// defect is logged and no room is added. Generating a room twice is a
    /// [`MajorIssue`].
    pub fn generate(&mut self, name: &str, source: &dyn RoomSource) -> Result<bool, MajorIssue> {
        let key = RoomKey::new(name);
        if self.rooms.contains_key(&key) {
            return Err(MajorIssue::DuplicateRoom {
                room: name.to_owned(),
            });
        }

        let Some(description) = source.room_description(name) else {
            warn!(room = name, "room description not found");
            return Ok(false);
        };
        let layout = match parse_room_description(&description) {
            Ok(layout) => layout,
            Err(error) => {
                warn!(room = name, %error, "room description rejected");
                return Ok(false);
            }
        };

        let room = Room::from_layout(name, &layout, self.tile_size, self.viewport);
        debug!(room = name, columns = layout.columns, rows = layout.rows, "room generated");
        let _ = self.rooms.insert(key.clone(), room);

        for (side, neighbour) in &layout.neighbours {
            let Some(target) = self.connect(neighbour, source)? else {
                continue;
            };
            if let Some(room) = self.rooms.get_mut(&key) {
                room.link(*side, target);
            }
        }
        Ok(true)
    }

    fn connect(
        &mut self,
        name: &str,
        source: &dyn RoomSource,
    ) -> Result<Option<RoomKey>, MajorIssue> {
        let key = RoomKey::new(name);
        if self.rooms.contains_key(&key) || self.generate(name, source)? {
            Ok(Some(key))
        } else {
            Ok(None)
        }
    }

    /// Room stored under `key`.
    #[must_use]
    pub fn get(&self, key: &RoomKey) -> Option<&Room> {
        self.rooms.get(key)
    }

    /// Reports whether `key` names a generated room.
    #[must_use]
    pub fn contains(&self, key: &RoomKey) -> bool {
        self.rooms.contains_key(key)
    }

    /// Rooms in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Number of generated rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Reports whether no room has been generated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Side length of a tile in pixels.
    #[must_use]
    pub const fn tile_size(&self) -> i32 {
        self.tile_size
    }

    pub(crate) fn clear(&mut self) {
        self.rooms.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: IVec2 = IVec2::new(1920, 1080);

    #[test]
    fn parses_dimensions_and_tiles() {
        let layout = parse_room_description("3 2\nX ~ E\nL ~ X\n").expect("valid room");
        assert_eq!((layout.columns, layout.rows), (3, 2));
        assert_eq!(layout.codes, vec![vec!['X', '~', 'E'], vec!['L', '~', 'X']]);
        assert!(layout.neighbours.is_empty());
    }

    #[test]
    fn neighbour_section_header_may_carry_a_suffix() {
        let layout = parse_room_description("1 1\nR\n\nRooms:\nright: Annex\n").expect("valid room");
        assert_eq!(layout.neighbours.get(&Side::Right).map(String::as_str), Some("Annex"));
    }

    #[test]
    fn extra_tokens_are_ignored() {
        let layout = parse_room_description("2 1\n~ ~ X X\n").expect("valid room");
        assert_eq!(layout.codes, vec![vec!['~', '~']]);
    }

    #[test]
    fn reports_defects_with_line_numbers() {
        assert_eq!(
            parse_room_description("three 2\n"),
            Err(RoomConfigError::Dimensions { line: 1 })
        );
        assert_eq!(
            parse_room_description("3 2\n~ ~ ~\n"),
            Err(RoomConfigError::MissingRow {
                line: 3,
                expected: 2
            })
        );
        assert_eq!(
            parse_room_description("3 2\n~ ~ ~\n~ ~\n"),
            Err(RoomConfigError::MissingColumns {
                line: 3,
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn reads_neighbour_section_until_blank_line() {
        let text = "1 1\n~\n\nrooms\nLeft: Cellar\nright : Hall\nbogus\n\ntop: Ignored\n";
        let layout = parse_room_description(text).expect("valid room");
        assert_eq!(layout.neighbours.get(&Side::Left).map(String::as_str), Some("Cellar"));
        assert_eq!(layout.neighbours.get(&Side::Right).map(String::as_str), Some("Hall"));
        assert!(!layout.neighbours.contains_key(&Side::Top));
    }

    #[test]
    fn rooms_are_centred_in_the_viewport() {
        let source = MemoryRooms::new().with_room("Tiny", "2 1\n~ ~\n");
        let mut table = RoomTable::new(64, VIEWPORT);
        assert_eq!(table.generate("Tiny", &source), Ok(true));
        let room = table.get(&RoomKey::new("tiny")).expect("generated");
        assert_eq!(room.bounds(), Rect::new(896, 508, 128, 64));
        let tile = room.tile(IVec2::new(1, 0)).expect("tile");
        assert_eq!(tile.bounds(), Rect::new(960, 508, 64, 64));
    }

    #[test]
    fn unknown_codes_become_floor() {
        let source = MemoryRooms::new().with_room("Odd", "3 1\nX ? E\n");
        let mut table = RoomTable::new(64, VIEWPORT);
        assert_eq!(table.generate("Odd", &source), Ok(true));
        let room = table.get(&RoomKey::new("Odd")).expect("generated");
        assert!(!room.tile(IVec2::new(0, 0)).expect("wall").passable());
        assert_eq!(room.tile(IVec2::new(1, 0)).expect("floor").kind(), TileKind::Floor);
        let marker = room.tile(IVec2::new(2, 0)).expect("marker");
        assert_eq!(marker.kind(), TileKind::Floor);
        assert!(marker.spawns_enemy());
        assert_eq!(room.spawn_points(), vec![marker.bounds().location()]);
    }
}
