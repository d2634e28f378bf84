//! Static map grid and the text loader that builds it.
//!
//! The grid is stored as a flat arena of [`Cell`]s addressed by a packed key
//! `y * width + x`. Box placement on the server is keyed by the same packed
//! value, so a key is only meaningful together with the map that produced it.

use crate::error::MapLoadError;
use crate::model::Direction;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Wall,
    /// Vegetation and similar scenery; drawn but walkable.
    Decoration,
    /// Hazards/enemies baked into the map; blocks movement like a wall.
    Impassable,
}

impl Cell {
    /// Maps a glyph of the map file to a cell. Unknown glyphs are empty.
    pub fn from_glyph(glyph: char) -> Self {
        match glyph {
            '▤' | '#' => Cell::Wall,
            '♣' | '%' => Cell::Decoration,
            '♙' | 'X' => Cell::Impassable,
            _ => Cell::Empty,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::Wall => '▤',
            Cell::Decoration => '♣',
            Cell::Impassable => '♙',
        }
    }

    pub fn is_passable(self) -> bool {
        matches!(self, Cell::Empty | Cell::Decoration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring coordinate one step in `direction`.
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn neighbours(self) -> [Coordinate; 4] {
        [
            self.step(Direction::Up),
            self.step(Direction::Down),
            self.step(Direction::Left),
            self.step(Direction::Right),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Map {
    /// Parses a textual grid. Each line is a row; ragged rows are padded
    /// with [`Cell::Empty`] up to the longest row.
    pub fn parse(text: &str) -> Self {
        let rows: Vec<Vec<Cell>> = text
            .lines()
            .map(|line| line.chars().map(Cell::from_glyph).collect())
            .collect();

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let height = if width == 0 { 0 } else { rows.len() };

        let mut cells = Vec::with_capacity(width * height);
        for mut row in rows.into_iter().take(height) {
            row.resize(width, Cell::Empty);
            cells.extend(row);
        }

        Self {
            width,
            height,
            cells,
        }
    }

    /// Reads and parses a map file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MapLoadError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Packed arena key of an in-bounds coordinate.
    pub fn key(&self, coord: Coordinate) -> Option<u32> {
        if coord.x < 0 || coord.y < 0 {
            return None;
        }
        let (x, y) = (coord.x as usize, coord.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        u32::try_from(y * self.width + x).ok()
    }

    /// Inverse of [`Map::key`].
    pub fn coordinate(&self, key: u32) -> Coordinate {
        let key = key as usize;
        let width = self.width.max(1);
        Coordinate::new((key % width) as i32, (key / width) as i32)
    }

    pub fn cell(&self, coord: Coordinate) -> Option<Cell> {
        self.key(coord).map(|key| self.cells[key as usize])
    }

    /// Out-of-bounds coordinates are never passable.
    pub fn is_passable(&self, coord: Coordinate) -> bool {
        self.cell(coord).is_some_and(Cell::is_passable)
    }

    /// All [`Cell::Empty`] coordinates in row-major order. These are the
    /// candidates for box and player placement.
    pub fn empty_cells(&self) -> Vec<Coordinate> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == Cell::Empty)
            .map(|(key, _)| self.coordinate(key as u32))
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyphs_map_to_cells() {
        assert_eq!(Cell::from_glyph('▤'), Cell::Wall);
        assert_eq!(Cell::from_glyph('#'), Cell::Wall);
        assert_eq!(Cell::from_glyph('♣'), Cell::Decoration);
        assert_eq!(Cell::from_glyph('♙'), Cell::Impassable);
        assert_eq!(Cell::from_glyph(' '), Cell::Empty);
        assert_eq!(Cell::from_glyph('?'), Cell::Empty);
    }

    #[test]
    fn test_passability() {
        assert!(Cell::Empty.is_passable());
        assert!(Cell::Decoration.is_passable());
        assert!(!Cell::Wall.is_passable());
        assert!(!Cell::Impassable.is_passable());
    }

    #[test]
    fn test_parse_rectangular_grid() {
        let map = Map::parse("###\n# #\n###\n");
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 3);
        assert_eq!(map.cell(Coordinate::new(1, 1)), Some(Cell::Empty));
        assert_eq!(map.cell(Coordinate::new(0, 1)), Some(Cell::Wall));
        assert_eq!(map.empty_cells(), vec![Coordinate::new(1, 1)]);
    }

    #[test]
    fn test_ragged_rows_are_padded_with_empty() {
        let map = Map::parse("#####\n#\n###");
        assert_eq!(map.width(), 5);
        assert_eq!(map.height(), 3);
        assert_eq!(map.cell(Coordinate::new(4, 1)), Some(Cell::Empty));
        assert_eq!(map.cell(Coordinate::new(3, 2)), Some(Cell::Empty));
        assert_eq!(map.empty_cells().len(), 4 + 2);
    }

    #[test]
    fn test_multibyte_glyphs_count_as_one_cell() {
        let map = Map::parse("▤♣ ♙");
        assert_eq!(map.width(), 4);
        assert_eq!(
            map.rows().next().unwrap(),
            &[Cell::Wall, Cell::Decoration, Cell::Empty, Cell::Impassable]
        );
    }

    #[test]
    fn test_decoration_is_not_a_placement_candidate() {
        let map = Map::parse("%  ");
        assert_eq!(
            map.empty_cells(),
            vec![Coordinate::new(1, 0), Coordinate::new(2, 0)]
        );
        assert!(map.is_passable(Coordinate::new(0, 0)));
    }

    #[test]
    fn test_out_of_bounds_is_not_passable() {
        let map = Map::parse("   \n   ");
        assert!(!map.is_passable(Coordinate::new(-1, 0)));
        assert!(!map.is_passable(Coordinate::new(0, -1)));
        assert!(!map.is_passable(Coordinate::new(3, 0)));
        assert!(!map.is_passable(Coordinate::new(0, 2)));
        assert!(map.is_passable(Coordinate::new(2, 1)));
    }

    #[test]
    fn test_packed_key_roundtrip() {
        let map = Map::parse("    \n    \n    ");
        let coord = Coordinate::new(3, 2);
        let key = map.key(coord).unwrap();
        assert_eq!(key, 2 * 4 + 3);
        assert_eq!(map.coordinate(key), coord);
        assert_eq!(map.key(Coordinate::new(4, 0)), None);
    }

    #[test]
    fn test_empty_source_gives_empty_map() {
        let map = Map::parse("");
        assert_eq!(map.width(), 0);
        assert_eq!(map.height(), 0);
        assert!(map.empty_cells().is_empty());
        assert!(!map.is_passable(Coordinate::new(0, 0)));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = Map::load("/definitely/not/here.txt").unwrap_err();
        assert_eq!(err.path, Path::new("/definitely/not/here.txt"));
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_load_reads_file() {
        let path = std::env::temp_dir().join(format!("map-load-{}.txt", std::process::id()));
        std::fs::write(&path, "#  #\n#  #\n").unwrap();
        let map = Map::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(map.width(), 4);
        assert_eq!(map.empty_cells().len(), 4);
    }

    #[test]
    fn test_neighbours() {
        let around = Coordinate::new(2, 2).neighbours();
        assert!(around.contains(&Coordinate::new(2, 1)));
        assert!(around.contains(&Coordinate::new(2, 3)));
        assert!(around.contains(&Coordinate::new(1, 2)));
        assert!(around.contains(&Coordinate::new(3, 2)));
    }
}
