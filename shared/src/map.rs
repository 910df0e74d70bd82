//! Tile grid map. Immutable after load; queried by the collision step.

use crate::vec2::Vec2;

pub const TILE_INVALID: u8 = 0;
pub const TILE_GRASS: u8 = b' ';
pub const TILE_STONE: u8 = b'#';

#[derive(Debug, Clone)]
pub struct Map {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub tile_size: f32,
    pub origin: Vec2,
}

impl Map {
    pub fn coord_in_bounds(&self, i: i32, j: i32) -> bool {
        i >= 0 && (i as u32) < self.width && j >= 0 && (j as u32) < self.height
    }

    pub fn coord_of(&self, at: Vec2) -> (i32, i32) {
        let i = ((at.x - self.origin.x) / self.tile_size).floor() as i32;
        let j = ((at.y - self.origin.y) / self.tile_size).floor() as i32;
        (i, j)
    }

    pub fn tile_at(&self, at: Vec2) -> u8 {
        let (i, j) = self.coord_of(at);
        if !self.coord_in_bounds(i, j) {
            return TILE_INVALID;
        }
        self.data[(j as u32 * self.width + i as u32) as usize]
    }

    /// The default arena: a sixteen-by-sixteen room with a couple of
    /// interior stone walls, matching the reference layout.
    pub fn default_arena() -> Map {
        let rows = [
            "################",
            "#              #",
            "# ####         #",
            "# #            #",
            "# #            #",
            "# #            #",
            "#              #",
            "#              #",
            "#              #",
            "#              #",
            "#              #",
            "#              #",
            "#        #     #",
            "#              #",
            "#              #",
            "################",
        ];
        let data: Vec<u8> = rows.concat().into_bytes();
        Map {
            data,
            width: 16,
            height: 16,
            tile_size: 1.0,
            origin: Vec2::new(-8.0, -8.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_tiles_are_stone() {
        let map = Map::default_arena();
        assert_eq!(map.tile_at(map.origin), TILE_STONE);
    }

    #[test]
    fn center_tile_is_grass() {
        let map = Map::default_arena();
        assert_eq!(map.tile_at(Vec2::new(0.0, 0.0)), TILE_GRASS);
    }

    #[test]
    fn out_of_bounds_is_invalid() {
        let map = Map::default_arena();
        assert_eq!(map.tile_at(Vec2::new(1000.0, 1000.0)), TILE_INVALID);
    }

    #[test]
    fn one_tile_past_the_last_column_is_invalid() {
        let map = Map::default_arena();
        let just_past_edge = Vec2::new(
            map.origin.x + map.width as f32 * map.tile_size + 0.5,
            0.0,
        );
        assert_eq!(map.tile_at(just_past_edge), TILE_INVALID);
    }
}
