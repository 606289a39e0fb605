//! ASCII test worlds.
//!
//! Maps are written as one string per z-row, with `|` separating vertical
//! levels, e.g. `"XXX|   | X "` is a z-row whose level 0 is solid ground,
//! level 1 open, and level 2 solid only at x = 1. Any non-space character is
//! a solid block.

use std::collections::HashSet;

use strata_core::{Point3, VoxelWorld};

pub(crate) struct AsciiWorld {
    width: i32,
    depth: i32,
    height: i32,
    solid: HashSet<Point3>,
}

impl AsciiWorld {
    pub fn new(rows: &[&str]) -> Self {
        let mut solid = HashSet::new();
        let mut width = 0;
        let mut height = 0;
        for (z, row) in rows.iter().enumerate() {
            for (y, level) in row.split('|').enumerate() {
                height = height.max(y as i32 + 1);
                for (x, c) in level.chars().enumerate() {
                    width = width.max(x as i32 + 1);
                    if c != ' ' {
                        solid.insert(Point3::new(x as i32, y as i32, z as i32));
                    }
                }
            }
        }
        Self {
            width,
            depth: rows.len() as i32,
            // Room for headroom above the topmost drawn level.
            height: height + 2,
            solid,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn set_solid(&mut self, p: Point3, solid: bool) {
        if solid {
            self.solid.insert(p);
        } else {
            self.solid.remove(&p);
        }
    }
}

impl VoxelWorld for AsciiWorld {
    fn is_solid(&self, p: Point3) -> bool {
        self.solid.contains(&p)
    }

    fn height(&self) -> i32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_and_rows() {
        let w = AsciiWorld::new(&["XX| X", "X |  "]);
        assert_eq!(w.width(), 2);
        assert_eq!(w.depth(), 2);
        assert!(w.is_solid(Point3::new(0, 0, 0)));
        assert!(w.is_solid(Point3::new(1, 1, 0)));
        assert!(!w.is_solid(Point3::new(1, 0, 1)));
        assert!(!w.is_solid(Point3::new(0, 1, 1)));
        // Out of drawn bounds reads as open air.
        assert!(!w.is_solid(Point3::new(5, 0, 0)));
    }
}
