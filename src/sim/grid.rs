//! Uniform spatial hash for broad-phase queries
//!
//! Rebuilt from scratch every tick, so there is no removal or move operation.
//! Queries return a superset of the true circular range; callers must apply
//! an exact distance test.

use std::collections::HashMap;

/// Bucketed 2D point index keyed by packed cell coordinates
#[derive(Debug, Clone)]
pub struct SpatialHashGrid<T> {
    cell_size: f32,
    cells: HashMap<u64, Vec<T>>,
}

impl<T: Copy> SpatialHashGrid<T> {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Empty every bucket, keeping allocations for the next rebuild
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
    }

    /// Number of values currently stored
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values().all(Vec::is_empty)
    }

    pub fn insert(&mut self, x: f32, y: f32, value: T) {
        let key = self.key_for(x, y);
        self.cells.entry(key).or_default().push(value);
    }

    /// Clear `out` and fill it with every value in the cells overlapping the
    /// square of side `2 * range` centered on `(x, y)`
    pub fn query_into(&self, x: f32, y: f32, range: f32, out: &mut Vec<T>) {
        out.clear();
        let min_cx = self.cell_coord(x - range);
        let max_cx = self.cell_coord(x + range);
        let min_cy = self.cell_coord(y - range);
        let max_cy = self.cell_coord(y + range);

        for cx in min_cx..=max_cx {
            for cy in min_cy..=max_cy {
                if let Some(bucket) = self.cells.get(&pack_key(cx, cy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
    }

    #[inline]
    fn cell_coord(&self, v: f32) -> i32 {
        (v / self.cell_size).floor() as i32
    }

    #[inline]
    fn key_for(&self, x: f32, y: f32) -> u64 {
        pack_key(self.cell_coord(x), self.cell_coord(y))
    }
}

/// Pack two signed cell coordinates into one integer key
#[inline]
fn pack_key(cx: i32, cy: i32) -> u64 {
    ((cx as u32 as u64) << 32) | (cy as u32 as u64)
}
