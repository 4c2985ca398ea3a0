//! Morphological operations on voxel grids.
//!
//! Provides erosion with the 6-connected structuring element and the object
//! surface derived from it, as required by surface-distance metrics.

use crate::mask::VoxelGrid;

/// Offsets of the 6-connected neighbourhood (face neighbours).
const FACE_NEIGHBOURS: [[isize; 3]; 6] = [
    [-1, 0, 0],
    [1, 0, 0],
    [0, -1, 0],
    [0, 1, 0],
    [0, 0, -1],
    [0, 0, 1],
];

/// Binary erosion with the 6-connected structuring element.
///
/// Voxels outside the grid count as background, so foreground voxels on the
/// grid border are always eroded.
pub fn erosion(grid: &VoxelGrid) -> VoxelGrid {
    let mut eroded = VoxelGrid::empty(grid.dims());
    for index in grid.foreground_indices() {
        let coords = grid.coords(index);
        let interior = FACE_NEIGHBOURS
            .iter()
            .all(|offset| neighbour(grid, coords, *offset).is_some_and(|n| grid.get(n)));
        if interior {
            eroded.set(coords, true);
        }
    }
    eroded
}

/// Surface voxels of the foreground: `grid AND NOT erosion(grid)`.
pub fn surface(grid: &VoxelGrid) -> VoxelGrid {
    let eroded = erosion(grid);
    let mut border = VoxelGrid::empty(grid.dims());
    for index in grid.foreground_indices() {
        if !eroded.voxels()[index] {
            border.set(grid.coords(index), true);
        }
    }
    border
}

fn neighbour(grid: &VoxelGrid, coords: [usize; 3], offset: [isize; 3]) -> Option<[usize; 3]> {
    let dims = grid.dims();
    let mut out = [0; 3];
    for axis in 0..3 {
        let moved = coords[axis].checked_add_signed(offset[axis])?;
        if moved >= dims[axis] {
            return None;
        }
        out[axis] = moved;
    }
    Some(out)
}
