//! Occlusion culling and face annotation
//!
//! A voxel enclosed on all six sides can never contribute a visible
//! surface, so it is dropped entirely; survivors are annotated with
//! per-face exposure flags for the serializers.

use crate::voxel::{FaceSet, Voxel, VoxelGrid};

/// Drop fully occluded voxels and annotate the rest with face flags
///
/// The returned grid's position index covers exactly the surviving
/// voxels, so serializer lookups see interior cells as empty.
pub fn optimize(grid: &VoxelGrid) -> VoxelGrid {
    let mut visible: Vec<Voxel> = Vec::with_capacity(grid.len());
    for voxel in grid.voxels() {
        let faces = visible_faces(grid, voxel.x, voxel.y, voxel.z);
        if !faces.any() {
            continue;
        }
        let mut v = voxel.clone();
        v.faces = Some(faces);
        visible.push(v);
    }

    log::debug!(
        "visibility: {} of {} voxels survive",
        visible.len(),
        grid.len()
    );
    VoxelGrid::new(visible, grid.width(), grid.height(), grid.max_depth())
}

/// Face flags: a face is exposed iff its neighbor position is empty
fn visible_faces(grid: &VoxelGrid, x: i32, y: i32, z: i32) -> FaceSet {
    FaceSet {
        pos_x: !grid.contains(x + 1, y, z),
        neg_x: !grid.contains(x - 1, y, z),
        pos_y: !grid.contains(x, y + 1, z),
        neg_y: !grid.contains(x, y - 1, z),
        pos_z: !grid.contains(x, y, z + 1),
        neg_z: !grid.contains(x, y, z - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Block;

    fn stone() -> Block {
        Block {
            name: "stone".into(),
            color: [125, 125, 125],
            id: 1,
            data: 0,
        }
    }

    fn cube(n: i32) -> VoxelGrid {
        let mut voxels = Vec::new();
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    voxels.push(Voxel::new(x, y, z, stone()));
                }
            }
        }
        VoxelGrid::new(voxels, n as usize, n as usize, n as u32)
    }

    #[test]
    fn test_lone_voxel_keeps_all_faces() {
        let grid = VoxelGrid::new(vec![Voxel::new(0, 0, 0, stone())], 1, 1, 1);
        let optimized = optimize(&grid);
        assert_eq!(optimized.len(), 1);
        assert_eq!(optimized.voxels()[0].faces, Some(FaceSet::ALL));
    }

    #[test]
    fn test_solid_cube_sheds_interior() {
        // A solid n^3 cube keeps exactly its 6n^2 - 12n + 8 shell voxels.
        for n in [2i32, 3, 4, 5] {
            let optimized = optimize(&cube(n));
            let expected = (6 * n * n - 12 * n + 8) as usize;
            assert_eq!(optimized.len(), expected, "n={n}");
        }
    }

    #[test]
    fn test_optimization_is_monotonic() {
        let grid = cube(4);
        let optimized = optimize(&grid);
        assert!(optimized.len() <= grid.len());
        // Re-optimizing the already-open shell changes nothing further.
        let again = optimize(&optimized);
        assert_eq!(again.len(), optimized.len());
    }

    #[test]
    fn test_face_flags_match_exposure() {
        // Two voxels side by side along X share a hidden face pair.
        let grid = VoxelGrid::new(
            vec![Voxel::new(0, 0, 0, stone()), Voxel::new(1, 0, 0, stone())],
            2,
            1,
            1,
        );
        let optimized = optimize(&grid);
        assert_eq!(optimized.len(), 2);
        let left = optimized.get(0, 0, 0).unwrap().faces.unwrap();
        let right = optimized.get(1, 0, 0).unwrap().faces.unwrap();
        assert!(!left.pos_x && left.neg_x);
        assert!(!right.neg_x && right.pos_x);
        assert_eq!(left.count(), 5);
        assert_eq!(right.count(), 5);
    }

    #[test]
    fn test_occlusion_ignores_block_identity() {
        let other = Block {
            name: "dirt".into(),
            color: [134, 96, 67],
            id: 3,
            data: 0,
        };
        // Center voxel enclosed by six different-material neighbors still drops.
        let mut voxels = vec![Voxel::new(0, 0, 0, stone())];
        for (dx, dy, dz) in [
            (1, 0, 0),
            (-1, 0, 0),
            (0, 1, 0),
            (0, -1, 0),
            (0, 0, 1),
            (0, 0, -1),
        ] {
            voxels.push(Voxel::new(dx, dy, dz, other.clone()));
        }
        let optimized = optimize(&VoxelGrid::new(voxels, 3, 3, 3));
        assert_eq!(optimized.len(), 6);
        assert!(!optimized.contains(0, 0, 0));
    }
}
