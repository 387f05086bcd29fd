//! Wavefront OBJ export
//!
//! Each visible voxel face becomes a quad, centered on the grid's
//! bounding-box center and scaled by the configured block size. The
//! optional merge pass coalesces coplanar same-material quads into
//! larger rectangles to cut vertex and face counts.

use std::collections::BTreeMap;
use std::fmt::Write;

use glam::Vec3;

use crate::voxel::{FaceSet, VoxelGrid};

/// OBJ export configuration
#[derive(Clone, Debug)]
pub struct ObjConfig {
    /// Object/material-library base name
    pub name: String,
    /// Edge length of one voxel in mesh units
    pub block_size: f32,
    /// Coalesce coplanar adjacent same-material faces
    pub merge_faces: bool,
}

impl Default for ObjConfig {
    fn default() -> Self {
        ObjConfig {
            name: "voxel_art".to_string(),
            block_size: 1.0,
            merge_faces: true,
        }
    }
}

/// Finished OBJ and MTL documents
#[derive(Clone, Debug)]
pub struct ObjExport {
    pub obj: String,
    pub mtl: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FaceDir {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl FaceDir {
    const ALL: [FaceDir; 6] = [
        FaceDir::PosX,
        FaceDir::NegX,
        FaceDir::PosY,
        FaceDir::NegY,
        FaceDir::PosZ,
        FaceDir::NegZ,
    ];

    fn visible(self, faces: FaceSet) -> bool {
        match self {
            FaceDir::PosX => faces.pos_x,
            FaceDir::NegX => faces.neg_x,
            FaceDir::PosY => faces.pos_y,
            FaceDir::NegY => faces.neg_y,
            FaceDir::PosZ => faces.pos_z,
            FaceDir::NegZ => faces.neg_z,
        }
    }

    /// Corner offsets (0/1 per axis) of this face's quad, wound so the
    /// normal points outward
    fn corners(self) -> [[i32; 3]; 4] {
        match self {
            FaceDir::PosX => [[1, 0, 0], [1, 1, 0], [1, 1, 1], [1, 0, 1]],
            FaceDir::NegX => [[0, 0, 0], [0, 0, 1], [0, 1, 1], [0, 1, 0]],
            FaceDir::PosY => [[0, 1, 0], [0, 1, 1], [1, 1, 1], [1, 1, 0]],
            FaceDir::NegY => [[0, 0, 0], [1, 0, 0], [1, 0, 1], [0, 0, 1]],
            FaceDir::PosZ => [[0, 0, 1], [1, 0, 1], [1, 1, 1], [0, 1, 1]],
            FaceDir::NegZ => [[0, 0, 0], [0, 1, 0], [1, 1, 0], [1, 0, 0]],
        }
    }
}

/// Vertex list plus material-bucketed quads, indices 0-based until writing
#[derive(Default)]
struct MeshBuilder {
    vertices: Vec<Vec3>,
    groups: BTreeMap<String, Vec<[usize; 4]>>,
}

impl MeshBuilder {
    fn push_vertex(&mut self, v: Vec3) -> usize {
        self.vertices.push(v);
        self.vertices.len() - 1
    }

    fn push_quad(&mut self, material: &str, quad: [usize; 4]) {
        self.groups.entry(material.to_string()).or_default().push(quad);
    }

    fn face_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Export the grid as an OBJ document with a companion MTL
///
/// Grids that never went through the visibility pass export with every
/// face treated as visible.
pub fn export_obj(grid: &VoxelGrid, config: &ObjConfig) -> ObjExport {
    let bounds = grid.bounds();
    let center = Vec3::new(
        bounds.min_x as f32 + bounds.size_x as f32 / 2.0,
        bounds.min_y as f32 + bounds.size_y as f32 / 2.0,
        bounds.min_z as f32 + bounds.size_z as f32 / 2.0,
    );
    let place = |p: Vec3| (p - center) * config.block_size;

    let mut mesh = MeshBuilder::default();
    if config.merge_faces {
        merge_quads(grid, place, &mut mesh);
    } else {
        direct_quads(grid, place, &mut mesh);
    }

    let mut materials: BTreeMap<String, [u8; 3]> = BTreeMap::new();
    for v in grid.voxels() {
        if v.faces.map_or(true, |f| f.any()) {
            materials
                .entry(v.block.name.clone())
                .or_insert(v.block.color);
        }
    }

    log::info!(
        "obj: {} vertices, {} faces ({} materials, merge={})",
        mesh.vertices.len(),
        mesh.face_count(),
        materials.len(),
        config.merge_faces
    );
    ObjExport {
        obj: write_obj_document(&mesh, grid, config),
        mtl: write_mtl_document(&materials, config),
    }
}

/// One quad per visible face, vertices shared within a single voxel only
fn direct_quads(grid: &VoxelGrid, place: impl Fn(Vec3) -> Vec3, mesh: &mut MeshBuilder) {
    for voxel in grid.voxels() {
        let faces = voxel.faces.unwrap_or(FaceSet::ALL);
        // Corner cache: bit 0 = x, bit 1 = y, bit 2 = z.
        let mut corner_ids: [Option<usize>; 8] = [None; 8];
        for dir in FaceDir::ALL {
            if !dir.visible(faces) {
                continue;
            }
            let quad = dir.corners().map(|c| {
                let key = (c[0] | (c[1] << 1) | (c[2] << 2)) as usize;
                *corner_ids[key].get_or_insert_with(|| {
                    mesh.vertices.push(place(Vec3::new(
                        (voxel.x + c[0]) as f32,
                        (voxel.y + c[1]) as f32,
                        (voxel.z + c[2]) as f32,
                    )));
                    mesh.vertices.len() - 1
                })
            });
            mesh.push_quad(&voxel.block.name, quad);
        }
    }
}

/// Greedy rectangle coalescing per (direction, layer, material) plane
fn merge_quads(grid: &VoxelGrid, place: impl Fn(Vec3) -> Vec3, mesh: &mut MeshBuilder) {
    let bounds = *grid.bounds();
    if grid.is_empty() {
        return;
    }

    for dir in FaceDir::ALL {
        // Plane axes: (layer, u, v) in grid coordinates.
        let (layer_range, u_range, v_range) = match dir {
            FaceDir::PosX | FaceDir::NegX => (
                (bounds.min_x, bounds.max_x),
                (bounds.min_y, bounds.max_y),
                (bounds.min_z, bounds.max_z),
            ),
            FaceDir::PosY | FaceDir::NegY => (
                (bounds.min_y, bounds.max_y),
                (bounds.min_x, bounds.max_x),
                (bounds.min_z, bounds.max_z),
            ),
            FaceDir::PosZ | FaceDir::NegZ => (
                (bounds.min_z, bounds.max_z),
                (bounds.min_x, bounds.max_x),
                (bounds.min_y, bounds.max_y),
            ),
        };
        let size_u = (u_range.1 - u_range.0 + 1) as usize;
        let size_v = (v_range.1 - v_range.0 + 1) as usize;

        for layer in layer_range.0..=layer_range.1 {
            let mut mask: Vec<Option<&str>> = vec![None; size_u * size_v];
            let mut filled = false;
            for vi in 0..size_v {
                for ui in 0..size_u {
                    let u = u_range.0 + ui as i32;
                    let v = v_range.0 + vi as i32;
                    let (x, y, z) = match dir {
                        FaceDir::PosX | FaceDir::NegX => (layer, u, v),
                        FaceDir::PosY | FaceDir::NegY => (u, layer, v),
                        FaceDir::PosZ | FaceDir::NegZ => (u, v, layer),
                    };
                    if let Some(voxel) = grid.get(x, y, z) {
                        let faces = voxel.faces.unwrap_or(FaceSet::ALL);
                        if dir.visible(faces) {
                            mask[vi * size_u + ui] = Some(voxel.block.name.as_str());
                            filled = true;
                        }
                    }
                }
            }
            if !filled {
                continue;
            }

            for (ui, vi, w, h, material) in greedy_rectangles(&mask, size_u, size_v) {
                let u0 = u_range.0 + ui as i32;
                let v0 = v_range.0 + vi as i32;
                let quad = rect_corners(dir, layer, u0, v0, w as i32, h as i32)
                    .map(|c| mesh.push_vertex(place(Vec3::new(c[0] as f32, c[1] as f32, c[2] as f32))));
                mesh.push_quad(material, quad);
            }
        }
    }
}

/// Expand each unvisited cell as far as it goes in u, then in v
fn greedy_rectangles<'a>(
    mask: &[Option<&'a str>],
    size_u: usize,
    size_v: usize,
) -> Vec<(usize, usize, usize, usize, &'a str)> {
    let mut rects = Vec::new();
    let mut visited = vec![false; size_u * size_v];
    for v in 0..size_v {
        for u in 0..size_u {
            let idx = v * size_u + u;
            if visited[idx] {
                continue;
            }
            let Some(material) = mask[idx] else {
                continue;
            };

            let mut width = 1;
            while u + width < size_u {
                let next = v * size_u + u + width;
                if visited[next] || mask[next] != Some(material) {
                    break;
                }
                width += 1;
            }

            let mut height = 1;
            'grow: while v + height < size_v {
                for du in 0..width {
                    let check = (v + height) * size_u + u + du;
                    if visited[check] || mask[check] != Some(material) {
                        break 'grow;
                    }
                }
                height += 1;
            }

            for dv in 0..height {
                for du in 0..width {
                    visited[(v + dv) * size_u + u + du] = true;
                }
            }
            rects.push((u, v, width, height, material));
        }
    }
    rects
}

/// Outward-wound corners of a merged `w x h` rectangle on `layer`
fn rect_corners(dir: FaceDir, layer: i32, u0: i32, v0: i32, w: i32, h: i32) -> [[i32; 3]; 4] {
    match dir {
        FaceDir::PosX => {
            let x = layer + 1;
            [
                [x, u0, v0],
                [x, u0 + w, v0],
                [x, u0 + w, v0 + h],
                [x, u0, v0 + h],
            ]
        }
        FaceDir::NegX => [
            [layer, u0, v0],
            [layer, u0, v0 + h],
            [layer, u0 + w, v0 + h],
            [layer, u0 + w, v0],
        ],
        FaceDir::PosY => {
            let y = layer + 1;
            [
                [u0, y, v0],
                [u0, y, v0 + h],
                [u0 + w, y, v0 + h],
                [u0 + w, y, v0],
            ]
        }
        FaceDir::NegY => [
            [u0, layer, v0],
            [u0 + w, layer, v0],
            [u0 + w, layer, v0 + h],
            [u0, layer, v0 + h],
        ],
        FaceDir::PosZ => {
            let z = layer + 1;
            [
                [u0, v0, z],
                [u0 + w, v0, z],
                [u0 + w, v0 + h, z],
                [u0, v0 + h, z],
            ]
        }
        FaceDir::NegZ => [
            [u0, v0, layer],
            [u0, v0 + h, layer],
            [u0 + w, v0 + h, layer],
            [u0 + w, v0, layer],
        ],
    }
}

fn write_obj_document(mesh: &MeshBuilder, grid: &VoxelGrid, config: &ObjConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# voxart OBJ export");
    let _ = writeln!(out, "# Voxels: {}", grid.len());
    let _ = writeln!(out, "# Faces: {}", mesh.face_count());
    let _ = writeln!(out, "mtllib {}.mtl", config.name);
    let _ = writeln!(out, "o {}", config.name);

    for v in &mesh.vertices {
        let _ = writeln!(out, "v {} {} {}", v.x, v.y, v.z);
    }

    for (material, quads) in &mesh.groups {
        let _ = writeln!(out, "usemtl {}", material);
        for q in quads {
            // OBJ face indices are 1-based.
            let _ = writeln!(out, "f {} {} {} {}", q[0] + 1, q[1] + 1, q[2] + 1, q[3] + 1);
        }
    }
    out
}

fn write_mtl_document(materials: &BTreeMap<String, [u8; 3]>, config: &ObjConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# voxart MTL export ({})", config.name);
    for (name, color) in materials {
        let _ = writeln!(out, "newmtl {}", name);
        let _ = writeln!(
            out,
            "Kd {:.4} {:.4} {:.4}",
            color[0] as f32 / 255.0,
            color[1] as f32 / 255.0,
            color[2] as f32 / 255.0
        );
    }
    out
}
