//! Walkmesh packets and the surface materials used to author them.

use binrw::{binrw, BinRead, BinWrite};

use crate::codec::{FixedString, Vec3};
use crate::error::Result;
use crate::types::{NAME_LEN, PACKET_HEADER_SIZE};
use crate::weld::{bit_eq_fields, WeldedMesh};

/// A named surface type for walkmesh faces
///
/// The table is only used to name and color faces while authoring, faces store the raw flags.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WalkMeshMaterial {
    pub name: &'static str,
    pub flags: u32,
    /// Debug display color, RGB in `0.0..=1.0`
    pub color: [f32; 3],
}

/// Set on every face a creature can walk on
pub const WALKABLE: u32 = 0x1;

pub const WALK_MESH_MATERIALS: [WalkMeshMaterial; 12] = [
    WalkMeshMaterial { name: "w_Nonwalk", flags: 0x0, color: [1.0, 0.0, 0.0] },
    WalkMeshMaterial { name: "w_Dirt", flags: 0x9, color: [0.29, 0.18, 0.07] },
    WalkMeshMaterial { name: "w_Grass", flags: 0x11, color: [0.0, 0.14, 0.0] },
    WalkMeshMaterial { name: "w_Stone", flags: 0x21, color: [0.22, 0.22, 0.22] },
    WalkMeshMaterial { name: "w_Wood", flags: 0x41, color: [1.0, 0.9, 0.17] },
    WalkMeshMaterial { name: "w_Carpet", flags: 0x81, color: [0.25, 0.0, 0.25] },
    WalkMeshMaterial { name: "w_Metal", flags: 0x101, color: [0.82, 0.82, 1.0] },
    WalkMeshMaterial { name: "w_Swamp", flags: 0x201, color: [0.41, 0.67, 0.0] },
    WalkMeshMaterial { name: "w_Mud", flags: 0x401, color: [0.25, 0.07, 0.0] },
    WalkMeshMaterial { name: "w_Leaves", flags: 0x801, color: [0.03, 0.05, 0.0] },
    WalkMeshMaterial { name: "w_Water", flags: 0x1001, color: [0.25, 0.59, 1.0] },
    WalkMeshMaterial { name: "w_Puddles", flags: 0x2001, color: [0.6, 0.65, 0.83] },
];

impl WalkMeshMaterial {
    pub fn by_name(name: &str) -> Option<&'static WalkMeshMaterial> {
        WALK_MESH_MATERIALS.iter().find(|m| m.name == name)
    }

    pub fn by_flags(flags: u32) -> Option<&'static WalkMeshMaterial> {
        WALK_MESH_MATERIALS.iter().find(|m| m.flags == flags)
    }

    pub fn is_walkable(&self) -> bool {
        self.flags & WALKABLE != 0
    }
}

#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct WalkVertex {
    pub position: Vec3,
}

bit_eq_fields!(WalkVertex { position });

impl WalkVertex {
    pub const SIZE: usize = Vec3::SIZE;
}

#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct WalkFace {
    pub vertex_indices: [u16; 3],
    /// Surface flags, see [`WALK_MESH_MATERIALS`]
    pub flags: u32,
}

impl WalkFace {
    pub const SIZE: usize = 10;

    pub fn material(&self) -> Option<&'static WalkMeshMaterial> {
        WalkMeshMaterial::by_flags(self.flags)
    }
}

/// WALK packet
#[binrw]
#[brw(little, magic = b"WALK")]
#[derive(Debug, Clone, PartialEq)]
pub struct WalkMesh {
    #[br(temp)]
    #[bw(try_calc = u32::try_from(Self::body_size(vertices.len(), faces.len())))]
    packet_size: u32,

    pub name: FixedString<NAME_LEN>,
    pub ui_flags: u32,

    #[br(temp)]
    #[bw(try_calc = u32::try_from(vertices.len()))]
    vertex_count: u32,

    #[br(temp)]
    #[bw(try_calc = u32::try_from(faces.len()))]
    face_count: u32,

    #[br(count = vertex_count)]
    pub vertices: Vec<WalkVertex>,

    #[br(count = face_count)]
    pub faces: Vec<WalkFace>,
}

impl WalkMesh {
    pub const HEADER_SIZE: usize = PACKET_HEADER_SIZE + NAME_LEN + 4 + 4 + 4;

    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ui_flags: 0,
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    fn body_size(vertices: usize, faces: usize) -> usize {
        Self::HEADER_SIZE - PACKET_HEADER_SIZE + vertices * WalkVertex::SIZE + faces * WalkFace::SIZE
    }

    /// Serialized size including the packet header
    pub fn size(&self) -> usize {
        PACKET_HEADER_SIZE + Self::body_size(self.vertices.len(), self.faces.len())
    }

    pub fn push_triangle(&mut self, corners: [Vec3; 3], flags: u32) -> Result<WalkFace> {
        let vertex_indices = self.weld_triangle(corners.map(|position| WalkVertex { position }))?;
        let face = WalkFace {
            vertex_indices,
            flags,
        };
        self.faces.push(face);
        Ok(face)
    }
}

impl WeldedMesh for WalkMesh {
    type Vertex = WalkVertex;

    fn vertices(&self) -> &[Self::Vertex] {
        &self.vertices
    }

    fn vertices_mut(&mut self) -> &mut Vec<Self::Vertex> {
        &mut self.vertices
    }
}
