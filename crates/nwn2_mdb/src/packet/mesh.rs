//! Triangle meshes carrying a [`Material`]: collision, rigid and skinned.

use std::ops::{BitOr, BitOrAssign};

use binrw::{binrw, BinRead, BinWrite};
use derive_more::derive::Constructor;

use crate::codec::{FixedString, Vec3};
use crate::error::{Error, Result};
use crate::types::{PacketType, Tag, NAME_LEN, PACKET_HEADER_SIZE, RESOURCE_NAME_LEN};
use crate::weld::{bit_eq_fields, WeldedMesh};

/// Rendering switches stored in [`Material::flags`]
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[brw(little)]
pub struct MaterialFlags(pub u32);

impl MaterialFlags {
    pub const NONE: MaterialFlags = MaterialFlags(0);
    pub const ALPHA_TEST: MaterialFlags = MaterialFlags(0x1);
    pub const ENVIRONMENT_MAP: MaterialFlags = MaterialFlags(0x2);
    /// Head weighted to facial bones, used in cutscenes
    pub const CUTSCENE_HEAD: MaterialFlags = MaterialFlags(0x4);
    pub const GLOW: MaterialFlags = MaterialFlags(0x8);
    pub const CAST_NO_SHADOWS: MaterialFlags = MaterialFlags(0x10);
    pub const PROJECTED_TEXTURES: MaterialFlags = MaterialFlags(0x20);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: MaterialFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for MaterialFlags {
    type Output = MaterialFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        MaterialFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for MaterialFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Surface description shared by every renderable mesh
#[derive(BinRead, BinWrite, Debug, Clone, PartialEq)]
#[brw(little)]
pub struct Material {
    /// Texture names without extension
    pub diffuse_map: FixedString<RESOURCE_NAME_LEN>,
    pub normal_map: FixedString<RESOURCE_NAME_LEN>,
    pub tint_map: FixedString<RESOURCE_NAME_LEN>,
    pub glow_map: FixedString<RESOURCE_NAME_LEN>,

    pub diffuse_color: Vec3,
    pub specular_color: Vec3,
    pub specular_level: f32,
    pub specular_power: f32,

    pub flags: MaterialFlags,
}

impl Material {
    pub const SIZE: usize = 4 * RESOURCE_NAME_LEN + 2 * Vec3::SIZE + 4 + 4 + 4;
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse_map: Default::default(),
            normal_map: Default::default(),
            tint_map: Default::default(),
            glow_map: Default::default(),
            diffuse_color: Vec3::ONE,
            specular_color: Vec3::ONE,
            specular_level: 1.0,
            specular_power: 1.0,
            flags: MaterialFlags::NONE,
        }
    }
}

/// A triangle as three indices into the mesh's vertex list
#[derive(BinRead, BinWrite, Constructor, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct Face {
    pub vertex_indices: [u16; 3],
}

impl Face {
    pub const SIZE: usize = 6;
}

#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct CollisionVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uvw: Vec3,
}

impl CollisionVertex {
    pub const SIZE: usize = 3 * Vec3::SIZE;
}

#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct RigidVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub binormal: Vec3,
    pub uvw: Vec3,
}

impl RigidVertex {
    pub const SIZE: usize = 5 * Vec3::SIZE;
}

/// A vertex influenced by up to four skeleton bones
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct SkinVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub bone_weights: [f32; 4],
    pub bone_indices: [u8; 4],
    pub tangent: Vec3,
    pub binormal: Vec3,
    pub uvw: Vec3,
    pub bone_count: f32,
}

impl SkinVertex {
    pub const SIZE: usize = 5 * Vec3::SIZE + 4 * 4 + 4 + 4;

    /// Maximum number of bones that can influence one vertex
    pub const MAX_BONES: usize = 4;
}

/// The two tags a collision mesh can be stored under
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum CollisionKind {
    Col2,
    #[default]
    Col3,
}

impl CollisionKind {
    pub fn packet_type(self) -> PacketType {
        match self {
            CollisionKind::Col2 => PacketType::Col2,
            CollisionKind::Col3 => PacketType::Col3,
        }
    }

    pub fn tag(self) -> Tag {
        self.packet_type().tag()
    }
}

impl TryFrom<Tag> for CollisionKind {
    type Error = Error;

    fn try_from(tag: Tag) -> Result<Self> {
        match PacketType::from_tag(tag) {
            Some(PacketType::Col2) => Ok(CollisionKind::Col2),
            Some(PacketType::Col3) => Ok(CollisionKind::Col3),
            _ => Err(Error::UnsupportedVariant(tag)),
        }
    }
}

/// COL2 / COL3 packet
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionMesh {
    // Read as a plain tag so a short body stays an EOF
    #[br(try_map = |tag: Tag| CollisionKind::try_from(tag))]
    #[bw(map = |kind: &CollisionKind| kind.tag())]
    pub kind: CollisionKind,

    #[br(temp)]
    #[bw(try_calc = u32::try_from(Self::body_size(vertices.len(), faces.len())))]
    packet_size: u32,

    pub name: FixedString<NAME_LEN>,
    pub material: Material,

    #[br(temp)]
    #[bw(try_calc = u32::try_from(vertices.len()))]
    vertex_count: u32,

    #[br(temp)]
    #[bw(try_calc = u32::try_from(faces.len()))]
    face_count: u32,

    #[br(count = vertex_count)]
    pub vertices: Vec<CollisionVertex>,

    #[br(count = face_count)]
    pub faces: Vec<Face>,
}

impl CollisionMesh {
    pub const HEADER_SIZE: usize = PACKET_HEADER_SIZE + NAME_LEN + Material::SIZE + 4 + 4;

    pub fn new(kind: CollisionKind, name: &str) -> Self {
        Self {
            kind,
            name: name.into(),
            material: Material::default(),
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    fn body_size(vertices: usize, faces: usize) -> usize {
        Self::HEADER_SIZE - PACKET_HEADER_SIZE
            + vertices * CollisionVertex::SIZE
            + faces * Face::SIZE
    }

    /// Serialized size including the packet header
    pub fn size(&self) -> usize {
        PACKET_HEADER_SIZE + Self::body_size(self.vertices.len(), self.faces.len())
    }

    pub fn push_triangle(&mut self, corners: [CollisionVertex; 3]) -> Result<Face> {
        let face = Face::new(self.weld_triangle(corners)?);
        self.faces.push(face);
        Ok(face)
    }
}

/// RIGD packet
#[binrw]
#[brw(little, magic = b"RIGD")]
#[derive(Debug, Clone, PartialEq)]
pub struct RigidMesh {
    #[br(temp)]
    #[bw(try_calc = u32::try_from(Self::body_size(vertices.len(), faces.len())))]
    packet_size: u32,

    pub name: FixedString<NAME_LEN>,
    pub material: Material,

    #[br(temp)]
    #[bw(try_calc = u32::try_from(vertices.len()))]
    vertex_count: u32,

    #[br(temp)]
    #[bw(try_calc = u32::try_from(faces.len()))]
    face_count: u32,

    #[br(count = vertex_count)]
    pub vertices: Vec<RigidVertex>,

    #[br(count = face_count)]
    pub faces: Vec<Face>,
}

impl RigidMesh {
    pub const HEADER_SIZE: usize = PACKET_HEADER_SIZE + NAME_LEN + Material::SIZE + 4 + 4;

    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            material: Material::default(),
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    fn body_size(vertices: usize, faces: usize) -> usize {
        Self::HEADER_SIZE - PACKET_HEADER_SIZE + vertices * RigidVertex::SIZE + faces * Face::SIZE
    }

    /// Serialized size including the packet header
    pub fn size(&self) -> usize {
        PACKET_HEADER_SIZE + Self::body_size(self.vertices.len(), self.faces.len())
    }

    pub fn push_triangle(&mut self, corners: [RigidVertex; 3]) -> Result<Face> {
        let face = Face::new(self.weld_triangle(corners)?);
        self.faces.push(face);
        Ok(face)
    }
}

/// SKIN packet
///
/// Bone indices in the vertices refer to the bones of the skeleton named by
/// [`Skin::skeleton_name`], counted the way [`crate::import::SkeletonIndex`] does.
#[binrw]
#[brw(little, magic = b"SKIN")]
#[derive(Debug, Clone, PartialEq)]
pub struct Skin {
    #[br(temp)]
    #[bw(try_calc = u32::try_from(Self::body_size(vertices.len(), faces.len())))]
    packet_size: u32,

    pub name: FixedString<NAME_LEN>,
    pub skeleton_name: FixedString<RESOURCE_NAME_LEN>,
    pub material: Material,

    #[br(temp)]
    #[bw(try_calc = u32::try_from(vertices.len()))]
    vertex_count: u32,

    #[br(temp)]
    #[bw(try_calc = u32::try_from(faces.len()))]
    face_count: u32,

    #[br(count = vertex_count)]
    pub vertices: Vec<SkinVertex>,

    #[br(count = face_count)]
    pub faces: Vec<Face>,
}

impl Skin {
    pub const HEADER_SIZE: usize =
        PACKET_HEADER_SIZE + NAME_LEN + RESOURCE_NAME_LEN + Material::SIZE + 4 + 4;

    pub fn new(name: &str, skeleton_name: &str) -> Self {
        Self {
            name: name.into(),
            skeleton_name: skeleton_name.into(),
            material: Material::default(),
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    fn body_size(vertices: usize, faces: usize) -> usize {
        Self::HEADER_SIZE - PACKET_HEADER_SIZE + vertices * SkinVertex::SIZE + faces * Face::SIZE
    }

    /// Serialized size including the packet header
    pub fn size(&self) -> usize {
        PACKET_HEADER_SIZE + Self::body_size(self.vertices.len(), self.faces.len())
    }

    pub fn push_triangle(&mut self, corners: [SkinVertex; 3]) -> Result<Face> {
        let face = Face::new(self.weld_triangle(corners)?);
        self.faces.push(face);
        Ok(face)
    }
}

macro_rules! welded_mesh {
    ($mesh:ty, $vertex:ty) => {
        impl WeldedMesh for $mesh {
            type Vertex = $vertex;

            fn vertices(&self) -> &[Self::Vertex] {
                &self.vertices
            }

            fn vertices_mut(&mut self) -> &mut Vec<Self::Vertex> {
                &mut self.vertices
            }
        }
    };
}

bit_eq_fields!(CollisionVertex { position, normal, uvw });
bit_eq_fields!(RigidVertex { position, normal, tangent, binormal, uvw });
bit_eq_fields!(SkinVertex {
    position,
    normal,
    bone_weights,
    bone_indices,
    tangent,
    binormal,
    uvw,
    bone_count,
});

welded_mesh!(CollisionMesh, CollisionVertex);
welded_mesh!(RigidMesh, RigidVertex);
welded_mesh!(Skin, SkinVertex);
