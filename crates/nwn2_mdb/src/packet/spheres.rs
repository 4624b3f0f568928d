//! Bone-attached collision spheres used for coarse hit tests.

use binrw::{binrw, BinRead, BinWrite};

use crate::types::PACKET_HEADER_SIZE;

/// A collision sphere following one skeleton bone
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct CollisionSphere {
    pub bone_index: u32,
    pub radius: f32,
}

impl CollisionSphere {
    pub const SIZE: usize = 8;
}

/// COLS packet
#[binrw]
#[brw(little, magic = b"COLS")]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionSpheres {
    #[br(temp)]
    #[bw(try_calc = u32::try_from(Self::body_size(spheres.len())))]
    packet_size: u32,

    #[br(temp)]
    #[bw(try_calc = u32::try_from(spheres.len()))]
    sphere_count: u32,

    #[br(count = sphere_count)]
    pub spheres: Vec<CollisionSphere>,
}

impl CollisionSpheres {
    pub const HEADER_SIZE: usize = PACKET_HEADER_SIZE + 4;

    pub fn new(spheres: Vec<CollisionSphere>) -> Self {
        Self { spheres }
    }

    fn body_size(spheres: usize) -> usize {
        Self::HEADER_SIZE - PACKET_HEADER_SIZE + spheres * CollisionSphere::SIZE
    }

    /// Serialized size including the packet header
    pub fn size(&self) -> usize {
        PACKET_HEADER_SIZE + Self::body_size(self.spheres.len())
    }
}
