//! Packet bodies and the registry that decodes them by tag.

pub mod attachment;
pub mod mesh;
pub mod spheres;
pub mod walk;

use std::io::{Read, Seek, Write};

use binrw::{BinRead, BinWrite};
use derive_more::derive::From;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::types::{PacketType, Tag};

pub use attachment::{Hair, HairShortening, Helm, HelmHiding, Hook};
pub use mesh::{
    CollisionKind, CollisionMesh, CollisionVertex, Face, Material, MaterialFlags, RigidMesh,
    RigidVertex, Skin, SkinVertex,
};
pub use spheres::{CollisionSphere, CollisionSpheres};
pub use walk::{WalkFace, WalkMesh, WalkMeshMaterial, WalkVertex, WALK_MESH_MATERIALS};

/// One record of an archive
///
/// COL2 and COL3 share [`CollisionMesh`]; TRRN is a known tag without a body type.
#[derive(Debug, Clone, PartialEq, From)]
pub enum Packet {
    CollisionMesh(CollisionMesh),
    CollisionSpheres(CollisionSpheres),
    Hair(Hair),
    Helm(Helm),
    Hook(Hook),
    RigidMesh(RigidMesh),
    Skin(Skin),
    WalkMesh(WalkMesh),
}

impl Packet {
    /// Decode the body for `tag` at the reader's current position
    ///
    /// Tags without a decoder, including TRRN, fail with [`Error::UnsupportedVariant`]
    /// before anything is read.
    #[instrument(skip(reader), err(level = "debug"))]
    pub fn read<R: Read + Seek>(reader: &mut R, tag: Tag) -> Result<Packet> {
        let packet = match PacketType::from_tag(tag) {
            Some(PacketType::Col2 | PacketType::Col3) => CollisionMesh::read(reader)?.into(),
            Some(PacketType::Cols) => CollisionSpheres::read(reader)?.into(),
            Some(PacketType::Hair) => Hair::read(reader)?.into(),
            Some(PacketType::Helm) => Helm::read(reader)?.into(),
            Some(PacketType::Hook) => Hook::read(reader)?.into(),
            Some(PacketType::Rigd) => RigidMesh::read(reader)?.into(),
            Some(PacketType::Skin) => Skin::read(reader)?.into(),
            Some(PacketType::Walk) => WalkMesh::read(reader)?.into(),
            Some(PacketType::Trrn) | None => return Err(Error::UnsupportedVariant(tag)),
        };
        Ok(packet)
    }

    pub fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        match self {
            Packet::CollisionMesh(p) => p.write(writer)?,
            Packet::CollisionSpheres(p) => p.write(writer)?,
            Packet::Hair(p) => p.write(writer)?,
            Packet::Helm(p) => p.write(writer)?,
            Packet::Hook(p) => p.write(writer)?,
            Packet::RigidMesh(p) => p.write(writer)?,
            Packet::Skin(p) => p.write(writer)?,
            Packet::WalkMesh(p) => p.write(writer)?,
        }
        Ok(())
    }

    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::CollisionMesh(p) => p.kind.packet_type(),
            Packet::CollisionSpheres(_) => PacketType::Cols,
            Packet::Hair(_) => PacketType::Hair,
            Packet::Helm(_) => PacketType::Helm,
            Packet::Hook(_) => PacketType::Hook,
            Packet::RigidMesh(_) => PacketType::Rigd,
            Packet::Skin(_) => PacketType::Skin,
            Packet::WalkMesh(_) => PacketType::Walk,
        }
    }

    pub fn tag(&self) -> Tag {
        self.packet_type().tag()
    }

    /// Serialized size in bytes, computed from the current array lengths
    pub fn size(&self) -> usize {
        match self {
            Packet::CollisionMesh(p) => p.size(),
            Packet::CollisionSpheres(p) => p.size(),
            Packet::Hair(_) | Packet::Helm(_) | Packet::Hook(_) => attachment::ATTACHMENT_SIZE,
            Packet::RigidMesh(p) => p.size(),
            Packet::Skin(p) => p.size(),
            Packet::WalkMesh(p) => p.size(),
        }
    }

    /// The packet's name, sphere lists have none
    pub fn name(&self) -> Option<String> {
        match self {
            Packet::CollisionMesh(p) => Some(p.name.to_string_lossy()),
            Packet::CollisionSpheres(_) => None,
            Packet::Hair(p) => Some(p.name.to_string_lossy()),
            Packet::Helm(p) => Some(p.name.to_string_lossy()),
            Packet::Hook(p) => Some(p.name.to_string_lossy()),
            Packet::RigidMesh(p) => Some(p.name.to_string_lossy()),
            Packet::Skin(p) => Some(p.name.to_string_lossy()),
            Packet::WalkMesh(p) => Some(p.name.to_string_lossy()),
        }
    }
}
