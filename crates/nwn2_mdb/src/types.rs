//! Base types for structure of MDB file.

use std::fmt;

use binrw::{BinRead, BinWrite};

/// Size of [`MdbHeader`] on disk
pub const HEADER_SIZE: usize = 12;

/// Size of [`PacketKey`] on disk
pub const KEY_SIZE: usize = 8;

/// Size of the tag and size fields every packet body starts with
pub const PACKET_HEADER_SIZE: usize = 8;

/// Width of the name field carried by every named packet
pub const NAME_LEN: usize = 33;

/// Width of texture and skeleton name fields
pub const RESOURCE_NAME_LEN: usize = 32;

pub const MAJOR_VERSION: u16 = 1;
pub const MINOR_VERSION: u16 = 12;

/// A four byte ASCII packet identifier
#[derive(BinRead, BinWrite, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const fn new(tag: &[u8; 4]) -> Self {
        Self(*tag)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02X}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

/// Magic every archive starts with
pub const SIGNATURE: Tag = Tag::new(b"NWN2");

impl From<&[u8; 4]> for Tag {
    fn from(value: &[u8; 4]) -> Self {
        Self(*value)
    }
}

/// The closed set of packet kinds an archive may name
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Collision mesh, `_C2` naming convention
    Col2,
    /// Collision mesh, `_C3` naming convention
    Col3,
    /// Collision spheres bound to skeleton bones
    Cols,
    Hair,
    Helm,
    Hook,
    /// Rigid mesh
    Rigd,
    /// Skinned mesh
    Skin,
    /// Terrain, known by name but never decoded
    Trrn,
    /// Walkmesh
    Walk,
}

impl PacketType {
    pub const ALL: [PacketType; 10] = [
        PacketType::Col2,
        PacketType::Col3,
        PacketType::Cols,
        PacketType::Hair,
        PacketType::Helm,
        PacketType::Hook,
        PacketType::Rigd,
        PacketType::Skin,
        PacketType::Trrn,
        PacketType::Walk,
    ];

    pub const fn tag(self) -> Tag {
        Tag::new(match self {
            PacketType::Col2 => b"COL2",
            PacketType::Col3 => b"COL3",
            PacketType::Cols => b"COLS",
            PacketType::Hair => b"HAIR",
            PacketType::Helm => b"HELM",
            PacketType::Hook => b"HOOK",
            PacketType::Rigd => b"RIGD",
            PacketType::Skin => b"SKIN",
            PacketType::Trrn => b"TRRN",
            PacketType::Walk => b"WALK",
        })
    }

    pub fn from_tag(tag: Tag) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tag().fmt(f)
    }
}

/// MDB file header
///
/// Always starts with "NWN2", followed by the format version and the number of packets.
/// All data is stored in little endian format
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(magic = b"NWN2", little)]
pub struct MdbHeader {
    pub major_version: u16,

    pub minor_version: u16,

    /// The number of entries in the key table
    pub packet_count: u32,
}

impl Default for MdbHeader {
    fn default() -> Self {
        Self {
            major_version: MAJOR_VERSION,
            minor_version: MINOR_VERSION,
            packet_count: 0,
        }
    }
}

/// MDB key table entry
///
/// Locates one packet body by absolute offset from the start of the file
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct PacketKey {
    pub tag: Tag,

    pub offset: u32,
}
