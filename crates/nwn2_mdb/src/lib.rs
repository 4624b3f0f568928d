//! This library handles reading from and creating **MDB** model files used by *Neverwinter Nights 2*.
//!
//! # MDB Archive Format Documentation
//!
//! An MDB file bundles the geometry of one model: render meshes, collision meshes, walkmeshes,
//! collision spheres and small attachment records. Every record is a self describing *packet*,
//! located through a key table at the start of the file. MDB files use the `.mdb` extension.
//!
//! ## File Structure
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: "NWN2"                                            |
//! | 0x0004         | Major version          | 2 bytes: currently 1                                       |
//! | 0x0006         | Minor version          | 2 bytes: currently 12                                      |
//! | 0x0008         | Packet count           | 4 bytes: Number of entries in the key table                |
//! | 0x000C         | Key table              | 8 bytes per packet                                         |
//!
//! ### Key Table
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Tag                    | 4 bytes: ASCII packet kind                                 |
//! | 0x0004         | Offset                 | 4 bytes: Absolute offset of the packet body                |
//!
//! Readers follow the offsets, so bodies may appear in any order. [`MdbArchive::save`] always
//! writes them back to back in key order, starting right after the key table.
//!
//! ### Packets
//!
//! Every packet starts with its tag and the size of the packet minus these 8 bytes.
//!
//! | Tag    | Contents                                                                          |
//! |--------|-----------------------------------------------------------------------------------|
//! | `COL2` | Collision mesh: name, material, vertices (position, normal, uvw), faces           |
//! | `COL3` | Same layout as `COL2`                                                             |
//! | `COLS` | Collision spheres: bone index and radius                                          |
//! | `HAIR` | Name, hair shortening behaviour, position, orientation                            |
//! | `HELM` | Name, hair hiding behaviour, position, orientation                                |
//! | `HOOK` | Name, point type, point size, position, orientation                               |
//! | `RIGD` | Rigid mesh: name, material, vertices with tangent space, faces                    |
//! | `SKIN` | Skinned mesh: as `RIGD` plus skeleton name and four bone weights per vertex       |
//! | `TRRN` | Terrain, known but not decoded                                                    |
//! | `WALK` | Walkmesh: name, UI flags, vertex positions, faces with surface flags              |
//!
//! Names are 33 byte, texture and skeleton names 32 byte, null padded fields. Faces are three
//! 16-bit vertex indices.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.mdb`
//! - **Endianness**: Little-endian for all multi-byte values
//!
//! ```
//! # fn doit() -> nwn2_mdb::error::Result<()> {
//! use std::io::Cursor;
//! use nwn2_mdb::{MdbArchive, Packet, RigidMesh, RigidVertex};
//!
//! let mut mesh = RigidMesh::new("Torso");
//! mesh.push_triangle([0.0, 1.0, 2.0].map(|x| RigidVertex {
//!     position: [x, 0.0, 0.0].into(),
//!     ..Default::default()
//! }))?;
//!
//! let mut mdb = MdbArchive::new();
//! mdb.add_packet(Packet::from(mesh));
//!
//! let mut buffer = Vec::new();
//! mdb.save(&mut buffer)?;
//!
//! let reopened = MdbArchive::open(Cursor::new(buffer))?;
//! assert_eq!(reopened.packet_count(), 1);
//! # Ok(())
//! # }
//! # doit().unwrap();
//! ```

pub mod codec;
pub mod error;
pub mod import;
pub mod packet;
pub mod read;
pub mod types;
pub mod weld;
pub mod write;

pub use import::{import_mesh, MeshSource};
pub use packet::{
    CollisionMesh, CollisionVertex, Packet, RigidMesh, RigidVertex, Skin, SkinVertex, WalkMesh,
};
pub use read::{ArchiveOptions, MdbArchive};
pub use types::{PacketType, Tag};
pub use weld::WeldedMesh;
