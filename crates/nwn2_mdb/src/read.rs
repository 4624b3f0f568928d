//! Types for reading MDB archives
//!

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use binrw::BinRead;
use bon::Builder;
use tracing::{debug, instrument, warn};

use crate::error::{Error, FormatError, Result, Warning};
use crate::packet::Packet;
use crate::types::{MdbHeader, PacketKey, Tag, MAJOR_VERSION, MINOR_VERSION, SIGNATURE};

/// Options for a newly created archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct ArchiveOptions {
    /// Major format version written to the header
    #[builder(default = MAJOR_VERSION)]
    pub major_version: u16,

    /// Minor format version written to the header
    #[builder(default = MINOR_VERSION)]
    pub minor_version: u16,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// An MDB model archive held fully in memory
///
/// Every key has a matching slot. A slot is `None` when the archive named a
/// packet kind this crate cannot decode.
///
/// ```no_run
/// fn list_packets(path: &str) -> nwn2_mdb::error::Result<()> {
///     let mdb = nwn2_mdb::MdbArchive::open_path(path)?;
///
///     for (key, packet) in mdb.keys().iter().zip(mdb.packets()) {
///         match packet.and_then(|p| p.name()) {
///             Some(name) => println!("{} {}", key.tag, name),
///             None => println!("{}", key.tag),
///         }
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MdbArchive {
    pub(crate) header: MdbHeader,
    pub(crate) keys: Vec<PacketKey>,
    pub(crate) packets: Vec<Option<Packet>>,
}

impl MdbArchive {
    /// An empty archive at the current format version
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ArchiveOptions) -> Self {
        Self {
            header: MdbHeader {
                major_version: options.major_version,
                minor_version: options.minor_version,
                packet_count: 0,
            },
            ..Default::default()
        }
    }

    /// Read a whole archive from `reader`
    ///
    /// Keys are followed by absolute seeks so packets may be stored in any order
    /// and with gaps between them. Packets of a kind without a decoder are kept as
    /// empty slots; a bad signature or a short stream fails the whole read.
    #[instrument(skip_all, err)]
    pub fn open<R: Read + Seek>(mut reader: R) -> Result<MdbArchive> {
        let start = reader.stream_position()?;
        let signature = Tag::read_le(&mut reader)?;
        if signature != SIGNATURE {
            return Err(FormatError::BadSignature(signature).into());
        }
        reader.seek(SeekFrom::Start(start))?;

        let header = MdbHeader::read(&mut reader)?;
        debug!(
            version = %format_args!("{}.{}", header.major_version, header.minor_version),
            packets = header.packet_count,
            "read header"
        );

        // The count is untrusted, let the stream run out instead of preallocating
        let mut keys = Vec::new();
        for _ in 0..header.packet_count {
            keys.push(PacketKey::read(&mut reader)?);
        }

        let mut packets = Vec::with_capacity(keys.len());
        for (index, key) in keys.iter().enumerate() {
            reader.seek(SeekFrom::Start(start + u64::from(key.offset)))?;

            match Packet::read(&mut reader, key.tag) {
                Ok(packet) => {
                    debug!(index, tag = %key.tag, offset = key.offset, "read packet");
                    packets.push(Some(packet));
                }
                Err(Error::UnsupportedVariant(tag)) => {
                    warn!(index, %tag, "unsupported packet kept as an empty slot");
                    packets.push(None);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(MdbArchive {
            header,
            keys,
            packets,
        })
    }

    /// Read the archive stored at `path`
    pub fn open_path(path: impl AsRef<Path>) -> Result<MdbArchive> {
        let file = File::open(path)?;
        Self::open(BufReader::new(file))
    }

    pub fn header(&self) -> &MdbHeader {
        &self.header
    }

    /// The packet count recorded in the header
    pub fn packet_count(&self) -> u32 {
        self.header.packet_count
    }

    /// Number of slots, including empty ones
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Key table as of the last read or save
    ///
    /// Keys of packets added since then carry a zero offset.
    pub fn keys(&self) -> &[PacketKey] {
        &self.keys
    }

    /// Get a packet by index, `None` when out of range or the slot is empty
    pub fn packet(&self, index: usize) -> Option<&Packet> {
        self.packets.get(index)?.as_ref()
    }

    /// Mutable access to a packet, counts and sizes are recomputed on save
    pub fn packet_mut(&mut self, index: usize) -> Option<&mut Packet> {
        self.packets.get_mut(index)?.as_mut()
    }

    pub fn packets(&self) -> impl Iterator<Item = Option<&Packet>> {
        self.packets.iter().map(Option::as_ref)
    }

    /// Index and tag of every empty slot
    pub fn unsupported(&self) -> impl Iterator<Item = (usize, Tag)> + '_ {
        self.keys
            .iter()
            .zip(&self.packets)
            .enumerate()
            .filter(|(_, (_, packet))| packet.is_none())
            .map(|(index, (key, _))| (index, key.tag))
    }

    /// Empty slots as the [`Warning`]s an import would report
    pub fn warnings(&self) -> impl Iterator<Item = Warning> + '_ {
        self.unsupported()
            .map(|(index, tag)| Warning::UnsupportedVariant { index, tag })
    }

    /// Append a packet, taking ownership of it
    ///
    /// Passing `None` does nothing.
    pub fn add_packet(&mut self, packet: impl Into<Option<Packet>>) {
        let Some(packet) = packet.into() else {
            return;
        };

        self.keys.push(PacketKey {
            tag: packet.tag(),
            offset: 0,
        });
        self.packets.push(Some(packet));
        self.header.packet_count = self.header.packet_count.saturating_add(1);
    }

    /// Drop every empty slot together with its key, returning how many were removed
    pub fn retain_supported(&mut self) -> usize {
        let before = self.packets.len();

        let (keys, packets): (Vec<_>, Vec<_>) = self
            .keys
            .iter()
            .copied()
            .zip(self.packets.drain(..))
            .filter(|(_, packet)| packet.is_some())
            .unzip();
        self.keys = keys;
        self.packets = packets;

        let removed = before - self.packets.len();
        self.header.packet_count = self.packets.len() as u32;
        if removed > 0 {
            debug!(removed, "dropped unsupported packets");
        }
        removed
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::error::{Error, FormatError, Result, Warning};
    use crate::packet::{Hook, Packet, RigidMesh};
    use crate::read::{ArchiveOptions, MdbArchive};
    use crate::types::{Tag, MAJOR_VERSION, MINOR_VERSION};

    #[test]
    fn read_invalid_magic() {
        #[rustfmt::skip]
        let input = [
            b'N', b'W', b'N', b'1',
            0x01, 0x00, 0x0C, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        let archive = MdbArchive::open(Cursor::new(input));
        assert!(matches!(
            archive,
            Err(Error::Format(FormatError::BadSignature(tag))) if tag == Tag::new(b"NWN1")
        ));
    }

    #[test]
    fn read_empty_archive() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            b'N', b'W', b'N', b'2',
            0x01, 0x00, 0x0C, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        let archive = MdbArchive::open(Cursor::new(input))?;
        assert!(archive.is_empty());
        assert_eq!(archive.packet_count(), 0);
        assert_eq!(archive.header().major_version, 1);
        assert_eq!(archive.header().minor_version, 12);
        Ok(())
    }

    #[test]
    fn read_truncated_key_table() {
        #[rustfmt::skip]
        let input = [
            b'N', b'W', b'N', b'2',
            0x01, 0x00, 0x0C, 0x00,
            0x02, 0x00, 0x00, 0x00,
            // Keys
            b'H', b'O', b'O', b'K', 0x1C, 0x00, 0x00, 0x00,
        ];

        let archive = MdbArchive::open(Cursor::new(input));
        assert!(matches!(archive, Err(Error::Format(FormatError::Truncated))));
    }

    #[test]
    fn read_truncated_header() {
        let archive = MdbArchive::open(Cursor::new(b"NWN2\x01\x00"));
        assert!(matches!(archive, Err(Error::Format(FormatError::Truncated))));
    }

    #[traced_test]
    #[test]
    fn unknown_tag_becomes_empty_slot() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            b'N', b'W', b'N', b'2',
            0x01, 0x00, 0x0C, 0x00,
            0x02, 0x00, 0x00, 0x00,
            // Keys
            b'T', b'R', b'R', b'N', 0x1C, 0x00, 0x00, 0x00,
            b'X', b'Y', b'Z', b'W', 0x1C, 0x00, 0x00, 0x00,
        ];

        let archive = MdbArchive::open(Cursor::new(input))?;

        assert_eq!(archive.packet_count(), 2);
        assert_eq!(archive.len(), 2);
        assert!(archive.packet(0).is_none());
        assert_eq!(
            archive.unsupported().collect::<Vec<_>>(),
            vec![(0, Tag::new(b"TRRN")), (1, Tag::new(b"XYZW"))]
        );
        assert_eq!(
            archive.warnings().next(),
            Some(Warning::UnsupportedVariant {
                index: 0,
                tag: Tag::new(b"TRRN")
            })
        );
        assert!(logs_contain("unsupported packet kept as an empty slot"));
        Ok(())
    }

    #[test]
    fn add_packet_appends_provisional_key() {
        let mut archive = MdbArchive::new();
        archive.add_packet(Packet::from(RigidMesh::new("Torso")));
        archive.add_packet(None);
        archive.add_packet(Packet::from(Hook::new("HHM_Weapon_R")));

        assert_eq!(archive.packet_count(), 2);
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.keys()[1].tag, Tag::new(b"HOOK"));
        assert_eq!(archive.keys()[1].offset, 0);
        assert_eq!(archive.packet(0).and_then(|p| p.name()), Some("Torso".into()));
        assert!(archive.packet(2).is_none());
    }

    #[test]
    fn retain_supported_drops_empty_slots() {
        let mut archive = MdbArchive::new();
        archive.add_packet(Packet::from(RigidMesh::new("Torso")));
        archive.keys.insert(0, crate::types::PacketKey::default());
        archive.packets.insert(0, None);
        archive.header.packet_count = 2;

        assert_eq!(archive.retain_supported(), 1);
        assert_eq!(archive.packet_count(), 1);
        assert_eq!(archive.keys()[0].tag, Tag::new(b"RIGD"));
        assert_eq!(archive.unsupported().count(), 0);
    }

    #[test]
    fn options_set_header_version() {
        let archive = MdbArchive::with_options(ArchiveOptions::builder().minor_version(11).build());

        assert_eq!(archive.header().major_version, MAJOR_VERSION);
        assert_eq!(archive.header().minor_version, 11);
        assert_eq!(MdbArchive::new().header().minor_version, MINOR_VERSION);
    }
}
