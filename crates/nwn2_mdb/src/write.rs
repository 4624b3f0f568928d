//! Types for writing MDB archives
//!

use std::io::{Cursor, Write};
use std::path::Path;

use binrw::BinWrite;
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::packet::Packet;
use crate::read::MdbArchive;
use crate::types::{MdbHeader, PacketKey, HEADER_SIZE, KEY_SIZE};

/// A fully serialized archive that has not been committed yet
struct Encoded {
    header: MdbHeader,
    keys: Vec<PacketKey>,
    bytes: Vec<u8>,
}

impl MdbArchive {
    /// Key table the packets would be written with
    ///
    /// Bodies follow the key table back to back in slot order, each offset is the
    /// previous offset plus the previous packet's current size.
    pub fn layout(&self) -> Result<Vec<PacketKey>> {
        let mut offset = HEADER_SIZE + KEY_SIZE * self.packets.len();

        self.packets
            .iter()
            .enumerate()
            .map(|(index, slot)| {
                let packet = slot.as_ref().ok_or(Error::EmptySlot(index))?;
                let key = PacketKey {
                    tag: packet.tag(),
                    offset: u32::try_from(offset).map_err(|_| Error::ArchiveTooLarge(offset))?,
                };
                offset += packet.size();
                Ok(key)
            })
            .collect()
    }

    fn encode(&self) -> Result<Encoded> {
        let keys = self.layout()?;
        let header = MdbHeader {
            packet_count: u32::try_from(keys.len())
                .map_err(|_| Error::ArchiveTooLarge(keys.len()))?,
            ..self.header
        };

        let total = HEADER_SIZE
            + KEY_SIZE * keys.len()
            + self.packets.iter().flatten().map(Packet::size).sum::<usize>();
        let mut buffer = Cursor::new(Vec::with_capacity(total));

        header.write(&mut buffer)?;
        for key in &keys {
            key.write(&mut buffer)?;
        }

        for (key, packet) in keys.iter().zip(self.packets.iter().flatten()) {
            debug_assert_eq!(buffer.position(), u64::from(key.offset));
            packet.write(&mut buffer)?;
            debug!(tag = %key.tag, offset = key.offset, size = packet.size(), "wrote packet");
        }

        Ok(Encoded {
            header,
            keys,
            bytes: buffer.into_inner(),
        })
    }

    fn commit(&mut self, encoded: Encoded) {
        self.header = encoded.header;
        self.keys = encoded.keys;
    }

    /// Write the whole archive to `writer`
    ///
    /// The archive is serialized in memory first. Keys and the packet count are
    /// only updated once every byte has been written and flushed, a failed save
    /// leaves them as they were.
    #[instrument(skip_all, err)]
    pub fn save<W: Write>(&mut self, mut writer: W) -> Result<()> {
        let encoded = self.encode()?;

        writer.write_all(&encoded.bytes)?;
        writer.flush()?;

        debug!(packets = encoded.keys.len(), bytes = encoded.bytes.len(), "saved archive");
        self.commit(encoded);
        Ok(())
    }

    /// Write the archive to `path`, replacing any existing file
    ///
    /// The data goes to a temporary file in the same directory which is then
    /// renamed over `path`, a failed save never leaves a partial archive behind.
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn save_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let encoded = self.encode()?;

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&encoded.bytes)?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| e.error)?;

        debug!(packets = encoded.keys.len(), bytes = encoded.bytes.len(), "saved archive");
        self.commit(encoded);
        Ok(())
    }
}
