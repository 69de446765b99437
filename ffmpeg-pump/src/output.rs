use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    error::{Error, Result},
    packet::RawPacket,
};

/// MPEG sequence end code, understood by raw elementary-stream readers.
pub const END_OF_SEQUENCE: [u8; 4] = [0x00, 0x00, 0x01, 0xb7];

/// Raw bitstream output: encoded packets written back to back, no container.
pub struct BitstreamWriter {
    inner: BufWriter<File>,
    path: PathBuf,
    packets_written: u64,
    bytes_written: u64,
}

impl BitstreamWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| Error::OutputCreate {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("output created: {}", path.display());
        Ok(Self {
            inner: BufWriter::new(file),
            path: path.to_path_buf(),
            packets_written: 0,
            bytes_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn write_packet(&mut self, packet: &RawPacket) -> Result<()> {
        let data = packet.data();
        self.inner.write_all(data).map_err(Error::Write)?;
        self.packets_written += 1;
        self.bytes_written += data.len() as u64;
        log::trace!(
            "packet written: pts: {:?}, size: {}, key: {}",
            packet.pts(),
            data.len(),
            packet.is_key()
        );
        Ok(())
    }

    /// Append the end-of-sequence marker and close the file.
    pub fn finish(mut self) -> Result<u64> {
        self.inner.write_all(&END_OF_SEQUENCE).map_err(Error::Write)?;
        self.bytes_written += END_OF_SEQUENCE.len() as u64;
        let file = self
            .inner
            .into_inner()
            .map_err(|e| Error::Write(e.into_error()))?;
        file.sync_all().map_err(Error::Write)?;
        log::info!(
            "output finished: {}, {} packets, {} bytes",
            self.path.display(),
            self.packets_written,
            self.bytes_written
        );
        Ok(self.bytes_written)
    }
}
