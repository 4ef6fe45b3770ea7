//! Write-ahead log for `DictionaryStore`.
//!
//! Each transaction appends one frame `[len u32 LE][crc32 u32 LE][bincode]`
//! instead of rewriting the whole store. A checkpoint writes the full state
//! and truncates the log. Replay stops at the first truncated or corrupt
//! frame, so a torn final write loses only that transaction.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use super::store::{DictionaryStore, Transaction};

const COMPACT_THRESHOLD: usize = 500;
const FRAME_HEADER: usize = 8;

pub struct StoreWal {
    checkpoint_path: PathBuf,
    wal_path: PathBuf,
    /// Kept open in append mode between transactions.
    file: Option<File>,
    /// Frames written since the last checkpoint.
    entry_count: usize,
}

impl StoreWal {
    /// WAL handle for the checkpoint at `checkpoint_path`; the log lives at
    /// the same path with `.wal` appended.
    pub fn new(checkpoint_path: &Path) -> Self {
        let mut wal_name = OsString::from(checkpoint_path.as_os_str());
        wal_name.push(".wal");
        Self {
            checkpoint_path: checkpoint_path.to_path_buf(),
            wal_path: PathBuf::from(wal_name),
            file: None,
            entry_count: 0,
        }
    }

    /// Replay logged transactions into `store`. Returns the number replayed.
    pub(crate) fn replay(&mut self, store: &mut DictionaryStore) -> io::Result<usize> {
        let data = match fs::read(&self.wal_path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.entry_count = 0;
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        let mut count = 0;
        let mut pos = 0;
        while let Some((tx, next)) = read_frame(&data, pos) {
            store.apply(tx);
            count += 1;
            pos = next;
        }
        if pos < data.len() {
            warn!(
                offset = pos,
                len = data.len(),
                "WAL tail truncated or corrupt, ignored"
            );
        }

        self.entry_count = count;
        Ok(count)
    }

    pub(crate) fn append(&mut self, tx: &Transaction) -> io::Result<()> {
        let payload = bincode::serialize(tx).map_err(io::Error::other)?;
        let length = u32::try_from(payload.len()).map_err(io::Error::other)?;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(FRAME_HEADER + payload.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&payload);

        let file = self.open_file()?;
        file.write_all(&frame)?;
        file.flush()?;

        self.entry_count += 1;
        Ok(())
    }

    fn open_file(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            if let Some(parent) = self.wal_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let f = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.wal_path)?;
            self.file = Some(f);
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("WAL file not open"))
    }

    pub fn needs_compact(&self) -> bool {
        self.entry_count >= COMPACT_THRESHOLD
    }

    /// Truncate the log. Call after a checkpoint has been written.
    pub fn truncate_wal(&mut self) -> io::Result<()> {
        self.file = None;
        File::create(&self.wal_path)?;
        self.entry_count = 0;
        Ok(())
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }
}

/// Decode the frame at `pos`, returning it with the offset of the next one.
fn read_frame(data: &[u8], pos: usize) -> Option<(Transaction, usize)> {
    let header = data.get(pos..pos + FRAME_HEADER)?;
    let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if length == 0 {
        return None;
    }
    let start = pos + FRAME_HEADER;
    let payload = data.get(start..start + length)?;
    if crc32fast::hash(payload) != expected_crc {
        return None;
    }
    let tx = bincode::deserialize::<Transaction>(payload).ok()?;
    Some((tx, start + length))
}
