//! Configuration archive format.
//!
//! ```text
//! archive := "TCAR" u16 version entry*
//! entry   := 1 path:str                  directory
//!          | 2 path:str u64 len bytes     file
//! str     := u32 len utf8
//! ```
//!
//! Integers are little-endian. Entries run until end of input. Paths are
//! relative with `/` separators; absolute paths and `..` are rejected on
//! both sides.
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Component, Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::store::error::StoreError;
use crate::utils::fs::{find_dirs, find_files};

const MAGIC: &[u8; 4] = b"TCAR";
const FORMAT_VERSION: u16 = 1;

const ENTRY_DIR: u8 = 1;
const ENTRY_FILE: u8 = 2;

/// Relative, `..`-free path; `None` otherwise.
fn safe_relative(entry: &str) -> Option<PathBuf> {
    if entry.is_empty() || entry.starts_with('/') || entry.starts_with('\\') {
        return None;
    }
    let path = Path::new(entry);
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        .then(|| path.to_path_buf())
}

/// Streaming archive writer.
pub struct ArchiveWriter<W: Write> {
    out: W,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(mut out: W) -> io::Result<Self> {
        out.write_all(MAGIC)?;
        out.write_u16::<LittleEndian>(FORMAT_VERSION)?;
        Ok(Self { out })
    }

    pub fn add_dir(&mut self, path: &str) -> io::Result<()> {
        check_entry(path)?;
        self.out.write_u8(ENTRY_DIR)?;
        write_path(&mut self.out, path)
    }

    pub fn add_file(&mut self, path: &str, contents: &[u8]) -> io::Result<()> {
        check_entry(path)?;
        self.out.write_u8(ENTRY_FILE)?;
        write_path(&mut self.out, path)?;
        self.out.write_u64::<LittleEndian>(contents.len() as u64)?;
        self.out.write_all(contents)
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

fn check_entry(path: &str) -> io::Result<()> {
    if safe_relative(path).is_none() {
        return Err(io::Error::new(ErrorKind::InvalidInput, format!("unsafe archive path '{}'", path)));
    }
    Ok(())
}

fn write_path<W: Write>(out: &mut W, path: &str) -> io::Result<()> {
    out.write_u32::<LittleEndian>(path.len() as u32)?;
    out.write_all(path.as_bytes())
}

fn relative_entry(root: &Path, path: &Path) -> io::Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| io::Error::new(ErrorKind::InvalidInput, e))?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    parts
        .map(|p| p.join("/"))
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidData, format!("non UTF-8 path {}", path.display())))
}

/// Write every directory and file below `dir` into a new archive at `out`.
pub fn pack_directory(dir: &Path, out: &Path) -> Result<(), StoreError> {
    if !dir.is_dir() {
        return Err(StoreError::DirectoryNotFound(dir.to_path_buf()));
    }
    let io_err = |e: io::Error, operation: &str| StoreError::io(e, operation, out.to_path_buf());

    let file = File::create(out).map_err(|e| io_err(e, "create"))?;
    let mut writer = ArchiveWriter::new(BufWriter::new(file)).map_err(|e| io_err(e, "write_header"))?;

    for sub_dir in find_dirs(dir).map_err(|e| StoreError::io(e, "read_dir", dir.to_path_buf()))? {
        let entry = relative_entry(dir, &sub_dir).map_err(|e| io_err(e, "pack"))?;
        writer.add_dir(&entry).map_err(|e| io_err(e, "write_entry"))?;
    }
    let files = find_files(dir, &|_: &Path| true).map_err(|e| StoreError::io(e, "read_dir", dir.to_path_buf()))?;
    for path in files {
        // Skip the archive itself when packing in place
        if path == out {
            continue;
        }
        let entry = relative_entry(dir, &path).map_err(|e| io_err(e, "pack"))?;
        let contents = fs::read(&path).map_err(|e| StoreError::io(e, "read", path.clone()))?;
        writer.add_file(&entry, &contents).map_err(|e| io_err(e, "write_entry"))?;
    }
    writer.finish().map_err(|e| io_err(e, "flush"))?;
    log::debug!("Packed {} into {}", dir.display(), out.display());
    Ok(())
}

/// Unpack `archive` into the existing directory `dest`. Returns the files written.
pub fn unpack(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let file = File::open(archive).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StoreError::FileNotFound(archive.to_path_buf()),
        _ => StoreError::io(e, "open", archive.to_path_buf()),
    })?;
    let mut reader = BufReader::new(file);
    let invalid = |reason: String| StoreError::archive(archive, reason);
    let truncated = |e: io::Error| StoreError::archive(archive, format!("truncated: {}", e));

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(truncated)?;
    if &magic != MAGIC {
        return Err(invalid("not a configuration archive".to_string()));
    }
    let version = reader.read_u16::<LittleEndian>().map_err(truncated)?;
    if version != FORMAT_VERSION {
        return Err(invalid(format!("unsupported format version {}", version)));
    }

    let mut written = Vec::new();
    loop {
        let kind = match reader.read_u8() {
            Ok(kind) => kind,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(StoreError::io(e, "read", archive.to_path_buf())),
        };
        let path_len = reader.read_u32::<LittleEndian>().map_err(truncated)? as u64;
        let mut raw = Vec::new();
        (&mut reader).take(path_len).read_to_end(&mut raw).map_err(truncated)?;
        if raw.len() as u64 != path_len {
            return Err(invalid("truncated entry path".to_string()));
        }
        let entry = String::from_utf8(raw).map_err(|e| invalid(format!("entry path is not UTF-8: {}", e)))?;
        let relative = safe_relative(&entry).ok_or_else(|| invalid(format!("unsafe entry path '{}'", entry)))?;
        let target = dest.join(relative);

        match kind {
            ENTRY_DIR => {
                fs::create_dir_all(&target).map_err(|e| StoreError::io(e, "create_dir_all", target.clone()))?;
            }
            ENTRY_FILE => {
                let len = reader.read_u64::<LittleEndian>().map_err(truncated)?;
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| StoreError::io(e, "create_dir_all", parent.to_path_buf()))?;
                }
                let mut out = File::create(&target).map_err(|e| StoreError::io(e, "create", target.clone()))?;
                let copied = io::copy(&mut (&mut reader).take(len), &mut out)
                    .map_err(|e| StoreError::io(e, "write", target.clone()))?;
                if copied != len {
                    return Err(invalid(format!("truncated contents of '{}'", entry)));
                }
                written.push(target);
            }
            other => return Err(invalid(format!("unknown entry kind {}", other))),
        }
    }
    Ok(written)
}
