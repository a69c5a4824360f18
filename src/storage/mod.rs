use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::Result;

/// Object-storage handle for raw and processed parquet datasets.
///
/// Keys are relative paths (`raw/games_detail.parquet`) resolved against the
/// bucket root. Construct once per run and pass by reference.
#[derive(Debug, Clone)]
pub struct Bucket {
    root: PathBuf,
}

impl Bucket {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Bucket { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of `key` inside the bucket.
    pub fn path_of(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Lazily scan a parquet dataset. Nothing is read until the plan is collected.
    pub fn scan_parquet(&self, key: &str) -> Result<LazyFrame> {
        let path = self.path_of(key);
        info!("Scanning Parquet dataset: {}", path.display());
        Ok(LazyFrame::scan_parquet(&path, ScanArgsParquet::default())?)
    }

    /// Eagerly read a parquet dataset.
    pub fn read_parquet(&self, key: &str) -> Result<DataFrame> {
        let path = self.path_of(key);
        let file = File::open(&path)?;
        Ok(ParquetReader::new(file).finish()?)
    }

    /// Write `df` to `key` with Snappy compression, replacing any previous file.
    ///
    /// The file is written next to its destination and renamed into place, so
    /// a failed write never leaves a truncated dataset behind.
    pub fn write_parquet(&self, df: &mut DataFrame, key: &str) -> Result<String> {
        let staged = self.stage(df, key)?;
        let committed = match staged.commit() {
            Ok(committed) => committed,
            Err(e) => {
                staged.discard();
                return Err(e);
            }
        };
        committed.finish();

        let output = committed.output.display().to_string();
        info!("Data written to: {}", output);
        Ok(output)
    }

    /// Write several datasets as one unit: either every key is replaced or
    /// every key keeps its previous content.
    pub fn write_parquet_all(&self, outputs: Vec<(&mut DataFrame, &str)>) -> Result<()> {
        let mut staged = Vec::with_capacity(outputs.len());
        for (df, key) in outputs {
            match self.stage(df, key) {
                Ok(file) => staged.push(file),
                Err(e) => {
                    staged.iter().for_each(StagedFile::discard);
                    return Err(e);
                }
            }
        }

        let mut committed = Vec::with_capacity(staged.len());
        for (i, file) in staged.iter().enumerate() {
            match file.commit() {
                Ok(done) => committed.push(done),
                Err(e) => {
                    warn!("Rolling back {} committed dataset(s)", committed.len());
                    committed.iter().rev().for_each(CommittedFile::rollback);
                    staged[i..].iter().for_each(StagedFile::discard);
                    return Err(e);
                }
            }
        }

        for done in &committed {
            done.finish();
            info!("Data written to: {}", done.output.display());
        }
        Ok(())
    }

    /// Write `df` to the temporary sibling of `key`.
    fn stage(&self, df: &mut DataFrame, key: &str) -> Result<StagedFile> {
        let output = self.path_of(key);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        info!("Writing {} rows to {}", df.height(), output.display());

        let tmp = output.with_extension("parquet.tmp");
        if let Err(e) = write_file(df, &tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(StagedFile { tmp, output })
    }
}

/// A dataset fully written to its temporary path, not yet in place.
struct StagedFile {
    tmp: PathBuf,
    output: PathBuf,
}

impl StagedFile {
    /// Move the temporary file into place. A previous file is kept aside
    /// until the caller finishes or rolls back.
    fn commit(&self) -> Result<CommittedFile> {
        let backup = if self.output.is_file() {
            let backup = self.output.with_extension("parquet.bak");
            fs::rename(&self.output, &backup)?;
            Some(backup)
        } else {
            None
        };

        if let Err(e) = fs::rename(&self.tmp, &self.output) {
            if let Some(backup) = &backup {
                let _ = fs::rename(backup, &self.output);
            }
            return Err(e.into());
        }
        Ok(CommittedFile {
            output: self.output.clone(),
            backup,
        })
    }

    fn discard(&self) {
        let _ = fs::remove_file(&self.tmp);
    }
}

struct CommittedFile {
    output: PathBuf,
    backup: Option<PathBuf>,
}

impl CommittedFile {
    /// Restore the previous file, or remove the new one when there was none.
    fn rollback(&self) {
        let restored = match &self.backup {
            Some(backup) => fs::rename(backup, &self.output),
            None => fs::remove_file(&self.output),
        };
        if let Err(e) = restored {
            warn!("Failed to roll back {}: {}", self.output.display(), e);
        }
    }

    fn finish(&self) {
        if let Some(backup) = &self.backup {
            let _ = fs::remove_file(backup);
        }
    }
}

fn write_file(df: &mut DataFrame, path: &Path) -> Result<u64> {
    let file = File::create(path)?;
    let size = ParquetWriter::new(file)
        .with_compression(ParquetCompression::Snappy)
        .finish(df)?;
    Ok(size)
}
