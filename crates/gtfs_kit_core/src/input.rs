use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{ErrorKind, GtfsError, Result};
use crate::feed::AGENCY_FILE;

/// Opens the named tables of a feed.
///
/// A stream is only borrowed for as long as one table is being read.
pub trait FileSource {
    /// Opens `name`, or returns `Ok(None)` if the feed has no such file.
    fn open(&mut self, name: &str) -> Result<Option<Box<dyn Read + '_>>>;

    /// Human-readable location of the feed, for logs.
    fn describe(&self) -> String;
}

/// A feed stored as loose files in a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileSource for DirectorySource {
    fn open(&mut self, name: &str) -> Result<Option<Box<dyn Read + '_>>> {
        let path = self.root.join(name);
        if !path.is_file() {
            return Ok(None);
        }
        let file = File::open(&path).map_err(|err| {
            GtfsError::new(ErrorKind::Decode, format!("could not open file: {}", err))
                .in_file(path.display().to_string())
                .with_source(err)
        })?;
        Ok(Some(Box::new(BufReader::new(file))))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// A feed packed into a zip archive, either at the archive root or inside a
/// single top-level folder.
pub struct ZipSource<R: Read + Seek> {
    archive: ZipArchive<R>,
    prefix: String,
    label: String,
}

impl ZipSource<BufReader<File>> {
    pub fn from_path(path: &Path) -> Result<Self> {
        let label = path.display().to_string();
        let file = File::open(path).map_err(|err| {
            GtfsError::new(ErrorKind::Decode, format!("could not open archive: {}", err))
                .in_file(label.clone())
                .with_source(err)
        })?;
        Self::new(BufReader::new(file), label)
    }
}

impl<R: Read + Seek> ZipSource<R> {
    pub fn new(reader: R, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        let archive = ZipArchive::new(reader).map_err(|err| {
            GtfsError::new(ErrorKind::Decode, format!("could not read archive: {}", err))
                .in_file(label.clone())
                .with_source(err)
        })?;
        let prefix = detect_prefix(archive.file_names());
        Ok(Self {
            archive,
            prefix,
            label,
        })
    }
}

impl<R: Read + Seek> FileSource for ZipSource<R> {
    fn open(&mut self, name: &str) -> Result<Option<Box<dyn Read + '_>>> {
        let entry_name = format!("{}{}", self.prefix, name);
        match self.archive.by_name(&entry_name) {
            Ok(entry) => Ok(Some(Box::new(entry))),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(err) => Err(GtfsError::new(
                ErrorKind::Decode,
                format!("could not read archive entry: {}", err),
            )
            .in_file(name)
            .with_source(err)),
        }
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// Folder prefix under which the archive keeps its tables, `""` for the root.
fn detect_prefix<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names
        .filter_map(|name| name.strip_suffix(AGENCY_FILE))
        .filter(|prefix| {
            prefix.is_empty() || (prefix.ends_with('/') && prefix.matches('/').count() == 1)
        })
        .min_by_key(|prefix| prefix.len())
        .unwrap_or("")
        .to_string()
}

/// Picks a directory or zip source for `path`.
pub fn open_source(path: &Path) -> Result<Box<dyn FileSource>> {
    if !path.exists() {
        return Err(GtfsError::file_not_found(path.display().to_string()));
    }
    if path.is_dir() {
        Ok(Box::new(DirectorySource::new(path)))
    } else {
        Ok(Box::new(ZipSource::from_path(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_at_root() {
        let names = ["agency.txt", "stops.txt"];
        assert_eq!(detect_prefix(names.into_iter()), "");
    }

    #[test]
    fn prefix_in_single_folder() {
        let names = ["gtfs/", "gtfs/agency.txt", "gtfs/stops.txt"];
        assert_eq!(detect_prefix(names.into_iter()), "gtfs/");
    }

    #[test]
    fn nested_folders_are_ignored() {
        let names = ["a/b/agency.txt"];
        assert_eq!(detect_prefix(names.into_iter()), "");
    }

    #[test]
    fn missing_path_is_file_not_found() {
        let err = match open_source(Path::new("/definitely/not/here/feed.zip")) {
            Ok(_) => panic!("expected an error"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }
}
