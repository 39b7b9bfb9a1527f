// src/investigation/logtype.rs

//! A [`LogType`] is a named class of log files; its [`FileLocator`s] say
//! where those files are.
//!
//! [`FileLocator`s]: crate::investigation::logtype::FileLocator

use crate::common::{FPath, Host, LineSource};
use crate::error::{Error, Result};
use crate::investigation::config::InvestigationConfig;
use crate::readers::helpers::{fpath_to_path, path_is_file, path_to_fpath};

use std::path::Path;

use ::serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// What the `path` of a [`FileLocator`] names.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocatorKind {
    /// one file
    #[default]
    File,
    /// every regular file beneath a directory
    Directory,
}

impl LocatorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LocatorKind::File => "file",
            LocatorKind::Directory => "directory",
        }
    }
}

/// Where files of a [`LogType`] are found.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FileLocator {
    pub host: Host,
    pub path: FPath,
    #[serde(default)]
    pub kind: LocatorKind,
}

impl FileLocator {
    pub fn new(
        host: &str,
        path: &str,
        kind: LocatorKind,
    ) -> FileLocator {
        FileLocator {
            host: Host::from(host),
            path: FPath::from(path),
            kind,
        }
    }

    fn unsupported(&self) -> Error {
        Error::UnsupportedLocator {
            kind: String::from(self.kind.as_str()),
            host: self.host.clone(),
            path: self.path.clone(),
        }
    }

    /// The files this locator names, in file name order.
    ///
    /// A locator on a host not in [`InvestigationConfig::local_hosts`] is
    /// [`Error::UnsupportedLocator`]. A `File` locator naming a directory,
    /// FIFO or device is [`Error::NotRegularFile`].
    pub fn sources(
        &self,
        config: &InvestigationConfig,
    ) -> Result<Vec<LineSource>> {
        defn!("({:?})", self);
        if !config.is_local_host(&self.host) {
            defx!("remote host {:?}", self.host);
            return Err(self.unsupported());
        }
        match self.kind {
            LocatorKind::File => {
                // a missing file is reported by its scan
                if let Ok(metadata) = std::fs::metadata(fpath_to_path(&self.path)) {
                    if !metadata.is_file() {
                        defx!("not a regular file {:?}", self.path);
                        return Err(Error::NotRegularFile(self.path.clone()));
                    }
                }
                defx!("file {:?}", self.path);
                Ok(vec![LineSource::new(&self.host, &self.path)])
            }
            LocatorKind::Directory => {
                let mut sources: Vec<LineSource> = Vec::new();
                for entry in ::walkdir::WalkDir::new(self.path.as_str())
                    .follow_links(true)
                    .sort_by_file_name()
                    .same_file_system(true)
                {
                    let entry = match entry {
                        Ok(val) => val,
                        Err(err) => {
                            defx!("WalkDir error {}", err);
                            return Err(Error::io(&self.path, err.into()));
                        }
                    };
                    if !entry.file_type().is_file() && !path_is_file(entry.path()) {
                        continue;
                    }
                    sources.push(LineSource {
                        host: self.host.clone(),
                        path: path_to_fpath(entry.path()),
                    });
                }
                defx!("{} files beneath {:?}", sources.len(), self.path);

                Ok(sources)
            }
        }
    }

    /// Is `source` one of the files this locator names?
    pub fn covers(
        &self,
        source: &LineSource,
        config: &InvestigationConfig,
    ) -> bool {
        if !config.same_host(&self.host, &source.host) {
            return false;
        }
        match self.kind {
            LocatorKind::File => fpath_to_path(&self.path) == fpath_to_path(&source.path),
            LocatorKind::Directory => Path::new(&source.path).starts_with(fpath_to_path(&self.path)),
        }
    }
}

/// A named class of log files sharing one set of patterns.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LogType {
    pub name: String,
    #[serde(default)]
    pub file_locators: Vec<FileLocator>,
}

impl LogType {
    pub fn new(
        name: &str,
        file_locators: Vec<FileLocator>,
    ) -> LogType {
        LogType {
            name: String::from(name),
            file_locators,
        }
    }

    /// Does any locator cover `source`?
    pub fn covers(
        &self,
        source: &LineSource,
        config: &InvestigationConfig,
    ) -> bool {
        self.file_locators
            .iter()
            .any(|locator| locator.covers(source, config))
    }

    /// All files of this log type, each once. Locators that fail are
    /// returned as errors; the others still contribute.
    pub fn sources(
        &self,
        config: &InvestigationConfig,
    ) -> (Vec<LineSource>, Vec<Error>) {
        let mut sources: Vec<LineSource> = Vec::new();
        let mut errors: Vec<Error> = Vec::new();
        for locator in self.file_locators.iter() {
            match locator.sources(config) {
                Ok(found) => {
                    for source in found.into_iter() {
                        if !sources.contains(&source) {
                            sources.push(source);
                        }
                    }
                }
                Err(err) => errors.push(err),
            }
        }

        (sources, errors)
    }
}
