// src/investigation/config.rs

//! Settings for an investigation, passed in by the caller.

use crate::common::Host;
use crate::readers::blockreader::{BlockSz, BLOCKSZ_DEF, READ_BLOCK_LRU_CACHE_SZ};

use std::time::Duration;

/// Default time allowed for all scan tasks of one investigation.
pub const TIMEOUT_DEF: Duration = Duration::from_secs(300);

/// Default prefix of scan thread names.
pub const THREAD_NAME_PREFIX_DEF: &str = "lcs_scan_";

/// Host names that refer to this machine.
pub const LOCAL_HOSTS_DEF: [&str; 4] = ["localhost", "127.0.0.1", "::1", ""];

/// Settings for an investigation.
#[derive(Clone, Debug, PartialEq)]
pub struct InvestigationConfig {
    /// Block size used to read files.
    pub blocksz: BlockSz,
    /// Count of blocks cached per file.
    pub lru_cache_sz: usize,
    /// Time allowed for all scan tasks; `None` waits for them however long
    /// they take.
    pub timeout: Option<Duration>,
    /// Host names that refer to this machine. Only files on these hosts are
    /// scanned.
    pub local_hosts: Vec<Host>,
    /// Scan threads are named with this prefix and the task number.
    pub thread_name_prefix: String,
}

impl Default for InvestigationConfig {
    fn default() -> Self {
        InvestigationConfig {
            blocksz: BLOCKSZ_DEF,
            lru_cache_sz: READ_BLOCK_LRU_CACHE_SZ,
            timeout: Some(TIMEOUT_DEF),
            local_hosts: LOCAL_HOSTS_DEF
                .iter()
                .map(|h| Host::from(*h))
                .collect(),
            thread_name_prefix: String::from(THREAD_NAME_PREFIX_DEF),
        }
    }
}

impl InvestigationConfig {
    pub fn is_local_host(
        &self,
        host: &str,
    ) -> bool {
        self.local_hosts
            .iter()
            .any(|h| h == host)
    }

    /// Do `a` and `b` name the same host? All local host names are the same
    /// host.
    pub fn same_host(
        &self,
        a: &str,
        b: &str,
    ) -> bool {
        a == b || (self.is_local_host(a) && self.is_local_host(b))
    }
}
