use std::fmt;
use std::time::Duration;

use camino::Utf8Path;

use crate::error::MvdlError;
use crate::filename::filename;
use crate::filter::{SkipRule, SkipSet};
use crate::history::History;
use crate::mvweb::SearchResult;
use crate::transfer::{TransferClient, TransferInfo, format_bytes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Download,
    RecordOnly,
    DryRun,
}

#[derive(Debug)]
pub enum Disposition {
    Downloaded { bytes: u64, elapsed: Duration },
    WouldDownload,
    Recorded,
    SkippedFilter(SkipRule),
    SkippedDuplicate,
    SkippedExists,
    Failed(MvdlError),
}

impl Disposition {
    pub fn is_failure(&self) -> bool {
        matches!(self, Disposition::Failed(_))
    }

    pub fn is_download(&self) -> bool {
        matches!(self, Disposition::Downloaded { .. })
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Downloaded { bytes, elapsed } => {
                write!(f, "downloaded {} after {:?}", format_bytes(*bytes), elapsed)
            }
            Disposition::WouldDownload => write!(f, "dry run - would download"),
            Disposition::Recorded => write!(f, "recorded without download"),
            Disposition::SkippedFilter(rule) => write!(f, "skipping - {rule}"),
            Disposition::SkippedDuplicate => write!(f, "skipping - found in history"),
            Disposition::SkippedExists => write!(f, "skipping - file already exists"),
            Disposition::Failed(err) => write!(f, "failed: {err}"),
        }
    }
}

pub struct ResultProcessor<'a, T: TransferClient> {
    transfer: &'a T,
    skip: &'a SkipSet,
    download_dir: &'a Utf8Path,
    mode: RunMode,
}

impl<'a, T: TransferClient> ResultProcessor<'a, T> {
    pub fn new(transfer: &'a T, skip: &'a SkipSet, download_dir: &'a Utf8Path, mode: RunMode) -> Self {
        Self {
            transfer,
            skip,
            download_dir,
            mode,
        }
    }

    pub fn process(&self, result: &SearchResult, history: &mut History) -> Disposition {
        if let Some(rule) = self.skip.first_match(result) {
            return Disposition::SkippedFilter(rule.clone());
        }

        if history.exists(&result.id) {
            return Disposition::SkippedDuplicate;
        }

        let target = self.download_dir.join(filename(result));
        if target.as_std_path().exists() {
            if self.mode != RunMode::DryRun {
                history.record(&result.id, &result.title);
            }
            return Disposition::SkippedExists;
        }

        match self.mode {
            RunMode::DryRun => Disposition::WouldDownload,
            RunMode::RecordOnly => {
                history.record(&result.id, &result.title);
                Disposition::Recorded
            }
            RunMode::Download => {
                let Some(url) = result.best_url() else {
                    return Disposition::Failed(MvdlError::NoSourceUrl(result.id.clone()));
                };
                match self.transfer.fetch(url, target.as_std_path()) {
                    Ok(TransferInfo { bytes, elapsed }) => {
                        history.record(&result.id, &result.title);
                        Disposition::Downloaded { bytes, elapsed }
                    }
                    Err(err) => Disposition::Failed(err),
                }
            }
        }
    }
}
