use std::fs;

use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::MvdlError;
use crate::filter::SkipSet;
use crate::history::History;
use crate::mvweb::{QueryInfo, SearchClient};
use crate::processor::{Disposition, ResultProcessor, RunMode};
use crate::transfer::TransferClient;

#[derive(Debug)]
pub struct ItemReport {
    pub id: String,
    pub title: String,
    pub disposition: Disposition,
}

#[derive(Debug)]
pub struct RunReport {
    pub name: String,
    pub query_info: QueryInfo,
    pub items: Vec<ItemReport>,
}

impl RunReport {
    pub fn downloaded(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.disposition.is_download())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.disposition.is_failure())
            .count()
    }
}

#[derive(Debug)]
pub struct ConfigOutcome {
    pub name: String,
    pub result: Result<RunReport, MvdlError>,
}

pub struct JobRunner<S: SearchClient, T: TransferClient> {
    search: S,
    transfer: T,
    mode: RunMode,
}

impl<S: SearchClient, T: TransferClient> JobRunner<S, T> {
    pub fn new(search: S, transfer: T, mode: RunMode) -> Self {
        Self {
            search,
            transfer,
            mode,
        }
    }

    pub fn run_all(&self, configs: &[Config]) -> Vec<ConfigOutcome> {
        configs
            .iter()
            .map(|config| {
                info!("running config '{}'", config.name);
                let result = self.run(config);
                if let Err(err) = &result {
                    error!("could not run config {}: {err}", config.name);
                }
                ConfigOutcome {
                    name: config.name.clone(),
                    result,
                }
            })
            .collect()
    }

    pub fn run(&self, config: &Config) -> Result<RunReport, MvdlError> {
        let skip = SkipSet::compile(&config.skip_if)?;
        let request = config.to_request();
        let body = self.search.search(&request)?.result;
        info!(
            "  results: {} of {} total",
            body.query_info.result_count, body.query_info.total_results
        );

        let mut history = History::load(&config.history_file)?;
        if self.mode != RunMode::DryRun {
            fs::create_dir_all(config.download_to.as_std_path())
                .map_err(|err| MvdlError::Filesystem(err.to_string()))?;
        }

        let processor =
            ResultProcessor::new(&self.transfer, &skip, &config.download_to, self.mode);
        let mut items = Vec::with_capacity(body.results.len());
        for result in &body.results {
            let aired = result
                .aired_at()
                .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            debug!(
                "  checking '{}' (ID: {}, aired {aired})",
                result.title, result.id
            );
            let disposition = processor.process(result, &mut history);
            info!("    '{}': {disposition}", result.title);
            items.push(ItemReport {
                id: result.id.clone(),
                title: result.title.clone(),
                disposition,
            });
        }

        if self.mode != RunMode::DryRun {
            history.flush()?;
        }

        Ok(RunReport {
            name: config.name.clone(),
            query_info: body.query_info,
            items,
        })
    }
}
