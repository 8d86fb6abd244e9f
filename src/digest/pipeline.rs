use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::{FanInOrder, PipelineConfig, ReportWindow};
use crate::digest::classifier::{Classification, Classifier};
use crate::digest::enricher::Enricher;
use crate::digest::fetcher::Fetcher;
use crate::error::{Error, Result};
use crate::github::PullRequestApi;
use crate::models::{Buckets, PullRequest};

/// Producers wait for the aggregator once this many records are queued.
const FAN_IN_CAPACITY: usize = 1;

/// A record on its way to the aggregator, tagged with where it came from.
struct Envelope {
    page: u32,
    position: usize,
    pr: PullRequest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub pages: u32,
    pub seen: usize,
    pub discarded: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub buckets: Buckets,
    pub stats: RunStats,
}

impl PipelineOutput {
    fn record(&mut self, classifier: &Classifier, pr: PullRequest) {
        self.stats.seen += 1;
        match classifier.classify(&pr) {
            Classification::Bucket(bucket) => {
                tracing::trace!("#{} -> {}", pr.number, bucket);
                self.buckets.push(bucket, pr);
            }
            Classification::Discard(reason) => {
                tracing::trace!("#{} discarded ({:?})", pr.number, reason);
                self.stats.discarded += 1;
            }
        }
    }
}

/// Scans pages concurrently, enriches every record and funnels it into a
/// single classifying aggregator.
///
/// The first failure cancels every other page task and the run returns
/// that error with no partial buckets.
pub struct Pipeline {
    fetcher: Fetcher,
    enricher: Enricher,
    classifier: Classifier,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(api: Arc<dyn PullRequestApi>, window: ReportWindow, config: PipelineConfig) -> Self {
        Self {
            fetcher: Fetcher::new(api.clone(), config.page_size),
            enricher: Enricher::new(api),
            classifier: Classifier::new(config.label.clone(), &window),
            config,
        }
    }

    pub async fn run(&self) -> Result<PipelineOutput> {
        tracing::info!(
            "Scanning {} pages with up to {} in flight",
            self.config.pages,
            self.config.concurrency_limit
        );

        let cancel = CancellationToken::new();
        let result = match tokio::time::timeout(self.config.run_timeout, self.collect(&cancel)).await
        {
            Ok(result) => result,
            Err(_) => {
                cancel.cancel();
                Err(Error::Timeout(self.config.run_timeout))
            }
        };

        match &result {
            Ok(output) => tracing::info!(
                "Classified {} pull requests from {} pages, {} discarded",
                output.stats.seen,
                output.stats.pages,
                output.stats.discarded
            ),
            Err(e) => tracing::warn!("Run failed: {}", e),
        }

        result
    }

    async fn collect(&self, cancel: &CancellationToken) -> Result<PipelineOutput> {
        let (tx, rx) = mpsc::channel(FAN_IN_CAPACITY);
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency_limit.max(1)));
        let progress = self.progress_bar();

        let mut tasks = JoinSet::new();
        for page in 1..=self.config.pages {
            tasks.spawn(scan_page(
                page,
                self.fetcher.clone(),
                self.enricher.clone(),
                tx.clone(),
                cancel.clone(),
                semaphore.clone(),
            ));
        }
        // The channel closes once the last page task drops its sender.
        drop(tx);

        let producers = async {
            let mut first_error: Option<Error> = None;
            while let Some(joined) = tasks.join_next().await {
                let err = match joined {
                    Ok(Ok(())) => {
                        progress.inc(1);
                        continue;
                    }
                    Ok(Err(e)) => e,
                    Err(e) => Error::TaskFailed(e.to_string()),
                };

                if !cancel.is_cancelled() {
                    tracing::debug!("Cancelling remaining page tasks: {}", err);
                    cancel.cancel();
                }
                // Tasks that merely observed the cancellation never mask the cause.
                let replace = match &first_error {
                    None => true,
                    Some(Error::Cancelled) => !matches!(err, Error::Cancelled),
                    Some(_) => false,
                };
                if replace {
                    first_error = Some(err);
                }
            }
            first_error
        };

        let (first_error, mut output) =
            tokio::join!(producers, aggregate(&self.classifier, self.config.ordering, rx));
        progress.finish_and_clear();

        if let Some(err) = first_error {
            return Err(err);
        }

        output.stats.pages = self.config.pages;
        Ok(output)
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(self.config.pages as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

/// Drains the fan-in channel until every producer has gone away.
async fn aggregate(
    classifier: &Classifier,
    ordering: FanInOrder,
    mut rx: mpsc::Receiver<Envelope>,
) -> PipelineOutput {
    let mut output = PipelineOutput::default();
    let mut pending = BTreeMap::new();

    while let Some(envelope) = rx.recv().await {
        match ordering {
            FanInOrder::Arrival => output.record(classifier, envelope.pr),
            FanInOrder::PageOrder => {
                pending.insert((envelope.page, envelope.position), envelope.pr);
            }
        }
    }

    for pr in pending.into_values() {
        output.record(classifier, pr);
    }
    output
}

async fn scan_page(
    page: u32,
    fetcher: Fetcher,
    enricher: Enricher,
    tx: mpsc::Sender<Envelope>,
    cancel: CancellationToken,
    semaphore: Arc<Semaphore>,
) -> Result<()> {
    let _permit = until_cancelled(&cancel, semaphore.acquire_owned())
        .await?
        .map_err(|_| Error::Cancelled)?;

    let prs = until_cancelled(&cancel, fetcher.fetch_page(page)).await??;
    for (position, pr) in prs.into_iter().enumerate() {
        let pr = until_cancelled(&cancel, enricher.enrich(pr)).await??;
        until_cancelled(&cancel, tx.send(Envelope { page, position, pr }))
            .await?
            .map_err(|_| Error::Cancelled)?;
    }

    Ok(())
}

async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        out = fut => Ok(out),
    }
}
