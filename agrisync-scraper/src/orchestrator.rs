//! Sync orchestrator
//!
//! Sequences one run:
//! acquire (browser session → login → download) → load workbook → format →
//! clean for sheets → write to the spreadsheet.
//!
//! The browser session is released on every path, including failures in
//! login or download. The downloaded archive and the extracted workbook live
//! in a per-run directory that is removed when the run ends, whatever the
//! outcome. Every error ends up as [`SyncOutcome::Failed`]; nothing escapes
//! [`SyncOrchestrator::run`].

use crate::browser::{BrowserOptions, BrowserSession};
use crate::error::SyncResult;
use crate::formatter;
use crate::scraper::AgriNoteScraper;
use crate::sheets::google::GoogleSheetsConnector;
use crate::sheets::{SheetConnector, SpreadSheetWriter};
use crate::workbook;
use agrisync_common::config::{Config, ConfigKey, Credentials};
use agrisync_common::SyncOutcome;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Portal session able to produce the report workbook
#[async_trait]
pub trait ReportAcquirer: Send {
    async fn login(&mut self, credentials: &Credentials) -> SyncResult<()>;

    /// Path of the extracted report workbook
    async fn download_report(&mut self) -> SyncResult<PathBuf>;

    /// Release the session (browser teardown)
    async fn close(self: Box<Self>);
}

/// Opens a fresh [`ReportAcquirer`] per run
///
/// Everything the acquirer writes goes under `work_dir`, which is deleted
/// after the run.
#[async_trait]
pub trait AcquirerFactory: Send + Sync {
    async fn open(&self, work_dir: &Path) -> SyncResult<Box<dyn ReportAcquirer>>;
}

/// Anything that performs one sync run
#[async_trait]
pub trait SyncRunner: Send + Sync {
    async fn run(&self) -> SyncOutcome;
}

/// WebDriver-backed acquirer: one browser session per run
pub struct BrowserAcquirerFactory {
    webdriver_url: String,
}

impl BrowserAcquirerFactory {
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
        }
    }

    /// Browser settings for a run working in `work_dir`
    fn options_for(&self, work_dir: &Path) -> BrowserOptions {
        BrowserOptions::new(self.webdriver_url.as_str(), work_dir.join("downloads"))
    }
}

#[async_trait]
impl AcquirerFactory for BrowserAcquirerFactory {
    async fn open(&self, work_dir: &Path) -> SyncResult<Box<dyn ReportAcquirer>> {
        let session = BrowserSession::launch(&self.options_for(work_dir)).await?;
        Ok(Box::new(BrowserAcquirer {
            session,
            extract_dir: work_dir.join("extracted"),
        }))
    }
}

struct BrowserAcquirer {
    session: BrowserSession,
    extract_dir: PathBuf,
}

#[async_trait]
impl ReportAcquirer for BrowserAcquirer {
    async fn login(&mut self, credentials: &Credentials) -> SyncResult<()> {
        AgriNoteScraper::new(&self.session, &self.extract_dir)
            .login(credentials)
            .await
    }

    async fn download_report(&mut self) -> SyncResult<PathBuf> {
        AgriNoteScraper::new(&self.session, &self.extract_dir)
            .download_report()
            .await
    }

    async fn close(self: Box<Self>) {
        self.session.close().await;
    }
}

/// End-to-end sync: portal → formatter → spreadsheet
pub struct SyncOrchestrator<F: AcquirerFactory, C: SheetConnector> {
    acquirers: F,
    writer: SpreadSheetWriter<C>,
    credentials: Credentials,
    work_root: PathBuf,
}

impl SyncOrchestrator<BrowserAcquirerFactory, GoogleSheetsConnector> {
    /// Production wiring from configuration
    ///
    /// Fails when the spreadsheet settings or portal credentials are missing.
    pub fn from_config(config: &Config) -> SyncResult<Self> {
        let writer = SpreadSheetWriter::from_config(config)?;
        let credentials = config.portal_credentials()?;

        let webdriver_url = config.require(ConfigKey::WebdriverUrl)?;
        let acquirers = BrowserAcquirerFactory::new(webdriver_url);

        Ok(Self::new(acquirers, writer, credentials).with_work_root(config.tmp_dir()))
    }
}

impl<F: AcquirerFactory, C: SheetConnector> SyncOrchestrator<F, C> {
    pub fn new(acquirers: F, writer: SpreadSheetWriter<C>, credentials: Credentials) -> Self {
        Self {
            acquirers,
            writer,
            credentials,
            work_root: std::env::temp_dir(),
        }
    }

    /// Directory under which each run creates its own working directory
    pub fn with_work_root(mut self, work_root: impl Into<PathBuf>) -> Self {
        self.work_root = work_root.into();
        self
    }

    pub fn writer(&self) -> &SpreadSheetWriter<C> {
        &self.writer
    }

    async fn run_workflow(&self) -> SyncResult<()> {
        tracing::info!("1. アグリノートから最新データを取得中...");
        std::fs::create_dir_all(&self.work_root)?;
        let work_dir = tempfile::Builder::new()
            .prefix("agrisync-")
            .tempdir_in(&self.work_root)?;
        tracing::debug!(work_dir = %work_dir.path().display(), "Run directory created");

        let excel_path = self.acquire(work_dir.path()).await?;
        let table = workbook::load_first_sheet(&excel_path)?;
        drop(work_dir);
        tracing::info!(rows = table.len(), "1. 完了");

        tracing::info!("2. フォーマット");
        let formatted = formatter::format(table);
        let cleaned = formatter::clean_for_sheets(&formatted);
        tracing::info!(rows = cleaned.len(), "2. 完了");

        tracing::info!("3. Spreadsheetに保存");
        self.writer.write_all(&cleaned).await?;

        tracing::info!("all completed!!");
        Ok(())
    }

    /// Login and download inside one session that is always closed afterwards
    async fn acquire(&self, work_dir: &Path) -> SyncResult<PathBuf> {
        let mut acquirer = self.acquirers.open(work_dir).await?;

        let result = async {
            acquirer.login(&self.credentials).await?;
            acquirer.download_report().await
        }
        .await;

        acquirer.close().await;
        result
    }
}

#[async_trait]
impl<F: AcquirerFactory, C: SheetConnector> SyncRunner for SyncOrchestrator<F, C> {
    async fn run(&self) -> SyncOutcome {
        match self.run_workflow().await {
            Ok(()) => SyncOutcome::Succeeded,
            Err(e) => {
                tracing::error!(error = ?e, "ジョブ失敗: {}", e);
                SyncOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_files_stay_in_run_directory() {
        let factory = BrowserAcquirerFactory::new("http://localhost:9515");
        let options = factory.options_for(Path::new("/tmp/agrisync/agrisync-x1"));
        assert_eq!(options.webdriver_url, "http://localhost:9515");
        assert_eq!(
            options.download_dir,
            PathBuf::from("/tmp/agrisync/agrisync-x1/downloads")
        );
        assert!(options.headless);
    }
}
