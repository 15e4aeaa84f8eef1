//! AgriNote portal automation (Report Acquirer)
//!
//! Drives the portal through a [`BrowserSession`]:
//! 1. `login` - fill the login form and confirm the post-login header appears
//! 2. `download_report` - request the full-history Excel export, wait for the
//!    server-side render, download the zip and extract the worker report

use crate::archive::{self, TARGET_KEYWORD};
use crate::browser::BrowserSession;
use crate::error::{SyncError, SyncResult};
use agrisync_common::config::Credentials;
use fantoccini::error::CmdError;
use fantoccini::{Client, Locator};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

const LOGIN_URL: &str = "https://agri-note.jp/b/login/";
const EXPORT_URL: &str = "https://agri-note.jp/b/export.html#/top";

/// Present only once the user is logged in
const LOGGED_IN_MARKER: &str = "#headerHamburgerMenu";
/// Banner shown for wrong credentials
const LOGIN_ERROR_BANNER: &str = "p._1n3hn89z";

const MSG_BAD_CREDENTIALS: &str = "メールアドレス、アカウントID、またはパスワードが一致しません。";
const MSG_UNEXPECTED_LOGIN_PAGE: &str = "ログインに失敗し、予期しない画面が表示されました。";

const REPORT_CATEGORY: &str = "作業記録";
const RANGE_ALL_TIME: &str = "全期間";
const FORMAT_EXCEL: &str = "Excel";

/// Chrome's in-progress download suffixes
const PARTIAL_SUFFIXES: &[&str] = &[".crdownload", ".tmp"];

/// Bounded waits for each portal step
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub login: Duration,
    pub report_ready: Duration,
    pub download: Duration,
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            login: Duration::from_secs(10),
            report_ready: Duration::from_secs(120),
            download: Duration::from_secs(120),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Portal client bound to one browser session
pub struct AgriNoteScraper<'a> {
    session: &'a BrowserSession,
    extract_dir: PathBuf,
    timeouts: Timeouts,
}

impl<'a> AgriNoteScraper<'a> {
    pub fn new(session: &'a BrowserSession, extract_dir: impl Into<PathBuf>) -> Self {
        Self {
            session,
            extract_dir: extract_dir.into(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    fn client(&self) -> &Client {
        self.session.client()
    }

    /// Log into the portal
    ///
    /// Returns `Login` when the invalid-credentials banner shows, and
    /// `UnexpectedState` when neither the logged-in page nor the banner appears.
    pub async fn login(&self, credentials: &Credentials) -> SyncResult<()> {
        let client = self.client();
        client.goto(LOGIN_URL).await?;

        client
            .find(Locator::Css(r#"input[type="text"]"#))
            .await?
            .send_keys(&credentials.identifier)
            .await?;
        client
            .find(Locator::Css(r#"input[type="password"]"#))
            .await?
            .send_keys(&credentials.secret)
            .await?;
        client
            .find(Locator::XPath("//button[contains(normalize-space(.), 'ログイン')]"))
            .await?
            .click()
            .await?;

        match client
            .wait()
            .at_most(self.timeouts.login)
            .for_element(Locator::Css(LOGGED_IN_MARKER))
            .await
        {
            Ok(_) => {
                tracing::info!(user = %credentials.identifier, "Logged into AgriNote");
                Ok(())
            }
            Err(CmdError::WaitTimeout) => match self.visible_login_banner().await {
                Ok(banner) => Err(classify_login_failure(banner.as_deref())),
                Err(e) => Err(SyncError::UnexpectedState(format!(
                    "{} ({})",
                    MSG_UNEXPECTED_LOGIN_PAGE, e
                ))),
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Text of the first displayed invalid-credentials banner, if any
    async fn visible_login_banner(&self) -> Result<Option<String>, CmdError> {
        for banner in self.client().find_all(Locator::Css(LOGIN_ERROR_BANNER)).await? {
            if banner.is_displayed().await.unwrap_or(false) {
                return Ok(Some(banner.text().await.unwrap_or_default()));
            }
        }
        Ok(None)
    }

    /// Export the full work record as Excel and return the extracted workbook path
    pub async fn download_report(&self) -> SyncResult<PathBuf> {
        let client = self.client();

        client.goto(EXPORT_URL).await?;

        client
            .wait()
            .at_most(self.timeouts.login)
            .for_element(Locator::XPath(&format!(
                "//li[.//text()[contains(., '{}')]]",
                REPORT_CATEGORY
            )))
            .await?
            .click()
            .await?;

        self.check_label(RANGE_ALL_TIME).await?;
        self.check_label(FORMAT_EXCEL).await?;

        client
            .find(Locator::XPath("//button[contains(normalize-space(.), '生成')]"))
            .await?
            .click()
            .await?;
        tracing::info!("Report generation requested");

        let link_xpath = "//a[contains(normalize-space(.), 'ダウンロード')]";
        let link = self
            .wait_until_visible(Locator::XPath(link_xpath), self.timeouts.report_ready)
            .await?;

        let before = list_files(self.session.download_dir())?;
        link.click().await?;
        let zip_path = self.wait_for_download(&before).await?;
        tracing::info!(path = %zip_path.display(), "Report archive downloaded");

        archive::extract_excel(&zip_path, &self.extract_dir, TARGET_KEYWORD)
    }

    /// Ensure the radio/checkbox labelled `text` is selected
    async fn check_label(&self, text: &str) -> SyncResult<()> {
        let client = self.client();
        let label = client
            .find(Locator::XPath(&format!(
                "//label[contains(normalize-space(.), '{}')]",
                text
            )))
            .await?;

        let input = match label.attr("for").await? {
            Some(id) => client.find(Locator::Id(&id)).await.ok(),
            None => label.find(Locator::Css("input")).await.ok(),
        };
        if let Some(input) = input {
            if input.is_selected().await? {
                return Ok(());
            }
        }

        label.click().await?;
        Ok(())
    }

    /// Accept a pending native dialog, logging its message
    async fn accept_dialog(&self) {
        if let Ok(message) = self.client().get_alert_text().await {
            tracing::info!(message = %message, "Native dialog shown; accepting");
            if let Err(e) = self.client().accept_alert().await {
                tracing::warn!("Failed to accept dialog: {}", e);
            }
        }
    }

    async fn wait_until_visible(
        &self,
        locator: Locator<'_>,
        timeout: Duration,
    ) -> SyncResult<fantoccini::elements::Element> {
        let deadline = Instant::now() + timeout;
        loop {
            self.accept_dialog().await;

            if let Ok(elements) = self.client().find_all(locator).await {
                for element in elements {
                    if element.is_displayed().await.unwrap_or(false) {
                        return Ok(element);
                    }
                }
            }

            if Instant::now() >= deadline {
                return Err(SyncError::Browser(format!(
                    "timed out after {:?} waiting for the download link",
                    timeout
                )));
            }
            tokio::time::sleep(self.timeouts.poll_interval).await;
        }
    }

    /// Wait for a new, complete file in the download directory
    async fn wait_for_download(&self, before: &HashSet<PathBuf>) -> SyncResult<PathBuf> {
        let deadline = Instant::now() + self.timeouts.download;
        loop {
            let files = list_files(self.session.download_dir())?;
            let new_files: Vec<&PathBuf> = files.iter().filter(|p| !before.contains(*p)).collect();
            let in_progress = new_files.iter().any(|p| is_partial(p));
            if !in_progress {
                if let Some(path) = new_files.first() {
                    return Ok((*path).clone());
                }
            }

            if Instant::now() >= deadline {
                return Err(SyncError::Browser(format!(
                    "timed out after {:?} waiting for the report download",
                    self.timeouts.download
                )));
            }
            tokio::time::sleep(self.timeouts.poll_interval).await;
        }
    }
}

fn is_partial(path: &Path) -> bool {
    let name = path.to_string_lossy();
    PARTIAL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

fn list_files(dir: &Path) -> SyncResult<HashSet<PathBuf>> {
    let mut files = HashSet::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.insert(entry.path());
        }
    }
    Ok(files)
}

/// A visible banner means the portal rejected the credentials; anything
/// else is a page the scraper does not know
fn classify_login_failure(banner: Option<&str>) -> SyncError {
    match banner.map(str::trim) {
        Some(text) => {
            tracing::warn!(banner = %text, "Login rejected by portal");
            SyncError::Login(if text.is_empty() {
                MSG_BAD_CREDENTIALS.to_string()
            } else {
                text.to_string()
            })
        }
        None => SyncError::UnexpectedState(MSG_UNEXPECTED_LOGIN_PAGE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_banner_text_becomes_login_error() {
        match classify_login_failure(Some("  パスワードが違います  ")) {
            SyncError::Login(message) => assert_eq!(message, "パスワードが違います"),
            other => panic!("expected login error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_banner_uses_fixed_message() {
        match classify_login_failure(Some("   ")) {
            SyncError::Login(message) => assert_eq!(message, MSG_BAD_CREDENTIALS),
            other => panic!("expected login error, got {:?}", other),
        }
    }

    #[test]
    fn test_no_banner_is_unexpected_state() {
        match classify_login_failure(None) {
            SyncError::UnexpectedState(message) => {
                assert_eq!(message, MSG_UNEXPECTED_LOGIN_PAGE)
            }
            other => panic!("expected unexpected state, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_download_detection() {
        assert!(is_partial(Path::new("/tmp/d/report.zip.crdownload")));
        assert!(is_partial(Path::new("/tmp/d/.com.google.Chrome.abc.tmp")));
        assert!(!is_partial(Path::new("/tmp/d/report.zip")));
    }

    #[test]
    fn test_list_files_ignores_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.zip"), b"x").unwrap();

        let files = list_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files.contains(&dir.path().join("a.zip")));
    }

    #[test]
    fn test_default_timeouts() {
        let t = Timeouts::default();
        assert_eq!(t.login, Duration::from_secs(10));
        assert_eq!(t.report_ready, Duration::from_secs(120));
        assert_eq!(t.download, Duration::from_secs(120));
    }
}
