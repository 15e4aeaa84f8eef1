//! Report archive extraction
//!
//! The portal zips several report variants together; the keyword in the entry
//! name is the only stable way to pick the right one. Entry names written on
//! Japanese Windows systems are Shift_JIS (CP932) bytes without the zip UTF-8
//! flag, so they are re-decoded before matching.

use crate::error::{SyncError, SyncResult};
use encoding_rs::Encoding;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Keyword identifying the per-worker work-record report
pub const TARGET_KEYWORD: &str = "作業者";

/// Extension of the report file inside the archive
pub const TARGET_EXTENSION: &str = ".xlsx";

/// Windows code page used for legacy entry names
const LEGACY_CODE_PAGE: u16 = 932;

/// Extract the first entry whose repaired name contains `keyword` and ends
/// with [`TARGET_EXTENSION`] into `extract_dir`, returning the written path
pub fn extract_excel(zip_path: &Path, extract_dir: &Path, keyword: &str) -> SyncResult<PathBuf> {
    fs::create_dir_all(extract_dir)?;
    let mut archive = ZipArchive::new(BufReader::new(File::open(zip_path)?))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let name = repair_entry_name(entry.name_raw(), entry.name());
        if !(name.contains(keyword) && name.ends_with(TARGET_EXTENSION)) {
            tracing::debug!(entry = %name, "Skipping archive entry");
            continue;
        }

        // Keep only the final path component; entries may sit in folders
        let file_name = Path::new(&name)
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| SyncError::NotFound(format!("invalid entry name '{}'", name)))?;
        let excel_path = extract_dir.join(file_name);

        let mut out = File::create(&excel_path)?;
        io::copy(&mut entry, &mut out)?;

        tracing::info!(entry = %name, path = %excel_path.display(), "Extracted report workbook");
        return Ok(excel_path);
    }

    Err(SyncError::NotFound(format!(
        "ZIP内にキーワード'{}'を含むExcelがみつかりませんでした",
        keyword
    )))
}

/// Best-effort repair of a zip entry name
///
/// Names that are already valid UTF-8 are kept. Otherwise the raw bytes are
/// decoded as CP932; if that fails too, the zip reader's own decoding is kept.
pub fn repair_entry_name(raw: &[u8], decoded: &str) -> String {
    if let Ok(name) = std::str::from_utf8(raw) {
        return name.to_string();
    }

    let Some(encoding) = legacy_encoding() else {
        return decoded.to_string();
    };
    let (name, had_errors) = encoding.decode_without_bom_handling(raw);
    if had_errors {
        decoded.to_string()
    } else {
        name.into_owned()
    }
}

fn legacy_encoding() -> Option<&'static Encoding> {
    codepage::to_encoding(LEGACY_CODE_PAGE)
}
