use anyhow::{anyhow, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::log;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "tesseract";

#[cfg(windows)]
const COMMON_EXECUTABLES: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];
#[cfg(not(windows))]
const COMMON_EXECUTABLES: &[&str] = &["/usr/bin/tesseract", "/usr/local/bin/tesseract"];

#[cfg(windows)]
const COMMON_TESSDATA_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];
#[cfg(not(windows))]
const COMMON_TESSDATA_DIRS: &[&str] = &[
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/local/share/tessdata",
];

pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` when the executable's built-in data directory already has every
    /// requested language.
    pub tessdata: Option<PathBuf>,
}

/// Returns the directory for storing Tesseract files
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("book-scanner")
        .join("tesseract")
}

/// Splits a Tesseract language spec such as "eng+por" into codes.
fn language_codes(language: &str) -> Vec<&str> {
    language
        .split('+')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .collect()
}

fn has_languages(tessdata: &Path, codes: &[&str]) -> bool {
    codes
        .iter()
        .all(|code| tessdata.join(format!("{}.traineddata", code)).exists())
}

/// Ensures Tesseract and the data for `language` are available. Language data
/// is downloaded if necessary; the executable must be installed.
pub fn ensure_tesseract(language: &str) -> Result<TesseractPaths> {
    let codes = language_codes(language);
    if codes.is_empty() {
        return Err(anyhow!("No OCR language configured"));
    }

    let executable = find_tesseract_executable()?;
    log(&format!("Tesseract found at: {}", executable.display()));

    if let Some(tessdata) = find_tessdata_dir(&codes) {
        log(&format!("Using tessdata from: {}", tessdata.display()));
        return Ok(TesseractPaths {
            executable,
            tessdata: Some(tessdata),
        });
    }

    let installed = list_installed_languages(&executable);
    if codes.iter().all(|code| installed.iter().any(|l| l == code)) {
        return Ok(TesseractPaths {
            executable,
            tessdata: None,
        });
    }

    log("Language data not found locally, downloading...");
    let tessdata_dir = get_tesseract_dir().join("tessdata");
    fs::create_dir_all(&tessdata_dir)?;
    for code in &codes {
        if !tessdata_dir.join(format!("{}.traineddata", code)).exists() {
            download_tessdata(&tessdata_dir, code)?;
        }
    }

    log(&format!("Tesseract ready with data at: {}", tessdata_dir.display()));

    Ok(TesseractPaths {
        executable,
        tessdata: Some(tessdata_dir),
    })
}

/// Languages the executable reports via `--list-langs`.
fn list_installed_languages(executable: &Path) -> Vec<String> {
    match Command::new(executable).arg("--list-langs").output() {
        // the first line is a "List of available languages" header
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
            .lines()
            .skip(1)
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Downloads `<code>.traineddata` from the tessdata repository
fn download_tessdata(tessdata_dir: &Path, code: &str) -> Result<()> {
    let url = format!("{}/{}.traineddata", TESSDATA_REPO, code);
    let path = tessdata_dir.join(format!("{}.traineddata", code));

    log(&format!("Downloading {}.traineddata...", code));

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "book-scanner")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}.traineddata: HTTP {}",
            code,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&path)?;
    file.write_all(&bytes)?;

    log(&format!(
        "Downloaded {}.traineddata ({} bytes)",
        code,
        bytes.len()
    ));

    Ok(())
}

/// Finds the Tesseract executable, checking our local dir first, then system
pub fn find_tesseract_executable() -> Result<PathBuf> {
    let local_exe = get_tesseract_dir().join(EXECUTABLE_NAME);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for path in COMMON_EXECUTABLES {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "Tesseract not found. Please install Tesseract-OCR and add it to PATH, \
         or copy it to: {}",
        get_tesseract_dir().display()
    ))
}

/// Finds a tessdata directory holding every language in `codes`
pub fn find_tessdata_dir(codes: &[&str]) -> Option<PathBuf> {
    let mut candidates = vec![get_tesseract_dir().join("tessdata")];

    // TESSDATA_PREFIX may point at tessdata itself or at its parent
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        candidates.push(p.join("tessdata"));
        candidates.push(p);
    }

    candidates.extend(COMMON_TESSDATA_DIRS.iter().map(PathBuf::from));

    candidates
        .into_iter()
        .find(|dir| has_languages(dir, codes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_language_codes() {
        assert_eq!(language_codes("eng"), vec!["eng"]);
        assert_eq!(language_codes("eng+por"), vec!["eng", "por"]);
        assert_eq!(language_codes(" eng + "), vec!["eng"]);
        assert!(language_codes("").is_empty());
    }

    #[test]
    fn test_has_languages_requires_every_code() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("eng.traineddata"), b"x").unwrap();

        assert!(has_languages(dir.path(), &["eng"]));
        assert!(!has_languages(dir.path(), &["eng", "por"]));
    }
}
