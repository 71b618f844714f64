use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;

use crate::log;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

/// Standard Windows installer locations.
const COMMON_EXECUTABLES: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];

const COMMON_TESSDATA: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
];

#[derive(Debug, Clone)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` lets Tesseract use its built-in data directory
    pub tessdata: Option<PathBuf>,
}

/// Returns the directory for storing Tesseract files
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reinforce-macro")
        .join("tesseract")
}

/// Splits a language hint such as "kor+eng" into its languages.
pub fn languages(hint: &str) -> Vec<&str> {
    hint.split('+')
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .collect()
}

/// True if `dir` holds a traineddata file for every language.
fn has_languages(dir: &Path, langs: &[&str]) -> bool {
    langs
        .iter()
        .all(|lang| dir.join(format!("{}.traineddata", lang)).exists())
}

/// Returns the first candidate directory holding all languages.
fn first_dir_with_languages(candidates: &[PathBuf], langs: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|dir| has_languages(dir, langs))
        .cloned()
}

/// Locates Tesseract and makes sure language data for `language_hint` exists.
///
/// Missing traineddata files are downloaded into the local data directory.
/// If that fails, Tesseract falls back to its own tessdata directory.
pub fn ensure_tesseract(explicit_path: Option<&str>, language_hint: &str) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(explicit_path)?;
    log(&format!("Tesseract executable: {}", executable.display()));

    let langs = languages(language_hint);
    if let Some(tessdata) = find_tessdata_dir(&langs) {
        log(&format!("Tessdata found at: {}", tessdata.display()));
        return Ok(TesseractPaths {
            executable,
            tessdata: Some(tessdata),
        });
    }

    let local_tessdata = get_tesseract_dir().join("tessdata");
    match download_missing_tessdata(&local_tessdata, &langs) {
        Ok(()) => Ok(TesseractPaths {
            executable,
            tessdata: Some(local_tessdata),
        }),
        Err(e) => {
            log(&format!(
                "Warning: {:#}. Using Tesseract's default tessdata.",
                e
            ));
            Ok(TesseractPaths {
                executable,
                tessdata: None,
            })
        }
    }
}

/// Finds the Tesseract executable: explicit path, local dir, PATH, then
/// standard install locations.
pub fn find_tesseract_executable(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
        log(&format!("Configured tesseract_path not found: {}", path));
    }

    let tesseract_dir = get_tesseract_dir();
    for name in ["tesseract.exe", "tesseract"] {
        let local_exe = tesseract_dir.join(name);
        if local_exe.exists() {
            return Ok(local_exe);
        }
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
        "Tesseract not found. Install Tesseract-OCR (https://github.com/UB-Mannheim/tesseract/releases) \
         or set tesseract_path in config.json"
    ))
}

/// Finds a tessdata directory holding every requested language.
pub fn find_tessdata_dir(langs: &[&str]) -> Option<PathBuf> {
    let mut candidates = vec![get_tesseract_dir().join("tessdata")];

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        candidates.push(PathBuf::from(&prefix));
        candidates.push(PathBuf::from(&prefix).join("tessdata"));
    }
    candidates.extend(COMMON_TESSDATA.iter().map(PathBuf::from));

    first_dir_with_languages(&candidates, langs)
}

/// Fills `tessdata_dir` with every missing language.
fn download_missing_tessdata(tessdata_dir: &Path, langs: &[&str]) -> Result<()> {
    fs::create_dir_all(tessdata_dir).context("Failed to create tessdata directory")?;

    for lang in langs {
        let target = tessdata_dir.join(format!("{}.traineddata", lang));
        if !target.exists() {
            download_tessdata(&target, lang)?;
        }
    }
    Ok(())
}

/// Downloads one language's trained data, copying from a system install when present.
fn download_tessdata(target: &Path, lang: &str) -> Result<()> {
    let file_name = format!("{}.traineddata", lang);

    for dir in COMMON_TESSDATA {
        let system_file = PathBuf::from(dir).join(&file_name);
        if system_file.exists() {
            log(&format!("Copying {} from: {}", file_name, dir));
            let source = fs::File::open(&system_file)
                .context(format!("Failed to open {}", system_file.display()))?;
            install_file(target, source)?;
            return Ok(());
        }
    }

    log(&format!("Downloading {}...", file_name));

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(format!("{}/{}", TESSDATA_REPO, file_name))
        .header("User-Agent", "reinforce-macro")
        .send()
        .context(format!("Failed to download {}", file_name))?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: HTTP {}",
            file_name,
            response.status()
        ));
    }

    let size = install_file(target, response)
        .context(format!("Failed to download {}", file_name))?;
    log(&format!("Downloaded {} ({} bytes)", file_name, size));

    Ok(())
}

/// Streams `source` into `target` through a temp file in the same directory.
///
/// `target` only appears once the whole file is written, so an interrupted
/// transfer never leaves a truncated traineddata that looks installed.
fn install_file(target: &Path, mut source: impl Read) -> Result<u64> {
    let dir = target
        .parent()
        .ok_or_else(|| anyhow!("No parent directory for {}", target.display()))?;
    let mut temp = NamedTempFile::new_in(dir).context("Failed to create temp file")?;

    let size = io::copy(&mut source, &mut temp)?;
    temp.flush()?;
    temp.persist(target)
        .map_err(|e| anyhow!("Failed to move file into {}: {}", target.display(), e))?;
    Ok(size)
}
