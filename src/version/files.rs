//! Reading and writing package manifest versions.
//!
//! `package.json` (with `package-lock.json` / `npm-shrinkwrap.json`) is the
//! primary source, `Cargo.toml` the fallback.

use std::fmt;
use std::path::{Path, PathBuf};

use semver::Version;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::VersionError;

const LOCKFILES: [&str; 2] = ["package-lock.json", "npm-shrinkwrap.json"];

/// The kind of manifest carrying a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFileKind {
    PackageJson,
    NpmLockfile,
    CargoToml,
}

impl fmt::Display for VersionFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionFileKind::PackageJson => write!(f, "package.json"),
            VersionFileKind::NpmLockfile => write!(f, "npm lockfile"),
            VersionFileKind::CargoToml => write!(f, "Cargo.toml"),
        }
    }
}

/// A manifest found in the project root.
#[derive(Debug, Clone)]
pub struct VersionFile {
    pub path: PathBuf,
    pub kind: VersionFileKind,
}

/// Detect manifests to update, in write order.
pub fn detect_version_files(root: &Path) -> Vec<VersionFile> {
    let mut files = Vec::new();

    let package_json = root.join("package.json");
    if package_json.exists() {
        files.push(VersionFile {
            path: package_json,
            kind: VersionFileKind::PackageJson,
        });
        for lockfile in LOCKFILES {
            let path = root.join(lockfile);
            if path.exists() {
                files.push(VersionFile {
                    path,
                    kind: VersionFileKind::NpmLockfile,
                });
            }
        }
    }

    let cargo_toml = root.join("Cargo.toml");
    if cargo_toml.exists() {
        files.push(VersionFile {
            path: cargo_toml,
            kind: VersionFileKind::CargoToml,
        });
    }

    files
}

/// Current project version: `package.json`, then `Cargo.toml`, else `0.0.0`.
pub fn read_current_version(root: &Path) -> Result<Version, VersionError> {
    let package_json = root.join("package.json");
    let cargo_toml = root.join("Cargo.toml");

    let raw = if package_json.exists() {
        read_json(&package_json)?
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string)
    } else if cargo_toml.exists() {
        read_cargo_version(&cargo_toml)?
    } else {
        None
    };

    match raw {
        Some(raw) => Version::parse(&raw).map_err(|e| VersionError::ParseFailed(raw, e)),
        None => {
            debug!("No version found in manifests, starting from 0.0.0");
            Ok(Version::new(0, 0, 0))
        }
    }
}

/// The `repository` field of `package.json`, as a string or `{ url }` object.
pub fn read_package_repository(root: &Path) -> Option<String> {
    let path = root.join("package.json");
    if !path.exists() {
        return None;
    }
    let json = read_json(&path).ok()?;
    match json.get("repository")? {
        Value::String(url) => Some(url.clone()),
        Value::Object(obj) => obj.get("url").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Write `new_version` to every detected manifest. Returns the changed paths.
pub fn write_version_files(
    root: &Path,
    current: &Version,
    new_version: &Version,
) -> Result<Vec<PathBuf>, VersionError> {
    let files = detect_version_files(root);
    if files.is_empty() {
        debug!(root = %root.display(), "No manifests to update");
    }

    let mut changed = Vec::new();
    for file in files {
        if update_version_file(&file, new_version)? {
            changed.push(file.path);
        }
    }

    if !changed.is_empty() {
        info!("Bumping version from `{}` to `{}`", current, new_version);
    }
    Ok(changed)
}

/// Update one manifest to the new version. Returns whether the file was written.
pub fn update_version_file(
    file: &VersionFile,
    new_version: &Version,
) -> Result<bool, VersionError> {
    match file.kind {
        VersionFileKind::PackageJson => update_package_json(&file.path, new_version, false),
        VersionFileKind::NpmLockfile => update_package_json(&file.path, new_version, true),
        VersionFileKind::CargoToml => update_cargo_toml(&file.path, new_version),
    }
}

fn update_package_json(
    path: &Path,
    new_version: &Version,
    lockfile: bool,
) -> Result<bool, VersionError> {
    let mut json = read_json(path)?;
    let version = Value::String(new_version.to_string());

    if let Some(obj) = json.as_object_mut() {
        obj.insert("version".to_string(), version.clone());
    }
    if lockfile {
        if let Some(root_package) = json
            .get_mut("packages")
            .and_then(|p| p.get_mut(""))
            .and_then(Value::as_object_mut)
        {
            root_package.insert("version".to_string(), version);
        }
    }

    let output = serde_json::to_string_pretty(&json).map_err(|e| VersionError::FileUpdateFailed {
        path: path.to_path_buf(),
        reason: format!("Failed to serialize JSON: {}", e),
    })?;

    // npm uses trailing newline
    write_file(path, &format!("{}\n", output))?;
    Ok(true)
}

fn read_cargo_version(path: &Path) -> Result<Option<String>, VersionError> {
    let doc = parse_toml(path, &read_file(path)?)?;
    Ok(doc
        .get("package")
        .and_then(|p| p.get("version"))
        .and_then(|v| v.as_str())
        .map(str::to_string))
}

fn update_cargo_toml(path: &Path, new_version: &Version) -> Result<bool, VersionError> {
    let mut doc = parse_toml(path, &read_file(path)?)?;

    // Workspace roots and `version.workspace = true` members have no string to replace.
    if doc
        .get("package")
        .and_then(|p| p.get("version"))
        .and_then(|v| v.as_str())
        .is_none()
    {
        debug!(path = %path.display(), "Cargo.toml has no literal package version, skipping");
        return Ok(false);
    }

    doc["package"]["version"] = toml_edit::value(new_version.to_string());
    write_file(path, &doc.to_string())?;
    Ok(true)
}

fn read_json(path: &Path) -> Result<Value, VersionError> {
    serde_json::from_str(&read_file(path)?).map_err(|e| VersionError::FileUpdateFailed {
        path: path.to_path_buf(),
        reason: format!("Invalid JSON: {}", e),
    })
}

fn parse_toml(path: &Path, content: &str) -> Result<toml_edit::DocumentMut, VersionError> {
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| VersionError::FileUpdateFailed {
            path: path.to_path_buf(),
            reason: format!("Invalid TOML: {}", e),
        })
}

fn read_file(path: &Path) -> Result<String, VersionError> {
    std::fs::read_to_string(path).map_err(|e| VersionError::FileUpdateFailed {
        path: path.to_path_buf(),
        reason: format!("Failed to read: {}", e),
    })
}

fn write_file(path: &Path, content: &str) -> Result<(), VersionError> {
    std::fs::write(path, content).map_err(|e| VersionError::FileUpdateFailed {
        path: path.to_path_buf(),
        reason: format!("Failed to write: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_current_version_defaults_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_current_version(dir.path()).unwrap(), Version::new(0, 0, 0));

        fs::write(dir.path().join("package.json"), r#"{"name": "x"}"#).unwrap();
        assert_eq!(read_current_version(dir.path()).unwrap(), Version::new(0, 0, 0));
    }

    #[test]
    fn test_current_version_prefers_package_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"version": "2.0.0"}"#).unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"x\"\nversion = \"1.0.0\"\n",
        )
        .unwrap();

        assert_eq!(read_current_version(dir.path()).unwrap(), Version::new(2, 0, 0));
    }

    #[test]
    fn test_current_version_from_cargo_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"x\"\nversion = \"1.4.2\"\n",
        )
        .unwrap();

        assert_eq!(read_current_version(dir.path()).unwrap(), Version::new(1, 4, 2));
    }

    #[test]
    fn test_invalid_version_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"version": "one"}"#).unwrap();
        assert!(matches!(
            read_current_version(dir.path()),
            Err(VersionError::ParseFailed(..))
        ));
    }

    #[test]
    fn test_write_updates_package_and_lockfile() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "test", "version": "1.0.0", "type": "module"}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("package-lock.json"),
            r#"{"name": "test", "version": "1.0.0", "packages": {"": {"version": "1.0.0"}}}"#,
        )
        .unwrap();

        let changed =
            write_version_files(dir.path(), &Version::new(1, 0, 0), &Version::new(1, 1, 0))
                .unwrap();
        assert_eq!(changed.len(), 2);

        let package = fs::read_to_string(dir.path().join("package.json")).unwrap();
        assert!(package.contains("\"version\": \"1.1.0\""));
        // Key order survives the rewrite.
        assert!(package.find("\"name\"").unwrap() < package.find("\"type\"").unwrap());

        let lock: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("package-lock.json")).unwrap())
                .unwrap();
        assert_eq!(lock["version"], "1.1.0");
        assert_eq!(lock["packages"][""]["version"], "1.1.0");
    }

    #[test]
    fn test_update_cargo_toml_preserves_formatting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        fs::write(
            &path,
            "[package]\nname = \"test\"\n# version comment\nversion = \"1.0.0\"\nedition = \"2024\"\n",
        )
        .unwrap();

        write_version_files(dir.path(), &Version::new(1, 0, 0), &Version::new(2, 0, 0)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("version = \"2.0.0\""));
        assert!(content.contains("# version comment"));
    }

    #[test]
    fn test_inherited_cargo_version_is_not_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        let manifest = "[package]\nname = \"member\"\nversion.workspace = true\n";
        fs::write(&path, manifest).unwrap();

        let changed =
            write_version_files(dir.path(), &Version::new(0, 0, 0), &Version::new(0, 1, 0))
                .unwrap();

        assert!(changed.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), manifest);
    }

    #[test]
    fn test_package_repository_forms() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"repository": {"type": "git", "url": "https://github.com/unjs/changelogen.git"}}"#,
        )
        .unwrap();
        assert_eq!(
            read_package_repository(dir.path()).as_deref(),
            Some("https://github.com/unjs/changelogen.git")
        );

        fs::write(
            dir.path().join("package.json"),
            r#"{"repository": "unjs/changelogen"}"#,
        )
        .unwrap();
        assert_eq!(read_package_repository(dir.path()).as_deref(), Some("unjs/changelogen"));
    }
}
