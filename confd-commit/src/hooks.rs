//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::fs;
use std::path::Path;
use std::process::Command;

use regex::Regex;

/// The filename shape a hook is allowed to have, mirroring run-parts:
/// letters, digits, underscore and dash only, so editor backups
/// (`foo~`), package-manager droppings (`foo.rpmsave`), and dotfiles are
/// silently skipped rather than executed.
fn hook_name_re() -> Regex {
    Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap()
}

/// Runs every executable, validly-named entry of `dir` in lexical order,
/// passing `phase` as the sole argument and `envs` (typically
/// `COMMIT_USER`/`COMMIT_STATUS`/`COMMIT_COMMENT`, with `PATH` inherited
/// from the daemon's own environment) alongside it. Used for the commit
/// pipeline's pre-commit and post-commit hook directories (§4.10). Returns
/// the accumulated stdout of every hook that ran; the first non-zero exit
/// aborts the remaining hooks and returns its stderr as an error.
///
/// A missing directory is not an error; hooks are optional.
pub fn run_dir(dir: &Path, phase: &str, envs: &[(String, String)]) -> Result<Vec<String>, String> {
    let re = hook_name_re();
    let mut entries = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect::<Vec<_>>(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.to_string()),
    };
    entries.sort();

    let mut outputs = Vec::new();
    for path in entries {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !re.is_match(name) {
            continue;
        }
        if !is_executable(&path) {
            continue;
        }

        let output = Command::new(&path)
            .arg(phase)
            .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()
            .map_err(|e| format!("{}: {e}", path.display()))?;
        if !output.status.success() {
            return Err(format!(
                "{}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr)
            ));
        }
        outputs.push(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    Ok(outputs)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    #[test]
    fn missing_directory_is_not_an_error() {
        let dir = Path::new("/nonexistent/hook/dir/for/tests");
        assert_eq!(run_dir(dir, "pre-commit", &[]).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn skips_non_conforming_filenames() {
        let tmp = tempdir();
        let backup = tmp.join("hook.sh~");
        fs::write(&backup, "#!/bin/sh\nexit 1\n").unwrap();
        let mut perms = fs::metadata(&backup).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&backup, perms).unwrap();

        let result = run_dir(&tmp, "pre-commit", &[]);
        assert!(result.is_ok());
        fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn runs_executable_scripts_in_order_and_captures_stdout() {
        let tmp = tempdir();
        let script = tmp.join("10-hello");
        let mut f = fs::File::create(&script).unwrap();
        writeln!(f, "#!/bin/sh\necho hello-$1").unwrap();
        drop(f);
        let mut perms = fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script, perms).unwrap();

        let outputs = run_dir(&tmp, "pre-commit", &[("COMMIT_USER".to_owned(), "alice".to_owned())]).unwrap();
        assert_eq!(outputs, vec!["hello-pre-commit\n".to_owned()]);
        fs::remove_dir_all(&tmp).ok();
    }

    fn tempdir() -> std::path::PathBuf {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "confd-commit-hooks-test-{}-{id}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }
}
