use crate::env::Environment;
use crate::error::{COMMAND_NOT_FOUND, MishError, Result};
use std::ffi::{CString, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Resolve the program a stage should exec, using the store's `PATH`.
///
/// The result is ready to hand to `execve`, so it is computed before forking.
pub fn resolve_program(env: &Environment, program: &str) -> Result<CString> {
    let search_paths = env.get_var("PATH").map(OsStr::new);
    let path = find_command_path(search_paths, Path::new(program))
        .ok_or_else(|| MishError::exec(program, COMMAND_NOT_FOUND))?;
    CString::new(path.as_os_str().as_bytes()).map_err(|e| MishError::exec(program, e))
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - A name containing `/` (absolute, `./foo`, `bin/sh`): returned as-is if
///   something exists there; `execve` reports permission problems itself.
/// - A bare name: each directory in `search_paths` is tried in order and the
///   first executable regular file wins. An empty `PATH` entry means the
///   current directory.
/// - Empty name, or no `PATH` for a bare name: `None`.
pub fn find_command_path(search_paths: Option<&OsStr>, program: &Path) -> Option<PathBuf> {
    if program.as_os_str().is_empty() {
        return None;
    }

    if program.as_os_str().as_bytes().contains(&b'/') {
        return program.exists().then(|| program.to_path_buf());
    }

    std::env::split_paths(search_paths?)
        .map(|dir| {
            if dir.as_os_str().is_empty() {
                Path::new(".").join(program)
            } else {
                dir.join(program)
            }
        })
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scratch_dir;
    use std::fs::{self, File};

    fn osstr(s: &str) -> Option<&OsStr> {
        Some(OsStr::new(s))
    }

    #[test]
    fn absolute_existing() {
        let path = Path::new("/bin/sh");
        let found = find_command_path(osstr("/nowhere"), path);
        assert_eq!(found.as_deref(), Some(path));
    }

    #[test]
    fn absolute_nonexisting() {
        let res = find_command_path(osstr("/bin"), Path::new("/bin/nonexisting"));
        assert!(res.is_none(), "Expected not to find /bin/nonexisting via absolute path");
    }

    #[test]
    fn single_component_found_in_path() {
        let found = find_command_path(osstr("/nowhere:/bin"), Path::new("sh"))
            .expect("Expected to find 'sh' in /bin via PATH search");
        assert_eq!(found, Path::new("/bin/sh"));
    }

    #[test]
    fn single_component_not_found_in_path() {
        let res = find_command_path(osstr("/bin"), Path::new("nonexisting"));
        assert!(res.is_none(), "Expected not to find 'nonexisting' in PATH");
    }

    #[test]
    fn no_path_variable() {
        assert!(find_command_path(None, Path::new("sh")).is_none());
    }

    #[test]
    fn skips_non_executable_and_directories() {
        let dir = scratch_dir("external_skip");
        File::create(dir.join("tool")).expect("touch tool");
        fs::create_dir_all(dir.join("sub")).expect("mkdir sub");

        let search = format!("{}:/bin", dir.display());
        assert!(find_command_path(osstr(&search), Path::new("tool")).is_none());
        assert!(find_command_path(osstr(&search), Path::new("sub")).is_none());

        fs::set_permissions(dir.join("tool"), fs::Permissions::from_mode(0o755)).unwrap();
        let found = find_command_path(osstr(&search), Path::new("tool"));
        assert_eq!(found, Some(dir.join("tool")));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn empty_path_is_none() {
        let res = find_command_path(osstr("/bin"), Path::new(""));
        assert!(res.is_none(), "Empty path should not resolve to anything");
    }

    #[test]
    fn resolve_reports_command_not_found() {
        let mut env = Environment::new();
        env.set_var("PATH", "/bin:/usr/bin");
        match resolve_program(&env, "definitely-not-a-program-1234") {
            Err(err @ MishError::Exec { .. }) => assert_eq!(err.child_status(), 127),
            other => panic!("expected exec error, got {:?}", other),
        }
        let sh = resolve_program(&env, "sh").unwrap();
        assert!(sh.to_str().unwrap().ends_with("/sh"));
    }
}
