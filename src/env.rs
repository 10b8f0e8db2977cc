use crate::error::{MishError, Result};
use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::CString;
use std::path::PathBuf;

/// The controller's view of the process environment.
///
/// Variables live here rather than in the process-global environment. Every
/// spawned program receives a snapshot of `vars` as its environment, so
/// assignments made by the controller are visible to every child forked
/// afterwards and children can never write back.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Variables passed to every spawned program.
    pub vars: HashMap<String, String>,
    /// The working directory shown in the prompt and inherited by children.
    pub current_dir: PathBuf,
    /// Set by `exit`; the read loop stops once it sees this.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        // Entries that are not valid UTF-8 cannot be edited here and are dropped.
        let vars = stdenv::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override a variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Build the `KEY=VALUE` block handed to `execve`.
    ///
    /// Fails if a key or value carries an interior NUL byte.
    pub fn envp(&self) -> Result<Vec<CString>> {
        self.vars
            .iter()
            .map(|(k, v)| {
                CString::new(format!("{}={}", k, v))
                    .map_err(|e| MishError::exec(k.clone(), format!("bad environment entry: {}", e)))
            })
            .collect()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::env::Environment;
    use std::collections::HashMap;
    use std::env as stdenv;

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = Environment {
            vars: HashMap::new(),
            current_dir: stdenv::temp_dir(),
            should_exit: false,
        };

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");
        assert_eq!(env.get_var("KEY"), Some("VALUE"));

        env.set_var("KEY", "OTHER");
        assert_eq!(env.get_var("KEY"), Some("OTHER"), "assignment must overwrite");
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn test_envp_contains_assignments() {
        let mut env = Environment {
            vars: HashMap::new(),
            current_dir: stdenv::temp_dir(),
            should_exit: false,
        };
        env.set_var("FOO", "bar");
        let envp = env.envp().unwrap();
        assert_eq!(envp.len(), 1);
        assert_eq!(envp[0].to_str().unwrap(), "FOO=bar");
    }

    #[test]
    fn test_envp_rejects_nul() {
        let mut env = Environment {
            vars: HashMap::new(),
            current_dir: stdenv::temp_dir(),
            should_exit: false,
        };
        env.set_var("BAD", "a\0b");
        assert!(env.envp().is_err());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut env = Environment::new();
        let snapshot = env.clone();
        env.set_var("MISH_SNAPSHOT_TEST", "1");
        assert_eq!(snapshot.get_var("MISH_SNAPSHOT_TEST"), None);
    }
}
