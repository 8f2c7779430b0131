use std::{
    collections::HashMap,
    env,
    ffi::{OsStr, OsString},
    mem,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Serializes tests that mutate the environment. Variables changed through the returned guard
/// are restored when the guard is dropped.
#[derive(Debug)]
pub(crate) struct EnvMutex(Mutex<()>);

impl EnvMutex {
    pub const fn new() -> Self {
        Self(Mutex::new(()))
    }

    pub fn lock(&self) -> EnvMutexGuard<'_> {
        let guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        EnvMutexGuard {
            _inner: guard,
            redefined_vars: HashMap::new(),
        }
    }
}

#[must_use = "Environment will be reset when the guard is dropped"]
#[derive(Debug)]
pub(crate) struct EnvMutexGuard<'a> {
    _inner: MutexGuard<'a, ()>,
    redefined_vars: HashMap<OsString, Option<OsString>>,
}

impl Drop for EnvMutexGuard<'_> {
    fn drop(&mut self) {
        for (env_name, value) in mem::take(&mut self.redefined_vars) {
            if let Some(value) = value {
                env::set_var(env_name, value);
            } else {
                env::remove_var(env_name);
            }
        }
    }
}

impl EnvMutexGuard<'_> {
    /// Sets env vars specified in `.env`-like format.
    pub fn set_env(&mut self, fixture: &str) {
        for line in fixture.split('\n').map(str::trim) {
            if line.is_empty() {
                continue;
            }
            let (variable_name, variable_value) = line
                .split_once('=')
                .unwrap_or_else(|| panic!("Incorrect line format: {line}"));
            let variable_value = variable_value.trim_matches('"');

            let variable_name = OsString::from(variable_name);
            self.remember_var(&variable_name);
            env::set_var(variable_name, variable_value);
        }
    }

    /// Removes the specified env vars.
    pub fn remove_env(&mut self, var_names: &[&str]) {
        for &var_name in var_names {
            let var_name = OsString::from(var_name);
            self.remember_var(&var_name);
            env::remove_var(var_name);
        }
    }

    fn remember_var(&mut self, name: &OsStr) {
        if !self.redefined_vars.contains_key(name) {
            let initial_value = env::var_os(name);
            self.redefined_vars.insert(name.to_owned(), initial_value);
        }
    }
}
