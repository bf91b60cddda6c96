use std::{
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};

use glyphlearn::app_dirs::HOME_ENV;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Points `GLYPHLEARN_HOME` at a test directory until dropped.
pub struct HomeGuard {
    previous: Option<String>,
    _lock: MutexGuard<'static, ()>,
}

impl HomeGuard {
    pub fn set(path: PathBuf) -> Self {
        let lock = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        let previous = std::env::var(HOME_ENV).ok();
        // SAFETY: env mutations in tests are serialized by ENV_LOCK.
        unsafe {
            std::env::set_var(HOME_ENV, path);
        }
        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for HomeGuard {
    fn drop(&mut self) {
        // SAFETY: env mutations in tests are serialized by ENV_LOCK.
        unsafe {
            match self.previous.take() {
                Some(value) => std::env::set_var(HOME_ENV, value),
                None => std::env::remove_var(HOME_ENV),
            }
        }
    }
}
