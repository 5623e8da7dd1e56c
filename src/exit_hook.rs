// exit_hook.rs
// Process termination used by the fatal paths, replaceable for tests

use crate::errors::{RecoverReadLock, RecoverWriteLock};
use lazy_static::lazy_static;
use std::sync::{Arc, RwLock};

/// Exit status used by every fatal path.
pub const FATAL_EXIT_CODE: i32 = 1;

type ExitFn = Arc<dyn Fn(i32) + Send + Sync>;

lazy_static! {
    static ref EXIT_HOOK: RwLock<ExitFn> = RwLock::new(default_hook());
}

fn default_hook() -> ExitFn {
    Arc::new(|code| std::process::exit(code))
}

/// Replace process termination. A hook that returns lets the fatal call
/// return normally after its output has been written.
pub fn set_exit_hook<F>(hook: F)
where
    F: Fn(i32) + Send + Sync + 'static,
{
    *EXIT_HOOK.recover_write() = Arc::new(hook);
    tracing::debug!("exit hook replaced");
}

pub fn reset_exit_hook() {
    *EXIT_HOOK.recover_write() = default_hook();
}

/// Run the installed hook with `code`.
pub fn terminate(code: i32) {
    // Clone out so the hook runs without holding the lock.
    let hook = Arc::clone(&EXIT_HOOK.recover_read());
    tracing::debug!(code, "terminating");
    hook(code);
}
