use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

// copy from https://github.com/tikv/tikv/blob/b15ea3b1cd766375cb52019e35c195ed797124df/components/tikv_util/src/lib.rs#L171-L186
/// A handy shortcut to replace the `RwLock` write/read().unwrap() pattern
/// with `wl`/`rl`.
pub trait HandyRwLock<T> {
    fn wl(&self) -> RwLockWriteGuard<'_, T>;
    fn rl(&self) -> RwLockReadGuard<'_, T>;
}

impl<T> HandyRwLock<T> for RwLock<T> {
    fn wl(&self) -> RwLockWriteGuard<'_, T> {
        self.write().unwrap()
    }

    fn rl(&self) -> RwLockReadGuard<'_, T> {
        self.read().unwrap()
    }
}

pub fn init_log() {
    use env_logger::Builder;
    use std::io::Write;
    use std::sync::Once;

    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let mut builder = Builder::from_default_env();
        builder
            .format_timestamp_secs()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{} - {}] [{}:{}] {}",
                    record.level(),
                    record.target(),
                    record.file().unwrap_or("?"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            })
            .is_test(true)
            .try_init()
            .ok();
    });
}

/// FNV-1a, stable across process runs (unlike `DefaultHasher`, which is
/// randomly seeded per process). Used to derive a table id from a file's
/// absolute path.
pub fn stable_hash(s: &str) -> i32 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in s.as_bytes() {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash as i32) & i32::MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_hash_is_stable() {
        assert_eq!(stable_hash("/tmp/foo.db"), stable_hash("/tmp/foo.db"));
    }

    #[test]
    fn stable_hash_differs_by_path() {
        assert_ne!(stable_hash("/tmp/foo.db"), stable_hash("/tmp/bar.db"));
    }
}
