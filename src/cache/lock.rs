use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

/// Lock a cache mutex, recovering the guard if a panicking thread poisoned it.
pub(crate) fn lock<'a, T>(
    mutex: &'a Mutex<T>,
    target: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| recover(poisoned, target, op, "mutex.lock"))
}

pub(crate) fn read<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    lock.read()
        .unwrap_or_else(|poisoned| recover(poisoned, target, op, "rwlock.read"))
}

pub(crate) fn write<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    lock.write()
        .unwrap_or_else(|poisoned| recover(poisoned, target, op, "rwlock.write"))
}

fn recover<G>(
    poisoned: PoisonError<G>,
    target: &'static str,
    op: &'static str,
    lock_kind: &'static str,
) -> G {
    warn!(
        op,
        target_module = target,
        lock_kind,
        result = "poisoned_recovered",
        "Recovered from poisoned cache lock"
    );
    poisoned.into_inner()
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    #[test]
    fn recovers_poisoned_mutex() {
        let mutex = Mutex::new(1_u32);

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = mutex.lock().expect("mutex should lock");
            panic!("poison");
        }));

        assert!(mutex.is_poisoned());
        *lock(&mutex, "cache::lock", "test") += 1;
        assert_eq!(*lock(&mutex, "cache::lock", "test"), 2);
    }

    #[test]
    fn recovers_poisoned_rwlock() {
        let rwlock = RwLock::new(vec![1_u32]);

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = rwlock.write().expect("rwlock should lock");
            panic!("poison");
        }));

        write(&rwlock, "cache::lock", "test").push(2);
        assert_eq!(*read(&rwlock, "cache::lock", "test"), vec![1, 2]);
    }
}
