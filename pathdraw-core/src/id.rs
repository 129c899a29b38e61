//! # IDs
//! Process-unique handles, namespaced by a marker type. Used for backend path handles and host
//! subscriptions, so a stale handle from one namespace can never be confused for another.
//!
//! Allocate with `Id::default()`. Values are unique, not ordered.

// Next free id per namespace.
static ID_SERVER: parking_lot::RwLock<
    std::collections::BTreeMap<std::any::TypeId, std::sync::atomic::AtomicU64>,
> = parking_lot::const_rwlock(std::collections::BTreeMap::new());

pub struct Id<T: std::any::Any> {
    id: std::num::NonZeroU64,
    _phantom: std::marker::PhantomData<T>,
}
impl<T: std::any::Any> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: std::any::Any> Copy for Id<T> {}
impl<T: std::any::Any> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<T: std::any::Any> Eq for Id<T> {}
// The marker is never stored, so it should not affect auto traits.
unsafe impl<T: std::any::Any> Send for Id<T> {}
unsafe impl<T: std::any::Any> Sync for Id<T> {}
impl<T: std::any::Any> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
impl<T: std::any::Any> Id<T> {
    #[must_use]
    pub fn get(&self) -> u64 {
        self.id.get()
    }
    fn allocate() -> Self {
        let ty = std::any::TypeId::of::<T>();
        let next = {
            let read = ID_SERVER.upgradable_read();
            if let Some(counter) = read.get(&ty) {
                counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            } else {
                // First allocation in this namespace, needs exclusive access once.
                let mut write = parking_lot::RwLockUpgradableReadGuard::upgrade(read);
                write
                    .entry(ty)
                    .or_insert_with(|| std::sync::atomic::AtomicU64::new(1))
                    .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            }
        };
        // Starts at one, and 2^64 handles is not a real concern for a drawing session.
        let Some(id) = std::num::NonZeroU64::new(next) else {
            log::error!("{} id space exhausted", std::any::type_name::<T>());
            std::process::abort();
        };
        Self {
            id,
            _phantom: std::marker::PhantomData,
        }
    }
}
impl<T: std::any::Any> Default for Id<T> {
    fn default() -> Self {
        Self::allocate()
    }
}
impl<T: std::any::Any> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = std::any::type_name::<T>();
        // rsplit always yields at least one item.
        let short = name.rsplit("::").next().unwrap_or(name);
        write!(f, "{short}#{}", self.id)
    }
}
impl<T: std::any::Any> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use super::Id;
    // Every test gets its own namespace, as the counters are process-global.
    #[test]
    fn unique_within_namespace() {
        struct Namespace;
        let mut ids: Vec<u64> = (0..256).map(|_| Id::<Namespace>::default().get()).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(before, ids.len(), "had duplicate ids");
    }
    #[test]
    fn display_is_namespaced() {
        struct Marker;
        let id = Id::<Marker>::default();
        assert_eq!(id.to_string(), format!("Marker#{}", id.get()));
    }
}
