//! Ready-made class info oracles

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{extract, ClassInfoOracle, ClassShapeSummary};
use crate::error::Result;
use crate::pool::Utf8Entry;

/// Knows nothing: every class declares no methods and has no ancestors
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyOracle;

impl ClassInfoOracle for EmptyOracle {
    fn lookup(&self, _class_name: &Utf8Entry) -> Result<Arc<ClassShapeSummary>> {
        Ok(Arc::new(ClassShapeSummary::empty()))
    }
}

/// Origin-namespace class files keyed by class name. Each lookup extracts
/// the shape again; unknown classes answer with an empty shape.
#[derive(Debug, Clone, Default)]
pub struct ClassBytesOracle {
    classes: HashMap<Utf8Entry, Arc<[u8]>>,
}

impl ClassBytesOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class file under the name it declares
    pub fn add_class(&mut self, bytes: impl Into<Arc<[u8]>>) -> Result<Utf8Entry> {
        let bytes = bytes.into();
        let name = extract(&bytes)?.name;
        self.classes.insert(name.clone(), bytes);
        Ok(name)
    }

    pub fn insert(&mut self, name: impl Into<Utf8Entry>, bytes: impl Into<Arc<[u8]>>) {
        self.classes.insert(name.into(), bytes.into());
    }

    pub fn contains(&self, name: &Utf8Entry) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassInfoOracle for ClassBytesOracle {
    fn lookup(&self, class_name: &Utf8Entry) -> Result<Arc<ClassShapeSummary>> {
        match self.classes.get(class_name) {
            Some(bytes) => Ok(Arc::new(extract(bytes)?.summary)),
            None => {
                log::trace!("no class file for {}", class_name);
                Ok(Arc::new(ClassShapeSummary::empty()))
            }
        }
    }
}

/// Memoizes another oracle's answers. Safe to share across threads that
/// remap classes concurrently; failures are not cached.
#[derive(Debug, Default)]
pub struct CachingOracle<O> {
    inner: O,
    cache: Mutex<HashMap<Utf8Entry, Arc<ClassShapeSummary>>>,
}

impl<O: ClassInfoOracle> CachingOracle<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    pub fn cached_len(&self) -> usize {
        match self.cache.lock() {
            Ok(cache) => cache.len(),
            Err(_) => {
                log::warn!("class info cache is poisoned");
                0
            }
        }
    }
}

impl<O: ClassInfoOracle> ClassInfoOracle for CachingOracle<O> {
    fn lookup(&self, class_name: &Utf8Entry) -> Result<Arc<ClassShapeSummary>> {
        match self.cache.lock() {
            Ok(cache) => {
                if let Some(shape) = cache.get(class_name) {
                    return Ok(Arc::clone(shape));
                }
            }
            Err(_) => log::warn!("class info cache is poisoned; looking up {} uncached", class_name),
        }
        // the lock is not held across the inner lookup, so two threads may
        // both compute a missing entry; the first insert wins
        let shape = self.inner.lookup(class_name)?;
        match self.cache.lock() {
            Ok(mut cache) => Ok(Arc::clone(cache.entry(class_name.clone()).or_insert(shape))),
            Err(_) => {
                log::warn!("class info cache is poisoned; not caching {}", class_name);
                Ok(shape)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::writer::access;
    use crate::classfile::ClassFileWriter;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn e(text: &str) -> Utf8Entry {
        Utf8Entry::from(text)
    }

    #[test]
    fn test_empty_oracle() {
        let shape = EmptyOracle.lookup(&e("a/Anything")).unwrap();
        assert!(shape.ancestors().is_empty());
        assert_eq!(shape.method_count(), 0);
    }

    #[test]
    fn test_class_bytes_oracle_extracts_on_demand() {
        let mut writer = ClassFileWriter::new("a/B", Some("java/lang/Object"));
        writer.add_method(access::ACC_PUBLIC, "run", "()V", vec![]);
        let mut oracle = ClassBytesOracle::new();
        let name = oracle.add_class(writer.to_bytes().unwrap()).unwrap();
        assert_eq!(name, e("a/B"));
        assert!(oracle.contains(&name));

        let shape = oracle.lookup(&name).unwrap();
        assert!(shape.declares(&e("run"), &e("()V")));
        assert_eq!(shape.super_class(), Some(&e("java/lang/Object")));

        let unknown = oracle.lookup(&e("a/Missing")).unwrap();
        assert!(unknown.ancestors().is_empty());
    }

    #[test]
    fn test_class_bytes_oracle_propagates_corruption() {
        let mut oracle = ClassBytesOracle::new();
        oracle.insert("a/Broken", vec![0xCA, 0xFE]);
        assert!(matches!(oracle.lookup(&e("a/Broken")), Err(Error::Truncated { .. })));
    }

    #[test]
    fn test_caching_oracle_asks_once() {
        let calls = AtomicUsize::new(0);
        let counting = |_: &Utf8Entry| -> Result<Arc<ClassShapeSummary>> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(ClassShapeSummary::new(vec![e("a/Base")])))
        };
        let oracle = CachingOracle::new(counting);
        let first = oracle.lookup(&e("a/X")).unwrap();
        let second = oracle.lookup(&e("a/X")).unwrap();
        oracle.lookup(&e("a/Y")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(oracle.cached_len(), 2);
    }

    #[test]
    fn test_caching_oracle_does_not_cache_failures() {
        let calls = AtomicUsize::new(0);
        let failing = |_: &Utf8Entry| -> Result<Arc<ClassShapeSummary>> {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::truncated(0, 1))
        };
        let oracle = CachingOracle::new(failing);
        assert!(oracle.lookup(&e("a/X")).is_err());
        assert!(oracle.lookup(&e("a/X")).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(oracle.cached_len(), 0);
    }

    #[test]
    fn test_poisoned_cache_falls_back_to_inner_oracle() {
        let calls = AtomicUsize::new(0);
        let counting = |_: &Utf8Entry| -> Result<Arc<ClassShapeSummary>> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(ClassShapeSummary::empty()))
        };
        let oracle = CachingOracle::new(counting);
        oracle.lookup(&e("a/X")).unwrap();

        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = oracle.cache.lock().unwrap();
            panic!("writer died holding the cache");
        }));
        assert!(poisoned.is_err());
        assert!(oracle.cache.is_poisoned());

        assert_eq!(oracle.cached_len(), 0);
        assert!(oracle.lookup(&e("a/X")).is_ok());
        assert!(oracle.lookup(&e("a/X")).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
