//! Observer tracking
//!
//! Observers are points of interest (cameras, players, listeners) that
//! streaming logic uses to decide what to load. The world only stores them.

use crate::foundation::math::Vec3;
use std::fmt;

/// Opaque observer identifier chosen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverKey(pub u64);

impl fmt::Display for ObserverKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer:{}", self.0)
    }
}

/// A tracked observer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    /// Identifier
    pub key: ObserverKey,
    /// Last reported location
    pub location: Vec3,
}

/// Observers keyed by identifier, in insertion order
#[derive(Debug, Default)]
pub struct ObserverList {
    observers: Vec<Observer>,
}

impl ObserverList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new observer. Returns false, and only moves it, if the key
    /// is already tracked.
    pub fn add(&mut self, key: ObserverKey, location: Vec3) -> bool {
        if self.update(key, location) {
            return false;
        }
        self.observers.push(Observer { key, location });
        true
    }

    /// Move a tracked observer; false if unknown
    pub fn update(&mut self, key: ObserverKey, location: Vec3) -> bool {
        match self.observers.iter_mut().find(|o| o.key == key) {
            Some(observer) => {
                observer.location = location;
                true
            }
            None => false,
        }
    }

    /// Stop tracking; false if unknown
    pub fn remove(&mut self, key: ObserverKey) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| o.key != key);
        self.observers.len() != before
    }

    /// Look up one observer
    pub fn get(&self, key: ObserverKey) -> Option<&Observer> {
        self.observers.iter().find(|o| o.key == key)
    }

    /// All observers
    pub fn iter(&self) -> impl Iterator<Item = &Observer> {
        self.observers.iter()
    }

    /// Number of observers
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// True when nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_lifecycle() {
        let mut observers = ObserverList::new();
        let camera = ObserverKey(9);
        assert!(observers.add(camera, Vec3::zeros()));
        assert!(!observers.add(camera, Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(observers.len(), 1);
        assert_eq!(observers.get(camera).unwrap().location, Vec3::new(1.0, 0.0, 0.0));

        assert!(observers.update(camera, Vec3::new(2.0, 0.0, 0.0)));
        assert!(!observers.update(ObserverKey(1), Vec3::zeros()));
        assert!(observers.remove(camera));
        assert!(!observers.remove(camera));
        assert!(observers.is_empty());
    }
}
