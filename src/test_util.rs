use crate::source::EnvSource;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory environment that tests can mutate after handing it to a wrapper
#[derive(Debug, Clone, Default)]
pub struct SharedEnv(Arc<Mutex<HashMap<String, String>>>);

impl SharedEnv {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        let env = Self::default();
        for (key, value) in pairs {
            env.set(key, value);
        }
        env
    }

    pub fn set(&self, key: &str, value: &str) {
        self.0
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn remove(&self, key: &str) {
        self.0.lock().unwrap().remove(key);
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

impl EnvSource for SharedEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.0.lock().unwrap().get(key).cloned()
    }
}
