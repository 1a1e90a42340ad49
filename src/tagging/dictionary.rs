use std::collections::HashMap;

/// Bidirectional mapping between names and dense integer ids
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    ids: HashMap<String, u32>,
    names: Vec<String>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Id of `name`, assigning the next free id when it is new
    pub fn get_or_insert(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len() as u32;
        self.ids.insert(name.to_string(), id);
        self.names.push(name.to_string());
        id
    }

    pub fn id(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.names.clear();
    }

    /// Iterate over `(name, id)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.as_str(), id as u32))
    }
}
