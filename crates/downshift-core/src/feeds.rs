use crate::{IOName, Tensor};

/// Named input tensors for one inference call. Keys are unique; inserting
/// an existing name replaces the previous tensor. Insertion order is kept
/// only so that display output is stable.
#[derive(Debug, Default)]
pub struct Feeds(Vec<(IOName, Tensor)>);

impl Feeds {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, name: IOName, tensor: Tensor) {
        if let Some(entry) = self.0.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = tensor;
        } else {
            self.0.push((name, tensor));
        }
    }

    pub fn with(mut self, name: impl Into<String>, tensor: Tensor) -> Self {
        self.insert(IOName::new(name), tensor);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(IOName, Tensor)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<(IOName, Tensor)> {
        self.0
    }
}

impl FromIterator<(IOName, Tensor)> for Feeds {
    fn from_iter<T: IntoIterator<Item = (IOName, Tensor)>>(iter: T) -> Self {
        let mut feeds = Feeds::new();
        for (name, tensor) in iter {
            feeds.insert(name, tensor);
        }
        feeds
    }
}

/// Runtime outputs, in the order the runtime produced them. Untouched by
/// the session layer.
pub type Outputs = Vec<(IOName, Tensor)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_insert_replaces() {
        let mut feeds = Feeds::new();
        feeds.insert(IOName::new("a"), Tensor::from_f32(&[1], &[1.0]));
        feeds.insert(IOName::new("a"), Tensor::from_f32(&[2], &[1.0, 2.0]));
        assert_eq!(feeds.len(), 1);
        let (_, t) = &feeds.into_inner()[0];
        assert_eq!(t.shape.dims(), &[2]);
    }
}
