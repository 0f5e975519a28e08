/// A single path parameter captured during lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub value: String,
}

/// Parameter bindings in the order their wildcard segments appear along the
/// matched path. Backed by a plain vector; no allocation happens until the
/// first capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<Param>);

impl Params {
    pub fn new() -> Self {
        Params(Vec::new())
    }

    /// Value of the first (and only) binding for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.0.iter()
    }

    pub(crate) fn push(&mut self, name: &str, value: &str) {
        if self.0.capacity() == 0 {
            // Two parameters covers the typical API route.
            self.0.reserve(2);
        }
        self.0.push(Param {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
