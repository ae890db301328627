//! The `variables` module implements the server's named variable table.
//!
//! Descriptors are registered once per server in a [`VariableTable`] and shared by every
//! request. Each request keeps its own [`VariableValue`] slots for the indexed descriptors,
//! so values computed for one request are cached for the rest of it unless the value is
//! flagged `no_cacheable`.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::context::RequestContext;

pub mod assigner;
pub mod builtin;
pub mod resolver;

pub use self::assigner::var_set;
pub use self::resolver::{get_variable, var_get};

/// Computes a variable value for a request. Gets the lower-cased variable name (useful for
/// prefix variables) and the descriptor's opaque data. `None` signals that the value could
/// not be produced.
pub type GetHandler =
    Arc<dyn Fn(&RequestContext, &str, usize) -> Option<VariableValue> + Send + Sync>;

/// Applies an assigned value to the request. Gets the descriptor's opaque data.
pub type SetHandler = Arc<dyn Fn(&mut RequestContext, &VariableValue, usize) + Send + Sync>;

/// Wrap a getter so it can be stored in a descriptor
pub fn getter<F>(f: F) -> GetHandler
where
    F: Fn(&RequestContext, &str, usize) -> Option<VariableValue> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a setter so it can be stored in a descriptor
pub fn setter<F>(f: F) -> SetHandler
where
    F: Fn(&mut RequestContext, &VariableValue, usize) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Value of one variable for one request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableValue {
    /// Value bytes
    pub data: Vec<u8>,
    /// The value has been computed
    pub valid: bool,
    /// Lookup failed, there is no value
    pub not_found: bool,
    /// The value must be recomputed on every read
    pub no_cacheable: bool,
}

impl VariableValue {
    /// A valid value holding `data`
    pub fn new<D: Into<Vec<u8>>>(data: D) -> VariableValue {
        VariableValue {
            data: data.into(),
            valid: true,
            not_found: false,
            no_cacheable: false,
        }
    }

    /// A value marking the variable as not found
    pub fn not_found() -> VariableValue {
        VariableValue {
            not_found: true,
            ..VariableValue::default()
        }
    }

    /// Length of the value in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// If the value is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Schema entry for one named variable
#[derive(Clone, Default)]
pub struct VariableDescriptor {
    /// Lower-cased name. For prefix variables this is the prefix, e.g. `http_`.
    pub name: String,
    /// Scripts may assign the variable
    pub changeable: bool,
    /// Values are recomputed on every read
    pub no_cacheable: bool,
    /// The descriptor serves every name starting with `name`
    pub prefix: bool,
    /// Computes the value
    pub get_handler: Option<GetHandler>,
    /// Applies an assigned value
    pub set_handler: Option<SetHandler>,
    /// Slot in the per-request value array, assigned by [`VariableTable::add_indexed`]
    pub index: Option<usize>,
    /// Opaque data handed to the handlers
    pub data: usize,
}

impl fmt::Debug for VariableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableDescriptor")
            .field("name", &self.name)
            .field("changeable", &self.changeable)
            .field("no_cacheable", &self.no_cacheable)
            .field("prefix", &self.prefix)
            .field("get_handler", &self.get_handler.is_some())
            .field("set_handler", &self.set_handler.is_some())
            .field("index", &self.index)
            .field("data", &self.data)
            .finish()
    }
}

impl VariableDescriptor {
    /// Read-only variable without handlers
    pub fn new(name: &str) -> VariableDescriptor {
        VariableDescriptor {
            name: name.to_ascii_lowercase(),
            ..VariableDescriptor::default()
        }
    }

    /// Allows scripts to assign the variable
    pub fn changeable(mut self) -> Self {
        self.changeable = true;
        self
    }

    /// Forces the value to be recomputed on every read
    pub fn no_cacheable(mut self) -> Self {
        self.no_cacheable = true;
        self
    }

    /// Makes the descriptor serve every name starting with its name
    pub fn prefix(mut self) -> Self {
        self.prefix = true;
        self
    }

    /// Sets the getter and its opaque data
    pub fn with_getter(mut self, handler: GetHandler, data: usize) -> Self {
        self.get_handler = Some(handler);
        self.data = data;
        self
    }

    /// Sets the setter
    pub fn with_setter(mut self, handler: SetHandler) -> Self {
        self.set_handler = Some(handler);
        self
    }
}

/// Case-normalized hash of a variable name. Works on a lower-cased copy, the caller's name
/// is left as it was.
pub fn hash_key(name: &str) -> (u64, String) {
    let key = name.to_ascii_lowercase();
    let hash = key
        .bytes()
        .fold(0u64, |hash, b| hash.wrapping_mul(31).wrapping_add(u64::from(b)));
    (hash, key)
}

/// Server-wide table of variable descriptors
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    descriptors: Vec<VariableDescriptor>,
    buckets: HashMap<u64, Vec<usize>>,
    prefixes: Vec<usize>,
    indexed: usize,
}

impl VariableTable {
    /// Creates an empty table
    pub fn new() -> VariableTable {
        VariableTable::default()
    }

    /// Registers a descriptor that has no per-request slot. A descriptor with the same name
    /// replaces the earlier one.
    pub fn add(&mut self, descriptor: VariableDescriptor) -> &VariableDescriptor {
        let (hash, key) = hash_key(&descriptor.name);
        let descriptor = VariableDescriptor {
            name: key,
            ..descriptor
        };
        let position = match self.position(hash, &descriptor.name, descriptor.prefix) {
            Some(position) => {
                self.descriptors[position] = descriptor;
                position
            }
            None => {
                let position = self.descriptors.len();
                if descriptor.prefix {
                    self.prefixes.push(position);
                } else {
                    self.buckets.entry(hash).or_insert_with(Vec::new).push(position);
                }
                self.descriptors.push(descriptor);
                position
            }
        };
        &self.descriptors[position]
    }

    /// Registers a descriptor and gives it the next per-request slot. Re-registering an
    /// indexed name keeps its slot.
    pub fn add_indexed(&mut self, mut descriptor: VariableDescriptor) -> &VariableDescriptor {
        let (hash, key) = hash_key(&descriptor.name);
        let existing = self
            .position(hash, &key, descriptor.prefix)
            .and_then(|position| self.descriptors[position].index);
        descriptor.index = match existing {
            Some(index) => Some(index),
            None => {
                self.indexed += 1;
                Some(self.indexed - 1)
            }
        };
        self.add(descriptor)
    }

    /// Looks up a descriptor by normalized hash and lower-cased name
    pub fn find(&self, hash: u64, key: &str) -> Option<&VariableDescriptor> {
        self.buckets.get(&hash).and_then(|positions| {
            positions
                .iter()
                .map(|position| &self.descriptors[*position])
                .find(|descriptor| descriptor.name == key)
        })
    }

    /// Looks up a descriptor by name, ignoring case
    pub fn lookup(&self, name: &str) -> Option<&VariableDescriptor> {
        let (hash, key) = hash_key(name);
        self.find(hash, &key)
    }

    /// Finds the prefix descriptor serving a lower-cased name
    pub fn find_prefix(&self, key: &str) -> Option<&VariableDescriptor> {
        self.prefixes
            .iter()
            .map(|position| &self.descriptors[*position])
            .find(|descriptor| key.starts_with(descriptor.name.as_str()))
    }

    /// Number of per-request slots needed
    pub fn indexed_count(&self) -> usize {
        self.indexed
    }

    /// Number of registered descriptors
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// If no descriptor is registered
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Registered descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.descriptors.iter()
    }

    fn position(&self, hash: u64, key: &str, prefix: bool) -> Option<usize> {
        if prefix {
            self.prefixes
                .iter()
                .copied()
                .find(|position| self.descriptors[*position].name == key)
        } else {
            self.buckets.get(&hash).and_then(|positions| {
                positions
                    .iter()
                    .copied()
                    .find(|position| self.descriptors[*position].name == key)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expectest::prelude::*;

    #[test]
    fn hash_key_ignores_case_and_keeps_the_input() {
        let name = String::from("Limit_Rate");
        let (hash, key) = hash_key(&name);
        expect!(key.as_str()).to(be_equal_to("limit_rate"));
        expect!(hash).to(be_equal_to(hash_key("limit_rate").0));
        expect!(name.as_str()).to(be_equal_to("Limit_Rate"));
    }

    #[test]
    fn indexed_descriptors_get_consecutive_slots() {
        let mut table = VariableTable::new();
        table.add_indexed(VariableDescriptor::new("a"));
        table.add(VariableDescriptor::new("b"));
        table.add_indexed(VariableDescriptor::new("C"));
        expect!(table.lookup("a").and_then(|d| d.index)).to(be_some().value(0));
        expect!(table.lookup("b").and_then(|d| d.index)).to(be_none());
        expect!(table.lookup("c").and_then(|d| d.index)).to(be_some().value(1));
        expect!(table.indexed_count()).to(be_equal_to(2));
    }

    #[test]
    fn re_registering_keeps_the_slot() {
        let mut table = VariableTable::new();
        table.add_indexed(VariableDescriptor::new("a"));
        table.add_indexed(VariableDescriptor::new("a").changeable());
        expect!(table.len()).to(be_equal_to(1));
        expect!(table.indexed_count()).to(be_equal_to(1));
        expect!(table.lookup("A").map(|d| d.changeable)).to(be_some().value(true));
    }

    #[test]
    fn prefix_descriptors_are_not_found_by_exact_lookup() {
        let mut table = VariableTable::new();
        table.add(VariableDescriptor::new("http_").prefix());
        expect!(table.lookup("http_").is_none()).to(be_true());
        expect!(table.find_prefix("http_host").map(|d| d.name.clone()))
            .to(be_some().value("http_".to_string()));
        expect!(table.find_prefix("host").is_none()).to(be_true());
    }
}
