use serde::{Deserialize, Serialize};

/// Namespace-local identifier. Valid ids start at 1.
pub type Id = i32;

/// Returned by lookups that miss.
pub const NOT_FOUND: Id = -1;

/// Name of the only built-in type.
pub const INT_TYPE: &str = "int";

/// Prefixes of compiler-synthesized variable and label names. The leading
/// dot keeps them apart from anything the lexer accepts as an identifier.
pub const TEMP_PREFIX: &str = ".TEMP_";
pub const LABEL_PREFIX: &str = ".LABEL_";
pub const LITERAL_PREFIX: &str = ".LITERAL_";

/// One binding in a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub id: Id,
    pub name: String,
    /// Declared type for variables, `NOT_FOUND` for types and labels.
    pub type_id: Id,
}

/// Append-only list of bindings. An entry's id is its 1-based insertion
/// position.
///
/// Callers check for an existing name before calling [`Namespace::create`];
/// the namespace itself does not reject duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    names: Vec<Name>,
}

impl Namespace {
    pub fn create(&mut self, name: &str, type_id: Id) -> &Name {
        let id = Id::try_from(self.names.len() + 1).unwrap_or(Id::MAX);
        self.names.push(Name {
            id,
            name: name.to_string(),
            type_id,
        });
        &self.names[self.names.len() - 1]
    }

    pub fn get(&self, name: &str) -> Option<&Name> {
        self.names.iter().find(|n| n.name == name)
    }

    /// Id bound to `name`, or [`NOT_FOUND`].
    pub fn check(&self, name: &str) -> Id {
        self.get(name).map_or(NOT_FOUND, |n| n.id)
    }

    pub fn by_id(&self, id: Id) -> Option<&Name> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.names.get(index)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Name> {
        self.names.iter()
    }
}

/// The three independent namespaces of a compilation.
///
/// Built by the analyzer, extended by the IR generator with temporaries,
/// synthesized labels and pooled literals, then read by the VM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    pub types: Namespace,
    pub labels: Namespace,
    pub vars: Namespace,
}

impl SymbolTable {
    /// An empty table with `int` registered.
    pub fn new() -> Self {
        let mut table = SymbolTable::default();
        table.types.create(INT_TYPE, NOT_FOUND);
        table
    }

    pub fn int_type(&self) -> Id {
        self.types.check(INT_TYPE)
    }

    pub fn variable_name(&self, id: Id) -> Option<&str> {
        self.vars.by_id(id).map(|n| n.name.as_str())
    }

    pub fn label_name(&self, id: Id) -> Option<&str> {
        self.labels.by_id(id).map(|n| n.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_one_based_and_monotonic() {
        let mut ns = Namespace::default();
        assert_eq!(ns.create("a", 1).id, 1);
        assert_eq!(ns.create("b", 1).id, 2);
        assert_eq!(ns.create("c", 1).id, 3);
        assert_eq!(ns.len(), 3);
    }

    #[test]
    fn test_check_miss_returns_sentinel() {
        let ns = Namespace::default();
        assert_eq!(ns.check("nope"), NOT_FOUND);
        assert!(ns.get("nope").is_none());
    }

    #[test]
    fn test_by_id_bounds() {
        let mut ns = Namespace::default();
        ns.create("x", 1);
        assert_eq!(ns.by_id(1).map(|n| n.name.as_str()), Some("x"));
        assert!(ns.by_id(0).is_none());
        assert!(ns.by_id(2).is_none());
        assert!(ns.by_id(-1).is_none());
    }

    #[test]
    fn test_namespaces_are_independent() {
        let mut table = SymbolTable::new();
        let label = table.labels.create("x", NOT_FOUND).id;
        let var = table.vars.create("x", table.int_type()).id;
        assert_eq!(label, 1);
        assert_eq!(var, 1);
        assert_eq!(table.labels.check("x"), 1);
        assert_eq!(table.vars.check("x"), 1);
    }

    #[test]
    fn test_int_is_preregistered() {
        let table = SymbolTable::new();
        assert_eq!(table.int_type(), 1);
        assert_eq!(table.types.len(), 1);
        assert!(table.vars.is_empty());
    }
}
