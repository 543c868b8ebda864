//! type expression tree
//!
//! A [RecordType] owns its fields, a field owns its [ValueType] and a value owns its optional
//! nested literal. There is no sharing between nodes; rewrites mutate the tree in place.
//!
//! Field keys are not required to be unique. Duplicates are kept in parse order.

/// `{ key: value, ... }`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordType {
    pub fields: Vec<FieldType>,
}

impl RecordType {
    pub fn new(fields: Vec<FieldType>) -> Self {
        Self { fields }
    }

    /// First field with the given key
    pub fn field(&self, key: &str) -> Option<&FieldType> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.field(key).is_some()
    }
}

/// `< tag: value | ... >`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnionType {
    pub members: Vec<FieldType>,
}

impl UnionType {
    pub fn new(members: Vec<FieldType>) -> Self {
        Self { members }
    }

    pub fn member(&self, tag: &str) -> Option<&FieldType> {
        self.members.iter().find(|member| member.key == tag)
    }
}

/// A labelled value inside a record or union
///
/// Quoted labels keep their back-quotes in `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub key: String,
    pub value: ValueType,
}

impl FieldType {
    pub fn new(key: impl Into<String>, value: ValueType) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// A chain of type applications, optionally ending in a record or union literal
///
/// `Optional List { name : Text }` has the atoms `Optional`, `List` and a record tail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueType {
    pub atoms: Vec<String>,
    pub tail: Option<LastValueType>,
}

impl ValueType {
    pub fn new(atoms: Vec<String>, tail: Option<LastValueType>) -> Self {
        Self { atoms, tail }
    }

    /// Value consisting only of atoms, e.g. `Optional Text`
    pub fn from_atoms<I, S>(atoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            atoms: atoms.into_iter().map(Into::into).collect(),
            tail: None,
        }
    }

    pub fn record(&self) -> Option<&RecordType> {
        match &self.tail {
            Some(LastValueType::Record(record)) => Some(record),
            _ => None,
        }
    }

    pub fn record_mut(&mut self) -> Option<&mut RecordType> {
        match &mut self.tail {
            Some(LastValueType::Record(record)) => Some(record),
            _ => None,
        }
    }

    pub fn union(&self) -> Option<&UnionType> {
        match &self.tail {
            Some(LastValueType::Union(union)) => Some(union),
            _ => None,
        }
    }
}

impl From<RecordType> for ValueType {
    fn from(record: RecordType) -> Self {
        Self::new(vec![], Some(LastValueType::Record(record)))
    }
}

impl From<UnionType> for ValueType {
    fn from(union: UnionType) -> Self {
        Self::new(vec![], Some(LastValueType::Union(union)))
    }
}

/// Literal in the last position of a [ValueType]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastValueType {
    Record(RecordType),
    Union(UnionType),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn duplicate_keys_resolve_to_first() {
        let record = RecordType::new(vec![
            FieldType::new("a", ValueType::from_atoms(["Text"])),
            FieldType::new("a", ValueType::from_atoms(["Natural"])),
        ]);

        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.field("a").unwrap().value.atoms, vec!["Text"]);
        assert!(!record.contains_key("b"));
    }

    #[test]
    fn tail_accessors() {
        let value = ValueType::from(RecordType::default());
        assert!(value.record().is_some());
        assert!(value.union().is_none());

        let value = ValueType::from(UnionType::default());
        assert!(value.record().is_none());
        assert!(value.union().is_some());
    }
}
