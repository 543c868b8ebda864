use super::VisitMut;
use crate::value::{Object, Value};

/// Recursively visit all [Object]s mutably
///
/// An object is visited before its members, so members inserted or replaced by the visitor are
/// visited too.
pub trait VisitObjectsMut {
    fn visit_objects_mut(&mut self, visitor: &mut dyn VisitMut<Object>);
}

impl VisitObjectsMut for Value {
    fn visit_objects_mut(&mut self, visitor: &mut dyn VisitMut<Object>) {
        match self {
            Value::Object(object) => object.visit_objects_mut(visitor),
            Value::Array(array) => {
                for element in array {
                    element.visit_objects_mut(visitor);
                }
            }
            _ => {}
        }
    }
}

impl VisitObjectsMut for Object {
    fn visit_objects_mut(&mut self, visitor: &mut dyn VisitMut<Object>) {
        visitor.visit_mut(self);
        for value in self.values_mut() {
            value.visit_objects_mut(visitor);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parents_before_children() {
        let mut value: Value =
            serde_yaml::from_str("name: a\nchild:\n  name: b\nlist:\n  - name: c\n").unwrap();

        let mut seen = vec![];
        value.visit_objects_mut(&mut |object: &mut Object| {
            if let Some(name) = object.get("name").and_then(Value::as_str) {
                seen.push(name.to_string());
            }
        });

        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn replaced_members_are_visited() {
        let mut value: Value = serde_yaml::from_str("wrap: x\n").unwrap();

        let mut depth = 0;
        value.visit_objects_mut(&mut |object: &mut Object| {
            depth += 1;
            if let Some(member) = object.get_mut("wrap") {
                if depth < 3 {
                    *member = [("wrap", "x")].into_iter().collect();
                }
            }
        });

        assert_eq!(depth, 3);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"wrap":{"wrap":{"wrap":"x"}}}"#
        );
    }
}
