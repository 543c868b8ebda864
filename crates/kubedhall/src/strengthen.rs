//! schema strengthening
//!
//! `dhall type` infers the loosest type that fits the manifests it was given. Some fields are
//! known to deserve a more precise type, and [strengthen] swaps those in:
//!
//! | field                  | rewrite                                                      |
//! |------------------------|--------------------------------------------------------------|
//! | `limits` / `requests`  | fixed `{ cpu, memory, ephemeralStorage : Optional Text }`    |
//! | `image`                | `< asText : Text \| asRecord : { name, registry, sha256, version : Text } >` |
//! | `metadata`             | adds `namespace : Optional Text` when missing                |
//! | `env`                  | every variable becomes `Optional`, root gains `additionalEnv` |
//! | any other record       | descend                                                      |
//!
//! Each rule only fires on fields whose value ends in a record literal. Anything else is left
//! untouched, the pass never fails.
use crate::ast::{FieldType, LastValueType, RecordType, UnionType, ValueType};
use crate::parser::parse_record_type;
use once_cell::sync::Lazy;

const CONTAINER_RESOURCES_SOURCE: &str = "
{ cpu : Optional Text
, memory : Optional Text
, ephemeralStorage : Optional Text
}
";

const DOCKER_IMAGE_SOURCE: &str = "
{ image :
    < asText : Text
    | asRecord : { name : Text, registry : Text, sha256 : Text, version : Text }
    >
}
";

const ADDITIONAL_ENV_SOURCE: &str =
    "{ additionalEnv : Optional (List { name : Text, value : Text }) }";

pub const ADDITIONAL_ENV: &str = "additionalEnv";

static CONTAINER_RESOURCES: Lazy<RecordType> = Lazy::new(|| builtin(CONTAINER_RESOURCES_SOURCE));

static DOCKER_IMAGE: Lazy<UnionType> = Lazy::new(|| {
    builtin(DOCKER_IMAGE_SOURCE)
        .fields
        .into_iter()
        .find_map(|field| match field.value.tail {
            Some(LastValueType::Union(union)) => Some(union),
            _ => None,
        })
        .expect("docker image schema must contain a union")
});

static ADDITIONAL_ENV_FIELD: Lazy<FieldType> = Lazy::new(|| {
    builtin(ADDITIONAL_ENV_SOURCE)
        .fields
        .pop()
        .expect("additional env schema must contain a field")
});

fn builtin(source: &str) -> RecordType {
    parse_record_type(source).expect("builtin schema must parse")
}

/// Rewrite the known loosely typed fields of `record` in place
///
/// ```
/// use kubedhall::{parser::parse_record_type, strengthen::strengthen};
///
/// let mut record = parse_record_type("{ metadata : { name : Text } }").unwrap();
/// strengthen(&mut record);
///
/// let metadata = record.field("metadata").unwrap().value.record().unwrap();
/// assert!(metadata.contains_key("namespace"));
/// ```
#[tracing::instrument(level = "trace", skip_all)]
pub fn strengthen(record: &mut RecordType) {
    let mut strengthener = Strengthener::new();
    strengthener.visit_record(record);

    if strengthener.env_rewritten && !record.contains_key(ADDITIONAL_ENV) {
        tracing::trace!("adding {ADDITIONAL_ENV} to root");
        record.fields.push(ADDITIONAL_ENV_FIELD.clone());
    }
}

/// What happens to a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    ContainerResources,
    DockerImage,
    Metadata,
    Env,
    Descend,
    Keep,
}

impl Rule {
    fn select(field: &FieldType) -> Self {
        if field.value.record().is_none() {
            return Rule::Keep;
        }

        match field.key.as_str() {
            "limits" | "requests" => Rule::ContainerResources,
            "image" => Rule::DockerImage,
            "metadata" => Rule::Metadata,
            "env" => Rule::Env,
            _ => Rule::Descend,
        }
    }
}

#[derive(derive_new::new)]
struct Strengthener {
    /// an `env` record was rewritten somewhere in the tree
    #[new(default)]
    env_rewritten: bool,
}

impl Strengthener {
    fn visit_record(&mut self, record: &mut RecordType) {
        for field in &mut record.fields {
            self.visit_field(field);
        }
    }

    fn visit_field(&mut self, field: &mut FieldType) {
        let rule = Rule::select(field);
        if rule != Rule::Keep {
            tracing::trace!(field = %field.key, ?rule, "applying rule");
        }

        match rule {
            Rule::ContainerResources => {
                field.value.tail = Some(LastValueType::Record(CONTAINER_RESOURCES.clone()));
            }
            Rule::DockerImage => {
                field.value.tail = Some(LastValueType::Union(DOCKER_IMAGE.clone()));
            }
            Rule::Metadata => {
                if let Some(metadata) = field.value.record_mut() {
                    if !metadata.contains_key("namespace") {
                        metadata.fields.push(FieldType::new(
                            "namespace",
                            ValueType::from_atoms(["Optional", "Text"]),
                        ));
                    }
                }
            }
            Rule::Env => {
                if let Some(env) = field.value.record_mut() {
                    for variable in &mut env.fields {
                        let atoms = &mut variable.value.atoms;
                        if atoms.first().map(String::as_str) != Some("Optional") {
                            atoms.insert(0, "Optional".to_string());
                        }
                    }
                }
                self.env_rewritten = true;
            }
            Rule::Descend => {
                if let Some(nested) = field.value.record_mut() {
                    self.visit_record(nested);
                }
            }
            Rule::Keep => {}
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::printer::ToSource;
    use pretty_assertions::assert_eq;

    fn strengthened(source: &str) -> RecordType {
        let mut record = parse_record_type(source).unwrap();
        strengthen(&mut record);
        record
    }

    fn parsed(source: &str) -> RecordType {
        parse_record_type(source).unwrap()
    }

    #[test]
    fn container_resources() {
        assert_eq!(
            strengthened("{ limits : { cpu : Text } }"),
            parsed(
                "{ limits : { cpu : Optional Text, memory : Optional Text, ephemeralStorage : Optional Text } }"
            )
        );
        assert_eq!(
            strengthened("{ requests : { memory : Text } }"),
            parsed(
                "{ requests : { cpu : Optional Text, memory : Optional Text, ephemeralStorage : Optional Text } }"
            )
        );
    }

    #[test]
    fn docker_image() {
        assert_eq!(
            strengthened("{ image : { name : Text } }"),
            parsed(
                "{ image : < asText : Text | asRecord : { name : Text, registry : Text, sha256 : Text, version : Text } > }"
            )
        );
    }

    #[test]
    fn docker_image_is_left_alone_once_a_union() {
        let once = strengthened("{ image : { name : Text } }");
        let mut twice = once.clone();
        strengthen(&mut twice);
        assert_eq!(twice, once);
    }

    #[test]
    fn scalar_image_is_left_alone() {
        assert_eq!(strengthened("{ image : Text }"), parsed("{ image : Text }"));
    }

    #[test]
    fn metadata_namespace() {
        assert_eq!(
            strengthened("{ metadata : { name : Text } }"),
            parsed("{ metadata : { name : Text, namespace : Optional Text } }")
        );
        assert_eq!(
            strengthened("{ metadata : { name : Text, namespace : Optional Text } }"),
            parsed("{ metadata : { name : Text, namespace : Optional Text } }")
        );
    }

    #[test]
    fn env_variables_become_optional() {
        assert_eq!(
            strengthened("{ env : { FOO : Text } }"),
            parsed(
                "{ env : { FOO : Optional Text }, additionalEnv : Optional (List { name : Text, value : Text }) }"
            )
        );
    }

    #[test]
    fn env_record_variables() {
        let record = strengthened("{ env : { FOO : { name : Text, value : Text } } }");
        let foo = record.field("env").unwrap().value.record().unwrap().field("FOO").unwrap();
        assert_eq!(foo.value.atoms, vec!["Optional"]);
        assert!(foo.value.record().is_some());
    }

    #[test]
    fn nested_env_adds_additional_env_at_root() {
        let record = strengthened(
            "{ spec : { containers : { frontend : { env : { FOO : Text }, name : Text } } } }",
        );

        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields[1], ADDITIONAL_ENV_FIELD.clone());

        let frontend = record.fields[0]
            .value
            .record()
            .and_then(|spec| spec.field("containers"))
            .and_then(|containers| containers.value.record())
            .and_then(|containers| containers.field("frontend"))
            .and_then(|frontend| frontend.value.record())
            .unwrap();
        assert!(!frontend.contains_key(ADDITIONAL_ENV));
    }

    #[test]
    fn repeated_runs_are_stable() {
        let once = strengthened(
            "{ metadata : { name : Text }, spec : { env : { FOO : Text }, limits : { cpu : Text } } }",
        );
        let mut twice = once.clone();
        strengthen(&mut twice);

        assert_eq!(twice, once);
        assert_eq!(
            twice.fields.iter().filter(|f| f.key == ADDITIONAL_ENV).count(),
            1
        );
    }

    #[test]
    fn descends_into_unknown_records_only() {
        let record = strengthened(
            "{ template : { metadata : { name : Text } }, other : < metadata : { name : Text } > }",
        );
        assert_eq!(
            record,
            parsed(
                "{ template : { metadata : { name : Text, namespace : Optional Text } }, other : < metadata : { name : Text } > }"
            )
        );
    }

    #[test]
    fn only_one_rule_per_field() {
        // metadata is not descended into after its own rule fired
        let record = strengthened("{ metadata : { labels : { env : { FOO : Text } } } }");
        assert!(!record.contains_key(ADDITIONAL_ENV));
    }

    #[test]
    fn builtins_parse() {
        assert_eq!(CONTAINER_RESOURCES.fields.len(), 3);
        assert_eq!(DOCKER_IMAGE.members.len(), 2);
        let as_record = DOCKER_IMAGE.member("asRecord").and_then(|m| m.value.record()).unwrap();
        assert!(["name", "registry", "sha256", "version"]
            .iter()
            .all(|key| as_record.contains_key(key)));
        assert!(DOCKER_IMAGE.member("asName").is_none());
        assert_eq!(
            ADDITIONAL_ENV_FIELD.to_source(1),
            "additionalEnv: Optional ( List {\n\t\t\tname: Text\n\t\t\t, value: Text\n\t\t} )\n"
        );
    }
}
