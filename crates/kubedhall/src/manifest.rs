//! kubernetes manifests as value trees
//!
//! Manifests are collected into one record `component → kind → name → manifest` which
//! `yaml-to-dhall` then checks against a composed type expression. Before that a few shapes are
//! normalized so that every resource of a kind ends up with the same inferred type.
use crate::value::{Object, Value, ValueError};
use crate::visit::VisitObjectsMut;
use indexmap::IndexMap;

/// Label that assigns a resource to a component
pub const COMPONENT_LABEL: &str = "app.kubernetes.io/component";

/// dhall-kubernetes schemas the composed type expressions refer to
pub const DEFAULT_SCHEMA_URL: &str = "https://raw.githubusercontent.com/dhall-lang/dhall-kubernetes/a4126b7f8f0c0935e4d86f0f596176c41efbe6fe/1.18/schemas.dhall";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ManifestError {
    #[error("manifest is missing `{0}`")]
    MissingField(&'static str),
    #[error("list `{key}` mixes named and unnamed elements")]
    UnnamedListElement { key: String },
    #[error("unable to decode manifest")]
    Value(#[from] ValueError),
    #[error("expected a record of components")]
    NotAComponentRecord,
    #[error("{level} value for {path} is not a record")]
    NotARecord { level: &'static str, path: String },
}

/// Kinds whose containers show up in [ResourceSet::components]
const WORKLOAD_KINDS: [&str; 3] = ["Deployment", "StatefulSet", "DaemonSet"];

/// `registry/name:version@sha256:digest`
///
/// The first path segment is only taken as registry when it looks like a host: it contains a
/// `.` or a `:port`, or is `localhost`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageReference {
    pub registry: Option<String>,
    pub name: String,
    pub version: Option<String>,
    pub sha256: Option<String>,
}

impl ImageReference {
    pub fn parse(reference: &str) -> Self {
        let (rest, sha256) = match reference.split_once("@sha256:") {
            Some((rest, digest)) => (rest, Some(digest)),
            None => (reference, None),
        };

        let (rest, version) = match rest.rsplit_once(':') {
            Some((rest, tag)) if !tag.contains('/') => (rest, Some(tag)),
            _ => (rest, None),
        };

        let (registry, name) = match rest.split_once('/') {
            Some((domain, path)) if is_registry(domain) => (Some(domain), path),
            _ => (None, rest),
        };

        Self {
            registry: registry.map(str::to_string),
            name: name.to_string(),
            version: version.map(str::to_string),
            sha256: sha256.map(str::to_string),
        }
    }
}

fn is_registry(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

/// Object with all four members of the `asRecord` image alternative, absent parts are empty
impl From<ImageReference> for Value {
    fn from(image: ImageReference) -> Self {
        [
            ("name", image.name),
            ("registry", image.registry.unwrap_or_default()),
            ("sha256", image.sha256.unwrap_or_default()),
            ("version", image.version.unwrap_or_default()),
        ]
        .into_iter()
        .collect()
    }
}

/// Replace every `image: <string>` member with its [ImageReference] object
pub fn expand_image_references(value: &mut Value) {
    value.visit_objects_mut(&mut |object: &mut Object| {
        let Some(image) = object.get_mut("image") else {
            return;
        };
        let Value::String(reference) = &*image else {
            return;
        };

        let expanded = ImageReference::parse(reference);
        tracing::trace!(?expanded, "expanded image reference");
        *image = expanded.into();
    });
}

/// Turn lists of named objects into objects keyed by name
///
/// A list qualifies when its first element is an object with a string `name`. All other
/// elements then need one as well.
pub fn index_named_lists(value: &mut Value) -> Result<(), ManifestError> {
    match value {
        Value::Object(object) => {
            for (key, member) in object.iter_mut() {
                index_named_list(key, member)?;
                index_named_lists(member)?;
            }
        }
        Value::Array(array) => {
            for element in array {
                index_named_lists(element)?;
            }
        }
        _ => {}
    }

    Ok(())
}

fn index_named_list(key: &str, member: &mut Value) -> Result<(), ManifestError> {
    let Some(array) = member.as_array() else {
        return Ok(());
    };

    let is_named = |element: &Value| element.get_str("name").is_some();
    if !array.first().is_some_and(is_named) {
        return Ok(());
    }
    if !array.iter().all(is_named) {
        return Err(ManifestError::UnnamedListElement {
            key: key.to_string(),
        });
    }

    let Value::Array(array) = std::mem::replace(member, Value::Null) else {
        return Ok(());
    };
    *member = array
        .into_iter()
        .map(|element| {
            let name = element.get_str("name").unwrap_or_default().to_string();
            (name, element)
        })
        .collect();

    tracing::trace!(key, "indexed named list");
    Ok(())
}

/// Sort every `env` list by variable name
///
/// Lists with an element that has no string `name` stay as they are.
pub fn sort_env_vars(value: &mut Value) {
    value.visit_objects_mut(&mut |object: &mut Object| {
        if let Some(Value::Array(env)) = object.get_mut("env") {
            if env.iter().all(|var| var.get_str("name").is_some()) {
                env.sort_by(|a, b| a.get_str("name").cmp(&b.get_str("name")));
            }
        }
    });
}

/// A single kubernetes manifest
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub kind: String,
    pub api_version: String,
    pub name: String,
    pub component: String,
    pub contents: Value,
}

impl Resource {
    /// Extract the identifying members of a manifest
    ///
    /// The component is taken from [COMPONENT_LABEL] and falls back to `fallback_component`.
    pub fn from_value(contents: Value, fallback_component: &str) -> Result<Self, ManifestError> {
        let kind = required_str(&contents, "kind", "kind")?;
        let api_version = required_str(&contents, "apiVersion", "apiVersion")?;

        let metadata = contents
            .get("metadata")
            .filter(|metadata| metadata.as_object().is_some())
            .ok_or(ManifestError::MissingField("metadata"))?;
        let name = required_str(metadata, "name", "metadata.name")?;

        let component = match metadata
            .get("labels")
            .and_then(|labels| labels.get_str(COMPONENT_LABEL))
        {
            Some(component) => component.to_string(),
            None => {
                tracing::warn!(%kind, %name, fallback_component, "no component label");
                fallback_component.to_string()
            }
        };

        Ok(Self {
            kind,
            api_version,
            name,
            component,
            contents,
        })
    }

    /// [Resource::from_value] for a decoded YAML document
    pub fn from_yaml(
        document: serde_yaml::Value,
        fallback_component: &str,
    ) -> Result<Self, ManifestError> {
        Self::from_value(Value::try_from(document)?, fallback_component)
    }

    /// Fill in what `yaml-to-dhall` needs but manifests usually omit
    pub fn patch(&mut self) -> Result<(), ManifestError> {
        match self.kind.as_str() {
            "StatefulSet" => {
                let spec = required_object(&mut self.contents, "spec", "spec")?;
                if let Some(Value::Array(templates)) = spec.get_mut("volumeClaimTemplates") {
                    for template in templates {
                        let template = template
                            .as_object_mut()
                            .ok_or(ManifestError::MissingField("spec.volumeClaimTemplates[]"))?;
                        set_type_meta(template, "PersistentVolumeClaim");
                    }
                }
            }
            "CronJob" => {
                let spec = required_object(&mut self.contents, "spec", "spec")?;
                let job_template = spec
                    .get_mut("jobTemplate")
                    .and_then(Value::as_object_mut)
                    .ok_or(ManifestError::MissingField("spec.jobTemplate"))?;
                if !job_template
                    .get("metadata")
                    .is_some_and(|metadata| metadata.as_object().is_some())
                {
                    job_template.insert("metadata".to_string(), Value::Object(Object::new()));
                }
            }
            "PersistentVolume" => {
                let spec = required_object(&mut self.contents, "spec", "spec")?;
                if let Some(claim_ref) = spec.get_mut("claimRef").and_then(Value::as_object_mut) {
                    set_type_meta(claim_ref, "PersistentVolumeClaim");
                }
            }
            _ => {}
        }

        if matches!(self.kind.as_str(), "StatefulSet" | "Deployment") {
            sort_env_vars(&mut self.contents);
        }

        Ok(())
    }

    /// `(<schema_url>).<kind>.Type`
    pub fn dhall_type(&self, schema_url: &str) -> String {
        format!("({schema_url}).{}.Type", self.kind)
    }

    /// `<component>.<kind>.<name>.yaml`
    pub fn file_name(&self) -> String {
        format!("{}.{}.{}.yaml", self.component, self.kind, self.name)
    }

    /// Names of the first `containers` found, either a list of named containers or an
    /// already indexed object
    fn container_names(&self) -> Option<Vec<String>> {
        fn find(object: &Object) -> Option<Vec<String>> {
            for (key, member) in object {
                match member {
                    Value::Object(containers) if key == "containers" => {
                        return Some(containers.keys().cloned().collect());
                    }
                    Value::Array(containers) if key == "containers" => {
                        let names: Option<Vec<String>> = containers
                            .iter()
                            .map(|container| container.get_str("name").map(str::to_string))
                            .collect();
                        if names.is_some() {
                            return names;
                        }
                    }
                    Value::Object(nested) => {
                        if let Some(names) = find(nested) {
                            return Some(names);
                        }
                    }
                    _ => {}
                }
            }
            None
        }

        self.contents.as_object().and_then(find)
    }
}

fn required_str(value: &Value, key: &str, path: &'static str) -> Result<String, ManifestError> {
    value
        .get_str(key)
        .map(str::to_string)
        .ok_or(ManifestError::MissingField(path))
}

fn required_object<'v>(
    value: &'v mut Value,
    key: &str,
    path: &'static str,
) -> Result<&'v mut Object, ManifestError> {
    value
        .get_mut(key)
        .and_then(Value::as_object_mut)
        .ok_or(ManifestError::MissingField(path))
}

fn set_type_meta(object: &mut Object, kind: &str) {
    object.insert("apiVersion".to_string(), "v1".into());
    object.insert("kind".to_string(), kind.into());
}

/// Resources grouped by component, in insertion order
#[derive(Debug, Default)]
pub struct ResourceSet {
    components: IndexMap<String, Vec<Resource>>,
}

impl ResourceSet {
    pub fn insert(&mut self, resource: Resource) {
        self.components
            .entry(resource.component.clone())
            .or_default()
            .push(resource);
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.components.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.resources().count()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Split a `component → kind → name → contents` record back into resources
    ///
    /// Every level has to be a record. The API version is taken from the contents if present.
    pub fn from_record(record: Value) -> Result<Self, ManifestError> {
        let Value::Object(components) = record else {
            return Err(ManifestError::NotAComponentRecord);
        };

        let mut set = ResourceSet::default();
        for (component, kinds) in components {
            let Value::Object(kinds) = kinds else {
                return Err(ManifestError::NotARecord {
                    level: "component",
                    path: component,
                });
            };

            for (kind, names) in kinds {
                let Value::Object(names) = names else {
                    return Err(ManifestError::NotARecord {
                        level: "kind",
                        path: format!("{component}.{kind}"),
                    });
                };

                for (name, contents) in names {
                    if contents.as_object().is_none() {
                        return Err(ManifestError::NotARecord {
                            level: "resource",
                            path: format!("{component}.{kind}.{name}"),
                        });
                    }

                    set.insert(Resource {
                        api_version: contents.get_str("apiVersion").unwrap_or_default().to_string(),
                        kind: kind.clone(),
                        name,
                        component: component.clone(),
                        contents,
                    });
                }
            }
        }

        tracing::debug!(resources = set.len(), "split component record");
        Ok(set)
    }

    /// `component → kind → name → contents`
    pub fn record(&self) -> Value {
        self.group(|resource| resource.contents.clone())
    }

    /// `component → kind → name → { containers : { <container> : {} } }`
    ///
    /// A skeleton for attaching settings to components. Only workload kinds list their
    /// containers, every other resource maps to an empty record.
    pub fn components(&self) -> Value {
        self.group(|resource| {
            let mut skeleton = Object::new();
            if WORKLOAD_KINDS.contains(&resource.kind.as_str()) {
                if let Some(names) = resource.container_names() {
                    skeleton.insert(
                        "containers".to_string(),
                        names
                            .into_iter()
                            .map(|name| (name, Value::Object(Object::new())))
                            .collect(),
                    );
                }
            }
            Value::Object(skeleton)
        })
    }

    fn group(&self, leaf: impl Fn(&Resource) -> Value) -> Value {
        let mut record = Object::new();
        for (component, resources) in &self.components {
            let mut kinds: IndexMap<&str, Object> = IndexMap::new();
            for resource in resources {
                kinds
                    .entry(resource.kind.as_str())
                    .or_default()
                    .insert(resource.name.clone(), leaf(resource));
            }

            record.insert(
                component.clone(),
                kinds
                    .into_iter()
                    .map(|(kind, names)| (kind, Value::Object(names)))
                    .collect(),
            );
        }
        Value::Object(record)
    }

    /// Type of [ResourceSet::record], one record type per resource combined with `//\\`
    pub fn record_type(&self, schema_url: &str) -> String {
        self.resources()
            .map(|resource| {
                format!(
                    "{{ {} : {{ {} : {{ {} : {} }} }} }}",
                    label(&resource.component),
                    label(&resource.kind),
                    label(&resource.name),
                    resource.dhall_type(schema_url)
                )
            })
            .collect::<Vec<_>>()
            .join(" //\\\\ ")
    }

    /// Union over all distinct kinds
    pub fn union_type(&self, schema_url: &str) -> String {
        let mut kinds: IndexMap<&str, String> = IndexMap::new();
        for resource in self.resources() {
            kinds
                .entry(resource.kind.as_str())
                .or_insert_with(|| resource.dhall_type(schema_url));
        }
        tracing::info!(size = kinds.len(), "kubernetes union type");

        let alternatives: Vec<_> = kinds
            .iter()
            .map(|(kind, dhall_type)| format!("{} : {dhall_type}", label(kind)))
            .collect();
        format!("< {} >", alternatives.join(" | "))
    }
}

/// Quote labels that are not plain identifiers
fn label(text: &str) -> String {
    let mut chars = text.chars();
    let simple = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/'));

    if simple {
        text.to_string()
    } else {
        format!("`{text}`")
    }
}
