//! `ImageStreamTag` request body.
//!
//! Field names, nesting and the explicit `null`s mirror what the OpenShift
//! image API returns for this kind, so keep declaration order stable.

use serde::Serialize;

use crate::openshift::target::TargetSpec;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageStreamTag {
    pub kind: &'static str,
    pub api_version: &'static str,
    pub metadata: ObjectMeta,
    pub tag: TagReference,
    pub generation: u64,
    pub lookup_policy: LookupPolicy,
    pub image: Image,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    pub creation_timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TagReference {
    pub name: String,
    pub annotations: Option<serde_json::Map<String, serde_json::Value>>,
    pub from: ObjectReference,
    pub generation: u64,
    pub import_policy: ImportPolicy,
    pub reference_policy: ReferencePolicy,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ObjectReference {
    pub kind: &'static str,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ImportPolicy {}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReferencePolicy {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct LookupPolicy {
    pub local: bool,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub metadata: ImageMeta,
    pub docker_image_metadata: Option<serde_json::Value>,
    pub docker_image_layers: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageMeta {
    pub creation_timestamp: Option<String>,
}

impl ImageStreamTag {
    /// Body that points `spec` at its source image.
    pub fn for_target(spec: &TargetSpec) -> Self {
        Self {
            kind: "ImageStreamTag",
            api_version: "image.openshift.io/v1",
            metadata: ObjectMeta {
                name: spec.name.to_string(),
                namespace: spec.namespace.to_string(),
                creation_timestamp: None,
            },
            tag: TagReference {
                name: String::new(),
                annotations: None,
                from: ObjectReference {
                    kind: "DockerImage",
                    name: spec.source_image(),
                },
                generation: 0,
                import_policy: ImportPolicy::default(),
                reference_policy: ReferencePolicy { kind: "Source" },
            },
            generation: 0,
            lookup_policy: LookupPolicy::default(),
            image: Image::default(),
        }
    }
}
