//! Resource matching over synthesized templates.

use crate::predicate::{MetadataMatcher, TagMatcher};
use crate::types::{CloudAssembly, MatchingResource, PATH_METADATA_KEY};
use serde_json::Value;
use std::collections::BTreeSet;

/// Filters applied by [`find_matching_resources`].
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Construct path to search under (`path` itself or `path/...`)
    pub construct_path: Option<String>,
    /// Only resources of these CloudFormation types match
    pub types: BTreeSet<String>,
    /// Metadata entries the resource must carry
    pub metadata: Option<MetadataMatcher>,
    /// Tags the resource must carry
    pub tags: Option<TagMatcher>,
}

impl FindOptions {
    /// Match resources of the given types.
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Restrict matches to a construct path and its descendants.
    pub fn with_construct_path(mut self, path: impl Into<String>) -> Self {
        self.construct_path = Some(path.into());
        self
    }

    /// Require metadata entries.
    pub fn with_metadata(mut self, matcher: MetadataMatcher) -> Self {
        self.metadata = Some(matcher);
        self
    }

    /// Require tags.
    pub fn with_tags(mut self, matcher: TagMatcher) -> Self {
        self.tags = Some(matcher);
        self
    }
}

/// Whether `candidate` is `path` or lies below it.
pub fn is_under_path(candidate: &str, path: &str) -> bool {
    match candidate.strip_prefix(path) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// Find every resource in the assembly that satisfies `options`.
///
/// Results follow stack order, then template order, so the first match and
/// any ambiguity report are stable between runs. Entries that are not
/// objects, lack a `Metadata` object, or lack a construct path are skipped.
pub fn find_matching_resources(
    assembly: &CloudAssembly,
    options: &FindOptions,
) -> Vec<MatchingResource> {
    let mut matches = Vec::new();

    for stack in &assembly.stacks {
        for (logical_id, resource) in stack.resources() {
            let Some(record) = resource.as_object() else {
                continue;
            };

            let Some(metadata) = record.get("Metadata").and_then(Value::as_object) else {
                continue;
            };

            let Some(resource_type) = record.get("Type").and_then(Value::as_str) else {
                continue;
            };
            if !options.types.contains(resource_type) {
                continue;
            }

            if let Some(matcher) = &options.metadata
                && !matcher.matches(metadata)
            {
                continue;
            }

            if let Some(matcher) = &options.tags {
                let tags = record.get("Properties").and_then(|p| p.get("Tags"));
                if !matcher.matches(tags) {
                    continue;
                }
            }

            let Some(construct_path) = metadata.get(PATH_METADATA_KEY).and_then(Value::as_str)
            else {
                log::trace!(
                    "Skipping {}/{}: no {} metadata",
                    stack.stack_name,
                    logical_id,
                    PATH_METADATA_KEY
                );
                continue;
            };

            if let Some(path) = &options.construct_path
                && !is_under_path(construct_path, path)
            {
                continue;
            }

            matches.push(MatchingResource {
                stack_name: stack.stack_name.clone(),
                logical_resource_id: logical_id.clone(),
                resource_type: resource_type.to_string(),
                construct_path: construct_path.to_string(),
            });
        }
    }

    log::debug!("Found {} matching resources", matches.len());
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LAMBDA_FUNCTION_TYPE, STATE_MACHINE_TYPE, Stack};
    use serde_json::json;

    fn resource(resource_type: &str, path: &str) -> Value {
        json!({
            "Type": resource_type,
            "Properties": {},
            "Metadata": { PATH_METADATA_KEY: path }
        })
    }

    fn two_state_machines() -> CloudAssembly {
        CloudAssembly::from_stacks(vec![Stack::new(
            "Stack",
            json!({
                "Resources": {
                    "STACKXBOOM1XROLE": resource("AWS::IAM::Role", "Stack/Boom1/Role/Resource"),
                    "STACKXBOOM1XRESOURCE": resource(STATE_MACHINE_TYPE, "Stack/Boom1/Resource"),
                    "STACKXBOOM2XRESOURCE": resource(STATE_MACHINE_TYPE, "Stack/Boom2/Resource"),
                }
            }),
        )])
    }

    fn expected_two() -> Vec<MatchingResource> {
        vec![
            MatchingResource {
                stack_name: "Stack".into(),
                logical_resource_id: "STACKXBOOM1XRESOURCE".into(),
                resource_type: STATE_MACHINE_TYPE.into(),
                construct_path: "Stack/Boom1/Resource".into(),
            },
            MatchingResource {
                stack_name: "Stack".into(),
                logical_resource_id: "STACKXBOOM2XRESOURCE".into(),
                resource_type: STATE_MACHINE_TYPE.into(),
                construct_path: "Stack/Boom2/Resource".into(),
            },
        ]
    }

    #[test]
    fn test_no_path_returns_all_of_type_in_order() {
        let options = FindOptions::new([STATE_MACHINE_TYPE]);
        assert_eq!(
            find_matching_resources(&two_state_machines(), &options),
            expected_two()
        );
    }

    #[test]
    fn test_stack_path_returns_descendants() {
        let options = FindOptions::new([STATE_MACHINE_TYPE]).with_construct_path("Stack");
        assert_eq!(
            find_matching_resources(&two_state_machines(), &options),
            expected_two()
        );
    }

    #[test]
    fn test_exact_path() {
        let options =
            FindOptions::new([STATE_MACHINE_TYPE]).with_construct_path("Stack/Boom2/Resource");
        let results = find_matching_resources(&two_state_machines(), &options);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].logical_resource_id, "STACKXBOOM2XRESOURCE");
    }

    #[test]
    fn test_path_prefix_respects_segment_boundary() {
        // "Stack/Boom" must not match "Stack/Boom1/..."
        let options = FindOptions::new([STATE_MACHINE_TYPE]).with_construct_path("Stack/Boom");
        assert!(find_matching_resources(&two_state_machines(), &options).is_empty());
    }

    #[test]
    fn test_is_under_path() {
        assert!(is_under_path("Stack", "Stack"));
        assert!(is_under_path("Stack/Fn/Resource", "Stack"));
        assert!(!is_under_path("Stack2/Fn", "Stack"));
        assert!(!is_under_path("Sta", "Stack"));
    }

    #[test]
    fn test_types_filter() {
        let options = FindOptions::new([LAMBDA_FUNCTION_TYPE]);
        assert!(find_matching_resources(&two_state_machines(), &options).is_empty());

        let options = FindOptions::new(["AWS::IAM::Role"]);
        assert_eq!(find_matching_resources(&two_state_machines(), &options).len(), 1);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let assembly = CloudAssembly::from_stacks(vec![
            Stack::new("NoResources", json!({"Outputs": {}})),
            Stack::new("ResourcesNotObject", json!({"Resources": []})),
            Stack::new(
                "Mixed",
                json!({
                    "Resources": {
                        "NotAnObject": "oops",
                        "Null": null,
                        "NoMetadata": { "Type": LAMBDA_FUNCTION_TYPE },
                        "MetadataNotObject": { "Type": LAMBDA_FUNCTION_TYPE, "Metadata": "x" },
                        "NoPath": { "Type": LAMBDA_FUNCTION_TYPE, "Metadata": {} },
                        "NoType": { "Metadata": { PATH_METADATA_KEY: "Mixed/NoType" } },
                        "Good": resource(LAMBDA_FUNCTION_TYPE, "Mixed/Good/Resource"),
                    }
                }),
            ),
        ]);

        let results =
            find_matching_resources(&assembly, &FindOptions::new([LAMBDA_FUNCTION_TYPE]));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].logical_resource_id, "Good");
        assert_eq!(results[0].stack_name, "Mixed");
    }

    #[test]
    fn test_stack_order_then_template_order() {
        let assembly = CloudAssembly::from_stacks(vec![
            Stack::new(
                "B",
                json!({"Resources": {
                    "Zed": resource(LAMBDA_FUNCTION_TYPE, "B/Zed/Resource"),
                    "Alpha": resource(LAMBDA_FUNCTION_TYPE, "B/Alpha/Resource"),
                }}),
            ),
            Stack::new(
                "A",
                json!({"Resources": {
                    "Fn": resource(LAMBDA_FUNCTION_TYPE, "A/Fn/Resource"),
                }}),
            ),
        ]);

        let paths: Vec<_> =
            find_matching_resources(&assembly, &FindOptions::new([LAMBDA_FUNCTION_TYPE]))
                .into_iter()
                .map(|m| m.construct_path)
                .collect();
        assert_eq!(paths, ["B/Zed/Resource", "B/Alpha/Resource", "A/Fn/Resource"]);
    }

    #[test]
    fn test_metadata_filter() {
        let assembly = CloudAssembly::from_stacks(vec![Stack::new(
            "Stack",
            json!({"Resources": {
                "Sfn": {
                    "Type": STATE_MACHINE_TYPE,
                    "Metadata": { PATH_METADATA_KEY: "Stack/Sfn/Resource", "integ": "sfn" }
                },
                "Fn": {
                    "Type": LAMBDA_FUNCTION_TYPE,
                    "Metadata": { PATH_METADATA_KEY: "Stack/Fn/Resource", "integ": "lambda" }
                },
            }}),
        )]);

        let options = FindOptions::new([STATE_MACHINE_TYPE, LAMBDA_FUNCTION_TYPE])
            .with_metadata(MetadataMatcher::new(["integ=lambda"]));
        let results = find_matching_resources(&assembly, &options);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].logical_resource_id, "Fn");

        let options = FindOptions::new([STATE_MACHINE_TYPE, LAMBDA_FUNCTION_TYPE])
            .with_metadata(MetadataMatcher::new(["integ"]));
        assert_eq!(find_matching_resources(&assembly, &options).len(), 2);
    }

    #[test]
    fn test_tag_filter() {
        let assembly = CloudAssembly::from_stacks(vec![Stack::new(
            "Stack",
            json!({"Resources": {
                "Tagged": {
                    "Type": LAMBDA_FUNCTION_TYPE,
                    "Properties": { "Tags": [{"Key": "team", "Value": "payments"}] },
                    "Metadata": { PATH_METADATA_KEY: "Stack/Tagged/Resource" }
                },
                "Untagged": resource(LAMBDA_FUNCTION_TYPE, "Stack/Untagged/Resource"),
            }}),
        )]);

        let options =
            FindOptions::new([LAMBDA_FUNCTION_TYPE]).with_tags(TagMatcher::new(["team=payments"]));
        let results = find_matching_resources(&assembly, &options);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].logical_resource_id, "Tagged");
    }

    #[test]
    fn test_every_result_is_under_filter() {
        let assembly = two_state_machines();
        for path in ["Stack", "Stack/Boom1", "Stack/Boom2/Resource", "Nope"] {
            let options = FindOptions::new([STATE_MACHINE_TYPE]).with_construct_path(path);
            for m in find_matching_resources(&assembly, &options) {
                assert!(
                    m.construct_path == path || m.construct_path.starts_with(&format!("{path}/")),
                    "{} is not under {}",
                    m.construct_path,
                    path
                );
            }
        }
    }
}
