// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

#![allow(unused_crate_dependencies)]

use std::fs;
use std::path::{Path, PathBuf};

use ldvalid_context::EnhanceError;
use ldvalid_validate::config::Config;
use ldvalid_validate::{run, Error, Report, Severity};
use tempfile::TempDir;

const COMMON_URI: &str = "http://example.org/ctx/common";

/// Shared prefixes, served from the assets directory.
const COMMON_CONTEXT: &str = r#"{
    "@context": {
        "xsd": "http://www.w3.org/2001/XMLSchema#",
        "lis": "http://purl.imsglobal.org/vocab/lis/v2/outcomes#"
    }
}"#;

const OUTCOMES_CONTEXT: &str = r#"{
    "@context": [
        "http://example.org/ctx/common",
        {
            "GUID.Type": {
                "@id": "lis:GUID.Type",
                "datatype": { "base": "xsd:normalizedString", "maxLength": 64 }
            },
            "Item": { "@id": "lis:Item" },
            "GradebookItem": {
                "@id": "lis:GradebookItem",
                "class": {
                    "supertype": ["lis:Item"],
                    "restriction": [
                        { "onProperty": "lastModified", "maxCardinality": 1 }
                    ]
                }
            },
            "Person": { "@id": "lis:Person" },
            "sourcedId": { "@id": "lis:sourcedId", "@type": "lis:GUID.Type" },
            "lastModified": "lis:lastModified",
            "gradingScheme": {
                "@id": "lis:gradingScheme",
                "property": { "domain": ["lis:GradebookItem"] }
            }
        }
    ]
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        fixture.write("http_example_org_ctx_common.jsonld", COMMON_CONTEXT);
        fixture.write("outcomes.jsonld", OUTCOMES_CONTEXT);
        fixture
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self, context: &str, documents: &[(&str, &str)]) -> Config {
        Config {
            context: self.path(context),
            documents: documents
                .iter()
                .map(|(name, content)| self.write(name, content))
                .collect(),
            ..Config::default()
        }
    }

    fn validate(&self, document: &str) -> Report {
        let config = self.config("outcomes.jsonld", &[("doc.json", document)]);
        let mut reports = run(&config).unwrap();
        assert_eq!(reports.len(), 1);
        reports.remove(0).report
    }
}

fn assert_single_error(report: &Report, path: &str) -> String {
    assert_eq!(report.len(), 1, "{report}");
    let message = &report.messages()[0];
    assert_eq!(message.severity, Severity::Error);
    assert_eq!(message.path, path);
    message.text.clone()
}

#[test]
fn guid_longer_than_max_length() {
    let fixture = Fixture::new();
    let document = format!(
        r#"{{ "@context": "{COMMON_URI}", "sourcedId": "{}" }}"#,
        "x".repeat(70)
    );
    let text = assert_single_error(&fixture.validate(&document), "sourcedId");
    assert!(text.contains("maxLength=64"), "{text}");
    assert!(text.contains("length=70"), "{text}");

    let document = format!(r#"{{ "sourcedId": "{}" }}"#, "x".repeat(64));
    assert!(fixture.validate(&document).is_empty());
}

#[test]
fn too_many_values_for_a_restricted_property() {
    let fixture = Fixture::new();
    let report = fixture.validate(
        r#"{
            "@type": "GradebookItem",
            "lastModified": ["2024-01-01T00:00:00Z", "2024-02-01T00:00:00Z"]
        }"#,
    );
    let text = assert_single_error(&report, "lastModified");
    assert!(text.contains("maxCardinality=1"), "{text}");
    assert!(text.contains("cardinality=2"), "{text}");
}

#[test]
fn property_used_outside_its_domain() {
    let fixture = Fixture::new();
    let report = fixture.validate(r#"{ "@type": "Person", "gradingScheme": "letters" }"#);
    let text = assert_single_error(&report, "gradingScheme");
    assert_eq!(text, "Invalid domain for this property");

    let report = fixture.validate(r#"{ "@type": "GradebookItem", "gradingScheme": "letters" }"#);
    assert!(report.is_empty(), "{report}");
}

#[test]
fn every_document_gets_its_own_report() {
    let fixture = Fixture::new();
    let config = fixture.config(
        "outcomes.jsonld",
        &[
            ("good.json", r#"{ "sourcedId": "abc" }"#),
            ("bad.json", r#"{ "@type": "Person", "gradingScheme": "x" }"#),
        ],
    );
    let reports = run(&config).unwrap();
    assert_eq!(reports.len(), 2);
    assert!(!reports[0].report.has_errors());
    assert!(reports[1].report.has_errors());
    assert_eq!(reports[1].document, fixture.path("bad.json"));

    let json = serde_json::to_value(&reports).unwrap();
    assert_eq!(json[1]["report"][0]["severity"], "ERROR");
}

#[test]
fn malformed_documents_fail_with_their_path() {
    let fixture = Fixture::new();
    let config = fixture.config("outcomes.jsonld", &[("broken.json", "{ \"a\": ")]);
    match run(&config) {
        Err(Error::Document { path, from }) => {
            assert_eq!(path, fixture.path("broken.json"));
            assert_eq!(from.line, 1);
        }
        other => panic!("expected a document error, got {other:?}"),
    }
}

#[test]
fn missing_assets_are_reported() {
    let fixture = Fixture::new();
    let config = Config {
        assets: Some(fixture.path("nowhere")),
        ..fixture.config("outcomes.jsonld", &[("doc.json", "{}")])
    };
    assert!(matches!(run(&config), Err(Error::Context { .. })));
}

const PLAIN_CONTEXT: &str = r#"{
    "@context": {
        "xsd": "http://www.w3.org/2001/XMLSchema#",
        "ex": "http://example.org/ns#",
        "Person": "ex:Person",
        "name": { "@id": "ex:name", "@type": "xsd:string" },
        "age": { "@id": "ex:age", "@type": "xsd:nonNegativeInteger" }
    }
}"#;

const ONTOLOGY: &str = r#"{
    "@context": {
        "ex": "http://example.org/ns#",
        "Agent": { "@id": "ex:Agent" },
        "Person": {
            "@id": "ex:Person",
            "class": {
                "supertype": ["ex:Agent"],
                "restriction": [ { "onProperty": "ex:name", "minCardinality": 1 } ]
            }
        },
        "name": { "@id": "ex:name", "property": { "domain": ["ex:Agent"] } }
    }
}"#;

#[test]
fn enhancement_with_an_ontology() {
    let fixture = Fixture::new();
    fixture.write("plain.jsonld", PLAIN_CONTEXT);
    let ontology = fixture.write("ontology.jsonld", ONTOLOGY);
    let config = Config {
        ontologies: vec![ontology],
        ..fixture.config("plain.jsonld", &[("doc.json", r#"{ "@type": "Person", "age": -1 }"#)])
    };
    let reports = run(&config).unwrap();
    let report = &reports[0].report;
    assert_eq!(report.error_count(), 2, "{report}");
    let paths: Vec<&str> = report.iter().map(|message| message.path.as_str()).collect();
    assert!(paths.contains(&"name"), "{report}");
    assert!(paths.contains(&"age"), "{report}");
}

#[test]
fn enhancement_reaches_into_external_contexts() {
    let fixture = Fixture::new();
    fixture.write("http_example_org_ctx_plain.jsonld", PLAIN_CONTEXT);
    fixture.write(
        "components.jsonld",
        r#"{ "@context": "http://example.org/ctx/plain" }"#,
    );
    let ontology = fixture.write("ontology.jsonld", ONTOLOGY);
    let config = Config {
        ontologies: vec![ontology],
        ..fixture.config("components.jsonld", &[("doc.json", r#"{ "@type": "Person" }"#)])
    };
    let reports = run(&config).unwrap();
    let text = assert_single_error(&reports[0].report, "name");
    assert_eq!(text, "Expected minCardinality=1, but found cardinality=0");
}

#[test]
fn enhancement_reports_all_missing_namespaces_at_once() {
    let fixture = Fixture::new();
    fixture.write(
        "mixed.jsonld",
        r#"{
            "@context": {
                "xsd": "http://www.w3.org/2001/XMLSchema#",
                "ex": "http://example.org/ns#",
                "foaf": "http://xmlns.com/foaf/0.1/",
                "other": "http://other.org/vocab#",
                "Person": "ex:Person",
                "knows": "foaf:knows",
                "thing": { "@id": "other:thing", "@type": "xsd:string" },
                "more": "other:more"
            }
        }"#,
    );
    let ontology = fixture.write("ontology.jsonld", ONTOLOGY);
    let config = Config {
        ontologies: vec![ontology],
        ..fixture.config("mixed.jsonld", &[("doc.json", "{}")])
    };
    match run(&config) {
        Err(Error::Enhance(EnhanceError::MissingNamespaces { namespaces })) => {
            assert_eq!(
                namespaces,
                vec![
                    "http://other.org/vocab#".to_owned(),
                    "http://xmlns.com/foaf/0.1/".to_owned()
                ]
            );
        }
        other => panic!("expected missing namespaces, got {other:?}"),
    }
}

fn assert_exists(path: &Path) {
    assert!(path.is_file(), "{}", path.display());
}

#[test]
fn assets_default_to_the_context_directory() {
    let fixture = Fixture::new();
    let config = fixture.config("outcomes.jsonld", &[("doc.json", "{}")]);
    assert_exists(&config.assets_dir().join("http_example_org_ctx_common.jsonld"));
    assert!(run(&config).unwrap()[0].report.is_empty());
}
