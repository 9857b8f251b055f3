//! End-to-end builds through the public API.

use std::sync::Arc;

use rstest::rstest;
use yang_reactor::diagnostics::codes;
use yang_reactor::{
    CopyHistory, ErrorKind, QName, QNameModule, Resolved, Revision, SourceDescriptor, StatementKind, build,
};

fn source(name: &str, text: &str) -> Arc<SourceDescriptor> {
    Arc::new(SourceDescriptor::parse(name, text).unwrap())
}

const FOO: &str = r#"
module foo {
  namespace "urn:foo";
  prefix foo;
  grouping g {
    leaf x { type string; }
  }
  container top {
    uses g;
  }
}"#;

const BAR: &str = r#"
module bar {
  namespace "urn:bar";
  prefix bar;
  import foo { prefix foo; }
  augment "/foo:top" {
    leaf y { type int32; }
  }
}"#;

// ============================================================================
// END TO END
// ============================================================================

#[test]
fn test_uses_and_augment() {
    let model = build(&[source("foo.yang", FOO), source("bar.yang", BAR)]).unwrap();
    assert_eq!(model.modules().len(), 2);

    let top = model.find_schema_path("/foo:top").unwrap();
    let names: Vec<_> = top.schema_children().filter_map(|c| c.local_name()).collect();
    assert_eq!(names, vec!["x", "y"]);

    let x = model.find_schema_path("/foo:top/foo:x").unwrap();
    assert!(x.history().is_added_by_uses());
    assert_eq!(x.qname().unwrap().module.namespace.as_ref(), "urn:foo");

    let y = model.find_schema_path("/foo:top/bar:y").unwrap();
    assert!(y.history().contains(CopyHistory::ADDED_BY_AUGMENTATION));
    assert_eq!(y.qname().unwrap().module.namespace.as_ref(), "urn:bar");

    let bar = model.find_module("bar", None).unwrap();
    let augment = bar.statement().child_of_kind(StatementKind::Augment).unwrap();
    let foo_module = QNameModule::new("urn:foo", None);
    assert_eq!(augment.resolved(), Some(&Resolved::Target(QName::new(foo_module, "top"))));
}

#[rstest]
#[case::foo_first(&["foo", "bar"])]
#[case::bar_first(&["bar", "foo"])]
fn test_input_order_does_not_matter(#[case] order: &[&str]) {
    let reference = build(&[source("foo.yang", FOO), source("bar.yang", BAR)]).unwrap();
    let sources: Vec<_> = order
        .iter()
        .map(|&name| match name {
            "foo" => source("foo.yang", FOO),
            _ => source("bar.yang", BAR),
        })
        .collect();
    assert_eq!(build(&sources).unwrap(), reference);
}

#[test]
fn test_type_resolution_is_recorded() {
    let model = build(&[source(
        "m.yang",
        r#"module m {
            namespace urn:m; prefix m;
            typedef percent { type uint8 { range "0..100"; } }
            leaf load { type percent; }
            leaf name { type string; }
        }"#,
    )])
    .unwrap();

    let module = QNameModule::new("urn:m", None);
    let load = model.find_schema_path("/m:load").unwrap();
    let ty = load.child_of_kind(StatementKind::Type).unwrap();
    assert_eq!(ty.resolved(), Some(&Resolved::Typedef(QName::new(module, "percent"))));

    let name = model.find_schema_path("/m:name").unwrap();
    assert_eq!(name.child_of_kind(StatementKind::Type).unwrap().resolved(), None);
}

#[test]
fn test_choice_shorthand_gets_an_implicit_case() {
    let model = build(&[source(
        "m.yang",
        r#"module m {
            namespace urn:m; prefix m;
            container c {
                choice ch {
                    leaf a { type string; }
                    case b { leaf b1 { type string; } }
                }
            }
        }"#,
    )])
    .unwrap();

    let choice = model.find_schema_path("/m:c/m:ch").unwrap();
    let cases: Vec<_> = choice.schema_children().collect();
    assert_eq!(cases.len(), 2);
    assert!(cases.iter().all(|c| c.kind() == StatementKind::Case));
    assert!(cases[0].history().contains(CopyHistory::IMPLICIT));
    assert_eq!(cases[0].local_name(), Some("a"));

    let c = model.find_schema_path("/m:c").unwrap();
    let data: Vec<_> = c.data_children().iter().filter_map(|d| d.local_name()).collect();
    assert_eq!(data, vec!["a", "b1"]);
}

#[test]
fn test_latest_revision_is_found_by_default() {
    let model = build(&[
        source("m@2020.yang", "module m { namespace urn:m; prefix m; revision 2020-01-01; }"),
        source(
            "m@2021.yang",
            "module m { namespace urn:m; prefix m; revision 2021-06-01; revision 2020-01-01; }",
        ),
    ])
    .unwrap();

    assert_eq!(model.modules().len(), 2);
    let latest = model.find_module("m", None).unwrap();
    assert_eq!(latest.identifier().revision, Revision::new(2021, 6, 1));
    let older = model.find_module("m", Revision::new(2020, 1, 1)).unwrap();
    assert_eq!(older.identifier().revision, Revision::new(2020, 1, 1));
}

#[test]
fn test_submodule_contents_are_merged() {
    let model = build(&[
        source(
            "m.yang",
            r#"module m { namespace urn:m; prefix m; include s;
                container top { uses sg; } }"#,
        ),
        source(
            "s.yang",
            r#"submodule s { belongs-to m { prefix m; }
                grouping sg { leaf x { type string; } }
                container extra { } }"#,
        ),
    ])
    .unwrap();

    assert_eq!(model.modules().len(), 1);
    let module = model.find_module("m", None).unwrap();
    assert_eq!(module.submodules().len(), 1);
    assert_eq!(module.submodules()[0].identifier().name, "s");
    assert!(model.find_schema_path("/m:extra").is_some());
    assert!(model.find_schema_path("/m:top/m:x").is_some());

    let extra = model.find_schema_path("/m:extra").unwrap();
    let from_submodule = module.submodules()[0]
        .statement()
        .child_of_kind(StatementKind::Container)
        .unwrap();
    assert!(Arc::ptr_eq(extra, from_submodule));
}

#[test]
fn test_grouping_sites() {
    let model = build(&[source(
        "m.yang",
        r#"module m {
            namespace urn:m; prefix m;
            grouping inner { leaf i { type string; } }
            grouping outer { uses inner; }
            container a { uses inner; }
            container b { uses outer; }
        }"#,
    )])
    .unwrap();

    let inner = QName::new(QNameModule::new("urn:m", None), "inner");
    let usages = model.grouping_sites(&inner);
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].direct.len(), 2);
    assert_eq!(usages[0].indirect.len(), 1);
}

// ============================================================================
// FAILURES
// ============================================================================

#[rstest]
#[case::typedef("typedef t { type string; } typedef t { type int32; }")]
#[case::grouping("grouping g { leaf a { type string; } } grouping g { leaf b { type string; } }")]
#[case::identity("identity i; identity i;")]
#[case::feature("feature f; feature f;")]
fn test_duplicate_definitions(#[case] body: &str) {
    let text = format!("module m {{ namespace urn:m; prefix m; {body} }}");
    let error = build(&[source("m.yang", &text)]).unwrap_err();
    let collisions = error.collisions();
    assert_eq!(collisions.len(), 1, "{error}");
    assert_eq!(collisions[0].code, codes::DUPLICATE_DEFINITION);
}

#[test]
fn test_duplicate_data_nodes() {
    let error = build(&[source(
        "m.yang",
        r#"module m {
            namespace urn:m; prefix m;
            grouping g { leaf x { type string; } }
            container c { leaf x { type string; } uses g; }
        }"#,
    )])
    .unwrap_err();
    assert!(error.has_code(codes::DUPLICATE_DEFINITION), "{error}");
}

#[test]
fn test_every_stall_is_reported() {
    let error = build(&[source(
        "m.yang",
        r#"module m {
            namespace urn:m; prefix m;
            container a { uses missing1; }
            container b { uses missing2; }
            container c { uses missing3; }
        }"#,
    )])
    .unwrap_err();

    let unresolved = error.unresolved();
    assert_eq!(unresolved.len(), 3);
    assert!(unresolved.iter().all(|d| d.code == codes::UNRESOLVED_REFERENCE));
    assert!(unresolved.iter().all(|d| d.reference.is_some()));
}

#[test]
fn test_missing_import() {
    let error = build(&[source("bar.yang", BAR)]).unwrap_err();
    let linkage: Vec<_> = error.of_kind(ErrorKind::Linkage).collect();
    assert_eq!(linkage.len(), 1);
    assert!(linkage[0].message.contains("'foo'"));
}

#[test]
fn test_conflicting_duplicate_sources() {
    let error = build(&[
        source("a.yang", "module m { namespace urn:m; prefix m; }"),
        source("b.yang", "module m { namespace urn:other; prefix m; }"),
    ])
    .unwrap_err();
    assert!(error.has_code(codes::SOURCE_CONFLICT));
}

#[test]
fn test_identical_duplicate_sources_are_merged() {
    let text = "module m { namespace urn:m; prefix m; leaf l { type string; } }";
    let model = build(&[source("a.yang", text), source("b.yang", text)]).unwrap();
    assert_eq!(model.modules().len(), 1);
}

#[test]
fn test_error_display_lists_diagnostics() {
    let error = build(&[source(
        "m.yang",
        "module m { namespace urn:m; prefix m; leaf l { type nope; } }",
    )])
    .unwrap_err();
    let rendered = error.to_string();
    assert!(rendered.starts_with("build failed with 1 error(s)"), "{rendered}");
    assert!(rendered.contains("typedef 'nope' never defined"));
}
