//! Property tests: builds and identifier ordering do not depend on the
//! order sources arrive in.
#![cfg(feature = "proptest")]

use std::sync::Arc;

use proptest::prelude::*;
use yang_reactor::{Revision, SourceDescriptor, SourceIdentifier, build};

// ============================================================================
// STRATEGIES
// ============================================================================

fn arb_revision() -> impl Strategy<Value = Option<Revision>> {
    prop_oneof![
        1 => Just(None),
        3 => (1990u16..2030, 1u8..=12, 1u8..=28).prop_map(|(y, m, d)| Revision::new(y, m, d)),
    ]
}

fn arb_identifier() -> impl Strategy<Value = SourceIdentifier> {
    ("[a-z][a-z0-9-]{0,8}", arb_revision()).prop_map(|(name, revision)| SourceIdentifier::new(name, revision))
}

/// A chain of modules, each augmenting the container of the previous
/// one, plus a module using a grouping from the first.
fn chain(length: usize) -> Vec<Arc<SourceDescriptor>> {
    let mut sources = vec![Arc::new(
        SourceDescriptor::parse(
            "m0.yang",
            "module m0 { namespace urn:m0; prefix m0;
               grouping g { leaf shared { type string; } }
               container c0 { } }",
        )
        .unwrap(),
    )];
    for i in 1..length {
        let imports: String = (0..i).map(|j| format!("import m{j} {{ prefix m{j}; }} ")).collect();
        let target: String = (0..i).map(|j| format!("/m{j}:c{j}")).collect();
        let text = format!(
            r#"module m{i} {{ namespace urn:m{i}; prefix m{i};
                 {imports}
                 augment "{target}" {{ container c{i} {{ uses m0:g; }} }} }}"#
        );
        sources.push(Arc::new(SourceDescriptor::parse(&format!("m{i}.yang"), text).unwrap()));
    }
    sources
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_identifier_order_follows_name_then_revision(a in arb_identifier(), b in arb_identifier()) {
        let expected = (&a.name, a.revision).cmp(&(&b.name, b.revision));
        prop_assert_eq!(a.cmp(&b), expected);
    }

    #[test]
    fn test_build_is_order_independent(shuffled in Just(chain(5)).prop_shuffle()) {
        let reference = build(&chain(5)).unwrap();
        let model = build(&shuffled).unwrap();
        prop_assert_eq!(&model, &reference);
    }
}
