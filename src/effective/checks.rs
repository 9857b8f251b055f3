//! Well-formedness checks run on the settled tree before it is frozen.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::diagnostics::{Diagnostic, DiagnosticCollector, ErrorKind, codes};
use crate::graph::{is_cycle, strongly_connected};
use crate::model::restriction::{self, Interval, LENGTH_BOUNDS};
use crate::model::{Argument, MaxElements, PrefixedName, QName, Status, StatementKind, is_builtin_type};
use crate::reactor::Reactor;
use crate::reactor::context::StmtId;

type K = StatementKind;

/// Substatements that may appear at most once under one parent.
const SINGLETONS: [StatementKind; 33] = [
    K::Argument,
    K::BelongsTo,
    K::Config,
    K::Contact,
    K::Default,
    K::Description,
    K::ErrorAppTag,
    K::ErrorMessage,
    K::FractionDigits,
    K::Input,
    K::Key,
    K::Length,
    K::Mandatory,
    K::MaxElements,
    K::MinElements,
    K::Modifier,
    K::Namespace,
    K::OrderedBy,
    K::Organization,
    K::Output,
    K::Path,
    K::Position,
    K::Prefix,
    K::Presence,
    K::Range,
    K::Reference,
    K::RequireInstance,
    K::RevisionDate,
    K::Status,
    K::Type,
    K::Units,
    K::Value,
    K::When,
];

/// Returns every error found.
pub(crate) fn run(reactor: &Reactor<'_>) -> Vec<Diagnostic> {
    let mut checker = Checker {
        reactor,
        diagnostics: DiagnosticCollector::new(),
    };
    for &root in &reactor.roots {
        if reactor.tree.get(root).kind == K::Module {
            let group = reactor.module_group(root);
            checker.unique_data_names(&group);
        }
        checker.visit(root);
    }
    checker.definition_cycles(K::Typedef, K::Type);
    checker.definition_cycles(K::Identity, K::Base);
    checker.diagnostics.take()
}

struct Checker<'r, 'a> {
    reactor: &'r Reactor<'a>,
    diagnostics: DiagnosticCollector,
}

impl Checker<'_, '_> {
    fn live_children(&self, ctx: StmtId) -> Vec<StmtId> {
        let tree = &self.reactor.tree;
        tree.live_children(ctx)
            .filter(|&c| !tree.get(c).unsupported)
            .collect()
    }

    fn name(&self, ctx: StmtId) -> SmolStr {
        self.reactor
            .local_name(ctx)
            .or_else(|| self.reactor.tree.get(ctx).raw_argument.clone())
            .unwrap_or_default()
    }

    fn error(&mut self, kind: ErrorKind, code: &'static str, ctx: StmtId, message: String) {
        let reference = self.reactor.reference(ctx).clone();
        self.diagnostics.error(kind, code, &reference, message);
    }

    fn visit(&mut self, ctx: StmtId) {
        let kind = self.reactor.tree.get(ctx).kind;
        match kind {
            K::Container | K::List | K::Input | K::Output | K::Notification | K::Rpc | K::Action | K::Grouping => {
                self.unique_data_names(&[ctx]);
            }
            K::Choice => self.unique_case_names(ctx),
            _ => {}
        }
        if !matches!(kind, K::Refine | K::Deviate | K::Unknown) {
            self.cardinality(ctx);
        }
        if matches!(kind, K::Leaf | K::LeafList | K::Typedef) && self.reactor.tree.child_of_kind(ctx, K::Type).is_none() {
            let name = self.name(ctx);
            self.error(
                ErrorKind::Constraint,
                codes::CARDINALITY,
                ctx,
                format!("{kind} '{name}' has no 'type'"),
            );
        }
        if matches!(kind, K::List | K::LeafList) {
            self.element_range(ctx);
        }
        if kind == K::List {
            self.list_keys(ctx);
        }
        self.resolution(ctx);
        if matches!(kind, K::Type | K::Uses | K::Base) && self.reactor.tree.get(ctx).history.is_original() {
            self.status(ctx);
            if kind == K::Type {
                self.restrictions(ctx);
            }
        }

        for child in self.live_children(ctx) {
            self.visit(child);
        }
    }

    // ========================================================================
    // NAMES
    // ========================================================================

    /// Data nodes sharing the identifier namespace of `parents`: direct
    /// schema children plus whatever sits in their choices' cases.
    fn data_namespace(&self, parent: StmtId, out: &mut Vec<StmtId>) {
        for child in self.live_children(parent) {
            let kind = self.reactor.tree.get(child).kind;
            if !kind.is_schema_node() {
                continue;
            }
            if kind == K::Case {
                self.data_namespace(child, out);
                continue;
            }
            out.push(child);
            if kind == K::Choice {
                self.data_namespace(child, out);
            }
        }
    }

    fn unique_data_names(&mut self, parents: &[StmtId]) {
        let mut nodes = Vec::new();
        for &parent in parents {
            self.data_namespace(parent, &mut nodes);
        }
        self.report_duplicates("node", &nodes);
    }

    fn unique_case_names(&mut self, choice: StmtId) {
        let cases: Vec<StmtId> = self
            .live_children(choice)
            .into_iter()
            .filter(|&c| self.reactor.tree.get(c).kind.is_schema_node())
            .collect();
        self.report_duplicates("case", &cases);
    }

    fn report_duplicates(&mut self, what: &str, nodes: &[StmtId]) {
        let mut seen: FxHashMap<QName, StmtId> = FxHashMap::default();
        for &node in nodes {
            let Some(qname) = self.reactor.qname_of(node) else {
                continue;
            };
            match seen.get(&qname) {
                Some(&existing) => {
                    let duplicate = self.reactor.reference(node).clone();
                    let existing = self.reactor.reference(existing).clone();
                    self.diagnostics
                        .duplicate_definition(what, &qname.local, &duplicate, &existing);
                }
                None => {
                    seen.insert(qname, node);
                }
            }
        }
    }

    // ========================================================================
    // SUBSTATEMENTS
    // ========================================================================

    fn cardinality(&mut self, ctx: StmtId) {
        let parent_kind = self.reactor.tree.get(ctx).kind;
        let mut first: FxHashMap<StatementKind, StmtId> = FxHashMap::default();
        for child in self.live_children(ctx) {
            let kind = self.reactor.tree.get(child).kind;
            let repeatable = (kind == K::Default && parent_kind == K::LeafList)
                || (kind == K::Type && parent_kind == K::Type);
            if !SINGLETONS.contains(&kind) || repeatable {
                continue;
            }
            match first.get(&kind) {
                Some(&existing) => {
                    let diagnostic = Diagnostic::error(
                        ErrorKind::Constraint,
                        codes::CARDINALITY,
                        Some(self.reactor.reference(child).clone()),
                        format!("'{kind}' may appear only once in '{parent_kind}'"),
                    )
                    .with_related(self.reactor.reference(existing).clone(), "first occurrence");
                    self.diagnostics.add(diagnostic);
                }
                None => {
                    first.insert(kind, child);
                }
            }
        }
    }

    fn element_range(&mut self, ctx: StmtId) {
        let tree = &self.reactor.tree;
        let min = tree
            .child_of_kind(ctx, K::MinElements)
            .and_then(|c| match tree.get(c).argument {
                Argument::Uint(n) => Some(n),
                _ => None,
            })
            .unwrap_or(0);
        let Some(max_stmt) = tree.child_of_kind(ctx, K::MaxElements) else {
            return;
        };
        let max = match tree.get(max_stmt).argument {
            Argument::MaxElements(MaxElements::Bounded(max)) => max,
            _ => return,
        };
        if min > max {
            let name = self.name(ctx);
            self.error(
                ErrorKind::Constraint,
                codes::ELEMENT_RANGE,
                max_stmt,
                format!("'{name}' has min-elements {min} greater than max-elements {max}"),
            );
        }
    }

    fn list_keys(&mut self, list: StmtId) {
        let Some(key) = self.reactor.tree.child_of_kind(list, K::Key) else {
            return;
        };
        let names = self.reactor.tree.get(key).raw_argument.clone().unwrap_or_default();
        let leaves: Vec<SmolStr> = self
            .live_children(list)
            .into_iter()
            .filter(|&c| self.reactor.tree.get(c).kind == K::Leaf)
            .filter_map(|c| self.reactor.local_name(c))
            .collect();
        for name in names.split_whitespace() {
            let local = PrefixedName::parse(name).map(|p| p.name).ok();
            if !local.is_some_and(|l| leaves.contains(&l)) {
                let list_name = self.name(list);
                self.error(
                    ErrorKind::Constraint,
                    codes::INVALID_ARGUMENT,
                    key,
                    format!("key '{name}' of list '{list_name}' is not one of its leaves"),
                );
            }
        }
    }

    // ========================================================================
    // TYPE RESTRICTIONS
    // ========================================================================

    /// The built-in type `ty` derives from, with the `type` statements
    /// along the derivation, nearest first. `None` for cyclic or
    /// unresolved derivations, which are reported on their own.
    fn derivation(&self, ty: StmtId) -> Option<(SmolStr, Vec<StmtId>)> {
        let tree = &self.reactor.tree;
        let mut chain = vec![ty];
        let mut current = ty;
        loop {
            let node = tree.get(current);
            let name = node.argument.as_prefixed_name()?;
            if name.prefix.is_none() && is_builtin_type(&name.name) {
                return Some((name.name.clone(), chain));
            }
            current = tree.child_of_kind(node.resolved?, K::Type)?;
            if chain.contains(&current) {
                return None;
            }
            chain.push(current);
        }
    }

    /// Intervals left after the `kind` restrictions of the derivation
    /// `outer`, innermost last, have narrowed `bounds`.
    fn inherited(&self, outer: &[StmtId], kind: StatementKind, bounds: Interval, scale: u32) -> Vec<Interval> {
        let tree = &self.reactor.tree;
        let mut effective = vec![bounds];
        for &ty in outer.iter().rev() {
            let Some(text) = tree
                .child_of_kind(ty, kind)
                .and_then(|r| tree.get(r).raw_argument.clone())
            else {
                continue;
            };
            match restriction::narrow(&text, scale, &effective) {
                Ok(narrowed) => effective = narrowed,
                Err(_) => break,
            }
        }
        effective
    }

    fn restrictions(&mut self, ty: StmtId) {
        let Some((builtin, chain)) = self.derivation(ty) else {
            return;
        };
        let tree = &self.reactor.tree;
        let direct = chain.len() == 1;
        let described = if direct {
            format!("type '{builtin}'")
        } else {
            format!("type '{}' derived from '{builtin}'", self.name(ty))
        };

        let fraction_digits = chain.last().and_then(|&root| tree.child_of_kind(root, K::FractionDigits)).and_then(|f| {
            match tree.get(f).argument {
                Argument::Uint(n @ 1..=18) => Some(n as u32),
                _ => None,
            }
        });
        if builtin == "decimal64" && direct && tree.child_of_kind(ty, K::FractionDigits).is_none() {
            self.error(
                ErrorKind::Constraint,
                codes::INVALID_RESTRICTION,
                ty,
                "type 'decimal64' requires 'fraction-digits'".to_string(),
            );
        }

        for child in self.live_children(ty) {
            let node = self.reactor.tree.get(child);
            let kind = node.kind;
            let text = node.raw_argument.clone().unwrap_or_default();
            let (applies, problem) = match kind {
                K::FractionDigits => {
                    let legal = matches!(node.argument, Argument::Uint(1..=18));
                    let problem = (!legal).then(|| format!("fraction-digits '{text}' is not between 1 and 18"));
                    (builtin == "decimal64" && direct, problem)
                }
                K::Range => {
                    let problem = match (restriction::numeric_bounds(&builtin), builtin == "decimal64") {
                        (Some(_), true) if fraction_digits.is_none() => None,
                        (Some(bounds), decimal) => {
                            let scale = if decimal { fraction_digits.unwrap_or(0) } else { 0 };
                            let parent = self.inherited(&chain[1..], K::Range, bounds, scale);
                            restriction::narrow(&text, scale, &parent)
                                .err()
                                .map(|e| format!("invalid range: {e}"))
                        }
                        (None, _) => None,
                    };
                    (restriction::accepts_range(&builtin), problem)
                }
                K::Length => {
                    let problem = restriction::accepts_length(&builtin)
                        .then(|| {
                            let parent = self.inherited(&chain[1..], K::Length, LENGTH_BOUNDS, 0);
                            restriction::narrow(&text, 0, &parent).err()
                        })
                        .flatten()
                        .map(|e| format!("invalid length: {e}"));
                    (restriction::accepts_length(&builtin), problem)
                }
                K::Pattern => {
                    let problem = restriction::compile_pattern(&text)
                        .err()
                        .map(|e| format!("invalid pattern '{text}': {e}"));
                    (restriction::accepts_pattern(&builtin), problem)
                }
                _ => continue,
            };
            let message = if applies {
                match problem {
                    Some(message) => message,
                    None => continue,
                }
            } else {
                format!("'{kind}' does not apply to {described}")
            };
            self.error(ErrorKind::Constraint, codes::INVALID_RESTRICTION, child, message);
        }
    }

    // ========================================================================
    // REFERENCES
    // ========================================================================

    /// Every reference that reaches the effective model must be resolved.
    fn resolution(&mut self, ctx: StmtId) {
        let node = self.reactor.tree.get(ctx);
        let unresolved = match node.kind {
            K::Type => {
                let builtin = node
                    .argument
                    .as_prefixed_name()
                    .is_some_and(|n| n.prefix.is_none() && is_builtin_type(&n.name));
                !builtin && node.resolved.is_none()
            }
            K::Uses | K::Base | K::Augment | K::Deviation | K::Unknown => node.resolved.is_none(),
            K::IfFeature => node.condition.is_none(),
            _ => false,
        };
        if unresolved {
            let message = format!(
                "'{} {}' was never resolved",
                node.keyword,
                node.raw_argument.clone().unwrap_or_default()
            );
            self.error(ErrorKind::InferenceStall, codes::UNRESOLVED_REFERENCE, ctx, message);
        }
    }

    fn status_of(&self, ctx: StmtId) -> Status {
        let tree = &self.reactor.tree;
        tree.child_of_kind(ctx, K::Status)
            .and_then(|s| match tree.get(s).argument {
                Argument::Status(status) => Some(status),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// A definition may only reference definitions of its own module
    /// that are at least as current as itself.
    fn status(&mut self, reference: StmtId) {
        let tree = &self.reactor.tree;
        let Some(target) = tree.get(reference).resolved else {
            return;
        };
        let Some(referrer) = tree.ancestors(reference).find(|&a| {
            let kind = tree.get(a).kind;
            kind.is_schema_node() || matches!(kind, K::Typedef | K::Grouping | K::Identity | K::Feature)
        }) else {
            return;
        };
        let same_module =
            self.reactor.module_name(tree.get(referrer).root) == self.reactor.module_name(tree.get(target).root);
        let (own, theirs) = (self.status_of(referrer), self.status_of(target));
        if same_module && own < theirs {
            let message = format!(
                "{} '{}' is {} but references {} {} '{}'",
                tree.get(referrer).kind,
                self.name(referrer),
                status_name(own),
                status_name(theirs),
                tree.get(target).kind,
                self.name(target),
            );
            self.error(ErrorKind::Constraint, codes::STATUS_MISMATCH, reference, message);
        }
    }

    /// Definitions of `kind` whose `via` references lead back to
    /// themselves.
    fn definition_cycles(&mut self, kind: StatementKind, via: StatementKind) {
        let tree = &self.reactor.tree;
        let definitions: Vec<StmtId> = tree
            .ids_from(0)
            .filter(|&id| {
                let node = tree.get(id);
                node.kind == kind && node.history.is_original() && node.is_live()
            })
            .collect();
        let mut edges: FxHashMap<StmtId, Vec<StmtId>> = FxHashMap::default();
        for &definition in &definitions {
            let mut stack = vec![definition];
            let mut targets = Vec::new();
            while let Some(current) = stack.pop() {
                for child in tree.live_children(current) {
                    let node = tree.get(child);
                    if node.kind == via {
                        targets.extend(node.resolved);
                        stack.push(child);
                    }
                }
            }
            edges.insert(definition, targets);
        }

        let successors = |id: StmtId| edges.get(&id).cloned().unwrap_or_default();
        let mut found = Vec::new();
        for component in strongly_connected(definitions.iter().copied(), successors) {
            if is_cycle(&component, successors) {
                found.push(component);
            }
        }
        for component in found {
            let names: Vec<String> = component.iter().map(|&d| format!("'{}'", self.name(d))).collect();
            let message = match names.as_slice() {
                [single] => format!("{kind} {single} refers to itself"),
                _ => format!("{kind} definitions {} refer to each other", names.join(", ")),
            };
            let mut diagnostic = Diagnostic::error(
                ErrorKind::Constraint,
                codes::CIRCULAR_DEPENDENCY,
                Some(self.reactor.reference(component[0]).clone()),
                message,
            );
            for &member in &component[1..] {
                diagnostic = diagnostic.with_related(self.reactor.reference(member).clone(), "part of the cycle");
            }
            self.diagnostics.add(diagnostic);
        }
    }
}

fn status_name(status: Status) -> &'static str {
    match status {
        Status::Current => "current",
        Status::Deprecated => "deprecated",
        Status::Obsolete => "obsolete",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::BuildError;
    use crate::reactor::build;
    use crate::source::SourceDescriptor;

    fn build_err(body: &str) -> BuildError {
        let text = format!("module m {{ namespace urn:m; prefix m;\n{body}\n}}");
        let source = Arc::new(SourceDescriptor::parse("m.yang", text).unwrap());
        build(&[source]).unwrap_err()
    }

    fn builds(body: &str) {
        let text = format!("module m {{ namespace urn:m; prefix m;\n{body}\n}}");
        let source = Arc::new(SourceDescriptor::parse("m.yang", text).unwrap());
        if let Err(error) = build(&[source]) {
            panic!("{error}");
        }
    }

    /// The single diagnostic with `code`, and the 0-based line it points at.
    fn only(error: &BuildError, code: &str) -> (Diagnostic, u32) {
        let found: Vec<_> = error.errors().filter(|d| d.code == code).collect();
        assert_eq!(found.len(), 1, "{error}");
        let line = found[0].reference.as_ref().unwrap().position.line;
        (found[0].clone(), line)
    }

    #[test]
    fn test_min_elements_above_max_elements() {
        let error = build_err(
            "leaf-list ll {
               type string;
               min-elements 5;
               max-elements 2; }",
        );
        let (diagnostic, line) = only(&error, codes::ELEMENT_RANGE);
        assert_eq!(diagnostic.kind, ErrorKind::Constraint);
        assert_eq!(line, 4);
        assert_eq!(
            diagnostic.message.as_ref(),
            "'ll' has min-elements 5 greater than max-elements 2"
        );
    }

    #[test]
    fn test_current_definition_using_deprecated_typedef() {
        let error = build_err(
            "typedef old { type string; status deprecated; }
             leaf l {
               type old; }",
        );
        let (diagnostic, line) = only(&error, codes::STATUS_MISMATCH);
        assert_eq!(line, 3);
        assert_eq!(
            diagnostic.message.as_ref(),
            "leaf 'l' is current but references deprecated typedef 'old'"
        );
    }

    #[test]
    fn test_deprecated_definition_may_use_deprecated_typedef() {
        builds("typedef old { type string; status deprecated; } leaf l { type old; status obsolete; }");
    }

    #[test]
    fn test_typedef_cycle() {
        let error = build_err(
            "typedef a { type b; }
             typedef b { type a; }",
        );
        let (diagnostic, _) = only(&error, codes::CIRCULAR_DEPENDENCY);
        assert!(diagnostic.message.starts_with("typedef definitions "), "{}", diagnostic.message);
        assert!(diagnostic.message.contains("'a'") && diagnostic.message.contains("'b'"));
        assert_eq!(diagnostic.related.len(), 1);
    }

    #[test]
    fn test_typedef_referring_to_itself() {
        let error = build_err("typedef a {\n type a; }");
        let (diagnostic, line) = only(&error, codes::CIRCULAR_DEPENDENCY);
        assert_eq!(diagnostic.message.as_ref(), "typedef 'a' refers to itself");
        assert_eq!(line, 1);
    }

    #[test]
    fn test_identity_cycle() {
        let error = build_err("identity a { base b; } identity b { base c; } identity c { base a; }");
        let (diagnostic, _) = only(&error, codes::CIRCULAR_DEPENDENCY);
        assert!(diagnostic.message.starts_with("identity definitions "), "{}", diagnostic.message);
        assert_eq!(diagnostic.related.len(), 2);
    }

    #[test]
    fn test_singleton_substatement_repeated() {
        let error = build_err(
            "leaf l {
               type string;
               units a;
               units b; }",
        );
        let (diagnostic, line) = only(&error, codes::CARDINALITY);
        assert_eq!(line, 4);
        assert_eq!(diagnostic.message.as_ref(), "'units' may appear only once in 'leaf'");
        assert_eq!(diagnostic.related[0].reference.position.line, 3);
    }

    #[test]
    fn test_leaf_without_type() {
        let error = build_err("leaf l {\n description \"untyped\"; }");
        let (diagnostic, line) = only(&error, codes::CARDINALITY);
        assert_eq!(diagnostic.message.as_ref(), "leaf 'l' has no 'type'");
        assert_eq!(line, 1);
    }

    #[test]
    fn test_list_key_must_name_a_leaf() {
        let error = build_err(
            "list l {
               key \"id missing\";
               leaf id { type string; } }",
        );
        let (diagnostic, line) = only(&error, codes::INVALID_ARGUMENT);
        assert_eq!(line, 2);
        assert_eq!(
            diagnostic.message.as_ref(),
            "key 'missing' of list 'l' is not one of its leaves"
        );
    }

    // ========================================================================
    // TYPE RESTRICTIONS
    // ========================================================================

    #[test]
    fn test_restrictions_that_fit_their_types() {
        builds(
            r#"typedef small { type int8 { range "1..10 | 20..30"; } }
               typedef smaller { type small { range "min..5 | 25..max"; } }
               leaf a { type smaller { range "2..4"; } }
               leaf b { type string { length "1..max"; pattern '[a-z]+\d*'; } }
               leaf c { type decimal64 { fraction-digits 2; range "-1.5..1.5"; } }
               leaf d { type binary { length "0..16"; } }"#,
        );
    }

    #[test]
    fn test_length_on_a_number() {
        let error = build_err("leaf l { type int32 {\n length \"1..3\"; } }");
        let (diagnostic, line) = only(&error, codes::INVALID_RESTRICTION);
        assert_eq!(line, 2);
        assert_eq!(diagnostic.message.as_ref(), "'length' does not apply to type 'int32'");
    }

    #[test]
    fn test_pattern_on_a_derived_number() {
        let error = build_err("typedef count { type uint32; } leaf l { type count { pattern \"[0-9]+\"; } }");
        let (diagnostic, _) = only(&error, codes::INVALID_RESTRICTION);
        assert_eq!(
            diagnostic.message.as_ref(),
            "'pattern' does not apply to type 'count' derived from 'uint32'"
        );
    }

    #[test]
    fn test_descending_range() {
        let error = build_err("leaf l { type uint8 { range \"10..1\"; } }");
        let (diagnostic, _) = only(&error, codes::INVALID_RESTRICTION);
        assert_eq!(diagnostic.message.as_ref(), "invalid range: '10..1' is descending");
    }

    #[test]
    fn test_range_must_narrow_the_base_type() {
        let error = build_err(
            r#"typedef small { type int8 { range "1..10"; } }
               leaf l { type small { range "5..20"; } }
               leaf big { type uint8 { range "0..300"; } }"#,
        );
        let found: Vec<_> = error
            .errors()
            .filter(|d| d.code == codes::INVALID_RESTRICTION)
            .map(|d| d.message.to_string())
            .collect();
        assert_eq!(
            found,
            vec![
                "invalid range: '5..20' is outside of what the base type allows",
                "invalid range: '0..300' is outside of what the base type allows",
            ]
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let error = build_err("leaf l { type string { pattern \"[0-9\"; } }");
        let (diagnostic, _) = only(&error, codes::INVALID_RESTRICTION);
        assert!(diagnostic.message.starts_with("invalid pattern '[0-9'"), "{}", diagnostic.message);
    }

    #[test]
    fn test_decimal64_needs_fraction_digits() {
        let error = build_err("leaf l { type decimal64; } leaf m { type decimal64 { fraction-digits 2; range \"0.125\"; } }");
        let messages: Vec<_> = error
            .errors()
            .filter(|d| d.code == codes::INVALID_RESTRICTION)
            .map(|d| d.message.to_string())
            .collect();
        assert_eq!(
            messages,
            vec![
                "type 'decimal64' requires 'fraction-digits'",
                "invalid range: '0.125' has more than 2 fraction digits",
            ]
        );
    }
}
