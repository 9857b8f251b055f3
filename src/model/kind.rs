//! The closed set of statement kinds.

use std::fmt;

/// Language version declared by a module's `yang-version` statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum YangVersion {
    /// RFC 6020
    #[default]
    V1,
    /// RFC 7950
    V1_1,
}

impl YangVersion {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "1" => Some(YangVersion::V1),
            "1.1" => Some(YangVersion::V1_1),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            YangVersion::V1 => "1",
            YangVersion::V1_1 => "1.1",
        }
    }
}

impl fmt::Display for YangVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! statement_kinds {
    ($($variant:ident => $keyword:literal,)*) => {
        /// Every statement keyword the reactor knows, plus [`StatementKind::Unknown`]
        /// for extension instances (`prefix:name`).
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        pub enum StatementKind {
            $($variant,)*
            Unknown,
        }

        impl StatementKind {
            fn from_builtin(keyword: &str) -> Option<Self> {
                match keyword {
                    $($keyword => Some(StatementKind::$variant),)*
                    _ => None,
                }
            }

            /// The keyword as written in sources.
            pub fn keyword(self) -> &'static str {
                match self {
                    $(StatementKind::$variant => $keyword,)*
                    StatementKind::Unknown => "extension instance",
                }
            }
        }
    };
}

statement_kinds! {
    Action => "action",
    Anydata => "anydata",
    Anyxml => "anyxml",
    Argument => "argument",
    Augment => "augment",
    Base => "base",
    BelongsTo => "belongs-to",
    Bit => "bit",
    Case => "case",
    Choice => "choice",
    Config => "config",
    Contact => "contact",
    Container => "container",
    Default => "default",
    Description => "description",
    Deviate => "deviate",
    Deviation => "deviation",
    Enum => "enum",
    ErrorAppTag => "error-app-tag",
    ErrorMessage => "error-message",
    Extension => "extension",
    Feature => "feature",
    FractionDigits => "fraction-digits",
    Grouping => "grouping",
    Identity => "identity",
    IfFeature => "if-feature",
    Import => "import",
    Include => "include",
    Input => "input",
    Key => "key",
    Leaf => "leaf",
    LeafList => "leaf-list",
    Length => "length",
    List => "list",
    Mandatory => "mandatory",
    MaxElements => "max-elements",
    MinElements => "min-elements",
    Modifier => "modifier",
    Module => "module",
    Must => "must",
    Namespace => "namespace",
    Notification => "notification",
    OrderedBy => "ordered-by",
    Organization => "organization",
    Output => "output",
    Path => "path",
    Pattern => "pattern",
    Position => "position",
    Prefix => "prefix",
    Presence => "presence",
    Range => "range",
    Reference => "reference",
    Refine => "refine",
    RequireInstance => "require-instance",
    Revision => "revision",
    RevisionDate => "revision-date",
    Rpc => "rpc",
    Status => "status",
    Submodule => "submodule",
    Type => "type",
    Typedef => "typedef",
    Unique => "unique",
    Units => "units",
    Uses => "uses",
    Value => "value",
    When => "when",
    YangVersion => "yang-version",
    YinElement => "yin-element",
}

impl StatementKind {
    /// Classifies a keyword. `prefix:name` keywords are extension
    /// instances; any other unknown keyword yields `None`.
    pub fn classify(keyword: &str) -> Option<Self> {
        if keyword.contains(':') {
            Some(StatementKind::Unknown)
        } else {
            Self::from_builtin(keyword)
        }
    }

    /// First language version in which the statement is legal.
    pub fn introduced_in(self) -> YangVersion {
        match self {
            StatementKind::Action | StatementKind::Anydata | StatementKind::Modifier => {
                YangVersion::V1_1
            }
            _ => YangVersion::V1,
        }
    }

    /// Nodes that appear in instance data.
    pub fn is_data_node(self) -> bool {
        matches!(
            self,
            StatementKind::Container
                | StatementKind::Leaf
                | StatementKind::LeafList
                | StatementKind::List
                | StatementKind::Anydata
                | StatementKind::Anyxml
        )
    }

    /// Nodes addressable by a schema node identifier.
    pub fn is_schema_node(self) -> bool {
        self.is_data_node()
            || matches!(
                self,
                StatementKind::Choice
                    | StatementKind::Case
                    | StatementKind::Rpc
                    | StatementKind::Action
                    | StatementKind::Input
                    | StatementKind::Output
                    | StatementKind::Notification
            )
    }

    /// Statements a `uses` copies out of a grouping.
    pub fn is_instantiated_by_uses(self) -> bool {
        self.is_schema_node() || self == StatementKind::Unknown
    }

    /// Legal targets of an `augment`.
    pub fn accepts_augmentation(self) -> bool {
        matches!(
            self,
            StatementKind::Container
                | StatementKind::List
                | StatementKind::Choice
                | StatementKind::Case
                | StatementKind::Input
                | StatementKind::Output
                | StatementKind::Notification
        )
    }

    /// Schema nodes whose children live in the parent's data namespace.
    pub fn is_transparent(self) -> bool {
        matches!(self, StatementKind::Choice | StatementKind::Case)
    }

    /// Whether `child` may appear directly under a statement of this
    /// kind. Extension instances may appear anywhere and take anything.
    /// The table is the union of both language versions; version gating
    /// is [`StatementKind::introduced_in`]'s job.
    pub fn allows_substatement(self, child: StatementKind) -> bool {
        use StatementKind as K;

        if child == K::Unknown || self == K::Unknown {
            return true;
        }
        let documented = matches!(child, K::Description | K::Reference);
        let data_def = matches!(
            child,
            K::Container | K::Leaf | K::LeafList | K::List | K::Choice | K::Anydata | K::Anyxml | K::Uses
        );
        let definitions = matches!(child, K::Typedef | K::Grouping);
        let operations = matches!(child, K::Action | K::Notification);
        let header = matches!(
            child,
            K::YangVersion | K::Import | K::Include | K::Organization | K::Contact | K::Revision
        );
        let body = data_def
            || definitions
            || matches!(
                child,
                K::Extension | K::Feature | K::Identity | K::Augment | K::Rpc | K::Notification | K::Deviation
            );
        let common = documented || child == K::Status;
        let conditional = child == K::IfFeature;
        let guarded = conditional || child == K::When;

        match self {
            K::Module => header || body || documented || matches!(child, K::Namespace | K::Prefix),
            K::Submodule => header || body || documented || child == K::BelongsTo,
            K::Import => documented || matches!(child, K::Prefix | K::RevisionDate),
            K::Include => documented || child == K::RevisionDate,
            K::BelongsTo => child == K::Prefix,
            K::Revision | K::When => documented,
            K::Extension => common || child == K::Argument,
            K::Argument => child == K::YinElement,
            K::Feature => common || conditional,
            K::Identity => common || conditional || child == K::Base,
            K::Typedef => common || matches!(child, K::Type | K::Units | K::Default),
            K::Type => matches!(
                child,
                K::Base
                    | K::Bit
                    | K::Enum
                    | K::FractionDigits
                    | K::Length
                    | K::Path
                    | K::Pattern
                    | K::Range
                    | K::RequireInstance
                    | K::Type
            ),
            K::Range | K::Length | K::Must => documented || matches!(child, K::ErrorMessage | K::ErrorAppTag),
            K::Pattern => documented || matches!(child, K::ErrorMessage | K::ErrorAppTag | K::Modifier),
            K::Enum => common || conditional || child == K::Value,
            K::Bit => common || conditional || child == K::Position,
            K::Container => {
                common
                    || guarded
                    || data_def
                    || definitions
                    || operations
                    || matches!(child, K::Must | K::Presence | K::Config)
            }
            K::Leaf => {
                common
                    || guarded
                    || matches!(child, K::Type | K::Units | K::Must | K::Default | K::Config | K::Mandatory)
            }
            K::LeafList => {
                common
                    || guarded
                    || matches!(
                        child,
                        K::Type
                            | K::Units
                            | K::Must
                            | K::Default
                            | K::Config
                            | K::MinElements
                            | K::MaxElements
                            | K::OrderedBy
                    )
            }
            K::List => {
                common
                    || guarded
                    || data_def
                    || definitions
                    || operations
                    || matches!(
                        child,
                        K::Must | K::Key | K::Unique | K::Config | K::MinElements | K::MaxElements | K::OrderedBy
                    )
            }
            K::Choice => {
                common
                    || guarded
                    || (data_def && child != K::Uses)
                    || matches!(child, K::Case | K::Default | K::Config | K::Mandatory)
            }
            K::Case => common || guarded || data_def,
            K::Anydata | K::Anyxml => {
                common || guarded || matches!(child, K::Must | K::Config | K::Mandatory)
            }
            K::Grouping => common || data_def || definitions || operations,
            K::Uses => common || guarded || matches!(child, K::Refine | K::Augment),
            K::Refine => {
                documented
                    || conditional
                    || matches!(
                        child,
                        K::Must
                            | K::Presence
                            | K::Default
                            | K::Config
                            | K::Mandatory
                            | K::MinElements
                            | K::MaxElements
                    )
            }
            K::Augment => common || guarded || data_def || operations || child == K::Case,
            K::Rpc | K::Action => common || conditional || definitions || matches!(child, K::Input | K::Output),
            K::Input | K::Output => data_def || definitions || child == K::Must,
            K::Notification => common || conditional || data_def || definitions || child == K::Must,
            K::Deviation => documented || child == K::Deviate,
            K::Deviate => matches!(
                child,
                K::Units
                    | K::Must
                    | K::Unique
                    | K::Default
                    | K::Config
                    | K::Mandatory
                    | K::MinElements
                    | K::MaxElements
                    | K::Type
            ),
            _ => false,
        }
    }
}

/// Names of the built-in types; a typedef may not reuse them.
pub const BUILTIN_TYPES: [&str; 19] = [
    "binary",
    "bits",
    "boolean",
    "decimal64",
    "empty",
    "enumeration",
    "identityref",
    "instance-identifier",
    "int8",
    "int16",
    "int32",
    "int64",
    "leafref",
    "string",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "union",
];

pub fn is_builtin_type(name: &str) -> bool {
    BUILTIN_TYPES.contains(&name)
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keywords() {
        assert_eq!(StatementKind::classify("leaf-list"), Some(StatementKind::LeafList));
        assert_eq!(StatementKind::classify("ext:annotation"), Some(StatementKind::Unknown));
        assert_eq!(StatementKind::classify("leafy"), None);
        assert_eq!(StatementKind::LeafList.keyword(), "leaf-list");
    }

    #[test]
    fn test_version_gated_statements() {
        assert_eq!(StatementKind::Anydata.introduced_in(), YangVersion::V1_1);
        assert_eq!(StatementKind::Container.introduced_in(), YangVersion::V1);
        assert!(YangVersion::V1 < YangVersion::V1_1);
        assert_eq!(YangVersion::parse("1.1"), Some(YangVersion::V1_1));
        assert_eq!(YangVersion::parse("2"), None);
    }

    #[test]
    fn test_schema_node_classification() {
        assert!(StatementKind::Choice.is_schema_node());
        assert!(!StatementKind::Choice.is_data_node());
        assert!(!StatementKind::Grouping.is_instantiated_by_uses());
        assert!(StatementKind::Unknown.is_instantiated_by_uses());
        assert!(!StatementKind::Leaf.accepts_augmentation());
    }

    #[test]
    fn test_substatement_placement() {
        use StatementKind as K;
        assert!(K::Module.allows_substatement(K::Namespace));
        assert!(!K::Submodule.allows_substatement(K::Namespace));
        assert!(K::List.allows_substatement(K::Key));
        assert!(!K::Leaf.allows_substatement(K::Key));
        assert!(!K::Leaf.allows_substatement(K::Container));
        assert!(!K::Container.allows_substatement(K::Type));
        assert!(K::Choice.allows_substatement(K::Leaf));
        assert!(!K::Choice.allows_substatement(K::Uses));
        assert!(K::Leaf.allows_substatement(K::Unknown));
        assert!(K::Unknown.allows_substatement(K::Container));
        assert!(!K::Description.allows_substatement(K::Description));
    }

    #[test]
    fn test_builtin_types() {
        assert!(is_builtin_type("int32"));
        assert!(is_builtin_type("instance-identifier"));
        assert!(!is_builtin_type("counter"));
    }
}
