//! The in-memory declaration model (spec §3, §4.5) plus the diagnosable
//! error registry (spec §7 tier 2).
//!
//! Every name captured here is a non-owning `&'a str` slice borrowed out of
//! an arena-backed input buffer (spec §9's first re-architecture
//! alternative: "parameterize the model over that lifetime").

use arrayvec::ArrayVec;
use snafu::Snafu;

/// Upper bound on each of the model's four declaration tables (spec §3,
/// §9: "256 declarations").
pub const MAX_DECLARATIONS: usize = 256;

/// Upper bound on a function's parameter list (spec §3: `param_count ≤ 32`).
pub const MAX_PARAMS: usize = 32;

/// Upper bound on the number of input files a single `process()` call
/// accepts (spec §6: "at most 16").
pub const MAX_INPUT_FILES: usize = 16;

/// A parsed declarator: type name, variable name, pointer flag, array
/// extent. `array_count` is always `>= 1` (1 means scalar).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variable<'a> {
    pub type_name: &'a str,
    pub name: &'a str,
    pub is_pointer: bool,
    pub array_count: u32,
}

impl<'a> Variable<'a> {
    /// A bare variable of the given type, no name yet, scalar, not a
    /// pointer — the accumulator the parser starts from for every member
    /// and parameter.
    pub fn of_type(type_name: &'a str) -> Self {
        Variable {
            type_name,
            name: "",
            is_pointer: false,
            array_count: 1,
        }
    }

    /// Sets the array extent, enforcing the `array_count >= 1` invariant.
    /// A parsed `[0]` is treated the same as no suffix at all (extent 1),
    /// since a zero-length array has no member-serialization meaning here.
    pub fn set_array_count(&mut self, count: u32) {
        self.array_count = count.max(1);
    }
}

/// A `struct` declaration: its name and ordered member list. Member lists
/// carry no stated cap in spec.md, so this stays a growable `Vec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructRecord<'a> {
    pub name: &'a str,
    pub members: Vec<Variable<'a>>,
}

/// An `enum`/`enum class`/`enum struct` declaration. Members are not
/// captured (spec §3: "body contents are not captured").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumRecord<'a> {
    pub name: &'a str,
    pub underlying: Option<&'a str>,
    pub is_enum_class: bool,
}

/// A `union` declaration: name only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnionRecord<'a> {
    pub name: &'a str,
}

/// A free function declaration: optional linkage keyword, return type,
/// name, and a parameter list capped at [`MAX_PARAMS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord<'a> {
    pub linkage: Option<&'a str>,
    pub return_type: &'a str,
    pub name: &'a str,
    pub params: ArrayVec<Variable<'a>, MAX_PARAMS>,
}

impl<'a> FunctionRecord<'a> {
    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

/// The four ordered collections of declarations discovered so far, in
/// file-by-file discovery order, each capped at [`MAX_DECLARATIONS`].
#[derive(Debug, Default)]
pub struct Model<'a> {
    pub structs: ArrayVec<StructRecord<'a>, MAX_DECLARATIONS>,
    pub enums: ArrayVec<EnumRecord<'a>, MAX_DECLARATIONS>,
    pub unions: ArrayVec<UnionRecord<'a>, MAX_DECLARATIONS>,
    pub functions: ArrayVec<FunctionRecord<'a>, MAX_DECLARATIONS>,
}

impl<'a> Model<'a> {
    pub fn new() -> Self {
        Model::default()
    }

    pub fn push_struct(&mut self, record: StructRecord<'a>) -> Result<(), ErrorKind> {
        self.structs
            .try_push(record)
            .map_err(|_| ErrorKind::TooManyDeclarations {
                kind: "struct",
                max: MAX_DECLARATIONS,
            })
    }

    pub fn push_enum(&mut self, record: EnumRecord<'a>) -> Result<(), ErrorKind> {
        self.enums
            .try_push(record)
            .map_err(|_| ErrorKind::TooManyDeclarations {
                kind: "enum",
                max: MAX_DECLARATIONS,
            })
    }

    pub fn push_union(&mut self, record: UnionRecord<'a>) -> Result<(), ErrorKind> {
        self.unions
            .try_push(record)
            .map_err(|_| ErrorKind::TooManyDeclarations {
                kind: "union",
                max: MAX_DECLARATIONS,
            })
    }

    pub fn push_function(&mut self, record: FunctionRecord<'a>) -> Result<(), ErrorKind> {
        self.functions
            .try_push(record)
            .map_err(|_| ErrorKind::TooManyDeclarations {
                kind: "function",
                max: MAX_DECLARATIONS,
            })
    }

    /// Every distinct type name mentioned anywhere in the model: the
    /// struct names themselves, plus every member's declared type, in
    /// first-seen order. Used by the generator to seed the `MetaType`
    /// enum (spec §4.6 step 2).
    pub fn distinct_type_names(&self) -> Vec<&'a str> {
        let mut seen = Vec::new();
        let mut push_unique = |name: &'a str| {
            if !seen.contains(&name) {
                seen.push(name);
            }
        };
        for s in &self.structs {
            push_unique(s.name);
        }
        for s in &self.structs {
            for m in &s.members {
                push_unique(m.type_name);
            }
        }
        seen
    }
}

/// Diagnosable operational error kinds (spec §7 tier 2): "keyed by an
/// error kind enum and a textual identifier."
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[snafu(display("ran out of memory"))]
    OutOfMemory,

    #[snafu(display("cannot find file: {path}"))]
    FileNotFound { path: String },

    #[snafu(display("could not write to disk: {path}"))]
    CouldNotWrite { path: String },

    #[snafu(display("file truncated during read: {path}"))]
    FileTruncated { path: String },

    #[snafu(display("failed to parse enum: {name}"))]
    FailedToParseEnum { name: String },

    #[snafu(display("too many input files (max {max})"))]
    TooManyInputFiles { max: usize },

    #[snafu(display("too many {kind} declarations (max {max})"))]
    TooManyDeclarations { kind: &'static str, max: usize },

    #[snafu(display("function `{name}` has too many parameters (max {max})"))]
    TooManyParameters { name: String, max: usize },
}

/// A single registry entry: an error kind plus whatever textual context it
/// carries (folded into `ErrorKind`'s own fields rather than a separate
/// tag, since `snafu`'s `Display` derive already renders it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub kind: ErrorKind,
}

/// The process-wide registry of tier-2 diagnosable errors (spec §7, §9:
/// "abstract as a sink passed to components that can fail recoverably").
/// Threaded explicitly through the call graph rather than kept as global
/// mutable state.
#[derive(Debug, Default)]
pub struct ErrorRegistry {
    entries: Vec<RegistryEntry>,
}

impl ErrorRegistry {
    pub fn new() -> Self {
        ErrorRegistry::default()
    }

    pub fn push(&mut self, kind: ErrorKind) {
        tracing::warn!(error = %kind, "diagnosable error recorded");
        self.entries.push(RegistryEntry { kind });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    /// Writes a one-line summary per entry to stderr and reports whether
    /// the caller should exit non-zero (spec §7: "A non-empty registry
    /// yields a non-zero exit code").
    pub fn drain_to_stderr(&self) -> bool {
        for entry in &self.entries {
            eprintln!("reflectc: error: {}", entry.kind);
        }
        !self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_count_is_never_zero() {
        let mut v = Variable::of_type("int");
        v.set_array_count(0);
        assert_eq!(v.array_count, 1);
        v.set_array_count(5);
        assert_eq!(v.array_count, 5);
    }

    #[test]
    fn distinct_type_names_preserves_first_seen_order() {
        let mut model = Model::new();
        model
            .push_struct(StructRecord {
                name: "V2",
                members: vec![Variable::of_type("int"), Variable::of_type("int")],
            })
            .unwrap();
        model
            .push_struct(StructRecord {
                name: "Ball",
                members: vec![Variable::of_type("V2"), Variable::of_type("int")],
            })
            .unwrap();
        assert_eq!(model.distinct_type_names(), vec!["V2", "Ball", "int"]);
    }

    #[test]
    fn registry_reports_nonempty() {
        let mut registry = ErrorRegistry::new();
        assert!(registry.is_empty());
        registry.push(ErrorKind::FileNotFound {
            path: "missing.h".to_string(),
        });
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[quickcheck]
    fn array_count_invariant_holds(n: u32) -> bool {
        let mut v = Variable::of_type("char");
        v.set_array_count(n);
        v.array_count >= 1
    }
}
