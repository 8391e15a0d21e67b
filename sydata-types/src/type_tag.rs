use std::fmt;
use std::str::FromStr;

use sydata_result::{Error, Result};

use crate::parse::{AliasMap, Parser};

/// Recursive descriptor of a container's shape.
///
/// Dispatch in the container layer matches on the variant only; nested tags
/// describe the content of each element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Ordered sequence of elements of one type.
    List(Box<TypeTag>),
    /// Keyed mapping. Keys are `Text` for every dictionary the container
    /// layer can persist.
    Dict {
        key: Box<TypeTag>,
        value: Box<TypeTag>,
    },
    /// Named, ordered fields with individual types.
    Record(Vec<(String, TypeTag)>),
    /// Columnar table leaf.
    Table,
    /// Positional fields with individual types.
    Tuple(Vec<TypeTag>),
    /// Text leaf.
    Text,
    /// Signature of a computation. Not instantiable as a container.
    Function {
        args: Box<TypeTag>,
        result: Box<TypeTag>,
    },
    /// Type variable. Matches any type; not instantiable as a container.
    Generic(String),
    /// Named reference to another tag.
    Alias { name: String, target: Box<TypeTag> },
}

impl TypeTag {
    pub fn list(inner: TypeTag) -> Self {
        TypeTag::List(Box::new(inner))
    }

    /// Dictionary with text keys.
    pub fn dict(value: TypeTag) -> Self {
        TypeTag::Dict {
            key: Box::new(TypeTag::Text),
            value: Box::new(value),
        }
    }

    pub fn record<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, TypeTag)>,
        S: Into<String>,
    {
        TypeTag::Record(fields.into_iter().map(|(n, t)| (n.into(), t)).collect())
    }

    pub fn tuple<I: IntoIterator<Item = TypeTag>>(items: I) -> Self {
        TypeTag::Tuple(items.into_iter().collect())
    }

    pub fn function(args: TypeTag, result: TypeTag) -> Self {
        TypeTag::Function {
            args: Box::new(args),
            result: Box::new(result),
        }
    }

    pub fn generic(name: impl Into<String>) -> Self {
        TypeTag::Generic(name.into())
    }

    pub fn alias(name: impl Into<String>, target: TypeTag) -> Self {
        TypeTag::Alias {
            name: name.into(),
            target: Box::new(target),
        }
    }

    /// Strip any number of alias layers from the outermost tag.
    pub fn resolve(&self) -> &TypeTag {
        let mut cur = self;
        while let TypeTag::Alias { target, .. } = cur {
            cur = target;
        }
        cur
    }

    /// Return an equivalent tag with every alias replaced by its target.
    pub fn expand(&self) -> TypeTag {
        match self {
            TypeTag::Alias { target, .. } => target.expand(),
            TypeTag::List(inner) => TypeTag::List(Box::new(inner.expand())),
            TypeTag::Dict { key, value } => TypeTag::Dict {
                key: Box::new(key.expand()),
                value: Box::new(value.expand()),
            },
            TypeTag::Record(fields) => {
                TypeTag::Record(fields.iter().map(|(n, t)| (n.clone(), t.expand())).collect())
            }
            TypeTag::Tuple(items) => TypeTag::Tuple(items.iter().map(TypeTag::expand).collect()),
            TypeTag::Function { args, result } => TypeTag::Function {
                args: Box::new(args.expand()),
                result: Box::new(result.expand()),
            },
            TypeTag::Table | TypeTag::Text | TypeTag::Generic(_) => self.clone(),
        }
    }

    /// Whether a value of type `other` may be stored where `self` is expected.
    ///
    /// Aliases compare by target, and a `Generic` on either side matches
    /// anything.
    pub fn accepts(&self, other: &TypeTag) -> bool {
        use TypeTag::*;
        match (self.resolve(), other.resolve()) {
            (Generic(_), _) | (_, Generic(_)) => true,
            (List(a), List(b)) => a.accepts(b),
            (Dict { key: ka, value: va }, Dict { key: kb, value: vb }) => {
                ka.accepts(kb) && va.accepts(vb)
            }
            (Record(a), Record(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|((na, ta), (nb, tb))| na == nb && ta.accepts(tb))
            }
            (Tuple(a), Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(ta, tb)| ta.accepts(tb))
            }
            (Table, Table) | (Text, Text) => true,
            (
                Function { args: aa, result: ra },
                Function { args: ab, result: rb },
            ) => aa.accepts(ab) && ra.accepts(rb),
            _ => false,
        }
    }

    /// Element type for lists, value type for dictionaries.
    pub fn content_type(&self) -> Option<&TypeTag> {
        match self.resolve() {
            TypeTag::List(inner) => Some(inner),
            TypeTag::Dict { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Short lowercase name of the outermost variant, after alias resolution.
    pub fn kind_name(&self) -> &'static str {
        match self.resolve() {
            TypeTag::List(_) => "list",
            TypeTag::Dict { .. } => "dict",
            TypeTag::Record(_) => "record",
            TypeTag::Table => "table",
            TypeTag::Tuple(_) => "tuple",
            TypeTag::Text => "text",
            TypeTag::Function { .. } => "function",
            TypeTag::Generic(_) => "generic",
            TypeTag::Alias { .. } => "alias",
        }
    }

    /// Parse the text form, resolving bare identifiers through `aliases`.
    ///
    /// Alias names keep their identity in the result (`Alias { name, .. }`);
    /// use [`TypeTag::expand`] to drop them.
    pub fn parse_with_aliases(s: &str, aliases: &AliasMap) -> Result<TypeTag> {
        Parser::new(s, Some(aliases)).parse_all()
    }
}

impl FromStr for TypeTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Parser::new(s, None).parse_all()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::List(inner) => write!(f, "[{inner}]"),
            TypeTag::Dict { key, value } => {
                if matches!(key.resolve(), TypeTag::Text) {
                    write!(f, "{{{value}}}")
                } else {
                    write!(f, "{{{key}: {value}}}")
                }
            }
            TypeTag::Record(fields) => {
                f.write_str("(")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                f.write_str(")")
            }
            TypeTag::Tuple(items) => {
                f.write_str("(")?;
                for (i, ty) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{ty}")?;
                }
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            TypeTag::Table => f.write_str("table"),
            TypeTag::Text => f.write_str("text"),
            TypeTag::Function { args, result } => {
                // `->` is right-associative.
                if matches!(**args, TypeTag::Function { .. }) {
                    write!(f, "({args}) -> {result}")
                } else {
                    write!(f, "{args} -> {result}")
                }
            }
            TypeTag::Generic(name) => write!(f, "<{name}>"),
            TypeTag::Alias { name, .. } => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_strips_nested_aliases() {
        let tag = TypeTag::alias("outer", TypeTag::alias("inner", TypeTag::Table));
        assert_eq!(tag.resolve(), &TypeTag::Table);
        assert_eq!(tag.kind_name(), "table");
    }

    #[test]
    fn generic_accepts_anything() {
        let g = TypeTag::generic("a");
        assert!(g.accepts(&TypeTag::Table));
        assert!(TypeTag::list(TypeTag::Text).accepts(&TypeTag::list(g.clone())));
        assert!(!TypeTag::list(TypeTag::Text).accepts(&TypeTag::list(TypeTag::Table)));
    }

    #[test]
    fn record_fields_must_match_by_name() {
        let a = TypeTag::record([("x", TypeTag::Table)]);
        let b = TypeTag::record([("y", TypeTag::Table)]);
        assert!(!a.accepts(&b));
        assert!(a.accepts(&a.clone()));
    }

    #[test]
    fn single_tuple_displays_trailing_comma() {
        assert_eq!(TypeTag::tuple([TypeTag::Text]).to_string(), "(text,)");
    }
}
