use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::{error::ConfigError, parser, Context, Symbol};

/// Where a parameter takes its value from.
///
/// The decision is made once, when the parameter string is first inspected:
/// `${key}` is a reference into the blackboard, anything else is a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlackboardValue {
    Ref(Symbol),
    Literal(String),
}

impl BlackboardValue {
    pub fn parse(raw: &str) -> Self {
        match parser::blackboard_pattern(raw) {
            Some(key) => Self::Ref(key.into()),
            None => Self::Literal(raw.to_owned()),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Ref(_))
    }

    /// Resolves the value against the blackboard in `ctx`.
    pub fn resolve<T: FromParam + Clone + 'static>(&self, ctx: &Context) -> Option<T> {
        match self {
            Self::Ref(key) => ctx.get_parse(*key),
            Self::Literal(literal) => T::from_param(literal),
        }
    }
}

impl From<&str> for BlackboardValue {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// Conversion from the string form of a parameter.
pub trait FromParam: Sized {
    fn from_param(s: &str) -> Option<Self>;
}

impl FromParam for bool {
    fn from_param(s: &str) -> Option<Self> {
        parser::parse_bool(s)
    }
}

impl FromParam for String {
    fn from_param(s: &str) -> Option<Self> {
        Some(s.to_owned())
    }
}

macro_rules! impl_from_param {
    ($($ty:ty),*) => {
        $(impl FromParam for $ty {
            fn from_param(s: &str) -> Option<Self> {
                s.trim().parse().ok()
            }
        })*
    };
}

impl_from_param!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// Named configuration values of a node, kept in their raw string form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeParameters(BTreeMap<String, String>);

impl NodeParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a flat YAML mapping of parameter names to scalars.
    ///
    /// ```yaml
    /// reset_on_failure: ${reset}
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let mapping: BTreeMap<String, Value> = serde_yaml::from_str(yaml)?;
        mapping
            .into_iter()
            .map(|(key, value)| {
                let raw = match value {
                    Value::String(s) => s,
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    _ => return Err(ConfigError::UnsupportedValue { param: key }),
                };
                Ok((key, raw))
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn binding(&self, key: &str) -> Option<BlackboardValue> {
        self.get(key).map(BlackboardValue::parse)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NodeParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A parameter bound at construction time.
///
/// A literal is parsed once and never read again. A blackboard reference is
/// re-read on every [`BoundParam::refresh`]; the last value read is kept so
/// a transiently missing blackboard entry does not lose the setting.
#[derive(Debug, Clone)]
pub(crate) struct BoundParam<T> {
    key: Symbol,
    source: BlackboardValue,
    value: Option<T>,
}

impl<T> BoundParam<T>
where
    T: FromParam + Clone + 'static,
{
    pub fn fixed(key: Symbol, value: T, raw: String) -> Self {
        Self {
            key,
            source: BlackboardValue::Literal(raw),
            value: Some(value),
        }
    }

    /// Looks up `key` in `params`. A missing key or an unparseable literal is
    /// a [`ConfigError`]; a blackboard reference is left unresolved until the
    /// first refresh.
    pub fn from_params(
        node: &str,
        params: &NodeParameters,
        key: Symbol,
    ) -> Result<Self, ConfigError> {
        let source = params
            .binding(&key)
            .ok_or_else(|| ConfigError::MissingParameter {
                node: node.to_owned(),
                param: key.to_string(),
            })?;
        let value = match &source {
            BlackboardValue::Literal(literal) => Some(T::from_param(literal).ok_or_else(|| {
                ConfigError::InvalidParameter {
                    node: node.to_owned(),
                    param: key.to_string(),
                    value: literal.clone(),
                }
            })?),
            BlackboardValue::Ref(_) => None,
        };
        Ok(Self { key, source, value })
    }

    pub fn is_dynamic(&self) -> bool {
        self.source.is_dynamic()
    }

    /// Re-reads a dynamic binding. Returns false if the blackboard did not
    /// yield a usable value this time.
    pub fn refresh(&mut self, ctx: &Context) -> bool {
        if !self.is_dynamic() {
            return true;
        }
        match self.source.resolve(ctx) {
            Some(value) => {
                self.value = Some(value);
                true
            }
            None => false,
        }
    }

    pub fn key(&self) -> Symbol {
        self.key
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }
}
