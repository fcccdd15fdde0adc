//! Raw input accepted by [`DataNode::replace`](crate::DataNode::replace)

use crate::value::{NdArray, Value};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A value, a mapping from field names, or a sequence of elements
///
/// Mappings address compilation fields by name; sequences rebuild lists.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Value(Value),
    Map(Vec<(String, Input)>),
    Seq(Vec<Input>),
}

impl Input {
    pub fn value(value: impl Into<Value>) -> Self {
        Input::Value(value.into())
    }

    /// Mapping of field names to inputs, in the given order
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Input>,
    {
        Input::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn seq<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Input>,
    {
        Input::Seq(items.into_iter().map(Into::into).collect())
    }

    /// Short description of the input shape, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Input::Value(value) => value.type_name(),
            Input::Map(_) => "mapping",
            Input::Seq(_) => "sequence",
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }

            impl From<$ty> for Input {
                fn from(v: $ty) -> Self {
                    Input::Value(Value::from(v))
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => UInt,
    u64 => UInt,
    f32 => Float,
    f64 => Float,
    &str => String,
    String => String,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
    NdArray => Array,
    Vec<u8> => Bytes,
    Vec<f64> => Array,
    Vec<i64> => Array,
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Value(value)
    }
}

impl From<Vec<Input>> for Input {
    fn from(items: Vec<Input>) -> Self {
        Input::Seq(items)
    }
}
