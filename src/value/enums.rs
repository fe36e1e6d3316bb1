//! Enumerations stored as short wire values.
//!
//! A database enum is bound and decoded by its wire value (`"op!en"`), which is
//! independent of the Rust variant name (`Status::Open`) used for display.

use super::{Mismatch, Value};

/// A closed set of variants, each mapped to a distinct wire value
pub trait SqlEnum: Copy + 'static {
    /// Enum name used in declared types and error messages
    const NAME: &'static str;

    /// Every variant, in declaration order
    const VARIANTS: &'static [Self];

    /// The value stored in the database for this variant
    fn wire_value(self) -> &'static str;

    /// Find the variant with the given wire value
    fn lookup(value: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|variant| variant.wire_value() == value)
    }
}

#[doc(hidden)]
pub fn decode_enum<E: SqlEnum>(value: &Value) -> Result<E, Mismatch> {
    let code = value.as_str().ok_or(Mismatch::Type {
        expected: E::NAME,
        found: value.type_name(),
    })?;
    E::lookup(code).ok_or_else(|| Mismatch::UnknownVariant {
        enum_name: E::NAME,
        value: code.to_string(),
    })
}

/// Declare an enum whose variants bind and decode by wire value.
///
/// ```rust,ignore
/// sqlrt::sql_enum! {
///     pub enum Status {
///         Open = "op!en",
///         Closed = "clo@sed",
///     }
/// }
/// ```
#[macro_export]
macro_rules! sql_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident = $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::SqlEnum for $name {
            const NAME: &'static str = stringify!($name);
            const VARIANTS: &'static [Self] = &[$(Self::$variant),+];

            fn wire_value(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl $crate::FromValue for $name {
            fn from_value(value: &$crate::Value) -> ::std::result::Result<Self, $crate::Mismatch> {
                $crate::value::decode_enum(value)
            }
        }

        impl ::std::convert::From<$name> for $crate::Value {
            fn from(variant: $name) -> Self {
                $crate::Value::Text($crate::SqlEnum::wire_value(variant).to_string())
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str(stringify!($variant))),+
                }
            }
        }
    };
}
