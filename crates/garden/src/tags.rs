//! Stable string tags for enums that end up in persisted records.

/// A persisted tag did not name any known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} tag '{tag}'")]
pub struct UnknownTag {
    pub kind: &'static str,
    pub tag: String,
}

/// Implements `label()`, `Display` and `FromStr` over a fixed tag table.
///
/// Tags must match the enum's serde representation so records written through
/// either path read back identically.
macro_rules! string_tagged {
    ($ty:ident, $kind:literal, { $($variant:ident => $tag:literal),+ $(,)? }) => {
        impl $ty {
            pub const fn label(self) -> &'static str {
                match self {
                    $($ty::$variant => $tag,)+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::tags::UnknownTag;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim() {
                    $($tag => Ok($ty::$variant),)+
                    other => Err($crate::tags::UnknownTag {
                        kind: $kind,
                        tag: other.to_string(),
                    }),
                }
            }
        }
    };
}

pub(crate) use string_tagged;
