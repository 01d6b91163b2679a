use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Rows that live in a single table, addressed by a UUID `id` column.
pub trait Table {
    const TABLE: &'static str;
}

/// Declares a closed set of string values stored in a TEXT column.
///
/// Generates serde names, `as_str`, `FromStr`, `Display` and the sqlx
/// `Type`/`Decode` impls so rows decode straight into the enum.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::database::models::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::database::models::UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <str as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let text = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(text.parse::<$name>()?)
            }
        }
    };
}

pub mod admin;
pub mod building;
pub mod notification;
pub mod path;
pub mod user;

pub use admin::{Admin, AdminDraft, AdminInput, AdminRow, AdminStatus};
pub use building::{Building, BuildingRow, BuildingStatus, BuildingType};
pub use notification::{Announcement, Notification, NotificationType};
pub use path::{Path, PathRow, PathStatus, PathType};
pub use user::{Permission, Permissions, Role, User, UserDraft, UserInput, UserRow, UserStatus};

/// Allowed values of an enum, for error messages.
pub fn allowed_values<T: std::fmt::Display>(values: &[T]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    text_enum! {
        enum Shade {
            Light => "light",
            DarkGrey => "dark grey",
        }
    }

    #[test]
    fn text_enum_round_trips_names() {
        assert_eq!("dark grey".parse::<Shade>(), Ok(Shade::DarkGrey));
        assert_eq!(Shade::Light.as_str(), "light");
        assert_eq!(serde_json::to_value(Shade::DarkGrey).unwrap(), serde_json::json!("dark grey"));
        assert_eq!(allowed_values(Shade::ALL), "light, dark grey");

        let err = "dim".parse::<Shade>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid Shade: 'dim'");
    }
}
