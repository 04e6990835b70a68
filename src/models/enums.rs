use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(PatientStatus {
    Active => "active",
    Inactive => "inactive",
});

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
});

// `Reviewed` is reserved for the doctor sign-off action; no write endpoint
// sets it yet but dashboards already filter on it.
str_enum!(ImageStatus {
    Uploaded => "uploaded",
    Processing => "processing",
    Processed => "processed",
    Failed => "failed",
    Reviewed => "reviewed",
});

str_enum!(ReviewStatus {
    Processing => "processing",
    PendingReview => "pending_review",
    NotRequired => "not_required",
    Reviewed => "reviewed",
    Failed => "failed",
});
