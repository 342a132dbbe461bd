use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
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

str_enum!(FoodTiming {
    BeforeMeal => "before_meal",
    DuringMeal => "during_meal",
    AfterMeal => "after_meal",
    Neutral => "neutral",
});

str_enum!(PrescriptionStatus {
    Active => "active",
    Archived => "archived",
});

impl FoodTiming {
    /// Parenthesized suffix for event descriptions ("" for Neutral).
    pub fn description_suffix(&self) -> &'static str {
        match self {
            Self::BeforeMeal => " (before meal)",
            Self::DuringMeal => " (during meal)",
            Self::AfterMeal => " (after meal)",
            Self::Neutral => "",
        }
    }
}
