//! Fixed enumerations: expense categories, payment methods, income sources
//!
//! Stored and displayed by their human label ("Debt Payments"). Parsing is
//! case-insensitive and ignores spaces, hyphens and underscores, so
//! `debt_payments` and `Debt Payments` name the same category.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Error for a label that is not part of an enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownLabel {}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every value, in display order
            pub fn all() -> &'static [$name] {
                &[$($name::$variant),+]
            }

            /// Human-readable label
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize(s);
                $name::all()
                    .iter()
                    .copied()
                    .find(|v| normalize(v.label()) == wanted)
                    .ok_or_else(|| UnknownLabel {
                        kind: $kind,
                        value: s.trim().to_string(),
                    })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

labelled_enum!(
    /// What an expense was spent on
    ExpenseCategory, "expense category" {
        Housing => "Housing",
        Food => "Food",
        Transportation => "Transportation",
        Utilities => "Utilities",
        Healthcare => "Healthcare",
        Entertainment => "Entertainment",
        Education => "Education",
        Personal => "Personal",
        DebtPayments => "Debt Payments",
        Savings => "Savings",
        Investments => "Investments",
        Gifts => "Gifts",
        Other => "Other",
    }
);

labelled_enum!(
    /// How an expense was paid
    PaymentMethod, "payment method" {
        Cash => "Cash",
        CreditCard => "Credit Card",
        DebitCard => "Debit Card",
        BankTransfer => "Bank Transfer",
        DigitalWallet => "Digital Wallet",
        Check => "Check",
        Unknown => "Unknown",
        Extracted => "Extracted",
    }
);

labelled_enum!(
    /// Where income came from
    IncomeSource, "income source" {
        Salary => "Salary",
        Freelance => "Freelance",
        Investments => "Investments",
        Rental => "Rental",
        Business => "Business",
        Gifts => "Gifts",
        Other => "Other",
    }
);

impl Default for ExpenseCategory {
    fn default() -> Self {
        Self::Other
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::Unknown
    }
}

impl Default for IncomeSource {
    fn default() -> Self {
        Self::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_lenient_about_case_and_spacing() {
        assert_eq!("food".parse::<ExpenseCategory>().unwrap(), ExpenseCategory::Food);
        assert_eq!(
            "debt_payments".parse::<ExpenseCategory>().unwrap(),
            ExpenseCategory::DebtPayments
        );
        assert_eq!(
            "CREDIT CARD".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CreditCard
        );
        assert_eq!(" salary ".parse::<IncomeSource>().unwrap(), IncomeSource::Salary);
    }

    #[test]
    fn test_unknown_label() {
        let err = "Yachts".parse::<ExpenseCategory>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown expense category: 'Yachts'");
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&ExpenseCategory::DebtPayments).unwrap();
        assert_eq!(json, "\"Debt Payments\"");
        let back: ExpenseCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ExpenseCategory::DebtPayments);
    }

    #[test]
    fn test_expense_categories_are_complete() {
        assert_eq!(ExpenseCategory::all().len(), 13);
        assert_eq!(IncomeSource::all().len(), 7);
    }
}
