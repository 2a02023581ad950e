//! Flat shipping rates per Tunisian governorate, in dinars.

use rust_decimal::Decimal;
use serde::Serialize;

/// Charged when the governorate is not in the table.
pub const DEFAULT_SHIPPING_COST: i64 = 10;

const GOVERNORATES: [(&str, i64); 24] = [
    ("Tunis", 7),
    ("Ariana", 7),
    ("Ben Arous", 7),
    ("Manouba", 7),
    ("Nabeul", 8),
    ("Zaghouan", 8),
    ("Bizerte", 8),
    ("Béja", 9),
    ("Jendouba", 10),
    ("Kef", 10),
    ("Siliana", 9),
    ("Sousse", 8),
    ("Monastir", 8),
    ("Mahdia", 9),
    ("Sfax", 9),
    ("Kairouan", 9),
    ("Kasserine", 10),
    ("Sidi Bouzid", 10),
    ("Gabès", 11),
    ("Medenine", 12),
    ("Tataouine", 13),
    ("Gafsa", 11),
    ("Tozeur", 12),
    ("Kebili", 12),
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GovernorateRate {
    pub name: &'static str,
    pub shipping_cost: Decimal,
}

pub fn governorates() -> Vec<GovernorateRate> {
    GOVERNORATES
        .iter()
        .map(|(name, cost)| GovernorateRate {
            name: *name,
            shipping_cost: Decimal::from(*cost),
        })
        .collect()
}

/// Case-insensitive, whitespace-trimmed lookup with the default for unknown names.
pub fn shipping_cost_for(governorate: &str) -> Decimal {
    let wanted = governorate.trim().to_lowercase();
    GOVERNORATES
        .iter()
        .find(|(name, _)| name.to_lowercase() == wanted)
        .map(|(_, cost)| Decimal::from(*cost))
        .unwrap_or_else(|| Decimal::from(DEFAULT_SHIPPING_COST))
}

/// Orders without a governorate ship for free.
pub fn shipping_cost_for_order(governorate: Option<&str>) -> Decimal {
    match governorate {
        Some(name) if !name.trim().is_empty() => shipping_cost_for(name),
        _ => Decimal::ZERO,
    }
}
