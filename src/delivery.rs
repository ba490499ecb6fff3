//! Delivery fee policy and the province table used at checkout.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const CAPITAL_CODE: u32 = 16;
const CAPITAL_NAME: &str = "alger";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPolicy {
    /// Flat fee for the capital province, whatever the subtotal.
    pub capital_fee: i64,
    pub base_fee: i64,
    /// Applies once the subtotal is strictly above `reduced_threshold`.
    pub reduced_fee: i64,
    pub reduced_threshold: i64,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            capital_fee: 500,
            base_fee: 800,
            reduced_fee: 600,
            reduced_threshold: 5000,
        }
    }
}

impl DeliveryPolicy {
    pub fn fee(&self, province: &str, subtotal: i64) -> i64 {
        if is_capital(province) {
            self.capital_fee
        } else if subtotal > self.reduced_threshold {
            self.reduced_fee
        } else {
            self.base_fee
        }
    }
}

/// Fee under the default policy.
pub fn delivery_fee(province: &str, subtotal: i64) -> i64 {
    DeliveryPolicy::default().fee(province, subtotal)
}

/// Matches the capital by name (case-insensitive substring) or by its code.
pub fn is_capital(province: &str) -> bool {
    let trimmed = province.trim();
    if let Ok(code) = trimmed.parse::<u32>() {
        return code == CAPITAL_CODE;
    }
    trimmed.to_lowercase().contains(CAPITAL_NAME)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Province {
    pub code: u32,
    #[schema(value_type = String)]
    pub name: &'static str,
}

pub const PROVINCES: [Province; 58] = [
    Province { code: 1, name: "Adrar" },
    Province { code: 2, name: "Chlef" },
    Province { code: 3, name: "Laghouat" },
    Province { code: 4, name: "Oum El Bouaghi" },
    Province { code: 5, name: "Batna" },
    Province { code: 6, name: "Béjaïa" },
    Province { code: 7, name: "Biskra" },
    Province { code: 8, name: "Béchar" },
    Province { code: 9, name: "Blida" },
    Province { code: 10, name: "Bouira" },
    Province { code: 11, name: "Tamanrasset" },
    Province { code: 12, name: "Tébessa" },
    Province { code: 13, name: "Tlemcen" },
    Province { code: 14, name: "Tiaret" },
    Province { code: 15, name: "Tizi Ouzou" },
    Province { code: 16, name: "Alger" },
    Province { code: 17, name: "Djelfa" },
    Province { code: 18, name: "Jijel" },
    Province { code: 19, name: "Sétif" },
    Province { code: 20, name: "Saïda" },
    Province { code: 21, name: "Skikda" },
    Province { code: 22, name: "Sidi Bel Abbès" },
    Province { code: 23, name: "Annaba" },
    Province { code: 24, name: "Guelma" },
    Province { code: 25, name: "Constantine" },
    Province { code: 26, name: "Médéa" },
    Province { code: 27, name: "Mostaganem" },
    Province { code: 28, name: "M'Sila" },
    Province { code: 29, name: "Mascara" },
    Province { code: 30, name: "Ouargla" },
    Province { code: 31, name: "Oran" },
    Province { code: 32, name: "El Bayadh" },
    Province { code: 33, name: "Illizi" },
    Province { code: 34, name: "Bordj Bou Arréridj" },
    Province { code: 35, name: "Boumerdès" },
    Province { code: 36, name: "El Tarf" },
    Province { code: 37, name: "Tindouf" },
    Province { code: 38, name: "Tissemsilt" },
    Province { code: 39, name: "El Oued" },
    Province { code: 40, name: "Khenchela" },
    Province { code: 41, name: "Souk Ahras" },
    Province { code: 42, name: "Tipaza" },
    Province { code: 43, name: "Mila" },
    Province { code: 44, name: "Aïn Defla" },
    Province { code: 45, name: "Naâma" },
    Province { code: 46, name: "Aïn Témouchent" },
    Province { code: 47, name: "Ghardaïa" },
    Province { code: 48, name: "Relizane" },
    Province { code: 49, name: "Timimoun" },
    Province { code: 50, name: "Bordj Badji Mokhtar" },
    Province { code: 51, name: "Ouled Djellal" },
    Province { code: 52, name: "Béni Abbès" },
    Province { code: 53, name: "In Salah" },
    Province { code: 54, name: "In Guezzam" },
    Province { code: 55, name: "Touggourt" },
    Province { code: 56, name: "Djanet" },
    Province { code: 57, name: "El M'Ghair" },
    Province { code: 58, name: "El Meniaa" },
];

/// Looks a province up by code or by exact (case-insensitive) name.
pub fn find_province(input: &str) -> Option<Province> {
    let trimmed = input.trim();
    if let Ok(code) = trimmed.parse::<u32>() {
        return PROVINCES.iter().copied().find(|p| p.code == code);
    }
    let lowered = trimmed.to_lowercase();
    PROVINCES
        .iter()
        .copied()
        .find(|p| p.name.to_lowercase() == lowered)
}
