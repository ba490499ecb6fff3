use storefront_api::{
    delivery::{DeliveryPolicy, PROVINCES, delivery_fee, find_province, is_capital},
    phone::{format_phone, is_valid_phone, normalize_phone},
};

#[test]
fn capital_pays_flat_fee() {
    assert_eq!(delivery_fee("Alger", 100), 500);
    assert_eq!(delivery_fee("Alger", 999_999), 500);
    assert_eq!(delivery_fee("ALGER centre", 100), 500);
    assert_eq!(delivery_fee("16", 10), 500);
    assert_eq!(delivery_fee(" 016 ", 10), 500);
}

#[test]
fn other_provinces_pay_base_then_reduced_fee() {
    assert_eq!(delivery_fee("Oran", 4000), 800);
    assert_eq!(delivery_fee("Oran", 5000), 800);
    assert_eq!(delivery_fee("Oran", 5001), 600);
    assert_eq!(delivery_fee("31", 0), 800);
    assert!(!is_capital("160"));
}

#[test]
fn policy_constants_can_be_overridden() {
    let policy = DeliveryPolicy {
        capital_fee: 300,
        base_fee: 1000,
        reduced_fee: 0,
        reduced_threshold: 10_000,
    };
    assert_eq!(policy.fee("Alger", 50_000), 300);
    assert_eq!(policy.fee("Blida", 10_000), 1000);
    assert_eq!(policy.fee("Blida", 10_001), 0);
}

#[test]
fn province_table_is_complete_and_searchable() {
    assert_eq!(PROVINCES.len(), 58);
    assert!(PROVINCES.iter().enumerate().all(|(i, p)| p.code as usize == i + 1));

    assert_eq!(find_province("16").map(|p| p.name), Some("Alger"));
    assert_eq!(find_province("  oran ").map(|p| p.code), Some(31));
    assert_eq!(find_province("59"), None);
    assert_eq!(find_province("Atlantis"), None);
}

#[test]
fn phone_shapes() {
    assert!(is_valid_phone("0661234567"));
    assert!(is_valid_phone("0551 23 45 67"));
    assert!(is_valid_phone("(07) 71-23-45-67"));
    assert!(is_valid_phone("+213661234567"));
    assert!(is_valid_phone("00213 5 51 23 45 67"));

    assert!(!is_valid_phone("123"));
    assert!(!is_valid_phone("0461234567"));
    assert!(!is_valid_phone("066123456"));
    assert!(!is_valid_phone("+33661234567"));
}

#[test]
fn phone_formatting() {
    assert_eq!(format_phone("0661234567"), "06 61 23 45 67");
    assert_eq!(format_phone("0661-23-45-67"), "06 61 23 45 67");
    assert_eq!(format_phone("+213 661 23 45 67"), "+213661234567");
    assert_eq!(format_phone("not a number"), "not a number");
    assert_eq!(normalize_phone(" (0661) 23-45 67 "), "0661234567");
}

#[test]
fn non_ascii_digits_are_not_phone_numbers() {
    assert!(!is_valid_phone("06١٢٣٤٥٦٧٨"));
    assert!(!is_valid_phone("+213٦٦١٢٣٤٥٦٧"));
    assert!(!is_valid_phone("０６６１２３４５６７"));

    assert_eq!(format_phone("066١٢٣٤٥٦٧"), "066١٢٣٤٥٦٧");
    assert_eq!(format_phone("06١٢٣٤٥٦٧٨"), "06١٢٣٤٥٦٧٨");
}
