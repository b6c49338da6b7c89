use vouchers_api::codes::{
    generate_login_id, generate_voucher_code, normalize_code, LOGIN_ID_LEN, VOUCHER_CODE_LEN,
};

#[test]
fn voucher_codes_are_fixed_length_uppercase_alphanumeric() {
    for _ in 0..200 {
        let code = generate_voucher_code();
        assert_eq!(code.len(), VOUCHER_CODE_LEN);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}

#[test]
fn login_ids_avoid_confusable_characters() {
    for _ in 0..200 {
        let id = generate_login_id();
        assert_eq!(id.len(), LOGIN_ID_LEN);
        for banned in ['0', 'O', '1', 'I', 'L'] {
            assert!(!id.contains(banned), "{id} contains {banned}");
        }
    }
}

#[test]
fn normalization_uppercases_and_trims() {
    assert_eq!(normalize_code("  ab3xk9qwz1 "), "AB3XK9QWZ1");
    assert_eq!(normalize_code("ALREADY"), "ALREADY");
    assert_eq!(normalize_code(""), "");
}
