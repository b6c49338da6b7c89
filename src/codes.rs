use rand::Rng;

/// Voucher codes: 10 chars, uppercase alphanumeric, human-copyable.
const VOUCHER_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const VOUCHER_CODE_LEN: usize = 10;

/// Login ids: 6 chars, excludes confusing characters (0/O, 1/I/L).
const LOGIN_ID_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
pub const LOGIN_ID_LEN: usize = 6;

/// Collisions are rare at expected volume but not impossible; callers retry
/// up to this many times against the unique constraint before giving up.
pub const MAX_CODE_ATTEMPTS: u32 = 4;

fn random_from(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

pub fn generate_voucher_code() -> String {
    random_from(VOUCHER_ALPHABET, VOUCHER_CODE_LEN)
}

pub fn generate_login_id() -> String {
    random_from(LOGIN_ID_ALPHABET, LOGIN_ID_LEN)
}

/// Codes are stored and compared uppercase; lookups normalize first.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
