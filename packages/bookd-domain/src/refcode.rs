use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random "AP-XXXXXX" reference code. Tenant-level uniqueness is enforced by
/// the database; callers retry on collision.
pub fn generate_ref_code() -> String {
	let mut rng = rand::thread_rng();
	let suffix: String =
		(0..6).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char).collect();

	format!("AP-{suffix}")
}
