//! Reservation number generation (`RES-YYYYMMDD-XXXXXX`)

use chrono::NaiveDate;
use rand::Rng;

const PREFIX: &str = "RES";
const SUFFIX_LEN: usize = 6;
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Random base-36 number for a reservation created on `date`
///
/// Uniqueness is enforced by the caller against the number index.
pub fn generate(date: NaiveDate, rng: &mut impl Rng) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}-{}-{}", PREFIX, date.format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let number = generate(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), &mut rng);

        assert_eq!(number.len(), "RES-20240601-".len() + SUFFIX_LEN);
        assert!(number.starts_with("RES-20240601-"));
        assert!(
            number[13..]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_seeded_rng_repeats() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let a = generate(date, &mut StdRng::seed_from_u64(42));
        let b = generate(date, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
