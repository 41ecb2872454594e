//! ИНН (Russian tax identification number) checksum validation.

/// Weights for the 10-digit organizational check digit.
const WEIGHTS_N10: [u32; 9] = [2, 4, 10, 3, 5, 9, 4, 6, 8];
/// Weights for the first check digit of a 12-digit personal ИНН.
const WEIGHTS_N11: [u32; 10] = [7, 2, 4, 10, 3, 5, 9, 4, 6, 8];
/// Weights for the second check digit of a 12-digit personal ИНН.
const WEIGHTS_N12: [u32; 11] = [3, 7, 2, 4, 10, 3, 5, 9, 4, 6, 8];

/// Validate an ИНН using the official checksum algorithms.
///
/// 10 digits (organizations): weighted sum of the first nine digits,
/// mod 11 mod 10, must equal the tenth digit. 12 digits (individuals):
/// two weighted sums validated against the eleventh and twelfth digits.
/// Separators and spaces inside the value are ignored; any other length
/// is invalid.
pub fn validate_inn(inn: &str) -> bool {
    let digits: Vec<u32> = inn
        .chars()
        .filter(|c| c.is_ascii_digit())
        .filter_map(|c| c.to_digit(10))
        .collect();

    match digits.len() {
        10 => control_digit(&digits[..9], &WEIGHTS_N10) == digits[9],
        12 => {
            control_digit(&digits[..10], &WEIGHTS_N11) == digits[10]
                && control_digit(&digits[..11], &WEIGHTS_N12) == digits[11]
        }
        _ => false,
    }
}

fn control_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights.iter()).map(|(d, w)| d * w).sum();
    sum % 11 % 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_10_digit_organizational() {
        assert!(validate_inn("7707083893"));
        assert!(validate_inn("7830002293"));
    }

    #[test]
    fn invalid_10_digit_checksum() {
        assert!(!validate_inn("1234567890"));
        assert!(!validate_inn("7712345678"));
    }

    #[test]
    fn valid_12_digit_personal() {
        assert!(validate_inn("500100732259"));
    }

    #[test]
    fn invalid_12_digit_checksum() {
        assert!(!validate_inn("500100732258"));
        assert!(!validate_inn("123456789012"));
    }

    #[test]
    fn wrong_lengths_are_invalid() {
        assert!(!validate_inn("123456789"));
        assert!(!validate_inn("12345678901"));
        assert!(!validate_inn(""));
    }

    #[test]
    fn separators_are_ignored() {
        assert!(validate_inn("7707 083 893"));
    }
}
