use crate::config::Comparator;

/// Per-field similarity in [0, 1]. Inputs are already-normalized values.
///
/// Identifier fields are all-or-nothing; absence on either side is never
/// evidence of similarity. Fuzzy fields use a normalized edit-distance
/// ratio, which is commutative and 1.0 only on identical non-empty input.
pub fn similarity(comparator: Comparator, a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    match comparator {
        Comparator::Identifier => {
            if a == b {
                1.0
            } else {
                0.0
            }
        }
        Comparator::Fuzzy => strsim::normalized_levenshtein(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_nonempty_is_one() {
        assert_eq!(similarity(Comparator::Identifier, "sn123", "sn123"), 1.0);
        assert_eq!(similarity(Comparator::Fuzzy, "acme corp", "acme corp"), 1.0);
    }

    #[test]
    fn empty_side_is_zero() {
        assert_eq!(similarity(Comparator::Identifier, "", "sn123"), 0.0);
        assert_eq!(similarity(Comparator::Identifier, "sn123", ""), 0.0);
        assert_eq!(similarity(Comparator::Fuzzy, "", "anything"), 0.0);
        assert_eq!(similarity(Comparator::Fuzzy, "", ""), 0.0);
    }

    #[test]
    fn identifier_mismatch_is_zero() {
        assert_eq!(similarity(Comparator::Identifier, "sn123", "sn124"), 0.0);
    }

    #[test]
    fn fuzzy_is_commutative() {
        let pairs = [
            ("acme corp", "acme corporation"),
            ("mail-gw-01", "mailgw01"),
            ("alpha", "omega"),
        ];
        for (a, b) in pairs {
            assert_eq!(
                similarity(Comparator::Fuzzy, a, b),
                similarity(Comparator::Fuzzy, b, a),
            );
        }
    }

    #[test]
    fn fuzzy_is_bounded() {
        let score = similarity(Comparator::Fuzzy, "acme corp", "acme co");
        assert!(score > 0.6 && score < 1.0, "got {score}");
    }
}
