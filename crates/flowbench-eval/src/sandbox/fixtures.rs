//! Helper sources some HumanEval tests assume are already defined
//!
//! `decode_cyclic`, `decode_shift` and `find_zero` are checked against their
//! encoder/evaluator counterparts, which the prompt shows but the generated
//! solution usually omits.

const ENCODE_CYCLIC: &str = r#"
def encode_cyclic(s: str):
    """
    returns encoded string by cycling groups of three characters.
    """
    # split string to groups. Each of length 3.
    groups = [s[(3 * i):min((3 * i + 3), len(s))] for i in range((len(s) + 2) // 3)]
    # cycle elements in each group. Unless group has fewer elements than 3.
    groups = [(group[1:] + group[0]) if len(group) == 3 else group for group in groups]
    return "".join(groups)
"#;

const ENCODE_SHIFT: &str = r#"
def encode_shift(s: str):
    """
    returns encoded string by shifting every character by 5 in the alphabet.
    """
    return "".join([chr(((ord(ch) + 5 - ord("a")) % 26) + ord("a")) for ch in s])
"#;

const POLY: &str = r#"
import math

def poly(xs: list, x: float):
    """
    Evaluates polynomial with coefficients xs at point x.
    return xs[0] + xs[1] * x + xs[1] * x^2 + .... xs[n] * x^n
    """
    return sum([coeff * math.pow(x, i) for i, coeff in enumerate(xs)])
"#;

/// Helper source required by the given entry point, if any
pub fn fixture_for(entry_point: &str) -> Option<&'static str> {
    match entry_point {
        "decode_cyclic" => Some(ENCODE_CYCLIC),
        "decode_shift" => Some(ENCODE_SHIFT),
        "find_zero" => Some(POLY),
        _ => None,
    }
}

/// Prepend the entry point's helper source to a sanitized solution
pub fn with_fixture(solution: &str, entry_point: &str) -> String {
    match fixture_for(entry_point) {
        Some(fixture) => format!("{}\n{}", fixture.trim_start(), solution),
        None => solution.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_fixtures() {
        assert!(fixture_for("decode_cyclic").unwrap().contains("def encode_cyclic"));
        assert!(fixture_for("decode_shift").unwrap().contains("def encode_shift"));
        let poly = fixture_for("find_zero").unwrap();
        assert!(poly.contains("import math"));
        assert!(poly.contains("def poly"));
        assert!(fixture_for("add").is_none());
    }

    #[test]
    fn test_with_fixture_prepends() {
        let solution = "def decode_shift(s):\n    return s";
        let combined = with_fixture(solution, "decode_shift");
        assert!(combined.starts_with("def encode_shift"));
        assert!(combined.ends_with(solution));
        assert_eq!(with_fixture(solution, "other"), solution);
    }
}
