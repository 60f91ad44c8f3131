//! Number classifier
//!
//! Pure, deterministic predicates over `i64`. Nothing here performs I/O or
//! can fail for a valid integer.
//!
//! **Negative numbers:** primality and perfection are false for every
//! `n < 2`. Armstrong status and digit sum are evaluated on the magnitude,
//! so `-153` is an Armstrong number and `digit_sum(-123) == 6`.

use serde::{Deserialize, Serialize};

/// Placeholder fun fact carried by a freshly classified result
pub const PENDING_FUN_FACT: &str = "pending";

/// Qualitative property tag
///
/// Variant order matches lexicographic order of the serialized names, so
/// sorting the enum sorts the rendered strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Property {
    Armstrong,
    Even,
    Odd,
}

impl Property {
    pub fn as_str(&self) -> &'static str {
        match self {
            Property::Armstrong => "armstrong",
            Property::Even => "even",
            Property::Odd => "odd",
        }
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a single integer
///
/// Serializes to the public response shape. Only `fun_fact` changes after
/// construction, once the enrichment step has resolved it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub number: i64,
    pub is_prime: bool,
    pub is_perfect: bool,
    /// Sorted; always exactly one of `even`/`odd`
    pub properties: Vec<Property>,
    pub digit_sum: u32,
    pub fun_fact: String,
}

impl ClassificationResult {
    /// Replace the fun fact, consuming the result
    pub fn with_fun_fact(mut self, fun_fact: impl Into<String>) -> Self {
        self.fun_fact = fun_fact.into();
        self
    }
}

/// Classify `n`, leaving `fun_fact` set to [`PENDING_FUN_FACT`]
pub fn classify(n: i64) -> ClassificationResult {
    ClassificationResult {
        number: n,
        is_prime: is_prime(n),
        is_perfect: is_perfect(n),
        properties: properties(n),
        digit_sum: digit_sum(n),
        fun_fact: PENDING_FUN_FACT.to_string(),
    }
}

/// Trial division by 2 and odd candidates up to the integer square root
pub fn is_prime(n: i64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    let mut d = 3;
    // `d <= n / d` is `d * d <= n` without overflow
    while d <= n / d {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// True iff the proper divisors of `n` sum to `n`
///
/// Every perfect number in `i64` range has the Euclid-Euler form
/// `2^(p-1) * (2^p - 1)` with `2^p - 1` prime, and no odd perfect number
/// exists at this magnitude, so the check is a lookup. Divisor summation on
/// 19-digit inputs would hold a blocking thread for seconds.
pub fn is_perfect(n: i64) -> bool {
    matches!(
        n,
        6 | 28
            | 496
            | 8128
            | 33_550_336
            | 8_589_869_056
            | 137_438_691_328
            | 2_305_843_008_139_952_128
    )
}

/// Armstrong (narcissistic) check on the magnitude of `n`
///
/// Single-digit magnitudes satisfy the definition trivially and are not
/// tagged.
pub fn is_armstrong(n: i64) -> bool {
    let magnitude = n.unsigned_abs();
    let digits = decimal_digits(magnitude);
    if digits.len() < 2 {
        return false;
    }

    let power = digits.len() as u32;
    // 20 digits of 9^20 still fits comfortably in u128
    let sum: u128 = digits.iter().map(|&d| (d as u128).pow(power)).sum();
    sum == magnitude as u128
}

/// Sum of the decimal digits of `|n|`
pub fn digit_sum(n: i64) -> u32 {
    decimal_digits(n.unsigned_abs()).iter().map(|&d| d as u32).sum()
}

/// Parity is sign-independent
pub fn is_even(n: i64) -> bool {
    n % 2 == 0
}

/// Sorted property tags for `n`
pub fn properties(n: i64) -> Vec<Property> {
    let mut tags = Vec::with_capacity(2);
    if is_armstrong(n) {
        tags.push(Property::Armstrong);
    }
    tags.push(if is_even(n) { Property::Even } else { Property::Odd });
    tags.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    tags
}

/// Decimal digits, most significant first; `0` yields `[0]`
fn decimal_digits(mut value: u64) -> Vec<u8> {
    if value == 0 {
        return vec![0];
    }
    let mut digits = Vec::with_capacity(20);
    while value > 0 {
        digits.push((value % 10) as u8);
        value /= 10;
    }
    digits.reverse();
    digits
}
