use crate::{
    Result,
    constants::{DEFAULT_COMBINATION, MAX_DIGIT, SELECTOR_COUNT},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// A single selector digit (0-9)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Digit(u8);

impl Digit {
    pub const ZERO: Digit = Digit(0);

    /// Create a new digit with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidDigit` if the value is greater than 9.
    pub fn new(value: u8) -> Result<Self> {
        if value > MAX_DIGIT {
            return Err(Error::InvalidDigit(value));
        }
        Ok(Digit(value))
    }

    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Digit {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Digit::new(value)
    }
}

impl From<Digit> for u8 {
    fn from(digit: Digit) -> Self {
        digit.0
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Digit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("Invalid digit: {s}")))?;
        Digit::new(value)
    }
}

/// Stable position of a digit selector on the lock face (0-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct SelectorIndex(usize);

impl SelectorIndex {
    /// Create a new selector index with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidSelectorIndex` if the index is not below
    /// [`SELECTOR_COUNT`].
    pub fn new(index: usize) -> Result<Self> {
        if index >= SELECTOR_COUNT {
            return Err(Error::InvalidSelectorIndex(index));
        }
        Ok(SelectorIndex(index))
    }

    #[must_use]
    pub fn as_usize(&self) -> usize {
        self.0
    }

    /// All selector indices in order.
    pub fn all() -> impl Iterator<Item = SelectorIndex> {
        (0..SELECTOR_COUNT).map(SelectorIndex)
    }
}

impl TryFrom<usize> for SelectorIndex {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self> {
        SelectorIndex::new(index)
    }
}

impl From<SelectorIndex> for usize {
    fn from(index: SelectorIndex) -> Self {
        index.0
    }
}

impl fmt::Display for SelectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SelectorIndex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let index: usize = s
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("Invalid selector index: {s}")))?;
        SelectorIndex::new(index)
    }
}

/// Current values of all four selectors, in index order.
pub type SelectorValues = [Digit; SELECTOR_COUNT];

/// The secret combination.
///
/// # Security
/// Matching runs in constant time over all digits so the time taken does not
/// reveal how many leading digits were correct.
#[derive(Clone, Copy, Eq, Serialize, Deserialize)]
pub struct Combination([Digit; SELECTOR_COUNT]);

impl Combination {
    pub fn new(digits: [Digit; SELECTOR_COUNT]) -> Self {
        Combination(digits)
    }

    /// Build a combination from raw values.
    ///
    /// # Errors
    /// Returns `Error::InvalidCombinationConfiguration` if the slice length
    /// differs from the selector count, or `Error::InvalidDigit` if any value
    /// is out of range.
    pub fn from_digits(values: &[u8]) -> Result<Self> {
        if values.len() != SELECTOR_COUNT {
            return Err(Error::InvalidCombinationConfiguration {
                expected: SELECTOR_COUNT,
                actual: values.len(),
            });
        }

        let mut digits = [Digit::ZERO; SELECTOR_COUNT];
        for (slot, &value) in digits.iter_mut().zip(values) {
            *slot = Digit::new(value)?;
        }
        Ok(Combination(digits))
    }

    #[must_use]
    pub fn digits(&self) -> &[Digit; SELECTOR_COUNT] {
        &self.0
    }

    /// True when every selector shows the digit at the same index.
    #[must_use]
    pub fn matches(&self, values: &SelectorValues) -> bool {
        let expected = self.0.map(u8::from);
        let actual = values.map(u8::from);
        expected[..].ct_eq(&actual[..]).into()
    }

    /// True if the combination is all zeros, i.e. a reset opens the lock.
    #[must_use]
    pub fn is_all_zero(&self) -> bool {
        self.0.iter().all(|d| *d == Digit::ZERO)
    }
}

impl Default for Combination {
    fn default() -> Self {
        Combination(DEFAULT_COMBINATION.map(Digit))
    }
}

impl PartialEq for Combination {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

// Never print the secret digits in logs.
impl fmt::Debug for Combination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Combination(****)")
    }
}

/// Believed engagement state of the physical lock.
///
/// This is the state of the last command the controller issued, not a
/// measured position. The actuator offers no feedback channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    #[default]
    Locked,
    Unlocked,
}

impl LockState {
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LockState::Locked => write!(f, "Locked"),
            LockState::Unlocked => write!(f, "Unlocked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn values(raw: [u8; SELECTOR_COUNT]) -> SelectorValues {
        raw.map(|v| Digit::new(v).unwrap())
    }

    #[rstest]
    #[case(0)]
    #[case(5)]
    #[case(9)]
    fn test_digit_valid(#[case] value: u8) {
        assert_eq!(Digit::new(value).unwrap().as_u8(), value);
    }

    #[rstest]
    #[case(10)]
    #[case(255)]
    fn test_digit_invalid(#[case] value: u8) {
        assert!(matches!(Digit::new(value), Err(Error::InvalidDigit(v)) if v == value));
    }

    #[test]
    fn test_digit_from_str() {
        assert_eq!(" 7 ".parse::<Digit>().unwrap().as_u8(), 7);
        assert!("x".parse::<Digit>().is_err());
        assert!("12".parse::<Digit>().is_err());
    }

    #[test]
    fn test_selector_index_bounds() {
        assert!(SelectorIndex::new(0).is_ok());
        assert!(SelectorIndex::new(3).is_ok());
        assert!(matches!(
            SelectorIndex::new(4),
            Err(Error::InvalidSelectorIndex(4))
        ));
        assert_eq!(SelectorIndex::all().count(), SELECTOR_COUNT);
    }

    #[test]
    fn test_combination_default_is_1234() {
        let combination = Combination::default();
        assert!(combination.matches(&values([1, 2, 3, 4])));
    }

    #[rstest]
    #[case([0, 2, 3, 4])]
    #[case([1, 0, 3, 4])]
    #[case([1, 2, 0, 4])]
    #[case([1, 2, 3, 0])]
    #[case([4, 3, 2, 1])]
    fn test_combination_requires_every_digit(#[case] raw: [u8; SELECTOR_COUNT]) {
        assert!(!Combination::default().matches(&values(raw)));
    }

    #[rstest]
    #[case(&[1, 2, 3])]
    #[case(&[1, 2, 3, 4, 5])]
    #[case(&[])]
    fn test_combination_wrong_length(#[case] raw: &[u8]) {
        let err = Combination::from_digits(raw).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCombinationConfiguration { expected: 4, actual } if actual == raw.len()
        ));
    }

    #[test]
    fn test_combination_out_of_range_digit() {
        assert!(matches!(
            Combination::from_digits(&[1, 2, 10, 4]),
            Err(Error::InvalidDigit(10))
        ));
    }

    #[test]
    fn test_combination_debug_hides_digits() {
        let debug = format!("{:?}", Combination::default());
        assert!(!debug.contains('1'));
    }

    #[test]
    fn test_combination_all_zero() {
        assert!(Combination::from_digits(&[0, 0, 0, 0]).unwrap().is_all_zero());
        assert!(!Combination::default().is_all_zero());
    }

    #[test]
    fn test_lock_state_default_and_display() {
        assert_eq!(LockState::default(), LockState::Locked);
        assert_eq!(LockState::Unlocked.to_string(), "Unlocked");
        assert!(LockState::Locked.is_locked());
    }

    #[test]
    fn test_lock_state_serialization() {
        let json = serde_json::to_string(&LockState::Unlocked).unwrap();
        assert_eq!(json, "\"unlocked\"");
    }

    #[test]
    fn test_digit_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Digit>("3").is_ok());
        assert!(serde_json::from_str::<Digit>("12").is_err());
    }
}
