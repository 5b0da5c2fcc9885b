//! Ticket code generation.
//!
//! Codes are fixed-width decimal strings drawn without replacement from a
//! [`CodeUniverse`].

use std::collections::HashSet;

use compact_str::{CompactString, format_compact};

use crate::error::RaffleError;
use crate::random::{RandomSource, shuffle};

/// Largest universe a raffle may draw codes from.
pub const MAX_UNIVERSE_SIZE: usize = 100_000;

/// Contiguous range of numeric codes rendered with a fixed width.
///
/// The width is the number of digits of `last`, so `0..=999` yields
/// `"000"` to `"999"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeUniverse {
    first: u32,
    last: u32,
    width: usize,
}

impl Default for CodeUniverse {
    fn default() -> Self {
        Self {
            first: 0,
            last: 999,
            width: 3,
        }
    }
}

fn digits(mut n: u32) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

impl CodeUniverse {
    pub fn new(first: u32, last: u32) -> Result<Self, RaffleError> {
        if first > last {
            return Err(RaffleError::invalid(format!(
                "code range {first}..={last} is empty"
            )));
        }
        let size = u64::from(last - first) + 1;
        if size > MAX_UNIVERSE_SIZE as u64 {
            return Err(RaffleError::invalid(format!(
                "code range {first}..={last} holds {size} codes, above {MAX_UNIVERSE_SIZE}"
            )));
        }
        Ok(Self {
            first,
            last,
            width: digits(last),
        })
    }

    pub fn first(&self) -> u32 {
        self.first
    }

    pub fn last(&self) -> u32 {
        self.last
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of distinct codes.
    pub fn size(&self) -> usize {
        (self.last - self.first) as usize + 1
    }

    pub fn format(&self, n: u32) -> CompactString {
        format_compact!("{n:0width$}", width = self.width)
    }

    pub fn contains(&self, code: &str) -> bool {
        code.len() == self.width
            && code.bytes().all(|b| b.is_ascii_digit())
            && code
                .parse::<u32>()
                .is_ok_and(|n| (self.first..=self.last).contains(&n))
    }

    /// Every code in ascending order.
    pub fn codes(&self) -> impl Iterator<Item = CompactString> + '_ {
        (self.first..=self.last).map(|n| self.format(n))
    }
}

/// Draw `count` distinct codes from `universe`.
///
/// Fails with [`RaffleError::InvalidArgument`] when `count` is zero or larger
/// than the universe.
pub fn generate_codes(
    universe: &CodeUniverse,
    count: u32,
    source: &mut impl RandomSource,
) -> Result<Vec<CompactString>, RaffleError> {
    generate_unused_codes(universe, count, std::iter::empty::<&str>(), source)
}

/// Draw `count` distinct codes from the part of `universe` not in `in_use`.
pub fn generate_unused_codes<'a>(
    universe: &CodeUniverse,
    count: u32,
    in_use: impl IntoIterator<Item = &'a str>,
    source: &mut impl RandomSource,
) -> Result<Vec<CompactString>, RaffleError> {
    if count == 0 {
        return Err(RaffleError::invalid("ticket count must be at least 1"));
    }
    let in_use: HashSet<&str> = in_use.into_iter().collect();
    let mut pool: Vec<CompactString> = universe
        .codes()
        .filter(|code| !in_use.contains(code.as_str()))
        .collect();
    if count as usize > pool.len() {
        return Err(RaffleError::invalid(format!(
            "{count} tickets requested but only {} codes are available",
            pool.len()
        )));
    }
    shuffle(&mut pool, source);
    pool.truncate(count as usize);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{RngSource, ScriptedSource};
    use proptest::prelude::*;

    #[test]
    fn test_default_universe() {
        let universe = CodeUniverse::default();
        assert_eq!(universe.size(), 1000);
        assert_eq!(universe.format(7), "007");
        assert!(universe.contains("999"));
        assert!(!universe.contains("1000"));
        assert!(!universe.contains("7"));
        assert!(!universe.contains("0a1"));
    }

    #[test]
    fn test_width_follows_last_code() {
        let universe = CodeUniverse::new(100, 104).unwrap();
        assert_eq!(universe.width(), 3);
        assert_eq!(universe.size(), 5);
        assert!(!universe.contains("099"));
        let universe = CodeUniverse::new(0, 9_999).unwrap();
        assert_eq!(universe.format(42), "0042");
        assert!(CodeUniverse::new(5, 4).is_err());
    }

    #[test]
    fn test_universe_size_is_capped() {
        assert_eq!(CodeUniverse::new(0, 99_999).unwrap().size(), MAX_UNIVERSE_SIZE);
        assert!(matches!(
            CodeUniverse::new(0, 100_000),
            Err(RaffleError::InvalidArgument(_))
        ));
        assert!(CodeUniverse::new(0, u32::MAX).is_err());
    }

    #[test]
    fn test_generate_identity_takes_prefix() {
        let universe = CodeUniverse::new(100, 104).unwrap();
        let codes = generate_codes(&universe, 3, &mut ScriptedSource::identity()).unwrap();
        assert_eq!(codes, vec!["100", "101", "102"]);
    }

    #[test]
    fn test_generate_rejects_out_of_range_counts() {
        let universe = CodeUniverse::new(100, 104).unwrap();
        let mut source = ScriptedSource::identity();
        assert!(matches!(
            generate_codes(&universe, 6, &mut source),
            Err(RaffleError::InvalidArgument(_))
        ));
        assert!(matches!(
            generate_codes(&universe, 0, &mut source),
            Err(RaffleError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unused_codes_skip_taken_ones() {
        let universe = CodeUniverse::new(100, 104).unwrap();
        let mut source = ScriptedSource::identity();
        let codes =
            generate_unused_codes(&universe, 2, ["100", "102", "103"], &mut source).unwrap();
        assert_eq!(codes, vec!["101", "104"]);
        assert!(generate_unused_codes(&universe, 3, ["100", "102", "103"], &mut source).is_err());
    }

    proptest! {
        #[test]
        fn prop_generated_codes_are_distinct_and_in_universe(
            count in 1u32..=1000,
            seed in any::<u64>(),
        ) {
            let universe = CodeUniverse::default();
            let codes = generate_codes(&universe, count, &mut RngSource::seeded(seed)).unwrap();
            prop_assert_eq!(codes.len(), count as usize);
            let distinct: HashSet<&str> = codes.iter().map(CompactString::as_str).collect();
            prop_assert_eq!(distinct.len(), codes.len());
            prop_assert!(codes.iter().all(|code| universe.contains(code)));
        }

        #[test]
        fn prop_oversized_requests_fail(extra in 1u32..5000) {
            let universe = CodeUniverse::default();
            let result = generate_codes(&universe, 1000 + extra, &mut RngSource::seeded(0));
            prop_assert!(matches!(result, Err(RaffleError::InvalidArgument(_))));
        }
    }
}
