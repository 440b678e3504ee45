//! Record identifiers.

use rand::Rng;
use std::fmt;

/// Number of random hex characters at the end of an id.
pub const RANDOM_HEX_LEN: usize = 12;

/// Unique identifier of a stored record.
///
/// Ids have the form `<seed>-<unixMillis>-<12 lowercase hex chars>`, for
/// example `3-1760606400123-9f2c41d07ab3`. The seed comes from the owning
/// model's counter, the middle part is the wall-clock time at minting and
/// the suffix is random. Any of the three is enough to separate two ids
/// minted by different models or processes.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(String);

impl RecordId {
    /// Mints a fresh id from `seed`, the current time and random bytes.
    #[must_use]
    pub fn mint(seed: u64) -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let bytes: [u8; RANDOM_HEX_LEN / 2] = rand::thread_rng().gen();
        let suffix: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        Self(format!("{seed}-{millis}-{suffix}"))
    }

    /// Parses an id, accepting only the minted form.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.splitn(3, '-');
        let seed = parts.next()?;
        let millis = parts.next()?;
        let suffix = parts.next()?;

        let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        let hex = suffix.len() == RANDOM_HEX_LEN
            && suffix
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));

        (digits(seed) && digits(millis) && hex).then(|| Self(text.to_string()))
    }

    /// Returns the id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the seed part.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.0.split('-').next()?.parse().ok()
    }

    /// Returns the minting time in Unix milliseconds.
    #[must_use]
    pub fn minted_at_millis(&self) -> Option<i64> {
        self.0.split('-').nth(1)?.parse().ok()
    }

    /// Consumes the id, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn minted_ids_have_the_expected_shape() {
        let id = RecordId::mint(42);
        let parts: Vec<&str> = id.as_str().split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "42");
        assert_eq!(parts[2].len(), RANDOM_HEX_LEN);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(id.seed(), Some(42));
        assert!(id.minted_at_millis().unwrap() > 0);
    }

    #[test]
    fn minted_ids_parse() {
        let id = RecordId::mint(0);
        assert_eq!(RecordId::parse(id.as_str()), Some(id));
    }

    #[test]
    fn same_seed_still_unique() {
        let ids: HashSet<RecordId> = (0..1000).map(|_| RecordId::mint(7)).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn parse_rejects_other_forms() {
        assert!(RecordId::parse("").is_none());
        assert!(RecordId::parse("abc").is_none());
        assert!(RecordId::parse("1-2").is_none());
        assert!(RecordId::parse("x-1700000000000-0123456789ab").is_none());
        assert!(RecordId::parse("1-17000x0000000-0123456789ab").is_none());
        assert!(RecordId::parse("1-1700000000000-0123456789AB").is_none());
        assert!(RecordId::parse("1-1700000000000-0123456789a").is_none());
        assert!(RecordId::parse("1-1700000000000-0123456789abc").is_none());
        assert!(RecordId::parse("1-1700000000000-01234567-9ab").is_none());
    }

    #[test]
    fn display_is_the_raw_text() {
        let id = RecordId::parse("5-1700000000000-00aa11bb22cc").unwrap();
        assert_eq!(id.to_string(), "5-1700000000000-00aa11bb22cc");
        assert_eq!(format!("{id:?}"), "RecordId(5-1700000000000-00aa11bb22cc)");
    }
}
