//! Fixed query shapes over `incoming_phone_numbers` and the dispatch from a
//! search filter to the shape that serves it.
//!
//! Every shape has a stable identifier (see [`NumberQuery::name`]) that is
//! attached to log events, so a trace shows which variant answered a call.

use regex::Regex;

use provisioning_domain::filter::{IncomingPhoneNumberFilter, SearchFilterMode};
use provisioning_domain::phone_number::IncomingPhoneNumber;

use crate::row::SqliteQuery;

/// Prefix every read with the number columns and the four joined
/// application names.
macro_rules! select_numbers {
    ($($tail:tt)*) => {
        concat!(
            "SELECT n.*, ",
            "va.friendly_name AS voice_application_name, ",
            "sa.friendly_name AS sms_application_name, ",
            "ua.friendly_name AS ussd_application_name, ",
            "ra.friendly_name AS refer_application_name ",
            "FROM incoming_phone_numbers n ",
            "LEFT JOIN applications va ON va.sid = n.voice_application_sid ",
            "LEFT JOIN applications sa ON sa.sid = n.sms_application_sid ",
            "LEFT JOIN applications ua ON ua.sid = n.ussd_application_sid ",
            "LEFT JOIN applications ra ON ra.sid = n.refer_application_sid ",
            $($tail)*
        )
    };
}

/// Account and organization scope shared by every filtered shape; binds
/// `?1` and `?2`.
macro_rules! scope {
    () => {
        "(?1 IS NULL OR n.account_sid = ?1) AND (?2 IS NULL OR n.organization_sid = ?2) "
    };
}

/// Friendly-name substring and exact phone number; binds `?3` and `?4`.
macro_rules! friendly_name_predicate {
    () => {
        concat!(
            scope!(),
            r"AND (?3 IS NULL OR n.friendly_name LIKE '%' || ?3 || '%' ESCAPE '\') ",
            "AND (?4 IS NULL OR n.phone_number = ?4) ",
        )
    };
}

macro_rules! listing_order {
    () => {
        "ORDER BY n.phone_number, n.sid "
    };
}

macro_rules! page {
    () => {
        "LIMIT ?5 OFFSET ?6"
    };
}

const BY_SID: &str = select_numbers!("WHERE n.sid = ?1");

const BY_ACCOUNT: &str = select_numbers!("WHERE n.account_sid = ?1 ", listing_order!());

const REGEX: &str = select_numbers!("WHERE ", scope!(), listing_order!());

const BY_FRIENDLY_NAME: &str = select_numbers!(
    "WHERE ",
    friendly_name_predicate!(),
    listing_order!(),
    page!(),
);

const WILDCARD: &str = select_numbers!(
    "WHERE ",
    scope!(),
    r"AND (?3 IS NULL OR n.friendly_name LIKE ?3 ESCAPE '\') ",
    r"AND (?4 IS NULL OR n.phone_number LIKE ?4 ESCAPE '\') ",
    listing_order!(),
    page!(),
);

const COUNT_BY_FILTER: &str = concat!(
    "SELECT COUNT(*) FROM incoming_phone_numbers n WHERE ",
    friendly_name_predicate!(),
);

/// The fixed set of stored queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberQuery {
    BySid,
    ByAccount,
    Regex,
    ByFriendlyName,
    Wildcard,
    CountByFilter,
}

impl NumberQuery {
    /// Listing variant for a filter: `Wildcard` mode gets the wildcard shape,
    /// every other mode the friendly-name shape.
    #[must_use]
    pub fn for_filter(filter: &IncomingPhoneNumberFilter) -> Self {
        match filter.mode {
            SearchFilterMode::Wildcard => Self::Wildcard,
            SearchFilterMode::Exact | SearchFilterMode::FriendlyName => Self::ByFriendlyName,
        }
    }

    /// Stable identifier of this query shape.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::BySid => "incoming_phone_numbers.by_sid",
            Self::ByAccount => "incoming_phone_numbers.by_account",
            Self::Regex => "incoming_phone_numbers.regex",
            Self::ByFriendlyName => "incoming_phone_numbers.by_friendly_name",
            Self::Wildcard => "incoming_phone_numbers.wildcard",
            Self::CountByFilter => "incoming_phone_numbers.count_by_filter",
        }
    }

    #[must_use]
    pub fn sql(self) -> &'static str {
        match self {
            Self::BySid => BY_SID,
            Self::ByAccount => BY_ACCOUNT,
            Self::Regex => REGEX,
            Self::ByFriendlyName => BY_FRIENDLY_NAME,
            Self::Wildcard => WILDCARD,
            Self::CountByFilter => COUNT_BY_FILTER,
        }
    }
}

/// Filter fields converted to bind values for a given query shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FilterBindings {
    account_sid: Option<String>,
    organization_sid: Option<String>,
    friendly_name: Option<String>,
    phone_number: Option<String>,
    limit: i64,
    offset: i64,
}

impl FilterBindings {
    pub(crate) fn new(query: NumberQuery, filter: &IncomingPhoneNumberFilter) -> Self {
        let (friendly_name, phone_number) = match query {
            NumberQuery::Wildcard => (
                filter.friendly_name.as_deref().map(wildcard_to_like),
                filter.phone_number.as_deref().map(wildcard_to_like),
            ),
            NumberQuery::ByFriendlyName | NumberQuery::CountByFilter => (
                filter.friendly_name.as_deref().map(escape_like),
                filter.phone_number.clone(),
            ),
            NumberQuery::BySid | NumberQuery::ByAccount | NumberQuery::Regex => (None, None),
        };
        Self {
            account_sid: filter.account_sid.as_ref().map(ToString::to_string),
            organization_sid: filter.organization_sid.as_ref().map(ToString::to_string),
            friendly_name,
            phone_number,
            limit: filter.limit.map_or(-1, i64::from),
            offset: i64::from(filter.offset),
        }
    }

    /// Bind the scope only (`?1`, `?2`).
    pub(crate) fn bind_scope<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.account_sid.as_deref())
            .bind(self.organization_sid.as_deref())
    }

    /// Bind scope and match fields (`?1` to `?4`).
    pub(crate) fn bind_predicate<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        self.bind_scope(query)
            .bind(self.friendly_name.as_deref())
            .bind(self.phone_number.as_deref())
    }

    /// Bind scope, match fields and pagination (`?1` to `?6`).
    pub(crate) fn bind_page<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        self.bind_predicate(query).bind(self.limit).bind(self.offset)
    }
}

/// Escape `LIKE` metacharacters so `input` matches only itself.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Translate a `*`/`?` wildcard pattern into an escaped `LIKE` pattern.
#[must_use]
pub fn wildcard_to_like(pattern: &str) -> String {
    escape_like(pattern)
        .chars()
        .map(|c| match c {
            '*' => '%',
            '?' => '_',
            other => other,
        })
        .collect()
}

/// Characters that make a stored phone number a regular expression rather
/// than a literal number. A leading `+` is the E.164 prefix, not a
/// quantifier.
const PATTERN_CHARS: &[char] = &['*', '^', '$', '[', '|', '.', '\\', '{', '(', '?'];

/// Whether a stored phone number is meant as a regular expression.
#[must_use]
pub fn is_pattern(phone_number: &str) -> bool {
    let body = phone_number.strip_prefix('+').unwrap_or(phone_number);
    body.contains(PATTERN_CHARS) || body.contains('+')
}

/// Compile a stored pattern anchored at both ends. A leading `+` stays a
/// literal E.164 prefix.
fn compile_pattern(stored: &str) -> Result<Regex, regex::Error> {
    match stored.strip_prefix('+') {
        Some(rest) => Regex::new(&format!(r"^(?:\+{rest})$")),
        None => Regex::new(&format!("^(?:{stored})$")),
    }
}

/// Keep the candidates whose stored phone number is a pattern that, read as
/// a regular expression, fully matches `phone_number`.
///
/// Literal numbers are never kept. Without a phone number to test, every
/// pattern is kept.
pub(crate) fn retain_regex_matches(
    candidates: Vec<IncomingPhoneNumber>,
    phone_number: Option<&str>,
) -> Vec<IncomingPhoneNumber> {
    candidates
        .into_iter()
        .filter(|candidate| is_pattern(&candidate.phone_number))
        .filter(|candidate| {
            let Some(phone_number) = phone_number else {
                return true;
            };
            match compile_pattern(&candidate.phone_number) {
                Ok(pattern) => pattern.is_match(phone_number),
                Err(err) => {
                    tracing::warn!(
                        sid = %candidate.sid,
                        pattern = %candidate.phone_number,
                        error = %err,
                        "skipping stored phone number pattern that does not compile"
                    );
                    false
                }
            }
        })
        .collect()
}
