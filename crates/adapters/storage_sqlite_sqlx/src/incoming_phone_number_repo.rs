//! `SQLite` implementation of [`IncomingPhoneNumberRepository`].
//!
//! Writes run as one unit of work each: begin, one statement, commit. A
//! transaction dropped before commit rolls back and returns its connection
//! to the pool, so every exit path releases. Reads acquire a connection,
//! run one query and release it without a commit.

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use provisioning_app::ports::IncomingPhoneNumberRepository;
use provisioning_domain::error::ProvisioningError;
use provisioning_domain::filter::IncomingPhoneNumberFilter;
use provisioning_domain::id::{AccountSid, IncomingPhoneNumberSid};
use provisioning_domain::phone_number::IncomingPhoneNumber;

use crate::error::StorageError;
use crate::query::{FilterBindings, NumberQuery, retain_regex_matches};
use crate::row::{INSERT, IncomingPhoneNumberRow, SqliteQuery, UPDATE, compose, compose_all};

const DELETE_BY_SID: &str = "DELETE FROM incoming_phone_numbers WHERE sid = ?1";
const DELETE_BY_ACCOUNT: &str = "DELETE FROM incoming_phone_numbers WHERE account_sid = ?1";

/// `SQLite`-backed incoming phone number repository.
#[derive(Debug, Clone)]
pub struct SqliteIncomingPhoneNumberRepository {
    pool: SqlitePool,
}

impl SqliteIncomingPhoneNumberRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Run one mutating statement in its own transaction and return the number
/// of affected rows.
async fn execute_in_unit_of_work(
    pool: &SqlitePool,
    statement: SqliteQuery<'_>,
) -> Result<u64, StorageError> {
    let mut tx = pool.begin().await?;
    let done = statement.execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(done.rows_affected())
}

async fn fetch_rows(
    pool: &SqlitePool,
    statement: SqliteQuery<'_>,
) -> Result<Vec<IncomingPhoneNumberRow>, StorageError> {
    let mut conn = pool.acquire().await?;
    let rows = statement
        .try_map(|row: SqliteRow| IncomingPhoneNumberRow::from_row(&row))
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

async fn fetch_optional_row(
    pool: &SqlitePool,
    statement: SqliteQuery<'_>,
) -> Result<Option<IncomingPhoneNumberRow>, StorageError> {
    let mut conn = pool.acquire().await?;
    let row = statement
        .try_map(|row: SqliteRow| IncomingPhoneNumberRow::from_row(&row))
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

impl IncomingPhoneNumberRepository for SqliteIncomingPhoneNumberRepository {
    fn add(
        &self,
        number: IncomingPhoneNumber,
    ) -> impl Future<Output = Result<(), ProvisioningError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row = IncomingPhoneNumberRow::from(&number);
            execute_in_unit_of_work(&pool, row.bind_writable(sqlx::query(INSERT.as_str())))
                .await?;

            tracing::debug!(sid = %number.sid, "incoming phone number inserted");
            Ok(())
        }
    }

    fn get(
        &self,
        sid: IncomingPhoneNumberSid,
    ) -> impl Future<Output = Result<Option<IncomingPhoneNumber>, ProvisioningError>> + Send
    {
        let pool = self.pool.clone();
        async move {
            let query = NumberQuery::BySid;
            let row = fetch_optional_row(&pool, sqlx::query(query.sql()).bind(sid.to_string()))
                .await?;

            tracing::debug!(query = query.name(), %sid, found = row.is_some());
            Ok(compose(row).map_err(StorageError::from)?)
        }
    }

    fn get_by_account(
        &self,
        account_sid: AccountSid,
    ) -> impl Future<Output = Result<Vec<IncomingPhoneNumber>, ProvisioningError>> + Send {
        let pool = self.pool.clone();
        async move {
            let query = NumberQuery::ByAccount;
            let rows = fetch_rows(
                &pool,
                sqlx::query(query.sql()).bind(account_sid.to_string()),
            )
            .await?;

            tracing::debug!(query = query.name(), %account_sid, rows = rows.len());
            Ok(compose_all(rows).map_err(StorageError::from)?)
        }
    }

    fn get_by_regex(
        &self,
        filter: IncomingPhoneNumberFilter,
    ) -> impl Future<Output = Result<Vec<IncomingPhoneNumber>, ProvisioningError>> + Send {
        let pool = self.pool.clone();
        async move {
            filter.validate()?;
            let query = NumberQuery::Regex;
            let bindings = FilterBindings::new(query, &filter);
            let rows = fetch_rows(&pool, bindings.bind_scope(sqlx::query(query.sql()))).await?;
            let candidates = compose_all(rows).map_err(StorageError::from)?;
            let candidate_count = candidates.len();

            let matched = retain_regex_matches(candidates, filter.phone_number.as_deref());

            tracing::debug!(
                query = query.name(),
                candidates = candidate_count,
                matched = matched.len()
            );
            Ok(matched)
        }
    }

    fn get_by_filter(
        &self,
        filter: IncomingPhoneNumberFilter,
    ) -> impl Future<Output = Result<Vec<IncomingPhoneNumber>, ProvisioningError>> + Send {
        let pool = self.pool.clone();
        async move {
            filter.validate()?;
            let query = NumberQuery::for_filter(&filter);
            let bindings = FilterBindings::new(query, &filter);
            let rows = fetch_rows(&pool, bindings.bind_page(sqlx::query(query.sql()))).await?;

            tracing::debug!(query = query.name(), mode = ?filter.mode, rows = rows.len());
            Ok(compose_all(rows).map_err(StorageError::from)?)
        }
    }

    fn count(
        &self,
        filter: IncomingPhoneNumberFilter,
    ) -> impl Future<Output = Result<u64, ProvisioningError>> + Send {
        let pool = self.pool.clone();
        async move {
            filter.validate()?;
            let query = NumberQuery::CountByFilter;
            let bindings = FilterBindings::new(query, &filter);
            let mut conn = pool.acquire().await.map_err(StorageError::from)?;
            let total: i64 = bindings
                .bind_predicate(sqlx::query(query.sql()))
                .try_map(|row: SqliteRow| row.try_get(0))
                .fetch_one(&mut *conn)
                .await
                .map_err(StorageError::from)?;

            tracing::debug!(query = query.name(), total);
            Ok(u64::try_from(total).unwrap_or_default())
        }
    }

    fn update(
        &self,
        number: IncomingPhoneNumber,
    ) -> impl Future<Output = Result<(), ProvisioningError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row = IncomingPhoneNumberRow::from(&number);
            let affected =
                execute_in_unit_of_work(&pool, row.bind_writable(sqlx::query(UPDATE.as_str())))
                    .await?;

            tracing::debug!(sid = %number.sid, affected, "incoming phone number updated");
            Ok(())
        }
    }

    fn remove(
        &self,
        sid: IncomingPhoneNumberSid,
    ) -> impl Future<Output = Result<(), ProvisioningError>> + Send {
        let pool = self.pool.clone();
        async move {
            let affected =
                execute_in_unit_of_work(&pool, sqlx::query(DELETE_BY_SID).bind(sid.to_string()))
                    .await?;

            tracing::debug!(%sid, affected, "incoming phone number removed");
            Ok(())
        }
    }

    fn remove_by_account(
        &self,
        account_sid: AccountSid,
    ) -> impl Future<Output = Result<(), ProvisioningError>> + Send {
        let pool = self.pool.clone();
        async move {
            let affected = execute_in_unit_of_work(
                &pool,
                sqlx::query(DELETE_BY_ACCOUNT).bind(account_sid.to_string()),
            )
            .await?;

            tracing::debug!(%account_sid, affected, "incoming phone numbers removed");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use provisioning_domain::error::ValidationError;
    use provisioning_domain::filter::SearchFilterMode;
    use provisioning_domain::id::{ApplicationSid, OrganizationSid};
    use provisioning_domain::phone_number::{Capabilities, ChannelConfig};

    async fn setup() -> SqliteIncomingPhoneNumberRepository {
        let db = Config::new("sqlite::memory:").build().await.unwrap();
        SqliteIncomingPhoneNumberRepository::new(db.pool().clone())
    }

    fn test_number(account: AccountSid, phone_number: &str) -> IncomingPhoneNumber {
        IncomingPhoneNumber::builder()
            .account_sid(account)
            .phone_number(phone_number)
            .build()
            .unwrap()
    }

    fn named(account: AccountSid, phone_number: &str, friendly_name: &str) -> IncomingPhoneNumber {
        IncomingPhoneNumber::builder()
            .account_sid(account)
            .phone_number(phone_number)
            .friendly_name(friendly_name)
            .build()
            .unwrap()
    }

    fn phone_numbers(numbers: &[IncomingPhoneNumber]) -> Vec<&str> {
        numbers.iter().map(|n| n.phone_number.as_str()).collect()
    }

    #[tokio::test]
    async fn should_add_and_retrieve_number() {
        let repo = setup().await;
        let number = test_number(AccountSid::new(), "+15551234567");
        let sid = number.sid;

        repo.add(number.clone()).await.unwrap();

        let fetched = repo.get(sid).await.unwrap().unwrap();
        assert_eq!(fetched, number);
    }

    #[tokio::test]
    async fn should_return_none_when_number_not_found() {
        let repo = setup().await;
        assert!(repo.get(IncomingPhoneNumberSid::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_fail_with_storage_error_on_duplicate_sid() {
        let repo = setup().await;
        let number = test_number(AccountSid::new(), "+15551234567");
        repo.add(number.clone()).await.unwrap();

        let err = repo.add(number).await.unwrap_err();
        assert!(matches!(err, ProvisioningError::Storage(_)));
    }

    #[tokio::test]
    async fn should_preserve_channels_and_flags_through_storage() {
        let repo = setup().await;
        let number = IncomingPhoneNumber::builder()
            .account_sid(AccountSid::new())
            .organization_sid(OrganizationSid::new())
            .phone_number("+15551234567")
            .voice(
                ChannelConfig::new("http://apps/voice".parse().unwrap(), "POST")
                    .with_fallback("http://backup/voice".parse().unwrap(), "GET"),
            )
            .refer(
                ChannelConfig::default()
                    .with_fallback("http://backup/refer".parse().unwrap(), "POST"),
            )
            .status_callback("http://apps/status".parse().unwrap(), "POST")
            .capabilities(Capabilities {
                voice: true,
                sms: false,
                mms: true,
                fax: false,
            })
            .pure_sip(true)
            .build()
            .unwrap();
        repo.add(number.clone()).await.unwrap();

        let fetched = repo.get(number.sid).await.unwrap().unwrap();
        assert_eq!(fetched, number);
        assert!(fetched.sms.url.is_none());
    }

    #[tokio::test]
    async fn should_fill_application_names_from_join() {
        let repo = setup().await;
        let app = ApplicationSid::new();
        sqlx::query("INSERT INTO applications (sid, friendly_name) VALUES (?1, ?2)")
            .bind(app.to_string())
            .bind("Main IVR")
            .execute(&repo.pool)
            .await
            .unwrap();

        let number = IncomingPhoneNumber::builder()
            .account_sid(AccountSid::new())
            .phone_number("+15551234567")
            .voice(ChannelConfig::default().with_application(app))
            .build()
            .unwrap();
        repo.add(number.clone()).await.unwrap();

        let fetched = repo.get(number.sid).await.unwrap().unwrap();
        assert_eq!(fetched.voice.application_sid, Some(app));
        assert_eq!(fetched.voice.application_name.as_deref(), Some("Main IVR"));
        assert!(fetched.sms.application_name.is_none());
    }

    #[tokio::test]
    async fn should_default_flags_for_rows_written_without_them() {
        let repo = setup().await;
        let sid = IncomingPhoneNumberSid::new();
        sqlx::query(
            "INSERT INTO incoming_phone_numbers (sid, account_sid, phone_number) \
             VALUES (?1, ?2, '+15550001111')",
        )
        .bind(sid.to_string())
        .bind(AccountSid::new().to_string())
        .execute(&repo.pool)
        .await
        .unwrap();

        let fetched = repo.get(sid).await.unwrap().unwrap();
        assert_eq!(fetched.capabilities, Capabilities::default());
        assert!(!fetched.pure_sip);
        assert!(fetched.date_created.is_none());
    }

    #[tokio::test]
    async fn should_update_number_when_exists() {
        let repo = setup().await;
        let mut number = test_number(AccountSid::new(), "+15551234567");
        repo.add(number.clone()).await.unwrap();

        number.friendly_name = Some("Support line".to_string());
        number.capabilities.sms = true;
        repo.update(number.clone()).await.unwrap();

        let fetched = repo.get(number.sid).await.unwrap().unwrap();
        assert_eq!(fetched.friendly_name.as_deref(), Some("Support line"));
        assert!(fetched.capabilities.sms);
    }

    #[tokio::test]
    async fn should_ignore_update_of_unknown_number() {
        let repo = setup().await;
        let number = test_number(AccountSid::new(), "+15551234567");

        repo.update(number.clone()).await.unwrap();

        assert!(repo.get(number.sid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_ignore_remove_of_unknown_number() {
        let repo = setup().await;
        repo.remove(IncomingPhoneNumberSid::new()).await.unwrap();
        repo.remove_by_account(AccountSid::new()).await.unwrap();
    }

    #[tokio::test]
    async fn should_list_numbers_of_account_ordered_by_phone_number() {
        let repo = setup().await;
        let account = AccountSid::new();
        repo.add(test_number(account, "+15552000000")).await.unwrap();
        repo.add(test_number(account, "+15551000000")).await.unwrap();
        repo.add(test_number(AccountSid::new(), "+15550000000"))
            .await
            .unwrap();

        let listed = repo.get_by_account(account).await.unwrap();
        assert_eq!(phone_numbers(&listed), ["+15551000000", "+15552000000"]);
    }

    #[tokio::test]
    async fn should_count_zero_when_nothing_matches() {
        let repo = setup().await;
        let filter = IncomingPhoneNumberFilter::for_account(AccountSid::new());
        assert_eq!(repo.count(filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn should_match_friendly_name_substring_case_insensitively() {
        let repo = setup().await;
        let account = AccountSid::new();
        repo.add(named(account, "+15551000000", "Front Desk")).await.unwrap();
        repo.add(named(account, "+15552000000", "Back office")).await.unwrap();

        let filter = IncomingPhoneNumberFilter::for_account(account)
            .friendly_name("desk")
            .mode(SearchFilterMode::FriendlyName);
        let found = repo.get_by_filter(filter.clone()).await.unwrap();

        assert_eq!(phone_numbers(&found), ["+15551000000"]);
        assert_eq!(repo.count(filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn should_treat_like_metacharacters_in_friendly_name_literally() {
        let repo = setup().await;
        let account = AccountSid::new();
        repo.add(named(account, "+15551000000", "50% off")).await.unwrap();
        repo.add(named(account, "+15552000000", "500 off")).await.unwrap();

        let filter = IncomingPhoneNumberFilter::for_account(account).friendly_name("50%");
        let found = repo.get_by_filter(filter).await.unwrap();

        assert_eq!(phone_numbers(&found), ["+15551000000"]);
    }

    #[tokio::test]
    async fn should_match_phone_number_exactly_in_exact_mode() {
        let repo = setup().await;
        let account = AccountSid::new();
        repo.add(test_number(account, "+15551234567")).await.unwrap();
        repo.add(test_number(account, "+155512345678")).await.unwrap();

        let filter = IncomingPhoneNumberFilter::for_account(account).phone_number("+15551234567");
        let found = repo.get_by_filter(filter).await.unwrap();

        assert_eq!(phone_numbers(&found), ["+15551234567"]);
    }

    #[tokio::test]
    async fn should_match_wildcard_patterns_in_wildcard_mode() {
        let repo = setup().await;
        let account = AccountSid::new();
        repo.add(test_number(account, "+15551234567")).await.unwrap();
        repo.add(test_number(account, "+15559876543")).await.unwrap();
        repo.add(test_number(account, "+442071234567")).await.unwrap();

        let filter = IncomingPhoneNumberFilter::for_account(account)
            .phone_number("+1555*")
            .mode(SearchFilterMode::Wildcard);
        let found = repo.get_by_filter(filter).await.unwrap();
        assert_eq!(phone_numbers(&found), ["+15551234567", "+15559876543"]);

        let single = IncomingPhoneNumberFilter::for_account(account)
            .phone_number("+1555?234567")
            .mode(SearchFilterMode::Wildcard);
        let found = repo.get_by_filter(single).await.unwrap();
        assert_eq!(phone_numbers(&found), ["+15551234567"]);
    }

    #[tokio::test]
    async fn should_count_independently_of_mode() {
        let repo = setup().await;
        let account = AccountSid::new();
        repo.add(test_number(account, "+15551234567")).await.unwrap();

        let filter = IncomingPhoneNumberFilter::for_account(account)
            .phone_number("+1555*")
            .mode(SearchFilterMode::Wildcard);

        assert_eq!(repo.get_by_filter(filter.clone()).await.unwrap().len(), 1);
        assert_eq!(repo.count(filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn should_page_filtered_listing_but_not_count() {
        let repo = setup().await;
        let account = AccountSid::new();
        for phone in ["+15551000001", "+15551000002", "+15551000003"] {
            repo.add(test_number(account, phone)).await.unwrap();
        }

        let filter = IncomingPhoneNumberFilter::for_account(account).page(1, 1);
        let page = repo.get_by_filter(filter.clone()).await.unwrap();

        assert_eq!(phone_numbers(&page), ["+15551000002"]);
        assert_eq!(repo.count(filter).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn should_scope_filter_by_organization() {
        let repo = setup().await;
        let org = OrganizationSid::new();
        let inside = IncomingPhoneNumber::builder()
            .account_sid(AccountSid::new())
            .organization_sid(org)
            .phone_number("+15551000000")
            .build()
            .unwrap();
        repo.add(inside).await.unwrap();
        repo.add(test_number(AccountSid::new(), "+15552000000"))
            .await
            .unwrap();

        let found = repo
            .get_by_filter(IncomingPhoneNumberFilter::for_organization(org))
            .await
            .unwrap();
        assert_eq!(phone_numbers(&found), ["+15551000000"]);
    }

    #[tokio::test]
    async fn should_match_stored_patterns_against_phone_number() {
        let repo = setup().await;
        let account = AccountSid::new();
        repo.add(test_number(account, "\\+1555[0-9]*")).await.unwrap();
        repo.add(test_number(account, "^\\+44.*$")).await.unwrap();
        repo.add(test_number(account, "+15551234567")).await.unwrap();

        let filter = IncomingPhoneNumberFilter::for_account(account).phone_number("+15551234567");
        let found = repo.get_by_regex(filter).await.unwrap();

        assert_eq!(phone_numbers(&found), ["\\+1555[0-9]*"]);
    }

    #[tokio::test]
    async fn should_match_stored_patterns_without_brackets_or_anchors() {
        let repo = setup().await;
        let account = AccountSid::new();
        repo.add(test_number(account, "\\+1555\\d{7}")).await.unwrap();
        repo.add(test_number(account, "+1555.......")).await.unwrap();
        repo.add(test_number(account, "+1444.......")).await.unwrap();

        let filter = IncomingPhoneNumberFilter::for_account(account).phone_number("+15551234567");
        let found = repo.get_by_regex(filter).await.unwrap();

        assert_eq!(phone_numbers(&found), ["+1555.......", "\\+1555\\d{7}"]);
    }

    #[tokio::test]
    async fn should_match_regex_on_phone_number_only() {
        let repo = setup().await;
        let account = AccountSid::new();
        repo.add(named(account, "+1555.......", "Front desk"))
            .await
            .unwrap();

        let filter = IncomingPhoneNumberFilter::for_account(account)
            .phone_number("+15551234567")
            .friendly_name("no such name");
        let found = repo.get_by_regex(filter).await.unwrap();

        assert_eq!(phone_numbers(&found), ["+1555......."]);
    }

    #[tokio::test]
    async fn should_reject_searches_without_scope() {
        let repo = setup().await;
        repo.add(test_number(AccountSid::new(), "+15551000000"))
            .await
            .unwrap();
        repo.add(test_number(AccountSid::new(), "+15552000000"))
            .await
            .unwrap();

        let unscoped = IncomingPhoneNumberFilter::default();
        let listed = repo.get_by_filter(unscoped.clone()).await.unwrap_err();
        let counted = repo.count(unscoped.clone()).await.unwrap_err();
        let matched = repo.get_by_regex(unscoped).await.unwrap_err();

        for err in [listed, counted, matched] {
            assert!(matches!(
                err,
                ProvisioningError::Validation(ValidationError::MissingScope)
            ));
        }
    }

    #[tokio::test]
    async fn should_release_connection_after_failed_write() {
        let db = Config {
            max_connections: 1,
            ..Config::new("sqlite::memory:")
        }
        .build()
        .await
        .unwrap();
        let repo = SqliteIncomingPhoneNumberRepository::new(db.pool().clone());
        let number = test_number(AccountSid::new(), "+15551234567");
        repo.add(number.clone()).await.unwrap();

        for _ in 0..3 {
            let err = repo.add(number.clone()).await.unwrap_err();
            assert!(matches!(err, ProvisioningError::Storage(_)));
        }

        let fetched = repo.get(number.sid).await.unwrap();
        assert_eq!(fetched, Some(number));
    }

    #[tokio::test]
    async fn should_skip_stored_patterns_that_do_not_compile() {
        let repo = setup().await;
        let account = AccountSid::new();
        repo.add(test_number(account, "[0-9")).await.unwrap();
        repo.add(test_number(account, "\\+1.*")).await.unwrap();

        let filter = IncomingPhoneNumberFilter::for_account(account).phone_number("+15551234567");
        let found = repo.get_by_regex(filter).await.unwrap();

        assert_eq!(phone_numbers(&found), ["\\+1.*"]);
    }
}
