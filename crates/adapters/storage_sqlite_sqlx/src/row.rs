//! Row snapshot of the `incoming_phone_numbers` table and its mapping to the
//! domain [`IncomingPhoneNumber`].
//!
//! The column list is declared once in [`incoming_phone_number_row!`]; the
//! struct fields, the `FromRow` decoding, the INSERT/UPDATE statements and
//! the bind order are all derived from it.

use std::sync::LazyLock;

use sqlx::FromRow;
use sqlx::Sqlite;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;

use provisioning_domain::phone_number::{Capabilities, ChannelConfig, IncomingPhoneNumber};

use crate::codec::{
    read_flag, read_sid, read_timestamp, read_uri, require, write_flag, write_sid,
    write_timestamp, write_uri,
};
use crate::error::MappingError;

pub(crate) type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

macro_rules! incoming_phone_number_row {
    (
        writable { $($column:ident: $raw:ty),* $(,)? }
        joined { $($joined:ident),* $(,)? }
    ) => {
        /// Flat column-to-value snapshot of one incoming phone number.
        ///
        /// Columns missing from a result set decode as `None`.
        #[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
        #[sqlx(default)]
        pub struct IncomingPhoneNumberRow {
            $(pub $column: $raw,)*
            $(pub $joined: Option<String>,)*
        }

        impl IncomingPhoneNumberRow {
            /// Columns persisted by INSERT and UPDATE, in bind order.
            pub const WRITABLE_COLUMNS: &'static [&'static str] = &[$(stringify!($column)),*];

            /// Read-only columns filled by joins with `applications`.
            pub const JOINED_COLUMNS: &'static [&'static str] = &[$(stringify!($joined)),*];

            /// Bind every writable column onto `query`, in
            /// [`Self::WRITABLE_COLUMNS`] order.
            pub(crate) fn bind_writable<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
                query$(.bind(&self.$column))*
            }
        }
    };
}

incoming_phone_number_row! {
    writable {
        sid: Option<String>,
        date_created: Option<String>,
        date_updated: Option<String>,
        friendly_name: Option<String>,
        account_sid: Option<String>,
        organization_sid: Option<String>,
        phone_number: Option<String>,
        cost: Option<String>,
        api_version: Option<String>,
        uri: Option<String>,
        voice_caller_id_lookup: Option<bool>,
        voice_url: Option<String>,
        voice_method: Option<String>,
        voice_fallback_url: Option<String>,
        voice_fallback_method: Option<String>,
        voice_application_sid: Option<String>,
        sms_url: Option<String>,
        sms_method: Option<String>,
        sms_fallback_url: Option<String>,
        sms_fallback_method: Option<String>,
        sms_application_sid: Option<String>,
        ussd_url: Option<String>,
        ussd_method: Option<String>,
        ussd_fallback_url: Option<String>,
        ussd_fallback_method: Option<String>,
        ussd_application_sid: Option<String>,
        refer_url: Option<String>,
        refer_method: Option<String>,
        refer_fallback_url: Option<String>,
        refer_fallback_method: Option<String>,
        refer_application_sid: Option<String>,
        status_callback: Option<String>,
        status_callback_method: Option<String>,
        voice_capable: Option<bool>,
        sms_capable: Option<bool>,
        mms_capable: Option<bool>,
        fax_capable: Option<bool>,
        pure_sip: Option<bool>,
    }
    joined {
        voice_application_name,
        sms_application_name,
        ussd_application_name,
        refer_application_name,
    }
}

/// `INSERT` of every writable column.
pub(crate) static INSERT: LazyLock<String> = LazyLock::new(|| {
    let columns = IncomingPhoneNumberRow::WRITABLE_COLUMNS;
    format!(
        "INSERT INTO incoming_phone_numbers ({}) VALUES ({})",
        columns.join(", "),
        vec!["?"; columns.len()].join(", ")
    )
});

/// `UPDATE` of every writable column except `sid`, keyed by `sid`.
///
/// Placeholders are numbered by position in
/// [`IncomingPhoneNumberRow::WRITABLE_COLUMNS`], so the statement shares the
/// INSERT bind order.
pub(crate) static UPDATE: LazyLock<String> = LazyLock::new(|| {
    let mut key = 0;
    let mut assignments = Vec::new();
    for (index, column) in IncomingPhoneNumberRow::WRITABLE_COLUMNS.iter().enumerate() {
        if *column == "sid" {
            key = index + 1;
        } else {
            assignments.push(format!("{column} = ?{}", index + 1));
        }
    }
    format!(
        "UPDATE incoming_phone_numbers SET {} WHERE sid = ?{key}",
        assignments.join(", ")
    )
});

struct ChannelColumns<'a> {
    url: (&'static str, Option<&'a str>),
    method: Option<String>,
    fallback_url: (&'static str, Option<&'a str>),
    fallback_method: Option<String>,
    application_sid: (&'static str, Option<&'a str>),
    application_name: Option<String>,
}

fn read_channel(columns: ChannelColumns<'_>) -> Result<ChannelConfig, MappingError> {
    Ok(ChannelConfig {
        url: read_uri(columns.url.0, columns.url.1)?,
        method: columns.method,
        fallback_url: read_uri(columns.fallback_url.0, columns.fallback_url.1)?,
        fallback_method: columns.fallback_method,
        application_sid: read_sid(columns.application_sid.0, columns.application_sid.1)?,
        application_name: columns.application_name,
    })
}

impl TryFrom<IncomingPhoneNumberRow> for IncomingPhoneNumber {
    type Error = MappingError;

    fn try_from(row: IncomingPhoneNumberRow) -> Result<Self, Self::Error> {
        let sid = require("sid", read_sid("sid", row.sid.as_deref())?)?;
        let account_sid = require(
            "account_sid",
            read_sid("account_sid", row.account_sid.as_deref())?,
        )?;
        let phone_number = require("phone_number", row.phone_number)?;

        let voice = read_channel(ChannelColumns {
            url: ("voice_url", row.voice_url.as_deref()),
            method: row.voice_method,
            fallback_url: ("voice_fallback_url", row.voice_fallback_url.as_deref()),
            fallback_method: row.voice_fallback_method,
            application_sid: (
                "voice_application_sid",
                row.voice_application_sid.as_deref(),
            ),
            application_name: row.voice_application_name,
        })?;
        let sms = read_channel(ChannelColumns {
            url: ("sms_url", row.sms_url.as_deref()),
            method: row.sms_method,
            fallback_url: ("sms_fallback_url", row.sms_fallback_url.as_deref()),
            fallback_method: row.sms_fallback_method,
            application_sid: ("sms_application_sid", row.sms_application_sid.as_deref()),
            application_name: row.sms_application_name,
        })?;
        let ussd = read_channel(ChannelColumns {
            url: ("ussd_url", row.ussd_url.as_deref()),
            method: row.ussd_method,
            fallback_url: ("ussd_fallback_url", row.ussd_fallback_url.as_deref()),
            fallback_method: row.ussd_fallback_method,
            application_sid: ("ussd_application_sid", row.ussd_application_sid.as_deref()),
            application_name: row.ussd_application_name,
        })?;
        let refer = read_channel(ChannelColumns {
            url: ("refer_url", row.refer_url.as_deref()),
            method: row.refer_method,
            fallback_url: ("refer_fallback_url", row.refer_fallback_url.as_deref()),
            fallback_method: row.refer_fallback_method,
            application_sid: (
                "refer_application_sid",
                row.refer_application_sid.as_deref(),
            ),
            application_name: row.refer_application_name,
        })?;

        Ok(Self {
            sid,
            account_sid,
            organization_sid: read_sid("organization_sid", row.organization_sid.as_deref())?,
            date_created: read_timestamp("date_created", row.date_created.as_deref())?,
            date_updated: read_timestamp("date_updated", row.date_updated.as_deref())?,
            friendly_name: row.friendly_name,
            phone_number,
            cost: row.cost,
            api_version: row.api_version,
            uri: read_uri("uri", row.uri.as_deref())?,
            voice_caller_id_lookup: read_flag(row.voice_caller_id_lookup),
            voice,
            sms,
            ussd,
            refer,
            status_callback: read_uri("status_callback", row.status_callback.as_deref())?,
            status_callback_method: row.status_callback_method,
            capabilities: Capabilities {
                voice: read_flag(row.voice_capable),
                sms: read_flag(row.sms_capable),
                mms: read_flag(row.mms_capable),
                fax: read_flag(row.fax_capable),
            },
            pure_sip: read_flag(row.pure_sip),
        })
    }
}

/// Decompose a record into its writable columns. Joined application names
/// are left out; they belong to the `applications` table.
impl From<&IncomingPhoneNumber> for IncomingPhoneNumberRow {
    fn from(number: &IncomingPhoneNumber) -> Self {
        Self {
            sid: write_sid(Some(&number.sid)),
            date_created: write_timestamp(number.date_created.as_ref()),
            date_updated: write_timestamp(number.date_updated.as_ref()),
            friendly_name: number.friendly_name.clone(),
            account_sid: write_sid(Some(&number.account_sid)),
            organization_sid: write_sid(number.organization_sid.as_ref()),
            phone_number: Some(number.phone_number.clone()),
            cost: number.cost.clone(),
            api_version: number.api_version.clone(),
            uri: write_uri(number.uri.as_ref()),
            voice_caller_id_lookup: write_flag(number.voice_caller_id_lookup),
            voice_url: write_uri(number.voice.url.as_ref()),
            voice_method: number.voice.method.clone(),
            voice_fallback_url: write_uri(number.voice.fallback_url.as_ref()),
            voice_fallback_method: number.voice.fallback_method.clone(),
            voice_application_sid: write_sid(number.voice.application_sid.as_ref()),
            sms_url: write_uri(number.sms.url.as_ref()),
            sms_method: number.sms.method.clone(),
            sms_fallback_url: write_uri(number.sms.fallback_url.as_ref()),
            sms_fallback_method: number.sms.fallback_method.clone(),
            sms_application_sid: write_sid(number.sms.application_sid.as_ref()),
            ussd_url: write_uri(number.ussd.url.as_ref()),
            ussd_method: number.ussd.method.clone(),
            ussd_fallback_url: write_uri(number.ussd.fallback_url.as_ref()),
            ussd_fallback_method: number.ussd.fallback_method.clone(),
            ussd_application_sid: write_sid(number.ussd.application_sid.as_ref()),
            refer_url: write_uri(number.refer.url.as_ref()),
            refer_method: number.refer.method.clone(),
            refer_fallback_url: write_uri(number.refer.fallback_url.as_ref()),
            refer_fallback_method: number.refer.fallback_method.clone(),
            refer_application_sid: write_sid(number.refer.application_sid.as_ref()),
            status_callback: write_uri(number.status_callback.as_ref()),
            status_callback_method: number.status_callback_method.clone(),
            voice_capable: write_flag(number.capabilities.voice),
            sms_capable: write_flag(number.capabilities.sms),
            mms_capable: write_flag(number.capabilities.mms),
            fax_capable: write_flag(number.capabilities.fax),
            pure_sip: write_flag(number.pure_sip),
            voice_application_name: None,
            sms_application_name: None,
            ussd_application_name: None,
            refer_application_name: None,
        }
    }
}

/// Compose an optional row; no row means no record.
pub(crate) fn compose(
    row: Option<IncomingPhoneNumberRow>,
) -> Result<Option<IncomingPhoneNumber>, MappingError> {
    row.map(IncomingPhoneNumber::try_from).transpose()
}

/// Compose every row, preserving order.
pub(crate) fn compose_all(
    rows: Vec<IncomingPhoneNumberRow>,
) -> Result<Vec<IncomingPhoneNumber>, MappingError> {
    rows.into_iter().map(IncomingPhoneNumber::try_from).collect()
}
