//! `PostgreSQL` Voucher Repository

use async_trait::async_trait;
use jiff::Timestamp;
use jiff_sqlx::{Date as SqlxDate, Timestamp as SqlxTimestamp};
use rust_decimal::Decimal;
use sqlx::{
    FromRow, Postgres, Row,
    postgres::{PgArguments, PgRow},
    query, query_as,
    query::QueryAs,
    query_scalar,
};
use uuid::Uuid;
use vouchers::{
    codes::VoucherCode,
    vouchers::{DiscountKind, DiscountRule, ValidityWindow, Voucher, VoucherScope, VoucherUsage},
};

use crate::{
    database::Db,
    domain::{
        orders::{OrderDraft, OrderPlacer},
        vouchers::{
            errors::RepositoryError,
            records::{
                CommittedRedemption, RedemptionClaim, RedemptionRecord, SavedVoucherRecord,
                UserId, VoucherRecord, VoucherUuid,
            },
        },
    },
};

use super::VoucherRepository;

const LIST_VOUCHERS_SQL: &str = include_str!("sql/list_vouchers.sql");
const GET_VOUCHER_SQL: &str = include_str!("sql/get_voucher.sql");
const FIND_VOUCHER_BY_CODE_SQL: &str = include_str!("sql/find_voucher_by_code.sql");
const CREATE_VOUCHER_SQL: &str = include_str!("sql/create_voucher.sql");
const LOCK_VOUCHER_SQL: &str = include_str!("sql/lock_voucher.sql");
const MAX_USED_COUNT_SQL: &str = include_str!("sql/max_used_count.sql");
const UPDATE_VOUCHER_SQL: &str = include_str!("sql/update_voucher.sql");
const TOGGLE_VOUCHER_SQL: &str = include_str!("sql/toggle_voucher.sql");
const DELETE_VOUCHER_SQL: &str = include_str!("sql/delete_voucher.sql");
const GET_REDEMPTION_SQL: &str = include_str!("sql/get_redemption.sql");
const SAVE_VOUCHER_SQL: &str = include_str!("sql/save_voucher.sql");
const LIST_SAVED_VOUCHERS_SQL: &str = include_str!("sql/list_saved_vouchers.sql");
const INCREMENT_TIMES_USED_SQL: &str = include_str!("sql/increment_times_used.sql");
const INCREMENT_USED_COUNT_SQL: &str = include_str!("sql/increment_used_count.sql");

const SCOPE_PLATFORM: &str = "platform";
const SCOPE_STORE: &str = "store";

#[derive(Debug, Clone)]
pub struct PgVoucherRepository {
    db: Db,
}

impl PgVoucherRepository {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VoucherRepository for PgVoucherRepository {
    async fn list_vouchers(&self) -> Result<Vec<VoucherRecord>, RepositoryError> {
        let records = query_as::<Postgres, VoucherRecord>(LIST_VOUCHERS_SQL)
            .fetch_all(self.db.pool())
            .await?;

        Ok(records)
    }

    async fn get_voucher(&self, uuid: VoucherUuid) -> Result<VoucherRecord, RepositoryError> {
        let record = query_as::<Postgres, VoucherRecord>(GET_VOUCHER_SQL)
            .bind(uuid.into_uuid())
            .fetch_one(self.db.pool())
            .await?;

        Ok(record)
    }

    async fn find_by_code(
        &self,
        code: &VoucherCode,
    ) -> Result<Option<VoucherRecord>, RepositoryError> {
        let record = query_as::<Postgres, VoucherRecord>(FIND_VOUCHER_BY_CODE_SQL)
            .bind(code.as_str())
            .fetch_optional(self.db.pool())
            .await?;

        Ok(record)
    }

    #[tracing::instrument(
        name = "vouchers.repository.create_voucher",
        skip(self, voucher),
        fields(voucher_uuid = %uuid),
        err
    )]
    async fn create_voucher(
        &self,
        uuid: VoucherUuid,
        voucher: Voucher,
    ) -> Result<VoucherRecord, RepositoryError> {
        let params = VoucherParams::try_from(&voucher)?;
        let times_used = to_i32(voucher.times_used, "times_used")?;

        let record = params
            .bind(query_as::<Postgres, VoucherRecord>(CREATE_VOUCHER_SQL).bind(uuid.into_uuid()))
            .bind(times_used)
            .fetch_one(self.db.pool())
            .await?;

        Ok(record)
    }

    #[tracing::instrument(
        name = "vouchers.repository.update_voucher",
        skip(self, voucher),
        fields(voucher_uuid = %uuid),
        err
    )]
    async fn update_voucher(
        &self,
        uuid: VoucherUuid,
        voucher: Voucher,
    ) -> Result<VoucherRecord, RepositoryError> {
        let params = VoucherParams::try_from(&voucher)?;

        let mut tx = self.db.begin().await?;

        let (times_used, _per_user_limit): (i32, i32) = query_as(LOCK_VOUCHER_SQL)
            .bind(uuid.into_uuid())
            .fetch_one(&mut *tx)
            .await?;

        let times_used = to_u32(times_used, "times_used")?;

        if let Some(usage_limit) = voucher.usage_limit
            && usage_limit < times_used
        {
            return Err(RepositoryError::UsageLimitBelowTimesUsed {
                usage_limit,
                times_used,
            });
        }

        let (used_count,): (i32,) = query_as(MAX_USED_COUNT_SQL)
            .bind(uuid.into_uuid())
            .fetch_one(&mut *tx)
            .await?;

        let used_count = to_u32(used_count, "used_count")?;

        if voucher.per_user_limit < used_count {
            return Err(RepositoryError::PerUserLimitBelowUsedCount {
                per_user_limit: voucher.per_user_limit,
                used_count,
            });
        }

        let record = params
            .bind(query_as::<Postgres, VoucherRecord>(UPDATE_VOUCHER_SQL).bind(uuid.into_uuid()))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn toggle_voucher(&self, uuid: VoucherUuid) -> Result<VoucherRecord, RepositoryError> {
        let record = query_as::<Postgres, VoucherRecord>(TOGGLE_VOUCHER_SQL)
            .bind(uuid.into_uuid())
            .fetch_one(self.db.pool())
            .await?;

        Ok(record)
    }

    async fn delete_voucher(&self, uuid: VoucherUuid) -> Result<(), RepositoryError> {
        let rows_affected = query(DELETE_VOUCHER_SQL)
            .bind(uuid.into_uuid())
            .execute(self.db.pool())
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn get_redemption(
        &self,
        user: &UserId,
        voucher: VoucherUuid,
    ) -> Result<Option<RedemptionRecord>, RepositoryError> {
        let record = query_as::<Postgres, RedemptionRecord>(GET_REDEMPTION_SQL)
            .bind(user.as_str())
            .bind(voucher.into_uuid())
            .fetch_optional(self.db.pool())
            .await?;

        Ok(record)
    }

    async fn save_voucher(
        &self,
        user: &UserId,
        voucher: VoucherUuid,
        saved_at: Timestamp,
    ) -> Result<RedemptionRecord, RepositoryError> {
        let record = query_as::<Postgres, RedemptionRecord>(SAVE_VOUCHER_SQL)
            .bind(user.as_str())
            .bind(voucher.into_uuid())
            .bind(SqlxTimestamp::from(saved_at))
            .fetch_one(self.db.pool())
            .await?;

        Ok(record)
    }

    async fn list_saved(&self, user: &UserId) -> Result<Vec<SavedVoucherRecord>, RepositoryError> {
        let saved = query_as::<Postgres, SavedVoucherRecord>(LIST_SAVED_VOUCHERS_SQL)
            .bind(user.as_str())
            .fetch_all(self.db.pool())
            .await?;

        Ok(saved)
    }

    #[tracing::instrument(
        name = "vouchers.repository.commit_redemption",
        skip(self, orders, draft),
        fields(voucher_uuid = %claim.voucher, user_id = %claim.user),
        err
    )]
    async fn commit_redemption(
        &self,
        claim: &RedemptionClaim,
        orders: &dyn OrderPlacer,
        draft: &OrderDraft,
    ) -> Result<CommittedRedemption, RepositoryError> {
        let voucher_uuid = claim.voucher.into_uuid();

        let mut tx = self.db.begin().await?;

        let (_times_used, per_user_limit): (i32, i32) = query_as(LOCK_VOUCHER_SQL)
            .bind(voucher_uuid)
            .fetch_one(&mut *tx)
            .await?;

        let times_used: i32 = query_scalar(INCREMENT_TIMES_USED_SQL)
            .bind(voucher_uuid)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::UsageLimitReached)?;

        let used_count: i32 = query_scalar(INCREMENT_USED_COUNT_SQL)
            .bind(claim.user.as_str())
            .bind(voucher_uuid)
            .bind(SqlxTimestamp::from(Timestamp::now()))
            .bind(per_user_limit)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::PerUserLimitReached)?;

        // Placed inside the transaction: a failed order rolls the increments back.
        let receipt = orders.place_order(draft).await?;

        tx.commit().await?;

        Ok(CommittedRedemption {
            receipt,
            times_used: to_u32(times_used, "times_used")?,
            used_count: to_u32(used_count, "used_count")?,
        })
    }
}

/// Column values shared by insert and update, bound from `$2` onwards.
struct VoucherParams {
    code: String,
    name: String,
    description: String,
    scope: &'static str,
    owner_store_id: Option<String>,
    owner_store_name: Option<String>,
    discount_kind: &'static str,
    discount_value: Decimal,
    max_discount: Option<Decimal>,
    min_order_amount: Decimal,
    valid_from: SqlxDate,
    valid_until: SqlxDate,
    usage_limit: Option<i32>,
    per_user_limit: i32,
    is_active: bool,
}

impl VoucherParams {
    fn bind<'q, O>(
        self,
        query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        query
            .bind(self.code)
            .bind(self.name)
            .bind(self.description)
            .bind(self.scope)
            .bind(self.owner_store_id)
            .bind(self.owner_store_name)
            .bind(self.discount_kind)
            .bind(self.discount_value)
            .bind(self.max_discount)
            .bind(self.min_order_amount)
            .bind(self.valid_from)
            .bind(self.valid_until)
            .bind(self.usage_limit)
            .bind(self.per_user_limit)
            .bind(self.is_active)
    }
}

impl TryFrom<&Voucher> for VoucherParams {
    type Error = sqlx::Error;

    fn try_from(voucher: &Voucher) -> Result<Self, Self::Error> {
        let (scope, owner_store_id, owner_store_name) = match &voucher.scope {
            VoucherScope::Platform => (SCOPE_PLATFORM, None, None),
            VoucherScope::Store {
                owner_store_id,
                owner_store_name,
            } => (SCOPE_STORE, owner_store_id.clone(), owner_store_name.clone()),
        };

        Ok(Self {
            code: voucher.code.to_string(),
            name: voucher.name.clone(),
            description: voucher.description.clone(),
            scope,
            owner_store_id,
            owner_store_name,
            discount_kind: voucher.discount.kind().as_str(),
            discount_value: voucher.discount.value(),
            max_discount: voucher.discount.max_discount(),
            min_order_amount: voucher.min_order_amount,
            valid_from: SqlxDate::from(voucher.validity.valid_from()),
            valid_until: SqlxDate::from(voucher.validity.valid_until()),
            usage_limit: voucher
                .usage_limit
                .map(|limit| to_i32(limit, "usage_limit"))
                .transpose()?,
            per_user_limit: to_i32(voucher.per_user_limit, "per_user_limit")?,
            is_active: voucher.is_active,
        })
    }
}

fn to_i32(value: u32, column: &'static str) -> Result<i32, sqlx::Error> {
    i32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn to_u32(value: i32, column: &'static str) -> Result<u32, sqlx::Error> {
    u32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn decode_error(column: &'static str, message: String) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: message.into(),
    }
}

fn decode_discount(row: &PgRow) -> sqlx::Result<DiscountRule> {
    let kind: String = row.try_get("discount_kind")?;
    let value: Decimal = row.try_get("discount_value")?;
    let max_discount: Option<Decimal> = row.try_get("max_discount")?;

    match kind.as_str() {
        kind if kind == DiscountKind::Percent.as_str() => Ok(DiscountRule::Percent {
            percent: value,
            max_discount,
        }),
        kind if kind == DiscountKind::Fixed.as_str() => Ok(DiscountRule::Fixed { amount: value }),
        kind if kind == DiscountKind::FreeShipping.as_str() => {
            Ok(DiscountRule::FreeShipping { amount: value })
        }
        other => Err(decode_error(
            "discount_kind",
            format!("unknown discount kind '{other}'"),
        )),
    }
}

fn decode_scope(row: &PgRow) -> sqlx::Result<VoucherScope> {
    let scope: String = row.try_get("scope")?;

    match scope.as_str() {
        SCOPE_PLATFORM => Ok(VoucherScope::Platform),
        SCOPE_STORE => Ok(VoucherScope::Store {
            owner_store_id: row.try_get("owner_store_id")?,
            owner_store_name: row.try_get("owner_store_name")?,
        }),
        other => Err(decode_error("scope", format!("unknown scope '{other}'"))),
    }
}

impl<'r> FromRow<'r, PgRow> for VoucherRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let code: String = row.try_get("code")?;
        let code = VoucherCode::parse(&code).map_err(|e| sqlx::Error::ColumnDecode {
            index: "code".to_string(),
            source: Box::new(e),
        })?;

        let valid_from = row.try_get::<SqlxDate, _>("valid_from")?.to_jiff();
        let valid_until = row.try_get::<SqlxDate, _>("valid_until")?.to_jiff();

        let validity = ValidityWindow::new(valid_from, valid_until).ok_or_else(|| {
            decode_error(
                "valid_until",
                format!("{valid_until} is not after {valid_from}"),
            )
        })?;

        Ok(Self {
            uuid: VoucherUuid::from_uuid(row.try_get("uuid")?),
            voucher: Voucher {
                code,
                name: row.try_get("name")?,
                description: row.try_get("description")?,
                scope: decode_scope(row)?,
                discount: decode_discount(row)?,
                min_order_amount: row.try_get("min_order_amount")?,
                validity,
                usage_limit: row
                    .try_get::<Option<i32>, _>("usage_limit")?
                    .map(|limit| to_u32(limit, "usage_limit"))
                    .transpose()?,
                per_user_limit: to_u32(row.try_get("per_user_limit")?, "per_user_limit")?,
                times_used: to_u32(row.try_get("times_used")?, "times_used")?,
                is_active: row.try_get("is_active")?,
            },
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for RedemptionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            user: UserId::new(row.try_get::<String, _>("user_id")?),
            voucher_uuid: VoucherUuid::from_uuid(row.try_get::<Uuid, _>("voucher_uuid")?),
            used_count: to_u32(row.try_get("used_count")?, "used_count")?,
            saved_at: row.try_get::<SqlxTimestamp, _>("saved_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for SavedVoucherRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            record: VoucherRecord::from_row(row)?,
            usage: VoucherUsage {
                used_count: to_u32(row.try_get("used_count")?, "used_count")?,
                saved_at: row.try_get::<SqlxTimestamp, _>("saved_at")?.to_jiff(),
            },
        })
    }
}
