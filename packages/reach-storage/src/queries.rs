use sqlx::PgExecutor;

use crate::{
	Result,
	db::Db,
	models::{AcademyRow, CampaignRow, CorpusTable},
};

pub async fn fetch_campaigns(db: &Db) -> Result<Vec<CampaignRow>> {
	let rows = sqlx::query_as::<_, CampaignRow>(
		"\
SELECT
	id,
	name,
	description,
	commission_rate,
	performance_metrics,
	status,
	created_at,
	updated_at
FROM campaigns
ORDER BY created_at ASC, id ASC",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn fetch_academy(db: &Db) -> Result<Vec<AcademyRow>> {
	let rows = sqlx::query_as::<_, AcademyRow>(
		"\
SELECT
	id,
	title,
	content,
	category,
	url,
	created_at,
	updated_at
FROM academy
ORDER BY created_at ASC, id ASC",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn count_rows(db: &Db, table: CorpusTable) -> Result<i64> {
	// Table names cannot be bound; `CorpusTable` only yields fixed identifiers.
	let sql = format!("SELECT count(*) FROM {}", table.as_str());
	let count: i64 = sqlx::query_scalar(&sql).fetch_one(&db.pool).await?;

	Ok(count)
}

pub async fn insert_campaign<'e, E>(executor: E, row: &CampaignRow) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO campaigns (
	id,
	name,
	description,
	commission_rate,
	performance_metrics,
	status,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'active'), COALESCE($7, now()), COALESCE($8, now()))",
	)
	.bind(row.id)
	.bind(row.name.as_str())
	.bind(row.description.as_deref())
	.bind(row.commission_rate)
	.bind(row.performance_metrics.as_ref())
	.bind(row.status.as_deref())
	.bind(row.created_at)
	.bind(row.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn insert_academy<'e, E>(executor: E, row: &AcademyRow) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO academy (
	id,
	title,
	content,
	category,
	url,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, COALESCE($6, now()), COALESCE($7, now()))",
	)
	.bind(row.id)
	.bind(row.title.as_str())
	.bind(row.content.as_deref())
	.bind(row.category.as_deref())
	.bind(row.url.as_deref())
	.bind(row.created_at)
	.bind(row.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}
