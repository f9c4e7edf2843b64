use sqlx::{PgPool, QueryBuilder};

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedDinas;
use crate::features::tickets::dtos::ticket_dto::{
    AnalyticsResponse, CountBucket, DayBucket, StatsResponse,
};

const DEFAULT_ANALYTICS_DAYS: i64 = 7;
const MAX_ANALYTICS_DAYS: i64 = 90;

/// Aggregate counts for the staff dashboard, scoped to the caller's
/// dinas unless it holds the all-agencies capability.
pub struct StatsService {
    pool: PgPool,
}

impl StatsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn stats(&self, actor: &AuthenticatedDinas) -> Result<StatsResponse> {
        let total = self.count_total(actor).await?;
        let by_status = self.count_grouped("status", actor).await?;
        let by_category = self.count_grouped("category", actor).await?;
        let by_urgency = self.count_grouped("urgency", actor).await?;

        Ok(StatsResponse {
            total,
            by_status,
            by_category,
            by_urgency,
        })
    }

    /// Created/resolved counts bucketed per day over the requested
    /// look-back window.
    pub async fn analytics(
        &self,
        days: Option<i64>,
        actor: &AuthenticatedDinas,
    ) -> Result<AnalyticsResponse> {
        let days = days
            .unwrap_or(DEFAULT_ANALYTICS_DAYS)
            .clamp(1, MAX_ANALYTICS_DAYS);

        let created_per_day = self.per_day("created_at", days, actor).await?;
        let resolved_per_day = self.per_day("resolved_at", days, actor).await?;

        Ok(AnalyticsResponse {
            days,
            created_per_day,
            resolved_per_day,
        })
    }

    async fn count_total(&self, actor: &AuthenticatedDinas) -> Result<i64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM tickets WHERE TRUE");
        push_scope(&mut builder, actor);
        let total = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn count_grouped(
        &self,
        column: &str,
        actor: &AuthenticatedDinas,
    ) -> Result<Vec<CountBucket>> {
        // `column` is a fixed identifier chosen by this module, never
        // caller input.
        let mut builder = QueryBuilder::new(format!(
            "SELECT {col}::text AS key, COUNT(*) AS count FROM tickets WHERE TRUE",
            col = column
        ));
        push_scope(&mut builder, actor);
        builder.push(format!(" GROUP BY {col} ORDER BY count DESC", col = column));

        let rows: Vec<(String, i64)> = builder.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(key, count)| CountBucket { key, count })
            .collect())
    }

    async fn per_day(
        &self,
        column: &str,
        days: i64,
        actor: &AuthenticatedDinas,
    ) -> Result<Vec<DayBucket>> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {col}::date AS day, COUNT(*) AS count FROM tickets WHERE {col} >= NOW() - ",
            col = column
        ));
        builder.push_bind(days);
        builder.push(" * INTERVAL '1 day'");
        push_scope(&mut builder, actor);
        builder.push(format!(" GROUP BY {col}::date ORDER BY day", col = column));

        let rows: Vec<(chrono::NaiveDate, i64)> =
            builder.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(day, count)| DayBucket { day, count })
            .collect())
    }
}

fn push_scope(builder: &mut QueryBuilder<'_, sqlx::Postgres>, actor: &AuthenticatedDinas) {
    if !actor.is_all_agencies() {
        builder.push(" AND ");
        builder.push_bind(actor.sub.clone());
        builder.push(" = ANY(assigned_dinas)");
    }
}
