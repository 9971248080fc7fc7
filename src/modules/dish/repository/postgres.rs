use super::{
    ensure_relations, CreateDishPayload, Dish, DishStore, Error, ReplaceDishPayload,
    UpdateDishPayload,
};
use crate::utils::filter::{push_order, push_page, push_where, Filter, Where};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use ulid::Ulid;

#[derive(sqlx::FromRow)]
struct DishRow {
    id: String,
    name: String,
    attributes: Json<Map<String, Value>>,
}

impl From<DishRow> for Dish {
    fn from(row: DishRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            attributes: row.attributes.0,
        }
    }
}

pub struct PgDishStore {
    pool: PgPool,
}

impl PgDishStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn not_found_unless_affected(rows_affected: u64) -> Result<(), Error> {
    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

#[async_trait]
impl DishStore for PgDishStore {
    async fn create(&self, payload: CreateDishPayload) -> Result<Dish, Error> {
        sqlx::query_as::<_, DishRow>(
            "
            INSERT INTO dishes (id, name, attributes)
            VALUES ($1, $2, $3)
            RETURNING id, name, attributes
            ",
        )
        .bind(Ulid::new().to_string())
        .bind(payload.name)
        .bind(Json(payload.attributes))
        .fetch_one(&self.pool)
        .await
        .map(Dish::from)
        .map_err(|err| {
            tracing::error!("Error occurred while trying to create a dish: {}", err);
            Error::UnexpectedError
        })
    }

    async fn count(&self, r#where: &Where) -> Result<u64, Error> {
        // Same pattern limits as the in-memory store.
        r#where.compile()?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM dishes WHERE ");
        push_where(&mut qb, r#where);

        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map(|count| count as u64)
            .map_err(|err| {
                tracing::error!("Error occurred while trying to count dishes: {}", err);
                Error::UnexpectedError
            })
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Dish>, Error> {
        ensure_relations(&filter.include)?;
        filter.r#where.compile()?;

        let mut qb =
            QueryBuilder::<Postgres>::new("SELECT id, name, attributes FROM dishes WHERE ");
        push_where(&mut qb, &filter.r#where);
        push_order(&mut qb, &filter.order);
        push_page(&mut qb, filter.limit, filter.skip);

        qb.build_query_as::<DishRow>()
            .fetch_all(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(Dish::from).collect())
            .map_err(|err| {
                tracing::error!("Error occurred while trying to fetch many dishes: {}", err);
                Error::UnexpectedError
            })
    }

    async fn find_by_id(&self, id: &str, filter: &Filter) -> Result<Dish, Error> {
        ensure_relations(&filter.include)?;

        sqlx::query_as::<_, DishRow>("SELECT id, name, attributes FROM dishes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                tracing::error!(
                    "Error occurred while trying to fetch a dish by id {}: {}",
                    id,
                    err
                );
                Error::UnexpectedError
            })?
            .map(Dish::from)
            .ok_or(Error::NotFound)
    }

    async fn update_all(&self, payload: UpdateDishPayload, r#where: &Where) -> Result<u64, Error> {
        r#where.compile()?;

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE dishes SET name = COALESCE(");
        qb.push_bind(payload.name)
            .push(", name), attributes = attributes || ")
            .push_bind(Json(payload.attributes))
            .push(" WHERE ");
        push_where(&mut qb, r#where);

        qb.build()
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected())
            .map_err(|err| {
                tracing::error!("Error occurred while trying to update many dishes: {}", err);
                Error::UnexpectedError
            })
    }

    async fn update_by_id(&self, id: &str, payload: UpdateDishPayload) -> Result<(), Error> {
        sqlx::query(
            "
            UPDATE dishes SET
                name = COALESCE($1, name),
                attributes = attributes || $2
            WHERE
                id = $3
            ",
        )
        .bind(payload.name)
        .bind(Json(payload.attributes))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while trying to update a dish by id {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
        .and_then(|result| not_found_unless_affected(result.rows_affected()))
    }

    async fn replace_by_id(&self, id: &str, payload: ReplaceDishPayload) -> Result<(), Error> {
        sqlx::query("UPDATE dishes SET name = $1, attributes = $2 WHERE id = $3")
            .bind(payload.name)
            .bind(Json(payload.attributes))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                tracing::error!(
                    "Error occurred while trying to replace a dish by id {}: {}",
                    id,
                    err
                );
                Error::UnexpectedError
            })
            .and_then(|result| not_found_unless_affected(result.rows_affected()))
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM dishes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                tracing::error!(
                    "Error occurred while trying to delete a dish by id {}: {}",
                    id,
                    err
                );
                Error::UnexpectedError
            })
            .and_then(|result| not_found_unless_affected(result.rows_affected()))
    }
}
