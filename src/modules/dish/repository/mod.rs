mod memory;
mod postgres;

pub use memory::MemoryDishStore;
pub use postgres::PgDishStore;

use crate::utils::filter::{Filter, FilterError, Where};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Relations a filter may `include`. Dishes have none.
pub const RELATIONS: &[&str] = &[];

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Dish {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Dish {
    /// The dish as a single JSON object, the shape filters are evaluated on.
    pub fn to_document(&self) -> Map<String, Value> {
        let mut document = self.attributes.clone();
        document.insert(String::from("id"), Value::String(self.id.clone()));
        document.insert(String::from("name"), Value::String(self.name.clone()));
        document
    }
}

pub struct CreateDishPayload {
    pub name: String,
    pub attributes: Map<String, Value>,
}

pub struct UpdateDishPayload {
    pub name: Option<String>,
    pub attributes: Map<String, Value>,
}

impl UpdateDishPayload {
    pub fn apply(&self, dish: &mut Dish) {
        if let Some(name) = &self.name {
            dish.name = name.clone();
        }
        for (key, value) in &self.attributes {
            dish.attributes.insert(key.clone(), value.clone());
        }
    }
}

pub struct ReplaceDishPayload {
    pub name: String,
    pub attributes: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("dish not found")]
    NotFound,
    #[error("{0}")]
    InvalidFilter(String),
    #[error("unexpected store error")]
    UnexpectedError,
}

impl From<FilterError> for Error {
    fn from(err: FilterError) -> Self {
        Self::InvalidFilter(err.0)
    }
}

pub fn ensure_relations(include: &[String]) -> Result<(), Error> {
    match include
        .iter()
        .find(|relation| !RELATIONS.contains(&relation.as_str()))
    {
        Some(relation) => Err(Error::InvalidFilter(format!(
            "relation `{relation}` is not defined for Dish"
        ))),
        None => Ok(()),
    }
}

/// Persistence for dishes. Handlers receive it through the request context.
#[async_trait]
pub trait DishStore: Send + Sync {
    async fn create(&self, payload: CreateDishPayload) -> Result<Dish, Error>;

    async fn count(&self, r#where: &Where) -> Result<u64, Error>;

    async fn find(&self, filter: &Filter) -> Result<Vec<Dish>, Error>;

    /// Fails with [`Error::NotFound`] when no dish has this id. The filter's
    /// `where` clause is ignored.
    async fn find_by_id(&self, id: &str, filter: &Filter) -> Result<Dish, Error>;

    /// Patches every dish matching `where`, returning how many were touched.
    async fn update_all(&self, payload: UpdateDishPayload, r#where: &Where) -> Result<u64, Error>;

    async fn update_by_id(&self, id: &str, payload: UpdateDishPayload) -> Result<(), Error>;

    async fn replace_by_id(&self, id: &str, payload: ReplaceDishPayload) -> Result<(), Error>;

    async fn delete_by_id(&self, id: &str) -> Result<(), Error>;
}
