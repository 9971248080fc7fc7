use super::{
    ensure_relations, CreateDishPayload, Dish, DishStore, Error, ReplaceDishPayload,
    UpdateDishPayload,
};
use crate::utils::filter::{compare_records, Filter, Where};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use ulid::Ulid;

/// Keeps dishes in process memory, keyed (and therefore ordered) by id.
#[derive(Default)]
pub struct MemoryDishStore {
    dishes: RwLock<BTreeMap<String, Dish>>,
}

#[async_trait]
impl DishStore for MemoryDishStore {
    async fn create(&self, payload: CreateDishPayload) -> Result<Dish, Error> {
        let dish = Dish {
            id: Ulid::new().to_string(),
            name: payload.name,
            attributes: payload.attributes,
        };

        self.dishes
            .write()
            .await
            .insert(dish.id.clone(), dish.clone());

        Ok(dish)
    }

    async fn count(&self, r#where: &Where) -> Result<u64, Error> {
        let matcher = r#where.compile()?;

        Ok(self
            .dishes
            .read()
            .await
            .values()
            .filter(|dish| matcher.matches(&dish.to_document()))
            .count() as u64)
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Dish>, Error> {
        ensure_relations(&filter.include)?;
        let matcher = filter.r#where.compile()?;

        let dishes = self.dishes.read().await;

        let mut matched = dishes
            .values()
            .map(|dish| (dish.to_document(), dish))
            .filter(|(document, _)| matcher.matches(document))
            .collect::<Vec<_>>();

        matched.sort_by(|(a, _), (b, _)| compare_records(a, b, &filter.order));

        Ok(matched
            .into_iter()
            .skip(filter.skip.unwrap_or(0) as usize)
            .take(filter.limit.map_or(usize::MAX, |limit| limit as usize))
            .map(|(_, dish)| dish.clone())
            .collect())
    }

    async fn find_by_id(&self, id: &str, filter: &Filter) -> Result<Dish, Error> {
        ensure_relations(&filter.include)?;

        self.dishes
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn update_all(&self, payload: UpdateDishPayload, r#where: &Where) -> Result<u64, Error> {
        let matcher = r#where.compile()?;
        let mut dishes = self.dishes.write().await;
        let mut count = 0;

        for dish in dishes.values_mut() {
            if matcher.matches(&dish.to_document()) {
                payload.apply(dish);
                count += 1;
            }
        }

        Ok(count)
    }

    async fn update_by_id(&self, id: &str, payload: UpdateDishPayload) -> Result<(), Error> {
        let mut dishes = self.dishes.write().await;
        let dish = dishes.get_mut(id).ok_or(Error::NotFound)?;
        payload.apply(dish);
        Ok(())
    }

    async fn replace_by_id(&self, id: &str, payload: ReplaceDishPayload) -> Result<(), Error> {
        let mut dishes = self.dishes.write().await;
        let dish = dishes.get_mut(id).ok_or(Error::NotFound)?;
        dish.name = payload.name;
        dish.attributes = payload.attributes;
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), Error> {
        self.dishes
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or(Error::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::filter::{Condition, Pattern};
    use serde_json::{json, Map, Value};

    fn attributes(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    async fn seeded() -> (MemoryDishStore, Vec<Dish>) {
        let store = MemoryDishStore::default();
        let mut dishes = vec![];
        for (name, price) in [("Pasta", 9), ("Risotto", 12), ("Soup", 5)] {
            dishes.push(
                store
                    .create(CreateDishPayload {
                        name: name.to_string(),
                        attributes: attributes(json!({ "price": price })),
                    })
                    .await
                    .unwrap(),
            );
        }
        (store, dishes)
    }

    #[tokio::test]
    async fn create_assigns_distinct_ids() {
        let (store, dishes) = seeded().await;

        assert!(dishes.iter().all(|dish| !dish.id.is_empty()));
        assert_ne!(dishes[0].id, dishes[1].id);
        assert_eq!(
            store.find_by_id(&dishes[0].id, &Filter::default()).await.unwrap(),
            dishes[0]
        );
    }

    #[tokio::test]
    async fn find_orders_and_pages() {
        let (store, _) = seeded().await;
        let filter = Filter::parse(json!({ "order": "price DESC", "skip": 1, "limit": 1 })).unwrap();

        let found = store.find(&filter).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Pasta");
    }

    #[tokio::test]
    async fn count_matches_find() {
        let (store, _) = seeded().await;
        let r#where = Where::parse(json!({ "price": { "lt": 10 } })).unwrap();

        assert_eq!(store.count(&r#where).await.unwrap(), 2);
        assert_eq!(
            store.count(&Where::default()).await.unwrap(),
            store.find(&Filter::default()).await.unwrap().len() as u64
        );
    }

    #[tokio::test]
    async fn update_all_touches_only_matches() {
        let (store, dishes) = seeded().await;
        let r#where = Where::parse(json!({ "price": { "gte": 9 } })).unwrap();

        let count = store
            .update_all(
                UpdateDishPayload {
                    name: None,
                    attributes: attributes(json!({ "featured": true })),
                },
                &r#where,
            )
            .await
            .unwrap();

        assert_eq!(count, 2);
        let soup = store.find_by_id(&dishes[2].id, &Filter::default()).await.unwrap();
        assert!(!soup.attributes.contains_key("featured"));
    }

    #[tokio::test]
    async fn replace_drops_missing_attributes() {
        let (store, dishes) = seeded().await;

        store
            .replace_by_id(
                &dishes[0].id,
                ReplaceDishPayload {
                    name: String::from("Penne"),
                    attributes: Map::new(),
                },
            )
            .await
            .unwrap();

        let penne = store.find_by_id(&dishes[0].id, &Filter::default()).await.unwrap();
        assert_eq!(penne.name, "Penne");
        assert!(penne.attributes.is_empty());
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let store = MemoryDishStore::default();

        assert!(matches!(
            store.find_by_id("missing", &Filter::default()).await,
            Err(Error::NotFound)
        ));
        assert!(matches!(
            store
                .update_by_id(
                    "missing",
                    UpdateDishPayload {
                        name: Some(String::from("x")),
                        attributes: Map::new()
                    }
                )
                .await,
            Err(Error::NotFound)
        ));
        assert!(matches!(
            store.delete_by_id("missing").await,
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_removes_the_dish() {
        let (store, dishes) = seeded().await;

        store.delete_by_id(&dishes[1].id).await.unwrap();

        assert!(matches!(
            store.find_by_id(&dishes[1].id, &Filter::default()).await,
            Err(Error::NotFound)
        ));
        assert_eq!(store.count(&Where::default()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn uncompilable_patterns_are_invalid_filters() {
        let (store, _) = seeded().await;
        let r#where = Where::field(
            "name",
            Condition::Like {
                pattern: Pattern::Regex {
                    source: String::from(r"(?:\w{1000}){1000}"),
                    case_insensitive: true,
                },
                negated: false,
            },
        );

        assert!(matches!(
            store.count(&r#where).await,
            Err(Error::InvalidFilter(_))
        ));
        assert!(matches!(
            store
                .find(&Filter {
                    r#where,
                    ..Default::default()
                })
                .await,
            Err(Error::InvalidFilter(_))
        ));
    }
}
