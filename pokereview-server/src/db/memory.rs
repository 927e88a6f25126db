//! In-memory store implementing every repository contract
//!
//! Used by the API tests and by `serve --in-memory`. Behaves like the
//! PostgreSQL schema: serial ids, unique names compared on their natural key,
//! foreign-key checks and cascading deletes.
//!
//! Each write runs against a staged copy of the tables which replaces the live
//! copy only when the write affected at least one row, so a failed write
//! leaves nothing behind.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::repos::{
    Category, CategoryRepository, Country, CountryRepository, Owner, OwnerInput, OwnerRepository,
    Pokemon, PokemonInput, PokemonRepository, Review, ReviewContent, ReviewRepository, Reviewer,
    ReviewerInput, ReviewerRepository,
};
use super::DbError;
use crate::models::{natural_key, CategoryIds, Text};

#[derive(Debug, Clone, Default)]
struct Tables {
    categories: BTreeMap<i32, Category>,
    countries: BTreeMap<i32, Country>,
    owners: BTreeMap<i32, Owner>,
    pokemon: BTreeMap<i32, Pokemon>,
    reviewers: BTreeMap<i32, Reviewer>,
    reviews: BTreeMap<i32, Review>,
    /// (pokemon_id, category_id)
    pokemon_categories: BTreeSet<(i32, i32)>,
    /// (pokemon_id, owner_id)
    pokemon_owners: BTreeSet<(i32, i32)>,
    sequences: Sequences,
}

#[derive(Debug, Clone, Default)]
struct Sequences {
    categories: i32,
    countries: i32,
    owners: i32,
    pokemon: i32,
    reviewers: i32,
    reviews: i32,
}

fn next(seq: &mut i32) -> i32 {
    *seq += 1;
    *seq
}

fn conflict(message: impl Into<String>) -> DbError {
    DbError::Conflict {
        message: message.into(),
    }
}

fn name_taken<'a>(mut names: impl Iterator<Item = (&'a i32, &'a String)>, name: &str, except: Option<i32>) -> bool {
    let key = natural_key(name);
    names.any(|(id, existing)| Some(*id) != except && natural_key(existing) == key)
}

impl Tables {
    fn owner_view(&self, owner: &Owner) -> Owner {
        Owner {
            country: self.countries.get(&owner.country_id).cloned(),
            ..owner.clone()
        }
    }

    fn review_view(&self, review: &Review) -> Review {
        Review {
            pokemon: self.pokemon.get(&review.pokemon_id).cloned(),
            ..review.clone()
        }
    }

    fn delete_owner(&mut self, id: i32) -> u64 {
        if self.owners.remove(&id).is_none() {
            return 0;
        }
        self.pokemon_owners.retain(|&(_, owner_id)| owner_id != id);
        1
    }

    fn link_categories(&mut self, pokemon_id: i32, categories: &CategoryIds) -> Result<u64, DbError> {
        let mut affected = 0;
        for category_id in categories.iter() {
            if !self.categories.contains_key(&category_id) {
                return Err(conflict(format!(
                    "the change conflicts with existing data (pokemon_categories_category_id_fkey: {})",
                    category_id
                )));
            }
            if self.pokemon_categories.insert((pokemon_id, category_id)) {
                affected += 1;
            }
        }
        Ok(affected)
    }

    fn unlink_categories(&mut self, pokemon_id: i32) -> u64 {
        let before = self.pokemon_categories.len();
        self.pokemon_categories.retain(|&(p, _)| p != pokemon_id);
        (before - self.pokemon_categories.len()) as u64
    }
}

/// Shared in-memory tables. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write report that nothing was saved.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    async fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        let tables = self.tables.read().await;
        f(&tables)
    }

    async fn write<F>(&self, op: F) -> Result<bool, DbError>
    where
        F: FnOnce(&mut Tables) -> Result<u64, DbError> + Send,
    {
        if self.fail_writes.load(Ordering::SeqCst) {
            tracing::warn!("commit affected no rows");
            return Ok(false);
        }

        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();
        let affected = op(&mut staged)?;
        if affected == 0 {
            tracing::warn!("commit affected no rows");
            return Ok(false);
        }

        *tables = staged;
        Ok(true)
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Category>, DbError> {
        Ok(self.read(|t| t.categories.values().cloned().collect()).await)
    }

    async fn get(&self, id: i32) -> Result<Option<Category>, DbError> {
        Ok(self.read(|t| t.categories.get(&id).cloned()).await)
    }

    async fn exists(&self, id: i32) -> Result<bool, DbError> {
        Ok(self.read(|t| t.categories.contains_key(&id)).await)
    }

    async fn name_exists(&self, name: &str) -> Result<bool, DbError> {
        Ok(self
            .read(|t| name_taken(t.categories.iter().map(|(id, c)| (id, &c.name)), name, None))
            .await)
    }

    async fn list_pokemon(&self, category_id: i32) -> Result<Vec<Pokemon>, DbError> {
        Ok(self
            .read(|t| {
                let mut rows: Vec<Pokemon> = t
                    .pokemon_categories
                    .iter()
                    .filter(|&&(_, c)| c == category_id)
                    .filter_map(|(p, _)| t.pokemon.get(p).cloned())
                    .collect();
                rows.sort_by_key(|p| p.id);
                rows
            })
            .await)
    }

    async fn create(&self, name: &Text) -> Result<bool, DbError> {
        let name = name.clone();
        self.write(move |t| {
            if name_taken(t.categories.iter().map(|(id, c)| (id, &c.name)), name.as_str(), None) {
                return Err(conflict("the change conflicts with existing data (categories_name_key)"));
            }
            let id = next(&mut t.sequences.categories);
            t.categories.insert(
                id,
                Category {
                    id,
                    name: name.into_string(),
                },
            );
            Ok(1)
        })
        .await
    }

    async fn update(&self, id: i32, name: &Text) -> Result<bool, DbError> {
        let name = name.clone();
        self.write(move |t| {
            if name_taken(t.categories.iter().map(|(id, c)| (id, &c.name)), name.as_str(), Some(id)) {
                return Err(conflict("the change conflicts with existing data (categories_name_key)"));
            }
            match t.categories.get_mut(&id) {
                Some(category) => {
                    category.name = name.into_string();
                    Ok(1)
                }
                None => Ok(0),
            }
        })
        .await
    }

    async fn delete(&self, id: i32) -> Result<bool, DbError> {
        self.write(move |t| {
            if t.categories.remove(&id).is_none() {
                return Ok(0);
            }
            t.pokemon_categories.retain(|&(_, c)| c != id);
            Ok(1)
        })
        .await
    }
}

#[async_trait]
impl CountryRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Country>, DbError> {
        Ok(self.read(|t| t.countries.values().cloned().collect()).await)
    }

    async fn get(&self, id: i32) -> Result<Option<Country>, DbError> {
        Ok(self.read(|t| t.countries.get(&id).cloned()).await)
    }

    async fn get_by_owner(&self, owner_id: i32) -> Result<Option<Country>, DbError> {
        Ok(self
            .read(|t| {
                t.owners
                    .get(&owner_id)
                    .and_then(|o| t.countries.get(&o.country_id).cloned())
            })
            .await)
    }

    async fn list_owners(&self, country_id: i32) -> Result<Vec<Owner>, DbError> {
        Ok(self
            .read(|t| {
                t.owners
                    .values()
                    .filter(|o| o.country_id == country_id)
                    .cloned()
                    .collect()
            })
            .await)
    }

    async fn exists(&self, id: i32) -> Result<bool, DbError> {
        Ok(self.read(|t| t.countries.contains_key(&id)).await)
    }

    async fn name_exists(&self, name: &str) -> Result<bool, DbError> {
        Ok(self
            .read(|t| name_taken(t.countries.iter().map(|(id, c)| (id, &c.name)), name, None))
            .await)
    }

    async fn create(&self, name: &Text) -> Result<bool, DbError> {
        let name = name.clone();
        self.write(move |t| {
            if name_taken(t.countries.iter().map(|(id, c)| (id, &c.name)), name.as_str(), None) {
                return Err(conflict("the change conflicts with existing data (countries_name_key)"));
            }
            let id = next(&mut t.sequences.countries);
            t.countries.insert(
                id,
                Country {
                    id,
                    name: name.into_string(),
                },
            );
            Ok(1)
        })
        .await
    }

    async fn update(&self, id: i32, name: &Text) -> Result<bool, DbError> {
        let name = name.clone();
        self.write(move |t| {
            if name_taken(t.countries.iter().map(|(id, c)| (id, &c.name)), name.as_str(), Some(id)) {
                return Err(conflict("the change conflicts with existing data (countries_name_key)"));
            }
            match t.countries.get_mut(&id) {
                Some(country) => {
                    country.name = name.into_string();
                    Ok(1)
                }
                None => Ok(0),
            }
        })
        .await
    }

    async fn delete(&self, id: i32) -> Result<bool, DbError> {
        self.write(move |t| {
            if t.countries.remove(&id).is_none() {
                return Ok(0);
            }
            let owners: Vec<i32> = t
                .owners
                .values()
                .filter(|o| o.country_id == id)
                .map(|o| o.id)
                .collect();
            let mut affected = 1;
            for owner_id in owners {
                affected += t.delete_owner(owner_id);
            }
            Ok(affected)
        })
        .await
    }
}

#[async_trait]
impl OwnerRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Owner>, DbError> {
        Ok(self
            .read(|t| t.owners.values().map(|o| t.owner_view(o)).collect())
            .await)
    }

    async fn get(&self, id: i32) -> Result<Option<Owner>, DbError> {
        Ok(self.read(|t| t.owners.get(&id).map(|o| t.owner_view(o))).await)
    }

    async fn exists(&self, id: i32) -> Result<bool, DbError> {
        Ok(self.read(|t| t.owners.contains_key(&id)).await)
    }

    async fn list_pokemon(&self, owner_id: i32) -> Result<Vec<Pokemon>, DbError> {
        Ok(self
            .read(|t| {
                let mut rows: Vec<Pokemon> = t
                    .pokemon_owners
                    .iter()
                    .filter(|&&(_, o)| o == owner_id)
                    .filter_map(|(p, _)| t.pokemon.get(p).cloned())
                    .collect();
                rows.sort_by_key(|p| p.id);
                rows
            })
            .await)
    }

    async fn list_for_pokemon(&self, pokemon_id: i32) -> Result<Vec<Owner>, DbError> {
        Ok(self
            .read(|t| {
                let mut rows: Vec<Owner> = t
                    .pokemon_owners
                    .iter()
                    .filter(|&&(p, _)| p == pokemon_id)
                    .filter_map(|(_, o)| t.owners.get(o).cloned())
                    .collect();
                rows.sort_by_key(|o| o.id);
                rows
            })
            .await)
    }

    async fn create(&self, owner: &OwnerInput) -> Result<bool, DbError> {
        let owner = owner.clone();
        self.write(move |t| {
            if !t.countries.contains_key(&owner.country_id) {
                return Err(conflict("the change conflicts with existing data (owners_country_id_fkey)"));
            }
            let id = next(&mut t.sequences.owners);
            t.owners.insert(
                id,
                Owner {
                    id,
                    first_name: owner.first_name.into_string(),
                    last_name: owner.last_name.into_string(),
                    gym: owner.gym.into_string(),
                    country_id: owner.country_id,
                    country: None,
                },
            );
            Ok(1)
        })
        .await
    }

    async fn update(&self, id: i32, owner: &OwnerInput) -> Result<bool, DbError> {
        let owner = owner.clone();
        self.write(move |t| {
            if !t.countries.contains_key(&owner.country_id) {
                return Err(conflict("the change conflicts with existing data (owners_country_id_fkey)"));
            }
            match t.owners.get_mut(&id) {
                Some(row) => {
                    row.first_name = owner.first_name.into_string();
                    row.last_name = owner.last_name.into_string();
                    row.gym = owner.gym.into_string();
                    row.country_id = owner.country_id;
                    Ok(1)
                }
                None => Ok(0),
            }
        })
        .await
    }

    async fn delete(&self, id: i32) -> Result<bool, DbError> {
        self.write(move |t| Ok(t.delete_owner(id))).await
    }
}

#[async_trait]
impl PokemonRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Pokemon>, DbError> {
        Ok(self.read(|t| t.pokemon.values().cloned().collect()).await)
    }

    async fn get(&self, id: i32) -> Result<Option<Pokemon>, DbError> {
        Ok(self.read(|t| t.pokemon.get(&id).cloned()).await)
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Pokemon>, DbError> {
        let key = natural_key(name);
        Ok(self
            .read(|t| {
                t.pokemon
                    .values()
                    .find(|p| natural_key(&p.name) == key)
                    .cloned()
            })
            .await)
    }

    async fn exists(&self, id: i32) -> Result<bool, DbError> {
        Ok(self.read(|t| t.pokemon.contains_key(&id)).await)
    }

    async fn name_exists(&self, name: &str) -> Result<bool, DbError> {
        Ok(self
            .read(|t| name_taken(t.pokemon.iter().map(|(id, p)| (id, &p.name)), name, None))
            .await)
    }

    async fn rating(&self, pokemon_id: i32) -> Result<f64, DbError> {
        Ok(self
            .read(|t| {
                let ratings: Vec<i32> = t
                    .reviews
                    .values()
                    .filter(|r| r.pokemon_id == pokemon_id)
                    .map(|r| r.rating)
                    .collect();
                if ratings.is_empty() {
                    return 0.0;
                }
                ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / ratings.len() as f64
            })
            .await)
    }

    async fn list_categories(&self, pokemon_id: i32) -> Result<Vec<Category>, DbError> {
        Ok(self
            .read(|t| {
                t.pokemon_categories
                    .iter()
                    .filter(|&&(p, _)| p == pokemon_id)
                    .filter_map(|(_, c)| t.categories.get(c).cloned())
                    .collect()
            })
            .await)
    }

    async fn owner_exists(&self, owner_id: i32, pokemon_id: i32) -> Result<bool, DbError> {
        Ok(self
            .read(|t| t.pokemon_owners.contains(&(pokemon_id, owner_id)))
            .await)
    }

    async fn add_owner(&self, owner_id: i32, pokemon_id: i32) -> Result<bool, DbError> {
        self.write(move |t| {
            if !t.owners.contains_key(&owner_id) || !t.pokemon.contains_key(&pokemon_id) {
                return Err(conflict("the change conflicts with existing data (pokemon_owners_fkey)"));
            }
            if !t.pokemon_owners.insert((pokemon_id, owner_id)) {
                return Err(conflict("the change conflicts with existing data (pokemon_owners_pkey)"));
            }
            Ok(1)
        })
        .await
    }

    async fn add_categories(&self, pokemon_id: i32, categories: &CategoryIds) -> Result<bool, DbError> {
        let categories = categories.clone();
        self.write(move |t| {
            if !t.pokemon.contains_key(&pokemon_id) {
                return Err(conflict(
                    "the change conflicts with existing data (pokemon_categories_pokemon_id_fkey)",
                ));
            }
            t.link_categories(pokemon_id, &categories)
        })
        .await
    }

    async fn delete_categories(&self, pokemon_id: i32) -> Result<bool, DbError> {
        self.write(move |t| Ok(t.unlink_categories(pokemon_id))).await
    }

    async fn create(&self, pokemon: &PokemonInput, categories: &CategoryIds) -> Result<bool, DbError> {
        let pokemon = pokemon.clone();
        let categories = categories.clone();
        self.write(move |t| {
            if name_taken(t.pokemon.iter().map(|(id, p)| (id, &p.name)), pokemon.name.as_str(), None) {
                return Err(conflict("the change conflicts with existing data (pokemon_name_key)"));
            }
            let id = next(&mut t.sequences.pokemon);
            t.pokemon.insert(
                id,
                Pokemon {
                    id,
                    name: pokemon.name.into_string(),
                    birth_date: pokemon.birth_date,
                },
            );
            Ok(1 + t.link_categories(id, &categories)?)
        })
        .await
    }

    async fn update(
        &self,
        id: i32,
        pokemon: &PokemonInput,
        categories: &CategoryIds,
    ) -> Result<bool, DbError> {
        let pokemon = pokemon.clone();
        let categories = categories.clone();
        self.write(move |t| {
            if !t.pokemon.contains_key(&id) {
                return Ok(0);
            }
            if name_taken(t.pokemon.iter().map(|(id, p)| (id, &p.name)), pokemon.name.as_str(), Some(id)) {
                return Err(conflict("the change conflicts with existing data (pokemon_name_key)"));
            }
            if let Some(row) = t.pokemon.get_mut(&id) {
                row.name = pokemon.name.into_string();
                row.birth_date = pokemon.birth_date;
            }
            t.unlink_categories(id);
            t.link_categories(id, &categories)?;
            Ok(1)
        })
        .await
    }

    async fn delete(&self, id: i32) -> Result<bool, DbError> {
        self.write(move |t| {
            if t.pokemon.remove(&id).is_none() {
                return Ok(0);
            }
            t.pokemon_categories.retain(|&(p, _)| p != id);
            t.pokemon_owners.retain(|&(p, _)| p != id);
            t.reviews.retain(|_, r| r.pokemon_id != id);
            Ok(1)
        })
        .await
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Review>, DbError> {
        Ok(self
            .read(|t| t.reviews.values().map(|r| t.review_view(r)).collect())
            .await)
    }

    async fn get(&self, id: i32) -> Result<Option<Review>, DbError> {
        Ok(self.read(|t| t.reviews.get(&id).map(|r| t.review_view(r))).await)
    }

    async fn exists(&self, id: i32) -> Result<bool, DbError> {
        Ok(self.read(|t| t.reviews.contains_key(&id)).await)
    }

    async fn list_for_pokemon(&self, pokemon_id: i32) -> Result<Vec<Review>, DbError> {
        Ok(self
            .read(|t| {
                t.reviews
                    .values()
                    .filter(|r| r.pokemon_id == pokemon_id)
                    .cloned()
                    .collect()
            })
            .await)
    }

    async fn create(
        &self,
        content: &ReviewContent,
        pokemon_id: i32,
        reviewer_id: i32,
    ) -> Result<bool, DbError> {
        let content = content.clone();
        self.write(move |t| {
            if !t.pokemon.contains_key(&pokemon_id) {
                return Err(conflict("the change conflicts with existing data (reviews_pokemon_id_fkey)"));
            }
            if !t.reviewers.contains_key(&reviewer_id) {
                return Err(conflict("the change conflicts with existing data (reviews_reviewer_id_fkey)"));
            }
            let id = next(&mut t.sequences.reviews);
            t.reviews.insert(
                id,
                Review {
                    id,
                    title: content.title.into_string(),
                    text: content.text.into_string(),
                    rating: content.rating,
                    pokemon_id,
                    reviewer_id,
                    pokemon: None,
                },
            );
            Ok(1)
        })
        .await
    }

    async fn update(&self, id: i32, content: &ReviewContent) -> Result<bool, DbError> {
        let content = content.clone();
        self.write(move |t| match t.reviews.get_mut(&id) {
            Some(row) => {
                row.title = content.title.into_string();
                row.text = content.text.into_string();
                row.rating = content.rating;
                Ok(1)
            }
            None => Ok(0),
        })
        .await
    }

    async fn delete(&self, id: i32) -> Result<bool, DbError> {
        self.write(move |t| Ok(u64::from(t.reviews.remove(&id).is_some())))
            .await
    }
}

#[async_trait]
impl ReviewerRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Reviewer>, DbError> {
        Ok(self.read(|t| t.reviewers.values().cloned().collect()).await)
    }

    async fn get(&self, id: i32) -> Result<Option<Reviewer>, DbError> {
        Ok(self.read(|t| t.reviewers.get(&id).cloned()).await)
    }

    async fn exists(&self, id: i32) -> Result<bool, DbError> {
        Ok(self.read(|t| t.reviewers.contains_key(&id)).await)
    }

    async fn list_reviews(&self, reviewer_id: i32) -> Result<Vec<Review>, DbError> {
        Ok(self
            .read(|t| {
                t.reviews
                    .values()
                    .filter(|r| r.reviewer_id == reviewer_id)
                    .cloned()
                    .collect()
            })
            .await)
    }

    async fn create(&self, reviewer: &ReviewerInput) -> Result<bool, DbError> {
        let reviewer = reviewer.clone();
        self.write(move |t| {
            let id = next(&mut t.sequences.reviewers);
            t.reviewers.insert(
                id,
                Reviewer {
                    id,
                    first_name: reviewer.first_name.into_string(),
                    last_name: reviewer.last_name.into_string(),
                },
            );
            Ok(1)
        })
        .await
    }

    async fn update(&self, id: i32, reviewer: &ReviewerInput) -> Result<bool, DbError> {
        let reviewer = reviewer.clone();
        self.write(move |t| match t.reviewers.get_mut(&id) {
            Some(row) => {
                row.first_name = reviewer.first_name.into_string();
                row.last_name = reviewer.last_name.into_string();
                Ok(1)
            }
            None => Ok(0),
        })
        .await
    }

    async fn delete(&self, id: i32) -> Result<bool, DbError> {
        self.write(move |t| {
            if t.reviewers.remove(&id).is_none() {
                return Ok(0);
            }
            t.reviews.retain(|_, r| r.reviewer_id != id);
            Ok(1)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn text(raw: &str) -> Text {
        Text::name("name", raw).unwrap()
    }

    fn pikachu() -> PokemonInput {
        PokemonInput {
            name: text("Pikachu"),
            birth_date: NaiveDate::from_ymd_opt(1996, 2, 27).unwrap(),
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        CategoryRepository::create(&store, &text("Electric")).await.unwrap();
        CategoryRepository::create(&store, &text("Mouse")).await.unwrap();
        CountryRepository::create(&store, &text("Kanto")).await.unwrap();
        OwnerRepository::create(
            &store,
            &OwnerInput {
                first_name: text("Ash"),
                last_name: text("Ketchum"),
                gym: text("Pallet"),
                country_id: 1,
            },
        )
        .await
        .unwrap();
        PokemonRepository::create(&store, &pikachu(), &CategoryIds::new(&[1]).unwrap())
            .await
            .unwrap();
        ReviewerRepository::create(
            &store,
            &ReviewerInput {
                first_name: text("Gary"),
                last_name: text("Oak"),
            },
        )
        .await
        .unwrap();
        store
    }

    fn review(rating: i32) -> ReviewContent {
        ReviewContent {
            title: text("Great"),
            text: Text::new("text", "Very fast", 4000).unwrap(),
            rating,
        }
    }

    async fn category_ids(store: &MemoryStore, pokemon_id: i32) -> Vec<i32> {
        PokemonRepository::list_categories(store, pokemon_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect()
    }

    #[tokio::test]
    async fn add_categories_links_each_id_once() {
        let store = seeded().await;
        PokemonRepository::delete_categories(&store, 1).await.unwrap();

        let both = CategoryIds::new(&[2, 1, 2]).unwrap();
        assert!(PokemonRepository::add_categories(&store, 1, &both).await.unwrap());
        assert_eq!(category_ids(&store, 1).await, vec![1, 2]);

        // nothing new to link
        assert!(!PokemonRepository::add_categories(&store, 1, &both).await.unwrap());
        assert_eq!(category_ids(&store, 1).await, vec![1, 2]);
    }

    #[tokio::test]
    async fn add_categories_with_unknown_id_links_nothing() {
        let store = seeded().await;
        PokemonRepository::delete_categories(&store, 1).await.unwrap();

        let err = PokemonRepository::add_categories(&store, 1, &CategoryIds::new(&[2, 9]).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        assert!(category_ids(&store, 1).await.is_empty());
    }

    #[tokio::test]
    async fn delete_categories_removes_every_link() {
        let store = seeded().await;
        PokemonRepository::add_categories(&store, 1, &CategoryIds::new(&[2]).unwrap())
            .await
            .unwrap();
        assert_eq!(category_ids(&store, 1).await, vec![1, 2]);

        assert!(PokemonRepository::delete_categories(&store, 1).await.unwrap());
        assert!(category_ids(&store, 1).await.is_empty());
        assert!(!PokemonRepository::delete_categories(&store, 1).await.unwrap());
        assert!(PokemonRepository::exists(&store, 1).await.unwrap());
    }

    #[tokio::test]
    async fn rating_is_zero_without_reviews() {
        let store = seeded().await;
        assert_eq!(PokemonRepository::rating(&store, 1).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn rating_is_mean_of_reviews() {
        let store = seeded().await;
        ReviewRepository::create(&store, &review(3), 1, 1).await.unwrap();
        ReviewRepository::create(&store, &review(5), 1, 1).await.unwrap();
        assert_eq!(PokemonRepository::rating(&store, 1).await.unwrap(), 4.0);
    }

    #[tokio::test]
    async fn duplicate_names_conflict_case_insensitively() {
        let store = seeded().await;
        let err = CategoryRepository::create(&store, &text("  electric ")).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        assert_eq!(CategoryRepository::list(&store).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_ownership_conflicts() {
        let store = seeded().await;
        assert!(PokemonRepository::add_owner(&store, 1, 1).await.unwrap());
        assert!(PokemonRepository::owner_exists(&store, 1, 1).await.unwrap());
        let err = PokemonRepository::add_owner(&store, 1, 1).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
    }

    #[tokio::test]
    async fn update_replaces_category_set() {
        let store = seeded().await;
        let updated = PokemonRepository::update(&store, 1, &pikachu(), &CategoryIds::new(&[2]).unwrap())
            .await
            .unwrap();
        assert!(updated);

        let names: Vec<String> = PokemonRepository::list_categories(&store, 1)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Mouse".to_string()]);
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_saved() {
        let store = seeded().await;
        let saved = PokemonRepository::update(&store, 99, &pikachu(), &CategoryIds::new(&[1]).unwrap())
            .await
            .unwrap();
        assert!(!saved);
    }

    #[tokio::test]
    async fn failed_write_leaves_no_partial_state() {
        let store = seeded().await;
        let mut input = pikachu();
        input.name = text("Raichu");
        let err = PokemonRepository::create(&store, &input, &CategoryIds::new(&[1, 42]).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        assert!(PokemonRepository::get_by_name(&store, "raichu").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_owner_removes_ownership_links() {
        let store = seeded().await;
        PokemonRepository::add_owner(&store, 1, 1).await.unwrap();
        assert!(OwnerRepository::delete(&store, 1).await.unwrap());
        assert!(OwnerRepository::list_for_pokemon(&store, 1).await.unwrap().is_empty());
        assert!(PokemonRepository::exists(&store, 1).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_country_cascades_to_owners() {
        let store = seeded().await;
        assert!(CountryRepository::delete(&store, 1).await.unwrap());
        assert!(OwnerRepository::list(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn owner_reads_attach_country() {
        let store = seeded().await;
        let owner = OwnerRepository::get(&store, 1).await.unwrap().unwrap();
        assert_eq!(owner.country.map(|c| c.name), Some("Kanto".to_string()));
    }

    #[tokio::test]
    async fn fail_writes_reports_unsaved() {
        let store = seeded().await;
        store.fail_writes(true);
        assert!(!CategoryRepository::create(&store, &text("Water")).await.unwrap());
        store.fail_writes(false);
        assert!(CategoryRepository::create(&store, &text("Water")).await.unwrap());
    }
}
