//! Repository contracts and their PostgreSQL implementations
//!
//! Each repository follows these patterns:
//! - One trait per entity; handlers only see the trait
//! - Reads return `Option`/`Vec`, never an error for a missing id
//! - Writes run in one `Session` and report whether anything changed
//! - Eager loads use JOINs (no N+1)

pub mod categories;
pub mod countries;
pub mod owners;
pub mod pokemon;
pub mod reviewers;
pub mod reviews;

pub use categories::{Category, CategoryRepository, PgCategoryRepo};
pub use countries::{Country, CountryRepository, PgCountryRepo};
pub use owners::{Owner, OwnerInput, OwnerRepository, PgOwnerRepo};
pub use pokemon::{PgPokemonRepo, Pokemon, PokemonInput, PokemonRepository};
pub use reviewers::{PgReviewerRepo, Reviewer, ReviewerInput, ReviewerRepository};
pub use reviews::{PgReviewRepo, Review, ReviewContent, ReviewRepository};
