use std::collections::{HashMap, HashSet};

use anyhow::Context;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::password::hash_password,
    movies::repo::{Movie, NewMovieImage},
    permissions::repo::Permission,
    roles::repo::Role,
    users::repo::User,
};

/// Canonical capability catalog. Seeding converges the store towards this
/// set by name; it never deletes extra permissions someone created later.
pub const PERMISSION_CATALOG: [&str; 20] = [
    "USER_CREATE",
    "USER_DELETE",
    "USER_UPDATE",
    "USER_VIEW",
    "ROLE_CREATE",
    "ROLE_DELETE",
    "ROLE_UPDATE",
    "ROLE_VIEW",
    "PERMISSION_CREATE",
    "PERMISSION_DELETE",
    "PERMISSION_UPDATE",
    "PERMISSION_VIEW",
    "MOVIE_CREATE",
    "MOVIE_DELETE",
    "MOVIE_UPDATE",
    "MOVIE_VIEW",
    "REVIEW_CREATE",
    "REVIEW_DELETE",
    "REVIEW_UPDATE",
    "REVIEW_VIEW",
];

const ADMIN_ROLE: &str = "ROLE_ADMIN";
const USER_ROLE: &str = "ROLE_USER";
const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin123";
const ADMIN_FULL_NAME: &str = "Admin User";

const MOVIE_DATASET: &str = include_str!("../data/movie_seed.json");

#[derive(Debug, Deserialize)]
struct SeedImage {
    name: Option<String>,
    image_url: String,
}

#[derive(Debug, Deserialize)]
struct SeedMovie {
    title: String,
    year: i32,
    genre: Option<String>,
    description: Option<String>,
    director: Option<String>,
    #[serde(default)]
    images: Vec<SeedImage>,
}

fn parse_movie_dataset() -> anyhow::Result<Vec<SeedMovie>> {
    serde_json::from_str(MOVIE_DATASET).context("parse embedded movie dataset")
}

fn view_subset() -> Vec<&'static str> {
    PERMISSION_CATALOG
        .iter()
        .copied()
        .filter(|name| name.ends_with("_VIEW"))
        .collect()
}

/// Idempotent startup convergence: safe to run on every process start.
#[instrument(skip(db))]
pub async fn run(db: &PgPool) -> anyhow::Result<()> {
    let perm_ids = ensure_permissions(db).await?;

    let all_ids: Vec<Uuid> = PERMISSION_CATALOG
        .iter()
        .map(|name| perm_ids[*name])
        .collect();
    let view_ids: Vec<Uuid> = view_subset().iter().map(|name| perm_ids[*name]).collect();

    let admin_role = ensure_role(db, ADMIN_ROLE, &all_ids).await?;
    ensure_role(db, USER_ROLE, &view_ids).await?;

    ensure_admin_user(db, admin_role.id).await?;
    seed_movies(db).await?;

    Ok(())
}

async fn ensure_permissions(db: &PgPool) -> anyhow::Result<HashMap<&'static str, Uuid>> {
    let mut ids = HashMap::new();
    for name in PERMISSION_CATALOG {
        let permission = match Permission::find_by_name(db, name).await? {
            Some(existing) => existing,
            None => {
                info!(name, "seeding permission");
                Permission::insert(db, name).await?
            }
        };
        ids.insert(name, permission.id);
    }
    Ok(ids)
}

/// Creates the role if absent, then converges its permission links to
/// exactly `target_ids` when they have drifted.
async fn ensure_role(db: &PgPool, name: &str, target_ids: &[Uuid]) -> anyhow::Result<Role> {
    let role = match Role::find_by_name(db, name).await? {
        Some(existing) => existing,
        None => {
            info!(name, "seeding role");
            let mut tx = db.begin().await?;
            let role = Role::insert(&mut tx, name, None).await?;
            Role::add_permissions(&mut tx, role.id, target_ids).await?;
            tx.commit().await?;
            return Ok(role);
        }
    };

    let current: HashSet<Uuid> = Role::permissions_of(db, role.id)
        .await?
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    let target: HashSet<Uuid> = target_ids.iter().copied().collect();

    if current != target {
        info!(name, "converging role permission set");
        let mut tx = db.begin().await?;
        Role::set_permissions(&mut tx, role.id, target_ids).await?;
        tx.commit().await?;
    }

    Ok(role)
}

async fn ensure_admin_user(db: &PgPool, admin_role_id: Uuid) -> anyhow::Result<()> {
    if User::find_by_email(db, ADMIN_EMAIL).await?.is_some() {
        return Ok(());
    }

    info!(email = ADMIN_EMAIL, "seeding bootstrap admin account");
    let hash = hash_password(ADMIN_PASSWORD)?;
    let mut tx = db.begin().await?;
    let admin = User::insert(&mut tx, ADMIN_EMAIL, &hash, Some(ADMIN_FULL_NAME)).await?;
    User::set_roles(&mut tx, admin.id, &[admin_role_id]).await?;
    tx.commit().await?;
    Ok(())
}

/// Bulk-loads the embedded dataset, but only into an empty movie table.
/// Each movie lands with its image list in one transaction.
async fn seed_movies(db: &PgPool) -> anyhow::Result<()> {
    if Movie::count(db).await? > 0 {
        return Ok(());
    }

    let dataset = parse_movie_dataset()?;
    info!(count = dataset.len(), "seeding movie dataset");

    for seed in dataset {
        let images: Vec<NewMovieImage> = seed
            .images
            .into_iter()
            .map(|img| NewMovieImage {
                name: img.name,
                image_url: img.image_url,
            })
            .collect();

        let mut tx = db.begin().await?;
        Movie::insert_with_images(
            &mut tx,
            &seed.title,
            seed.description.as_deref(),
            seed.director.as_deref(),
            seed.genre.as_deref(),
            seed.year,
            &images,
        )
        .await?;
        tx.commit().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_holds_twenty_unique_names() {
        let unique: HashSet<&str> = PERMISSION_CATALOG.iter().copied().collect();
        assert_eq!(PERMISSION_CATALOG.len(), 20);
        assert_eq!(unique.len(), 20);
    }

    #[test]
    fn view_subset_is_one_per_resource() {
        let subset = view_subset();
        assert_eq!(
            subset,
            vec![
                "USER_VIEW",
                "ROLE_VIEW",
                "PERMISSION_VIEW",
                "MOVIE_VIEW",
                "REVIEW_VIEW",
            ]
        );
    }

    #[test]
    fn embedded_dataset_parses() {
        let dataset = parse_movie_dataset().expect("dataset should parse");
        assert!(!dataset.is_empty());
        for movie in &dataset {
            assert!(!movie.title.trim().is_empty());
            assert!(movie.year >= 1888, "{} has year {}", movie.title, movie.year);
            assert!(!movie.images.is_empty(), "{} has no images", movie.title);
            for image in &movie.images {
                assert!(!image.image_url.trim().is_empty());
            }
        }
    }
}
