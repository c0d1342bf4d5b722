use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::domain::{
    DomainError, DomainResult, NewUser, SearchField, SearchQuery, SortKey, User,
    UserRepositoryInterface, UserUpdate, SEARCH_PAGE_SIZE,
};
use crate::infrastructure::database::entities::user;

pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn user_model_to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        password_hash: model.password_hash,
        is_admin: model.is_admin,
        age: model.age,
        hobbies: serde_json::from_str(&model.hobbies).unwrap_or_default(),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn hobbies_to_column(hobbies: &[String]) -> String {
    serde_json::to_string(hobbies).unwrap_or_else(|_| "[]".to_string())
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Internal(format!("Database error: {}", e))
}

fn map_insert_err(e: sea_orm::DbErr) -> DomainError {
    if e.to_string().contains("UNIQUE") || e.to_string().contains("duplicate") {
        DomainError::Conflict("Username is already taken".to_string())
    } else {
        db_err(e)
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepositoryInterface for UserRepository {
    async fn create(&self, new_user: NewUser) -> DomainResult<User> {
        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();

        let model = user::ActiveModel {
            id: Set(id),
            username: Set(new_user.username),
            password_hash: Set(new_user.password_hash),
            is_admin: Set(new_user.is_admin),
            age: Set(new_user.age),
            hobbies: Set(hobbies_to_column(&new_user.hobbies)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model.insert(&self.db).await.map_err(map_insert_err)?;

        Ok(user_model_to_domain(inserted))
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<User>> {
        let models = user::Entity::find().all(&self.db).await.map_err(db_err)?;

        Ok(models.into_iter().map(user_model_to_domain).collect())
    }

    async fn update(&self, id: &str, update: UserUpdate) -> DomainResult<Option<User>> {
        let existing = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let mut active: user::ActiveModel = existing.into();
        active.username = Set(update.username);
        active.password_hash = Set(update.password_hash);
        active.is_admin = Set(update.is_admin);
        active.age = Set(update.age);
        active.hobbies = Set(hobbies_to_column(&update.hobbies));
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await.map_err(map_insert_err)?;

        Ok(Some(user_model_to_domain(updated)))
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let result = user::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound {
                entity: "User",
                field: "id",
                value: id.to_string(),
            });
        }

        Ok(())
    }

    async fn search(&self, search: SearchQuery) -> DomainResult<Vec<User>> {
        let mut query = user::Entity::find();

        // The hobbies filter is membership in the deserialized list, not a
        // substring match on the JSON text column, so it runs in Rust after
        // the fetch.
        let mut hobby: Option<&str> = None;
        if let Some((field, value)) = &search.filter {
            match field {
                SearchField::Username => {
                    query = query.filter(user::Column::Username.contains(value));
                }
                SearchField::Hobbies => hobby = Some(value),
            }
        }

        // Sort is attached before the page slice so pagination always
        // operates on the fully sorted result set.
        if let Some(sort) = &search.sort {
            query = match sort {
                SortKey::Username => query.order_by_asc(user::Column::Username),
                SortKey::Age => query.order_by_asc(user::Column::Age),
            };
        }

        let page = search.page.max(1) as u64;
        let offset = (page - 1) * SEARCH_PAGE_SIZE;

        let users = match hobby {
            Some(hobby) => query
                .all(&self.db)
                .await
                .map_err(db_err)?
                .into_iter()
                .map(user_model_to_domain)
                .filter(|u| u.hobbies.iter().any(|h| h == hobby))
                .skip(offset as usize)
                .take(SEARCH_PAGE_SIZE as usize)
                .collect(),
            None => query
                .offset(offset)
                .limit(SEARCH_PAGE_SIZE)
                .all(&self.db)
                .await
                .map_err(db_err)?
                .into_iter()
                .map(user_model_to_domain)
                .collect(),
        };

        Ok(users)
    }

    async fn find_matching(&self, value: &str) -> DomainResult<Vec<User>> {
        let models = user::Entity::find().all(&self.db).await.map_err(db_err)?;

        Ok(models
            .into_iter()
            .map(user_model_to_domain)
            .filter(|u| u.username.contains(value) || u.hobbies.iter().any(|h| h == value))
            .collect())
    }
}

// ── Tests ──────────────────────────────────────────────────────
