//! User repository

use crate::models::{User, UserRole};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>>;
    /// Case-insensitive email lookup
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn update(&self, user: &User) -> Result<User>;
    /// All users ordered by name
    async fn list(&self) -> Result<Vec<User>>;
    /// Users of one unit with one role, ordered by name
    async fn list_by_cras_and_role(&self, cras_id: Uuid, role: UserRole) -> Result<Vec<User>>;
    async fn count(&self) -> Result<usize>;
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    items: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed() -> Arc<dyn UserRepository> {
        Arc::new(Self::new())
    }
}

fn sort_by_name(users: &mut [User]) {
    users.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let mut items = self.items.write().await;
        if items.contains_key(&user.id) {
            anyhow::bail!("User {} already exists", user.id);
        }
        if items.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            anyhow::bail!("Email '{}' already registered", user.email);
        }
        items.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }

    async fn update(&self, user: &User) -> Result<User> {
        let mut items = self.items.write().await;
        match items.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(user.clone())
            }
            None => anyhow::bail!("User {} not found", user.id),
        }
    }

    async fn list(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.items.read().await.values().cloned().collect();
        sort_by_name(&mut users);
        Ok(users)
    }

    async fn list_by_cras_and_role(&self, cras_id: Uuid, role: UserRole) -> Result<Vec<User>> {
        let mut users: Vec<User> = self
            .items
            .read()
            .await
            .values()
            .filter(|u| u.cras_id == Some(cras_id) && u.role == role)
            .cloned()
            .collect();
        sort_by_name(&mut users);
        Ok(users)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.items.read().await.len())
    }
}
