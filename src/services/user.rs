//! User service
//!
//! Staff account management:
//! - the first account of an empty store is created as admin without an actor
//! - every later account is created and changed by an admin
//! - non-admin accounts must be attached to an existing CRAS unit
//! - login checks the argon2 hash and refuses inactive accounts

use crate::db::repositories::{CrasRepository, UserRepository};
use crate::models::{CreateUserInput, EntityKind, LogAction, UpdateUserInput, User, UserRole};
use crate::services::agenda::AgendaService;
use crate::services::audit::AuditService;
use crate::services::password::{hash_password, validate_new_password, verify_password};
use crate::services::ServiceError;
use crate::validation::is_valid_email;
use anyhow::Context;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    cras_repo: Arc<dyn CrasRepository>,
    audit: Arc<AuditService>,
    agenda: Option<Arc<AgendaService>>,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        cras_repo: Arc<dyn CrasRepository>,
        audit: Arc<AuditService>,
    ) -> Self {
        Self {
            user_repo,
            cras_repo,
            audit,
            agenda: None,
        }
    }

    /// Drop cached agendas when an account change affects who can be booked
    pub fn with_agenda(mut self, agenda: Arc<AgendaService>) -> Self {
        self.agenda = Some(agenda);
        self
    }

    /// Create the first administrator. Fails once any user exists.
    pub async fn create_first_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ServiceError> {
        let count = self.user_repo.count().await.context("Failed to count users")?;
        if count > 0 {
            return Err(ServiceError::conflict("Users already exist"));
        }
        let input = CreateUserInput {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: UserRole::Admin,
            cras_id: None,
        };
        let user = self.insert(input).await?;
        self.audit
            .record(user.id, LogAction::Create, EntityKind::User, user.id, json!({ "role": "admin", "bootstrap": true }))
            .await?;
        tracing::info!(user_id = %user.id, "First administrator created");
        Ok(user)
    }

    /// Create a staff account (admin only)
    pub async fn create(&self, actor: &User, input: CreateUserInput) -> Result<User, ServiceError> {
        require_admin(actor)?;
        let user = self.insert(input).await?;
        self.audit
            .record(
                actor.id,
                LogAction::Create,
                EntityKind::User,
                user.id,
                json!({ "email": user.email, "role": user.role, "cras_id": user.cras_id }),
            )
            .await?;
        tracing::info!(actor = %actor.id, user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    async fn insert(&self, input: CreateUserInput) -> Result<User, ServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::validation("Name cannot be empty"));
        }
        let email = input.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(ServiceError::validation("Invalid email format"));
        }
        validate_new_password(&input.password).map_err(ServiceError::Validation)?;
        self.ensure_email_free(&email, None).await?;
        self.check_unit(input.role, input.cras_id).await?;

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(name, email, password_hash, input.role, input.cras_id);
        Ok(self.user_repo.create(&user).await.context("Failed to create user")?)
    }

    /// Update an account.
    ///
    /// Admins may change anything. Other users may only change their own
    /// name, email and password.
    pub async fn update(&self, actor: &User, id: Uuid, input: UpdateUserInput) -> Result<User, ServiceError> {
        let is_self = actor.id == id;
        if !actor.is_admin() {
            let privileged = input.role.is_some() || input.cras_id.is_some() || input.active.is_some();
            if !is_self || privileged {
                return Err(ServiceError::forbidden("Only administrators can change other accounts"));
            }
        }

        let mut user = self.get(id).await?;
        if !input.has_changes() {
            return Ok(user);
        }
        let before = (user.role, user.cras_id, user.active);

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::validation("Name cannot be empty"));
            }
            user.name = name;
        }
        if let Some(email) = input.email {
            let email = email.trim().to_lowercase();
            if !is_valid_email(&email) {
                return Err(ServiceError::validation("Invalid email format"));
            }
            self.ensure_email_free(&email, Some(user.id)).await?;
            user.email = email;
        }
        if let Some(password) = input.password {
            validate_new_password(&password).map_err(ServiceError::Validation)?;
            user.password_hash = hash_password(&password).context("Failed to hash password")?;
        }
        if let Some(role) = input.role {
            user.role = role;
        }
        if let Some(cras_id) = input.cras_id {
            user.cras_id = cras_id;
        }
        if let Some(active) = input.active {
            if !active && is_self {
                return Err(ServiceError::validation("You cannot deactivate your own account"));
            }
            user.active = active;
        }
        self.check_unit(user.role, user.cras_id).await?;

        user.updated_at = Utc::now();
        let saved = self.user_repo.update(&user).await.context("Failed to update user")?;
        if before != (saved.role, saved.cras_id, saved.active) {
            self.invalidate_agendas(saved.id).await;
        }
        self.audit
            .record(
                actor.id,
                LogAction::Update,
                EntityKind::User,
                saved.id,
                json!({ "role": saved.role, "cras_id": saved.cras_id, "active": saved.active }),
            )
            .await?;
        Ok(saved)
    }

    /// Disable an account (admin only, never one's own)
    pub async fn deactivate(&self, actor: &User, id: Uuid) -> Result<User, ServiceError> {
        require_admin(actor)?;
        if actor.id == id {
            return Err(ServiceError::validation("You cannot deactivate your own account"));
        }
        let mut user = self.get(id).await?;
        user.active = false;
        user.updated_at = Utc::now();
        let saved = self.user_repo.update(&user).await.context("Failed to update user")?;
        self.invalidate_agendas(saved.id).await;
        self.audit
            .record(actor.id, LogAction::Delete, EntityKind::User, saved.id, json!({ "active": false }))
            .await?;
        tracing::info!(actor = %actor.id, user_id = %saved.id, "User deactivated");
        Ok(saved)
    }

    /// Check credentials and return the account
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let user = self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to look up user")?
            .ok_or_else(|| ServiceError::Authentication("Invalid email or password".to_string()))?;

        if !verify_password(password, &user.password_hash).unwrap_or(false) {
            tracing::warn!(user_id = %user.id, "Failed login attempt");
            return Err(ServiceError::Authentication("Invalid email or password".to_string()));
        }
        if !user.active {
            return Err(ServiceError::Authentication("Account is disabled".to_string()));
        }

        self.audit
            .record(user.id, LogAction::Login, EntityKind::User, user.id, json!({}))
            .await?;
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, ServiceError> {
        self.user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| ServiceError::not_found(format!("User {}", id)))
    }

    pub async fn list(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.user_repo.list().await.context("Failed to list users")?)
    }

    /// Active interviewers of a unit, ordered by name
    pub async fn list_interviewers(&self, cras_id: Uuid) -> Result<Vec<User>, ServiceError> {
        let users = self
            .user_repo
            .list_by_cras_and_role(cras_id, UserRole::Entrevistador)
            .await
            .context("Failed to list interviewers")?;
        Ok(users.into_iter().filter(|u| u.active).collect())
    }

    async fn invalidate_agendas(&self, user_id: Uuid) {
        if let Some(agenda) = &self.agenda {
            agenda.invalidate_interviewer(user_id).await;
        }
    }

    async fn ensure_email_free(&self, email: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
        let existing = self.user_repo.get_by_email(email).await.context("Failed to check email")?;
        match existing {
            Some(u) if Some(u.id) != except => {
                Err(ServiceError::conflict(format!("Email '{}' is already registered", email)))
            }
            _ => Ok(()),
        }
    }

    async fn check_unit(&self, role: UserRole, cras_id: Option<Uuid>) -> Result<(), ServiceError> {
        match cras_id {
            None if role != UserRole::Admin => {
                Err(ServiceError::validation(format!("A {} must be attached to a CRAS", role)))
            }
            None => Ok(()),
            Some(id) => {
                let exists = self.cras_repo.get_by_id(id).await.context("Failed to get CRAS")?;
                if exists.is_none() {
                    return Err(ServiceError::not_found(format!("CRAS {}", id)));
                }
                Ok(())
            }
        }
    }
}

fn require_admin(actor: &User) -> Result<(), ServiceError> {
    if actor.is_admin() && actor.active {
        Ok(())
    } else {
        Err(ServiceError::forbidden("Administrator role required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{InMemoryAuditLogRepository, InMemoryCrasRepository, InMemoryUserRepository};
    use crate::models::Cras;

    struct Fixture {
        service: UserService,
        admin: User,
        cras: Cras,
    }

    async fn setup() -> Fixture {
        let cras_repo = InMemoryCrasRepository::boxed();
        let cras = Cras::new("CRAS Norte".into(), String::new(), None);
        cras_repo.create(&cras).await.unwrap();

        let audit = Arc::new(AuditService::new(InMemoryAuditLogRepository::boxed()));
        let service = UserService::new(InMemoryUserRepository::boxed(), cras_repo, audit);
        let admin = service
            .create_first_admin("Admin", "admin@cras.gov.br", "admin123")
            .await
            .unwrap();
        Fixture { service, admin, cras }
    }

    fn input(email: &str, role: UserRole, cras_id: Option<Uuid>) -> CreateUserInput {
        CreateUserInput {
            name: "Fulano".into(),
            email: email.into(),
            password: "segredo1".into(),
            role,
            cras_id,
        }
    }

    #[tokio::test]
    async fn test_first_admin_only_once() {
        let f = setup().await;
        assert!(f.admin.is_admin());
        let again = f.service.create_first_admin("Other", "other@cras.gov.br", "admin123").await;
        assert!(matches!(again, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let f = setup().await;
        let desk = f
            .service
            .create(&f.admin, input("desk@cras.gov.br", UserRole::Recepcao, Some(f.cras.id)))
            .await
            .unwrap();

        let result = f
            .service
            .create(&desk, input("x@cras.gov.br", UserRole::Recepcao, Some(f.cras.id)))
            .await;
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_validations() {
        let f = setup().await;

        let no_unit = f.service.create(&f.admin, input("a@cras.gov.br", UserRole::Entrevistador, None)).await;
        assert!(matches!(no_unit, Err(ServiceError::Validation(_))));

        let bad_unit = f
            .service
            .create(&f.admin, input("b@cras.gov.br", UserRole::Entrevistador, Some(Uuid::new_v4())))
            .await;
        assert!(matches!(bad_unit, Err(ServiceError::NotFound(_))));

        let bad_email = f.service.create(&f.admin, input("not-an-email", UserRole::Admin, None)).await;
        assert!(matches!(bad_email, Err(ServiceError::Validation(_))));

        let mut short = input("c@cras.gov.br", UserRole::Admin, None);
        short.password = "123".into();
        assert!(matches!(f.service.create(&f.admin, short).await, Err(ServiceError::Validation(_))));

        let dup = f.service.create(&f.admin, input("ADMIN@cras.gov.br", UserRole::Admin, None)).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let f = setup().await;
        let user = f.service.authenticate("Admin@Cras.gov.br", "admin123").await.unwrap();
        assert_eq!(user.id, f.admin.id);

        let wrong = f.service.authenticate("admin@cras.gov.br", "nope").await;
        assert!(matches!(wrong, Err(ServiceError::Authentication(_))));

        let unknown = f.service.authenticate("ghost@cras.gov.br", "admin123").await;
        assert!(matches!(unknown, Err(ServiceError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_deactivated_user_cannot_log_in() {
        let f = setup().await;
        let desk = f
            .service
            .create(&f.admin, input("desk@cras.gov.br", UserRole::Recepcao, Some(f.cras.id)))
            .await
            .unwrap();

        f.service.deactivate(&f.admin, desk.id).await.unwrap();
        let result = f.service.authenticate("desk@cras.gov.br", "segredo1").await;
        assert!(matches!(result, Err(ServiceError::Authentication(msg)) if msg.contains("disabled")));

        let own = f.service.deactivate(&f.admin, f.admin.id).await;
        assert!(matches!(own, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_self_update_limits() {
        let f = setup().await;
        let desk = f
            .service
            .create(&f.admin, input("desk@cras.gov.br", UserRole::Recepcao, Some(f.cras.id)))
            .await
            .unwrap();

        let renamed = f
            .service
            .update(&desk, desk.id, UpdateUserInput { name: Some("Dona Cida".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(renamed.name, "Dona Cida");

        let promote = f
            .service
            .update(&desk, desk.id, UpdateUserInput { role: Some(UserRole::Admin), ..Default::default() })
            .await;
        assert!(matches!(promote, Err(ServiceError::Forbidden(_))));

        let other = f
            .service
            .update(&desk, f.admin.id, UpdateUserInput { name: Some("x".into()), ..Default::default() })
            .await;
        assert!(matches!(other, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_list_interviewers_only_active() {
        let f = setup().await;
        let a = f
            .service
            .create(&f.admin, input("a@cras.gov.br", UserRole::Entrevistador, Some(f.cras.id)))
            .await
            .unwrap();
        f.service
            .create(&f.admin, input("b@cras.gov.br", UserRole::Entrevistador, Some(f.cras.id)))
            .await
            .unwrap();
        f.service.deactivate(&f.admin, a.id).await.unwrap();

        let list = f.service.list_interviewers(f.cras.id).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].email, "b@cras.gov.br");
    }

    #[tokio::test]
    async fn test_account_changes_drop_cached_agendas() {
        use crate::config::Config;
        use crate::db::Store;
        use crate::models::CreateCrasInput;
        use crate::services::Services;
        use chrono::NaiveDate;

        let services = Services::new(Store::in_memory(), &Config::default()).unwrap();
        let admin = services
            .users
            .create_first_admin("Admin", "admin@cras.gov.br", "admin123")
            .await
            .unwrap();
        let cras = services
            .cras
            .create(
                &admin,
                CreateCrasInput {
                    name: "CRAS Sul".into(),
                    address: String::new(),
                    phone: None,
                },
            )
            .await
            .unwrap();
        let ana = services
            .users
            .create(&admin, input("ana@cras.gov.br", UserRole::Entrevistador, Some(cras.id)))
            .await
            .unwrap();
        let monday = NaiveDate::from_ymd_opt(2030, 3, 4).unwrap();

        services.agenda.interviewer_day(ana.id, monday).await.unwrap();
        services.users.deactivate(&admin, ana.id).await.unwrap();
        let gone = services.agenda.interviewer_day(ana.id, monday).await;
        assert!(matches!(gone, Err(ServiceError::Validation(_))));

        let back = UpdateUserInput {
            active: Some(true),
            ..Default::default()
        };
        services.users.update(&admin, ana.id, back).await.unwrap();
        services.agenda.interviewer_day(ana.id, monday).await.unwrap();

        let moved_to_desk = UpdateUserInput {
            role: Some(UserRole::Recepcao),
            ..Default::default()
        };
        services.users.update(&admin, ana.id, moved_to_desk).await.unwrap();
        let not_interviewer = services.agenda.interviewer_day(ana.id, monday).await;
        assert!(matches!(not_interviewer, Err(ServiceError::Validation(_))));
    }
}
