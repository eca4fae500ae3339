use std::sync::Arc;

use log::error;
use serde::{Deserialize, Serialize};

use super::error::AccountError;
use super::model::{Account, AccountView, ReviewAction, Role, Status};
use super::store::{AccountStore, StoreError};
use crate::modules::auth::password::PasswordHasher;
use crate::modules::auth::tokens::TokenIssuer;
use crate::modules::email::templates;
use crate::modules::email::{EmailMessage, Notifier};
use crate::modules::utils::io::{is_valid_email, required};
use crate::modules::utils::logging::log_account_event;

/// Values the service needs to address and word its emails
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Public base URL of the web client, used for registration links
    pub client_url: String,
    /// Receives self-service registration requests
    pub admin_email: String,
    pub app_name: String,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Names and address of a student being added or asking to join
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub student_id: Option<String>,
    pub action: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CompleteInput {
    pub student_id: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatusInput {
    pub student_id: Option<String>,
    pub status: Option<String>,
}

/// Returned by a successful login
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub action: ReviewAction,
    pub student: AccountView,
}

#[derive(Debug, Clone)]
pub struct StatusChange {
    pub previous: Status,
    pub student: AccountView,
    pub notified: bool,
}

/// Orchestrates every account operation over the store, hasher, token
/// issuer and notifier it is given.
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    notifier: Arc<dyn Notifier>,
    tokens: TokenIssuer,
    hasher: PasswordHasher,
    settings: ServiceSettings,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        notifier: Arc<dyn Notifier>,
        tokens: TokenIssuer,
        hasher: PasswordHasher,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            tokens,
            hasher,
            settings,
        }
    }

    /// Self-registration with a password
    pub async fn register(&self, input: RegisterInput) -> Result<AccountView, AccountError> {
        let (Some(first_name), Some(last_name), Some(email), Some(password)) = (
            required(input.first_name.as_deref()),
            required(input.last_name.as_deref()),
            required(input.email.as_deref()),
            non_empty(input.password.as_deref()),
        ) else {
            return Err(AccountError::missing_fields());
        };
        ensure_valid_email(email)?;

        let role = match required(input.role.as_deref()) {
            Some(role) => role.parse::<Role>()?,
            None => Role::Student,
        };

        if self.store.find_by_email(email).await?.is_some() {
            log_account_event("register", email, false, Some("duplicate email"));
            return Err(AccountError::Conflict("User already exists".to_string()));
        }

        let password_hash = self.hash_password(password).await?;
        let account = Account::new(
            first_name.to_string(),
            last_name.to_string(),
            email,
            role,
            Some(password_hash),
        );
        let account = self.create(account, "Email already in use!").await?;

        log_account_event("register", &account.email, true, Some(account.role.as_str()));
        Ok(account.view())
    }

    pub async fn login(&self, input: LoginInput) -> Result<LoginSummary, AccountError> {
        let (Some(email), Some(password)) = (
            required(input.email.as_deref()),
            non_empty(input.password.as_deref()),
        ) else {
            return Err(AccountError::missing_fields());
        };

        let account = match self.store.find_by_email(email).await? {
            Some(account) => account,
            None => {
                log_account_event("login", email, false, Some("unknown email"));
                return Err(AccountError::NotFound("User not found".to_string()));
            }
        };

        // Students who never completed registration have nothing to verify.
        let verified = match account.password_hash.clone() {
            Some(stored) => self.verify_password(password, stored).await?,
            None => false,
        };
        if !verified {
            log_account_event("login", &account.email, false, Some("bad credentials"));
            return Err(AccountError::InvalidCredentials);
        }

        let token = self.tokens.issue(&account.id, account.role)?;
        log_account_event("login", &account.email, true, None);

        Ok(LoginSummary {
            id: account.id,
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            role: account.role,
            token,
        })
    }

    /// Admin invite: creates a password-less student and emails a completion link
    pub async fn admin_add_student(&self, input: StudentInput) -> Result<AccountView, AccountError> {
        let account = self.new_student(&input, "admin_add").await?;
        let account = self.create(account, "User already exists!").await?;
        log_account_event("admin_add", &account.email, true, None);

        let link = templates::registration_link(&self.settings.client_url, &account.id);
        let message = templates::invitation(&self.settings.app_name, &account, &link);
        self.notify(&account, message).await?;

        Ok(account.view())
    }

    /// Self-service request; the admin address is told to review it
    pub async fn self_request_registration(
        &self,
        input: StudentInput,
    ) -> Result<AccountView, AccountError> {
        let account = self.new_student(&input, "self_request").await?;
        let account = self.create(account, "User already exists!").await?;
        log_account_event("self_request", &account.email, true, None);

        let message = templates::registration_request(&self.settings.admin_email, &account);
        self.notify(&account, message).await?;

        Ok(account.view())
    }

    pub async fn review_student(&self, input: ReviewInput) -> Result<ReviewOutcome, AccountError> {
        let student_id =
            required(input.student_id.as_deref()).ok_or_else(AccountError::missing_fields)?;
        let mut student = self.find_student(student_id, "Student Not Found").await?;
        let action = input.action.as_deref().unwrap_or_default().parse::<ReviewAction>()?;

        student.status = action.resulting_status();
        student.touch();
        self.save(&student).await?;
        log_account_event("review", &student.email, true, Some(student.status.as_str()));

        let message = match action {
            ReviewAction::Confirm => {
                let link = templates::registration_link(&self.settings.client_url, &student.id);
                templates::review_approved(&student, &link)
            }
            ReviewAction::Reject => templates::review_rejected(&student),
        };
        self.notify(&student, message).await?;

        Ok(ReviewOutcome {
            action,
            student: student.view(),
        })
    }

    /// Second phase for invited or approved students: set the password once
    pub async fn complete_registration(
        &self,
        input: CompleteInput,
    ) -> Result<AccountView, AccountError> {
        let (Some(student_id), Some(password)) = (
            required(input.student_id.as_deref()),
            non_empty(input.password.as_deref()),
        ) else {
            return Err(AccountError::missing_fields());
        };

        let mut student = self.find_student(student_id, "Student not found").await?;
        // A stored hash means a password was already chosen, even when the
        // account came in through self-registration and never set the flag.
        if student.is_registration_complete || student.password_hash.is_some() {
            log_account_event("complete_registration", &student.email, false, Some("already complete"));
            return Err(AccountError::Conflict(
                "Registration already completed".to_string(),
            ));
        }

        student.password_hash = Some(self.hash_password(password).await?);
        student.is_registration_complete = true;
        student.touch();
        self.save(&student).await?;

        log_account_event("complete_registration", &student.email, true, None);
        Ok(student.view())
    }

    pub async fn update_student_status(
        &self,
        input: StatusInput,
    ) -> Result<StatusChange, AccountError> {
        let status = input.status.as_deref().unwrap_or_default().parse::<Status>()?;
        let student_id =
            required(input.student_id.as_deref()).ok_or_else(AccountError::missing_fields)?;
        let mut student = self.find_student(student_id, "Student not found").await?;

        let previous = student.status;
        if previous == status {
            return Ok(StatusChange {
                previous,
                student: student.view(),
                notified: false,
            });
        }

        student.status = status;
        student.touch();
        self.save(&student).await?;
        log_account_event(
            "update_status",
            &student.email,
            true,
            Some(&format!("{} -> {}", previous, status)),
        );

        self.notify(&student, templates::status_changed(&student, status))
            .await?;

        Ok(StatusChange {
            previous,
            student: student.view(),
            notified: true,
        })
    }

    /// Resolve a bearer token to the account it was issued for
    pub async fn authenticate(&self, token: &str) -> Result<AccountView, AccountError> {
        let claims = self.tokens.verify(token)?;
        match self.store.find_by_id(&claims.sub).await? {
            Some(account) => Ok(account.view()),
            None => Err(AccountError::Unauthorized(
                "Unauthorized, Invalid Token!".to_string(),
            )),
        }
    }

    async fn new_student(&self, input: &StudentInput, event: &str) -> Result<Account, AccountError> {
        let (Some(first_name), Some(last_name), Some(email)) = (
            required(input.first_name.as_deref()),
            required(input.last_name.as_deref()),
            required(input.email.as_deref()),
        ) else {
            return Err(AccountError::missing_fields());
        };
        ensure_valid_email(email)?;

        if self.store.find_by_email(email).await?.is_some() {
            log_account_event(event, email, false, Some("duplicate email"));
            return Err(AccountError::Conflict("User already exists!".to_string()));
        }

        Ok(Account::new(
            first_name.to_string(),
            last_name.to_string(),
            email,
            Role::Student,
            None,
        ))
    }

    async fn find_student(&self, id: &str, not_found: &str) -> Result<Account, AccountError> {
        match self.store.find_by_id(id).await? {
            Some(account) if account.role == Role::Student => Ok(account),
            _ => Err(AccountError::NotFound(not_found.to_string())),
        }
    }

    /// Insert a new record; a storage-level duplicate becomes a conflict
    async fn create(&self, account: Account, duplicate: &str) -> Result<Account, AccountError> {
        account.check_invariants()?;
        match self.store.insert(account).await {
            Ok(account) => Ok(account),
            Err(StoreError::DuplicateEmail(email)) => {
                log_account_event("create", &email, false, Some("duplicate email at store"));
                Err(AccountError::Conflict(duplicate.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, account: &Account) -> Result<(), AccountError> {
        account.check_invariants()?;
        self.store.update(account).await?;
        Ok(())
    }

    async fn notify(&self, account: &Account, message: EmailMessage) -> Result<(), AccountError> {
        self.notifier.send(&message).await.map_err(|source| {
            error!(
                "Notification for account {} failed: subject={:?}, error={}",
                account.id, message.subject, source
            );
            AccountError::Notification {
                account_id: account.id.clone(),
                source,
            }
        })
    }

    async fn hash_password(&self, password: &str) -> Result<String, AccountError> {
        let hasher = self.hasher;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AccountError::Internal(format!("password hashing task failed: {}", e)))?
            .map_err(|e| AccountError::Internal(format!("password hashing failed: {}", e)))
    }

    async fn verify_password(&self, candidate: &str, stored: String) -> Result<bool, AccountError> {
        let hasher = self.hasher;
        let candidate = candidate.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&candidate, &stored))
            .await
            .map_err(|e| AccountError::Internal(format!("password check task failed: {}", e)))
    }
}

/// Passwords are taken verbatim; only emptiness is rejected
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn ensure_valid_email(email: &str) -> Result<(), AccountError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(AccountError::Validation("Invalid email address".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::accounts::store::MemoryStore;
    use crate::modules::email::outbox::Outbox;

    const SECRET: &str = "test-secret-that-is-long-enough-000";

    struct Harness {
        service: Arc<AccountService>,
        store: Arc<MemoryStore>,
        outbox: Arc<Outbox>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let outbox = Arc::new(Outbox::new());
        let service = AccountService::new(
            store.clone(),
            outbox.clone(),
            TokenIssuer::new(SECRET, 3600),
            PasswordHasher::new(1_000),
            ServiceSettings {
                client_url: "https://app.example.com".to_string(),
                admin_email: "admin@example.com".to_string(),
                app_name: "Musically".to_string(),
            },
        );
        Harness {
            service: Arc::new(service),
            store,
            outbox,
        }
    }

    fn register_input(email: &str, password: &str) -> RegisterInput {
        RegisterInput {
            first_name: Some("Ann".to_string()),
            last_name: Some("Lee".to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            role: None,
        }
    }

    fn student_input(first: &str, last: &str, email: &str) -> StudentInput {
        StudentInput {
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            email: Some(email.to_string()),
        }
    }

    fn login_input(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_creates_hashed_student() {
        let h = harness();
        let view = h.service.register(register_input("ann@x.com", "pw123")).await.unwrap();

        assert_eq!(view.role, Role::Student);
        assert_eq!(view.status, Status::Pending);

        let stored = h.store.find_by_id(&view.id).await.unwrap().unwrap();
        let hash = stored.password_hash.unwrap();
        assert_ne!(hash, "pw123");
        assert!(PasswordHasher::new(1_000).verify("pw123", &hash));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let h = harness();
        h.service.register(register_input("ann@x.com", "pw123")).await.unwrap();

        let err = h
            .service
            .register(register_input("Ann@X.com", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Conflict(ref m) if m == "User already exists"));
    }

    #[tokio::test]
    async fn test_register_requires_fields() {
        let h = harness();
        let mut input = register_input("ann@x.com", "pw123");
        input.password = None;
        let err = h.service.register(input).await.unwrap_err();
        assert!(matches!(err, AccountError::Validation(ref m) if m == "Missing required fields!"));

        let mut input = register_input("ann@x.com", "pw123");
        input.first_name = Some("   ".to_string());
        assert!(matches!(
            h.service.register(input).await,
            Err(AccountError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_register_role_handling() {
        let h = harness();
        let mut input = register_input("teach@x.com", "pw123");
        input.role = Some("instructor".to_string());
        let view = h.service.register(input).await.unwrap();
        assert_eq!(view.role, Role::Instructor);

        let mut input = register_input("boss@x.com", "pw123");
        input.role = Some("superuser".to_string());
        let err = h.service.register(input).await.unwrap_err();
        assert!(matches!(err, AccountError::Validation(ref m) if m == "Invalid role"));
    }

    #[tokio::test]
    async fn test_concurrent_registrations_create_one_account() {
        let h = harness();
        let first = h.service.clone();
        let second = h.service.clone();

        let (a, b) = tokio::join!(
            tokio::spawn(async move { first.register(register_input("race@x.com", "pw1")).await }),
            tokio::spawn(async move { second.register(register_input("race@x.com", "pw2")).await }),
        );
        let results = [a.unwrap(), b.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AccountError::Conflict(_)))));
    }

    #[tokio::test]
    async fn test_login_flow() {
        let h = harness();
        let view = h.service.register(register_input("ann@x.com", "pw123")).await.unwrap();

        let summary = h.service.login(login_input("ann@x.com", "pw123")).await.unwrap();
        assert_eq!(summary.id, view.id);
        assert_eq!(summary.email, "ann@x.com");

        let resolved = h.service.authenticate(&summary.token).await.unwrap();
        assert_eq!(resolved.id, view.id);

        let err = h.service.login(login_input("nobody@x.com", "pw123")).await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound(ref m) if m == "User not found"));

        let err = h.service.login(login_input("ann@x.com", "wrong")).await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_never_succeeds_without_password() {
        let h = harness();
        h.service
            .admin_add_student(student_input("Bo", "Kim", "bo@x.com"))
            .await
            .unwrap();

        let err = h.service.login(login_input("bo@x.com", "anything")).await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_admin_add_sends_one_invitation() {
        let h = harness();
        let view = h
            .service
            .admin_add_student(student_input("Bo", "Kim", "bo@x.com"))
            .await
            .unwrap();

        assert_eq!(view.status, Status::Pending);
        assert!(!view.is_registration_complete);

        let sent = h.outbox.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "bo@x.com");
        assert!(sent[0]
            .body
            .contains(&format!("https://app.example.com/complete-registration/{}", view.id)));

        let stored = h.store.find_by_id(&view.id).await.unwrap().unwrap();
        assert!(stored.password_hash.is_none());
    }

    #[tokio::test]
    async fn test_admin_add_rejects_duplicate_without_email() {
        let h = harness();
        h.service.register(register_input("bo@x.com", "pw123")).await.unwrap();

        let err = h
            .service
            .admin_add_student(student_input("Bo", "Kim", "bo@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Conflict(ref m) if m == "User already exists!"));
        assert!(h.outbox.sent().is_empty());
    }

    #[tokio::test]
    async fn test_admin_add_keeps_account_when_email_fails() {
        let h = harness();
        h.outbox.set_failing(true);

        let err = h
            .service
            .admin_add_student(student_input("Bo", "Kim", "bo@x.com"))
            .await
            .unwrap_err();
        let account_id = match err {
            AccountError::Notification { account_id, .. } => account_id,
            other => panic!("expected notification error, got {:?}", other),
        };

        let stored = h.store.find_by_id(&account_id).await.unwrap().unwrap();
        assert_eq!(stored.email, "bo@x.com");
    }

    #[tokio::test]
    async fn test_self_request_notifies_admin_and_checks_duplicates() {
        let h = harness();
        let view = h
            .service
            .self_request_registration(student_input("Cy", "Lo", "cy@x.com"))
            .await
            .unwrap();
        assert_eq!(view.status, Status::Pending);

        let sent = h.outbox.sent_to("admin@example.com");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "New Student Registration Request");

        let err = h
            .service
            .self_request_registration(student_input("Cy", "Lo", "cy@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Conflict(_)));
        assert_eq!(h.outbox.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_review_reject_and_confirm() {
        let h = harness();
        let view = h
            .service
            .self_request_registration(student_input("Cy", "Lo", "cy@x.com"))
            .await
            .unwrap();

        let outcome = h
            .service
            .review_student(ReviewInput {
                student_id: Some(view.id.clone()),
                action: Some("reject".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(outcome.student.status, Status::Rejected);
        let rejections = h.outbox.sent_to("cy@x.com");
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].subject, "Registration Rejected");

        let outcome = h
            .service
            .review_student(ReviewInput {
                student_id: Some(view.id.clone()),
                action: Some("Confirm".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(outcome.action, ReviewAction::Confirm);
        assert_eq!(outcome.student.status, Status::Confirmed);

        let to_student = h.outbox.sent_to("cy@x.com");
        assert_eq!(to_student.len(), 2);
        assert_eq!(to_student[1].subject, "Registration Approved");
        assert!(to_student[1].body.contains(&view.id));
    }

    #[tokio::test]
    async fn test_review_unknown_action_does_not_mutate() {
        let h = harness();
        let view = h
            .service
            .self_request_registration(student_input("Cy", "Lo", "cy@x.com"))
            .await
            .unwrap();
        let before = h.outbox.sent().len();

        let err = h
            .service
            .review_student(ReviewInput {
                student_id: Some(view.id.clone()),
                action: Some("approve".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Validation(ref m) if m == "Invalid Action"));

        let stored = h.store.find_by_id(&view.id).await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Pending);
        assert_eq!(stored.updated_at, view.updated_at);
        assert_eq!(h.outbox.sent().len(), before);
    }

    #[tokio::test]
    async fn test_review_unknown_student() {
        let h = harness();
        let err = h
            .service
            .review_student(ReviewInput {
                student_id: Some("missing".to_string()),
                action: Some("reject".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::NotFound(ref m) if m == "Student Not Found"));
    }

    #[tokio::test]
    async fn test_complete_registration_only_once() {
        let h = harness();
        let view = h
            .service
            .admin_add_student(student_input("Bo", "Kim", "bo@x.com"))
            .await
            .unwrap();

        let complete = |password: &str| CompleteInput {
            student_id: Some(view.id.clone()),
            password: Some(password.to_string()),
        };

        let done = h.service.complete_registration(complete("newpw")).await.unwrap();
        assert!(done.is_registration_complete);
        let first_hash = h
            .store
            .find_by_id(&view.id)
            .await
            .unwrap()
            .unwrap()
            .password_hash;

        let err = h
            .service
            .complete_registration(complete("otherpw"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, AccountError::Conflict(ref m) if m == "Registration already completed")
        );

        let stored = h.store.find_by_id(&view.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, first_hash);

        assert!(h.service.login(login_input("bo@x.com", "newpw")).await.is_ok());
        assert!(h.service.login(login_input("bo@x.com", "otherpw")).await.is_err());
    }

    #[tokio::test]
    async fn test_complete_registration_refuses_self_registered_account() {
        let h = harness();
        let view = h.service.register(register_input("ann@x.com", "pw123")).await.unwrap();
        let original_hash = h
            .store
            .find_by_id(&view.id)
            .await
            .unwrap()
            .unwrap()
            .password_hash;

        let err = h
            .service
            .complete_registration(CompleteInput {
                student_id: Some(view.id.clone()),
                password: Some("takeover".to_string()),
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err, AccountError::Conflict(ref m) if m == "Registration already completed")
        );

        let stored = h.store.find_by_id(&view.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, original_hash);
        assert!(h.service.login(login_input("ann@x.com", "pw123")).await.is_ok());
        assert!(h.service.login(login_input("ann@x.com", "takeover")).await.is_err());
    }

    #[tokio::test]
    async fn test_complete_registration_unknown_student() {
        let h = harness();
        let err = h
            .service
            .complete_registration(CompleteInput {
                student_id: Some("missing".to_string()),
                password: Some("pw".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::NotFound(ref m) if m == "Student not found"));
    }

    #[tokio::test]
    async fn test_update_status_notifications() {
        let h = harness();
        let view = h
            .service
            .self_request_registration(student_input("Cy", "Lo", "cy@x.com"))
            .await
            .unwrap();
        let update = |status: &str| StatusInput {
            student_id: Some(view.id.clone()),
            status: Some(status.to_string()),
        };

        // pending -> pending is a no-op
        let change = h.service.update_student_status(update("pending")).await.unwrap();
        assert!(!change.notified);
        assert!(h.outbox.sent_to("cy@x.com").is_empty());

        let expected = [
            ("confirmed", "Your Registration is Confirmed"),
            ("rejected", "Your Registration Request Was Rejected"),
            ("pending", "Your Registration Request Is Under Review"),
        ];
        for (i, (status, subject)) in expected.iter().enumerate() {
            let change = h.service.update_student_status(update(*status)).await.unwrap();
            assert!(change.notified);
            assert_eq!(change.student.status.as_str(), *status);

            let sent = h.outbox.sent_to("cy@x.com");
            assert_eq!(sent.len(), i + 1);
            assert_eq!(sent[i].subject, *subject);
        }

        // repeating the last status sends nothing
        let change = h.service.update_student_status(update("pending")).await.unwrap();
        assert!(!change.notified);
        assert_eq!(h.outbox.sent_to("cy@x.com").len(), 3);
    }

    #[tokio::test]
    async fn test_update_status_validation() {
        let h = harness();
        let err = h
            .service
            .update_student_status(StatusInput {
                student_id: Some("missing".to_string()),
                status: Some("active".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Validation(ref m) if m == "Invalid status update"));

        let err = h
            .service
            .update_student_status(StatusInput {
                student_id: Some("missing".to_string()),
                status: Some("confirmed".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_student_operations_ignore_non_students() {
        let h = harness();
        let mut input = register_input("admin@x.com", "pw123");
        input.role = Some("admin".to_string());
        let admin = h.service.register(input).await.unwrap();

        let err = h
            .service
            .update_student_status(StatusInput {
                student_id: Some(admin.id),
                status: Some("rejected".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_garbage() {
        let h = harness();
        let err = h.service.authenticate("garbage").await.unwrap_err();
        assert!(matches!(err, AccountError::Unauthorized(_)));

        let token = TokenIssuer::new(SECRET, 3600)
            .issue("no-such-account", Role::Admin)
            .unwrap();
        let err = h.service.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, AccountError::Unauthorized(_)));
    }
}
