mod common;

use common::{spawn_app, test_config};
use vendapro::{
    AppError,
    db::UserRepository,
    models::{
        auth::CredentialChanges,
        update::{FieldUpdate, UpdateOutcome},
    },
    services::auth::legacy_sha256,
};

#[tokio::test]
async fn acme_alice_can_log_in() {
    let app = spawn_app().await;
    app.state.tenant_service.register_tenant("Acme", Some(vec![7, 7])).await.unwrap();
    let ctx = app.state.tenant_service.open_tenant("Acme").await.unwrap();

    app.state.auth_service.create_credential(&ctx, "alice", "pw1", None).await.unwrap();

    let user = app.state.auth_service.authenticate("Acme", "alice", "pw1").await.unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.company_name, "Acme");
    assert_eq!(user.company_logo, Some(vec![7, 7]));

    let err = app.state.auth_service.authenticate("Acme", "alice", "wrong").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
}

#[tokio::test]
async fn authentication_is_repeatable() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;
    app.state.auth_service.create_credential(&ctx, "alice", "pw1", None).await.unwrap();

    let first = app.state.auth_service.authenticate("Acme", "alice", "pw1").await.unwrap();
    let _ = app.state.auth_service.authenticate("Acme", "alice", "nope").await.unwrap_err();
    let second = app.state.auth_service.authenticate("Acme", "alice", "pw1").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn password_is_stored_hashed() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;

    let credential = app.state.auth_service.create_credential(&ctx, "alice", "pw1", None).await.unwrap();
    assert_ne!(credential.password_hash, "pw1");
    assert!(credential.password_hash.starts_with("$2"));
}

#[tokio::test]
async fn usernames_are_scoped_per_tenant() {
    let app = spawn_app().await;
    let acme = app.tenant("Acme").await;
    let globex = app.tenant("Globex").await;

    app.state.auth_service.create_credential(&acme, "admin", "acme-pw", None).await.unwrap();
    app.state.auth_service.create_credential(&globex, "admin", "globex-pw", None).await.unwrap();

    assert!(app.state.auth_service.authenticate("Acme", "admin", "acme-pw").await.is_ok());
    assert!(app.state.auth_service.authenticate("Globex", "admin", "globex-pw").await.is_ok());

    let cross = app.state.auth_service.authenticate("Acme", "admin", "globex-pw").await.unwrap_err();
    assert!(matches!(cross, AppError::InvalidCredentials));
}

#[tokio::test]
async fn duplicate_username_in_same_tenant_fails() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;

    app.state.auth_service.create_credential(&ctx, "alice", "pw1", None).await.unwrap();
    let err = app.state.auth_service.create_credential(&ctx, "alice", "pw2", None).await.unwrap_err();
    assert!(matches!(err, AppError::UsernameAlreadyExists(name) if name == "alice"));

    // A senha original continua valendo
    assert!(app.state.auth_service.authenticate("Acme", "alice", "pw1").await.is_ok());
}

#[tokio::test]
async fn unknown_tenant_or_user_is_rejected() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;
    app.state.auth_service.create_credential(&ctx, "alice", "pw1", None).await.unwrap();

    let no_tenant = app.state.auth_service.authenticate("Globex", "alice", "pw1").await.unwrap_err();
    assert!(matches!(no_tenant, AppError::InvalidCredentials));

    let no_user = app.state.auth_service.authenticate("Acme", "bob", "pw1").await.unwrap_err();
    assert!(matches!(no_user, AppError::InvalidCredentials));
}

#[tokio::test]
async fn legacy_hashes_still_authenticate() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;

    // Linha migrada de um banco antigo: SHA-256 puro
    let admin = UserRepository::new()
        .create_credential(ctx.pool(), "admin", &legacy_sha256("1234"), None)
        .await
        .unwrap();

    assert!(app.state.auth_service.authenticate("Acme", "admin", "1234").await.is_ok());
    let err = app.state.auth_service.authenticate("Acme", "admin", "senha_errada").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    // Sem a opção de migração, o hash legado fica como está
    let stored = app.state.auth_service.find_credential(&ctx, admin.id).await.unwrap().unwrap();
    assert_eq!(stored.password_hash, legacy_sha256("1234"));
}

#[tokio::test]
async fn legacy_hashes_are_upgraded_when_enabled() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;
    let legacy = UserRepository::new()
        .create_credential(ctx.pool(), "admin", &legacy_sha256("1234"), None)
        .await
        .unwrap();

    let mut config = test_config(&app.dir);
    config.password_policy.upgrade_legacy_hashes = true;
    let state = app.reopen(config).await;
    let ctx = state.tenant_service.open_tenant("Acme").await.unwrap();

    state.auth_service.authenticate("Acme", "admin", "1234").await.unwrap();

    let upgraded = state.auth_service.find_credential(&ctx, legacy.id).await.unwrap().unwrap();
    assert!(upgraded.password_hash.starts_with("$2"));
    assert!(state.auth_service.authenticate("Acme", "admin", "1234").await.is_ok());
}

#[tokio::test]
async fn failed_hash_upgrade_does_not_block_login() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;
    let legacy = UserRepository::new()
        .create_credential(ctx.pool(), "admin", &legacy_sha256("1234"), None)
        .await
        .unwrap();

    // Tabela de usuários somente leitura: a regravação do hash vai falhar
    sqlx::query(
        "CREATE TRIGGER users_read_only BEFORE UPDATE ON users BEGIN SELECT RAISE(ABORT, 'somente leitura'); END",
    )
    .execute(ctx.pool())
    .await
    .unwrap();

    let mut config = test_config(&app.dir);
    config.password_policy.upgrade_legacy_hashes = true;
    let state = app.reopen(config).await;
    let ctx = state.tenant_service.open_tenant("Acme").await.unwrap();

    let user = state.auth_service.authenticate("Acme", "admin", "1234").await.unwrap();
    assert_eq!(user.id, legacy.id);

    let stored = state.auth_service.find_credential(&ctx, legacy.id).await.unwrap().unwrap();
    assert_eq!(stored.password_hash, legacy_sha256("1234"));
}

#[tokio::test]
async fn credential_updates_are_partial() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;
    let auth = &app.state.auth_service;
    let alice = auth.create_credential(&ctx, "alice", "pw1", Some(&[1, 2])).await.unwrap();

    let outcome = auth.update_credential(&ctx, alice.id, CredentialChanges::default()).await.unwrap();
    assert_eq!(outcome, UpdateOutcome::NoFieldsToUpdate);
    let unchanged = auth.find_credential(&ctx, alice.id).await.unwrap().unwrap();
    assert_eq!(unchanged.password_hash, alice.password_hash);
    assert_eq!(unchanged.photo, Some(vec![1, 2]));

    let changes = CredentialChanges {
        password: FieldUpdate::Set("pw2".to_string()),
        photo: FieldUpdate::Clear,
        ..Default::default()
    };
    assert_eq!(auth.update_credential(&ctx, alice.id, changes).await.unwrap(), UpdateOutcome::Applied);

    assert!(auth.authenticate("Acme", "alice", "pw1").await.is_err());
    assert!(auth.authenticate("Acme", "alice", "pw2").await.is_ok());
    assert_eq!(auth.find_credential(&ctx, alice.id).await.unwrap().unwrap().photo, None);
}

#[tokio::test]
async fn username_cannot_be_cleared_or_duplicated() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;
    let auth = &app.state.auth_service;
    auth.create_credential(&ctx, "alice", "pw1", None).await.unwrap();
    let bob = auth.create_credential(&ctx, "bob", "pw1", None).await.unwrap();

    let clear = CredentialChanges { username: FieldUpdate::Clear, ..Default::default() };
    let err = auth.update_credential(&ctx, bob.id, clear).await.unwrap_err();
    assert!(matches!(err, AppError::CannotClearRequiredField("username")));

    let rename = CredentialChanges { username: FieldUpdate::Set("alice".to_string()), ..Default::default() };
    let err = auth.update_credential(&ctx, bob.id, rename).await.unwrap_err();
    assert!(matches!(err, AppError::UsernameAlreadyExists(_)));
}

#[tokio::test]
async fn credentials_can_be_listed_and_deleted() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;
    let auth = &app.state.auth_service;
    auth.create_credential(&ctx, "bob", "pw", None).await.unwrap();
    let alice = auth.create_credential(&ctx, "alice", "pw", None).await.unwrap();

    let names: Vec<String> = auth.list_credentials(&ctx).await.unwrap().into_iter().map(|c| c.username).collect();
    assert_eq!(names, vec!["alice", "bob"]);

    auth.delete_credential(&ctx, alice.id).await.unwrap();
    auth.delete_credential(&ctx, alice.id).await.unwrap();
    assert!(auth.find_credential(&ctx, alice.id).await.unwrap().is_none());
    assert!(auth.authenticate("Acme", "alice", "pw").await.is_err());
}
