mod common;

use common::spawn_app;
use vendapro::{
    AppError,
    models::{
        crm::{ContactChanges, EmployeeChanges, NewContact, NewEmployee},
        update::{FieldUpdate, UpdateOutcome},
    },
};

fn contact(name: &str) -> NewContact {
    NewContact {
        name: name.to_string(),
        email: Some(format!("{}@exemplo.com", name.to_lowercase())),
        phone: Some("(11) 99999-8888".to_string()),
        address: Some("Rua das Flores, 123".to_string()),
        photo: None,
    }
}

#[tokio::test]
async fn clients_are_listed_newest_first() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;
    let crm = &app.state.crm_service;

    crm.create_client(&ctx, contact("Ana")).await.unwrap();
    crm.create_client(&ctx, contact("Bruno")).await.unwrap();
    crm.create_client(&ctx, contact("Carla")).await.unwrap();

    let names: Vec<String> = crm.list_clients(&ctx).await.unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["Carla", "Bruno", "Ana"]);
}

#[tokio::test]
async fn empty_names_are_the_callers_problem() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;

    let client = app.state.crm_service.create_client(&ctx, NewContact::default()).await.unwrap();
    assert_eq!(client.name, "");
    assert_eq!(client.email, None);
}

#[tokio::test]
async fn update_without_fields_writes_nothing() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;
    let crm = &app.state.crm_service;
    let ana = crm.create_client(&ctx, contact("Ana")).await.unwrap();

    let outcome = crm.update_client(&ctx, ana.id, ContactChanges::default()).await.unwrap();
    assert_eq!(outcome, UpdateOutcome::NoFieldsToUpdate);
    assert_eq!(crm.find_client(&ctx, ana.id).await.unwrap(), Some(ana));
}

#[tokio::test]
async fn empty_string_and_clear_are_different() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;
    let crm = &app.state.crm_service;
    let ana = crm.create_client(&ctx, contact("Ana")).await.unwrap();

    let changes = ContactChanges {
        email: FieldUpdate::Set(String::new()),
        phone: FieldUpdate::Clear,
        ..Default::default()
    };
    assert_eq!(crm.update_client(&ctx, ana.id, changes).await.unwrap(), UpdateOutcome::Applied);

    let updated = crm.find_client(&ctx, ana.id).await.unwrap().unwrap();
    assert_eq!(updated.email, Some(String::new()));
    assert_eq!(updated.phone, None);
    assert_eq!(updated.address, ana.address);
    assert_eq!(updated.name, "Ana");
}

#[tokio::test]
async fn name_cannot_be_cleared() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;
    let crm = &app.state.crm_service;
    let forn = crm.create_supplier(&ctx, contact("Distribuidora")).await.unwrap();

    let changes = ContactChanges { name: FieldUpdate::Clear, ..Default::default() };
    let err = crm.update_supplier(&ctx, forn.id, changes).await.unwrap_err();
    assert!(matches!(err, AppError::CannotClearRequiredField("nome")));
    assert_eq!(crm.find_supplier(&ctx, forn.id).await.unwrap(), Some(forn));
}

#[tokio::test]
async fn updating_a_missing_row_reports_not_found() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;

    let changes = ContactChanges { name: FieldUpdate::Set("X".to_string()), ..Default::default() };
    let outcome = app.state.crm_service.update_client(&ctx, 42, changes).await.unwrap();
    assert_eq!(outcome, UpdateOutcome::NotFound);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;
    let crm = &app.state.crm_service;
    let ana = crm.create_client(&ctx, contact("Ana")).await.unwrap();

    crm.delete_client(&ctx, ana.id).await.unwrap();
    crm.delete_client(&ctx, ana.id).await.unwrap();
    crm.delete_client(&ctx, 999).await.unwrap();
    assert!(crm.list_clients(&ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn employees_carry_a_cargo() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;
    let crm = &app.state.crm_service;

    let input = NewEmployee { contact: contact("Duda"), cargo: Some("Caixa".to_string()) };
    let duda = crm.create_employee(&ctx, input).await.unwrap();
    assert_eq!(duda.cargo.as_deref(), Some("Caixa"));

    let promote = EmployeeChanges { cargo: FieldUpdate::Set("Gerente".to_string()), ..Default::default() };
    assert_eq!(crm.update_employee(&ctx, duda.id, promote).await.unwrap(), UpdateOutcome::Applied);

    let listed = crm.list_employees(&ctx).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].cargo.as_deref(), Some("Gerente"));
    assert_eq!(listed[0].email, duda.email);

    crm.delete_employee(&ctx, duda.id).await.unwrap();
    assert!(crm.find_employee(&ctx, duda.id).await.unwrap().is_none());
}

#[tokio::test]
async fn contacts_do_not_leak_between_tenants() {
    let app = spawn_app().await;
    let acme = app.tenant("Acme").await;
    let globex = app.tenant("Globex").await;
    let crm = &app.state.crm_service;

    crm.create_supplier(&acme, contact("Atacadão")).await.unwrap();
    crm.create_client(&acme, contact("Ana")).await.unwrap();

    assert!(crm.list_suppliers(&globex).await.unwrap().is_empty());
    assert!(crm.list_clients(&globex).await.unwrap().is_empty());
    assert_eq!(crm.list_suppliers(&acme).await.unwrap().len(), 1);
}

#[tokio::test]
async fn photos_round_trip_as_raw_bytes() {
    let app = spawn_app().await;
    let ctx = app.tenant("Acme").await;
    let crm = &app.state.crm_service;

    let mut input = contact("Ana");
    input.photo = Some(vec![0x89, b'P', b'N', b'G']);
    let ana = crm.create_client(&ctx, input).await.unwrap();

    let changes = ContactChanges { photo: FieldUpdate::Clear, ..Default::default() };
    crm.update_client(&ctx, ana.id, changes).await.unwrap();
    assert_eq!(ana.photo, Some(vec![0x89, b'P', b'N', b'G']));
    assert_eq!(crm.find_client(&ctx, ana.id).await.unwrap().unwrap().photo, None);
}
