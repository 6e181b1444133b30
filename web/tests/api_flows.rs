//! End-to-end flows over the HTTP surface with in-memory stores.
//!
//! Covered properties:
//! - the banner and health probe are public, everything else wants a
//!   bearer token
//! - quick-added guests and extra companions land already confirmed
//! - confirmation applies the whole selection and reports the group
//!   total, re-confirming included
//! - workbook import creates confirmed rows and skips known cedulas
//! - operator CRUD round-trips without leaking password material
//! - logout kills the token for every later call

#![allow(clippy::unwrap_used, clippy::expect_used)]

use asistencia_auth::AuthService;
use asistencia_auth::mocks::{MockSessionStore, MockUsuarioRepository};
use asistencia_registry::mocks::MockGuestRegistry;
use asistencia_registry::{NuevoAcompanante, NuevoInvitado};
use asistencia_web::{AppState, router};
use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use rust_xlsxwriter::Workbook;
use serde_json::{Value, json};

const OPERADOR: &str = "registrador";
const CLAVE: &str = "clave-segura-1";

type MemoryState = AppState<MockGuestRegistry, MockUsuarioRepository, MockSessionStore>;

fn state() -> MemoryState {
    AppState::new(
        MockGuestRegistry::new(),
        AuthService::new(
            MockUsuarioRepository::default(),
            MockSessionStore::default(),
            chrono::Duration::hours(8),
        ),
    )
}

async fn server_over(state: MemoryState) -> TestServer {
    state
        .auth
        .create_usuario(OPERADOR, "Operadora de Registro", CLAVE)
        .await
        .unwrap();
    TestServer::new(router(state)).unwrap()
}

async fn server() -> TestServer {
    server_over(state()).await
}

async fn login(server: &TestServer) -> String {
    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({ "username": OPERADOR, "password": CLAVE }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["access_token"].as_str().unwrap().to_string()
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

fn draft(nombre: &str, cedula: &str) -> NuevoInvitado {
    NuevoInvitado {
        nombre: nombre.to_string(),
        cedula: cedula.to_string(),
        campana_area: None,
        eps: None,
        sede: None,
    }
}

fn companion_draft(nombre: &str, cedula: &str) -> NuevoAcompanante {
    NuevoAcompanante {
        nombre: nombre.to_string(),
        cedula: cedula.to_string(),
        edad: None,
        parentesco: None,
        eps: None,
    }
}

/// Workbook with every required column; two guests, one companion
/// linked to the first guest by cedula.
fn import_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Invitados").unwrap();
    for (col, name) in (0u16..).zip(["cedula", "nombre", "campana_area", "eps", "sede"]) {
        sheet.write_string(0, col, name).unwrap();
    }
    sheet.write_string(1, 0, "30100100").unwrap();
    sheet.write_string(1, 1, "Ana Pérez").unwrap();
    sheet.write_string(1, 2, "Operaciones").unwrap();
    sheet.write_string(2, 0, "30100200").unwrap();
    sheet.write_string(2, 1, "Carlos Ruiz").unwrap();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Acompanantes").unwrap();
    for (col, name) in (0u16..).zip([
        "cedula",
        "nombre",
        "edad",
        "parentesco",
        "eps_acompanante",
        "cedula_invitado_principal",
    ]) {
        sheet.write_string(0, col, name).unwrap();
    }
    sheet.write_string(1, 0, "30100300").unwrap();
    sheet.write_string(1, 1, "Luisa Pérez").unwrap();
    sheet.write_number(1, 2, 12.0).unwrap();
    sheet.write_string(1, 3, "Hija").unwrap();
    sheet.write_string(1, 5, "30100100").unwrap();

    workbook.save_to_buffer().unwrap()
}

#[tokio::test]
async fn test_banner_and_health_are_public() {
    let server = server().await;

    let banner = server.get("/").await;
    banner.assert_status_ok();
    banner.assert_json(&json!({
        "message": "Sistema de Confirmación de Asistencia API",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
    }));

    let health = server.get("/health").await;
    health.assert_status_ok();
    health.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_api_routes_require_a_token() {
    let server = server().await;

    for (method, path) in [
        ("GET", "/api/v1/search"),
        ("GET", "/api/v1/stats"),
        ("GET", "/api/v1/invitados"),
        ("POST", "/api/v1/confirmar_asistencia"),
        ("GET", "/import/export-template"),
        ("GET", "/api/v1/usuarios/"),
        ("GET", "/api/v1/auth/me"),
    ] {
        let response = match method {
            "GET" => server.get(path).await,
            _ => server.post(path).await,
        };
        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "detail": "Not authenticated" }));
    }
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let server = server().await;

    let response = server
        .get("/api/v1/stats")
        .add_header(header::AUTHORIZATION, bearer("no-es-un-token"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    response.assert_json(&json!({ "detail": "Token inválido" }));
}

#[tokio::test]
async fn test_login_rejects_wrong_credentials() {
    let server = server().await;

    for (username, password) in [(OPERADOR, "equivocada"), ("fantasma", CLAVE)] {
        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "username": username, "password": password }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "detail": "Username o contraseña incorrectos" }));
    }
}

#[tokio::test]
async fn test_quick_add_then_search_shows_confirmed_group() {
    let server = server().await;
    let token = login(&server).await;

    // Act: register a walk-in guest.
    let added = server
        .post("/api/v1/agregar-invitado-rapido")
        .add_query_param("nombre", "Ana María Gómez")
        .add_query_param("cedula", "20200100")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    added.assert_status_ok();
    let body: Value = added.json();
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "Invitado Ana María Gómez agregado y confirmado exitosamente"
    );
    assert_eq!(body["invitado"]["cedula"], "20200100");

    // A name fragment finds her, case-insensitive, already confirmed.
    let found = server
        .get("/api/v1/search")
        .add_query_param("query", "ana maría")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    found.assert_status_ok();
    let result: Value = found.json();
    assert_eq!(result["invitado"]["cedula"], "20200100");
    assert_eq!(result["total_personas"], 1);
    assert_eq!(result["asistencia_confirmada"], true);
}

#[tokio::test]
async fn test_search_miss_is_404_with_spanish_detail() {
    let server = server().await;
    let token = login(&server).await;

    let response = server
        .get("/api/v1/search")
        .add_query_param("query", "nadie")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&json!({
        "detail": "No se encontró ningún invitado con los criterios especificados"
    }));
}

#[tokio::test]
async fn test_confirmation_covers_selection_and_reports_group_total() {
    // Arrange: one pending guest with two pending companions.
    let state = state();
    let invitado = state
        .registry
        .seed_invitado(&draft("Carlos Ruiz", "10100100"), false)
        .unwrap();
    let primera = state
        .registry
        .seed_acompanante(invitado.id, &companion_draft("Lucía Ruiz", "10100200"), false)
        .unwrap();
    let segunda = state
        .registry
        .seed_acompanante(invitado.id, &companion_draft("Elena Ruiz", "10100300"), false)
        .unwrap();
    let server = server_over(state).await;
    let token = login(&server).await;

    // Act: confirm the guest and the first companion only.
    let response = server
        .post("/api/v1/confirmar_asistencia")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "invitado_id": invitado.id.0,
            "acompanantes_ids": [primera.id.0],
        }))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "success": true,
        "message": "Asistencia confirmada para 2 persona(s)",
        "personas_confirmadas": 2,
    }));

    // The group is not fully confirmed yet.
    let found = server
        .get("/api/v1/search")
        .add_query_param("query", "10100100")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    let result: Value = found.json();
    assert_eq!(result["asistencia_confirmada"], false);

    // Act: confirm the remaining companion, no guest in the selection.
    let response = server
        .post("/api/v1/confirmar_asistencia")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "invitado_id": 0,
            "acompanantes_ids": [segunda.id.0],
        }))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "success": true,
        "message": "Asistencia confirmada para 3 persona(s)",
        "personas_confirmadas": 3,
    }));

    // Re-confirming is a no-op with the same report.
    let again = server
        .post("/api/v1/confirmar_asistencia")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "invitado_id": invitado.id.0,
            "acompanantes_ids": [primera.id.0, segunda.id.0],
        }))
        .await;
    again.assert_status_ok();
    let body: Value = again.json();
    assert_eq!(body["personas_confirmadas"], 3);
}

#[tokio::test]
async fn test_add_companion_joins_the_group_confirmed() {
    let state = state();
    let invitado = state
        .registry
        .seed_invitado(&draft("Marta Lopez", "40400100"), true)
        .unwrap();
    let server = server_over(state).await;
    let token = login(&server).await;

    let response = server
        .post("/api/v1/agregar-acompanante-extra")
        .add_query_param("invitado_id", invitado.id.0.to_string())
        .add_query_param("nombre_acompanante", "Julián Lopez")
        .add_query_param("cedula_acompanante", "40400200")
        .add_query_param("edad", "7")
        .add_query_param("parentesco", "Hijo")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "Acompañante Julián Lopez agregado y confirmado exitosamente"
    );
    assert_eq!(body["acompanante"]["invitado_id"], invitado.id.0);

    // The group now counts two, still fully confirmed.
    let found = server
        .get("/api/v1/search")
        .add_query_param("query", "40400100")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    let result: Value = found.json();
    assert_eq!(result["total_personas"], 2);
    assert_eq!(result["asistencia_confirmada"], true);
}

#[tokio::test]
async fn test_duplicate_cedulas_conflict() {
    let server = server().await;
    let token = login(&server).await;

    server
        .post("/api/v1/agregar-invitado-rapido")
        .add_query_param("nombre", "Primera")
        .add_query_param("cedula", "50500100")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .assert_status_ok();

    let repeated = server
        .post("/api/v1/agregar-invitado-rapido")
        .add_query_param("nombre", "Segunda")
        .add_query_param("cedula", "50500100")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;

    repeated.assert_status(StatusCode::CONFLICT);
    repeated.assert_json(&json!({ "detail": "Ya existe un invitado con esta cédula" }));
}

#[tokio::test]
async fn test_stats_track_the_registry() {
    let state = state();
    let confirmado = state
        .registry
        .seed_invitado(&draft("Confirmada", "60600100"), true)
        .unwrap();
    state
        .registry
        .seed_acompanante(confirmado.id, &companion_draft("Pendiente", "60600200"), false)
        .unwrap();
    state
        .registry
        .seed_invitado(&draft("Pendiente Mayor", "60600300"), false)
        .unwrap();
    let server = server_over(state).await;
    let token = login(&server).await;

    let response = server
        .get("/api/v1/stats")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "total_invitados": 2,
        "invitados_confirmados": 1,
        "total_acompanantes": 1,
        "acompanantes_confirmados": 0,
        "total_personas": 3,
        "personas_confirmadas": 1,
    }));
}

#[tokio::test]
async fn test_import_creates_confirmed_rows_and_skips_known_cedulas() {
    let server = server().await;
    let token = login(&server).await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(import_workbook()).file_name("lista.xlsx"),
    );
    let response = server
        .post("/import/import-excel")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .multipart(form)
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "message": "Importación completada exitosamente",
        "invitados_creados": 2,
        "acompanantes_creados": 1,
    }));

    // Imported rows are already confirmed.
    let found = server
        .get("/api/v1/search")
        .add_query_param("query", "30100100")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    let result: Value = found.json();
    assert_eq!(result["total_personas"], 2);
    assert_eq!(result["asistencia_confirmada"], true);

    // A second upload of the same file creates nothing.
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(import_workbook()).file_name("lista.xlsx"),
    );
    let again = server
        .post("/import/import-excel")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .multipart(form)
        .await;
    again.assert_status_ok();
    again.assert_json(&json!({
        "message": "Importación completada exitosamente",
        "invitados_creados": 0,
        "acompanantes_creados": 0,
    }));
}

#[tokio::test]
async fn test_import_rejects_non_excel_uploads() {
    let server = server().await;
    let token = login(&server).await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"cedula,nombre\n1,Ana".to_vec()).file_name("lista.csv"),
    );
    let response = server
        .post("/import/import-excel")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .multipart(form)
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    response.assert_json(&json!({ "detail": "El archivo debe ser un Excel (.xlsx o .xls)" }));
}

#[tokio::test]
async fn test_export_template_is_a_workbook_download() {
    let server = server().await;
    let token = login(&server).await;

    let response = server
        .get("/import/export-template")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=plantilla_invitados.xlsx"
    );
    assert!(!response.as_bytes().is_empty());
}

#[tokio::test]
async fn test_delete_all_wipes_the_registry() {
    let server = server().await;
    let token = login(&server).await;

    for (nombre, cedula) in [("Uno", "70700100"), ("Dos", "70700200")] {
        server
            .post("/api/v1/agregar-invitado-rapido")
            .add_query_param("nombre", nombre)
            .add_query_param("cedula", cedula)
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
    }

    let response = server
        .delete("/api/v1/invitados/eliminar-todos/")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "success": true,
        "message": "Eliminados exitosamente: 2 invitados, 0 acompañantes, 2 logs",
        "deleted": { "invitados": 2, "acompanantes": 0, "logs": 2 },
    }));

    let stats = server
        .get("/api/v1/stats")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    let body: Value = stats.json();
    assert_eq!(body["total_personas"], 0);
}

#[tokio::test]
async fn test_usuarios_crud_roundtrip() {
    let server = server().await;
    let token = login(&server).await;

    // Create.
    let created = server
        .post("/api/v1/usuarios/")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "username": "turno2",
            "nombre_completo": "Operadora Turno Dos",
            "password": "otra-clave-2",
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let usuario: Value = created.json();
    assert_eq!(usuario["username"], "turno2");
    assert!(usuario.get("password").is_none());
    assert!(usuario.get("hashed_password").is_none());
    let id = usuario["id"].as_i64().unwrap();

    // The new account can log in.
    server
        .post("/api/v1/auth/login")
        .json(&json!({ "username": "turno2", "password": "otra-clave-2" }))
        .await
        .assert_status_ok();

    // List and get agree.
    let listed = server
        .get("/api/v1/usuarios/")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    listed.assert_status_ok();
    let usuarios: Value = listed.json();
    assert_eq!(usuarios.as_array().unwrap().len(), 2);

    let fetched = server
        .get(&format!("/api/v1/usuarios/{id}"))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    fetched.assert_status_ok();

    // Update with a new password.
    let updated = server
        .put(&format!("/api/v1/usuarios/{id}"))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "username": "turno2",
            "nombre_completo": "Operadora Nocturna",
            "password": "clave-nueva-3",
        }))
        .await;
    updated.assert_status_ok();
    let usuario: Value = updated.json();
    assert_eq!(usuario["nombre_completo"], "Operadora Nocturna");

    server
        .post("/api/v1/auth/login")
        .json(&json!({ "username": "turno2", "password": "clave-nueva-3" }))
        .await
        .assert_status_ok();

    // Delete; the id is gone afterwards.
    let deleted = server
        .delete(&format!("/api/v1/usuarios/{id}"))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    deleted.assert_status(StatusCode::NO_CONTENT);

    let missing = server
        .get(&format!("/api/v1/usuarios/{id}"))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    missing.assert_status(StatusCode::NOT_FOUND);
    missing.assert_json(&json!({ "detail": "Usuario no encontrado" }));
}

#[tokio::test]
async fn test_duplicate_username_is_409() {
    let server = server().await;
    let token = login(&server).await;

    let response = server
        .post("/api/v1/usuarios/")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "username": OPERADOR,
            "nombre_completo": "Clon",
            "password": "cualquiera-1",
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    response.assert_json(&json!({ "detail": "El nombre de usuario ya existe" }));
}

#[tokio::test]
async fn test_me_verify_logout_lifecycle() {
    let server = server().await;
    let token = login(&server).await;

    let me = server
        .get("/api/v1/auth/me")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    me.assert_status_ok();
    let body: Value = me.json();
    assert_eq!(body["username"], OPERADOR);
    assert!(body.get("hashed_password").is_none());

    let verify = server
        .post("/api/v1/auth/verify")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    verify.assert_status_ok();
    let body: Value = verify.json();
    assert_eq!(body["valid"], true);
    assert_eq!(body["user"]["username"], OPERADOR);

    let logout = server
        .post("/api/v1/auth/logout")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    logout.assert_status_ok();
    logout.assert_json(&json!({
        "success": true,
        "message": "Sesión cerrada exitosamente",
    }));

    // The token is dead from here on.
    let after = server
        .get("/api/v1/auth/me")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    after.assert_status(StatusCode::UNAUTHORIZED);
    after.assert_json(&json!({ "detail": "Token inválido" }));
}

#[tokio::test]
async fn test_responses_carry_a_correlation_id() {
    let server = server().await;

    let response = server.get("/health").await;

    let correlation = response.headers()["X-Correlation-ID"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(correlation).is_ok());
}
