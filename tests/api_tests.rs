//! HTTP tests for the full application router.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::mocks::{BrokenAuditDb, RecordingEmailSender};
use common::{flows, memory_db, new_account, seed, PASSWORD};
use recuperajud::{
    build_app,
    db::DatabaseClient,
    types::{AccountPatch, AccountStatus, NewAccount, Permission},
    AppState,
};
use rstest::rstest;
use serde_json::{json, Value};
use std::sync::Arc;

const ADMIN: &str = "admin@cnj.jus.br";
const REGIONAL: &str = "regional@trf1.jus.br";
const OPERATOR: &str = "operador@tjum.jus.br";
const FORGOT_MESSAGE: &str =
    "Se o email estiver cadastrado, você receberá um link para redefinir sua senha.";

struct TestApp {
    server: TestServer,
    db: Arc<dyn DatabaseClient>,
    mailbox: RecordingEmailSender,
    admin_id: i64,
    regional_id: i64,
    operator_id: i64,
}

/// Two courts in regions 1 and 2, a national admin, a regional admin of
/// region 1 and an operator of the region 1 court.
async fn setup() -> TestApp {
    let db = memory_db().await;

    let court_one = db
        .create_court("Tribunal Um", "TJUM", Some(1))
        .await
        .expect("court one");
    let court_two = db
        .create_court("Tribunal Dois", "TJDO", Some(2))
        .await
        .expect("court two");
    assert_eq!((court_one.id, court_two.id), (1, 2));

    let admin = seed(
        db.as_ref(),
        new_account(ADMIN, "Administradora", Permission::NationalAdmin),
    )
    .await;
    let regional = seed(
        db.as_ref(),
        NewAccount {
            region_id: Some(1),
            ..new_account(REGIONAL, "Regional Um", Permission::RegionalAdmin)
        },
    )
    .await;
    let operator = seed(
        db.as_ref(),
        NewAccount {
            court_id: Some(court_one.id),
            region_id: Some(1),
            ..new_account(OPERATOR, "Operador Um", Permission::Operator)
        },
    )
    .await;
    seed(
        db.as_ref(),
        NewAccount {
            region_id: Some(2),
            court_id: Some(court_two.id),
            ..new_account("outro@tjdo.jus.br", "Operador Dois", Permission::Operator)
        },
    )
    .await;

    let mailbox = RecordingEmailSender::new();
    let state = AppState {
        db: db.clone(),
        auth: Arc::new(flows(db.clone(), Arc::new(mailbox.clone()))),
    };

    TestApp {
        server: TestServer::new(build_app(state)).expect("Failed to create test server"),
        db,
        mailbox,
        admin_id: admin.id,
        regional_id: regional.id,
        operator_id: operator.id,
    }
}

async fn access_token(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": email, "senha": PASSWORD }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["data"]["accessToken"]
        .as_str()
        .expect("access token in body")
        .to_string()
}

// ============= Public routes =============

#[tokio::test]
async fn test_health() {
    let app = setup().await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_login_envelope() {
    let app = setup().await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": OPERATOR, "senha": PASSWORD }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["user"]["id"], app.operator_id);
    assert_eq!(body["data"]["user"]["email"], OPERATOR);
    assert_eq!(body["data"]["user"]["permissao"], "operador");
    assert_eq!(body["data"]["user"]["cargo"], "servidor");
    assert!(body["data"]["accessToken"].is_string());
    assert!(body["data"]["refreshToken"].is_string());
    assert!(body["data"]["user"].get("senha").is_none());
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let app = setup().await;

    let wrong_password = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": OPERATOR, "senha": "errada123" }))
        .await;
    let unknown_email = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "ninguem@tj.jus.br", "senha": "errada123" }))
        .await;

    wrong_password.assert_status_unauthorized();
    unknown_email.assert_status_unauthorized();
    let a: Value = wrong_password.json();
    let b: Value = unknown_email.json();
    assert_eq!(a, b);
    assert_eq!(a["status"], "error");
    assert_eq!(a["message"], "Email ou senha incorretos");
}

#[tokio::test]
async fn test_login_inactive_account() {
    let app = setup().await;
    seed(
        app.db.as_ref(),
        NewAccount {
            status: AccountStatus::Inactive,
            ..new_account("inativo@tj.jus.br", "Inativo", Permission::Operator)
        },
    )
    .await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "inativo@tj.jus.br", "senha": PASSWORD }))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "Usuário inativo. Entre em contato com o administrador."
    );
}

#[rstest]
#[case::empty(json!({}))]
#[case::bad_email(json!({ "email": "not-an-email", "senha": "x" }))]
#[case::missing_password(json!({ "email": OPERATOR }))]
#[tokio::test]
async fn test_login_validation(#[case] payload: Value) {
    let app = setup().await;

    let response = app.server.post("/api/auth/login").json(&payload).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = setup().await;

    let response = app
        .server
        .post("/api/auth/login")
        .content_type("application/json")
        .bytes("{\"email\":".into())
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_cors_and_body_limit() {
    let app = setup().await;

    let response = app
        .server
        .get("/health")
        .add_header("Origin", "https://app.recuperajud.test")
        .await;
    response.assert_status_ok();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    let oversized = format!(
        "{{\"email\":\"{}\",\"senha\":\"{}\"}}",
        "a".repeat(recuperajud::MAX_BODY_BYTES),
        PASSWORD
    );
    let response = app
        .server
        .post("/api/auth/login")
        .content_type("application/json")
        .bytes(oversized.into())
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_refresh_token_endpoint() {
    let app = setup().await;
    let login: Value = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": ADMIN, "senha": PASSWORD }))
        .await
        .json();

    let response = app
        .server
        .post("/api/auth/refresh-token")
        .json(&json!({ "refreshToken": login["data"]["refreshToken"] }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["data"]["accessToken"].is_string());
    assert!(body["data"]["refreshToken"].is_string());

    let response = app
        .server
        .post("/api/auth/refresh-token")
        .json(&json!({ "refreshToken": login["data"]["accessToken"] }))
        .await;
    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["message"], "Token inválido ou expirado");
}

#[tokio::test]
async fn test_validate_token_endpoint() {
    let app = setup().await;
    let token = access_token(&app.server, REGIONAL).await;

    let response = app
        .server
        .get("/api/auth/validate-token")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["user"]["id"], app.regional_id);
    assert_eq!(body["data"]["user"]["regiaoId"], 1);

    let response = app.server.get("/api/auth/validate-token").await;
    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["message"], "Token não fornecido");
}

#[tokio::test]
async fn test_forgot_password_answers_the_same() {
    let app = setup().await;

    let known = app
        .server
        .post("/api/auth/forgot-password")
        .json(&json!({ "email": OPERATOR }))
        .await;
    let unknown = app
        .server
        .post("/api/auth/forgot-password")
        .json(&json!({ "email": "ninguem@tj.jus.br" }))
        .await;

    known.assert_status_ok();
    unknown.assert_status_ok();
    let a: Value = known.json();
    let b: Value = unknown.json();
    assert_eq!(a, b);
    assert_eq!(a["message"], FORGOT_MESSAGE);
    assert_eq!(app.mailbox.count(), 1);
}

#[tokio::test]
async fn test_reset_password_flow() {
    let app = setup().await;
    app.server
        .post("/api/auth/forgot-password")
        .json(&json!({ "email": OPERATOR }))
        .await
        .assert_status_ok();
    let token = app.mailbox.last_reset_token().expect("token in email");

    let mismatch = app
        .server
        .post("/api/auth/reset-password")
        .json(&json!({ "token": token, "senha": "nova-senha", "confirmarSenha": "outra" }))
        .await;
    mismatch.assert_status_bad_request();
    let body: Value = mismatch.json();
    assert_eq!(body["message"], "As senhas não coincidem");

    let response = app
        .server
        .post("/api/auth/reset-password")
        .json(&json!({ "token": token, "senha": "nova-senha", "confirmarSenha": "nova-senha" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Senha redefinida com sucesso.");

    let replay = app
        .server
        .post("/api/auth/reset-password")
        .json(&json!({ "token": token, "senha": "nova-senha", "confirmarSenha": "nova-senha" }))
        .await;
    replay.assert_status_bad_request();
    let body: Value = replay.json();
    assert_eq!(body["message"], "Token inválido ou expirado");

    app.server
        .post("/api/auth/login")
        .json(&json!({ "email": OPERATOR, "senha": "nova-senha" }))
        .await
        .assert_status_ok();
}

// ============= Authentication gate =============

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = setup().await;

    let response = app.server.get("/api/users/profile").await;
    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["message"], "Token de autenticação não fornecido");

    let response = app
        .server
        .get("/api/users/profile")
        .authorization_bearer("not-a-token")
        .await;
    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["message"], "Token inválido ou expirado");
}

#[tokio::test]
async fn test_deactivated_account_is_turned_away() {
    let app = setup().await;
    let token = access_token(&app.server, OPERATOR).await;

    app.db
        .update_account(
            app.operator_id,
            &AccountPatch {
                status: Some(AccountStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .expect("deactivate");

    let response = app
        .server
        .get("/api/users/profile")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deleted_account_is_turned_away() {
    let app = setup().await;
    let token = access_token(&app.server, OPERATOR).await;

    app.db
        .delete_account(app.operator_id)
        .await
        .expect("delete");

    let response = app
        .server
        .get("/api/users/profile")
        .authorization_bearer(&token)
        .await;
    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["message"], "Usuário não encontrado");
}

#[tokio::test]
async fn test_failing_audit_writes_do_not_block_requests() {
    let inner = memory_db().await;
    seed(
        inner.as_ref(),
        new_account(OPERATOR, "Operador Um", Permission::Operator),
    )
    .await;
    let db: Arc<dyn DatabaseClient> = Arc::new(BrokenAuditDb::new(inner));
    let state = AppState {
        db: db.clone(),
        auth: Arc::new(flows(db, Arc::new(RecordingEmailSender::new()))),
    };
    let server = TestServer::new(build_app(state)).expect("Failed to create test server");

    let token = access_token(&server, OPERATOR).await;

    let response = server
        .get("/api/users/profile")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["user"]["email"], OPERATOR);
}

// ============= Authorization policy =============

#[rstest]
#[case::operator_own_court(OPERATOR, "/api/tribunais/1", StatusCode::OK)]
#[case::operator_other_court(OPERATOR, "/api/tribunais/2", StatusCode::FORBIDDEN)]
#[case::regional_any_court(REGIONAL, "/api/tribunais/2", StatusCode::OK)]
#[case::regional_own_region(REGIONAL, "/api/regioes/1/tribunais", StatusCode::OK)]
#[case::regional_other_region(REGIONAL, "/api/regioes/2/tribunais", StatusCode::FORBIDDEN)]
#[case::operator_region_listing(OPERATOR, "/api/regioes/1/tribunais", StatusCode::FORBIDDEN)]
#[case::admin_any_region(ADMIN, "/api/regioes/2/tribunais", StatusCode::OK)]
#[case::operator_user_listing(OPERATOR, "/api/users", StatusCode::FORBIDDEN)]
#[case::regional_user_listing(REGIONAL, "/api/users", StatusCode::OK)]
#[case::any_role_profile(OPERATOR, "/api/users/profile", StatusCode::OK)]
#[case::bad_scope_id(ADMIN, "/api/regioes/abc/tribunais", StatusCode::BAD_REQUEST)]
#[tokio::test]
async fn test_route_access(#[case] email: &str, #[case] path: &str, #[case] expected: StatusCode) {
    let app = setup().await;
    let token = access_token(&app.server, email).await;

    let response = app.server.get(path).authorization_bearer(&token).await;

    assert_eq!(response.status_code(), expected, "GET {} as {}", path, email);
}

#[tokio::test]
async fn test_operator_without_court_is_denied_court_paths() {
    let app = setup().await;
    seed(
        app.db.as_ref(),
        new_account("sem.tribunal@tjum.jus.br", "Sem Tribunal", Permission::Operator),
    )
    .await;

    let token = access_token(&app.server, "sem.tribunal@tjum.jus.br").await;

    let response = app
        .server
        .get("/api/tribunais/1")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    app.server
        .get("/api/users/profile")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_cross_scope_messages() {
    let app = setup().await;
    let operator = access_token(&app.server, OPERATOR).await;
    let regional = access_token(&app.server, REGIONAL).await;

    let body: Value = app
        .server
        .get("/api/tribunais/2")
        .authorization_bearer(&operator)
        .await
        .json();
    assert_eq!(
        body["message"],
        "Você não tem permissão para acessar recursos de outro tribunal"
    );

    let body: Value = app
        .server
        .get("/api/regioes/2/tribunais")
        .authorization_bearer(&regional)
        .await
        .json();
    assert_eq!(
        body["message"],
        "Você não tem permissão para acessar recursos de outra região"
    );
}

// ============= Courts =============

#[tokio::test]
async fn test_court_listing_and_creation() {
    let app = setup().await;
    let admin = access_token(&app.server, ADMIN).await;
    let regional = access_token(&app.server, REGIONAL).await;
    let operator = access_token(&app.server, OPERATOR).await;

    let body: Value = app
        .server
        .get("/api/tribunais")
        .authorization_bearer(&admin)
        .await
        .json();
    assert_eq!(body["data"]["tribunais"].as_array().map(Vec::len), Some(2));

    let body: Value = app
        .server
        .get("/api/tribunais")
        .authorization_bearer(&regional)
        .await
        .json();
    let courts = body["data"]["tribunais"].as_array().expect("courts");
    assert_eq!(courts.len(), 1);
    assert_eq!(courts[0]["sigla"], "TJUM");

    let response = app
        .server
        .post("/api/tribunais")
        .authorization_bearer(&admin)
        .json(&json!({ "nome": "Tribunal Três", "sigla": "tjtr", "regiaoId": 3 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["tribunal"]["sigla"], "TJTR");
    assert_eq!(body["data"]["tribunal"]["regiaoId"], 3);

    let duplicate = app
        .server
        .post("/api/tribunais")
        .authorization_bearer(&admin)
        .json(&json!({ "nome": "Outro", "sigla": "TJTR" }))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

    let forbidden = app
        .server
        .post("/api/tribunais")
        .authorization_bearer(&operator)
        .json(&json!({ "nome": "Tribunal Quatro", "sigla": "TJQU" }))
        .await;
    assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

    let missing = app
        .server
        .get("/api/tribunais/999")
        .authorization_bearer(&admin)
        .await;
    missing.assert_status_not_found();
}

// ============= Account management =============

#[tokio::test]
async fn test_profile_and_change_password() {
    let app = setup().await;
    let token = access_token(&app.server, OPERATOR).await;

    let response = app
        .server
        .get("/api/users/profile")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["user"]["tribunalId"], 1);
    assert!(body["data"]["user"]["ultimoAcesso"].is_string());

    let response = app
        .server
        .put("/api/users/change-password")
        .authorization_bearer(&token)
        .json(&json!({
            "senhaAtual": "errada123",
            "novaSenha": "nova-senha",
            "confirmarSenha": "nova-senha"
        }))
        .await;
    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["message"], "Senha atual incorreta");

    let response = app
        .server
        .put("/api/users/change-password")
        .authorization_bearer(&token)
        .json(&json!({
            "senhaAtual": PASSWORD,
            "novaSenha": "nova-senha",
            "confirmarSenha": "nova-senha"
        }))
        .await;
    response.assert_status_ok();

    app.server
        .post("/api/auth/login")
        .json(&json!({ "email": OPERATOR, "senha": "nova-senha" }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_update_profile() {
    let app = setup().await;
    let token = access_token(&app.server, OPERATOR).await;

    let response = app
        .server
        .put("/api/users/profile")
        .authorization_bearer(&token)
        .json(&json!({ "nome": "Operador Renomeado", "email": "renomeado@tjum.jus.br" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["user"]["nome"], "Operador Renomeado");
    assert_eq!(body["data"]["user"]["email"], "renomeado@tjum.jus.br");

    let taken = app
        .server
        .put("/api/users/profile")
        .authorization_bearer(&token)
        .json(&json!({ "nome": "Operador", "email": ADMIN }))
        .await;
    assert_eq!(taken.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_regional_admin_sees_only_own_region() {
    let app = setup().await;
    let regional = access_token(&app.server, REGIONAL).await;
    let admin = access_token(&app.server, ADMIN).await;

    let body: Value = app
        .server
        .get("/api/users")
        .authorization_bearer(&regional)
        .await
        .json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["pagination"]["total"], 2);
    assert!(body["data"]["users"]
        .as_array()
        .expect("users")
        .iter()
        .all(|u| u["regiaoId"] == 1));

    // the region filter of a regional admin cannot be widened
    let body: Value = app
        .server
        .get("/api/users?regiao=2")
        .authorization_bearer(&regional)
        .await
        .json();
    assert_eq!(body["pagination"]["total"], 2);

    let body: Value = app
        .server
        .get("/api/users?limit=2&page=2")
        .authorization_bearer(&admin)
        .await
        .json();
    assert_eq!(body["pagination"]["total"], 4);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["results"], 2);

    let outsider = app
        .db
        .find_account_by_email("outro@tjdo.jus.br")
        .await
        .expect("query")
        .expect("account exists");
    let response = app
        .server
        .get(&format!("/api/users/{}", outsider.id))
        .authorization_bearer(&regional)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    app.server
        .get(&format!("/api/users/{}", app.operator_id))
        .authorization_bearer(&regional)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_create_user_rules() {
    let app = setup().await;
    let admin = access_token(&app.server, ADMIN).await;
    let regional = access_token(&app.server, REGIONAL).await;

    let response = app
        .server
        .post("/api/users")
        .authorization_bearer(&admin)
        .json(&json!({
            "nome": "Novo Operador",
            "email": "novo@tjum.jus.br",
            "senha": "segredo1",
            "cargo": "magistrado",
            "permissao": "operador",
            "tribunalId": 1,
            "regiaoId": 1
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["user"]["cargo"], "magistrado");
    assert_eq!(body["data"]["user"]["status"], "ativo");

    let duplicate = app
        .server
        .post("/api/users")
        .authorization_bearer(&admin)
        .json(&json!({
            "nome": "Repetido",
            "email": "novo@tjum.jus.br",
            "senha": "segredo1",
            "cargo": "servidor",
            "permissao": "operador",
            "tribunalId": 1
        }))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

    let other_region = app
        .server
        .post("/api/users")
        .authorization_bearer(&regional)
        .json(&json!({
            "nome": "Fora da Região",
            "email": "fora@tjdo.jus.br",
            "senha": "segredo1",
            "cargo": "servidor",
            "permissao": "operador",
            "tribunalId": 2,
            "regiaoId": 2
        }))
        .await;
    assert_eq!(other_region.status_code(), StatusCode::FORBIDDEN);

    let promote = app
        .server
        .post("/api/users")
        .authorization_bearer(&regional)
        .json(&json!({
            "nome": "Chefe Novo",
            "email": "chefe@trf1.jus.br",
            "senha": "segredo1",
            "cargo": "servidor",
            "permissao": "administrador_nacional",
            "regiaoId": 1
        }))
        .await;
    assert_eq!(promote.status_code(), StatusCode::FORBIDDEN);

    let invalid = app
        .server
        .post("/api/users")
        .authorization_bearer(&admin)
        .json(&json!({
            "nome": "Sem Tribunal",
            "email": "semtribunal@tj.jus.br",
            "senha": "segredo1",
            "cargo": "servidor",
            "permissao": "operador"
        }))
        .await;
    invalid.assert_status_bad_request();
    let body: Value = invalid.json();
    assert_eq!(body["message"], "Tribunal é obrigatório para operadores");
}

#[tokio::test]
async fn test_update_user_rules() {
    let app = setup().await;
    let admin = access_token(&app.server, ADMIN).await;
    let regional = access_token(&app.server, REGIONAL).await;

    let response = app
        .server
        .put(&format!("/api/users/{}", app.operator_id))
        .authorization_bearer(&regional)
        .json(&json!({ "status": "inativo" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["user"]["status"], "inativo");

    let move_region = app
        .server
        .put(&format!("/api/users/{}", app.operator_id))
        .authorization_bearer(&regional)
        .json(&json!({ "regiaoId": 2 }))
        .await;
    assert_eq!(move_region.status_code(), StatusCode::FORBIDDEN);

    let empty = app
        .server
        .put(&format!("/api/users/{}", app.operator_id))
        .authorization_bearer(&admin)
        .json(&json!({}))
        .await;
    empty.assert_status_bad_request();

    let clear_court = app
        .server
        .put(&format!("/api/users/{}", app.operator_id))
        .authorization_bearer(&admin)
        .json(&json!({ "tribunalId": null }))
        .await;
    clear_court.assert_status_ok();
    let body: Value = clear_court.json();
    assert!(body["data"]["user"]["tribunalId"].is_null());
    assert_eq!(body["data"]["user"]["regiaoId"], 1);

    let missing = app
        .server
        .put("/api/users/999")
        .authorization_bearer(&admin)
        .json(&json!({ "nome": "Ninguém" }))
        .await;
    missing.assert_status_not_found();
}

#[tokio::test]
async fn test_delete_user_rules() {
    let app = setup().await;
    let admin = access_token(&app.server, ADMIN).await;
    let regional = access_token(&app.server, REGIONAL).await;

    let response = app
        .server
        .delete(&format!("/api/users/{}", app.operator_id))
        .authorization_bearer(&regional)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app
        .server
        .delete(&format!("/api/users/{}", app.admin_id))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["message"], "Você não pode excluir seu próprio usuário");

    let response = app
        .server
        .delete(&format!("/api/users/{}", app.operator_id))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    app.server
        .get(&format!("/api/users/{}", app.operator_id))
        .authorization_bearer(&admin)
        .await
        .assert_status_not_found();

    let logs = app
        .db
        .list_activity_logs(app.admin_id, 10)
        .await
        .expect("logs");
    assert!(logs
        .iter()
        .any(|l| l.entidade_id == Some(app.operator_id) && l.descricao.starts_with("Exclusão")));
}

#[tokio::test]
async fn test_bad_user_id_is_bad_request() {
    let app = setup().await;
    let admin = access_token(&app.server, ADMIN).await;

    app.server
        .get("/api/users/abc")
        .authorization_bearer(&admin)
        .await
        .assert_status_bad_request();
}
