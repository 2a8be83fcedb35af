//! Boots the RBAC stack from a YAML config file and drives guarded routes

use anyhow::Result;
use axum::{body::Body, middleware, routing::get, Router};
use http::{Request, StatusCode};
use internpro_config::{ConfigLoader, InternproConfig};
use internpro_logging::init_logging;
use internpro_rbac::models::MenuPermissionRequest;
use internpro_rbac::{ensure_super_admin, seed_initial_data, AuthContext, RbacConfig, RbacGuard, RbacService};
use internpro_storage::{DatabaseConfig, DatabaseConnection, RepositoryFactory};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

struct Stack {
    _dir: TempDir,
    service: RbacService,
}

async fn boot() -> Result<Stack> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("rbac.db");
    let config_path = dir.path().join("internpro.yaml");

    std::fs::write(
        &config_path,
        format!(
            r#"
database:
  url: "sqlite://{}?mode=rwc"
  max_connections: 4
logging:
  level: debug
  format: compact
rbac:
  cache_enabled: true
  cache_ttl: 30
  operation_timeout: 10
  seed_initial_data: true
"#,
            db_path.display()
        ),
    )?;

    let config: InternproConfig = ConfigLoader::new().from_file(&config_path)?;
    init_logging(&config.logging)?;

    let connection = DatabaseConnection::new(DatabaseConfig::from(&config.database)).await?;
    if config.database.auto_migrate {
        connection.migrate().await?;
    }

    let rbac_config = RbacConfig::from(&config.rbac);
    assert!(rbac_config.enable_cache);

    let service = RbacService::new(&RepositoryFactory::new(connection), rbac_config);
    if config.rbac.seed_initial_data {
        seed_initial_data(&service, Uuid::new_v4()).await?;
    }

    Ok(Stack { _dir: dir, service })
}

fn app(service: &RbacService) -> Router {
    let users = Router::new()
        .route("/users", get(|| async { "users" }))
        .route_layer(middleware::from_fn_with_state(
            Arc::new(service.require_permission("users", "read")),
            RbacGuard::enforce,
        ));

    let admin = Router::new()
        .route("/admin", get(|| async { "admin" }))
        .route_layer(middleware::from_fn_with_state(
            Arc::new(service.require_admin()),
            RbacGuard::enforce,
        ));

    let system = Router::new()
        .route("/system", get(|| async { "system" }))
        .route_layer(middleware::from_fn_with_state(
            Arc::new(service.require_super_admin()),
            RbacGuard::enforce,
        ));

    users.merge(admin).merge(system)
}

async fn status(app: &Router, uri: &str, user_id: Option<Uuid>) -> Result<StatusCode> {
    let mut builder = Request::builder().uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.extension(AuthContext::new(user_id));
    }
    let response = app.clone().oneshot(builder.body(Body::empty())?).await?;
    Ok(response.status())
}

#[tokio::test]
async fn guarded_routes_follow_assignments() -> Result<()> {
    let stack = boot().await?;
    let service = &stack.service;
    let app = app(service);
    let actor = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    assert_eq!(status(&app, "/users", None).await?, StatusCode::UNAUTHORIZED);
    assert_eq!(status(&app, "/users", Some(user_id)).await?, StatusCode::FORBIDDEN);

    // Seeded "user" role gets the seeded read permission
    let role = service
        .roles
        .find_role_by_slug("user")
        .await?
        .ok_or_else(|| anyhow::anyhow!("seeded user role missing"))?;
    let read = service
        .permissions
        .find_permission_by_slug("read-user")
        .await?
        .ok_or_else(|| anyhow::anyhow!("seeded read-user permission missing"))?;
    service
        .assignments
        .assign_permissions_to_role(role.id, &[read.id], actor)
        .await?;
    service.assignments.assign_roles_to_user(user_id, &[role.id], actor).await?;

    assert_eq!(status(&app, "/users", Some(user_id)).await?, StatusCode::OK);
    assert_eq!(status(&app, "/admin", Some(user_id)).await?, StatusCode::FORBIDDEN);

    // Cached decisions are dropped as soon as the grant is revoked
    service.assignments.remove_permissions_from_role(role.id, &[read.id]).await?;
    assert_eq!(status(&app, "/users", Some(user_id)).await?, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn super_admin_bootstrap() -> Result<()> {
    let stack = boot().await?;
    let service = &stack.service;
    let app = app(service);
    let user_id = Uuid::new_v4();

    assert_eq!(status(&app, "/system", Some(user_id)).await?, StatusCode::FORBIDDEN);

    ensure_super_admin(service, user_id).await?;

    assert_eq!(status(&app, "/system", Some(user_id)).await?, StatusCode::OK);
    assert_eq!(status(&app, "/admin", Some(user_id)).await?, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn seeded_menus_reach_the_user() -> Result<()> {
    let stack = boot().await?;
    let service = &stack.service;
    let actor = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    let tree = service.menu_tree.get_menu_tree().await?;
    assert_eq!(tree.len(), 4);

    let role = service
        .roles
        .find_role_by_slug("admin")
        .await?
        .ok_or_else(|| anyhow::anyhow!("seeded admin role missing"))?;
    let grants: Vec<MenuPermissionRequest> = tree.iter().map(|menu| MenuPermissionRequest::full(menu.id)).collect();
    service.assignments.assign_menus_to_role(role.id, &grants, actor).await?;
    service.assignments.assign_roles_to_user(user_id, &[role.id], actor).await?;

    let accessible = service.menu_tree.get_user_accessible_menus(user_id).await?;
    let names: Vec<&str> = accessible.iter().map(|grant| grant.menu.name.as_str()).collect();
    assert_eq!(names, vec!["Dashboard", "Users", "Roles", "Permissions"]);
    Ok(())
}
