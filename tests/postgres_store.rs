//! Store tests against a real database. Run with
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

use chrono::{Duration, Utc};
use dotenv::dotenv;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

use taskdesk::models::{NewUser, SessionRecord, Task, TaskChanges, TaskStatus, User};
use taskdesk::store::{CredentialStore, PgStore, SessionStore, StoreError, TaskStore};

async fn connect() -> PgStore {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let store = PgStore::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    store.migrate().await.expect("Failed to run migrations");
    store
}

async fn create_user(store: &PgStore) -> User {
    let username = format!("pg_{}", &Uuid::new_v4().simple().to_string()[..12]);
    store
        .insert_user(NewUser {
            email: format!("{}@example.com", username),
            username,
            password_hash: "not-a-real-hash".to_string(),
        })
        .await
        .expect("insert user")
}

async fn cleanup_user(store: &PgStore, user: &User) {
    let _ = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id)
        .execute(store.pool())
        .await;
}

fn task_for(user: &User, title: &str) -> Task {
    Task {
        id: Uuid::new_v4(),
        user_id: user.id,
        title: title.to_string(),
        description: "description".to_string(),
        due_date: None,
        status: TaskStatus::Pending,
        created_at: Utc::now(),
    }
}

#[ignore]
#[actix_rt::test]
async fn test_duplicate_username_is_rejected() {
    let store = connect().await;
    let user = create_user(&store).await;

    let again = store
        .insert_user(NewUser {
            username: user.username.clone(),
            email: "other@x.com".to_string(),
            password_hash: "x".to_string(),
        })
        .await;
    assert!(matches!(again, Err(StoreError::Duplicate(_))));

    let found = store.find_user_by_username(&user.username).await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));

    cleanup_user(&store, &user).await;
}

#[ignore]
#[actix_rt::test]
async fn test_task_rows_are_owner_scoped() {
    let store = connect().await;
    let owner = create_user(&store).await;
    let other = create_user(&store).await;

    let task = store.insert_task(task_for(&owner, "owned")).await.unwrap();
    assert!(store.list_tasks(other.id).await.unwrap().is_empty());

    let changes = TaskChanges {
        title: "changed".to_string(),
        description: "changed".to_string(),
        due_date: None,
        status: None,
    };
    assert!(!store.update_task(other.id, task.id, &changes).await.unwrap());
    assert!(store.update_task(owner.id, task.id, &changes).await.unwrap());
    assert!(store
        .set_task_status(owner.id, task.id, TaskStatus::InProgress)
        .await
        .unwrap());

    let listed = store.list_tasks(owner.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "changed");
    assert_eq!(listed[0].status, TaskStatus::InProgress);

    assert!(!store.delete_task(other.id, task.id).await.unwrap());
    assert!(store.delete_task(owner.id, task.id).await.unwrap());

    cleanup_user(&store, &owner).await;
    cleanup_user(&store, &other).await;
}

#[ignore]
#[actix_rt::test]
async fn test_sessions_expire_and_cascade() {
    let store = connect().await;
    let user = create_user(&store).await;

    let live = SessionRecord {
        token_hash: Uuid::new_v4().to_string(),
        user_id: Some(user.id),
        state: HashMap::from([("user_id".to_string(), json!(user.id))]),
        expires_at: Utc::now() + Duration::hours(1),
    };
    let stale = SessionRecord {
        token_hash: Uuid::new_v4().to_string(),
        expires_at: Utc::now() - Duration::hours(1),
        ..live.clone()
    };
    store.save_session(&live).await.unwrap();
    store.save_session(&stale).await.unwrap();

    let loaded = store.load_session(&live.token_hash).await.unwrap().expect("live session");
    assert_eq!(loaded.state, live.state);
    assert!(store.load_session(&stale.token_hash).await.unwrap().is_none());
    assert!(store.purge_expired_sessions().await.unwrap() >= 1);

    cleanup_user(&store, &user).await;
    assert!(store.load_session(&live.token_hash).await.unwrap().is_none());
}
