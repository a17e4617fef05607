use restaurant_catalog::{
    ReorderPolicy,
    models::{CategoryChanges, MenuChanges, MenuStatus, NewMenu, NewUser, Role},
    repository::{InMemoryRepository, PostgresRepository, Repository, RepositoryError},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

fn new_menu(name: &str) -> NewMenu {
    NewMenu {
        name: name.to_string(),
        description: format!("{name} description"),
        image: format!("https://img.example/{name}.png"),
        price: 5000,
    }
}

fn rename(name: &str, order: i32) -> CategoryChanges {
    CategoryChanges {
        name: name.to_string(),
        order,
    }
}

/// Runs the shared contract against any repository. The store must start empty.
async fn exercise_catalog_contract(repo: Arc<dyn Repository>) {
    // Orders start at 1 and grow by one.
    let first = repo.create_category("First".into(), None).await.unwrap();
    let second = repo.create_category("Second".into(), None).await.unwrap();
    assert_eq!(first.order, 1);
    assert_eq!(second.order, 2);

    let listed = repo.list_categories().await.unwrap();
    assert_eq!(listed[0].category_id, second.category_id);

    // Swap with the current holder.
    let plan = repo
        .update_category(first.category_id, rename("First", 2), ReorderPolicy::Preserve)
        .await
        .unwrap()
        .unwrap();
    assert!(plan.swapped());
    let first_row = repo.get_category(first.category_id).await.unwrap().unwrap();
    let second_row = repo.get_category(second.category_id).await.unwrap().unwrap();
    assert_eq!(first_row.order, 2);
    assert_eq!(second_row.order, 1);

    // Missing rows.
    assert!(
        repo.update_category(9999, rename("x", 1), ReorderPolicy::Preserve)
            .await
            .unwrap()
            .is_none()
    );
    assert!(repo.create_menu(9999, new_menu("Ghost")).await.unwrap().is_none());

    // Menu orders are global across categories.
    let a = repo
        .create_menu(first.category_id, new_menu("A"))
        .await
        .unwrap()
        .unwrap();
    let b = repo
        .create_menu(second.category_id, new_menu("B"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a.order, 1);
    assert_eq!(b.order, 2);
    assert_eq!(a.status, MenuStatus::ForSale);

    // Same-order update writes the fields; absent price keeps the stored one.
    let plan = repo
        .update_menu(
            first.category_id,
            a.menu_id,
            MenuChanges {
                name: "A2".into(),
                description: "changed".into(),
                price: None,
                order: None,
                status: Some(MenuStatus::SoldOut),
            },
            ReorderPolicy::Preserve,
        )
        .await
        .unwrap()
        .unwrap();
    assert!(plan.apply_fields);
    let a_row = repo
        .get_menu(first.category_id, a.menu_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a_row.name, "A2");
    assert_eq!(a_row.price, 5000);
    assert_eq!(a_row.status, MenuStatus::SoldOut);

    // Scoped to the category in the path.
    assert!(repo.get_menu(second.category_id, a.menu_id).await.unwrap().is_none());
    assert!(!repo.delete_menu(second.category_id, a.menu_id).await.unwrap());

    // Deleting a category removes its menus.
    assert!(repo.delete_category(first.category_id).await.unwrap());
    assert!(!repo.delete_category(first.category_id).await.unwrap());
    assert!(repo.list_menus(first.category_id).await.unwrap().is_empty());
    assert_eq!(repo.list_menus(second.category_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_in_memory_catalog_contract() {
    exercise_catalog_contract(Arc::new(InMemoryRepository::new())).await;
}

#[tokio::test]
async fn test_in_memory_duplicate_nickname() {
    let repo = InMemoryRepository::new();
    let user = NewUser {
        nickname: "diner01".into(),
        password: "hash".into(),
        role: Role::Customer,
    };
    let created = repo.create_user(user.clone()).await.unwrap();
    assert_eq!(created.user_id, 1);

    let err = repo.create_user(user).await.unwrap_err();
    assert!(matches!(err, RepositoryError::DuplicateNickname));

    let found = repo.find_user_by_nickname("diner01").await.unwrap().unwrap();
    assert_eq!(found.user_id, created.user_id);
    assert!(repo.get_user(99).await.unwrap().is_none());
}

#[tokio::test]
async fn test_in_memory_apply_all_moves_to_free_order() {
    let repo = InMemoryRepository::new();
    let category = repo.create_category("Only".into(), Some(1)).await.unwrap();

    let plan = repo
        .update_category(category.category_id, rename("Moved", 5), ReorderPolicy::ApplyAll)
        .await
        .unwrap()
        .unwrap();
    assert!(!plan.swapped());

    let row = repo.get_category(category.category_id).await.unwrap().unwrap();
    assert_eq!((row.name.as_str(), row.order), ("Moved", 5));
    assert_eq!(row.user_id, Some(1));
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_orders() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let mut handles = Vec::new();
    for i in 0..20 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.create_category(format!("C{i}"), None).await.unwrap().order
        }));
    }
    let mut orders = Vec::new();
    for handle in handles {
        orders.push(handle.await.unwrap());
    }
    orders.sort();
    assert_eq!(orders, (1..=20).collect::<Vec<i32>>());
}

/// Needs a disposable Postgres database:
/// `DATABASE_URL=postgres://... cargo test -- --ignored`
#[tokio::test]
#[ignore]
async fn test_postgres_catalog_contract() {
    dotenv::dotenv().ok();
    let db_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await
        .expect("Failed to connect to Postgres in tests");

    let repo = PostgresRepository::new(pool.clone());
    repo.migrate().await.unwrap();
    sqlx::query("TRUNCATE menus, categories, users RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .unwrap();

    exercise_catalog_contract(Arc::new(repo)).await;
}

/// Opposite swaps racing on the same pair must both commit.
#[tokio::test]
#[ignore]
async fn test_postgres_opposite_swaps_do_not_deadlock() {
    dotenv::dotenv().ok();
    let db_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await
        .expect("Failed to connect to Postgres in tests");

    let repo = PostgresRepository::new(pool.clone());
    repo.migrate().await.unwrap();
    sqlx::query("TRUNCATE menus, categories, users RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .unwrap();

    let repo: Arc<dyn Repository> = Arc::new(repo);
    let a = repo.create_category("A".into(), None).await.unwrap();
    let b = repo.create_category("B".into(), None).await.unwrap();

    let mut handles = Vec::new();
    for round in 0..50 {
        let repo = repo.clone();
        let (id, name, order) = if round % 2 == 0 {
            (a.category_id, "A", 2)
        } else {
            (b.category_id, "B", 2)
        };
        handles.push(tokio::spawn(async move {
            repo.update_category(id, rename(name, order), ReorderPolicy::Preserve)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut orders: Vec<i32> = repo
        .list_categories()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.order)
        .collect();
    orders.sort();
    assert_eq!(orders, vec![1, 2]);
}
