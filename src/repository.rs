use crate::{
    models::{Category, CategoryChanges, Menu, MenuChanges, NewMenu, NewUser, User},
    ordering::{self, Ranked, ReorderPlan, ReorderPolicy},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use std::{collections::BTreeMap, sync::Arc};
use thiserror::Error;
use tokio::sync::RwLock;

/// Persistence failures surfaced to the handlers.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Unique constraint on `users.nickname` rejected the insert.
    #[error("nickname is already taken")]
    DuplicateNickname,
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The persistence gateway. Handlers only see this trait, so the Postgres store
/// and the in-memory store are interchangeable.
///
/// Update methods take the reorder policy and return the executed
/// [`ReorderPlan`], or `None` when the target row does not exist. Implementations
/// must run the lookup of the current row, the lookup of the sibling holding
/// the requested order, and all resulting writes as one atomic unit.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>>;
    async fn find_user_by_nickname(&self, nickname: &str) -> RepoResult<Option<User>>;
    // Fails with `DuplicateNickname` when the nickname is taken.
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;

    // --- Categories ---
    // Assigns `max(order) + 1` across all categories.
    async fn create_category(&self, name: String, owner_id: Option<i64>) -> RepoResult<Category>;
    // Highest order first.
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;
    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>>;
    async fn update_category(
        &self,
        id: i64,
        changes: CategoryChanges,
        policy: ReorderPolicy,
    ) -> RepoResult<Option<ReorderPlan>>;
    // Removes the category and its menus. False when it did not exist.
    async fn delete_category(&self, id: i64) -> RepoResult<bool>;

    // --- Menus ---
    // Assigns `max(order) + 1` across all menus. `None` when the category does not exist.
    async fn create_menu(&self, category_id: i64, menu: NewMenu) -> RepoResult<Option<Menu>>;
    // Highest order first.
    async fn list_menus(&self, category_id: i64) -> RepoResult<Vec<Menu>>;
    async fn get_menu(&self, category_id: i64, menu_id: i64) -> RepoResult<Option<Menu>>;
    // The sibling holding the requested order is searched among all menus.
    async fn update_menu(
        &self,
        category_id: i64,
        menu_id: i64,
        changes: MenuChanges,
        policy: ReorderPolicy,
    ) -> RepoResult<Option<ReorderPlan>>;
    async fn delete_menu(&self, category_id: i64, menu_id: i64) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

// --- Postgres ---

const USER_COLUMNS: &str = "user_id, nickname, password, role, created_at";
const CATEGORY_COLUMNS: &str = r#"category_id, user_id, name, "order", created_at, updated_at"#;
const MENU_COLUMNS: &str = r#"menu_id, category_id, name, description, image, price, "order", status, created_at, updated_at"#;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Order assignment and reordering run in
/// transactions with row or table locks so concurrent updates cannot leave two
/// rows holding the same order.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations under `./migrations`.
    pub async fn migrate(&self) -> RepoResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn apply_moves(
        tx: &mut Transaction<'_, Postgres>,
        sql: &str,
        plan: &ReorderPlan,
    ) -> RepoResult<()> {
        for mv in &plan.moves {
            sqlx::query(sql)
                .bind(mv.id)
                .bind(mv.order)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }
}

/// Separates the target row from the lowest-id other row holding `requested`.
/// `None` when the target row was not among the locked rows.
fn split_locked(rows: &[Ranked], id: i64, requested: i32) -> Option<(Ranked, Option<Ranked>)> {
    let current = rows.iter().copied().find(|row| row.id == id)?;
    let holder = rows
        .iter()
        .copied()
        .find(|row| row.id != id && row.order == requested);
    Some((current, holder))
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_nickname(&self, nickname: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE nickname = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(nickname)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// create_user
    ///
    /// Relies on the unique index for the final duplicate check: a concurrent
    /// sign-up that slipped past the handler's lookup surfaces as `DuplicateNickname`.
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO users (nickname, password, role) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.nickname)
            .bind(user.password)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    RepositoryError::DuplicateNickname
                }
                _ => RepositoryError::Database(e),
            })
    }

    async fn create_category(&self, name: String, owner_id: Option<i64>) -> RepoResult<Category> {
        let mut tx = self.pool.begin().await?;
        // Serializes order assignment between concurrent creates; reads stay unblocked.
        sqlx::query("LOCK TABLE categories IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;
        let max: Option<i32> = sqlx::query_scalar(r#"SELECT MAX("order") FROM categories"#)
            .fetch_one(&mut *tx)
            .await?;

        let sql = format!(
            r#"INSERT INTO categories (user_id, name, "order") VALUES ($1, $2, $3) RETURNING {CATEGORY_COLUMNS}"#
        );
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(owner_id)
            .bind(name)
            .bind(ordering::next_order(max))
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(category)
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let sql = format!(
            r#"SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY "order" DESC, category_id ASC"#
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE category_id = $1");
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_category(
        &self,
        id: i64,
        changes: CategoryChanges,
        policy: ReorderPolicy,
    ) -> RepoResult<Option<ReorderPlan>> {
        let mut tx = self.pool.begin().await?;

        // The row and the current holder of the requested order are locked in
        // one statement, in id order, so opposite concurrent swaps cannot deadlock.
        let locked = sqlx::query_as::<_, Ranked>(
            r#"SELECT category_id AS id, "order" FROM categories
               WHERE category_id = $1 OR "order" = $2
               ORDER BY category_id FOR UPDATE"#,
        )
        .bind(id)
        .bind(changes.order)
        .fetch_all(&mut *tx)
        .await?;
        let Some((current, holder)) = split_locked(&locked, id, changes.order) else {
            return Ok(None);
        };

        let plan = ordering::plan_reorder(current, changes.order, holder, policy);

        if plan.apply_fields {
            sqlx::query("UPDATE categories SET name = $2, updated_at = NOW() WHERE category_id = $1")
                .bind(id)
                .bind(&changes.name)
                .execute(&mut *tx)
                .await?;
        }
        Self::apply_moves(
            &mut tx,
            r#"UPDATE categories SET "order" = $2, updated_at = NOW() WHERE category_id = $1"#,
            &plan,
        )
        .await?;

        tx.commit().await?;
        Ok(Some(plan))
    }

    async fn delete_category(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE category_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_menu(&self, category_id: i64, menu: NewMenu) -> RepoResult<Option<Menu>> {
        let mut tx = self.pool.begin().await?;

        // Keeps the parent row alive until the insert commits.
        let exists: Option<i64> = sqlx::query_scalar(
            "SELECT category_id FROM categories WHERE category_id = $1 FOR SHARE",
        )
        .bind(category_id)
        .fetch_optional(&mut *tx)
        .await?;
        if exists.is_none() {
            return Ok(None);
        }

        sqlx::query("LOCK TABLE menus IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;
        let max: Option<i32> = sqlx::query_scalar(r#"SELECT MAX("order") FROM menus"#)
            .fetch_one(&mut *tx)
            .await?;

        let sql = format!(
            r#"INSERT INTO menus (category_id, name, description, image, price, "order")
               VALUES ($1, $2, $3, $4, $5, $6) RETURNING {MENU_COLUMNS}"#
        );
        let created = sqlx::query_as::<_, Menu>(&sql)
            .bind(category_id)
            .bind(menu.name)
            .bind(menu.description)
            .bind(menu.image)
            .bind(menu.price)
            .bind(ordering::next_order(max))
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(created))
    }

    async fn list_menus(&self, category_id: i64) -> RepoResult<Vec<Menu>> {
        let sql = format!(
            r#"SELECT {MENU_COLUMNS} FROM menus WHERE category_id = $1 ORDER BY "order" DESC, menu_id ASC"#
        );
        Ok(sqlx::query_as::<_, Menu>(&sql)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_menu(&self, category_id: i64, menu_id: i64) -> RepoResult<Option<Menu>> {
        let sql = format!("SELECT {MENU_COLUMNS} FROM menus WHERE menu_id = $1 AND category_id = $2");
        Ok(sqlx::query_as::<_, Menu>(&sql)
            .bind(menu_id)
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_menu(
        &self,
        category_id: i64,
        menu_id: i64,
        changes: MenuChanges,
        policy: ReorderPolicy,
    ) -> RepoResult<Option<ReorderPlan>> {
        let mut tx = self.pool.begin().await?;

        // Same single-statement locking as categories. Without a requested
        // order only the row itself is locked.
        let locked = sqlx::query_as::<_, Ranked>(
            r#"SELECT menu_id AS id, "order" FROM menus
               WHERE (menu_id = $1 AND category_id = $2)
                  OR ($3::INTEGER IS NOT NULL AND "order" = $3)
               ORDER BY menu_id FOR UPDATE"#,
        )
        .bind(menu_id)
        .bind(category_id)
        .bind(changes.order)
        .fetch_all(&mut *tx)
        .await?;
        let Some(own) = locked.iter().find(|row| row.id == menu_id) else {
            return Ok(None);
        };
        let requested = changes.order.unwrap_or(own.order);
        let Some((current, holder)) = split_locked(&locked, menu_id, requested) else {
            return Ok(None);
        };

        let plan = ordering::plan_reorder(current, requested, holder, policy);

        if plan.apply_fields {
            sqlx::query(
                r#"UPDATE menus
                   SET name = $2,
                       description = $3,
                       price = COALESCE($4, price),
                       status = COALESCE($5, status),
                       updated_at = NOW()
                   WHERE menu_id = $1"#,
            )
            .bind(menu_id)
            .bind(&changes.name)
            .bind(&changes.description)
            .bind(changes.price)
            .bind(changes.status)
            .execute(&mut *tx)
            .await?;
        }
        Self::apply_moves(
            &mut tx,
            r#"UPDATE menus SET "order" = $2, updated_at = NOW() WHERE menu_id = $1"#,
            &plan,
        )
        .await?;

        tx.commit().await?;
        Ok(Some(plan))
    }

    async fn delete_menu(&self, category_id: i64, menu_id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM menus WHERE menu_id = $1 AND category_id = $2")
            .bind(menu_id)
            .bind(category_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// --- In-Memory ---

#[derive(Default)]
struct MemoryStore {
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    menus: BTreeMap<i64, Menu>,
    next_user_id: i64,
    next_category_id: i64,
    next_menu_id: i64,
}

impl MemoryStore {
    fn allocate(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// InMemoryRepository
///
/// `Repository` kept in process behind a single `RwLock`. Every write, including
/// a whole reorder, happens under one write guard, which gives the same
/// atomicity as the Postgres transactions. Used by the test-suite and by the
/// `memory` storage backend.
#[derive(Default)]
pub struct InMemoryRepository {
    store: RwLock<MemoryStore>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_order_desc<T>(items: &mut [T], key: impl Fn(&T) -> (i32, i64)) {
    items.sort_by(|a, b| {
        let (order_a, id_a) = key(a);
        let (order_b, id_b) = key(b);
        order_b.cmp(&order_a).then(id_a.cmp(&id_b))
    });
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self.store.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_nickname(&self, nickname: &str) -> RepoResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.values().find(|u| u.nickname == nickname).cloned())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut store = self.store.write().await;
        if store.users.values().any(|u| u.nickname == user.nickname) {
            return Err(RepositoryError::DuplicateNickname);
        }
        let user_id = MemoryStore::allocate(&mut store.next_user_id);
        let created = User {
            user_id,
            nickname: user.nickname,
            password: user.password,
            role: user.role,
            created_at: Utc::now(),
        };
        store.users.insert(user_id, created.clone());
        Ok(created)
    }

    async fn create_category(&self, name: String, owner_id: Option<i64>) -> RepoResult<Category> {
        let mut store = self.store.write().await;
        let order = ordering::next_order(store.categories.values().map(|c| c.order).max());
        let category_id = MemoryStore::allocate(&mut store.next_category_id);
        let now = Utc::now();
        let created = Category {
            category_id,
            user_id: owner_id,
            name,
            order,
            created_at: now,
            updated_at: now,
        };
        store.categories.insert(category_id, created.clone());
        Ok(created)
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut categories: Vec<Category> =
            self.store.read().await.categories.values().cloned().collect();
        by_order_desc(&mut categories, |c| (c.order, c.category_id));
        Ok(categories)
    }

    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>> {
        Ok(self.store.read().await.categories.get(&id).cloned())
    }

    async fn update_category(
        &self,
        id: i64,
        changes: CategoryChanges,
        policy: ReorderPolicy,
    ) -> RepoResult<Option<ReorderPlan>> {
        let mut store = self.store.write().await;
        let Some(current) = store.categories.get(&id).map(|c| Ranked {
            id: c.category_id,
            order: c.order,
        }) else {
            return Ok(None);
        };

        let holder = store
            .categories
            .values()
            .find(|c| c.order == changes.order && c.category_id != id)
            .map(|c| Ranked {
                id: c.category_id,
                order: c.order,
            });

        let plan = ordering::plan_reorder(current, changes.order, holder, policy);
        let now = Utc::now();

        if plan.apply_fields {
            if let Some(category) = store.categories.get_mut(&id) {
                category.name = changes.name;
                category.updated_at = now;
            }
        }
        for mv in &plan.moves {
            if let Some(category) = store.categories.get_mut(&mv.id) {
                category.order = mv.order;
                category.updated_at = now;
            }
        }
        Ok(Some(plan))
    }

    async fn delete_category(&self, id: i64) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        let removed = store.categories.remove(&id).is_some();
        if removed {
            store.menus.retain(|_, m| m.category_id != id);
        }
        Ok(removed)
    }

    async fn create_menu(&self, category_id: i64, menu: NewMenu) -> RepoResult<Option<Menu>> {
        let mut store = self.store.write().await;
        if !store.categories.contains_key(&category_id) {
            return Ok(None);
        }
        let order = ordering::next_order(store.menus.values().map(|m| m.order).max());
        let menu_id = MemoryStore::allocate(&mut store.next_menu_id);
        let now = Utc::now();
        let created = Menu {
            menu_id,
            category_id,
            name: menu.name,
            description: menu.description,
            image: menu.image,
            price: menu.price,
            order,
            status: Default::default(),
            created_at: now,
            updated_at: now,
        };
        store.menus.insert(menu_id, created.clone());
        Ok(Some(created))
    }

    async fn list_menus(&self, category_id: i64) -> RepoResult<Vec<Menu>> {
        let mut menus: Vec<Menu> = self
            .store
            .read()
            .await
            .menus
            .values()
            .filter(|m| m.category_id == category_id)
            .cloned()
            .collect();
        by_order_desc(&mut menus, |m| (m.order, m.menu_id));
        Ok(menus)
    }

    async fn get_menu(&self, category_id: i64, menu_id: i64) -> RepoResult<Option<Menu>> {
        let store = self.store.read().await;
        Ok(store
            .menus
            .get(&menu_id)
            .filter(|m| m.category_id == category_id)
            .cloned())
    }

    async fn update_menu(
        &self,
        category_id: i64,
        menu_id: i64,
        changes: MenuChanges,
        policy: ReorderPolicy,
    ) -> RepoResult<Option<ReorderPlan>> {
        let mut store = self.store.write().await;
        let Some(current) = store
            .menus
            .get(&menu_id)
            .filter(|m| m.category_id == category_id)
            .map(|m| Ranked {
                id: m.menu_id,
                order: m.order,
            })
        else {
            return Ok(None);
        };

        let requested = changes.order.unwrap_or(current.order);
        let holder = store
            .menus
            .values()
            .find(|m| m.order == requested && m.menu_id != menu_id)
            .map(|m| Ranked {
                id: m.menu_id,
                order: m.order,
            });

        let plan = ordering::plan_reorder(current, requested, holder, policy);
        let now = Utc::now();

        if plan.apply_fields {
            if let Some(menu) = store.menus.get_mut(&menu_id) {
                menu.name = changes.name;
                menu.description = changes.description;
                if let Some(price) = changes.price {
                    menu.price = price;
                }
                if let Some(status) = changes.status {
                    menu.status = status;
                }
                menu.updated_at = now;
            }
        }
        for mv in &plan.moves {
            if let Some(menu) = store.menus.get_mut(&mv.id) {
                menu.order = mv.order;
                menu.updated_at = now;
            }
        }
        Ok(Some(plan))
    }

    async fn delete_menu(&self, category_id: i64, menu_id: i64) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        let owned = store
            .menus
            .get(&menu_id)
            .is_some_and(|m| m.category_id == category_id);
        if owned {
            store.menus.remove(&menu_id);
        }
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROWS: [Ranked; 3] = [
        Ranked { id: 1, order: 3 },
        Ranked { id: 2, order: 1 },
        Ranked { id: 5, order: 1 },
    ];

    #[test]
    fn split_locked_picks_target_and_lowest_id_holder() {
        let (current, holder) = split_locked(&ROWS, 1, 1).unwrap();
        assert_eq!(current, ROWS[0]);
        assert_eq!(holder, Some(ROWS[1]));
    }

    #[test]
    fn split_locked_without_target_is_none() {
        assert!(split_locked(&ROWS[1..], 1, 1).is_none());
    }

    #[test]
    fn split_locked_ignores_target_as_its_own_holder() {
        let (_, holder) = split_locked(&ROWS[..1], 1, 3).unwrap();
        assert_eq!(holder, None);
    }
}
