use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::{
    Bookmark, CartEntry, Class, ClassQueryParams, GatewayTransaction, NewBookmarkRequest,
    NewClassRequest, NewUserRequest, PaymentFilter, PaymentRecord, Role, User,
};

const USER_COLUMNS: &str = "id, email, name, photo_url, role, created_at";

const CLASS_COLUMNS: &str = "id, title, image_url, instructor_email, instructor_name, price, \
     currency, available_seats, seats_enrolled, status, created_at";

const CART_COLUMNS: &str = "id, student_email, class_id, title, image_url, instructor_email, \
     instructor_name, price, currency, created_at";

const PAYMENT_COLUMNS: &str = "id, student_email, class_id, class_title, amount, currency, \
     method, transaction_id, created_at";

const GATEWAY_COLUMNS: &str = "transaction_id, cart_entry_id, class_id, student_email, \
     class_info, amount, currency, paid_status, created_at, paid_at";

const BOOKMARK_COLUMNS: &str = "id, student_email, student_name, class_id, class_title, \
     class_image_url, instructor_email, instructor_name, price, created_at";

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn now() -> String {
    Utc::now().to_rfc3339()
}

pub async fn fetch_users(db: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
    ))
    .fetch_all(db)
    .await
}

pub async fn fetch_users_by_role(db: &SqlitePool, role: Role) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE role = ? ORDER BY created_at DESC"
    ))
    .bind(role.as_str())
    .fetch_all(db)
    .await
}

pub async fn find_user_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(db)
        .await
}

/// Inserts the user unless the email is already registered. Returns `None`
/// for an existing email.
pub async fn insert_user_if_absent(
    db: &SqlitePool,
    req: NewUserRequest,
) -> Result<Option<User>, sqlx::Error> {
    let user = User {
        id: new_id(),
        email: req.email,
        name: req.name,
        photo_url: req.photo_url,
        role: Role::None,
        created_at: now(),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO users (id, email, name, photo_url, role, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.photo_url)
    .bind(user.role.as_str())
    .bind(&user.created_at)
    .execute(db)
    .await?;

    Ok((result.rows_affected() > 0).then_some(user))
}

pub async fn update_user_role(
    db: &SqlitePool,
    id: &str,
    role: Role,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET role = ? WHERE id = ? RETURNING {USER_COLUMNS}"
    ))
    .bind(role.as_str())
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn delete_user(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_classes(
    db: &SqlitePool,
    params: &ClassQueryParams,
) -> Result<Vec<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!(
        r#"
        SELECT {CLASS_COLUMNS}
        FROM classes
        WHERE (?1 IS NULL OR instructor_email = ?1)
          AND (?2 IS NULL OR status = ?2)
        ORDER BY created_at DESC
        "#
    ))
    .bind(&params.instructor_email)
    .bind(params.status.map(|s| s.as_str()))
    .fetch_all(db)
    .await
}

pub async fn find_class(db: &SqlitePool, id: &str) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!("SELECT {CLASS_COLUMNS} FROM classes WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert_class(
    db: &SqlitePool,
    instructor_email: &str,
    req: NewClassRequest,
) -> Result<Class, sqlx::Error> {
    let class = Class {
        id: new_id(),
        title: req.title,
        image_url: req.image_url,
        instructor_email: instructor_email.to_string(),
        instructor_name: req.instructor_name,
        price: req.price,
        currency: req.currency,
        available_seats: req.available_seats,
        seats_enrolled: 0,
        status: crate::models::ClassStatus::Pending,
        created_at: now(),
    };

    sqlx::query(
        r#"
        INSERT INTO classes
            (id, title, image_url, instructor_email, instructor_name, price, currency,
            available_seats, seats_enrolled, status, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10)
        "#,
    )
    .bind(&class.id)
    .bind(&class.title)
    .bind(&class.image_url)
    .bind(&class.instructor_email)
    .bind(&class.instructor_name)
    .bind(class.price)
    .bind(&class.currency)
    .bind(class.available_seats)
    .bind(class.status.as_str())
    .bind(&class.created_at)
    .execute(db)
    .await?;

    Ok(class)
}

/// Moves a class to `accepted`. Accepting an accepted class leaves it as is.
pub async fn accept_class(db: &SqlitePool, id: &str) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!(
        "UPDATE classes SET status = 'accepted' WHERE id = ? RETURNING {CLASS_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn delete_class_for_instructor(
    db: &SqlitePool,
    id: &str,
    instructor_email: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM classes WHERE id = ? AND instructor_email = ?")
        .bind(id)
        .bind(instructor_email)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Adds one seat to the enrolled counter in a single statement, so concurrent
/// confirmations never overwrite each other.
pub async fn increment_enrollment<'e, E>(db: E, id: &str) -> Result<Option<Class>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Class>(&format!(
        "UPDATE classes SET seats_enrolled = seats_enrolled + 1 WHERE id = ? RETURNING {CLASS_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn fetch_cart_entries(
    db: &SqlitePool,
    student_email: &str,
) -> Result<Vec<CartEntry>, sqlx::Error> {
    sqlx::query_as::<_, CartEntry>(&format!(
        "SELECT {CART_COLUMNS} FROM selected_classes WHERE student_email = ? ORDER BY created_at DESC"
    ))
    .bind(student_email)
    .fetch_all(db)
    .await
}

pub async fn find_cart_entry(db: &SqlitePool, id: &str) -> Result<Option<CartEntry>, sqlx::Error> {
    sqlx::query_as::<_, CartEntry>(&format!(
        "SELECT {CART_COLUMNS} FROM selected_classes WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Snapshots the stored class into a new cart entry for the student.
pub async fn insert_cart_entry(
    db: &SqlitePool,
    student_email: &str,
    class: &Class,
) -> Result<CartEntry, sqlx::Error> {
    let entry = CartEntry {
        id: new_id(),
        student_email: student_email.to_string(),
        class_id: class.id.clone(),
        title: class.title.clone(),
        image_url: class.image_url.clone(),
        instructor_email: class.instructor_email.clone(),
        instructor_name: class.instructor_name.clone(),
        price: class.price,
        currency: class.currency.clone(),
        created_at: now(),
    };

    sqlx::query(
        r#"
        INSERT INTO selected_classes
            (id, student_email, class_id, title, image_url, instructor_email,
            instructor_name, price, currency, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.student_email)
    .bind(&entry.class_id)
    .bind(&entry.title)
    .bind(&entry.image_url)
    .bind(&entry.instructor_email)
    .bind(&entry.instructor_name)
    .bind(entry.price)
    .bind(&entry.currency)
    .bind(&entry.created_at)
    .execute(db)
    .await?;

    Ok(entry)
}

/// Removes a student's cart entry. An entry owned by someone else counts as
/// missing.
pub async fn delete_cart_entry<'e, E>(
    db: E,
    id: &str,
    student_email: &str,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM selected_classes WHERE id = ? AND student_email = ?")
        .bind(id)
        .bind(student_email)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_payments(
    db: &SqlitePool,
    filter: &PaymentFilter,
) -> Result<Vec<PaymentRecord>, sqlx::Error> {
    sqlx::query_as::<_, PaymentRecord>(&format!(
        r#"
        SELECT {PAYMENT_COLUMNS}
        FROM payments
        WHERE (?1 IS NULL OR student_email = ?1)
          AND (?2 IS NULL OR class_id = ?2)
        ORDER BY created_at DESC
        "#
    ))
    .bind(&filter.student_email)
    .bind(&filter.class_id)
    .fetch_all(db)
    .await
}

pub async fn insert_payment<'e, E>(db: E, payment: &PaymentRecord) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO payments
            (id, student_email, class_id, class_title, amount, currency, method,
            transaction_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.student_email)
    .bind(&payment.class_id)
    .bind(&payment.class_title)
    .bind(payment.amount)
    .bind(&payment.currency)
    .bind(payment.method.as_str())
    .bind(&payment.transaction_id)
    .bind(&payment.created_at)
    .execute(db)
    .await?;
    Ok(())
}

/// Bulk delete by filter. Callers must reject an empty filter.
pub async fn delete_payments(db: &SqlitePool, filter: &PaymentFilter) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM payments
        WHERE (?1 IS NULL OR student_email = ?1)
          AND (?2 IS NULL OR class_id = ?2)
        "#,
    )
    .bind(&filter.student_email)
    .bind(&filter.class_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn insert_gateway_transaction(
    db: &SqlitePool,
    txn: &GatewayTransaction,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO gateway_transactions
            (transaction_id, cart_entry_id, class_id, student_email, class_info,
            amount, currency, paid_status, created_at, paid_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&txn.transaction_id)
    .bind(&txn.cart_entry_id)
    .bind(&txn.class_id)
    .bind(&txn.student_email)
    .bind(txn.class_info.to_string())
    .bind(txn.amount)
    .bind(&txn.currency)
    .bind(txn.paid_status)
    .bind(&txn.created_at)
    .bind(&txn.paid_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn find_gateway_transaction<'e, E>(
    db: E,
    transaction_id: &str,
) -> Result<Option<GatewayTransaction>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, GatewayTransaction>(&format!(
        "SELECT {GATEWAY_COLUMNS} FROM gateway_transactions WHERE transaction_id = ?"
    ))
    .bind(transaction_id)
    .fetch_optional(db)
    .await
}

/// Flips `paid_status` to true only while it is still false. Returns the row
/// when this call made the transition and `None` otherwise (unknown id or
/// already paid).
pub async fn mark_gateway_transaction_paid<'e, E>(
    db: E,
    transaction_id: &str,
) -> Result<Option<GatewayTransaction>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, GatewayTransaction>(&format!(
        r#"
        UPDATE gateway_transactions
        SET paid_status = 1, paid_at = ?1
        WHERE transaction_id = ?2 AND paid_status = 0
        RETURNING {GATEWAY_COLUMNS}
        "#
    ))
    .bind(now())
    .bind(transaction_id)
    .fetch_optional(db)
    .await
}

pub async fn fetch_bookmarks(
    db: &SqlitePool,
    student_email: &str,
) -> Result<Vec<Bookmark>, sqlx::Error> {
    sqlx::query_as::<_, Bookmark>(&format!(
        "SELECT {BOOKMARK_COLUMNS} FROM bookmarks WHERE student_email = ? ORDER BY created_at DESC"
    ))
    .bind(student_email)
    .fetch_all(db)
    .await
}

/// Inserts unless `(student_email, class_id)` is already bookmarked. The
/// unique index makes the check and the insert one statement.
pub async fn insert_bookmark_if_absent(
    db: &SqlitePool,
    student_email: &str,
    req: NewBookmarkRequest,
) -> Result<Option<Bookmark>, sqlx::Error> {
    let bookmark = Bookmark {
        id: new_id(),
        student_email: student_email.to_string(),
        student_name: req.student_name,
        class_id: req.class_id,
        class_title: req.class_title,
        class_image_url: req.class_image_url,
        instructor_email: req.instructor_email,
        instructor_name: req.instructor_name,
        price: req.price,
        created_at: now(),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO bookmarks
            (id, student_email, student_name, class_id, class_title, class_image_url,
            instructor_email, instructor_name, price, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT (student_email, class_id) DO NOTHING
        "#,
    )
    .bind(&bookmark.id)
    .bind(&bookmark.student_email)
    .bind(&bookmark.student_name)
    .bind(&bookmark.class_id)
    .bind(&bookmark.class_title)
    .bind(&bookmark.class_image_url)
    .bind(&bookmark.instructor_email)
    .bind(&bookmark.instructor_name)
    .bind(bookmark.price)
    .bind(&bookmark.created_at)
    .execute(db)
    .await?;

    Ok((result.rows_affected() > 0).then_some(bookmark))
}
