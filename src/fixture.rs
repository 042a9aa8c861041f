//! Sample dataset for the question bank.
//!
//! Three tables, seeded so every question has something to find: duplicate
//! and NULL emails for the cleaning section, a distinct second-highest
//! product price for Q35, NULL order quantities for Q46/Q49, two users with
//! no orders and two products never ordered for the anti-join questions.
//! The last few orders are dated relative to CURDATE() so the rolling
//! 30-day window in Q42 always returns rows.

use sqlx::MySqlPool;

use crate::error::HarnessResult;

/// Row counts the seed data produces, used by checks and tests.
pub const USER_COUNT: usize = 8;
pub const PRODUCT_COUNT: usize = 8;
pub const ORDER_COUNT: usize = 20;

const CREATE_USERS: &str = r#"
CREATE TABLE users (
    id INT PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    email VARCHAR(255) NULL,
    signup_date DATE NULL
)
"#;

const CREATE_PRODUCTS: &str = r#"
CREATE TABLE products (
    id INT PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    category VARCHAR(50) NULL,
    price DECIMAL(8, 2) NOT NULL
)
"#;

const CREATE_ORDERS: &str = r#"
CREATE TABLE orders (
    id INT PRIMARY KEY,
    user_id INT NOT NULL,
    product_id INT NOT NULL,
    quantity INT NULL,
    order_date DATE NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users (id),
    FOREIGN KEY (product_id) REFERENCES products (id)
)
"#;

// Users 7 and 8 never order. User 6 shares user 1's email, user 5's email
// is the only mixed-case one, user 8 has no signup date.
const SEED_USERS: &str = r#"
INSERT INTO users (id, name, email, signup_date) VALUES
    (1, 'Alice Johnson', 'alice@example.com', '2023-11-05'),
    (2, 'Bob Smith', 'bob@example.com', '2023-12-12'),
    (3, 'Carol Diaz', 'carol@example.com', '2024-01-20'),
    (4, 'Dan Brown', NULL, '2024-02-14'),
    (5, 'Erin Woods', 'ERIN@Example.com', '2024-03-03'),
    (6, 'Frank Moore', 'alice@example.com', '2024-03-18'),
    (7, 'Grace Lee', 'grace@example.com', '2024-04-02'),
    (8, 'Hank Patel', NULL, NULL)
"#;

// Distinct prices, so the second-highest (599.00, the Phone) is unique.
// Products 5 and 8 are never ordered.
const SEED_PRODUCTS: &str = r#"
INSERT INTO products (id, name, category, price) VALUES
    (1, 'Laptop', 'Electronics', 899.00),
    (2, 'Phone', 'Electronics', 599.00),
    (3, 'Headphones', 'Electronics', 79.00),
    (4, 'Coffee Maker', 'Home', 49.00),
    (5, 'Desk Lamp', 'Home', 19.00),
    (6, 'Novel', 'Books', 14.00),
    (7, 'Cookbook', 'Books', 24.00),
    (8, 'Gift Card', NULL, 25.00)
"#;

// Orders 6, 14 and 20 have a NULL quantity. The last three are dated
// relative to today so date-window queries stay non-empty.
const SEED_ORDERS: &str = r#"
INSERT INTO orders (id, user_id, product_id, quantity, order_date) VALUES
    (1, 1, 1, 1, '2024-01-15'),
    (2, 1, 3, 2, '2024-01-28'),
    (3, 2, 2, 1, '2024-02-03'),
    (4, 2, 6, 3, '2024-02-10'),
    (5, 3, 1, 1, '2024-02-21'),
    (6, 3, 7, NULL, '2024-03-01'),
    (7, 4, 4, 1, '2024-03-07'),
    (8, 1, 2, 1, '2024-03-12'),
    (9, 5, 6, 2, '2024-03-19'),
    (10, 2, 3, 1, '2024-04-02'),
    (11, 6, 1, 1, '2024-04-11'),
    (12, 3, 2, 1, '2024-04-23'),
    (13, 5, 7, 1, '2024-05-05'),
    (14, 4, 6, NULL, '2024-05-16'),
    (15, 1, 4, 2, '2024-05-27'),
    (16, 6, 3, 1, '2024-06-08'),
    (17, 2, 1, 1, '2024-06-15'),
    (18, 5, 3, 1, DATE_SUB(CURDATE(), INTERVAL 12 DAY)),
    (19, 3, 6, 2, DATE_SUB(CURDATE(), INTERVAL 5 DAY)),
    (20, 6, 2, NULL, DATE_SUB(CURDATE(), INTERVAL 2 DAY))
"#;

/// Drop and recreate the three tables.
pub async fn create_schema(pool: &MySqlPool) -> HarnessResult<()> {
    drop_schema(pool).await?;
    sqlx::query(CREATE_USERS).execute(pool).await?;
    sqlx::query(CREATE_PRODUCTS).execute(pool).await?;
    sqlx::query(CREATE_ORDERS).execute(pool).await?;
    Ok(())
}

/// Insert the seed rows. Assumes freshly created tables.
pub async fn seed(pool: &MySqlPool) -> HarnessResult<()> {
    sqlx::query(SEED_USERS).execute(pool).await?;
    sqlx::query(SEED_PRODUCTS).execute(pool).await?;
    sqlx::query(SEED_ORDERS).execute(pool).await?;
    Ok(())
}

/// Drop the three tables, children first.
pub async fn drop_schema(pool: &MySqlPool) -> HarnessResult<()> {
    sqlx::query("DROP TABLE IF EXISTS orders").execute(pool).await?;
    sqlx::query("DROP TABLE IF EXISTS products").execute(pool).await?;
    sqlx::query("DROP TABLE IF EXISTS users").execute(pool).await?;
    Ok(())
}

/// Recreate the schema and seed it. Idempotent.
pub async fn load(pool: &MySqlPool) -> HarnessResult<()> {
    create_schema(pool).await?;
    seed(pool).await?;
    tracing::info!(
        users = USER_COUNT,
        products = PRODUCT_COUNT,
        orders = ORDER_COUNT,
        "fixture loaded"
    );
    Ok(())
}
