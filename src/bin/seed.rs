use anyhow::Context;
use storefront_api::{
    db::{create_pool, run_migrations},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin12345", "admin").await?;
    let user_id = ensure_user(&pool, "client@example.com", "client12345", "customer").await?;
    seed_catalog(&pool).await?;

    tracing::info!(%admin_id, %user_id, "seed completed");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    tracing::info!(email, role, "ensured user");
    Ok(user_id)
}

async fn ensure_category(pool: &sqlx::PgPool, name: &str, slug: &str) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name, slug)
        VALUES ($1, $2, $3)
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let dresses = ensure_category(pool, "Robes", "robes").await?;
    let tops = ensure_category(pool, "T-Shirts", "t-shirts").await?;
    let accessories = ensure_category(pool, "Accessoires", "accessoires").await?;

    let sizes = || vec!["S".to_string(), "M".to_string(), "L".to_string(), "XL".to_string()];
    let products: Vec<(Uuid, &str, &str, i64, Option<i64>, i32, Vec<String>, Vec<String>)> = vec![
        (
            dresses,
            "Robe Kabyle",
            "Robe traditionnelle brodée main",
            6500,
            Some(5200),
            12,
            sizes(),
            vec!["Rouge".into(), "Jaune".into()],
        ),
        (
            tops,
            "T-Shirt Casbah",
            "Coton peigné, coupe droite",
            1800,
            None,
            80,
            sizes(),
            vec!["Blanc".into(), "Noir".into(), "Bleu".into()],
        ),
        (
            accessories,
            "Foulard Tlemcen",
            "Soie imprimée",
            2200,
            Some(1900),
            35,
            Vec::new(),
            vec!["Vert".into(), "Bordeaux".into()],
        ),
        (
            accessories,
            "Sac Cabas",
            "Sac en cuir tressé",
            4800,
            None,
            20,
            Vec::new(),
            Vec::new(),
        ),
    ];

    for (category_id, name, description, price, sale_price, stock, sizes, colors) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, category_id, name, description, price, sale_price, stock, sizes, colors)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category_id)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(sale_price)
        .bind(stock)
        .bind(sizes)
        .bind(colors)
        .execute(pool)
        .await?;
    }

    tracing::info!("seeded catalog");
    Ok(())
}
