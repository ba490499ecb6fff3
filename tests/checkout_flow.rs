use storefront_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    delivery::DeliveryPolicy,
    dto::{
        cart::{AddToCartRequest, SetQuantityRequest},
        orders::{CheckoutRequest, UpdateOrderStatusRequest},
    },
    entity::{products::ActiveModel as ProductActive, users::ActiveModel as UserActive},
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_CUSTOMER},
    services::{admin_service, auth_service, cart_service, order_service},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement};
use uuid::Uuid;

// Both scenarios share one database, so they run in sequence.
#[tokio::test]
async fn storefront_checkout_flows() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    cart_checkout_and_cancel(&state).await?;
    empty_cart_stock_and_logout(&state).await?;
    Ok(())
}

// Customer fills a cart, checks out to a non-capital province, and the admin
// cancels the order, which restocks the product.
async fn cart_checkout_and_cancel(state: &AppState) -> anyhow::Result<()> {
    let customer = create_user(state, ROLE_CUSTOMER, "customer@example.com").await?;
    let admin = create_user(state, ROLE_ADMIN, "admin@example.com").await?;
    let shirt = create_product(state, "Linen shirt", 2000, Some(1600), 10).await?;
    let cap = create_product(state, "Cap", 900, None, 5).await?;

    let auth_customer = AuthUser {
        user_id: customer,
        role: ROLE_CUSTOMER.into(),
    };
    let auth_admin = AuthUser {
        user_id: admin,
        role: ROLE_ADMIN.into(),
    };

    for quantity in [1, 2] {
        cart_service::add_to_cart(
            state,
            &auth_customer,
            AddToCartRequest {
                product_id: shirt,
                quantity,
                size: Some("M".into()),
                color: None,
            },
        )
        .await?;
    }
    let cart = cart_service::add_to_cart(
        state,
        &auth_customer,
        AddToCartRequest {
            product_id: cap,
            quantity: 4,
            size: None,
            color: Some("".into()),
        },
    )
    .await?
    .data
    .expect("cart snapshot");
    assert_eq!(cart.lines.len(), 2);
    assert_eq!(cart.count, 7);

    let cap_line = cart
        .lines
        .iter()
        .find(|view| view.line.product_id == cap)
        .map(|view| view.line.id)
        .expect("cap line");
    let cart = cart_service::set_quantity(
        state,
        &auth_customer,
        cap_line,
        SetQuantityRequest { quantity: 1 },
    )
    .await?
    .data
    .expect("cart snapshot");
    assert_eq!(cart.count, 4);
    assert_eq!(cart.subtotal, 3 * 1600 + 900);

    let placed = order_service::checkout(
        state,
        &auth_customer,
        CheckoutRequest {
            customer_name: "Amina Test".into(),
            phone: "0661-23-45-67".into(),
            province: "31".into(),
            address: "12 rue des Oliviers".into(),
            note: None,
        },
    )
    .await?
    .data
    .expect("placed order");
    assert_eq!(placed.order.subtotal, 5700);
    assert_eq!(placed.order.delivery_fee, 600);
    assert_eq!(placed.order.total_amount, 6300);
    assert_eq!(placed.order.phone, "06 61 23 45 67");
    assert_eq!(placed.order.province, "Oran");
    assert_eq!(placed.items.len(), 2);

    let cart = cart_service::get_cart(state, &auth_customer)
        .await?
        .data
        .expect("cart snapshot");
    assert!(cart.lines.is_empty());
    assert_eq!(stock_of(state, shirt).await?, 7);

    let cancelled = admin_service::update_order_status(
        state,
        &auth_admin,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: "cancelled".into(),
        },
    )
    .await?
    .data
    .expect("cancelled order");
    assert_eq!(cancelled.status, "cancelled");
    assert_eq!(stock_of(state, shirt).await?, 10);
    assert_eq!(stock_of(state, cap).await?, 5);

    let reopen = admin_service::update_order_status(
        state,
        &auth_admin,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: "pending".into(),
        },
    )
    .await;
    assert!(reopen.is_err());

    Ok(())
}

async fn empty_cart_stock_and_logout(state: &AppState) -> anyhow::Result<()> {
    let customer = create_user(state, ROLE_CUSTOMER, "logout@example.com").await?;
    let mug = create_product(state, "Mug", 700, None, 3).await?;
    let auth_customer = AuthUser {
        user_id: customer,
        role: ROLE_CUSTOMER.into(),
    };

    let request = || CheckoutRequest {
        customer_name: "Karim".into(),
        phone: "+213551234567".into(),
        province: "Alger".into(),
        address: "Didouche Mourad".into(),
        note: Some("  ".into()),
    };
    assert!(order_service::checkout(state, &auth_customer, request()).await.is_err());

    cart_service::add_to_cart(
        state,
        &auth_customer,
        AddToCartRequest {
            product_id: mug,
            quantity: 5,
            size: None,
            color: None,
        },
    )
    .await?;
    let short = order_service::checkout(state, &auth_customer, request()).await;
    assert!(short.is_err(), "stock is only 3");

    auth_service::logout_user(state, &auth_customer).await?;
    let cart = cart_service::get_cart(state, &auth_customer)
        .await?
        .data
        .expect("cart snapshot");
    assert!(cart.lines.is_empty());
    Ok(())
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run checkout flow tests.");
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;

    let config = AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        jwt_ttl_hours: 1,
        delivery: DeliveryPolicy::default(),
    };
    let state = AppState::new(pool, config);
    reset_db(&state).await?;
    Ok(Some(state))
}

async fn reset_db(state: &AppState) -> anyhow::Result<()> {
    let backend = state.orm.get_database_backend();
    state
        .orm
        .execute(Statement::from_string(
            backend,
            "TRUNCATE audit_logs, order_items, orders, cart_items, products, categories, users RESTART IDENTITY CASCADE"
                .to_string(),
        ))
        .await?;
    Ok(())
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(auth_service::hash_password("password123")?),
        full_name: Set(None),
        role: Set(role.to_string()),
        created_at: Set(chrono::Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(user.id)
}

async fn create_product(
    state: &AppState,
    name: &str,
    price: i64,
    sale_price: Option<i64>,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let now = chrono::Utc::now();
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(None),
        name: Set(name.to_string()),
        description: Set(None),
        price: Set(price),
        sale_price: Set(sale_price),
        stock: Set(stock),
        sizes: Set(vec!["S".into(), "M".into(), "L".into()]),
        colors: Set(Vec::new()),
        image_url: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}

async fn stock_of(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    let product = storefront_api::entity::products::Entity::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {id} missing"))?;
    Ok(product.stock)
}
