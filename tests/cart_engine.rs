use std::{sync::Arc, time::Duration};

use storefront_api::{
    cart::{
        AddLine, CartEngine, CartError, CartStore, LineKey, MAX_LINE_QUANTITY, MemoryCartStore,
        MemoryCatalog, PersistenceError, ProductSnapshot,
    },
    identity::Identity,
};
use uuid::Uuid;

struct Fixture {
    store: Arc<MemoryCartStore>,
    catalog: Arc<MemoryCatalog>,
    engine: Arc<CartEngine>,
    identity: Identity,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryCartStore::new());
    let catalog = Arc::new(MemoryCatalog::new());
    let engine = Arc::new(CartEngine::new(store.clone(), catalog.clone()));
    Fixture {
        store,
        catalog,
        engine,
        identity: Identity::new(Uuid::new_v4(), "customer"),
    }
}

async fn product(catalog: &MemoryCatalog, price: i64, sale_price: Option<i64>) -> Uuid {
    let id = Uuid::new_v4();
    catalog
        .put(ProductSnapshot {
            id,
            name: format!("product-{price}"),
            price,
            sale_price,
        })
        .await;
    id
}

fn add(product_id: Uuid, quantity: i32, size: Option<&str>, color: Option<&str>) -> AddLine {
    AddLine {
        product_id,
        quantity,
        size: size.map(str::to_string),
        color: color.map(str::to_string),
    }
}

#[tokio::test]
async fn repeated_adds_of_one_configuration_accumulate() -> anyhow::Result<()> {
    let f = fixture();
    let shirt = product(&f.catalog, 1000, None).await;

    f.engine
        .add_line(Some(&f.identity), add(shirt, 2, Some("M"), Some("Red")))
        .await?;
    f.engine
        .add_line(Some(&f.identity), add(shirt, 3, Some("M"), Some("Red")))
        .await?;
    let lines = f
        .engine
        .add_line(Some(&f.identity), add(shirt, 4, Some("M"), Some("Red")))
        .await?;

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].line.quantity, 9);
    assert_eq!(f.store.rows().await.len(), 1);
    assert_eq!(f.engine.count().await, 9);
    Ok(())
}

#[tokio::test]
async fn absent_and_empty_labels_are_the_same_line() -> anyhow::Result<()> {
    let f = fixture();
    let mug = product(&f.catalog, 500, None).await;

    f.engine
        .add_line(Some(&f.identity), add(mug, 1, None, None))
        .await?;
    let lines = f
        .engine
        .add_line(Some(&f.identity), add(mug, 1, Some(""), Some(" ")))
        .await?;

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].line.quantity, 2);
    assert_eq!(lines[0].line.size, "");
    assert_eq!(lines[0].line.color, "");
    Ok(())
}

#[tokio::test]
async fn count_sums_quantities_across_lines() -> anyhow::Result<()> {
    let f = fixture();
    let shirt = product(&f.catalog, 1000, None).await;

    f.engine
        .add_line(Some(&f.identity), add(shirt, 2, Some("M"), None))
        .await?;
    f.engine
        .add_line(Some(&f.identity), add(shirt, 3, Some("L"), None))
        .await?;

    let snapshot = f.engine.snapshot().await;
    assert_eq!(snapshot.lines.len(), 2);
    assert_eq!(snapshot.count, 5);
    assert!(!snapshot.loading);
    Ok(())
}

#[tokio::test]
async fn set_quantity_updates_or_removes() -> anyhow::Result<()> {
    let f = fixture();
    let a = product(&f.catalog, 100, None).await;
    let b = product(&f.catalog, 200, None).await;
    let c = product(&f.catalog, 300, None).await;

    f.engine.add_line(Some(&f.identity), add(a, 1, None, None)).await?;
    f.engine.add_line(Some(&f.identity), add(b, 1, None, None)).await?;
    let lines = f.engine.add_line(Some(&f.identity), add(c, 1, None, None)).await?;
    let line_of = |product_id: Uuid| {
        lines
            .iter()
            .find(|v| v.line.product_id == product_id)
            .map(|v| v.line.id)
            .expect("line present")
    };
    let (line_a, line_b, line_c) = (line_of(a), line_of(b), line_of(c));

    let lines = f.engine.set_quantity(line_a, 5).await?;
    assert_eq!(lines.len(), 3);
    let updated = lines.iter().find(|v| v.line.id == line_a).expect("line a");
    assert_eq!(updated.line.quantity, 5);

    let lines = f.engine.set_quantity(line_b, 0).await?;
    assert!(lines.iter().all(|v| v.line.id != line_b));

    let lines = f.engine.set_quantity(line_c, -1).await?;
    assert!(lines.iter().all(|v| v.line.id != line_c));

    assert_eq!(f.store.rows().await.len(), 1);
    assert_eq!(f.engine.count().await, 5);
    Ok(())
}

#[tokio::test]
async fn subtotal_prefers_sale_price_and_ignores_missing_products() -> anyhow::Result<()> {
    let f = fixture();
    let on_sale = product(&f.catalog, 1000, Some(800)).await;
    let regular = product(&f.catalog, 1000, None).await;
    let discontinued = product(&f.catalog, 9999, None).await;

    f.engine
        .add_line(Some(&f.identity), add(on_sale, 2, None, None))
        .await?;
    assert_eq!(f.engine.subtotal().await, 1600);

    f.engine
        .add_line(Some(&f.identity), add(regular, 3, None, None))
        .await?;
    assert_eq!(f.engine.subtotal().await, 4600);

    f.engine
        .add_line(Some(&f.identity), add(discontinued, 1, None, None))
        .await?;
    f.catalog.remove(discontinued).await;

    let lines = f.engine.fetch_lines(Some(&f.identity)).await?;
    assert_eq!(lines.len(), 3);
    let dangling = lines
        .iter()
        .find(|v| v.line.product_id == discontinued)
        .expect("dangling line is kept");
    assert!(dangling.product.is_none());
    assert_eq!(f.engine.subtotal().await, 4600);
    assert_eq!(f.engine.count().await, 6);
    Ok(())
}

#[tokio::test]
async fn fetch_orders_newest_first_with_one_catalog_lookup() -> anyhow::Result<()> {
    let f = fixture();
    let first = product(&f.catalog, 100, None).await;
    let second = product(&f.catalog, 200, None).await;
    let third = product(&f.catalog, 300, None).await;

    for id in [first, second, third] {
        f.engine.add_line(Some(&f.identity), add(id, 1, None, None)).await?;
    }

    let before = f.catalog.lookups();
    let lines = f.engine.fetch_lines(Some(&f.identity)).await?;
    assert_eq!(f.catalog.lookups(), before + 1);

    let order: Vec<Uuid> = lines.iter().map(|v| v.line.product_id).collect();
    assert_eq!(order, vec![third, second, first]);
    Ok(())
}

#[tokio::test]
async fn mutations_without_identity_fail_fast() {
    let f = fixture();
    let shirt = product(&f.catalog, 1000, None).await;

    let err = f
        .engine
        .add_line(None, add(shirt, 1, None, None))
        .await
        .expect_err("no identity");
    assert!(matches!(err, CartError::Validation(_)));

    let err = f.engine.remove_line(Uuid::new_v4()).await.expect_err("no identity");
    assert!(matches!(err, CartError::Validation(_)));

    let err = f.engine.clear(None).await.expect_err("no identity");
    assert!(matches!(err, CartError::Validation(_)));

    let lines = f.engine.fetch_lines(None).await.expect("fetch without identity");
    assert!(lines.is_empty());
    assert!(f.store.rows().await.is_empty());
}

#[tokio::test]
async fn non_positive_add_quantity_is_rejected() {
    let f = fixture();
    let shirt = product(&f.catalog, 1000, None).await;

    for quantity in [0, -3] {
        let err = f
            .engine
            .add_line(Some(&f.identity), add(shirt, quantity, None, None))
            .await
            .expect_err("invalid quantity");
        assert!(matches!(err, CartError::Validation(_)));
    }
    assert!(f.store.rows().await.is_empty());
}

#[tokio::test]
async fn clear_empties_store_and_mirror() -> anyhow::Result<()> {
    let f = fixture();
    let shirt = product(&f.catalog, 1000, None).await;
    let other = Identity::new(Uuid::new_v4(), "customer");

    f.engine
        .add_line(Some(&f.identity), add(shirt, 2, Some("S"), None))
        .await?;
    f.engine
        .add_line(Some(&f.identity), add(shirt, 1, Some("M"), None))
        .await?;
    f.store
        .insert(LineKey::new(other.user_id, shirt, None, None), 4)
        .await?;

    f.engine.clear(Some(&f.identity)).await?;
    assert_eq!(f.engine.count().await, 0);

    let lines = f.engine.fetch_lines(Some(&f.identity)).await?;
    assert!(lines.is_empty());
    assert_eq!(f.store.list_by_owner(other.user_id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_write_leaves_mirror_untouched() -> anyhow::Result<()> {
    let f = fixture();
    let shirt = product(&f.catalog, 1000, None).await;

    f.engine
        .add_line(Some(&f.identity), add(shirt, 2, None, None))
        .await?;
    let before = f.engine.snapshot().await;

    f.store.set_fail_writes(true);
    let err = f
        .engine
        .add_line(Some(&f.identity), add(shirt, 1, Some("XL"), None))
        .await
        .expect_err("store rejects writes");
    assert!(matches!(
        err,
        CartError::Persistence(PersistenceError::Rejected(_))
    ));

    let line_id = before.lines[0].line.id;
    assert!(f.engine.set_quantity(line_id, 7).await.is_err());
    assert!(f.engine.clear(Some(&f.identity)).await.is_err());

    assert_eq!(f.engine.snapshot().await, before);
    assert_eq!(f.store.rows().await.len(), 1);
    assert_eq!(f.store.rows().await[0].quantity, 2);
    Ok(())
}

#[tokio::test]
async fn lines_of_another_identity_are_out_of_reach() -> anyhow::Result<()> {
    let f = fixture();
    let shirt = product(&f.catalog, 1000, None).await;
    let stranger = Identity::new(Uuid::new_v4(), "customer");
    let foreign = f
        .store
        .insert(LineKey::new(stranger.user_id, shirt, None, None), 1)
        .await?;

    f.engine.fetch_lines(Some(&f.identity)).await?;
    let err = f.engine.remove_line(foreign.id).await.expect_err("not owned");
    assert!(matches!(err, CartError::NotFound));
    let err = f.engine.set_quantity(foreign.id, 3).await.expect_err("not owned");
    assert!(matches!(err, CartError::NotFound));

    assert_eq!(f.store.rows().await[0].quantity, 1);
    Ok(())
}

#[tokio::test]
async fn stale_fetch_does_not_overwrite_a_later_clear() -> anyhow::Result<()> {
    let f = fixture();
    let shirt = product(&f.catalog, 1000, None).await;
    f.engine
        .add_line(Some(&f.identity), add(shirt, 2, None, None))
        .await?;

    f.catalog.set_latency(Some(Duration::from_millis(100))).await;
    let engine = f.engine.clone();
    let identity = f.identity.clone();
    let slow_fetch = tokio::spawn(async move { engine.fetch_lines(Some(&identity)).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(f.engine.is_loading().await);
    f.engine.clear(Some(&f.identity)).await?;

    let fetched = slow_fetch.await??;
    assert_eq!(fetched.len(), 1, "the slow response itself still saw the line");

    let snapshot = f.engine.snapshot().await;
    assert!(snapshot.lines.is_empty());
    assert_eq!(snapshot.count, 0);
    assert!(!snapshot.loading);
    Ok(())
}

#[tokio::test]
async fn concurrent_adds_of_one_configuration_merge() -> anyhow::Result<()> {
    let f = fixture();
    let shirt = product(&f.catalog, 1000, None).await;
    // Keeps the first add inside its resync while the second one is submitted.
    f.catalog.set_latency(Some(Duration::from_millis(10))).await;

    let (first, second) = tokio::join!(
        f.engine
            .add_line(Some(&f.identity), add(shirt, 2, Some("M"), Some("Red"))),
        f.engine
            .add_line(Some(&f.identity), add(shirt, 3, Some("M"), Some("Red"))),
    );
    first?;
    second?;

    let rows = f.store.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity, 5);
    assert_eq!(f.engine.count().await, 5);
    Ok(())
}

#[tokio::test]
async fn line_quantity_is_capped() -> anyhow::Result<()> {
    let f = fixture();
    let shirt = product(&f.catalog, 1000, None).await;

    let err = f
        .engine
        .add_line(Some(&f.identity), add(shirt, MAX_LINE_QUANTITY + 1, None, None))
        .await
        .expect_err("above the cap");
    assert!(matches!(err, CartError::Validation(_)));

    let lines = f
        .engine
        .add_line(Some(&f.identity), add(shirt, MAX_LINE_QUANTITY, None, None))
        .await?;
    let line_id = lines[0].line.id;

    let err = f
        .engine
        .add_line(Some(&f.identity), add(shirt, i32::MAX, None, None))
        .await
        .expect_err("sum above the cap");
    assert!(matches!(err, CartError::Validation(_)));

    let err = f
        .engine
        .set_quantity(line_id, i32::MAX)
        .await
        .expect_err("above the cap");
    assert!(matches!(err, CartError::Validation(_)));

    assert_eq!(f.store.rows().await[0].quantity, MAX_LINE_QUANTITY);
    Ok(())
}

#[tokio::test]
async fn huge_prices_saturate_the_subtotal() -> anyhow::Result<()> {
    let f = fixture();
    let yacht = product(&f.catalog, i64::MAX / 2, None).await;
    let jet = product(&f.catalog, 10_000_000_000_000, None).await;

    f.engine
        .add_line(Some(&f.identity), add(yacht, 3, None, None))
        .await?;
    f.engine
        .add_line(Some(&f.identity), add(jet, MAX_LINE_QUANTITY, None, None))
        .await?;

    assert_eq!(f.engine.subtotal().await, i64::MAX);
    assert_eq!(f.engine.count().await, i64::from(MAX_LINE_QUANTITY) + 3);
    Ok(())
}

#[tokio::test]
async fn failed_stale_fetch_keeps_newer_fetch_loading() -> anyhow::Result<()> {
    let f = fixture();
    let shirt = product(&f.catalog, 1000, None).await;
    f.engine
        .add_line(Some(&f.identity), add(shirt, 1, None, None))
        .await?;

    f.catalog.set_latency(Some(Duration::from_millis(100))).await;
    let engine = f.engine.clone();
    let identity = f.identity.clone();
    let older = tokio::spawn(async move { engine.fetch_lines(Some(&identity)).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    let engine = f.engine.clone();
    let identity = f.identity.clone();
    let newer = tokio::spawn(async move { engine.fetch_lines(Some(&identity)).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    f.catalog.fail_next_lookup();

    assert!(older.await?.is_err());
    assert!(f.engine.is_loading().await, "the newer fetch is still in flight");

    let lines = newer.await??;
    assert_eq!(lines.len(), 1);
    assert!(!f.engine.is_loading().await);
    assert_eq!(f.engine.count().await, 1);
    Ok(())
}
