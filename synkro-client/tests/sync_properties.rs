// synkro-client/tests/sync_properties.rs
// End-to-end behaviour of stores and coordinators against the in-memory backend

use serde_json::{Value, json};
use shared::models::{ClientCreate, GalleryImage, LoyaltyCoupon};
use std::sync::Arc;
use synkro_client::gateway::{Operation, Tables};
use synkro_client::{
    ADD_POINT_PROCEDURE, ChannelSink, ClientError, ClientResult, Clients, Collection, Filter,
    GALLERY_BUCKET, Gallery, LoadOutcome, Loyalty, MemoryGateway, Notice, SyncContext, TenantId,
    WorkingHours,
};
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

fn context() -> (Arc<MemoryGateway>, SyncContext, UnboundedReceiver<Notice>) {
    let gateway = Arc::new(MemoryGateway::new());
    let (sink, rx) = ChannelSink::new();
    let ctx = SyncContext::memory(gateway.clone(), Arc::new(sink));
    (gateway, ctx, rx)
}

fn tenant() -> TenantId {
    TenantId(Uuid::new_v4())
}

fn ana() -> ClientCreate {
    ClientCreate {
        name: "Ana".to_string(),
        phone: "(11) 98765-4321".to_string(),
        email: None,
        notes: None,
    }
}

// ============================================================================
// Entity Store
// ============================================================================

#[tokio::test]
async fn test_load_none_wins_over_slower_tenant_load() {
    let (gateway, ctx, _rx) = context();
    let t = tenant();
    gateway.seed(
        Collection::Clients,
        [json!({ "barbershop_id": t, "name": "Ana", "phone": "1" })],
    );
    let clients = Clients::from_context(&ctx);
    let store = clients.store();

    let gate = gateway.hold_next_query();
    let (slow, cleared, _) = tokio::join!(store.load(Some(t)), store.load(None), async {
        gate.release()
    });

    assert!(matches!(slow, LoadOutcome::Superseded));
    assert!(matches!(cleared, LoadOutcome::Cleared));
    assert!(store.is_empty().await);
    assert_eq!(store.tenant().await, None);
    assert!(!store.is_loading().await);
}

#[tokio::test]
async fn test_load_none_after_completed_load_empties_store() {
    let (gateway, ctx, _rx) = context();
    let t = tenant();
    gateway.seed(
        Collection::Clients,
        [json!({ "barbershop_id": t, "name": "Ana", "phone": "1" })],
    );
    let clients = Clients::from_context(&ctx);

    clients.store().load(Some(t)).await;
    clients.store().load(None).await;
    assert!(clients.store().is_empty().await);
}

#[tokio::test]
async fn test_rapid_tenant_switch_keeps_latest_tenant() {
    let (gateway, ctx, _rx) = context();
    let (first, second) = (tenant(), tenant());
    gateway.seed(
        Collection::Clients,
        [
            json!({ "barbershop_id": first, "name": "Primeira", "phone": "1" }),
            json!({ "barbershop_id": second, "name": "Segunda", "phone": "2" }),
        ],
    );
    let clients = Clients::from_context(&ctx);
    let store = clients.store();

    let gate = gateway.hold_next_query();
    tokio::join!(store.load(Some(first)), async {
        store.load(Some(second)).await;
        gate.release();
    });

    let names: Vec<_> = store.list().await.into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["Segunda"]);
    assert_eq!(store.tenant().await, Some(second));
}

#[tokio::test]
async fn test_failed_switch_never_mixes_tenants() {
    let (gateway, ctx, _rx) = context();
    let (a, b) = (tenant(), tenant());
    gateway.seed(
        Collection::Clients,
        [json!({ "barbershop_id": a, "name": "Of A", "phone": "1" })],
    );
    let clients = Clients::from_context(&ctx);
    clients.store().load(Some(a)).await;

    gateway.fail_next(Operation::Query, "connection reset");
    let outcome = clients.store().load(Some(b)).await;
    assert!(matches!(outcome, LoadOutcome::Failed(_)));

    let created = clients.create(&ana()).await.committed().unwrap();
    assert_eq!(created.barbershop_id, b);

    let entries = clients.store().list().await;
    assert_eq!(entries.len(), 1);
    assert!(entries.iter().all(|c| c.barbershop_id == b));
}

// ============================================================================
// Mutation Coordinator
// ============================================================================

#[tokio::test]
async fn test_create_then_delete_leaves_mapping_unchanged() {
    let (gateway, ctx, mut rx) = context();
    let t = tenant();
    gateway.seed(
        Collection::Clients,
        [json!({ "barbershop_id": t, "name": "Bruno", "phone": "2" })],
    );
    let clients = Clients::from_context(&ctx);
    clients.store().load(Some(t)).await;
    let before = clients.store().list().await;

    let created = clients.create(&ana()).await.committed().unwrap();
    assert!(clients.store().contains(created.id).await);
    assert!(clients.delete(created.id).await.is_committed());

    assert_eq!(clients.store().list().await, before);
    assert_eq!(rx.try_recv().unwrap().title, "Client created");
    assert_eq!(rx.try_recv().unwrap().title, "Client deleted");
}

#[tokio::test]
async fn test_failed_create_adds_nothing() {
    let (gateway, ctx, mut rx) = context();
    let clients = Clients::from_context(&ctx);
    clients.store().load(Some(tenant())).await;

    gateway.fail_next(Operation::Insert, "duplicate key value violates unique constraint");
    let outcome = clients.create(&ana()).await;

    assert!(!outcome.is_committed());
    assert!(clients.store().is_empty().await);
    assert!(gateway.rows(Collection::Clients).is_empty());
    let notice = rx.try_recv().unwrap();
    assert!(notice.is_error());
    assert_eq!(
        notice.description.as_deref(),
        Some("duplicate key value violates unique constraint")
    );
}

#[tokio::test]
async fn test_failed_delete_removes_nothing() {
    let (gateway, ctx, _rx) = context();
    let clients = Clients::from_context(&ctx);
    clients.store().load(Some(tenant())).await;
    let created = clients.create(&ana()).await.committed().unwrap();

    gateway.fail_next(Operation::Delete, "violates foreign key constraint");
    assert!(!clients.delete(created.id).await.is_committed());

    assert_eq!(clients.store().get(created.id).await, Some(created));
    assert_eq!(gateway.rows(Collection::Clients).len(), 1);
}

#[tokio::test]
async fn test_delete_is_scoped_to_tenant() {
    let (gateway, ctx, _rx) = context();
    let other = gateway
        .seed(
            Collection::Clients,
            [json!({ "barbershop_id": tenant(), "name": "Outro", "phone": "3" })],
        )
        .remove(0);
    let other_id: Uuid = other["id"].as_str().unwrap().parse().unwrap();
    let clients = Clients::from_context(&ctx);
    clients.store().load(Some(tenant())).await;

    let outcome = clients.delete(other_id).await;
    assert!(matches!(outcome.error(), Some(ClientError::NotFound(_))));
    assert_eq!(gateway.rows(Collection::Clients).len(), 1);
}

#[tokio::test]
async fn test_concurrent_mutations_all_apply() {
    let (_, ctx, _rx) = context();
    let clients = Clients::from_context(&ctx);
    clients.store().load(Some(tenant())).await;

    let mut bruno = ana();
    bruno.name = "Bruno".to_string();
    let ana = ana();
    let (a, b) = tokio::join!(clients.create(&ana), clients.create(&bruno));

    assert!(a.is_committed() && b.is_committed());
    assert_eq!(clients.store().len().await, 2);
    assert_eq!(clients.pending(), 0);
}

// ============================================================================
// Gallery
// ============================================================================

async fn seeded_image(gateway: &MemoryGateway, t: TenantId) -> (String, Value) {
    let key = format!("{t}/corte.jpg");
    let url = gateway.seed_object(GALLERY_BUCKET, &key, vec![0xFF, 0xD8]);
    let row = gateway
        .seed(
            Collection::GalleryImages,
            [json!({ "barbershop_id": t, "image_url": url, "title": "Degradê" })],
        )
        .remove(0);
    (key, row)
}

#[tokio::test]
async fn test_gallery_delete_aborts_when_storage_fails() {
    let (gateway, ctx, mut rx) = context();
    let t = tenant();
    let (key, row) = seeded_image(&gateway, t).await;
    let gallery = Gallery::from_context(&ctx);
    gallery.store().load(Some(t)).await;
    let id: Uuid = row["id"].as_str().unwrap().parse().unwrap();

    gateway.fail_next(Operation::RemoveObject, "storage unavailable");
    assert!(!gallery.delete(id).await.is_committed());

    assert!(gateway.object_exists(GALLERY_BUCKET, &key));
    assert_eq!(gateway.rows(Collection::GalleryImages).len(), 1);
    assert_eq!(gateway.call_count(Operation::Delete), 0);
    assert!(gallery.store().contains(id).await);
    assert_eq!(rx.try_recv().unwrap().title, "Failed to delete image");
}

#[tokio::test]
async fn test_gallery_delete_removes_object_then_row() {
    let (gateway, ctx, _rx) = context();
    let t = tenant();
    let (key, row) = seeded_image(&gateway, t).await;
    let gallery = Gallery::from_context(&ctx);
    gallery.store().load(Some(t)).await;
    let id: Uuid = row["id"].as_str().unwrap().parse().unwrap();

    assert!(gallery.delete(id).await.is_committed());
    assert!(!gateway.object_exists(GALLERY_BUCKET, &key));
    assert!(gateway.rows(Collection::GalleryImages).is_empty());
    assert!(gallery.store().is_empty().await);
}

#[tokio::test]
async fn test_gallery_upload_stores_object_under_tenant() {
    let (gateway, ctx, _rx) = context();
    let t = tenant();
    let gallery = Gallery::from_context(&ctx);
    gallery.store().load(Some(t)).await;

    let image: GalleryImage = gallery
        .upload("navalhado.PNG", vec![1, 2, 3], "image/png", Default::default())
        .await
        .committed()
        .unwrap();

    let key = synkro_client::storage_key_from_url(&image.image_url).unwrap();
    assert!(key.starts_with(&format!("{t}/")));
    assert!(key.ends_with(".png"));
    assert!(gateway.object_exists(GALLERY_BUCKET, key));
    assert_eq!(gallery.store().len().await, 1);

    let featured = gallery.set_featured(image.id, true).await.committed().unwrap();
    assert!(featured.featured);
    assert_eq!(gallery.featured().await.len(), 1);
}

// ============================================================================
// Working hours
// ============================================================================

#[tokio::test]
async fn test_ensure_defaults_twice_yields_six_rows() {
    let (gateway, ctx, _rx) = context();
    let t = tenant();
    let hours = WorkingHours::from_context(&ctx);

    hours.ensure_defaults(t).await.unwrap();
    hours.ensure_defaults(t).await.unwrap();

    let rows = gateway.rows(Collection::WorkingHours);
    assert_eq!(rows.len(), 6);

    let mut days: Vec<_> = hours
        .store()
        .list()
        .await
        .into_iter()
        .map(|h| h.day_of_week)
        .collect();
    days.sort();
    assert_eq!(days, vec![1, 2, 3, 4, 5, 6]);
    let saturday = hours.for_day(6).await.remove(0);
    assert_eq!(saturday.start_time, "09:00");
    assert_eq!(saturday.end_time, "17:00");
    assert!(saturday.active);
}

// ============================================================================
// Loyalty
// ============================================================================

/// Backend-side behaviour of `add_loyalty_point`: one point per call, a
/// coupon every ten points.
fn add_loyalty_point(tables: &mut Tables, args: Value) -> ClientResult<Value> {
    let tenant = args["p_barbershop_id"].as_str().unwrap_or_default().to_string();
    let client = args["p_client_id"].as_str().unwrap_or_default().to_string();
    let filter = Filter::new()
        .eq("barbershop_id", &tenant)
        .eq("client_id", &client);

    let card = tables
        .find_mut(Collection::LoyaltyCards, &filter)
        .ok_or_else(|| ClientError::remote("card not found"))?;
    let points = card["points"].as_i64().unwrap_or(0) + 1;
    let total = card["total_points"].as_i64().unwrap_or(0) + 1;
    let coupon_generated = points >= 10;
    card["points"] = json!(if coupon_generated { 0 } else { points });
    card["total_points"] = json!(total);

    let mut coupon_code = Value::Null;
    if coupon_generated {
        tables.insert(
            Collection::LoyaltyCoupons,
            json!({
                "barbershop_id": tenant,
                "client_id": client,
                "code": "ABC123",
                "discount_percentage": 10,
                "used": false,
            }),
        )?;
        coupon_code = json!("ABC123");
    }
    Ok(json!({
        "success": true,
        "points": points,
        "total_points": total,
        "coupon_generated": coupon_generated,
        "coupon_code": coupon_code,
    }))
}

#[tokio::test]
async fn test_tenth_point_yields_coupon_in_store() {
    let (gateway, ctx, mut rx) = context();
    gateway.register_procedure(ADD_POINT_PROCEDURE, add_loyalty_point);
    let t = tenant();
    let client_id = Uuid::new_v4();
    gateway.seed(
        Collection::LoyaltyCards,
        [json!({ "barbershop_id": t, "client_id": client_id, "points": 9, "total_points": 19 })],
    );
    let loyalty = Loyalty::from_context(&ctx);
    loyalty.cards().store().load(Some(t)).await;
    loyalty.coupons().store().load(Some(t)).await;
    assert!(loyalty.available_coupons(client_id).await.is_empty());

    let result = loyalty.add_point(client_id).await.committed().unwrap();
    assert!(result.coupon_generated);
    assert_eq!(result.coupon_code.as_deref(), Some("ABC123"));

    let coupons: Vec<LoyaltyCoupon> = loyalty.coupons().store().list().await;
    assert_eq!(coupons.len(), 1);
    assert_eq!(coupons[0].code, "ABC123");
    assert_eq!(coupons[0].client_id, client_id);
    assert!(!coupons[0].used);
    assert_eq!(loyalty.card_for(client_id).await.unwrap().total_points, 20);

    let notice = rx.try_recv().unwrap();
    assert_eq!(notice.title, "Coupon generated");
    assert_eq!(notice.description.as_deref(), Some("ABC123"));

    let redeemed = loyalty.redeem_coupon(coupons[0].id).await.committed().unwrap();
    assert!(redeemed.used);
    assert!(loyalty.available_coupons(client_id).await.is_empty());
}
