use axum::{http::StatusCode, response::IntoResponse};
use storefront_api::{
    cart::{CartError, CartLine, CartView, PersistenceError},
    dto::orders::CheckoutRequest,
    error::AppError,
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_CUSTOMER, decode_token, ensure_admin},
    services::{
        admin_service::validate_order_status, auth_service::issue_token,
        order_service::{tally_demand, validate_checkout},
        product_service::validate_pricing,
    },
};
use uuid::Uuid;

fn checkout_form() -> CheckoutRequest {
    CheckoutRequest {
        customer_name: "  Yacine B.  ".into(),
        phone: "07 71 23 45 67".into(),
        province: "alger".into(),
        address: " Bab Ezzouar ".into(),
        note: Some("".into()),
    }
}

#[test]
fn issued_token_decodes_to_the_same_user() {
    let user_id = Uuid::new_v4();
    let token = issue_token(user_id, ROLE_ADMIN, "secret", 1).expect("token");

    let user = decode_token(&token, "secret").expect("valid token");
    assert_eq!(user.user_id, user_id);
    assert_eq!(user.role, ROLE_ADMIN);
    assert!(ensure_admin(&user).is_ok());

    assert!(matches!(
        decode_token(&token, "other-secret"),
        Err(AppError::Unauthorized)
    ));
}

#[test]
fn customers_are_not_admins() {
    let user = AuthUser {
        user_id: Uuid::new_v4(),
        role: ROLE_CUSTOMER.into(),
    };
    assert!(matches!(ensure_admin(&user), Err(AppError::Forbidden)));
}

#[test]
fn checkout_form_is_trimmed_and_phone_formatted() {
    let details = validate_checkout(checkout_form()).expect("valid form");
    assert_eq!(details.customer_name, "Yacine B.");
    assert_eq!(details.phone, "07 71 23 45 67");
    assert_eq!(details.province, "Alger");
    assert_eq!(details.address, "Bab Ezzouar");
    assert_eq!(details.note, None);
}

#[test]
fn checkout_form_rejects_bad_fields() {
    let cases: [fn(&mut CheckoutRequest); 4] = [
        |f| f.customer_name = "   ".into(),
        |f| f.phone = "12345".into(),
        |f| f.province = "Narnia".into(),
        |f| f.address = String::new(),
    ];
    for break_form in cases {
        let mut form = checkout_form();
        break_form(&mut form);
        assert!(matches!(
            validate_checkout(form),
            Err(AppError::BadRequest(_))
        ));
    }
}

#[test]
fn sale_price_must_undercut_price() {
    assert!(validate_pricing(1000, None).is_ok());
    assert!(validate_pricing(1000, Some(800)).is_ok());
    assert!(validate_pricing(1000, Some(1000)).is_err());
    assert!(validate_pricing(1000, Some(-1)).is_err());
    assert!(validate_pricing(-5, None).is_err());
}

#[test]
fn order_statuses_are_a_closed_set() {
    for status in ["pending", "confirmed", "shipped", "delivered", "cancelled"] {
        assert!(validate_order_status(status).is_ok());
    }
    assert!(validate_order_status("paid").is_err());
}

#[test]
fn cart_errors_map_to_http_statuses() {
    let cases = [
        (CartError::Validation("no identity".into()), StatusCode::UNPROCESSABLE_ENTITY),
        (CartError::NotFound, StatusCode::NOT_FOUND),
        (
            CartError::Persistence(PersistenceError::Rejected("duplicate key".into())),
            StatusCode::CONFLICT,
        ),
    ];
    for (err, status) in cases {
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), status);
    }
}

fn cart_line(product_id: Uuid, size: &str, quantity: i32) -> CartView {
    let now = chrono::Utc::now();
    CartView {
        line: CartLine {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            product_id,
            quantity,
            size: size.into(),
            color: String::new(),
            created_at: now,
            updated_at: now,
        },
        product: None,
    }
}

#[test]
fn demand_sums_sizes_of_one_product() {
    let shirt = Uuid::new_v4();
    let cap = Uuid::new_v4();
    let demand = tally_demand(&[
        cart_line(shirt, "S", 2),
        cart_line(shirt, "M", 3),
        cart_line(cap, "", 1),
    ])
    .expect("small quantities");
    assert_eq!(demand[&shirt], 5);
    assert_eq!(demand[&cap], 1);
}

#[test]
fn demand_overflow_is_rejected_instead_of_wrapping() {
    let shirt = Uuid::new_v4();
    let result = tally_demand(&[
        cart_line(shirt, "S", i32::MAX),
        cart_line(shirt, "M", i32::MAX),
    ]);
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let result = tally_demand(&[cart_line(shirt, "S", -4)]);
    assert!(matches!(result, Err(AppError::BadRequest(_))));
}
