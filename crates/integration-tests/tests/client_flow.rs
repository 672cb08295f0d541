//! The client core driving a running storefront over HTTP.

use loomline_client::models::Registration;
use loomline_client::{App, ClientConfig, ClientError, Navigation, OrderView, Route};
use loomline_core::ProductId;

use loomline_integration_tests::{any_product_id, base_url, session_client, unique_registration};

fn app() -> App<loomline_client::HttpTransport> {
    let config = ClientConfig {
        api_url: base_url().parse().unwrap(),
        identity_stale_time: std::time::Duration::from_secs(300),
        default_stale_time: std::time::Duration::ZERO,
    };
    App::from_config(&config).unwrap()
}

fn registration() -> Registration {
    let form = unique_registration("Lajpat Nagar, Delhi");
    let field = |name: &str| form[name].as_str().unwrap().to_owned();
    Registration {
        email: field("email"),
        phone: field("phone"),
        name: field("name"),
        business_name: field("businessName"),
        address: field("address"),
        password: field("password"),
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_checkout_through_client() {
    let app = app();
    assert!(matches!(
        app.navigate(Route::Cart, "/cart").await,
        Navigation::RedirectToLogin { .. }
    ));

    app.session().register(&registration()).await.unwrap();
    assert_eq!(app.navigate(Route::Cart, "/cart").await, Navigation::Proceed);
    assert_eq!(app.navigate(Route::Admin, "/admin").await, Navigation::Forbidden);

    assert_eq!(
        app.checkout().place_order().await.unwrap_err(),
        ClientError::EmptyCart
    );

    let product_id = ProductId::new(any_product_id(&session_client()).await);
    let cart = app.cart().add(product_id, 2).await.unwrap();
    assert_eq!(cart.item_count, 2);

    let order_id = app.checkout().place_order().await.unwrap();
    assert!(app.cart().cart().await.unwrap().is_empty());

    let order = app.orders().get(order_id).await.unwrap();
    assert!(OrderView::from(&order).show_payment_prompt);

    app.session().logout().await.unwrap();
    assert!(app.session().current_user().await.is_none());
    assert_eq!(app.cart().cart().await.unwrap_err(), ClientError::Unauthorized);
}
